//! Runtime values and their declared types.
//!
//! Values flow from the parameter context through the expression evaluator
//! into the rendered statement. Every value travels together with a declared
//! type so that a `NULL` still binds with the placeholder type the caller
//! intended.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

/// The declared type of a bound value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// No specific type; used for untyped `NULL`.
    Any,
    /// Boolean.
    Boolean,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
    /// Arbitrary precision decimal.
    BigDecimal,
    /// Single character.
    Char,
    /// Text.
    String,
    /// Ordered collection.
    List,
    /// Two-element tuple.
    Pair,
    /// Three-element tuple.
    Triple,
    /// Named fields.
    Record,
}

impl ValueType {
    /// Returns the type name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Any => "Any",
            Self::Boolean => "Boolean",
            Self::Int => "Int",
            Self::Long => "Long",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::BigDecimal => "BigDecimal",
            Self::Char => "Char",
            Self::String => "String",
            Self::List => "List",
            Self::Pair => "Pair",
            Self::Triple => "Triple",
            Self::Record => "Record",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit integer value.
    Int(i32),
    /// 64-bit integer value.
    Long(i64),
    /// 32-bit float value.
    Float(f32),
    /// 64-bit float value.
    Double(f64),
    /// Decimal value.
    Decimal(Decimal),
    /// Character value.
    Char(char),
    /// Text value.
    String(String),
    /// Collection value; binds as a parenthesized placeholder group.
    List(Vec<Value>),
    /// Pair value; binds as a two-column tuple inside a collection.
    Pair(Box<(Value, Value)>),
    /// Triple value; binds as a three-column tuple inside a collection.
    Triple(Box<(Value, Value, Value)>),
    /// Named fields, resolved through property access.
    Record(BTreeMap<String, BoundValue>),
}

impl Value {
    /// Returns the runtime type of this value (`Any` for `NULL`).
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Any,
            Self::Bool(_) => ValueType::Boolean,
            Self::Int(_) => ValueType::Int,
            Self::Long(_) => ValueType::Long,
            Self::Float(_) => ValueType::Float,
            Self::Double(_) => ValueType::Double,
            Self::Decimal(_) => ValueType::BigDecimal,
            Self::Char(_) => ValueType::Char,
            Self::String(_) => ValueType::String,
            Self::List(_) => ValueType::List,
            Self::Pair(_) => ValueType::Pair,
            Self::Triple(_) => ValueType::Triple,
            Self::Record(_) => ValueType::Record,
        }
    }

    /// Returns true if this is `NULL`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean if this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Builds a record from `(name, value)` pairs.
    #[must_use]
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, BoundValue)>,
    {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Compares two values of the same kind.
    ///
    /// Returns `None` when the kinds differ or the kind has no total order.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Long(a), Self::Long(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Double(a), Self::Double(b)) => a.partial_cmp(b),
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::Char(a), Self::Char(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Long(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Double(n) => write!(f, "{n}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::String(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Pair(pair) => write!(f, "({}, {})", pair.0, pair.1),
            Self::Triple(triple) => write!(f, "({}, {}, {})", triple.0, triple.1, triple.2),
            Self::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, field)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={}", field.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A runtime value paired with its declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundValue {
    /// The runtime value.
    pub value: Value,
    /// The declared type, kept even when `value` is `NULL`.
    #[serde(rename = "type")]
    pub ty: ValueType,
}

impl BoundValue {
    /// Creates a bound value with an explicit declared type.
    #[must_use]
    pub const fn new(value: Value, ty: ValueType) -> Self {
        Self { value, ty }
    }

    /// Creates a bound value whose declared type is the runtime type.
    #[must_use]
    pub const fn of(value: Value) -> Self {
        let ty = value.value_type();
        Self { value, ty }
    }

    /// Creates a typed `NULL`.
    #[must_use]
    pub const fn null(ty: ValueType) -> Self {
        Self {
            value: Value::Null,
            ty,
        }
    }

    /// Converts any [`ToValue`] into a bound value, keeping its declared type.
    pub fn from_value<T: ToValue>(value: T) -> Self {
        let value = value.to_value();
        let ty = if T::TYPE == ValueType::Any {
            value.value_type()
        } else {
            T::TYPE
        };
        Self { value, ty }
    }
}

/// Trait for types that can be converted to template values.
pub trait ToValue {
    /// The declared type used when the converted value is `NULL`.
    const TYPE: ValueType;

    /// Converts the value to a [`Value`].
    fn to_value(self) -> Value;
}

impl ToValue for Value {
    const TYPE: ValueType = ValueType::Any;

    fn to_value(self) -> Value {
        self
    }
}

impl ToValue for bool {
    const TYPE: ValueType = ValueType::Boolean;

    fn to_value(self) -> Value {
        Value::Bool(self)
    }
}

impl ToValue for i32 {
    const TYPE: ValueType = ValueType::Int;

    fn to_value(self) -> Value {
        Value::Int(self)
    }
}

impl ToValue for i16 {
    const TYPE: ValueType = ValueType::Int;

    fn to_value(self) -> Value {
        Value::Int(i32::from(self))
    }
}

impl ToValue for u16 {
    const TYPE: ValueType = ValueType::Int;

    fn to_value(self) -> Value {
        Value::Int(i32::from(self))
    }
}

impl ToValue for u8 {
    const TYPE: ValueType = ValueType::Int;

    fn to_value(self) -> Value {
        Value::Int(i32::from(self))
    }
}

impl ToValue for i64 {
    const TYPE: ValueType = ValueType::Long;

    fn to_value(self) -> Value {
        Value::Long(self)
    }
}

impl ToValue for u32 {
    const TYPE: ValueType = ValueType::Long;

    fn to_value(self) -> Value {
        Value::Long(i64::from(self))
    }
}

impl ToValue for f32 {
    const TYPE: ValueType = ValueType::Float;

    fn to_value(self) -> Value {
        Value::Float(self)
    }
}

impl ToValue for f64 {
    const TYPE: ValueType = ValueType::Double;

    fn to_value(self) -> Value {
        Value::Double(self)
    }
}

impl ToValue for Decimal {
    const TYPE: ValueType = ValueType::BigDecimal;

    fn to_value(self) -> Value {
        Value::Decimal(self)
    }
}

impl ToValue for char {
    const TYPE: ValueType = ValueType::Char;

    fn to_value(self) -> Value {
        Value::Char(self)
    }
}

impl ToValue for String {
    const TYPE: ValueType = ValueType::String;

    fn to_value(self) -> Value {
        Value::String(self)
    }
}

impl ToValue for &str {
    const TYPE: ValueType = ValueType::String;

    fn to_value(self) -> Value {
        Value::String(String::from(self))
    }
}

impl<T: ToValue> ToValue for Option<T> {
    const TYPE: ValueType = T::TYPE;

    fn to_value(self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    const TYPE: ValueType = ValueType::List;

    fn to_value(self) -> Value {
        Value::List(self.into_iter().map(ToValue::to_value).collect())
    }
}

impl<A: ToValue, B: ToValue> ToValue for (A, B) {
    const TYPE: ValueType = ValueType::Pair;

    fn to_value(self) -> Value {
        Value::Pair(Box::new((self.0.to_value(), self.1.to_value())))
    }
}

impl<A: ToValue, B: ToValue, C: ToValue> ToValue for (A, B, C) {
    const TYPE: ValueType = ValueType::Triple;

    fn to_value(self) -> Value {
        Value::Triple(Box::new((
            self.0.to_value(),
            self.1.to_value(),
            self.2.to_value(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_keeps_declared_type() {
        let bound = BoundValue::from_value(None::<String>);
        assert_eq!(bound.value, Value::Null);
        assert_eq!(bound.ty, ValueType::String);
    }

    #[test]
    fn test_untyped_value_uses_runtime_type() {
        let bound = BoundValue::from_value(Value::Long(7));
        assert_eq!(bound.ty, ValueType::Long);
        assert_eq!(BoundValue::of(Value::Null).ty, ValueType::Any);
    }

    #[test]
    fn test_to_value_conversions() {
        assert_eq!(true.to_value(), Value::Bool(true));
        assert_eq!(42_i32.to_value(), Value::Int(42));
        assert_eq!(42_i64.to_value(), Value::Long(42));
        assert_eq!("hello".to_value(), Value::String(String::from("hello")));
        assert_eq!(Some(1_u8).to_value(), Value::Int(1));
        assert_eq!(
            vec![1, 2].to_value(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert_eq!(
            ("a", 1).to_value(),
            Value::Pair(Box::new((Value::String(String::from("a")), Value::Int(1))))
        );
    }

    #[test]
    fn test_compare_same_kind() {
        assert_eq!(Value::Int(1).compare(&Value::Int(2)), Some(Ordering::Less));
        assert_eq!(
            Value::String(String::from("b")).compare(&Value::String(String::from("a"))),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(1).compare(&Value::Long(1)), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::String(String::from("x"))]).to_string(),
            "[1, x]"
        );
        let record = Value::record([("id", BoundValue::of(Value::Int(3)))]);
        assert_eq!(record.to_string(), "{id=3}");
    }
}
