//! Properties and functions available on values inside expressions.
//!
//! Member access is resolved through a registry keyed by the runtime type of
//! the receiver instead of open-ended reflection. Record fields are looked
//! up before any registered property. The `Any` table applies to every
//! non-null receiver.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::value::{BoundValue, Value, ValueType};

/// A property resolver.
pub type PropertyFn = Arc<dyn Fn(&Value) -> BoundValue + Send + Sync>;

/// A function resolver. An `Err` carries the evaluation error message.
pub type FunctionFn =
    Arc<dyn Fn(&Value, &[BoundValue]) -> Result<BoundValue, String> + Send + Sync>;

/// The members registered for one receiver type.
#[derive(Clone, Default)]
struct Capabilities {
    properties: HashMap<String, PropertyFn>,
    functions: HashMap<String, FunctionFn>,
}

/// Registry of member capabilities per receiver type.
#[derive(Clone)]
pub struct Extensions {
    tables: HashMap<ValueType, Capabilities>,
}

impl Extensions {
    /// Creates a registry without any members.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Registers a property for receivers of type `ty`.
    pub fn register_property<F>(&mut self, ty: ValueType, name: &str, resolver: F) -> &mut Self
    where
        F: Fn(&Value) -> BoundValue + Send + Sync + 'static,
    {
        self.tables
            .entry(ty)
            .or_default()
            .properties
            .insert(name.to_string(), Arc::new(resolver));
        self
    }

    /// Registers a function for receivers of type `ty`.
    pub fn register_function<F>(&mut self, ty: ValueType, name: &str, resolver: F) -> &mut Self
    where
        F: Fn(&Value, &[BoundValue]) -> Result<BoundValue, String> + Send + Sync + 'static,
    {
        self.tables
            .entry(ty)
            .or_default()
            .functions
            .insert(name.to_string(), Arc::new(resolver));
        self
    }

    /// Resolves a property on a non-null receiver.
    #[must_use]
    pub fn property(&self, receiver: &Value, name: &str) -> Option<BoundValue> {
        if let Value::Record(fields) = receiver {
            if let Some(field) = fields.get(name) {
                return Some(field.clone());
            }
        }
        [receiver.value_type(), ValueType::Any]
            .iter()
            .filter_map(|ty| self.tables.get(ty))
            .find_map(|table| table.properties.get(name))
            .map(|resolver| resolver(receiver))
    }

    /// Finds a function on a non-null receiver.
    #[must_use]
    pub fn function(&self, receiver: &Value, name: &str) -> Option<&FunctionFn> {
        [receiver.value_type(), ValueType::Any]
            .iter()
            .filter_map(|ty| self.tables.get(ty))
            .find_map(|table| table.functions.get(name))
    }

    fn register_string_defaults(&mut self) {
        let ty = ValueType::String;
        self.register_property(ty, "length", |v| int(text(v).chars().count()));
        self.register_function(ty, "length", |v, args| {
            arity(args, 0)?;
            Ok(int(text(v).chars().count()))
        });
        self.register_function(ty, "isEmpty", |v, args| {
            arity(args, 0)?;
            Ok(boolean(text(v).is_empty()))
        });
        self.register_function(ty, "isNotEmpty", |v, args| {
            arity(args, 0)?;
            Ok(boolean(!text(v).is_empty()))
        });
        self.register_function(ty, "isBlank", |v, args| {
            arity(args, 0)?;
            Ok(boolean(text(v).trim().is_empty()))
        });
        self.register_function(ty, "isNotBlank", |v, args| {
            arity(args, 0)?;
            Ok(boolean(!text(v).trim().is_empty()))
        });
        self.register_function(ty, "startsWith", |v, args| {
            Ok(boolean(text(v).starts_with(string_arg(args)?)))
        });
        self.register_function(ty, "endsWith", |v, args| {
            Ok(boolean(text(v).ends_with(string_arg(args)?)))
        });
        self.register_function(ty, "contains", |v, args| {
            Ok(boolean(text(v).contains(string_arg(args)?)))
        });
        self.register_function(ty, "trim", |v, args| {
            arity(args, 0)?;
            Ok(string(text(v).trim().to_string()))
        });
        self.register_function(ty, "uppercase", |v, args| {
            arity(args, 0)?;
            Ok(string(text(v).to_uppercase()))
        });
        self.register_function(ty, "lowercase", |v, args| {
            arity(args, 0)?;
            Ok(string(text(v).to_lowercase()))
        });
        self.register_function(ty, "escape", |v, args| {
            arity(args, 0)?;
            Ok(string(escape_like(text(v))))
        });
        self.register_function(ty, "asPrefix", |v, args| {
            arity(args, 0)?;
            Ok(string(format!("{}%", escape_like(text(v)))))
        });
        self.register_function(ty, "asInfix", |v, args| {
            arity(args, 0)?;
            Ok(string(format!("%{}%", escape_like(text(v)))))
        });
        self.register_function(ty, "asSuffix", |v, args| {
            arity(args, 0)?;
            Ok(string(format!("%{}", escape_like(text(v)))))
        });
    }

    fn register_list_defaults(&mut self) {
        let ty = ValueType::List;
        self.register_property(ty, "size", |v| int(items(v).len()));
        self.register_function(ty, "size", |v, args| {
            arity(args, 0)?;
            Ok(int(items(v).len()))
        });
        self.register_function(ty, "isEmpty", |v, args| {
            arity(args, 0)?;
            Ok(boolean(items(v).is_empty()))
        });
        self.register_function(ty, "isNotEmpty", |v, args| {
            arity(args, 0)?;
            Ok(boolean(!items(v).is_empty()))
        });
        self.register_function(ty, "contains", |v, args| {
            arity(args, 1)?;
            Ok(boolean(items(v).contains(&args[0].value)))
        });
        self.register_function(ty, "get", |v, args| {
            arity(args, 1)?;
            let list = items(v);
            let Value::Int(index) = args[0].value else {
                return Err(format!(
                    "The argument of \"get\" must be an Int, but it is \"{}\"",
                    args[0].ty
                ));
            };
            usize::try_from(index)
                .ok()
                .and_then(|i| list.get(i))
                .map(|item| BoundValue::of(item.clone()))
                .ok_or_else(|| {
                    format!(
                        "The index {index} is out of bounds for a list of size {}",
                        list.len()
                    )
                })
        });
    }

    fn register_tuple_defaults(&mut self) {
        self.register_property(ValueType::Pair, "first", |v| match v {
            Value::Pair(pair) => BoundValue::of(pair.0.clone()),
            _ => BoundValue::null(ValueType::Any),
        });
        self.register_property(ValueType::Pair, "second", |v| match v {
            Value::Pair(pair) => BoundValue::of(pair.1.clone()),
            _ => BoundValue::null(ValueType::Any),
        });
        self.register_property(ValueType::Triple, "first", |v| match v {
            Value::Triple(triple) => BoundValue::of(triple.0.clone()),
            _ => BoundValue::null(ValueType::Any),
        });
        self.register_property(ValueType::Triple, "second", |v| match v {
            Value::Triple(triple) => BoundValue::of(triple.1.clone()),
            _ => BoundValue::null(ValueType::Any),
        });
        self.register_property(ValueType::Triple, "third", |v| match v {
            Value::Triple(triple) => BoundValue::of(triple.2.clone()),
            _ => BoundValue::null(ValueType::Any),
        });
    }
}

impl Default for Extensions {
    /// Creates a registry with the built-in string, list, tuple and
    /// `toString()` members.
    fn default() -> Self {
        let mut extensions = Self::empty();
        extensions.register_string_defaults();
        extensions.register_list_defaults();
        extensions.register_tuple_defaults();
        extensions.register_function(ValueType::Any, "toString", |v, args| {
            arity(args, 0)?;
            Ok(string(v.to_string()))
        });
        extensions
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (ty, table) in &self.tables {
            let mut members: Vec<&str> = table
                .properties
                .keys()
                .chain(table.functions.keys())
                .map(String::as_str)
                .collect();
            members.sort_unstable();
            members.dedup();
            map.entry(ty, &members);
        }
        map.finish()
    }
}

/// Escapes the LIKE wildcards `%` and `_` and the escape character `\`.
#[must_use]
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn text(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

fn items(value: &Value) -> &[Value] {
    match value {
        Value::List(items) => items,
        _ => &[],
    }
}

fn int(n: usize) -> BoundValue {
    BoundValue::of(Value::Int(i32::try_from(n).unwrap_or(i32::MAX)))
}

const fn boolean(b: bool) -> BoundValue {
    BoundValue::new(Value::Bool(b), ValueType::Boolean)
}

const fn string(s: String) -> BoundValue {
    BoundValue::new(Value::String(s), ValueType::String)
}

fn arity(args: &[BoundValue], expected: usize) -> Result<(), String> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(format!(
            "The function expects {expected} argument(s), but {} were given",
            args.len()
        ))
    }
}

fn string_arg(args: &[BoundValue]) -> Result<&str, String> {
    arity(args, 1)?;
    args[0].value.as_str().ok_or_else(|| {
        format!(
            "The argument must be a String, but it is \"{}\"",
            args[0].value.value_type()
        )
    })
}
