//! The parameter context directives are evaluated against.

use std::collections::HashMap;

use crate::value::{BoundValue, ToValue, Value};

/// Named parameters visible to template expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamContext {
    values: HashMap<String, BoundValue>,
}

impl ParamContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, consuming and returning the context.
    #[must_use]
    pub fn with<T: ToValue>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value);
        self
    }

    /// Adds or replaces a parameter.
    pub fn insert<T: ToValue>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), BoundValue::from_value(value));
    }

    /// Adds or replaces a parameter with an explicit declared type.
    pub fn insert_bound(
        &mut self,
        name: impl Into<String>,
        value: BoundValue,
    ) -> Option<BoundValue> {
        self.values.insert(name.into(), value)
    }

    /// Removes a parameter, returning its previous binding.
    pub fn remove(&mut self, name: &str) -> Option<BoundValue> {
        self.values.remove(name)
    }

    /// Looks up a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.values.get(name)
    }

    /// Returns true if the parameter is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Builds a context from the members of a JSON object.
    ///
    /// Returns `None` if `json` is not an object.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        let object = json.as_object()?;
        let values = object
            .iter()
            .map(|(name, v)| (name.clone(), BoundValue::of(json_to_value(v))))
            .collect();
        Some(Self { values })
    }
}

impl<K: Into<String>> FromIterator<(K, BoundValue)> for ParamContext {
    fn from_iter<I: IntoIterator<Item = (K, BoundValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Converts JSON into a template value.
///
/// Integers that fit 32 bits become `Int`, other integers `Long`, anything
/// with a fraction `Double`.
#[must_use]
pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Value::Long(i), Value::Int)
            } else {
                n.as_f64().map_or(Value::Null, Value::Double)
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(fields) => Value::Record(
            fields
                .iter()
                .map(|(name, v)| (name.clone(), BoundValue::of(json_to_value(v))))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;

    #[test]
    fn test_builder_style_insert() {
        let ctx = ParamContext::new().with("name", "aaa").with("age", 7);
        assert_eq!(ctx.len(), 2);
        assert_eq!(
            ctx.get("name"),
            Some(&BoundValue::new(
                Value::String(String::from("aaa")),
                ValueType::String
            ))
        );
    }

    #[test]
    fn test_insert_bound_returns_previous() {
        let mut ctx = ParamContext::new().with("i", 1);
        let previous = ctx.insert_bound("i", BoundValue::of(Value::Int(2)));
        assert_eq!(previous, Some(BoundValue::of(Value::Int(1))));
        assert_eq!(ctx.remove("i"), Some(BoundValue::of(Value::Int(2))));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({
            "name": "aaa",
            "ids": [1, 2],
            "big": 10_000_000_000_i64,
            "ratio": 0.5,
            "manager": { "name": "bbb" },
            "missing": null
        });
        let ctx = ParamContext::from_json(&json).unwrap();
        assert_eq!(ctx.get("ids").unwrap().ty, ValueType::List);
        assert_eq!(ctx.get("big").unwrap().value, Value::Long(10_000_000_000));
        assert_eq!(ctx.get("ratio").unwrap().value, Value::Double(0.5));
        assert_eq!(ctx.get("manager").unwrap().ty, ValueType::Record);
        assert_eq!(ctx.get("missing").unwrap().ty, ValueType::Any);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(ParamContext::from_json(&serde_json::json!([1, 2])).is_none());
    }
}
