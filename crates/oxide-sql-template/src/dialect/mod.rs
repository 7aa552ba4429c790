//! SQL Dialect support.
//!
//! A dialect decides how a value is written when it is inlined into SQL: by
//! literal directives (`/*^expr*/`) and in the log text of a rendered
//! statement.

mod generic;

pub use generic::GenericDialect;

use crate::value::{Value, ValueType};

/// Trait for SQL dialect-specific literal formatting.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the keyword written for `NULL`.
    fn null_literal(&self) -> &'static str {
        "NULL"
    }

    /// Returns the literal written for a boolean.
    fn bool_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Quotes a string literal, doubling embedded single quotes.
    fn quote_string(&self, text: &str) -> String {
        let escaped = text.replace('\'', "''");
        format!("'{escaped}'")
    }

    /// Formats a value as a SQL literal.
    ///
    /// The declared type is available to dialects that write typed `NULL`s
    /// or need it to pick a literal form; the default rules only look at
    /// the runtime value.
    fn format_value(&self, value: &Value, ty: ValueType) -> String {
        let _ = ty;
        match value {
            Value::Null => self.null_literal().to_string(),
            Value::Bool(b) => self.bool_literal(*b).to_string(),
            Value::Int(_)
            | Value::Long(_)
            | Value::Float(_)
            | Value::Double(_)
            | Value::Decimal(_) => value.to_string(),
            Value::Char(c) => self.quote_string(&c.to_string()),
            Value::String(s) => self.quote_string(s),
            Value::List(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| self.format_value(item, item.value_type()))
                    .collect();
                format!("({})", parts.join(", "))
            }
            Value::Pair(pair) => format!(
                "({}, {})",
                self.format_value(&pair.0, pair.0.value_type()),
                self.format_value(&pair.1, pair.1.value_type())
            ),
            Value::Triple(triple) => format!(
                "({}, {}, {})",
                self.format_value(&triple.0, triple.0.value_type()),
                self.format_value(&triple.1, triple.1.value_type()),
                self.format_value(&triple.2, triple.2.value_type())
            ),
            Value::Record(_) => self.quote_string(&value.to_string()),
        }
    }
}
