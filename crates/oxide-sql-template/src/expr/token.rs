//! Token types for the expression lexer.

use crate::location::Span;

/// The kind of expression token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprTokenKind {
    // Names
    /// Top-level name resolved in the parameter context (e.g. `name`)
    Value,
    /// Property access (e.g. `.name`)
    Property,
    /// Function call name, always followed by `(` (e.g. `.isEmpty`)
    Function,

    // Literals
    /// Integer literal (e.g. `42`)
    Int,
    /// Long literal (e.g. `42L`)
    Long,
    /// Float literal (e.g. `1.5F`)
    Float,
    /// Double literal (e.g. `1.5D`)
    Double,
    /// Decimal literal (e.g. `1.5B`)
    BigDecimal,
    /// Char literal (e.g. `'a'`)
    Char,
    /// String literal (e.g. `"abc"`)
    String,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,

    // Operators
    /// `!`
    Not,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,

    // Delimiters
    /// `(`
    OpenBracket,
    /// `)`
    CloseBracket,
    /// `,`
    Comma,

    // Special
    /// Whitespace run
    Whitespace,
    /// Anything the language does not support
    Other,
    /// End of expression
    Eoe,
}

impl ExprTokenKind {
    /// Returns true if the token produces a value that a binary operator,
    /// property, or function access may follow.
    #[must_use]
    pub const fn produces_value(self) -> bool {
        matches!(
            self,
            Self::Value
                | Self::Property
                | Self::Int
                | Self::Long
                | Self::Float
                | Self::Double
                | Self::BigDecimal
                | Self::Char
                | Self::String
                | Self::True
                | Self::False
                | Self::Null
                | Self::CloseBracket
        )
    }
}

/// An expression token with its text and span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExprToken<'a> {
    /// The kind of token.
    pub kind: ExprTokenKind,
    /// The exact source text of the token.
    pub text: &'a str,
    /// The location in the expression.
    pub span: Span,
}

impl<'a> ExprToken<'a> {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: ExprTokenKind, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }

    /// Returns true if this is the end-of-expression token.
    #[must_use]
    pub const fn is_eoe(&self) -> bool {
        matches!(self.kind, ExprTokenKind::Eoe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_produces_value() {
        assert!(ExprTokenKind::Value.produces_value());
        assert!(ExprTokenKind::CloseBracket.produces_value());
        assert!(!ExprTokenKind::Function.produces_value());
        assert!(!ExprTokenKind::And.produces_value());
        assert!(!ExprTokenKind::OpenBracket.produces_value());
    }

    #[test]
    fn test_token_is_eoe() {
        let eoe = ExprToken::new(ExprTokenKind::Eoe, "", Span::new(3, 3));
        let value = ExprToken::new(ExprTokenKind::Value, "abc", Span::new(0, 3));
        assert!(eoe.is_eoe());
        assert!(!value.is_eoe());
    }
}
