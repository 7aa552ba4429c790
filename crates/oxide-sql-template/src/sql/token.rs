//! Token types for the template lexer.

use crate::location::Span;

/// SQL clause keywords that open a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Select,
    From,
    Where,
    GroupBy,
    Having,
    OrderBy,
    ForUpdate,
    Option,
}

impl ClauseKind {
    /// Returns the canonical keyword.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::From => "from",
            Self::Where => "where",
            Self::GroupBy => "group by",
            Self::Having => "having",
            Self::OrderBy => "order by",
            Self::ForUpdate => "for update",
            Self::Option => "option",
        }
    }

    /// Returns true if the keyword is emitted even when the clause body
    /// rendered nothing.
    #[must_use]
    pub const fn is_always_emitted(&self) -> bool {
        matches!(self, Self::Select | Self::From | Self::ForUpdate)
    }
}

/// Set operators joining two statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperator {
    Union,
    Except,
    Minus,
    Intersect,
}

/// Boolean connectors between predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

/// The kind of template token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlTokenKind {
    /// Identifier, number, or double-quoted identifier
    Word,
    /// Single-quoted literal
    Quote,
    /// Whitespace run, newlines included
    Whitespace,
    /// `(`
    OpenBracket,
    /// `)`
    CloseBracket,
    /// `;`
    Delimiter,
    /// Clause keyword
    Clause(ClauseKind),
    /// Set operator keyword
    Set(SetOperator),
    /// `and` / `or`
    Logical(LogicalOperator),
    /// `/*name*/`
    BindValueDirective,
    /// `/*^name*/`
    LiteralValueDirective,
    /// `/*#name*/`
    EmbeddedValueDirective,
    /// `/*%expand alias*/`
    ExpandDirective,
    /// `/*%if expr*/`
    IfDirective,
    /// `/*%elseif expr*/`
    ElseifDirective,
    /// `/*%else*/`
    ElseDirective,
    /// `/*%end*/`
    EndDirective,
    /// `/*%for id in expr*/`
    ForDirective,
    /// Block or line comment that is not a directive
    Comment,
    /// Any other single character
    Other,
    /// End of template
    Eof,
}

impl SqlTokenKind {
    /// Returns the number of bytes that precede the directive body, or
    /// `None` for tokens that are not directives with a body.
    #[must_use]
    pub const fn directive_prefix_len(&self) -> Option<usize> {
        match self {
            Self::BindValueDirective => Some(2),
            Self::LiteralValueDirective | Self::EmbeddedValueDirective => Some(3),
            Self::IfDirective => Some(5),
            Self::ForDirective => Some(6),
            Self::ElseifDirective | Self::ExpandDirective => Some(9),
            Self::ElseDirective => Some(7),
            Self::EndDirective => Some(6),
            _ => None,
        }
    }

    /// Returns the directive name used in diagnostics.
    #[must_use]
    pub const fn directive_name(&self) -> &'static str {
        match self {
            Self::BindValueDirective => "bind value",
            Self::LiteralValueDirective => "literal value",
            Self::EmbeddedValueDirective => "embedded value",
            Self::ExpandDirective => "expand",
            Self::IfDirective => "if",
            Self::ElseifDirective => "elseif",
            Self::ElseDirective => "else",
            Self::EndDirective => "end",
            Self::ForDirective => "for",
            _ => "unknown",
        }
    }
}

/// A template token with its text and span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlToken<'a> {
    /// The kind of token.
    pub kind: SqlTokenKind,
    /// The exact source text of the token.
    pub text: &'a str,
    /// The location in the template.
    pub span: Span,
}

impl<'a> SqlToken<'a> {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: SqlTokenKind, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }

    /// Returns the trimmed text between the directive sigil and the closing
    /// `*/`, or `None` if this token is not a directive.
    #[must_use]
    pub fn directive_body(&self) -> Option<&'a str> {
        let start = self.kind.directive_prefix_len()?;
        let end = self.text.len().checked_sub(2)?;
        self.text.get(start..end).map(str::trim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_body() {
        let token = SqlToken::new(SqlTokenKind::IfDirective, "/*%if a > 1 */", Span::new(0, 14));
        assert_eq!(token.directive_body(), Some("a > 1"));

        let token = SqlToken::new(SqlTokenKind::BindValueDirective, "/*name*/", Span::new(0, 8));
        assert_eq!(token.directive_body(), Some("name"));

        let token = SqlToken::new(SqlTokenKind::ElseDirective, "/*%else*/", Span::new(0, 9));
        assert_eq!(token.directive_body(), Some(""));

        let token = SqlToken::new(SqlTokenKind::Word, "name", Span::new(0, 4));
        assert_eq!(token.directive_body(), None);
    }

    #[test]
    fn test_always_emitted_clauses() {
        assert!(ClauseKind::Select.is_always_emitted());
        assert!(ClauseKind::ForUpdate.is_always_emitted());
        assert!(!ClauseKind::Where.is_always_emitted());
        assert!(!ClauseKind::OrderBy.is_always_emitted());
    }
}
