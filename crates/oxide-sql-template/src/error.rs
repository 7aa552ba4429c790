//! Error types for template compilation and expression evaluation.

use crate::location::Location;

/// Errors raised by the expression language.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    /// The expression text could not be tokenized.
    #[error("{message} at {location}")]
    Lexical {
        /// The error message.
        message: String,
        /// Where the offending token starts.
        location: Location,
    },

    /// The token stream does not form a complete expression.
    #[error("{message} at {location}")]
    Parse {
        /// The error message.
        message: String,
        /// Where the parser gave up.
        location: Location,
    },

    /// The expression is well-formed but cannot be evaluated against the
    /// supplied parameters.
    #[error("{message} at {location}")]
    Evaluation {
        /// The error message.
        message: String,
        /// The node being evaluated.
        location: Location,
    },
}

impl ExprError {
    pub(crate) fn lexical(message: impl Into<String>, location: Location) -> Self {
        Self::Lexical {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn parse(message: impl Into<String>, location: Location) -> Self {
        Self::Parse {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn evaluation(message: impl Into<String>, location: Location) -> Self {
        Self::Evaluation {
            message: message.into(),
            location,
        }
    }

    /// Returns the error message without the location suffix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Lexical { message, .. }
            | Self::Parse { message, .. }
            | Self::Evaluation { message, .. } => message,
        }
    }

    /// Returns the location inside the expression.
    #[must_use]
    pub const fn location(&self) -> &Location {
        match self {
            Self::Lexical { location, .. }
            | Self::Parse { location, .. }
            | Self::Evaluation { location, .. } => location,
        }
    }
}

/// Coarse classification of a [`TemplateError`].
///
/// `Lexical` and `Structural` point at a broken template; `Evaluation` points
/// at parameters that do not fit an otherwise valid template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unterminated quote/comment, illegal literal, empty directive body.
    Lexical,
    /// Unmatched bracket or block, non-iterable `for`, unresolved alias.
    Structural,
    /// Unresolved name or member, incompatible comparison.
    Evaluation,
}

/// Errors raised while compiling a SQL template into a statement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The template text could not be tokenized.
    #[error("{message} at {location}")]
    Lexical {
        /// The error message.
        message: String,
        /// Where the offending token starts.
        location: Location,
    },

    /// The directives or brackets of the template do not nest properly, or a
    /// directive value has the wrong shape.
    #[error("{message} at {location}")]
    Structural {
        /// The error message.
        message: String,
        /// The directive or bracket involved.
        location: Location,
    },

    /// A directive expression failed to tokenize, parse, or evaluate.
    #[error("The expression \"{expression}\" failed at {location}: {source}")]
    Expression {
        /// The directive expression text.
        expression: String,
        /// The directive location inside the template.
        location: Location,
        /// The underlying expression error.
        #[source]
        source: ExprError,
    },
}

impl TemplateError {
    pub(crate) fn lexical(message: impl Into<String>, location: Location) -> Self {
        Self::Lexical {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn structural(message: impl Into<String>, location: Location) -> Self {
        Self::Structural {
            message: message.into(),
            location,
        }
    }

    pub(crate) fn expression(
        expression: impl Into<String>,
        location: Location,
        source: ExprError,
    ) -> Self {
        Self::Expression {
            expression: expression.into(),
            location,
            source,
        }
    }

    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Lexical { .. }
            | Self::Expression {
                source: ExprError::Lexical { .. },
                ..
            } => ErrorKind::Lexical,
            Self::Structural { .. }
            | Self::Expression {
                source: ExprError::Parse { .. },
                ..
            } => ErrorKind::Structural,
            Self::Expression {
                source: ExprError::Evaluation { .. },
                ..
            } => ErrorKind::Evaluation,
        }
    }

    /// Returns the location inside the template.
    #[must_use]
    pub const fn location(&self) -> &Location {
        match self {
            Self::Lexical { location, .. }
            | Self::Structural { location, .. }
            | Self::Expression { location, .. } => location,
        }
    }
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;
