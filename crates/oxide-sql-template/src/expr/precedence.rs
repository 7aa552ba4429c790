//! Operator priorities for the expression parser.
//!
//! Higher priority binds tighter. Property and function access bind tightest
//! of all and are applied to the preceding operand as soon as they are read,
//! so they never sit on the operator stack.

use super::ExprTokenKind;

/// Priority of property and function access.
pub const MEMBER_PRIORITY: u8 = 60;

/// An operator waiting on the parser's operator stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `,`
    Comma,
    /// `||`
    Or,
    /// `&&`
    And,
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
    /// `!`
    Not,
}

impl Operator {
    /// Maps an operator token to its operator.
    ///
    /// Returns `None` if the token is not an operator.
    #[must_use]
    pub const fn from_token(kind: ExprTokenKind) -> Option<Self> {
        match kind {
            ExprTokenKind::Comma => Some(Self::Comma),
            ExprTokenKind::Or => Some(Self::Or),
            ExprTokenKind::And => Some(Self::And),
            ExprTokenKind::Eq => Some(Self::Eq),
            ExprTokenKind::Ne => Some(Self::Ne),
            ExprTokenKind::Ge => Some(Self::Ge),
            ExprTokenKind::Le => Some(Self::Le),
            ExprTokenKind::Gt => Some(Self::Gt),
            ExprTokenKind::Lt => Some(Self::Lt),
            ExprTokenKind::Not => Some(Self::Not),
            _ => None,
        }
    }

    /// Returns the binding priority.
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Comma => 0,
            Self::Or => 10,
            Self::And => 20,
            Self::Eq | Self::Ne | Self::Ge | Self::Le | Self::Gt | Self::Lt => 40,
            Self::Not => 50,
        }
    }

    /// Returns true for operators written before their only operand.
    #[must_use]
    pub const fn is_prefix(self) -> bool {
        matches!(self, Self::Not)
    }

    /// Returns the operator as written.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Comma => ",",
            Self::Or => "||",
            Self::And => "&&",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Not => "!",
        }
    }

    /// Returns true if an operator already on the stack must be reduced
    /// before `incoming` is pushed.
    ///
    /// Equal priorities reduce, which makes binary operators left
    /// associative. A prefix operator never reduces anything because its
    /// operand has not been read yet.
    #[must_use]
    pub const fn reduces_before(self, incoming: Self) -> bool {
        !incoming.is_prefix() && self.priority() >= incoming.priority()
    }
}
