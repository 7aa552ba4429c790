//! Expression AST.

use crate::location::Location;
use crate::value::{Value, ValueType};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
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
}

impl BinaryOp {
    /// Returns the operator as written.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }

    /// Returns true for `&&` and `||`.
    #[must_use]
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}

/// An expression node. Every node records where it starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    /// A literal with its declared type.
    Literal {
        value: Value,
        ty: ValueType,
        location: Location,
    },
    /// A top-level name resolved in the parameter context.
    Value { name: String, location: Location },
    /// Property access (`receiver.name`).
    Property {
        receiver: Box<ExprNode>,
        name: String,
        location: Location,
    },
    /// Function call (`receiver.name(args)`).
    ///
    /// `args` is `Empty` for no arguments and `Comma` for several.
    Function {
        receiver: Box<ExprNode>,
        name: String,
        args: Box<ExprNode>,
        location: Location,
    },
    /// Comma separated list.
    Comma {
        items: Vec<ExprNode>,
        location: Location,
    },
    /// Logical negation.
    Not {
        operand: Box<ExprNode>,
        location: Location,
    },
    /// Binary operation.
    Binary {
        op: BinaryOp,
        left: Box<ExprNode>,
        right: Box<ExprNode>,
        location: Location,
    },
    /// Nothing; evaluates to an untyped `NULL`.
    Empty { location: Location },
}

impl ExprNode {
    /// Returns the location of the node.
    #[must_use]
    pub const fn location(&self) -> &Location {
        match self {
            Self::Literal { location, .. }
            | Self::Value { location, .. }
            | Self::Property { location, .. }
            | Self::Function { location, .. }
            | Self::Comma { location, .. }
            | Self::Not { location, .. }
            | Self::Binary { location, .. }
            | Self::Empty { location } => location,
        }
    }

    /// Collects the top-level names the expression reads, in order of
    /// appearance and without duplicates.
    #[must_use]
    pub fn free_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Self::Value { name, .. } => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Self::Property { receiver, .. } => receiver.collect_names(names),
            Self::Function { receiver, args, .. } => {
                receiver.collect_names(names);
                args.collect_names(names);
            }
            Self::Comma { items, .. } => {
                for item in items {
                    item.collect_names(names);
                }
            }
            Self::Not { operand, .. } => operand.collect_names(names),
            Self::Binary { left, right, .. } => {
                left.collect_names(names);
                right.collect_names(names);
            }
            Self::Literal { .. } | Self::Empty { .. } => {}
        }
    }
}
