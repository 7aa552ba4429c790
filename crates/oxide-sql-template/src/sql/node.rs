//! Template AST.
//!
//! Nodes are built once by the parser and only read afterwards, so a parsed
//! tree can be shared between threads and rendered any number of times.

use super::{ClauseKind, LogicalOperator, SetOperator};
use crate::location::Location;

/// A directive as written in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// The expression inside the directive, trimmed.
    pub expression: String,
    /// The full directive text including `/*` and `*/`.
    pub text: String,
    /// Where the directive starts.
    pub location: Location,
}

/// One conditional branch of an `if` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// The `if` or `elseif` directive holding the condition.
    pub directive: Directive,
    /// The branch body.
    pub children: Vec<Node>,
}

/// A template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A sequence of nodes.
    Statement(Vec<Node>),
    /// Two statements joined by `union`, `except`, `minus` or `intersect`.
    SetOperation {
        left: Box<Node>,
        op: SetOperator,
        keyword: String,
        right: Box<Node>,
    },
    /// A clause whose keyword is dropped if its body renders nothing.
    Clause {
        kind: ClauseKind,
        keyword: String,
        children: Vec<Node>,
    },
    /// An `and`/`or` connector and the predicate that follows it.
    Logical {
        op: LogicalOperator,
        keyword: String,
        children: Vec<Node>,
    },
    /// A word, number, or quoted literal.
    Word(String),
    Whitespace(String),
    /// Any other character, such as `=` or `*`.
    Other(String),
    Comment(String),
    /// A parenthesized group.
    Brackets(Box<Node>),
    /// `/*expr*/`; `test_literal` is the sample value written after it.
    BindValue {
        directive: Directive,
        test_literal: Option<Box<Node>>,
    },
    /// `/*^expr*/`; `test_literal` is the sample value written after it.
    LiteralValue {
        directive: Directive,
        test_literal: Option<Box<Node>>,
    },
    /// `/*#expr*/`
    EmbeddedValue { directive: Directive },
    /// `/*%expand alias*/`; `test_literal` is the `*` written after it.
    Expand {
        directive: Directive,
        test_literal: Option<Box<Node>>,
    },
    /// `/*%if*/ ... /*%elseif*/ ... /*%else*/ ... /*%end*/`
    IfBlock {
        if_branch: Branch,
        elseif_branches: Vec<Branch>,
        else_branch: Option<Vec<Node>>,
    },
    /// `/*%for id in expr*/ ... /*%end*/`
    ForBlock {
        directive: Directive,
        identifier: String,
        expression: String,
        children: Vec<Node>,
    },
}

impl Node {
    /// Rebuilds the template text of this node, directives and test
    /// literals included. `else` and `end` directives come out in their
    /// canonical form.
    #[must_use]
    pub fn to_template(&self) -> String {
        let mut out = String::new();
        self.write_template(&mut out);
        out
    }

    fn write_template(&self, out: &mut String) {
        match self {
            Self::Statement(children) => write_all(children, out),
            Self::SetOperation {
                left,
                keyword,
                right,
                ..
            } => {
                left.write_template(out);
                out.push_str(keyword);
                right.write_template(out);
            }
            Self::Clause {
                keyword, children, ..
            }
            | Self::Logical {
                keyword, children, ..
            } => {
                out.push_str(keyword);
                write_all(children, out);
            }
            Self::Word(text) | Self::Whitespace(text) | Self::Other(text) | Self::Comment(text) => {
                out.push_str(text);
            }
            Self::Brackets(inner) => {
                out.push('(');
                inner.write_template(out);
                out.push(')');
            }
            Self::BindValue {
                directive,
                test_literal,
            }
            | Self::LiteralValue {
                directive,
                test_literal,
            }
            | Self::Expand {
                directive,
                test_literal,
            } => {
                out.push_str(&directive.text);
                if let Some(literal) = test_literal {
                    literal.write_template(out);
                }
            }
            Self::EmbeddedValue { directive } => out.push_str(&directive.text),
            Self::IfBlock {
                if_branch,
                elseif_branches,
                else_branch,
            } => {
                for branch in std::iter::once(if_branch).chain(elseif_branches) {
                    out.push_str(&branch.directive.text);
                    write_all(&branch.children, out);
                }
                if let Some(children) = else_branch {
                    out.push_str("/*%else*/");
                    write_all(children, out);
                }
                out.push_str("/*%end*/");
            }
            Self::ForBlock {
                directive,
                children,
                ..
            } => {
                out.push_str(&directive.text);
                write_all(children, out);
                out.push_str("/*%end*/");
            }
        }
    }
}

fn write_all(nodes: &[Node], out: &mut String) {
    for node in nodes {
        node.write_template(out);
    }
}
