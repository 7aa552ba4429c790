//! The SQL template language.
//!
//! A template is plain SQL with directives hidden in comments, so the same
//! text runs unchanged in a SQL console:
//!
//! ```text
//! select name, age from person
//! where
//! /*%if name != null*/
//!   name = /*name*/'test'
//! /*%end*/
//! /*%if minAge != null*/
//!   and age >= /*minAge*/20
//! /*%end*/
//! ```
//!
//! Template text flows through [`SqlLexer`], [`SqlParser`] and
//! [`Renderer`].

mod lexer;
mod node;
mod parser;
mod render;
mod token;

pub use lexer::SqlLexer;
pub use node::{Branch, Directive, Node};
pub use parser::SqlParser;
pub use render::{Expander, Formatter, Renderer, Statement};
pub use token::{ClauseKind, LogicalOperator, SetOperator, SqlToken, SqlTokenKind};
