//! The expression language used inside directives.
//!
//! Expressions appear in `/*%if ...*/` conditions, `/*%for x in ...*/`
//! iterables and value directives such as `/*name*/`. They support literals,
//! top-level names, property and function access, comparisons and boolean
//! logic:
//!
//! ```
//! use oxide_sql_template::expr::{eval, parse, Extensions};
//! use oxide_sql_template::{ParamContext, Value};
//!
//! let node = parse("name.startsWith(\"a\") && age >= 18").unwrap();
//! let ctx = ParamContext::new().with("name", "alice").with("age", 30);
//! let result = eval(&node, &ctx, &Extensions::default()).unwrap();
//! assert_eq!(result.value, Value::Bool(true));
//! ```

mod eval;
mod extensions;
mod lexer;
mod node;
mod parser;
pub mod precedence;
mod token;

pub use eval::Evaluator;
pub use extensions::{escape_like, Extensions, FunctionFn, PropertyFn};
pub use lexer::ExprLexer;
pub(crate) use lexer::{is_identifier_part, is_identifier_start};
pub use node::{BinaryOp, ExprNode};
pub use parser::ExprParser;
pub use token::{ExprToken, ExprTokenKind};

use crate::context::ParamContext;
use crate::error::ExprError;
use crate::value::BoundValue;

/// Parses an expression with the default nesting limit.
///
/// # Errors
///
/// Returns a lexical or parse error.
pub fn parse(expression: &str) -> Result<ExprNode, ExprError> {
    ExprParser::new(expression).parse()
}

/// Evaluates a parsed expression.
///
/// # Errors
///
/// Returns an evaluation error.
pub fn eval(
    node: &ExprNode,
    context: &ParamContext,
    extensions: &Extensions,
) -> Result<BoundValue, ExprError> {
    Evaluator::new(context, extensions).eval(node)
}
