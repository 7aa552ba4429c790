//! # oxide-sql-template
//!
//! Two-way SQL templates compiled into parameterized statements.
//!
//! A template is ordinary SQL in which directives live inside comments. The
//! text runs as-is in a SQL console (directives are comments and the sample
//! values after them are valid literals), and the same text compiles into a
//! statement with `?` placeholders:
//!
//! - `/*name*/'sample'` binds a value; the sample literal is dropped
//! - `/*^expr*/1` inlines a formatted literal
//! - `/*#expr*/` embeds a raw SQL fragment
//! - `/*%expand alias*/*` expands into a column list
//! - `/*%if*/ ... /*%elseif*/ ... /*%else*/ ... /*%end*/` selects a branch
//! - `/*%for x in list*/ ... /*%end*/` repeats its body
//!
//! Clauses whose bodies render nothing disappear, and so do leading
//! `and`/`or` connectors, so optional predicates need no `where 1 = 1`.
//!
//! ## Example
//!
//! ```rust
//! use oxide_sql_template::{ParamContext, StatementBuilder, Value};
//!
//! let template = "select name, age from person \
//!     where /*%if name != null*/name = /*name*/'test'/*%end*/ \
//!     /*%if age != null*/and age > /*age*/10/*%end*/";
//!
//! let builder = StatementBuilder::new();
//! let params = ParamContext::new()
//!     .with("name", None::<String>)
//!     .with("age", 30);
//! let stmt = builder.build(template, &params).unwrap();
//!
//! assert_eq!(stmt.text, "select name, age from person where   age > ?");
//! assert_eq!(stmt.values[0].value, Value::Int(30));
//! ```
//!
//! ## SQL Injection
//!
//! Bound values never reach the SQL text. Literal (`/*^ */`) and embedded
//! (`/*# */`) directives write into the text directly and must only be fed
//! trusted input.

pub mod builder;
pub mod cache;
pub mod context;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod location;
pub mod sql;
pub mod value;

pub use builder::{BuilderConfig, StatementBuilder};
pub use cache::NodeCache;
pub use context::ParamContext;
pub use dialect::{Dialect, GenericDialect};
pub use error::{ErrorKind, ExprError, Result, TemplateError};
pub use location::{Location, Span};
pub use sql::{Node, SqlParser, Statement};
pub use value::{BoundValue, ToValue, Value, ValueType};

/// Default nesting limit for brackets, blocks and expression groups.
pub const DEFAULT_MAX_DEPTH: usize = 64;
