//! Statement builder.
//!
//! [`StatementBuilder`] ties the pieces together: it parses a template
//! (optionally through a [`NodeCache`]) and renders it with a literal
//! formatter, a column expander and the expression extensions.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::cache::NodeCache;
use crate::context::ParamContext;
use crate::dialect::{Dialect, GenericDialect};
use crate::error::Result;
use crate::expr::Extensions;
use crate::sql::{Expander, Formatter, Node, Renderer, SqlParser, Statement};
use crate::value::{Value, ValueType};
use crate::DEFAULT_MAX_DEPTH;

/// Builder settings that can be loaded from a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Nesting limit for brackets, blocks and expression groups.
    pub max_depth: usize,
    /// Capacity of the parsed template cache; no cache when absent.
    pub cache_capacity: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            cache_capacity: None,
        }
    }
}

/// Compiles SQL templates into parameterized statements.
///
/// A builder is immutable once configured and can be shared between
/// threads; [`build`](Self::build) takes `&self`.
///
/// # Example
///
/// ```
/// use oxide_sql_template::{ParamContext, StatementBuilder};
///
/// let builder = StatementBuilder::new();
/// let params = ParamContext::new().with("name", "aaa");
/// let stmt = builder
///     .build("select * from person where name = /*name*/'test'", &params)
///     .unwrap();
/// assert_eq!(stmt.text, "select * from person where name = ?");
/// assert_eq!(stmt.log, "select * from person where name = 'aaa'");
/// ```
#[derive(Clone)]
pub struct StatementBuilder {
    formatter: Arc<Formatter>,
    expander: Arc<Expander>,
    extensions: Extensions,
    max_depth: usize,
    cache: Option<Arc<NodeCache>>,
}

impl StatementBuilder {
    /// Creates a builder using [`GenericDialect`] literals, no column
    /// expansion and the default extensions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            formatter: dialect_formatter(GenericDialect::new()),
            expander: Arc::new(|_: &str| Vec::new()),
            extensions: Extensions::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            cache: None,
        }
    }

    /// Creates a builder from configuration.
    #[must_use]
    pub fn from_config(config: &BuilderConfig) -> Self {
        let builder = Self::new().with_max_depth(config.max_depth);
        match config.cache_capacity {
            Some(capacity) => builder.with_cache(Arc::new(NodeCache::with_capacity(capacity))),
            None => builder,
        }
    }

    /// Formats literals with the given dialect.
    #[must_use]
    pub fn with_dialect<D>(mut self, dialect: D) -> Self
    where
        D: Dialect + Send + Sync + 'static,
    {
        self.formatter = dialect_formatter(dialect);
        self
    }

    /// Formats literals with a closure.
    #[must_use]
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Value, ValueType) -> String + Send + Sync + 'static,
    {
        self.formatter = Arc::new(formatter);
        self
    }

    /// Sets the column expander used by `/*%expand*/`.
    ///
    /// The expander receives the alias prefix (`"e."`, or `""` without an
    /// alias) and returns fully qualified column names.
    #[must_use]
    pub fn with_expander<F>(mut self, expander: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        self.expander = Arc::new(expander);
        self
    }

    /// Replaces the property and function tables of the expression language.
    #[must_use]
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Sets the nesting limit.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Memoizes parsed templates in the given cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<NodeCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns the nesting limit.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns the parse cache, if one is configured.
    #[must_use]
    pub const fn cache(&self) -> Option<&Arc<NodeCache>> {
        self.cache.as_ref()
    }

    /// Parses a template, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Returns a lexical or structural error for a malformed template.
    pub fn parse(&self, template: &str) -> Result<Arc<Node>> {
        if let Some(cache) = &self.cache {
            if let Some(node) = cache.get(template) {
                debug!(len = template.len(), "Template cache hit");
                return Ok(node);
            }
            debug!(len = template.len(), "Template cache miss");
        }
        let node = SqlParser::with_max_depth(template, self.max_depth).parse()?;
        Ok(match &self.cache {
            Some(cache) => cache.insert(template, node),
            None => Arc::new(node),
        })
    }

    /// Compiles a template against a parameter context.
    ///
    /// # Errors
    ///
    /// Returns a lexical or structural error for a malformed template, and
    /// an expression error when a directive cannot be evaluated against
    /// `context`.
    pub fn build(&self, template: &str, context: &ParamContext) -> Result<Statement> {
        let node = self.parse(template)?;
        let renderer = Renderer::new(
            &*self.formatter,
            &*self.expander,
            &self.extensions,
            self.max_depth,
        );
        let statement = renderer.render(&node, context)?;
        debug!(
            sql = %statement.text,
            values = statement.values.len(),
            "Built statement"
        );
        Ok(statement)
    }
}

impl Default for StatementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatementBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementBuilder")
            .field("extensions", &self.extensions)
            .field("max_depth", &self.max_depth)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn dialect_formatter<D>(dialect: D) -> Arc<Formatter>
where
    D: Dialect + Send + Sync + 'static,
{
    Arc::new(move |value: &Value, ty: ValueType| dialect.format_value(value, ty))
}
