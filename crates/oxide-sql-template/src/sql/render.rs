//! Tree-walking renderer producing parameterized statements.

use serde::Serialize;
use tracing::trace;

use super::{Directive, Node, SqlLexer, SqlTokenKind};
use crate::context::ParamContext;
use crate::error::{ExprError, Result, TemplateError};
use crate::expr::{Evaluator, ExprNode, ExprParser, Extensions};
use crate::value::{BoundValue, Value, ValueType};

/// Formats a value as a SQL literal.
pub type Formatter = dyn Fn(&Value, ValueType) -> String + Send + Sync;

/// Expands an alias prefix such as `e.` into column names.
pub type Expander = dyn Fn(&str) -> Vec<String> + Send + Sync;

/// A rendered statement ready for execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    /// SQL text with `?` placeholders.
    pub text: String,
    /// Bind values in placeholder order.
    pub values: Vec<BoundValue>,
    /// SQL text with every placeholder replaced by its formatted literal.
    pub log: String,
}

/// Accumulates rendered output.
#[derive(Debug, Default)]
struct Output {
    text: String,
    log: String,
    values: Vec<BoundValue>,
}

impl Output {
    fn push_sql(&mut self, sql: &str) {
        self.text.push_str(sql);
        self.log.push_str(sql);
    }

    fn bind(&mut self, value: BoundValue, formatter: &Formatter) {
        self.text.push('?');
        self.log.push_str(&formatter(&value.value, value.ty));
        self.values.push(value);
    }

    fn append(&mut self, other: Self) {
        self.text.push_str(&other.text);
        self.log.push_str(&other.log);
        self.values.extend(other.values);
    }
}

/// Renders template trees against a parameter context.
///
/// Every visit returns whether the output so far in the current scope holds
/// meaningful content. Clauses use it to drop their keyword when their body
/// rendered nothing, and `and`/`or` use it to avoid a leading connector.
pub struct Renderer<'a> {
    formatter: &'a Formatter,
    expander: &'a Expander,
    extensions: &'a Extensions,
    max_depth: usize,
}

impl<'a> Renderer<'a> {
    /// Creates a new renderer.
    #[must_use]
    pub fn new(
        formatter: &'a Formatter,
        expander: &'a Expander,
        extensions: &'a Extensions,
        max_depth: usize,
    ) -> Self {
        Self {
            formatter,
            expander,
            extensions,
            max_depth,
        }
    }

    /// Renders a parsed template.
    ///
    /// # Errors
    ///
    /// Returns an expression error when a directive fails to evaluate, or a
    /// structural error for a non-iterable `for` expression or an alias
    /// that resolves to `NULL`.
    pub fn render(&self, node: &Node, context: &ParamContext) -> Result<Statement> {
        let mut scope = context.clone();
        let mut out = Output::default();
        self.visit(node, false, &mut scope, &mut out)?;
        Ok(Statement {
            text: out.text,
            values: out.values,
            log: out.log,
        })
    }

    fn visit_all(
        &self,
        nodes: &[Node],
        mut available: bool,
        scope: &mut ParamContext,
        out: &mut Output,
    ) -> Result<bool> {
        for node in nodes {
            available = self.visit(node, available, scope, out)?;
        }
        Ok(available)
    }

    fn visit(
        &self,
        node: &Node,
        available: bool,
        scope: &mut ParamContext,
        out: &mut Output,
    ) -> Result<bool> {
        match node {
            Node::Statement(children) => self.visit_all(children, available, scope, out),
            Node::SetOperation {
                left,
                keyword,
                right,
                ..
            } => {
                self.visit(left, false, scope, out)?;
                out.push_sql(keyword);
                self.visit(right, false, scope, out)?;
                Ok(true)
            }
            Node::Clause {
                kind,
                keyword,
                children,
            } => {
                if kind.is_always_emitted() {
                    out.push_sql(keyword);
                    return self.visit_all(children, available, scope, out);
                }
                let mut child = Output::default();
                if self.visit_all(children, false, scope, &mut child)? {
                    out.push_sql(keyword);
                    out.append(child);
                    Ok(available)
                } else if starts_with_clause(&child.text) {
                    out.append(child);
                    Ok(true)
                } else {
                    trace!(keyword = %keyword, "Dropping empty clause");
                    Ok(available)
                }
            }
            Node::Logical {
                keyword, children, ..
            } => {
                if available {
                    out.push_sql(keyword);
                }
                self.visit_all(children, available, scope, out)
            }
            Node::Word(text) | Node::Other(text) => {
                out.push_sql(text);
                Ok(true)
            }
            Node::Whitespace(text) | Node::Comment(text) => {
                out.push_sql(text);
                Ok(available)
            }
            Node::Brackets(inner) => {
                out.push_sql("(");
                self.visit(inner, false, scope, out)?;
                out.push_sql(")");
                Ok(true)
            }
            Node::BindValue { directive, .. } => {
                let bound = self.eval_bind(directive, scope)?;
                self.bind(bound, out);
                Ok(available)
            }
            Node::LiteralValue { directive, .. } => {
                let bound = self.eval(directive, &directive.expression, scope)?;
                out.push_sql(&(self.formatter)(&bound.value, bound.ty));
                Ok(available)
            }
            Node::EmbeddedValue { directive } => {
                let bound = self.eval(directive, &directive.expression, scope)?;
                let fragment = match bound.value {
                    Value::Null => String::new(),
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                if fragment.is_empty() {
                    Ok(available)
                } else {
                    out.push_sql(&fragment);
                    Ok(true)
                }
            }
            Node::Expand { directive, .. } => {
                let bound = self.eval(directive, &directive.expression, scope)?;
                let alias = match bound.value {
                    Value::Null => {
                        return Err(TemplateError::structural(
                            format!(
                                "The alias expression \"{}\" cannot be resolved",
                                directive.expression
                            ),
                            directive.location.clone(),
                        ));
                    }
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                let prefix = if alias.is_empty() {
                    String::new()
                } else {
                    format!("{alias}.")
                };
                out.push_sql(&(self.expander)(&prefix).join(", "));
                Ok(true)
            }
            Node::IfBlock {
                if_branch,
                elseif_branches,
                else_branch,
            } => {
                for branch in std::iter::once(if_branch).chain(elseif_branches) {
                    if self.eval_condition(&branch.directive, scope)? {
                        return self.visit_all(&branch.children, available, scope, out);
                    }
                }
                match else_branch {
                    Some(children) => self.visit_all(children, available, scope, out),
                    None => Ok(available),
                }
            }
            Node::ForBlock {
                directive,
                identifier,
                expression,
                children,
            } => {
                let block = ForLoop {
                    directive,
                    identifier,
                    expression,
                    children,
                };
                self.visit_for(&block, available, scope, out)
            }
        }
    }

    /// Binds a value, expanding collections into a placeholder group.
    fn bind(&self, bound: BoundValue, out: &mut Output) {
        let Value::List(items) = bound.value else {
            out.bind(bound, self.formatter);
            return;
        };
        out.push_sql("(");
        if items.is_empty() {
            out.push_sql("null");
        }
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                out.push_sql(", ");
            }
            match item {
                Value::Pair(pair) => {
                    let (first, second) = *pair;
                    out.push_sql("(");
                    out.bind(BoundValue::of(first), self.formatter);
                    out.push_sql(", ");
                    out.bind(BoundValue::of(second), self.formatter);
                    out.push_sql(")");
                }
                Value::Triple(triple) => {
                    let (first, second, third) = *triple;
                    out.push_sql("(");
                    out.bind(BoundValue::of(first), self.formatter);
                    out.push_sql(", ");
                    out.bind(BoundValue::of(second), self.formatter);
                    out.push_sql(", ");
                    out.bind(BoundValue::of(third), self.formatter);
                    out.push_sql(")");
                }
                other => out.bind(BoundValue::of(other), self.formatter),
            }
        }
        out.push_sql(")");
    }

    fn visit_for(
        &self,
        block: &ForLoop<'_>,
        mut available: bool,
        scope: &mut ParamContext,
        out: &mut Output,
    ) -> Result<bool> {
        let ForLoop {
            directive,
            identifier,
            expression,
            children,
        } = *block;
        let bound = self.eval(directive, expression, scope)?;
        let Value::List(items) = bound.value else {
            return Err(TemplateError::structural(
                format!(
                    "The expression \"{expression}\" of the for directive is not iterable, it is \"{}\"",
                    bound.value.value_type()
                ),
                directive.location.clone(),
            ));
        };

        let names = [
            identifier.to_string(),
            format!("{identifier}_index"),
            format!("{identifier}_has_next"),
        ];
        let saved: Vec<Option<BoundValue>> = names.iter().map(|name| scope.get(name).cloned()).collect();

        let count = items.len();
        for (index, item) in items.into_iter().enumerate() {
            let position = i32::try_from(index).unwrap_or(i32::MAX);
            scope.insert_bound(names[0].clone(), BoundValue::of(item));
            scope.insert_bound(
                names[1].clone(),
                BoundValue::new(Value::Int(position), ValueType::Int),
            );
            scope.insert_bound(
                names[2].clone(),
                BoundValue::new(Value::Bool(index + 1 < count), ValueType::Boolean),
            );
            available = self.visit_all(children, available, scope, out)?;
        }

        for (name, previous) in names.into_iter().zip(saved) {
            match previous {
                Some(value) => {
                    scope.insert_bound(name, value);
                }
                None => {
                    scope.remove(&name);
                }
            }
        }
        Ok(available)
    }

    fn parse_expression(&self, directive: &Directive, expression: &str) -> Result<ExprNode> {
        ExprParser::with_max_depth(expression, self.max_depth)
            .parse()
            .map_err(|error| wrap(directive, expression, error))
    }

    /// Parses and evaluates a directive expression.
    fn eval(&self, directive: &Directive, expression: &str, scope: &ParamContext) -> Result<BoundValue> {
        let node = self.parse_expression(directive, expression)?;
        Evaluator::new(scope, self.extensions)
            .eval(&node)
            .map_err(|error| wrap(directive, expression, error))
    }

    /// Evaluates the expression of a bind directive.
    ///
    /// A bare top-level name with no binding binds an untyped `NULL`. Every
    /// other unresolved reference fails.
    fn eval_bind(&self, directive: &Directive, scope: &ParamContext) -> Result<BoundValue> {
        let expression = &directive.expression;
        let node = self.parse_expression(directive, expression)?;
        if let ExprNode::Value { name, .. } = &node {
            if scope.get(name).is_none() {
                trace!(name = %name, "Binding NULL for an unbound name");
                return Ok(BoundValue::null(ValueType::Any));
            }
        }
        Evaluator::new(scope, self.extensions)
            .eval(&node)
            .map_err(|error| wrap(directive, expression, error))
    }

    fn eval_condition(&self, directive: &Directive, scope: &ParamContext) -> Result<bool> {
        let expression = &directive.expression;
        let node = self.parse_expression(directive, expression)?;
        Evaluator::new(scope, self.extensions)
            .eval_condition(&node)
            .map_err(|error| wrap(directive, expression, error))
    }
}

/// The parts of a `for` block.
#[derive(Clone, Copy)]
struct ForLoop<'n> {
    directive: &'n Directive,
    identifier: &'n str,
    expression: &'n str,
    children: &'n [Node],
}

fn wrap(directive: &Directive, expression: &str, error: ExprError) -> TemplateError {
    TemplateError::expression(expression, directive.location.clone(), error)
}

/// Returns true if the rendered text begins with a clause keyword.
fn starts_with_clause(text: &str) -> bool {
    let mut lexer = SqlLexer::new(text);
    loop {
        match lexer.next_token() {
            Ok(token) => match token.kind {
                SqlTokenKind::Whitespace | SqlTokenKind::Comment => {}
                SqlTokenKind::Clause(_) => return true,
                _ => return false,
            },
            Err(_) => return false,
        }
    }
}
