#![allow(dead_code)]

use oxide_sql_template::{
    BoundValue, ErrorKind, Node, ParamContext, SqlParser, Statement, StatementBuilder,
    TemplateError, Value, ValueType,
};

pub fn build(template: &str, ctx: &ParamContext) -> Statement {
    StatementBuilder::new()
        .build(template, ctx)
        .unwrap_or_else(|e| panic!("Failed to build: {template}\nError: {e}"))
}

pub fn build_err(template: &str, ctx: &ParamContext) -> TemplateError {
    StatementBuilder::new()
        .build(template, ctx)
        .expect_err(&format!("Expected build error for: {template}"))
}

pub fn sql(template: &str, ctx: &ParamContext) -> String {
    build(template, ctx).text
}

pub fn parse(template: &str) -> Node {
    SqlParser::new(template)
        .parse()
        .unwrap_or_else(|e| panic!("Failed to parse: {template}\nError: {e}"))
}

pub fn assert_kind(template: &str, ctx: &ParamContext, kind: ErrorKind) -> TemplateError {
    let error = build_err(template, ctx);
    assert_eq!(error.kind(), kind, "{template}: {error}");
    error
}

pub fn int(n: i32) -> BoundValue {
    BoundValue::new(Value::Int(n), ValueType::Int)
}

pub fn string(s: &str) -> BoundValue {
    BoundValue::new(Value::String(s.to_string()), ValueType::String)
}

/// Verifies that a template without directives renders verbatim.
pub fn round_trip(template: &str) {
    let stmt = build(template, &ParamContext::new());
    assert_eq!(stmt.text, template, "Round-trip failed for: {template}");
    assert_eq!(stmt.log, template);
    assert!(stmt.values.is_empty());
}
