//! Tests for value directives: bind, literal, embedded and expand.

mod common;
use common::*;

use oxide_sql_template::{BoundValue, ErrorKind, ParamContext, StatementBuilder, Value, ValueType};

#[test]
fn plain_templates_round_trip() {
    round_trip("select * from emp where id = 1 and name = 'a' order by id");
    round_trip("SELECT a, b FROM t WHERE b = 1 OR c = 2 ORDER BY a");
    round_trip("select count(*) from emp e group by e.dept having count(*) > 1");
    round_trip("select 1 union select 2");
    round_trip("update emp set name = 'it''s' where id = 1");
    round_trip("select /* hint */ a -- trailing\nfrom t for update");
    round_trip("");
}

#[test]
fn single_bind_value() {
    let ctx = ParamContext::new().with("name", "aaa");
    let stmt = build("select * from person where name = /*name*/'test'", &ctx);
    assert_eq!(stmt.text, "select * from person where name = ?");
    assert_eq!(stmt.values, vec![string("aaa")]);
    assert_eq!(stmt.log, "select * from person where name = 'aaa'");
}

#[test]
fn null_bind_value_keeps_declared_type() {
    let template = "select * from person where name = /*name*/'test'";

    let stmt = build(template, &ParamContext::new().with("name", Value::Null));
    assert_eq!(stmt.text, "select * from person where name = ?");
    assert_eq!(stmt.values, vec![BoundValue::null(ValueType::Any)]);
    assert_eq!(stmt.log, "select * from person where name = NULL");

    let stmt = build(template, &ParamContext::new().with("name", None::<String>));
    assert_eq!(stmt.values, vec![BoundValue::null(ValueType::String)]);
}

#[test]
fn unbound_name_binds_untyped_null() {
    let stmt = build(
        "select name, age from person where name = /*name*/'test' and age > 1",
        &ParamContext::new(),
    );
    assert_eq!(stmt.text, "select name, age from person where name = ? and age > 1");
    assert_eq!(stmt.values, vec![BoundValue::null(ValueType::Any)]);
    assert_eq!(stmt.log, "select name, age from person where name = NULL and age > 1");

    let stmt = build(
        "select name, age from person where name in /*name*/('a', 'b') and age > 1",
        &ParamContext::new(),
    );
    assert_eq!(stmt.text, "select name, age from person where name in ? and age > 1");
    assert_eq!(stmt.values, vec![BoundValue::null(ValueType::Any)]);
}

#[test]
fn bind_value_without_test_literal() {
    let ctx = ParamContext::new().with("id", 7);
    let stmt = build("select * from emp where id = /*id*/ and 1 = 1", &ctx);
    assert_eq!(stmt.text, "select * from emp where id = ? and 1 = 1");
    assert_eq!(stmt.values, vec![int(7)]);
}

#[test]
fn collection_bind_value() {
    let ctx = ParamContext::new().with("names", vec!["x", "y", "z"]);
    let stmt = build("select * from person where name in /*names*/('a', 'b')", &ctx);
    assert_eq!(stmt.text, "select * from person where name in (?, ?, ?)");
    assert_eq!(stmt.values, vec![string("x"), string("y"), string("z")]);
    assert_eq!(stmt.log, "select * from person where name in ('x', 'y', 'z')");
}

#[test]
fn empty_collection_renders_null() {
    let ctx = ParamContext::new().with("names", Vec::<String>::new());
    let stmt = build("select * from person where name in /*names*/('a', 'b')", &ctx);
    assert_eq!(stmt.text, "select * from person where name in (null)");
    assert!(stmt.values.is_empty());
    assert_eq!(stmt.log, stmt.text);
}

#[test]
fn pair_collection_binds_tuples() {
    let ctx = ParamContext::new().with("keys", vec![(1, "a"), (2, "b")]);
    let stmt = build(
        "select * from emp where (id, name) in /*keys*/((0, ''))",
        &ctx,
    );
    assert_eq!(stmt.text, "select * from emp where (id, name) in ((?, ?), (?, ?))");
    assert_eq!(
        stmt.values,
        vec![int(1), string("a"), int(2), string("b")]
    );
    assert_eq!(
        stmt.log,
        "select * from emp where (id, name) in ((1, 'a'), (2, 'b'))"
    );
}

#[test]
fn triple_collection_binds_tuples() {
    let ctx = ParamContext::new().with("keys", vec![(1, "a", true)]);
    let stmt = build("select * from emp where (a, b, c) in /*keys*/()", &ctx);
    assert_eq!(stmt.text, "select * from emp where (a, b, c) in ((?, ?, ?))");
    assert_eq!(stmt.values.len(), 3);
    assert_eq!(stmt.values[2], BoundValue::new(Value::Bool(true), ValueType::Boolean));
}

#[test]
fn literal_value_is_inlined() {
    let ctx = ParamContext::new().with("name", "it's").with("id", None::<i32>);
    let stmt = build(
        "select * from emp where name = /*^name*/'x' and id = /*^id*/0",
        &ctx,
    );
    assert_eq!(stmt.text, "select * from emp where name = 'it''s' and id = NULL");
    assert!(stmt.values.is_empty());
    assert_eq!(stmt.log, stmt.text);
}

#[test]
fn embedded_value_is_spliced_verbatim() {
    let ctx = ParamContext::new().with("orderBy", "name desc");
    let stmt = build("select * from emp order by /*#orderBy*/", &ctx);
    assert_eq!(stmt.text, "select * from emp order by name desc");
    assert!(stmt.values.is_empty());
}

#[test]
fn empty_embedded_value_drops_its_clause() {
    for value in [Value::String(String::new()), Value::Null] {
        let ctx = ParamContext::new().with("orderBy", value);
        assert_eq!(
            sql("select * from emp order by /*#orderBy*/", &ctx),
            "select * from emp "
        );
    }
}

#[test]
fn expand_uses_alias_prefix() {
    let builder = StatementBuilder::new()
        .with_expander(|prefix| vec![format!("{prefix}id"), format!("{prefix}name")]);

    let ctx = ParamContext::new().with("alias", "d");
    let stmt = builder
        .build("select /*%expand alias*/* from dept d", &ctx)
        .unwrap();
    assert_eq!(stmt.text, "select d.id, d.name from dept d");

    let stmt = builder
        .build("select /*%expand \"\"*/* from dept", &ParamContext::new())
        .unwrap();
    assert_eq!(stmt.text, "select id, name from dept");
}

#[test]
fn expand_with_null_alias_fails() {
    let ctx = ParamContext::new().with("alias", None::<String>);
    let error = assert_kind(
        "select /*%expand alias*/* from dept",
        &ctx,
        ErrorKind::Structural,
    );
    assert!(error.to_string().contains("cannot be resolved"));
}

#[test]
fn bind_value_with_extension_function() {
    let ctx = ParamContext::new().with("name", "a%b");
    let stmt = build(
        "select * from emp where name like /*name.asPrefix()*/'x' escape '\\'",
        &ctx,
    );
    assert_eq!(stmt.text, "select * from emp where name like ? escape '\\'");
    assert_eq!(stmt.values, vec![string("a\\%b%")]);
}

#[test]
fn bind_value_with_record_property() {
    let person = Value::record([("name", string("aaa")), ("age", int(30))]);
    let ctx = ParamContext::new().with("p", person);
    let stmt = build(
        "select * from person where name = /*p.name*/'x' and age = /*p.age*/0",
        &ctx,
    );
    assert_eq!(stmt.values, vec![string("aaa"), int(30)]);
}

#[test]
fn log_inlines_every_value() {
    let ctx = ParamContext::new()
        .with("name", "aaa")
        .with("age", 30)
        .with("flag", true);
    let stmt = build(
        "select * from emp where name = /*name*/'x' and age > /*age*/0 and flag = /*flag*/true",
        &ctx,
    );
    assert_eq!(
        stmt.text,
        "select * from emp where name = ? and age > ? and flag = ?"
    );
    assert_eq!(
        stmt.log,
        "select * from emp where name = 'aaa' and age > 30 and flag = TRUE"
    );
}

#[test]
fn statement_serializes_to_json() {
    let ctx = ParamContext::new().with("id", 1);
    let stmt = build("select /*id*/0", &ctx);
    let json = serde_json::to_value(&stmt).unwrap();
    assert_eq!(json["text"], "select ?");
    assert_eq!(json["values"][0]["value"], 1);
    assert_eq!(json["values"][0]["type"], "int");
    assert_eq!(json["log"], "select 1");
}
