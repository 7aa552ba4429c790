//! Property tests for rendering and expression evaluation.

mod common;
use common::*;

use oxide_sql_template::expr::{eval, parse, Extensions};
use oxide_sql_template::{BoundValue, ErrorKind, ExprError, ParamContext, Value};
use proptest::prelude::*;

const TEMPLATE: &str = "select * from emp where \
    /*%if id != null*/id = /*id*/0/*%end*/ \
    /*%if name != null*/and name like /*name.asInfix()*/'a'/*%end*/ \
    /*%if ids.isNotEmpty()*/and id in /*ids*/(1)/*%end*/ \
    /*%for i in ids*/or age > /*i*/0 /*%end*/ \
    order by /*#orderBy*/";

const NAMES: [&str; 5] = ["alpha", "beta", "gamma", "delta", "epsilon"];

fn arb_context() -> impl Strategy<Value = ParamContext> {
    (
        proptest::option::of(any::<i32>()),
        proptest::option::of("[a-z%_]{0,8}"),
        proptest::collection::vec(-100i32..100, 0..5),
        prop_oneof![Just(""), Just("id"), Just("name desc")],
    )
        .prop_map(|(id, name, ids, order_by)| {
            ParamContext::new()
                .with("id", id)
                .with("name", name)
                .with("ids", ids)
                .with("orderBy", order_by)
        })
}

/// A conjunction of comparisons that all hold for the given values.
fn arb_conjunction() -> impl Strategy<Value = Vec<(&'static str, i32, usize)>> {
    proptest::sample::subsequence(NAMES.to_vec(), 1..=NAMES.len()).prop_flat_map(|names| {
        let len = names.len();
        (
            Just(names),
            proptest::collection::vec(-1000i32..1000, len),
            proptest::collection::vec(0usize..4, len),
        )
            .prop_map(|(names, values, ops)| {
                names
                    .into_iter()
                    .zip(values)
                    .zip(ops)
                    .map(|((name, value), op)| (name, value, op))
                    .collect()
            })
    })
}

fn comparison(name: &str, value: i32, op: usize) -> String {
    match op {
        0 => format!("{name} == {value}"),
        1 => format!("{name} >= {value}"),
        2 => format!("{value} <= {name}"),
        _ => format!("!({name} != {value})"),
    }
}

proptest! {
    #[test]
    fn rendering_is_deterministic(ctx in arb_context()) {
        let first = build(TEMPLATE, &ctx);
        let second = build(TEMPLATE, &ctx);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.text.matches('?').count(), first.values.len());
        prop_assert!(!first.text.contains("/*"));
    }

    #[test]
    fn missing_name_raises_one_evaluation_error(terms in arb_conjunction()) {
        let expression = terms
            .iter()
            .map(|(name, value, op)| comparison(name, *value, *op))
            .collect::<Vec<_>>()
            .join(" && ");
        let node = parse(&expression).unwrap();
        let extensions = Extensions::default();

        let mut free: Vec<&str> = node.free_names();
        free.sort_unstable();
        let mut expected: Vec<&str> = terms.iter().map(|(name, _, _)| *name).collect();
        expected.sort_unstable();
        prop_assert_eq!(free, expected);

        let full: ParamContext = terms
            .iter()
            .map(|(name, value, _)| (*name, BoundValue::of(Value::Int(*value))))
            .collect();
        let result = eval(&node, &full, &extensions).unwrap();
        prop_assert_eq!(result.value, Value::Bool(true));

        for (name, _, _) in &terms {
            let mut partial = full.clone();
            partial.remove(name);
            let error = eval(&node, &partial, &extensions).unwrap_err();
            let is_evaluation = matches!(error, ExprError::Evaluation { .. });
            prop_assert!(is_evaluation);
            prop_assert_eq!(error.message(), format!("The value \"{name}\" is not found"));

            let template = format!("select /*%if {expression}*/1/*%end*/");
            let error = build_err(&template, &partial);
            prop_assert_eq!(error.kind(), ErrorKind::Evaluation);
        }
    }
}
