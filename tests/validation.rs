//! Validation behavior: idempotent checks and curated edge cases.

use pretty_assertions::assert_eq;
use specimen::constraints::graph::GraphConstraint;
use specimen::constraints::integer::IntegerConstraint;
use specimen::constraints::string::StringConstraint;
use specimen::expr::Expr;
use specimen::rng::Rng;
use specimen::value::Value;
use specimen::variable::{GraphVariable, IntegerVariable, StringVariable, Variable};
use specimen::Resolver;

#[test]
fn validating_a_value_twice_gives_the_same_verdict() {
    let var = Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
        Expr::parse("1").unwrap(),
        Expr::parse("10").unwrap(),
    )));
    let resolver = Resolver::new(Rng::new(&[0u8; 16]).unwrap());

    let ok_once = var.validate("N", &Value::Integer(5), &resolver);
    let ok_twice = var.validate("N", &Value::Integer(5), &resolver);
    assert!(ok_once.is_ok());
    assert!(ok_twice.is_ok());

    let bad_once = var.validate("N", &Value::Integer(50), &resolver);
    let bad_twice = var.validate("N", &Value::Integer(50), &resolver);
    assert!(bad_once.is_err());
    assert!(bad_twice.is_err());
    assert_eq!(bad_once.unwrap_err().to_string(), bad_twice.unwrap_err().to_string());
}

#[test]
fn edge_cases_for_an_unconstrained_integer_are_all_valid_under_a_wide_range() {
    let var = Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
        Expr::parse("-100").unwrap(),
        Expr::parse("100").unwrap(),
    )));
    let resolver = Resolver::new(Rng::new(&[0u8; 16]).unwrap());
    let cases: Vec<Value> = var
        .list_edge_cases()
        .into_iter()
        .filter(|v| matches!(v, Value::Integer(n) if (-100..=100).contains(n)))
        .collect();
    assert!(!cases.is_empty());
    for case in cases {
        assert!(var.validate("N", &case, &resolver).is_ok());
    }
}

#[test]
fn string_edge_cases_include_the_empty_string() {
    let var = Variable::String(
        StringVariable::new()
            .with(StringConstraint::Length(
                Expr::parse("0").unwrap(),
                Expr::parse("5").unwrap(),
            ))
            .with(StringConstraint::Alphabet(['a', 'b'].into_iter().collect())),
    );
    let cases = var.list_edge_cases();
    assert!(cases.contains(&Value::Str(String::new())));
}

#[test]
fn validation_rejects_a_value_of_the_wrong_kind() {
    let var = Variable::Integer(IntegerVariable::new());
    let resolver = Resolver::new(Rng::new(&[0u8; 16]).unwrap());
    assert!(var.validate("N", &Value::Str("nope".to_string()), &resolver).is_err());
}

#[test]
fn the_empty_graph_is_not_connected_but_still_passes_shape_constraints() {
    let var = Variable::Graph(
        GraphVariable::new()
            .with(GraphConstraint::NumNodes(
                Expr::parse("0").unwrap(),
                Expr::parse("10").unwrap(),
            ))
            .with(GraphConstraint::NumEdges(
                Expr::parse("0").unwrap(),
                Expr::parse("10").unwrap(),
            )),
    );
    let resolver = Resolver::new(Rng::new(&[0u8; 16]).unwrap());
    let empty = var.list_edge_cases().into_iter().next().unwrap();
    assert!(var.validate("G", &empty, &resolver).is_ok());

    let connected_var = var
        .merge(&Variable::Graph(GraphVariable::new().with(GraphConstraint::Connected)))
        .unwrap();
    assert!(connected_var.validate("G", &empty, &resolver).is_err());
}
