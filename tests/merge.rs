//! Merge monotonicity: merging adds constraints, so anything valid under
//! the merged variable must also have been valid under the base variable,
//! and merging across kinds is rejected outright.

use specimen::constraints::integer::IntegerConstraint;
use specimen::expr::Expr;
use specimen::rng::Rng;
use specimen::value::Value;
use specimen::variable::{IntegerVariable, StringVariable, Variable};
use specimen::Resolver;

#[test]
fn merged_option_set_is_a_subset_of_the_base() {
    let base = Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
        Expr::parse("1").unwrap(),
        Expr::parse("100").unwrap(),
    )));
    let extra = Variable::Integer(
        IntegerVariable::new().with(IntegerConstraint::AtMost(Expr::parse("10").unwrap())),
    );
    let merged = base.merge(&extra).unwrap();
    let resolver = Resolver::new(Rng::new(&[0u8; 16]).unwrap());

    for n in -5..=110 {
        let value = Value::Integer(n);
        let merged_ok = merged.validate("N", &value, &resolver).is_ok();
        let base_ok = base.validate("N", &value, &resolver).is_ok();
        if merged_ok {
            assert!(
                base_ok,
                "value {n} passed the merged variable but not the base variable"
            );
        }
    }
}

#[test]
fn merging_an_impossible_range_yields_no_valid_values() {
    let base = Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
        Expr::parse("1").unwrap(),
        Expr::parse("5").unwrap(),
    )));
    let extra = Variable::Integer(
        IntegerVariable::new().with(IntegerConstraint::AtLeast(Expr::parse("10").unwrap())),
    );
    let merged = base.merge(&extra).unwrap();
    let resolver = Resolver::new(Rng::new(&[0u8; 16]).unwrap());
    for n in -5..=20 {
        assert!(merged.validate("N", &Value::Integer(n), &resolver).is_err());
    }
}

#[test]
fn merging_mismatched_kinds_fails() {
    let integer = Variable::Integer(IntegerVariable::new());
    let string = Variable::String(StringVariable::new());
    let err = integer.merge(&string).unwrap_err();
    assert!(err.to_string().contains("cannot convert"));
}

#[test]
fn resolver_generate_variable_with_merges_additional_constraints_before_generating() {
    let mut resolver = Resolver::new(Rng::new(&[3u8; 16]).unwrap());
    resolver.declare(
        "N",
        Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
            Expr::parse("1").unwrap(),
            Expr::parse("100").unwrap(),
        ))),
    );
    let extra = Variable::Integer(
        IntegerVariable::new().with(IntegerConstraint::AtMost(Expr::parse("3").unwrap())),
    );
    let value = resolver.generate_variable_with("N", &extra).unwrap();
    assert!((1..=3).contains(&value.as_integer().unwrap()));
}
