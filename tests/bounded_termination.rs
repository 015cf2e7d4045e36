//! Bounded termination: retry budgets guarantee that generation eventually
//! aborts rather than looping forever, at every budget granularity.

use pretty_assertions::assert_eq;
use specimen::constraints::integer::IntegerConstraint;
use specimen::expr::Expr;
use specimen::handler::GenerationHandler;
use specimen::rng::Rng;
use specimen::variable::IntegerVariable;
use specimen::Resolver;

#[test]
fn an_impossible_range_aborts_within_the_active_retry_budget() {
    // Between(10, 1) is empty for every attempt: generation must abort, not
    // hang, once the per-variable active-retry ceiling is reached.
    let var = IntegerVariable::new().with(IntegerConstraint::Between(
        Expr::parse("10").unwrap(),
        Expr::parse("1").unwrap(),
    ));
    let mut resolver = Resolver::new(Rng::new(&[0u8; 16]).unwrap());
    resolver.declare("N", specimen::Variable::Integer(var));
    let result = resolver.generate_variable("N");
    assert!(result.is_err());
}

#[test]
fn handler_aborts_once_the_active_budget_is_exceeded() {
    let mut handler = GenerationHandler::with_budgets(3, 1_000, 1_000);
    handler.start("A").unwrap();
    for _ in 0..3 {
        let (policy, _) = handler.report_failure("still failing");
        assert_eq!(policy, specimen::error::RetryPolicy::Retry);
    }
    let (policy, _) = handler.report_failure("one too many");
    assert_eq!(policy, specimen::error::RetryPolicy::Abort);
}

#[test]
fn handler_aborts_once_the_lifetime_total_budget_is_exceeded_across_restarts() {
    let mut handler = GenerationHandler::with_budgets(1_000, 2, 1_000);
    handler.start("A").unwrap();
    let (p1, _) = handler.report_failure("1");
    assert_eq!(p1, specimen::error::RetryPolicy::Retry);
    handler.start("A").unwrap();
    let (p2, _) = handler.report_failure("2");
    assert_eq!(p2, specimen::error::RetryPolicy::Retry);
    handler.start("A").unwrap();
    let (p3, _) = handler.report_failure("3");
    assert_eq!(p3, specimen::error::RetryPolicy::Abort);
}
