//! The `Integer` variable kind. See `SPEC_FULL.md` §4.4.1.

use std::collections::BTreeSet;

use crate::constraints::custom::PeerEnv;
use crate::constraints::integer::{IntegerConstraint, Lookup};
use crate::constraints::SizeHint;
use crate::error::{EvalError, GenerationError, RetryPolicy, SpecimenError};
use crate::resolver::Resolver;
use crate::value::Value;

/// The bounded retry budget for rejecting candidates that fail a `Mod` or
/// `Custom` constraint after the primary range/options draw.
const GENERATE_RETRY_BUDGET: u32 = 10_000;

/// A declared `Integer` variable: a bag of [`IntegerConstraint`]s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntegerVariable {
    constraints: Vec<IntegerConstraint>,
}

impl IntegerVariable {
    /// An unconstrained integer variable (range `i64::MIN..=i64::MAX`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint, builder-style.
    pub fn with(mut self, constraint: IntegerConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// The declared constraints, in declaration order.
    pub fn constraints(&self) -> &[IntegerConstraint] {
        &self.constraints
    }

    /// Appends `other`'s constraints onto a clone of `self`.
    pub fn merge(&self, other: &IntegerVariable) -> IntegerVariable {
        let mut merged = self.clone();
        merged.constraints.extend(other.constraints.iter().cloned());
        merged
    }

    /// Identifiers referenced by any constraint's expressions.
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.constraints
            .iter()
            .flat_map(IntegerConstraint::dependencies)
            .collect()
    }

    fn evaluated_range(&self, lookup: &mut Lookup<'_>) -> Result<(i64, i64), SpecimenError> {
        let mut lo = i64::MIN;
        let mut hi = i64::MAX;
        for c in &self.constraints {
            match c {
                IntegerConstraint::Between(min, max) => {
                    lo = lo.max(min.eval(lookup)?);
                    hi = hi.min(max.eval(lookup)?);
                }
                IntegerConstraint::AtLeast(b) => lo = lo.max(b.eval(lookup)?),
                IntegerConstraint::AtMost(b) => hi = hi.min(b.eval(lookup)?),
                _ => {}
            }
        }
        Ok((lo, hi))
    }

    fn locked_options(&self, lookup: &mut Lookup<'_>) -> Result<Option<Vec<i64>>, SpecimenError> {
        let mut options: Option<Vec<i64>> = None;
        for c in &self.constraints {
            let resolved: Option<Vec<i64>> = match c {
                IntegerConstraint::Exactly(e) => Some(vec![e.eval(lookup)?]),
                IntegerConstraint::OneOf(es) => {
                    let mut vs = Vec::with_capacity(es.len());
                    for e in es {
                        vs.push(e.eval(lookup)?);
                    }
                    Some(vs)
                }
                _ => None,
            };
            if let Some(vs) = resolved {
                options = Some(match options {
                    Some(prev) => prev.into_iter().filter(|v| vs.contains(v)).collect(),
                    None => vs,
                });
            }
        }
        Ok(options)
    }

    fn size_hint(&self) -> SizeHint {
        self.constraints
            .iter()
            .find_map(|c| match c {
                IntegerConstraint::SizeHint(h) => Some(*h),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Checks `value` against every declared constraint, returning the first
    /// violation found.
    pub fn validate_value(
        &self,
        value: i64,
        lookup: &mut Lookup<'_>,
        peer_env: &PeerEnv,
    ) -> Result<(), String> {
        for c in &self.constraints {
            c.check(value, lookup, peer_env)?;
        }
        Ok(())
    }

    /// Generates a value satisfying every declared constraint.
    pub fn generate(&self, name: &str, resolver: &mut Resolver) -> Result<Value, SpecimenError> {
        let (lo, hi) = self.evaluated_range(&mut resolver.generate_lookup())?;
        if lo > hi {
            return Err(SpecimenError::Generation(GenerationError {
                name: name.to_string(),
                message: format!("evaluated range [{lo}, {hi}] is empty"),
                policy: RetryPolicy::Retry,
            }));
        }
        let options = self.locked_options(&mut resolver.generate_lookup())?;
        let size_hint = self.size_hint();

        for _ in 0..GENERATE_RETRY_BUDGET {
            let candidate = if let Some(opts) = &options {
                let in_range: Vec<i64> = opts.iter().copied().filter(|v| *v >= lo && *v <= hi).collect();
                if in_range.is_empty() {
                    return Err(SpecimenError::Generation(GenerationError {
                        name: name.to_string(),
                        message: "no option satisfies the evaluated range".to_string(),
                        policy: RetryPolicy::Retry,
                    }));
                }
                let idx = resolver.random_below(in_range.len() as i64)? as usize;
                in_range[idx]
            } else {
                let (slo, shi) = shrink_range(lo, hi, size_hint);
                resolver.random_between(slo, shi)?
            };

            let mut lookup = resolver.generate_lookup();
            if self
                .validate_value(candidate, &mut lookup, &PeerEnv::new())
                .is_ok()
            {
                return Ok(Value::Integer(candidate));
            }
        }

        Err(SpecimenError::Generation(GenerationError {
            name: name.to_string(),
            message: "exhausted retry budget finding a value satisfying all constraints".to_string(),
            policy: RetryPolicy::Retry,
        }))
    }

    /// Validates an already-produced value.
    pub fn validate(&self, value: &Value, resolver: &Resolver) -> Result<(), SpecimenError> {
        let n = value.as_integer().ok_or_else(|| SpecimenError::ValueTypeMismatch {
            name: "<value>".to_string(),
            expected_type: "Integer".to_string(),
        })?;
        self.validate_value(n, &mut resolver.value_lookup(), &PeerEnv::new())
            .map_err(SpecimenError::ValidationError)
    }

    /// A small curated set of boundary values: `i64::MIN`, `-1`, `0`, `1`,
    /// `i64::MAX`, clamped/filtered to the evaluated range where possible.
    pub fn list_edge_cases(&self) -> Vec<Value> {
        vec![
            Value::Integer(i64::MIN),
            Value::Integer(-1),
            Value::Integer(0),
            Value::Integer(1),
            Value::Integer(i64::MAX),
        ]
    }
}

/// Shrinks `[lo, hi]` toward the low end, middle, or high end per `hint`.
/// `Any` (or a degenerate range) returns the full range unshrunk.
///
/// Per the pinned Open Question resolution (`SPEC_FULL.md` §9): `Small` is
/// the bottom 20% of the range, `Medium` the middle 60%, `Large` the top 20%.
pub fn shrink_range(lo: i64, hi: i64, hint: SizeHint) -> (i64, i64) {
    if hint == SizeHint::Any || lo >= hi {
        return (lo, hi);
    }
    let span = (hi as i128) - (lo as i128);
    let lo128 = lo as i128;
    match hint {
        SizeHint::Small => {
            let top = lo128 + (span * 20) / 100;
            (lo, top.max(lo128) as i64)
        }
        SizeHint::Medium => {
            let start = lo128 + (span * 20) / 100;
            let end = lo128 + (span * 80) / 100;
            (start as i64, end.max(start) as i64)
        }
        SizeHint::Large => {
            let start = lo128 + (span * 80) / 100;
            (start as i64, hi)
        }
        SizeHint::Any => (lo, hi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::rng::Rng;

    fn no_lookup() -> impl FnMut(&str) -> Result<i64, EvalError> {
        |name: &str| {
            Err(EvalError::VariableNotFound {
                name: name.to_string(),
            })
        }
    }

    #[test]
    fn between_range_generates_in_bounds() {
        let var = IntegerVariable::new().with(IntegerConstraint::Between(
            Expr::parse("1").unwrap(),
            Expr::parse("10").unwrap(),
        ));
        let mut resolver = Resolver::new(Rng::new(&[3u8; 16]).unwrap());
        resolver.declare("A", crate::variable::Variable::Integer(var.clone()));
        let value = var.generate("A", &mut resolver).unwrap();
        let n = value.as_integer().unwrap();
        assert!((1..=10).contains(&n));
    }

    #[test]
    fn empty_range_is_a_generation_error() {
        let var = IntegerVariable::new().with(IntegerConstraint::Between(
            Expr::parse("10").unwrap(),
            Expr::parse("1").unwrap(),
        ));
        let mut resolver = Resolver::new(Rng::new(&[3u8; 16]).unwrap());
        resolver.declare("A", crate::variable::Variable::Integer(var.clone()));
        assert!(var.generate("A", &mut resolver).is_err());
    }

    #[test]
    fn shrink_range_small_is_bottom_of_range() {
        let (lo, hi) = shrink_range(0, 100, SizeHint::Small);
        assert_eq!(lo, 0);
        assert!(hi <= 20);
    }

    #[test]
    fn shrink_range_large_is_top_of_range() {
        let (lo, hi) = shrink_range(0, 100, SizeHint::Large);
        assert!(lo >= 80);
        assert_eq!(hi, 100);
    }

    #[test]
    fn validate_value_checks_all_constraints() {
        let var = IntegerVariable::new().with(IntegerConstraint::Between(
            Expr::parse("1").unwrap(),
            Expr::parse("10").unwrap(),
        ));
        assert!(var
            .validate_value(5, &mut no_lookup(), &PeerEnv::new())
            .is_ok());
        assert!(var
            .validate_value(50, &mut no_lookup(), &PeerEnv::new())
            .is_err());
    }
}
