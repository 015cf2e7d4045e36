//! Constraints for [`crate::variable::integer::IntegerVariable`].

use std::collections::BTreeSet;

use crate::constraints::custom::{CustomConstraint, PeerEnv};
use crate::constraints::SizeHint;
use crate::error::EvalError;
use crate::expr::Expr;

/// A lookup function from peer variable name to its resolved `i64` value.
pub type Lookup<'a> = dyn FnMut(&str) -> Result<i64, EvalError> + 'a;

/// A single constraint on an [`crate::variable::integer::IntegerVariable`].
#[derive(Debug, Clone, PartialEq)]
pub enum IntegerConstraint {
    /// `min <= value <= max`, both inclusive.
    Between(Expr, Expr),
    /// `value >= bound`.
    AtLeast(Expr),
    /// `value <= bound`.
    AtMost(Expr),
    /// `value == expr`. Locks the option set to a singleton.
    Exactly(Expr),
    /// `value` is one of the listed expressions. Locks the option set.
    OneOf(Vec<Expr>),
    /// `value % modulus == remainder` (`modulus` must evaluate to `> 0`).
    Mod {
        /// The required remainder.
        remainder: Expr,
        /// The modulus (must be positive).
        modulus: Expr,
    },
    /// Biases generation toward a sub-range; never rejects a value during
    /// validation.
    SizeHint(SizeHint),
    /// A user-supplied predicate.
    Custom(CustomConstraint<i64>),
}

impl IntegerConstraint {
    /// Checks `value` against this constraint under the given environment.
    pub fn check(
        &self,
        value: i64,
        lookup: &mut Lookup<'_>,
        peer_env: &PeerEnv,
    ) -> Result<(), String> {
        match self {
            IntegerConstraint::Between(min, max) => {
                let min = min.eval(lookup).map_err(|e| e.to_string())?;
                let max = max.eval(lookup).map_err(|e| e.to_string())?;
                if value < min || value > max {
                    Err(format!(
                        "has value (which is {value}) that is not between {min} and {max}"
                    ))
                } else {
                    Ok(())
                }
            }
            IntegerConstraint::AtLeast(bound) => {
                let bound = bound.eval(lookup).map_err(|e| e.to_string())?;
                if value < bound {
                    Err(format!(
                        "has value (which is {value}) that is not at least {bound}"
                    ))
                } else {
                    Ok(())
                }
            }
            IntegerConstraint::AtMost(bound) => {
                let bound = bound.eval(lookup).map_err(|e| e.to_string())?;
                if value > bound {
                    Err(format!(
                        "has value (which is {value}) that is not at most {bound}"
                    ))
                } else {
                    Ok(())
                }
            }
            IntegerConstraint::Exactly(expr) => {
                let expected = expr.eval(lookup).map_err(|e| e.to_string())?;
                if value != expected {
                    Err(format!(
                        "has value (which is {value}) that is not exactly {expected}"
                    ))
                } else {
                    Ok(())
                }
            }
            IntegerConstraint::OneOf(options) => {
                let mut resolved = Vec::with_capacity(options.len());
                for o in options {
                    resolved.push(o.eval(lookup).map_err(|e| e.to_string())?);
                }
                if resolved.contains(&value) {
                    Ok(())
                } else {
                    Err(format!(
                        "has value (which is {value}) that is not one of {resolved:?}"
                    ))
                }
            }
            IntegerConstraint::Mod { remainder, modulus } => {
                let m = modulus.eval(lookup).map_err(|e| e.to_string())?;
                if m <= 0 {
                    return Err(format!("modulus (which is {m}) must be positive"));
                }
                let r = remainder.eval(lookup).map_err(|e| e.to_string())?.rem_euclid(m);
                if value.rem_euclid(m) != r {
                    Err(format!(
                        "has value (which is {value}) that is not congruent to {r} modulo {m}"
                    ))
                } else {
                    Ok(())
                }
            }
            IntegerConstraint::SizeHint(_) => Ok(()),
            IntegerConstraint::Custom(c) => c.check(&value, peer_env),
        }
    }

    /// Human-readable phrasing for `Variable::to_string()`/error messages.
    pub fn describe(&self) -> String {
        match self {
            IntegerConstraint::Between(min, max) => format!("is between {min} and {max}"),
            IntegerConstraint::AtLeast(bound) => format!("is at least {bound}"),
            IntegerConstraint::AtMost(bound) => format!("is at most {bound}"),
            IntegerConstraint::Exactly(expr) => format!("is exactly {expr}"),
            IntegerConstraint::OneOf(options) => {
                let parts: Vec<String> = options.iter().map(|o| o.to_string()).collect();
                format!("is one of [{}]", parts.join(", "))
            }
            IntegerConstraint::Mod { remainder, modulus } => {
                format!("is congruent to {remainder} modulo {modulus}")
            }
            IntegerConstraint::SizeHint(hint) => format!("has size hint {hint:?}"),
            IntegerConstraint::Custom(c) => c.describe().to_string(),
        }
    }

    /// Identifiers this constraint's expressions reference.
    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            IntegerConstraint::Between(min, max) => {
                let mut out = min.dependencies();
                out.extend(max.dependencies());
                out
            }
            IntegerConstraint::AtLeast(b) | IntegerConstraint::AtMost(b) => b.dependencies(),
            IntegerConstraint::Exactly(e) => e.dependencies(),
            IntegerConstraint::OneOf(options) => {
                let mut out = BTreeSet::new();
                for o in options {
                    out.extend(o.dependencies());
                }
                out
            }
            IntegerConstraint::Mod { remainder, modulus } => {
                let mut out = remainder.dependencies();
                out.extend(modulus.dependencies());
                out
            }
            IntegerConstraint::SizeHint(_) => BTreeSet::new(),
            IntegerConstraint::Custom(c) => c.dependencies().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(env: &HashMap<String, i64>) -> impl FnMut(&str) -> Result<i64, EvalError> + '_ {
        move |name: &str| {
            env.get(name)
                .copied()
                .ok_or_else(|| EvalError::VariableNotFound {
                    name: name.to_string(),
                })
        }
    }

    #[test]
    fn between_checks_inclusive_bounds() {
        let c = IntegerConstraint::Between(Expr::parse("1").unwrap(), Expr::parse("10").unwrap());
        let env = HashMap::new();
        let peer = PeerEnv::new();
        assert!(c.check(1, &mut lookup(&env), &peer).is_ok());
        assert!(c.check(10, &mut lookup(&env), &peer).is_ok());
        let err = c.check(0, &mut lookup(&env), &peer).unwrap_err();
        assert!(err.contains("between"));
    }

    #[test]
    fn mod_constraint() {
        let c = IntegerConstraint::Mod {
            remainder: Expr::parse("1").unwrap(),
            modulus: Expr::parse("3").unwrap(),
        };
        let env = HashMap::new();
        let peer = PeerEnv::new();
        assert!(c.check(4, &mut lookup(&env), &peer).is_ok());
        assert!(c.check(3, &mut lookup(&env), &peer).is_err());
    }

    #[test]
    fn dependencies_from_expression_bounds() {
        let c = IntegerConstraint::Between(Expr::parse("1").unwrap(), Expr::parse("2*N").unwrap());
        assert_eq!(c.dependencies(), ["N".to_string()].into_iter().collect());
    }
}
