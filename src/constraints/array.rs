//! Constraints on the whole of a [`crate::variable::array::ArrayVariable`].
//!
//! Per-element constraints are not modeled here: an array's elements are
//! themselves a child [`crate::variable::Variable`] template (the `Elements<E>`
//! bundle from the grammar), applied by `ArrayVariable` directly rather than
//! folded into this enum — that keeps `constraints` free of any dependency on
//! `variable`, avoiding a module cycle.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::constraints::custom::{CustomConstraint, PeerEnv};
use crate::error::EvalError;
use crate::expr::Expr;
use crate::value::Value;

/// A lookup function from peer variable name to its resolved `i64` value.
pub type Lookup<'a> = dyn FnMut(&str) -> Result<i64, EvalError> + 'a;

/// Ascending or descending, for [`ArrayConstraint::Sorted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Non-decreasing.
    Ascending,
    /// Non-increasing.
    Descending,
}

/// A projection from an array element to an orderable `i64` key, used by
/// [`ArrayConstraint::Sorted`]. Wrapped like [`CustomConstraint`]'s predicate
/// since an arbitrary projection is inherently type-erased.
#[derive(Clone)]
pub struct Projection(Rc<dyn Fn(&Value) -> Result<i64, String>>);

impl Projection {
    /// Builds a projection from a closure.
    pub fn new(f: impl Fn(&Value) -> Result<i64, String> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// The identity projection: the element itself must be an
    /// [`Value::Integer`].
    pub fn identity() -> Self {
        Self::new(|v| {
            v.as_integer()
                .ok_or_else(|| "element is not an integer".to_string())
        })
    }

    /// Computes this projection's ordering key for `v`.
    pub fn apply(&self, v: &Value) -> Result<i64, String> {
        (self.0)(v)
    }
}

impl std::fmt::Debug for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Projection(..)")
    }
}

impl PartialEq for Projection {
    fn eq(&self, _other: &Self) -> bool {
        // Projections aren't comparable; treated as equal so `Sorted`
        // variants compare equal when their visible fields match.
        true
    }
}

/// A single constraint on the whole of an
/// [`crate::variable::array::ArrayVariable`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayConstraint {
    /// `min <= elements.len() <= max`, both inclusive.
    Length(Expr, Expr),
    /// No two elements may compare equal.
    DistinctElements,
    /// Elements must appear in the given order under the projection.
    Sorted(SortOrder, Projection),
    /// `value == expected`. Locks the option set to a singleton.
    Exactly(Vec<Value>),
    /// `value` is one of the listed arrays. Locks the option set.
    OneOf(Vec<Vec<Value>>),
    /// A user-supplied predicate over the whole array.
    Custom(CustomConstraint<Vec<Value>>),
}

impl ArrayConstraint {
    /// Checks `elements` against this constraint under the given
    /// environment.
    pub fn check(
        &self,
        elements: &[Value],
        lookup: &mut Lookup<'_>,
        peer_env: &PeerEnv,
    ) -> Result<(), String> {
        match self {
            ArrayConstraint::Length(min, max) => {
                let min = min.eval(lookup).map_err(|e| e.to_string())?;
                let max = max.eval(lookup).map_err(|e| e.to_string())?;
                let len = elements.len() as i64;
                if len < min || len > max {
                    Err(format!(
                        "has length (which is {len}) that is not between {min} and {max}"
                    ))
                } else {
                    Ok(())
                }
            }
            ArrayConstraint::DistinctElements => {
                for i in 0..elements.len() {
                    for j in (i + 1)..elements.len() {
                        if elements[i] == elements[j] {
                            return Err(format!(
                                "has repeated element (which is {}) at positions {i} and {j}",
                                elements[i]
                            ));
                        }
                    }
                }
                Ok(())
            }
            ArrayConstraint::Sorted(order, projection) => {
                let mut keys = Vec::with_capacity(elements.len());
                for e in elements {
                    keys.push(projection.apply(e)?);
                }
                let in_order = keys.windows(2).all(|w| match order {
                    SortOrder::Ascending => w[0] <= w[1],
                    SortOrder::Descending => w[0] >= w[1],
                });
                if in_order {
                    Ok(())
                } else {
                    Err(format!("is not sorted {order:?}"))
                }
            }
            ArrayConstraint::Exactly(expected) => {
                if elements == expected.as_slice() {
                    Ok(())
                } else {
                    Err("is not exactly the required array".to_string())
                }
            }
            ArrayConstraint::OneOf(options) => {
                if options.iter().any(|o| o.as_slice() == elements) {
                    Ok(())
                } else {
                    Err("is not one of the required arrays".to_string())
                }
            }
            ArrayConstraint::Custom(c) => c.check(&elements.to_vec(), peer_env),
        }
    }

    /// Human-readable phrasing for `Variable::to_string()`/error messages.
    pub fn describe(&self) -> String {
        match self {
            ArrayConstraint::Length(min, max) => format!("has length between {min} and {max}"),
            ArrayConstraint::DistinctElements => "has no repeated elements".to_string(),
            ArrayConstraint::Sorted(order, _) => format!("is sorted {order:?}"),
            ArrayConstraint::Exactly(_) => "is exactly the required array".to_string(),
            ArrayConstraint::OneOf(_) => "is one of the required arrays".to_string(),
            ArrayConstraint::Custom(c) => c.describe().to_string(),
        }
    }

    /// Identifiers this constraint's expressions reference.
    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            ArrayConstraint::Length(min, max) => {
                let mut out = min.dependencies();
                out.extend(max.dependencies());
                out
            }
            ArrayConstraint::DistinctElements
            | ArrayConstraint::Sorted(..)
            | ArrayConstraint::Exactly(_)
            | ArrayConstraint::OneOf(_) => BTreeSet::new(),
            ArrayConstraint::Custom(c) => c.dependencies().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_lookup() -> impl FnMut(&str) -> Result<i64, EvalError> {
        |name: &str| {
            Err(EvalError::VariableNotFound {
                name: name.to_string(),
            })
        }
    }

    #[test]
    fn length_checks_element_count() {
        let c = ArrayConstraint::Length(Expr::parse("2").unwrap(), Expr::parse("4").unwrap());
        let peer = PeerEnv::new();
        let elements = vec![Value::Integer(1), Value::Integer(2)];
        assert!(c.check(&elements, &mut no_lookup(), &peer).is_ok());
        assert!(c.check(&[], &mut no_lookup(), &peer).is_err());
    }

    #[test]
    fn distinct_elements_rejects_duplicates() {
        let c = ArrayConstraint::DistinctElements;
        let peer = PeerEnv::new();
        let ok = vec![Value::Integer(1), Value::Integer(2)];
        let bad = vec![Value::Integer(1), Value::Integer(1)];
        assert!(c.check(&ok, &mut no_lookup(), &peer).is_ok());
        assert!(c.check(&bad, &mut no_lookup(), &peer).is_err());
    }

    #[test]
    fn sorted_checks_order_under_projection() {
        let c = ArrayConstraint::Sorted(SortOrder::Ascending, Projection::identity());
        let peer = PeerEnv::new();
        let ok = vec![Value::Integer(1), Value::Integer(2), Value::Integer(2)];
        let bad = vec![Value::Integer(2), Value::Integer(1)];
        assert!(c.check(&ok, &mut no_lookup(), &peer).is_ok());
        assert!(c.check(&bad, &mut no_lookup(), &peer).is_err());
    }
}
