//! Constraints on the whole of a [`crate::variable::variant::VariantVariable`].
//!
//! `Alternative<I, Ai>` (a per-alternative constraint bundle) is not modeled
//! here, for the same reason `Tuple`'s `Element<I, Ei>` lives on
//! `TupleVariable`: each alternative is its own child
//! [`crate::variable::Variable`] template.

use std::collections::BTreeSet;

use crate::constraints::custom::{CustomConstraint, PeerEnv};
use crate::value::Value;

/// A single constraint on the whole of a
/// [`crate::variable::variant::VariantVariable`].
#[derive(Debug, Clone, PartialEq)]
pub enum VariantConstraint {
    /// The chosen alternative must be at this index, with any payload.
    /// This is what `Exactly<Ai>` auto-promotes to when the index can be
    /// determined from the alternative's own type at declaration time.
    ExactlyIndex(usize),
    /// The chosen alternative index must be one of these.
    OneOfIndex(Vec<usize>),
    /// A user-supplied predicate over the chosen `(index, payload)`.
    Custom(CustomConstraint<(usize, Value)>),
}

impl VariantConstraint {
    /// Checks `(index, payload)` against this constraint.
    pub fn check(&self, index: usize, payload: &Value, peer_env: &PeerEnv) -> Result<(), String> {
        match self {
            VariantConstraint::ExactlyIndex(expected) => {
                if index == *expected {
                    Ok(())
                } else {
                    Err(format!(
                        "has alternative index (which is {index}) that is not exactly {expected}"
                    ))
                }
            }
            VariantConstraint::OneOfIndex(options) => {
                if options.contains(&index) {
                    Ok(())
                } else {
                    Err(format!(
                        "has alternative index (which is {index}) that is not one of {options:?}"
                    ))
                }
            }
            VariantConstraint::Custom(c) => c.check(&(index, payload.clone()), peer_env),
        }
    }

    /// Human-readable phrasing for `Variable::to_string()`/error messages.
    pub fn describe(&self) -> String {
        match self {
            VariantConstraint::ExactlyIndex(i) => format!("is exactly alternative {i}"),
            VariantConstraint::OneOfIndex(options) => format!("is one of alternatives {options:?}"),
            VariantConstraint::Custom(c) => c.describe().to_string(),
        }
    }

    /// Identifiers this constraint references.
    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            VariantConstraint::Custom(c) => c.dependencies().clone(),
            VariantConstraint::ExactlyIndex(_) | VariantConstraint::OneOfIndex(_) => {
                BTreeSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_index_pins_alternative() {
        let c = VariantConstraint::ExactlyIndex(1);
        let peer = PeerEnv::new();
        assert!(c.check(1, &Value::Integer(3), &peer).is_ok());
        assert!(c.check(0, &Value::Integer(3), &peer).is_err());
    }

    #[test]
    fn one_of_index_checks_membership() {
        let c = VariantConstraint::OneOfIndex(vec![0, 2]);
        let peer = PeerEnv::new();
        assert!(c.check(2, &Value::None, &peer).is_ok());
        assert!(c.check(1, &Value::None, &peer).is_err());
    }
}
