//! Constraints on the whole of a [`crate::variable::tuple::TupleVariable`].
//!
//! `Element<I, Ei>` (a per-component constraint bundle) is not modeled here:
//! each component is its own child [`crate::variable::Variable`] template,
//! applied by `TupleVariable` directly, for the same reason `Array<E>`'s
//! `Elements<E>` lives on `ArrayVariable` rather than in this enum.

use std::collections::BTreeSet;

use crate::constraints::custom::{CustomConstraint, PeerEnv};
use crate::value::Value;

/// A single constraint on the whole of a
/// [`crate::variable::tuple::TupleVariable`].
#[derive(Debug, Clone, PartialEq)]
pub enum TupleConstraint {
    /// `value == expected`. Locks the option set to a singleton.
    Exactly(Vec<Value>),
    /// `value` is one of the listed tuples. Locks the option set.
    OneOf(Vec<Vec<Value>>),
    /// A user-supplied predicate over the whole tuple.
    Custom(CustomConstraint<Vec<Value>>),
}

impl TupleConstraint {
    /// Checks `components` against this constraint.
    pub fn check(&self, components: &[Value], peer_env: &PeerEnv) -> Result<(), String> {
        match self {
            TupleConstraint::Exactly(expected) => {
                if components == expected.as_slice() {
                    Ok(())
                } else {
                    Err("is not exactly the required tuple".to_string())
                }
            }
            TupleConstraint::OneOf(options) => {
                if options.iter().any(|o| o.as_slice() == components) {
                    Ok(())
                } else {
                    Err("is not one of the required tuples".to_string())
                }
            }
            TupleConstraint::Custom(c) => c.check(&components.to_vec(), peer_env),
        }
    }

    /// Human-readable phrasing for `Variable::to_string()`/error messages.
    pub fn describe(&self) -> String {
        match self {
            TupleConstraint::Exactly(_) => "is exactly the required tuple".to_string(),
            TupleConstraint::OneOf(_) => "is one of the required tuples".to_string(),
            TupleConstraint::Custom(c) => c.describe().to_string(),
        }
    }

    /// Identifiers this constraint references. Whole-tuple constraints carry
    /// no expression bounds, so this is always empty.
    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            TupleConstraint::Custom(c) => c.dependencies().clone(),
            TupleConstraint::Exactly(_) | TupleConstraint::OneOf(_) => BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_compares_components() {
        let c = TupleConstraint::Exactly(vec![Value::Integer(1), Value::Str("a".to_string())]);
        let peer = PeerEnv::new();
        assert!(c
            .check(&[Value::Integer(1), Value::Str("a".to_string())], &peer)
            .is_ok());
        assert!(c
            .check(&[Value::Integer(2), Value::Str("a".to_string())], &peer)
            .is_err());
    }
}
