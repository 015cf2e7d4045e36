//! User-supplied predicate constraints, usable from any variable kind.
//!
//! Native constraint families (`Between`, `Length`, `Alphabet`, ...) are
//! closed per-kind enums (see the design note in `SPEC_FULL.md` §4.2): the
//! dispatch target is always known at variable-kind granularity, so no
//! dynamic dispatch is needed for them. A user predicate is inherently
//! type-erased, so this is the one place a boxed closure is warranted.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::value::Value;

/// A named peer-variable environment visible to a [`CustomConstraint`]
/// predicate.
pub type PeerEnv = std::collections::HashMap<String, Value>;

/// A user-supplied predicate over a value of type `T`, with optional named
/// dependencies on peer variables. Checked after every native constraint for
/// the same variable has passed.
#[derive(Clone)]
pub struct CustomConstraint<T> {
    description: String,
    dependencies: BTreeSet<String>,
    predicate: Rc<dyn Fn(&T, &PeerEnv) -> Result<(), String>>,
}

impl<T> CustomConstraint<T> {
    /// Builds a custom constraint from a human-readable description and a
    /// predicate. `dependencies` lists the peer variables the predicate
    /// reads from `PeerEnv`; they are generated before this constraint runs.
    pub fn new(
        description: impl Into<String>,
        dependencies: impl IntoIterator<Item = String>,
        predicate: impl Fn(&T, &PeerEnv) -> Result<(), String> + 'static,
    ) -> Self {
        Self {
            description: description.into(),
            dependencies: dependencies.into_iter().collect(),
            predicate: Rc::new(predicate),
        }
    }

    /// Runs the predicate.
    pub fn check(&self, value: &T, env: &PeerEnv) -> Result<(), String> {
        (self.predicate)(value, env)
    }

    /// The human-readable description supplied at construction.
    pub fn describe(&self) -> &str {
        &self.description
    }

    /// The declared peer-variable dependencies.
    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }
}

impl<T> std::fmt::Debug for CustomConstraint<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomConstraint")
            .field("description", &self.description)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

impl<T> PartialEq for CustomConstraint<T> {
    fn eq(&self, other: &Self) -> bool {
        // Predicates aren't comparable; two custom constraints are
        // considered equal iff they present identically, mirroring how the
        // rest of the constraint algebra compares by description.
        self.description == other.description && self.dependencies == other.dependencies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_predicate_and_reports_description() {
        let c = CustomConstraint::<i64>::new("must be even", [], |v, _env| {
            if v % 2 == 0 {
                Ok(())
            } else {
                Err(format!("{v} is not even"))
            }
        });
        assert!(c.check(&4, &PeerEnv::new()).is_ok());
        assert!(c.check(&3, &PeerEnv::new()).is_err());
        assert_eq!(c.describe(), "must be even");
    }

    #[test]
    fn reads_peer_dependencies() {
        let c = CustomConstraint::<i64>::new(
            "less than N",
            ["N".to_string()],
            |v, env| match env.get("N").and_then(Value::as_integer) {
                Some(n) if *v < n => Ok(()),
                Some(n) => Err(format!("{v} is not less than {n}")),
                None => Err("N not found".to_string()),
            },
        );
        let mut env = PeerEnv::new();
        env.insert("N".to_string(), Value::Integer(10));
        assert!(c.check(&5, &env).is_ok());
        assert!(c.check(&20, &env).is_err());
        assert_eq!(c.dependencies().len(), 1);
    }
}
