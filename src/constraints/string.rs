//! Constraints for [`crate::variable::string::StringVariable`].

use std::collections::BTreeSet;

use crate::constraints::custom::{CustomConstraint, PeerEnv};
use crate::error::EvalError;
use crate::expr::Expr;
use crate::pattern::SimplePattern;

/// A lookup function from peer variable name to its resolved `i64` value,
/// used to evaluate length/bound expressions.
pub type Lookup<'a> = dyn FnMut(&str) -> Result<i64, EvalError> + 'a;

/// A single constraint on a [`crate::variable::string::StringVariable`].
#[derive(Debug, Clone, PartialEq)]
pub enum StringConstraint {
    /// `min <= value.chars().count() <= max`, both inclusive.
    Length(Expr, Expr),
    /// Every character in `value` must be drawn from this set.
    Alphabet(BTreeSet<char>),
    /// No character may repeat within `value`.
    DistinctCharacters,
    /// `value` must match the given [`SimplePattern`].
    SimplePattern(SimplePattern),
    /// `value == expected`. Locks the option set to a singleton.
    Exactly(String),
    /// `value` is one of the listed strings. Locks the option set.
    OneOf(Vec<String>),
    /// A user-supplied predicate.
    Custom(CustomConstraint<String>),
}

impl StringConstraint {
    /// Checks `value` against this constraint under the given environment.
    pub fn check(
        &self,
        value: &str,
        lookup: &mut Lookup<'_>,
        peer_env: &PeerEnv,
    ) -> Result<(), String> {
        match self {
            StringConstraint::Length(min, max) => {
                let min = min.eval(lookup).map_err(|e| e.to_string())?;
                let max = max.eval(lookup).map_err(|e| e.to_string())?;
                let len = value.chars().count() as i64;
                if len < min || len > max {
                    Err(format!(
                        "has length (which is {len}) that is not between {min} and {max}"
                    ))
                } else {
                    Ok(())
                }
            }
            StringConstraint::Alphabet(alphabet) => {
                match value.chars().find(|c| !alphabet.contains(c)) {
                    Some(bad) => Err(format!(
                        "contains character '{bad}' that is not in the declared alphabet"
                    )),
                    None => Ok(()),
                }
            }
            StringConstraint::DistinctCharacters => {
                let mut seen = BTreeSet::new();
                for c in value.chars() {
                    if !seen.insert(c) {
                        return Err(format!("contains repeated character '{c}'"));
                    }
                }
                Ok(())
            }
            StringConstraint::SimplePattern(pattern) => {
                match pattern.matches(value, lookup) {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(format!(
                        "does not match the required pattern '{}'",
                        pattern.source()
                    )),
                    Err(e) => Err(e.to_string()),
                }
            }
            StringConstraint::Exactly(expected) => {
                if value == expected {
                    Ok(())
                } else {
                    Err(format!("is not exactly '{expected}'"))
                }
            }
            StringConstraint::OneOf(options) => {
                if options.iter().any(|o| o == value) {
                    Ok(())
                } else {
                    Err(format!("is not one of {options:?}"))
                }
            }
            StringConstraint::Custom(c) => c.check(&value.to_string(), peer_env),
        }
    }

    /// Human-readable phrasing for `Variable::to_string()`/error messages.
    pub fn describe(&self) -> String {
        match self {
            StringConstraint::Length(min, max) => format!("has length between {min} and {max}"),
            StringConstraint::Alphabet(alphabet) => {
                format!("uses only characters in {:?}", alphabet.iter().collect::<Vec<_>>())
            }
            StringConstraint::DistinctCharacters => "has no repeated characters".to_string(),
            StringConstraint::SimplePattern(pattern) => {
                format!("matches pattern '{}'", pattern.source())
            }
            StringConstraint::Exactly(expected) => format!("is exactly '{expected}'"),
            StringConstraint::OneOf(options) => format!("is one of {options:?}"),
            StringConstraint::Custom(c) => c.describe().to_string(),
        }
    }

    /// Identifiers this constraint's expressions reference (length bounds,
    /// pattern quantifier bounds).
    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            StringConstraint::Length(min, max) => {
                let mut out = min.dependencies();
                out.extend(max.dependencies());
                out
            }
            StringConstraint::SimplePattern(pattern) => pattern.dependencies(),
            StringConstraint::Alphabet(_)
            | StringConstraint::DistinctCharacters
            | StringConstraint::Exactly(_)
            | StringConstraint::OneOf(_) => BTreeSet::new(),
            StringConstraint::Custom(c) => c.dependencies().clone(),
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
    fn length_checks_char_count() {
        let c = StringConstraint::Length(Expr::parse("1").unwrap(), Expr::parse("3").unwrap());
        let peer = PeerEnv::new();
        assert!(c.check("ab", &mut no_lookup(), &peer).is_ok());
        assert!(c.check("", &mut no_lookup(), &peer).is_err());
        assert!(c.check("abcd", &mut no_lookup(), &peer).is_err());
    }

    #[test]
    fn alphabet_rejects_foreign_characters() {
        let c = StringConstraint::Alphabet(['a', 'b', 'c'].into_iter().collect());
        let peer = PeerEnv::new();
        assert!(c.check("abc", &mut no_lookup(), &peer).is_ok());
        assert!(c.check("abd", &mut no_lookup(), &peer).is_err());
    }

    #[test]
    fn distinct_characters_rejects_repeats() {
        let c = StringConstraint::DistinctCharacters;
        let peer = PeerEnv::new();
        assert!(c.check("abc", &mut no_lookup(), &peer).is_ok());
        assert!(c.check("aba", &mut no_lookup(), &peer).is_err());
    }

    #[test]
    fn simple_pattern_constraint_delegates_to_pattern_matching() {
        let pattern = SimplePattern::compile("a+b").unwrap();
        let c = StringConstraint::SimplePattern(pattern);
        let peer = PeerEnv::new();
        assert!(c.check("aaab", &mut no_lookup(), &peer).is_ok());
        assert!(c.check("b", &mut no_lookup(), &peer).is_err());
    }
}
