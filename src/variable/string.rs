//! The `String` variable kind. See `SPEC_FULL.md` §4.4.2.

use std::collections::BTreeSet;

use crate::constraints::custom::PeerEnv;
use crate::constraints::string::{Lookup, StringConstraint};
use crate::error::{GenerationError, RetryPolicy, SpecimenError};
use crate::resolver::Resolver;
use crate::value::Value;

const GENERATE_RETRY_BUDGET: u32 = 10_000;

/// A declared `String` variable: a bag of [`StringConstraint`]s.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringVariable {
    constraints: Vec<StringConstraint>,
}

impl StringVariable {
    /// An unconstrained string variable. Generation requires at least a
    /// `Length` + `Alphabet` pair, or a `SimplePattern`, to be declared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constraint, builder-style.
    pub fn with(mut self, constraint: StringConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// The declared constraints, in declaration order.
    pub fn constraints(&self) -> &[StringConstraint] {
        &self.constraints
    }

    /// Appends `other`'s constraints onto a clone of `self`.
    pub fn merge(&self, other: &StringVariable) -> StringVariable {
        let mut merged = self.clone();
        merged.constraints.extend(other.constraints.iter().cloned());
        merged
    }

    /// Identifiers referenced by any constraint's expressions.
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.constraints
            .iter()
            .flat_map(StringConstraint::dependencies)
            .collect()
    }

    fn pattern(&self) -> Option<&crate::pattern::SimplePattern> {
        self.constraints.iter().find_map(|c| match c {
            StringConstraint::SimplePattern(p) => Some(p),
            _ => None,
        })
    }

    fn length_bounds(&self, lookup: &mut Lookup<'_>) -> Result<Option<(i64, i64)>, SpecimenError> {
        let mut bounds = None;
        for c in &self.constraints {
            if let StringConstraint::Length(min, max) = c {
                let lo = min.eval(lookup)?;
                let hi = max.eval(lookup)?;
                bounds = Some(match bounds {
                    Some((plo, phi)) => (plo.max(lo), (phi as i64).min(hi)),
                    None => (lo, hi),
                });
            }
        }
        Ok(bounds)
    }

    fn alphabet(&self) -> Option<BTreeSet<char>> {
        self.constraints.iter().find_map(|c| match c {
            StringConstraint::Alphabet(a) => Some(a.clone()),
            _ => None,
        })
    }

    fn distinct_required(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, StringConstraint::DistinctCharacters))
    }

    /// Checks `value` against every declared constraint.
    pub fn validate_value(
        &self,
        value: &str,
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
        if let Some(pattern) = self.pattern().cloned() {
            let alphabet = self.alphabet();
            let mut lookup = resolver.generate_lookup();
            let generated = pattern
                .generate(alphabet.as_ref(), &mut lookup, resolver.rng())
                .map_err(|e| {
                    SpecimenError::Generation(GenerationError {
                        name: name.to_string(),
                        message: e.to_string(),
                        policy: RetryPolicy::Retry,
                    })
                })?;
            return Ok(Value::Str(generated));
        }

        let (lo, hi) = self
            .length_bounds(&mut resolver.generate_lookup())?
            .ok_or_else(|| {
                SpecimenError::configuration(
                    name,
                    "String generation requires either a SimplePattern or a Length constraint",
                )
            })?;
        let alphabet = self.alphabet().ok_or_else(|| {
            SpecimenError::configuration(
                name,
                "String generation without a SimplePattern requires an Alphabet constraint",
            )
        })?;
        if lo < 0 || hi < lo {
            return Err(SpecimenError::Generation(GenerationError {
                name: name.to_string(),
                message: format!("evaluated length range [{lo}, {hi}] is empty"),
                policy: RetryPolicy::Retry,
            }));
        }
        let distinct = self.distinct_required();
        let alphabet_chars: Vec<char> = alphabet.iter().copied().collect();

        for _ in 0..GENERATE_RETRY_BUDGET {
            let len = resolver.random_between(lo, hi)? as usize;
            if distinct && len > alphabet_chars.len() {
                return Err(SpecimenError::Generation(GenerationError {
                    name: name.to_string(),
                    message: format!(
                        "length {len} exceeds alphabet size {} under DistinctCharacters",
                        alphabet_chars.len()
                    ),
                    policy: RetryPolicy::Retry,
                }));
            }
            let candidate = if distinct {
                let mut pool = alphabet_chars.clone();
                let mut out = String::with_capacity(len);
                for _ in 0..len {
                    let idx = resolver.random_below(pool.len() as i64)? as usize;
                    out.push(pool.remove(idx));
                }
                out
            } else {
                let mut out = String::with_capacity(len);
                for _ in 0..len {
                    let idx = resolver.random_below(alphabet_chars.len() as i64)? as usize;
                    out.push(alphabet_chars[idx]);
                }
                out
            };

            let mut lookup = resolver.generate_lookup();
            if self
                .validate_value(&candidate, &mut lookup, &PeerEnv::new())
                .is_ok()
            {
                return Ok(Value::Str(candidate));
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
        let s = value.as_str().ok_or_else(|| SpecimenError::ValueTypeMismatch {
            name: "<value>".to_string(),
            expected_type: "String".to_string(),
        })?;
        self.validate_value(s, &mut resolver.value_lookup(), &PeerEnv::new())
            .map_err(SpecimenError::ValidationError)
    }

    /// A small curated set of boundary values: empty string and (if an
    /// alphabet is declared) single- and double-character strings.
    pub fn list_edge_cases(&self) -> Vec<Value> {
        let mut out = vec![Value::Str(String::new())];
        if let Some(alphabet) = self.alphabet() {
            if let Some(&c) = alphabet.iter().next() {
                out.push(Value::Str(c.to_string()));
                out.push(Value::Str(c.to_string().repeat(2)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::rng::Rng;

    #[test]
    fn generates_within_length_and_alphabet() {
        let var = StringVariable::new()
            .with(StringConstraint::Length(
                Expr::parse("1").unwrap(),
                Expr::parse("5").unwrap(),
            ))
            .with(StringConstraint::Alphabet(['a', 'b'].into_iter().collect()));
        let mut resolver = Resolver::new(Rng::new(&[11u8; 16]).unwrap());
        let value = var.generate("S", &mut resolver).unwrap();
        let s = value.as_str().unwrap();
        assert!((1..=5).contains(&s.chars().count()));
        assert!(s.chars().all(|c| c == 'a' || c == 'b'));
    }

    #[test]
    fn distinct_characters_requires_len_le_alphabet() {
        let var = StringVariable::new()
            .with(StringConstraint::Length(
                Expr::parse("5").unwrap(),
                Expr::parse("5").unwrap(),
            ))
            .with(StringConstraint::Alphabet(['a', 'b'].into_iter().collect()))
            .with(StringConstraint::DistinctCharacters);
        let mut resolver = Resolver::new(Rng::new(&[11u8; 16]).unwrap());
        assert!(var.generate("S", &mut resolver).is_err());
    }

    #[test]
    fn generates_from_simple_pattern() {
        let pattern = crate::pattern::SimplePattern::compile("a{1,3}b").unwrap();
        let var = StringVariable::new().with(StringConstraint::SimplePattern(pattern));
        let mut resolver = Resolver::new(Rng::new(&[2u8; 16]).unwrap());
        let value = var.generate("S", &mut resolver).unwrap();
        let s = value.as_str().unwrap();
        assert!(s.ends_with('b'));
        assert!((1..=3).contains(&(s.len() - 1)));
        assert!(s[..s.len() - 1].chars().all(|c| c == 'a'));
    }
}
