//! The resolver: the mutable context threaded through every `generate_impl`.
//!
//! Glues the value store, variable store, generation handler, and RNG
//! together. See `SPEC_FULL.md` §4.7.

use std::collections::HashMap;

use crate::error::{EvalError, GenerationError, RetryPolicy, SpecimenError};
use crate::handler::GenerationHandler;
use crate::rng::Rng;
use crate::value::{Value, ValueStore};
use crate::variable::Variable;

/// Orchestrates generation: dispatches to variable kinds, recurses into
/// dependencies, retries failed attempts, and rolls back partial state.
pub struct Resolver {
    values: ValueStore,
    variables: HashMap<String, Variable>,
    handler: GenerationHandler,
    rng: Rng,
}

impl Resolver {
    /// Builds a resolver seeded with `rng` and no declared variables.
    pub fn new(rng: Rng) -> Self {
        Self {
            values: ValueStore::new(),
            variables: HashMap::new(),
            handler: GenerationHandler::new(),
            rng,
        }
    }

    /// Declares `variable` under `name`, replacing any prior declaration.
    pub fn declare(&mut self, name: impl Into<String>, variable: Variable) {
        self.variables.insert(name.into(), variable);
    }

    /// The RNG backing this resolver's generations.
    pub fn rng(&mut self) -> &mut Rng {
        &mut self.rng
    }

    /// Whether `name` has a resolved value in the store.
    pub fn value_is_known(&self, name: &str) -> bool {
        self.values.contains(name)
    }

    /// The resolved value for `name`.
    ///
    /// # Errors
    /// [`SpecimenError::ValueNotFound`] if no value has been generated or
    /// assigned for `name` yet.
    pub fn get_value(&self, name: &str) -> Result<&Value, SpecimenError> {
        self.values
            .get(name)
            .ok_or_else(|| SpecimenError::ValueNotFound(name.to_string()))
    }

    /// Stores `value` under `name`.
    pub fn set_value(&mut self, name: impl Into<String>, value: Value) {
        self.values.set(name, value);
    }

    /// The declared variable for `name`.
    ///
    /// # Errors
    /// [`SpecimenError::VariableNotFound`] if nothing was declared under
    /// `name`.
    pub fn get_variable(&self, name: &str) -> Result<&Variable, SpecimenError> {
        self.variables
            .get(name)
            .ok_or_else(|| SpecimenError::VariableNotFound(name.to_string()))
    }

    /// Returns `name`'s value, generating it (and recursively, its
    /// dependencies) if it is not already known.
    pub fn generate_variable(&mut self, name: &str) -> Result<Value, SpecimenError> {
        if let Some(value) = self.values.get(name) {
            return Ok(value.clone());
        }
        let variable = self.get_variable(name)?.clone();
        self.handler.start(name).map_err(SpecimenError::Generation)?;
        loop {
            match variable.generate(name, self) {
                Ok(value) => {
                    self.handler
                        .complete()
                        .map_err(|m| SpecimenError::configuration("handler", m))?;
                    self.values.set(name.to_string(), value.clone());
                    return Ok(value);
                }
                Err(e) => {
                    let (policy, rollback) = self.handler.report_failure(e.to_string());
                    self.values
                        .erase_all(rollback.iter().map(String::as_str));
                    if policy == RetryPolicy::Abort {
                        let _ = self.handler.abandon();
                        return Err(SpecimenError::Generation(GenerationError {
                            name: name.to_string(),
                            message: e.to_string(),
                            policy,
                        }));
                    }
                }
            }
        }
    }

    /// Generates `name` under the declared variable merged with `extra`
    /// constraints. If a value for `name` is already known, it must satisfy
    /// `extra` or this fails.
    pub fn generate_variable_with(
        &mut self,
        name: &str,
        extra: &Variable,
    ) -> Result<Value, SpecimenError> {
        if let Some(value) = self.values.get(name).cloned() {
            let merged = self.get_variable(name)?.clone().merge(extra)?;
            merged
                .validate(name, &value, self)
                .map_err(|_| {
                    SpecimenError::configuration(
                        name,
                        "cached value does not satisfy the additional constraints",
                    )
                })?;
            return Ok(value);
        }
        let base = self.get_variable(name)?.clone();
        let merged = base.merge(extra)?;
        self.declare(name, merged.clone());
        self.generate_variable(name)
    }

    /// Runs [`Resolver::generate_variable`] solely for its side effect on the
    /// value store.
    pub fn assign_variable(&mut self, name: &str) -> Result<(), SpecimenError> {
        self.generate_variable(name)?;
        Ok(())
    }

    /// A lookup closure resolving peer integer variables by generating them
    /// if necessary. Used while evaluating expressions during generation.
    pub fn generate_lookup(&mut self) -> impl FnMut(&str) -> Result<i64, EvalError> + '_ {
        move |name: &str| -> Result<i64, EvalError> {
            let value = self
                .generate_variable(name)
                .map_err(|e| EvalError::EvaluationError {
                    message: e.to_string(),
                })?;
            value.as_integer().ok_or_else(|| EvalError::EvaluationError {
                message: format!("'{name}' is not an integer variable"),
            })
        }
    }

    /// A lookup closure resolving peer integer variables from already-known
    /// values only. Used while validating a value against its constraints.
    pub fn value_lookup(&self) -> impl FnMut(&str) -> Result<i64, EvalError> + '_ {
        move |name: &str| -> Result<i64, EvalError> {
            let value = self.values.get(name).ok_or_else(|| EvalError::VariableNotFound {
                name: name.to_string(),
            })?;
            value.as_integer().ok_or_else(|| EvalError::EvaluationError {
                message: format!("'{name}' is not an integer variable"),
            })
        }
    }

    /// Draws `self.rng().below(n)`.
    ///
    /// # Errors
    /// [`SpecimenError::ConfigurationError`] if `n < 1`.
    pub fn random_below(&mut self, n: i64) -> Result<i64, SpecimenError> {
        self.rng
            .below(n)
            .map_err(|m| SpecimenError::configuration("Rng::below", m))
    }

    /// Draws `self.rng().between(lo, hi)`.
    ///
    /// # Errors
    /// [`SpecimenError::ConfigurationError`] if `lo > hi`.
    pub fn random_between(&mut self, lo: i64, hi: i64) -> Result<i64, SpecimenError> {
        self.rng
            .between(lo, hi)
            .map_err(|m| SpecimenError::configuration("Rng::between", m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::integer::IntegerConstraint;
    use crate::expr::Expr;
    use crate::variable::integer::IntegerVariable;

    #[test]
    fn generate_variable_caches_and_reuses_value() {
        let mut resolver = Resolver::new(Rng::new(&[7u8; 16]).unwrap());
        let a = Variable::Integer(
            IntegerVariable::new()
                .with(IntegerConstraint::Between(
                    Expr::parse("1").unwrap(),
                    Expr::parse("10").unwrap(),
                ))
        );
        resolver.declare("A", a);
        let first = resolver.generate_variable("A").unwrap();
        let second = resolver.generate_variable("A").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn generate_variable_resolves_peer_dependency() {
        let mut resolver = Resolver::new(Rng::new(&[9u8; 16]).unwrap());
        resolver.declare(
            "N",
            Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Exactly(
                Expr::parse("5").unwrap(),
            ))),
        );
        resolver.declare(
            "M",
            Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
                Expr::parse("N").unwrap(),
                Expr::parse("N").unwrap(),
            ))),
        );
        let m = resolver.generate_variable("M").unwrap();
        assert_eq!(m.as_integer(), Some(5));
    }

    #[test]
    fn missing_value_errors() {
        let resolver = Resolver::new(Rng::new(&[1u8; 16]).unwrap());
        assert!(resolver.get_value("ghost").is_err());
    }
}
