//! The `Variant<A1,...,An>` variable kind. See `SPEC_FULL.md` §4.4.5.

use std::collections::BTreeSet;

use crate::constraints::custom::PeerEnv;
use crate::constraints::variant::VariantConstraint;
use crate::error::{GenerationError, RetryPolicy, SpecimenError};
use crate::resolver::Resolver;
use crate::value::Value;
use crate::variable::Variable;

/// A declared `Variant<...>` variable: an ordered list of alternative
/// `Variable` templates (the `Alternative<I, Ai>` bundle from the grammar)
/// plus whole-variant [`VariantConstraint`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantVariable {
    alternatives: Vec<Variable>,
    constraints: Vec<VariantConstraint>,
}

impl VariantVariable {
    /// Builds a variant variable from its ordered alternative templates.
    pub fn new(alternatives: Vec<Variable>) -> Self {
        Self {
            alternatives,
            constraints: Vec::new(),
        }
    }

    /// Adds a whole-variant constraint, builder-style.
    pub fn with(mut self, constraint: VariantConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// `Exactly<Ai>`-style convenience: pins generation to alternative
    /// `index`, auto-promoting from a type-level pick to an index constraint.
    pub fn exactly(self, index: usize) -> Self {
        self.with(VariantConstraint::ExactlyIndex(index))
    }

    /// The alternative templates, in declaration order.
    pub fn alternatives(&self) -> &[Variable] {
        &self.alternatives
    }

    /// Appends `other`'s whole-variant constraints onto a clone of `self`.
    /// Alternatives are not merged.
    pub fn merge(&self, other: &VariantVariable) -> VariantVariable {
        let mut merged = self.clone();
        merged.constraints.extend(other.constraints.iter().cloned());
        merged
    }

    /// Identifiers referenced by any alternative's dependencies plus any
    /// whole-variant constraint's.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = self
            .alternatives
            .iter()
            .flat_map(Variable::dependencies)
            .collect();
        out.extend(self.constraints.iter().flat_map(VariantConstraint::dependencies));
        out
    }

    fn eligible_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.alternatives.len()).collect();
        for c in &self.constraints {
            match c {
                VariantConstraint::ExactlyIndex(i) => indices.retain(|x| x == i),
                VariantConstraint::OneOfIndex(opts) => indices.retain(|x| opts.contains(x)),
                VariantConstraint::Custom(_) => {}
            }
        }
        indices
    }

    /// Checks `(index, payload)` against every declared whole-variant
    /// constraint.
    pub fn validate_value(
        &self,
        index: usize,
        payload: &Value,
        peer_env: &PeerEnv,
    ) -> Result<(), String> {
        for c in &self.constraints {
            c.check(index, payload, peer_env)?;
        }
        Ok(())
    }

    /// Chooses an eligible alternative uniformly at random and generates it.
    pub fn generate(&self, name: &str, resolver: &mut Resolver) -> Result<Value, SpecimenError> {
        let eligible = self.eligible_indices();
        if eligible.is_empty() {
            return Err(SpecimenError::Generation(GenerationError {
                name: name.to_string(),
                message: "no alternative is eligible under the declared constraints".to_string(),
                policy: RetryPolicy::Retry,
            }));
        }
        let pick = eligible[resolver.random_below(eligible.len() as i64)? as usize];
        let child_name = format!("{name}.{pick}");
        resolver.declare(child_name.clone(), self.alternatives[pick].clone());
        let payload = resolver.generate_variable(&child_name)?;

        if self.validate_value(pick, &payload, &PeerEnv::new()).is_err() {
            return Err(SpecimenError::Generation(GenerationError {
                name: name.to_string(),
                message: "generated alternative does not satisfy whole-variant constraints"
                    .to_string(),
                policy: RetryPolicy::Retry,
            }));
        }

        Ok(Value::Variant {
            index: pick,
            value: Box::new(payload),
        })
    }

    /// Validates an already-produced value against its alternative's
    /// template and the whole-variant constraints.
    pub fn validate(&self, value: &Value, resolver: &Resolver) -> Result<(), SpecimenError> {
        let (index, payload) = value.as_variant().ok_or_else(|| SpecimenError::ValueTypeMismatch {
            name: "<value>".to_string(),
            expected_type: "Variant".to_string(),
        })?;
        let template = self.alternatives.get(index).ok_or_else(|| {
            SpecimenError::ValidationError(format!("alternative index {index} out of range"))
        })?;
        template.validate("<alternative>", payload, resolver)?;
        self.validate_value(index, payload, &PeerEnv::new())
            .map_err(SpecimenError::ValidationError)
    }

    /// One curated edge case per alternative, generated against its own
    /// first edge case.
    pub fn list_edge_cases(&self) -> Vec<Value> {
        self.alternatives
            .iter()
            .enumerate()
            .map(|(index, alt)| Value::Variant {
                index,
                value: Box::new(alt.list_edge_cases().into_iter().next().unwrap_or(Value::None)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;
    use crate::variable::none::NoneVariable;

    #[test]
    fn exactly_pins_the_chosen_alternative() {
        let var = VariantVariable::new(vec![
            Variable::None(NoneVariable::new()),
            Variable::None(NoneVariable::new()),
        ])
        .exactly(1);
        let mut resolver = Resolver::new(Rng::new(&[8u8; 16]).unwrap());
        let value = var.generate("V", &mut resolver).unwrap();
        let (index, _) = value.as_variant().unwrap();
        assert_eq!(index, 1);
    }
}
