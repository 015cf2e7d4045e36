//! The `None` variable kind: an inert placeholder with a single value.
//! Used as the unit payload for variant alternatives that carry no data.

use std::collections::BTreeSet;

use crate::error::SpecimenError;
use crate::resolver::Resolver;
use crate::value::Value;

/// The inert `None` variable. Always generates/validates [`Value::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoneVariable;

impl NoneVariable {
    /// Builds a `None` variable.
    pub fn new() -> Self {
        Self
    }

    /// No dependencies.
    pub fn dependencies(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    /// Always succeeds with [`Value::None`].
    pub fn generate(&self, _name: &str, _resolver: &mut Resolver) -> Result<Value, SpecimenError> {
        Ok(Value::None)
    }

    /// Succeeds iff `value` is [`Value::None`].
    pub fn validate(&self, value: &Value) -> Result<(), SpecimenError> {
        match value {
            Value::None => Ok(()),
            _ => Err(SpecimenError::ValueTypeMismatch {
                name: "<value>".to_string(),
                expected_type: "None".to_string(),
            }),
        }
    }

    /// The sole value.
    pub fn list_edge_cases(&self) -> Vec<Value> {
        vec![Value::None]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    #[test]
    fn generates_none() {
        let var = NoneVariable::new();
        let mut resolver = Resolver::new(Rng::new(&[0u8; 16]).unwrap());
        assert_eq!(var.generate("X", &mut resolver).unwrap(), Value::None);
    }
}
