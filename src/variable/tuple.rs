//! The `Tuple<T1,...,Tn>` variable kind. See `SPEC_FULL.md` §4.4.4.

use std::collections::BTreeSet;

use crate::constraints::custom::PeerEnv;
use crate::constraints::tuple::TupleConstraint;
use crate::error::SpecimenError;
use crate::resolver::Resolver;
use crate::value::Value;
use crate::variable::Variable;

/// A declared `Tuple<...>` variable: an ordered list of child `Variable`
/// components (the `Element<I, Ei>` bundle from the grammar) plus whole-tuple
/// [`TupleConstraint`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleVariable {
    components: Vec<Variable>,
    constraints: Vec<TupleConstraint>,
}

impl TupleVariable {
    /// Builds a tuple variable from its ordered component templates.
    pub fn new(components: Vec<Variable>) -> Self {
        Self {
            components,
            constraints: Vec::new(),
        }
    }

    /// Adds a whole-tuple constraint, builder-style.
    pub fn with(mut self, constraint: TupleConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// The component templates, in declaration order.
    pub fn components(&self) -> &[Variable] {
        &self.components
    }

    /// Appends `other`'s whole-tuple constraints onto a clone of `self`.
    /// Components are not merged.
    pub fn merge(&self, other: &TupleVariable) -> TupleVariable {
        let mut merged = self.clone();
        merged.constraints.extend(other.constraints.iter().cloned());
        merged
    }

    /// Identifiers referenced by any component's dependencies plus any
    /// whole-tuple constraint's.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = self.components.iter().flat_map(Variable::dependencies).collect();
        out.extend(self.constraints.iter().flat_map(TupleConstraint::dependencies));
        out
    }

    /// Checks `components` against every declared whole-tuple constraint.
    pub fn validate_value(&self, components: &[Value], peer_env: &PeerEnv) -> Result<(), String> {
        for c in &self.constraints {
            c.check(components, peer_env)?;
        }
        Ok(())
    }

    /// Generates each component in declaration order, under a sub-variable
    /// scope named `<parent>.<i>`.
    pub fn generate(&self, name: &str, resolver: &mut Resolver) -> Result<Value, SpecimenError> {
        let mut values = Vec::with_capacity(self.components.len());
        for (i, component) in self.components.iter().enumerate() {
            let child_name = format!("{name}.{i}");
            resolver.declare(child_name.clone(), component.clone());
            values.push(resolver.generate_variable(&child_name)?);
        }
        if self.validate_value(&values, &PeerEnv::new()).is_err() {
            return Err(SpecimenError::ValidationError(format!(
                "generated tuple '{name}' does not satisfy whole-tuple constraints"
            )));
        }
        Ok(Value::Tuple(values))
    }

    /// Validates an already-produced value, checking each component against
    /// its template and the whole tuple against its own constraints.
    pub fn validate(&self, value: &Value, resolver: &Resolver) -> Result<(), SpecimenError> {
        let components = value.as_tuple().ok_or_else(|| SpecimenError::ValueTypeMismatch {
            name: "<value>".to_string(),
            expected_type: "Tuple".to_string(),
        })?;
        if components.len() != self.components.len() {
            return Err(SpecimenError::ValidationError(format!(
                "tuple has {} components, expected {}",
                components.len(),
                self.components.len()
            )));
        }
        for (template, value) in self.components.iter().zip(components) {
            template.validate("<component>", value, resolver)?;
        }
        self.validate_value(components, &PeerEnv::new())
            .map_err(SpecimenError::ValidationError)
    }

    /// A single curated edge case: each component at its own first edge
    /// case.
    pub fn list_edge_cases(&self) -> Vec<Value> {
        let firsts: Vec<Value> = self
            .components
            .iter()
            .map(|c| {
                c.list_edge_cases()
                    .into_iter()
                    .next()
                    .unwrap_or(Value::None)
            })
            .collect();
        vec![Value::Tuple(firsts)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::integer::IntegerConstraint;
    use crate::expr::Expr;
    use crate::rng::Rng;
    use crate::variable::integer::IntegerVariable;

    fn bounded(lo: &str, hi: &str) -> Variable {
        Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
            Expr::parse(lo).unwrap(),
            Expr::parse(hi).unwrap(),
        )))
    }

    #[test]
    fn generates_each_component_in_order() {
        let var = TupleVariable::new(vec![bounded("1", "1"), bounded("2", "2")]);
        let mut resolver = Resolver::new(Rng::new(&[6u8; 16]).unwrap());
        let value = var.generate("T", &mut resolver).unwrap();
        let components = value.as_tuple().unwrap();
        assert_eq!(components[0].as_integer(), Some(1));
        assert_eq!(components[1].as_integer(), Some(2));
    }
}
