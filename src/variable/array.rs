//! The `Array<E>` variable kind. See `SPEC_FULL.md` §4.4.3.

use std::collections::BTreeSet;

use crate::constraints::array::{ArrayConstraint, Lookup, SortOrder};
use crate::constraints::custom::PeerEnv;
use crate::error::{GenerationError, RetryPolicy, SpecimenError};
use crate::resolver::Resolver;
use crate::value::Value;
use crate::variable::Variable;

/// A declared `Array<E>` variable: a bag of whole-array [`ArrayConstraint`]s
/// plus a child `Variable` template describing each element (the `Elements<E>`
/// bundle from the grammar).
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayVariable {
    constraints: Vec<ArrayConstraint>,
    element: Box<Variable>,
}

impl ArrayVariable {
    /// Builds an array variable whose elements follow `element`'s
    /// constraints.
    pub fn new(element: Variable) -> Self {
        Self {
            constraints: Vec::new(),
            element: Box::new(element),
        }
    }

    /// Adds a whole-array constraint, builder-style.
    pub fn with(mut self, constraint: ArrayConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// The declared whole-array constraints, in declaration order.
    pub fn constraints(&self) -> &[ArrayConstraint] {
        &self.constraints
    }

    /// The element template variable.
    pub fn element(&self) -> &Variable {
        &self.element
    }

    /// Appends `other`'s constraints onto a clone of `self`. Element
    /// templates are not merged; `self`'s element template is kept.
    pub fn merge(&self, other: &ArrayVariable) -> ArrayVariable {
        let mut merged = self.clone();
        merged.constraints.extend(other.constraints.iter().cloned());
        merged
    }

    /// Identifiers referenced by this array's own constraints plus its
    /// element template's.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = self
            .constraints
            .iter()
            .flat_map(ArrayConstraint::dependencies)
            .collect();
        out.extend(self.element.dependencies());
        out
    }

    fn length_bounds(&self, lookup: &mut Lookup<'_>) -> Option<(i64, i64)> {
        let mut bounds = None;
        for c in &self.constraints {
            if let ArrayConstraint::Length(min, max) = c {
                if let (Ok(lo), Ok(hi)) = (min.eval(lookup), max.eval(lookup)) {
                    bounds = Some(match bounds {
                        Some((plo, phi)) => (i64::max(plo, lo), i64::min(phi, hi)),
                        None => (lo, hi),
                    });
                }
            }
        }
        bounds
    }

    fn distinct_required(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, ArrayConstraint::DistinctElements))
    }

    /// The array's length, if its declared `Length` constraint evaluates to
    /// a single value (`lo == hi`). Textual reading has no inline length
    /// marker, so the length must be pinned this way before a read can
    /// begin.
    pub fn unique_length(&self, lookup: &mut Lookup<'_>) -> Option<i64> {
        let (lo, hi) = self.length_bounds(lookup)?;
        (lo == hi).then_some(lo)
    }

    /// Checks `elements` against every declared whole-array constraint (the
    /// element template's own constraints are checked separately, per
    /// element).
    pub fn validate_value(
        &self,
        elements: &[Value],
        lookup: &mut Lookup<'_>,
        peer_env: &PeerEnv,
    ) -> Result<(), String> {
        for c in &self.constraints {
            c.check(elements, lookup, peer_env)?;
        }
        Ok(())
    }

    /// Generates an array satisfying the declared length, element template,
    /// and whole-array constraints.
    pub fn generate(&self, name: &str, resolver: &mut Resolver) -> Result<Value, SpecimenError> {
        let (lo, hi) = self
            .length_bounds(&mut resolver.generate_lookup())
            .ok_or_else(|| {
                SpecimenError::configuration(name, "Array generation requires a Length constraint")
            })?;
        if lo < 0 || hi < lo {
            return Err(SpecimenError::Generation(GenerationError {
                name: name.to_string(),
                message: format!("evaluated length range [{lo}, {hi}] is empty"),
                policy: RetryPolicy::Retry,
            }));
        }
        let n = resolver.random_between(lo, hi)? as usize;

        // Harmonic-sum retry budget from SPEC_FULL.md §4.4.3: n*H_n + 14n.
        let retry_budget = if self.distinct_required() {
            let h_n: f64 = (1..=n.max(1)).map(|k| 1.0 / k as f64).sum();
            ((n as f64) * h_n + 14.0 * n as f64).ceil() as u64 + 1
        } else {
            1
        };

        let mut elements: Vec<Value> = Vec::with_capacity(n);
        for i in 0..n {
            let elem_name = format!("{name}.elem[{i}]");
            let mut attempts = 0u64;
            loop {
                resolver.declare(elem_name.clone(), (*self.element).clone());
                let candidate = self.element.generate(&elem_name, resolver)?;
                let is_dup = self.distinct_required() && elements.contains(&candidate);
                attempts += 1;
                if !is_dup || attempts >= retry_budget {
                    if is_dup {
                        return Err(SpecimenError::Generation(GenerationError {
                            name: name.to_string(),
                            message: format!(
                                "exhausted distinct-element retry budget at index {i}"
                            ),
                            policy: RetryPolicy::Retry,
                        }));
                    }
                    elements.push(candidate);
                    break;
                }
            }
        }

        if let Some(ArrayConstraint::Sorted(order, projection)) = self
            .constraints
            .iter()
            .find(|c| matches!(c, ArrayConstraint::Sorted(..)))
        {
            let mut keyed = Vec::with_capacity(elements.len());
            for e in elements {
                let key = projection.apply(&e).map_err(|m| {
                    SpecimenError::Generation(GenerationError {
                        name: name.to_string(),
                        message: format!("cannot order generated element: {m}"),
                        policy: RetryPolicy::Retry,
                    })
                })?;
                keyed.push((key, e));
            }
            keyed.sort_by(|a, b| match order {
                SortOrder::Ascending => a.0.cmp(&b.0),
                SortOrder::Descending => b.0.cmp(&a.0),
            });
            elements = keyed.into_iter().map(|(_, v)| v).collect();
        }

        let mut lookup = resolver.generate_lookup();
        if self
            .validate_value(&elements, &mut lookup, &PeerEnv::new())
            .is_err()
        {
            return Err(SpecimenError::Generation(GenerationError {
                name: name.to_string(),
                message: "generated array does not satisfy whole-array constraints".to_string(),
                policy: RetryPolicy::Retry,
            }));
        }

        Ok(Value::Array(elements))
    }

    /// Validates an already-produced value, checking each element against
    /// the element template as well as whole-array constraints.
    pub fn validate(&self, value: &Value, resolver: &Resolver) -> Result<(), SpecimenError> {
        let elements = value.as_array().ok_or_else(|| SpecimenError::ValueTypeMismatch {
            name: "<value>".to_string(),
            expected_type: "Array".to_string(),
        })?;
        for e in elements {
            self.element.validate("<element>", e, resolver)?;
        }
        self.validate_value(elements, &mut resolver.value_lookup(), &PeerEnv::new())
            .map_err(SpecimenError::ValidationError)
    }

    /// A small curated set of boundary values: the empty array plus, if the
    /// element template has edge cases, a singleton array of its first one.
    pub fn list_edge_cases(&self) -> Vec<Value> {
        let mut out = vec![Value::Array(Vec::new())];
        if let Some(first) = self.element.list_edge_cases().into_iter().next() {
            out.push(Value::Array(vec![first]));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::integer::IntegerConstraint;
    use crate::expr::Expr;
    use crate::rng::Rng;
    use crate::variable::integer::IntegerVariable;

    fn bounded_element() -> Variable {
        Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
            Expr::parse("1").unwrap(),
            Expr::parse("10").unwrap(),
        )))
    }

    #[test]
    fn generates_requested_length() {
        let var = ArrayVariable::new(bounded_element()).with(ArrayConstraint::Length(
            Expr::parse("3").unwrap(),
            Expr::parse("3").unwrap(),
        ));
        let mut resolver = Resolver::new(Rng::new(&[4u8; 16]).unwrap());
        let value = var.generate("V", &mut resolver).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn distinct_elements_has_no_duplicates() {
        let var = ArrayVariable::new(bounded_element())
            .with(ArrayConstraint::Length(
                Expr::parse("5").unwrap(),
                Expr::parse("5").unwrap(),
            ))
            .with(ArrayConstraint::DistinctElements);
        let mut resolver = Resolver::new(Rng::new(&[4u8; 16]).unwrap());
        let value = var.generate("V", &mut resolver).unwrap();
        let elements = value.as_array().unwrap();
        let unique: BTreeSet<i64> = elements.iter().filter_map(Value::as_integer).collect();
        assert_eq!(unique.len(), elements.len());
    }

    #[test]
    fn missing_length_is_a_configuration_error() {
        let var = ArrayVariable::new(bounded_element());
        let mut resolver = Resolver::new(Rng::new(&[4u8; 16]).unwrap());
        assert!(var.generate("V", &mut resolver).is_err());
    }
}
