//! Compound variable descriptions built from constraints.
//!
//! Each variable kind is its own struct (`IntegerVariable`, `StringVariable`,
//! ...) wrapped in the closed [`Variable`] enum, rather than a single
//! `dyn Variable` hierarchy: the dispatch target is always known at
//! declaration time, so a sum type is sufficient (mirroring the same design
//! note for `constraints`, see `SPEC_FULL.md` §4.2/§9).

pub mod array;
pub mod graph;
pub mod integer;
pub mod none;
pub mod string;
pub mod tuple;
pub mod variant;

pub use array::ArrayVariable;
pub use graph::GraphVariable;
pub use integer::IntegerVariable;
pub use none::NoneVariable;
pub use string::StringVariable;
pub use tuple::TupleVariable;
pub use variant::VariantVariable;

use std::collections::BTreeSet;

use crate::error::SpecimenError;
use crate::resolver::Resolver;
use crate::value::Value;

/// A declared variable: a kind tag plus its constraints (and, for compound
/// kinds, child variable templates).
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    /// A signed 64-bit integer.
    Integer(IntegerVariable),
    /// A string.
    String(StringVariable),
    /// A homogeneous array of a single element kind.
    Array(Box<ArrayVariable>),
    /// A heterogeneous, fixed-arity tuple.
    Tuple(Box<TupleVariable>),
    /// A tagged alternative among a fixed set of kinds.
    Variant(Box<VariantVariable>),
    /// An undirected graph.
    Graph(GraphVariable),
    /// The inert unit placeholder.
    None(NoneVariable),
}

impl Variable {
    /// The kind name, for error messages and `MVariableTypeMismatch`.
    pub fn typename(&self) -> &'static str {
        match self {
            Variable::Integer(_) => "Integer",
            Variable::String(_) => "String",
            Variable::Array(_) => "Array",
            Variable::Tuple(_) => "Tuple",
            Variable::Variant(_) => "Variant",
            Variable::Graph(_) => "Graph",
            Variable::None(_) => "None",
        }
    }

    /// Identifiers this variable (or any of its children) references.
    pub fn dependencies(&self) -> BTreeSet<String> {
        match self {
            Variable::Integer(v) => v.dependencies(),
            Variable::String(v) => v.dependencies(),
            Variable::Array(v) => v.dependencies(),
            Variable::Tuple(v) => v.dependencies(),
            Variable::Variant(v) => v.dependencies(),
            Variable::Graph(v) => v.dependencies(),
            Variable::None(v) => v.dependencies(),
        }
    }

    /// Generates a value for the variable declared under `name`.
    pub fn generate(&self, name: &str, resolver: &mut Resolver) -> Result<Value, SpecimenError> {
        match self {
            Variable::Integer(v) => v.generate(name, resolver),
            Variable::String(v) => v.generate(name, resolver),
            Variable::Array(v) => v.generate(name, resolver),
            Variable::Tuple(v) => v.generate(name, resolver),
            Variable::Variant(v) => v.generate(name, resolver),
            Variable::Graph(v) => v.generate(name, resolver),
            Variable::None(v) => v.generate(name, resolver),
        }
    }

    /// Validates `value` against this variable's declared constraints.
    /// `name` is used only for diagnostic messages.
    pub fn validate(&self, name: &str, value: &Value, resolver: &Resolver) -> Result<(), SpecimenError> {
        match self {
            Variable::Integer(v) => v.validate(value, resolver),
            Variable::String(v) => v.validate(value, resolver),
            Variable::Array(v) => v.validate(value, resolver),
            Variable::Tuple(v) => v.validate(value, resolver),
            Variable::Variant(v) => v.validate(value, resolver),
            Variable::Graph(v) => v.validate(value, resolver),
            Variable::None(v) => v.validate(value),
        }
        .map_err(|e| match e {
            SpecimenError::ValidationError(msg) => {
                SpecimenError::ValidationError(format!("'{name}' {msg}"))
            }
            other => other,
        })
    }

    /// A small curated set of boundary values for this variable's kind.
    pub fn list_edge_cases(&self) -> Vec<Value> {
        match self {
            Variable::Integer(v) => v.list_edge_cases(),
            Variable::String(v) => v.list_edge_cases(),
            Variable::Array(v) => v.list_edge_cases(),
            Variable::Tuple(v) => v.list_edge_cases(),
            Variable::Variant(v) => v.list_edge_cases(),
            Variable::Graph(v) => v.list_edge_cases(),
            Variable::None(v) => v.list_edge_cases(),
        }
    }

    /// Merges `other`'s constraints onto a clone of `self`. Both must be the
    /// same kind.
    ///
    /// # Errors
    /// [`SpecimenError::MVariableTypeMismatch`] if `self` and `other` are
    /// different kinds.
    pub fn merge(&self, other: &Variable) -> Result<Variable, SpecimenError> {
        match (self, other) {
            (Variable::Integer(a), Variable::Integer(b)) => Ok(Variable::Integer(a.merge(b))),
            (Variable::String(a), Variable::String(b)) => Ok(Variable::String(a.merge(b))),
            (Variable::Array(a), Variable::Array(b)) => Ok(Variable::Array(Box::new(a.merge(b)))),
            (Variable::Tuple(a), Variable::Tuple(b)) => Ok(Variable::Tuple(Box::new(a.merge(b)))),
            (Variable::Variant(a), Variable::Variant(b)) => {
                Ok(Variable::Variant(Box::new(a.merge(b))))
            }
            (Variable::Graph(a), Variable::Graph(b)) => Ok(Variable::Graph(a.merge(b))),
            (Variable::None(a), Variable::None(_)) => Ok(Variable::None(*a)),
            (a, b) => Err(SpecimenError::MVariableTypeMismatch {
                from: b.typename().to_string(),
                to: a.typename().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::integer::IntegerConstraint;
    use crate::expr::Expr;

    #[test]
    fn merge_requires_matching_kind() {
        let a = Variable::Integer(IntegerVariable::new());
        let b = Variable::String(StringVariable::new());
        assert!(a.merge(&b).is_err());
    }

    #[test]
    fn merge_concatenates_same_kind_constraints() {
        let a = Variable::Integer(
            IntegerVariable::new().with(IntegerConstraint::AtLeast(Expr::parse("0").unwrap())),
        );
        let b = Variable::Integer(
            IntegerVariable::new().with(IntegerConstraint::AtMost(Expr::parse("10").unwrap())),
        );
        let merged = a.merge(&b).unwrap();
        if let Variable::Integer(v) = merged {
            assert_eq!(v.constraints().len(), 2);
        } else {
            panic!("expected Integer");
        }
    }
}
