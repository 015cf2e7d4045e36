//! # specimen
//!
//! `specimen` declares typed variables under range/membership/pattern/shape
//! constraints, generates values that satisfy them from a seeded RNG, checks
//! arbitrary values against the same constraints, and reads/writes values in
//! a configurable textual format.
//!
//! ## Quick Start
//!
//! ```rust
//! use specimen::constraints::integer::IntegerConstraint;
//! use specimen::expr::Expr;
//! use specimen::resolver::Resolver;
//! use specimen::rng::Rng;
//! use specimen::variable::{IntegerVariable, Variable};
//!
//! let n = Variable::Integer(
//!     IntegerVariable::new().with(IntegerConstraint::Between(
//!         Expr::parse("1").unwrap(),
//!         Expr::parse("100").unwrap(),
//!     )),
//! );
//!
//! let mut resolver = Resolver::new(Rng::new(&[0u8; 16]).unwrap());
//! resolver.declare("N", n.clone());
//! let value = resolver.generate_variable("N").unwrap();
//! assert!(n.validate("N", &value, &resolver).is_ok());
//! ```
//!
//! ## Core Concepts
//!
//! - **Variable**: a declared kind (`Integer`, `String`, `Array<E>`,
//!   `Tuple<...>`, `Variant<...>`, `Graph`, `None`) plus its constraints
//! - **Constraint**: a per-kind predicate over a candidate value, evaluated
//!   against peer variables through an [`expr::Expr`]
//! - **Resolver**: the mutable context threaded through generation —
//!   the value store, variable store, generation handler, and RNG
//! - **Generation Handler**: cycle detection, retry budgets, and rollback
//!   for dependency-driven generation
//!
//! ## Modules
//!
//! - [`span`]: source positions shared by the expression/pattern parsers and
//!   the I/O cursor
//! - [`error`]: the typed error taxonomy
//! - [`expr`]: the arithmetic expression evaluator
//! - [`pattern`]: the restricted "simple pattern" engine for strings
//! - [`value`]: runtime values and the typed value store
//! - [`constraints`]: per-kind constraint algebras
//! - [`variable`]: the variable kinds built from constraints
//! - [`handler`]: the generation scheduler (cycle detection, retries, rollback)
//! - [`resolver`]: the mutable generation/validation context
//! - [`rng`]: the seeded deterministic random source
//! - [`io`]: textual reading and writing of values

#![doc(html_root_url = "https://docs.rs/specimen/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod constraints;
pub mod error;
pub mod expr;
pub mod handler;
pub mod io;
pub mod pattern;
pub mod resolver;
pub mod rng;
pub mod span;
pub mod value;
pub mod variable;

pub use error::SpecimenError;
pub use resolver::Resolver;
pub use rng::Rng;
pub use value::{Value, ValueStore};
pub use variable::Variable;

/// Generates a value for `name` from a freshly declared `variable`, using a
/// fresh resolver seeded with `seed`.
///
/// This is a convenience entry point for the common case of generating a
/// single, self-contained variable; declarations with peer dependencies
/// should build a [`Resolver`] directly and `declare` every variable first.
///
/// # Errors
/// Whatever [`Resolver::generate_variable`] returns.
///
/// # Example
///
/// ```rust
/// use specimen::constraints::integer::IntegerConstraint;
/// use specimen::expr::Expr;
/// use specimen::variable::{IntegerVariable, Variable};
///
/// let n = Variable::Integer(
///     IntegerVariable::new().with(IntegerConstraint::Between(
///         Expr::parse("1").unwrap(),
///         Expr::parse("6").unwrap(),
///     )),
/// );
/// let value = specimen::generate(&[7u8; 16], "DIE", &n).unwrap();
/// assert!((1..=6).contains(&value.as_integer().unwrap()));
/// ```
pub fn generate(seed: &[u8], name: &str, variable: &Variable) -> Result<Value, SpecimenError> {
    let rng = Rng::new(seed).map_err(|message| SpecimenError::configuration("Rng::new", message))?;
    let mut resolver = Resolver::new(rng);
    resolver.declare(name.to_string(), variable.clone());
    resolver.generate_variable(name)
}

/// Validates `value` against `variable`'s declared constraints, with no
/// peer variables in scope.
///
/// # Errors
/// Whatever [`Variable::validate`] returns.
///
/// # Example
///
/// ```rust
/// use specimen::constraints::integer::IntegerConstraint;
/// use specimen::expr::Expr;
/// use specimen::value::Value;
/// use specimen::variable::{IntegerVariable, Variable};
///
/// let n = Variable::Integer(
///     IntegerVariable::new().with(IntegerConstraint::Between(
///         Expr::parse("1").unwrap(),
///         Expr::parse("6").unwrap(),
///     )),
/// );
/// assert!(specimen::validate("DIE", &n, &Value::Integer(3)).is_ok());
/// assert!(specimen::validate("DIE", &n, &Value::Integer(42)).is_err());
/// ```
pub fn validate(name: &str, variable: &Variable, value: &Value) -> Result<(), SpecimenError> {
    let resolver = Resolver::new(Rng::new(&[0u8; 16]).expect("fixed seed is valid"));
    variable.validate(name, value, &resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::integer::IntegerConstraint;
    use crate::expr::Expr;
    use crate::variable::IntegerVariable;

    #[test]
    fn generate_then_validate_round_trips() {
        let n = Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
            Expr::parse("1").unwrap(),
            Expr::parse("6").unwrap(),
        )));
        let value = generate(&[5u8; 16], "DIE", &n).unwrap();
        assert!(validate("DIE", &n, &value).is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let n = Variable::Integer(IntegerVariable::new().with(IntegerConstraint::Between(
            Expr::parse("1").unwrap(),
            Expr::parse("6").unwrap(),
        )));
        assert!(validate("DIE", &n, &Value::Integer(42)).is_err());
    }
}
