//! Error types for `specimen`.
//!
//! Every fallible boundary in this crate returns a typed error carrying
//! structured fields (variable names, source positions, constraint
//! descriptions) rather than a bare string. Call sites that don't care which
//! category of failure occurred can convert into [`SpecimenError`] with `?`;
//! call sites that do care can match on the specific error type before that
//! conversion happens.
//!
//! # Error Categories
//!
//! - [`EvalError`]: errors constructing or evaluating an arithmetic expression
//! - [`PatternError`]: errors compiling, matching, or generating a simple pattern
//! - [`GenerationError`]: a variable failed to produce a satisfying value
//! - [`IoError`]: a parse or write failure against a textual stream
//! - [`SpecimenError`]: the union of all of the above plus the remaining
//!   cross-cutting failures (unresolved names, impossible constraints, type
//!   mismatches, configuration mistakes)

use crate::span::Position;
use thiserror::Error;

/// Whether a failed generation attempt should be retried or aborted.
///
/// Returned by [`crate::handler::GenerationHandler::report_failure`] and
/// carried on [`SpecimenError::Generation`] so callers can distinguish a
/// recoverable attempt from one that has exhausted its retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// The caller may retry generation of the same variable.
    Retry,
    /// Retry budgets are exhausted (or the failure is not retryable); abort.
    Abort,
}

/// Errors raised while constructing or evaluating an [`crate::expr::Expr`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The expression text failed to parse.
    #[error("invalid expression '{text}': {message}")]
    InvalidExpression {
        /// The offending expression source text.
        text: String,
        /// Human-readable parse failure description.
        message: String,
    },

    /// A referenced identifier has no known value in the current environment.
    #[error("variable '{name}' not found while evaluating expression")]
    VariableNotFound {
        /// The unresolved identifier.
        name: String,
    },

    /// Evaluation failed: overflow, division/modulo by zero, or an unknown
    /// function name.
    #[error("evaluation error: {message}")]
    EvaluationError {
        /// Human-readable description of the failure.
        message: String,
    },
}

/// Errors raised while compiling, matching, or generating from a
/// [`crate::pattern::SimplePattern`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatternError {
    /// The pattern text is not a legal simple pattern.
    #[error("invalid pattern '{text}': {message}")]
    InvalidPattern {
        /// The offending pattern source text.
        text: String,
        /// Human-readable parse failure description.
        message: String,
    },

    /// Generation failed: an unbounded quantifier was asked to generate, a
    /// bound expression failed to evaluate, or the alphabet/class
    /// intersection was empty.
    #[error("pattern evaluation error: {message}")]
    EvaluationError {
        /// Human-readable description of the failure.
        message: String,
    },
}

impl From<EvalError> for PatternError {
    fn from(err: EvalError) -> Self {
        PatternError::EvaluationError {
            message: err.to_string(),
        }
    }
}

/// A variable failed to generate a satisfying value.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("generation of '{name}' failed: {message} ({policy:?})")]
pub struct GenerationError {
    /// The variable that failed to generate.
    pub name: String,
    /// Human-readable failure description.
    pub message: String,
    /// Whether the caller should retry or abort.
    pub policy: RetryPolicy,
}

/// A parse or write failure against a textual stream.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("I/O error at {position}: {message}{}", format_recently_read(.recently_read))]
pub struct IoError {
    /// Cursor position at the time of failure.
    pub position: Position,
    /// Human-readable description of the failure.
    pub message: String,
    /// A small ring buffer of the most recently read tokens, for context.
    pub recently_read: Vec<String>,
}

fn format_recently_read(tokens: &[String]) -> String {
    if tokens.is_empty() {
        String::new()
    } else {
        format!(" (recently read: {})", tokens.join(", "))
    }
}

impl IoError {
    /// Builds an [`IoError`] with no recently-read context.
    pub fn new(position: Position, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
            recently_read: Vec::new(),
        }
    }

    /// Builds an [`IoError`] carrying the given recently-read tokens.
    pub fn with_context(
        position: Position,
        message: impl Into<String>,
        recently_read: Vec<String>,
    ) -> Self {
        Self {
            position,
            message: message.into(),
            recently_read,
        }
    }
}

/// The union of every failure this crate can produce.
///
/// Intermediate code should prefer the narrower error types above and only
/// convert into `SpecimenError` (via `?` / `From`) at the boundary where the
/// distinction no longer matters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecimenError {
    /// A value was requested for a name with no resolved value.
    #[error("value for '{0}' not found")]
    ValueNotFound(String),

    /// A variable declaration was requested for an unknown name.
    #[error("variable '{0}' not found")]
    VariableNotFound(String),

    /// A stored value did not match the kind expected for its variable.
    #[error("value for '{name}' cannot be used as {expected_type}")]
    ValueTypeMismatch {
        /// The variable name.
        name: String,
        /// The type the caller expected.
        expected_type: String,
    },

    /// Attempted to merge or convert between two incompatible variable kinds.
    #[error("cannot convert {from} to {to}")]
    MVariableTypeMismatch {
        /// The kind being converted from.
        from: String,
        /// The kind being converted to.
        to: String,
    },

    /// Merging two constraints (or variables) produced an empty option set.
    #[error("impossible to satisfy both {left} and {right}")]
    ImpossibleToSatisfy {
        /// Description of the first operand.
        left: String,
        /// Description of the second operand.
        right: String,
    },

    /// A variable failed to generate a satisfying value.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// A parse or write failure against a textual stream.
    #[error(transparent)]
    Io(#[from] IoError),

    /// An error raised while evaluating an expression.
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// An error raised while compiling, matching, or generating a pattern.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// A programmer error: an operation was requested that the site does not
    /// support (e.g. `read` on a `None` variable).
    #[error("configuration error at {site}: {message}")]
    ConfigurationError {
        /// Where the misconfiguration was detected.
        site: String,
        /// Human-readable description.
        message: String,
    },

    /// A post-generation validation pass failed.
    #[error("validation failed: {0}")]
    ValidationError(String),
}

impl SpecimenError {
    /// Convenience constructor for [`SpecimenError::ConfigurationError`].
    pub fn configuration(site: impl Into<String>, message: impl Into<String>) -> Self {
        SpecimenError::ConfigurationError {
            site: site.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_error_display_contains_text() {
        let err = EvalError::InvalidExpression {
            text: "3 +".to_string(),
            message: "unexpected end of input".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 +"));
        assert!(msg.contains("unexpected end of input"));
    }

    #[test]
    fn io_error_includes_recently_read() {
        let err = IoError::with_context(
            Position::start(),
            "unexpected end of file",
            vec!["42".to_string(), "17".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("42, 17"));
    }

    #[test]
    fn generation_error_round_trips_through_specimen_error() {
        let gen_err = GenerationError {
            name: "A".to_string(),
            message: "range is empty".to_string(),
            policy: RetryPolicy::Abort,
        };
        let wrapped: SpecimenError = gen_err.clone().into();
        assert_eq!(wrapped.to_string(), gen_err.to_string());
    }
}
