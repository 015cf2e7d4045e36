//! The generation handler: a stack of in-progress generation frames, cycle
//! detection, retry accounting, and rollback-set computation.
//!
//! One frame exists per distinct variable name ever started. Frames persist
//! across retries so failure counts accumulate; only the currently active
//! frames form a stack, mirroring the call chain of nested `generate_impl`s.

use crate::error::{GenerationError, RetryPolicy, SpecimenError};

/// Default per-frame active-retry ceiling before a generation aborts.
pub const MAX_ACTIVE_PER_VARIABLE: u32 = 1000;
/// Default lifetime-retry ceiling per variable name.
pub const MAX_TOTAL_PER_VARIABLE: u32 = 100_000;
/// Default global ceiling on total successful `complete()` calls.
pub const MAX_TOTAL_GENERATE_CALLS: u64 = 10_000_000;

#[derive(Debug, Clone, Default)]
struct Frame {
    name: String,
    active_retries: u32,
    total_retries: u32,
    count_at_start: Option<usize>,
    last_failure: Option<String>,
}

/// Tracks generation frames, the completed-generation order, and retry
/// budgets. See `SPEC_FULL.md` §4.6.
#[derive(Debug, Default)]
pub struct GenerationHandler {
    frames: Vec<Frame>,
    index_of: std::collections::HashMap<String, usize>,
    completed_order: Vec<String>,
    stack: Vec<usize>,
    max_active_per_variable: u32,
    max_total_per_variable: u32,
    max_total_generate_calls: u64,
    total_generate_calls: u64,
}

impl GenerationHandler {
    /// A handler using the default retry budgets.
    pub fn new() -> Self {
        Self {
            max_active_per_variable: MAX_ACTIVE_PER_VARIABLE,
            max_total_per_variable: MAX_TOTAL_PER_VARIABLE,
            max_total_generate_calls: MAX_TOTAL_GENERATE_CALLS,
            ..Default::default()
        }
    }

    /// A handler with explicit retry budgets, for tests that want to exercise
    /// cap behavior without looping millions of times.
    pub fn with_budgets(active: u32, total: u32, calls: u64) -> Self {
        Self {
            max_active_per_variable: active,
            max_total_per_variable: total,
            max_total_generate_calls: calls,
            ..Default::default()
        }
    }

    fn frame_index(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index_of.get(name) {
            return idx;
        }
        let idx = self.frames.len();
        self.frames.push(Frame {
            name: name.to_string(),
            ..Default::default()
        });
        self.index_of.insert(name.to_string(), idx);
        idx
    }

    /// Starts (or resumes retrying) generation of `name`.
    ///
    /// # Errors
    /// Returns [`GenerationError`] if `name` is already active higher up the
    /// stack (a dependency cycle).
    pub fn start(&mut self, name: &str) -> Result<(), GenerationError> {
        let idx = self.frame_index(name);
        if self.frames[idx].count_at_start.is_some() {
            return Err(GenerationError {
                name: name.to_string(),
                message: format!("cycle found in generation of '{name}'"),
                policy: RetryPolicy::Abort,
            });
        }
        self.frames[idx].active_retries = 0;
        self.frames[idx].count_at_start = Some(self.completed_order.len());
        self.stack.push(idx);
        Ok(())
    }

    /// Marks the top frame as successfully generated.
    ///
    /// # Errors
    /// Returns an error string if no frame is active.
    pub fn complete(&mut self) -> Result<(), String> {
        let idx = self.stack.pop().ok_or("complete() with no active frame")?;
        let name = self.frames[idx].name.clone();
        self.completed_order.push(name);
        self.frames[idx].count_at_start = None;
        self.frames[idx].active_retries = 0;
        self.total_generate_calls += 1;
        Ok(())
    }

    /// Abandons the top frame without recording it as completed.
    pub fn abandon(&mut self) -> Result<(), String> {
        let idx = self.stack.pop().ok_or("abandon() with no active frame")?;
        self.frames[idx].count_at_start = None;
        Ok(())
    }

    /// Records a failed attempt for the top frame and computes the rollback
    /// set: every name completed since this frame's own `start()`.
    ///
    /// Returns the retry policy and the list of names the resolver must
    /// erase from the value store.
    pub fn report_failure(&mut self, reason: impl Into<String>) -> (RetryPolicy, Vec<String>) {
        let reason = reason.into();
        let &idx = self.stack.last().expect("report_failure() with no active frame");
        let count_at_start = self.frames[idx]
            .count_at_start
            .expect("active frame must have count_at_start set");

        self.frames[idx].last_failure = Some(reason);
        self.frames[idx].active_retries += 1;
        self.frames[idx].total_retries += 1;

        let rollback: Vec<String> = self.completed_order.split_off(count_at_start);

        let policy = if self.frames[idx].active_retries <= self.max_active_per_variable
            && self.frames[idx].total_retries <= self.max_total_per_variable
            && self.total_generate_calls <= self.max_total_generate_calls
        {
            RetryPolicy::Retry
        } else {
            RetryPolicy::Abort
        };

        (policy, rollback)
    }

    /// The last failure reason recorded for `name`.
    ///
    /// # Errors
    /// [`SpecimenError::VariableNotFound`] if no frame exists for `name`.
    pub fn get_failure_reason(&self, name: &str) -> Result<Option<String>, SpecimenError> {
        let idx = self
            .index_of
            .get(name)
            .ok_or_else(|| SpecimenError::VariableNotFound(name.to_string()))?;
        Ok(self.frames[*idx].last_failure.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_generation_completes_in_order() {
        let mut h = GenerationHandler::new();
        h.start("A").unwrap();
        h.start("B").unwrap();
        h.complete().unwrap();
        h.complete().unwrap();
        assert_eq!(h.completed_order, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn restarting_an_active_frame_is_a_cycle() {
        let mut h = GenerationHandler::new();
        h.start("A").unwrap();
        let err = h.start("A").unwrap_err();
        assert!(err.message.contains("cycle"));
    }

    #[test]
    fn failure_rolls_back_names_generated_since_start() {
        let mut h = GenerationHandler::new();
        h.start("A").unwrap();
        h.start("B").unwrap();
        h.complete().unwrap(); // B completes
        let (policy, rollback) = h.report_failure("B was bad");
        assert_eq!(policy, RetryPolicy::Retry);
        assert_eq!(rollback, vec!["B".to_string()]);
        assert!(h.completed_order.is_empty());
    }

    #[test]
    fn exceeding_active_budget_aborts() {
        let mut h = GenerationHandler::with_budgets(2, 1000, 1000);
        h.start("A").unwrap();
        let (p1, _) = h.report_failure("1");
        assert_eq!(p1, RetryPolicy::Retry);
        let (p2, _) = h.report_failure("2");
        assert_eq!(p2, RetryPolicy::Retry);
        let (p3, _) = h.report_failure("3");
        assert_eq!(p3, RetryPolicy::Abort);
    }

    #[test]
    fn unknown_name_failure_reason_errors() {
        let h = GenerationHandler::new();
        assert!(h.get_failure_reason("ghost").is_err());
    }
}
