//! Test and hook outcomes.
//!
//! A test's pass/fail state is derived after it finishes from an
//! [`OutcomeSignal`]. The runner reports its authoritative verdict; the
//! assertion-counter form exists for callers that only have
//! `assertions made / assertions satisfied` to go on.

use serde::{Deserialize, Serialize};

/// Final state of one test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    Passed,
    Failed,
}

impl TestOutcome {
    pub fn is_failed(self) -> bool {
        self == TestOutcome::Failed
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestOutcome::Passed => f.write_str("passed"),
            TestOutcome::Failed => f.write_str("failed"),
        }
    }
}

/// Assertion bookkeeping for one test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionCounters {
    /// Number of assertions evaluated.
    pub assertion_calls: usize,
    /// Number of those that held.
    pub passing_asserts: usize,
}

impl AssertionCounters {
    /// A test has failed iff some recorded assertion did not hold.
    pub fn has_failures(&self) -> bool {
        self.passing_asserts < self.assertion_calls
    }
}

/// What the after-each hook learns about a finished test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeSignal {
    /// The runner's own verdict.
    Reported(TestOutcome),
    /// Only assertion counters are available.
    Counters(AssertionCounters),
}

impl OutcomeSignal {
    pub fn classify(self) -> TestOutcome {
        match self {
            OutcomeSignal::Reported(outcome) => outcome,
            OutcomeSignal::Counters(counters) if counters.has_failures() => TestOutcome::Failed,
            OutcomeSignal::Counters(_) => TestOutcome::Passed,
        }
    }
}

/// Result of an advisory step (reset, close, screenshot capture).
///
/// Advisory failures never propagate; they are reported here so callers can
/// see what happened without the run being affected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Ok,
    Warning(String),
}

impl HookOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, HookOutcome::Ok)
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            HookOutcome::Ok => None,
            HookOutcome::Warning(msg) => Some(msg),
        }
    }
}
