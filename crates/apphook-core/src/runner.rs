//! In-process suite runner.
//!
//! A [`Suite`] is an ordered list of named async test bodies. Running it
//! drives the [`HookEngine`] through the full lifecycle: one `suite_start`,
//! `before_each`/`after_each` around every test, one `suite_end`. Tests run
//! strictly one at a time, in declaration order, each under the suite's
//! overall timeout.
//!
//! # Example
//!
//! ```no_run
//! use apphook_core::context::TestContext;
//! use apphook_core::runner::{Expect, Suite, TestFuture};
//!
//! fn amount_round_trip<'a>(ctx: &'a TestContext, expect: &'a mut Expect) -> TestFuture<'a> {
//!     Box::pin(async move {
//!         ctx.main_page().set_amount("100").await?;
//!         let value = ctx.main_page().get_amount().await?;
//!         expect.truthy("amount", &value);
//!         Ok(())
//!     })
//! }
//!
//! let suite = Suite::new("amount").test("set and read amount (100)", amount_round_trip);
//! assert_eq!(suite.len(), 1);
//! ```

use std::fmt::Debug;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, info_span, Instrument};

use crate::capabilities::CapabilityDescriptor;
use crate::config::DEFAULT_TEST_TIMEOUT_MS;
use crate::context::TestContext;
use crate::driver::Endpoint;
use crate::hooks::{HookEngine, HookError};
use crate::outcome::{AssertionCounters, HookOutcome, OutcomeSignal, TestOutcome};
use crate::page::PageError;

/// Errors a test body can return. Any error fails the test.
#[derive(Error, Debug)]
pub enum TestError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error("{0}")]
    Failed(String),
}

pub type TestFuture<'a> = Pin<Box<dyn Future<Output = Result<(), TestError>> + Send + 'a>>;

/// A test body: receives the suite's context and an assertion recorder.
pub type TestFn = for<'a> fn(&'a TestContext, &'a mut Expect) -> TestFuture<'a>;

/// Records assertions for one test.
///
/// Failed assertions do not abort the test; they are counted and the test
/// is classified as failed once it returns.
#[derive(Debug, Default)]
pub struct Expect {
    counters: AssertionCounters,
    failures: Vec<String>,
}

impl Expect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one assertion. Returns whether it held.
    pub fn that(&mut self, condition: bool, message: impl Into<String>) -> bool {
        self.counters.assertion_calls += 1;
        if condition {
            self.counters.passing_asserts += 1;
        } else {
            self.failures.push(message.into());
        }
        condition
    }

    /// Asserts that `value` is non-empty.
    pub fn truthy(&mut self, label: &str, value: &str) -> bool {
        self.that(!value.is_empty(), format!("expected {} to be truthy, got \"\"", label))
    }

    pub fn equal<T: PartialEq + Debug>(&mut self, actual: T, expected: T) -> bool {
        let message = format!("expected {:?}, got {:?}", expected, actual);
        self.that(actual == expected, message)
    }

    pub fn counters(&self) -> AssertionCounters {
        self.counters
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

struct TestCase {
    name: String,
    body: TestFn,
}

/// Result of one test.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub name: String,
    pub outcome: TestOutcome,
    pub counters: AssertionCounters,
    pub duration_ms: u64,
    /// Why the test failed, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Screenshot captured on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    /// Advisory hook warnings raised around this test.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Result of a whole suite.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub tests: Vec<TestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teardown_warning: Option<String>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.outcome == TestOutcome::Passed).count()
    }

    pub fn failed(&self) -> usize {
        self.tests.iter().filter(|t| t.outcome == TestOutcome::Failed).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

pub struct Suite {
    name: String,
    tests: Vec<TestCase>,
    test_timeout: Duration,
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            test_timeout: Duration::from_millis(DEFAULT_TEST_TIMEOUT_MS),
        }
    }

    pub fn with_test_timeout(mut self, timeout: Duration) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Registers a test. Tests run in registration order.
    pub fn test(mut self, name: impl Into<String>, body: TestFn) -> Self {
        self.tests.push(TestCase { name: name.into(), body });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn test_names(&self) -> impl Iterator<Item = &str> {
        self.tests.iter().map(|t| t.name.as_str())
    }

    /// Runs every test against a fresh session.
    ///
    /// Fails only if the session cannot be opened, in which case no test
    /// runs. Test failures are reported in the returned [`SuiteReport`].
    pub async fn run(
        &self,
        engine: &mut HookEngine,
        endpoint: &Endpoint,
        capabilities: &CapabilityDescriptor,
    ) -> Result<SuiteReport, HookError> {
        engine.suite_start(&self.name, endpoint, capabilities).await?;
        info!(suite = %self.name, tests = self.tests.len(), "Running suite");

        let mut tests = Vec::with_capacity(self.tests.len());
        for case in &self.tests {
            let span = info_span!("test", name = %case.name);
            let report = self.run_case(engine, case).instrument(span).await;
            match report {
                Ok(report) => tests.push(report),
                Err(e) => {
                    engine.suite_end().await;
                    return Err(e);
                }
            }
        }

        let teardown = engine.suite_end().await;
        let report = SuiteReport {
            suite: self.name.clone(),
            tests,
            teardown_warning: teardown.warning().map(str::to_string),
        };
        info!(
            suite = %report.suite,
            passed = report.passed(),
            failed = report.failed(),
            "Suite complete"
        );
        Ok(report)
    }

    async fn run_case(&self, engine: &mut HookEngine, case: &TestCase) -> Result<TestReport, HookError> {
        let mut warnings = Vec::new();
        if let HookOutcome::Warning(w) = engine.before_each(&case.name).await? {
            warnings.push(w);
        }

        let start = Instant::now();
        let mut expect = Expect::new();
        let failure = match engine.context() {
            Some(context) => {
                let result = tokio::time::timeout(self.test_timeout, (case.body)(context, &mut expect)).await;
                match result {
                    Err(_) => Some(format!(
                        "test timed out after {}ms",
                        self.test_timeout.as_millis()
                    )),
                    Ok(Err(e)) => Some(e.to_string()),
                    Ok(Ok(())) => None,
                }
            }
            None => Some("no test context published".to_string()),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let counters = expect.counters();
        let failure = failure.or_else(|| {
            if expect.failures().is_empty() {
                None
            } else {
                Some(expect.failures().join("; "))
            }
        });
        let outcome = if failure.is_some() || counters.has_failures() {
            TestOutcome::Failed
        } else {
            TestOutcome::Passed
        };
        if let Some(reason) = &failure {
            error!(reason = %reason, "Test body failed");
        }

        let after = engine.after_each(OutcomeSignal::Reported(outcome)).await?;
        if let HookOutcome::Warning(w) = after.hook {
            warnings.push(w);
        }
        info!(outcome = %after.outcome, duration_ms, "Test finished");

        Ok(TestReport {
            name: case.name.clone(),
            outcome: after.outcome,
            counters,
            duration_ms,
            failure,
            artifact: after.artifact,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_counts_assertions() {
        let mut expect = Expect::new();
        assert!(expect.truthy("amount", "100"));
        assert!(!expect.truthy("amount", ""));
        assert!(expect.equal(2, 2));
        assert!(!expect.equal("a", "b"));

        let counters = expect.counters();
        assert_eq!(counters.assertion_calls, 4);
        assert_eq!(counters.passing_asserts, 2);
        assert!(counters.has_failures());
        assert_eq!(expect.failures().len(), 2);
        assert!(expect.failures()[0].contains("amount"));
        assert!(expect.failures()[1].contains("\"b\""));
    }

    fn noop<'a>(_ctx: &'a TestContext, _expect: &'a mut Expect) -> TestFuture<'a> {
        Box::pin(async { Ok(()) })
    }

    #[test]
    fn suite_keeps_registration_order() {
        let suite = Suite::new("s").test("first", noop).test("second", noop);
        assert_eq!(suite.name(), "s");
        assert_eq!(suite.len(), 2);
        assert!(!suite.is_empty());
        assert_eq!(suite.test_names().collect::<Vec<_>>(), vec!["first", "second"]);
    }

    #[test]
    fn report_counts() {
        let test = |name: &str, outcome| TestReport {
            name: name.to_string(),
            outcome,
            counters: AssertionCounters::default(),
            duration_ms: 0,
            failure: None,
            artifact: None,
            warnings: Vec::new(),
        };
        let report = SuiteReport {
            suite: "s".into(),
            tests: vec![test("a", TestOutcome::Passed), test("b", TestOutcome::Failed)],
            teardown_warning: None,
        };
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
    }
}
