//! Suite and per-test lifecycle hooks.
//!
//! [`HookEngine`] owns the session for one suite and runs the setup and
//! teardown steps around each test. Per test it moves through
//!
//! ```text
//! Idle --before_each--> Running --after_each--> Passed | Failed --> Idle
//! ```
//!
//! where the return to `Idle` happens at the next `before_each` or at
//! `suite_end`.
//!
//! Only [`suite_start`](HookEngine::suite_start) can fail a run: if no
//! session can be opened the suite is aborted. Everything else (app reset,
//! failure screenshots, closing the session) is advisory and reported as a
//! [`HookOutcome`] instead of an error.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};

use crate::artifact::ArtifactSink;
use crate::capabilities::CapabilityDescriptor;
use crate::config::{HarnessConfig, DEFAULT_WAIT_TIMEOUT_MS};
use crate::context::TestContext;
use crate::driver::Endpoint;
use crate::main_page::MainPage;
use crate::outcome::{HookOutcome, OutcomeSignal, TestOutcome};
use crate::session::{SessionError, SessionManager};

/// Where the current test is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    Idle,
    Running,
    Passed,
    Failed,
}

#[derive(Error, Debug)]
pub enum HookError {
    #[error("cannot run {event} while the current test is {from:?}")]
    InvalidTransition { from: TestPhase, event: &'static str },

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// What the after-each hook did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AfterEachReport {
    pub outcome: TestOutcome,
    /// Screenshot written for a failed test.
    pub artifact: Option<PathBuf>,
    /// Warning from screenshot capture, if any.
    pub hook: HookOutcome,
}

pub struct HookEngine {
    manager: SessionManager,
    artifacts: ArtifactSink,
    reset_app: bool,
    wait_timeout: Duration,
    context: Option<TestContext>,
    phase: TestPhase,
    current_test: Option<String>,
}

impl HookEngine {
    pub fn new(manager: SessionManager, artifacts: ArtifactSink) -> Self {
        Self {
            manager,
            artifacts,
            reset_app: false,
            wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            context: None,
            phase: TestPhase::Idle,
            current_test: None,
        }
    }

    pub fn from_config(manager: SessionManager, config: &HarnessConfig) -> Self {
        Self::new(manager, ArtifactSink::new(&config.artifacts_dir))
            .with_reset_app(config.reset_app)
            .with_wait_timeout(config.wait_timeout())
    }

    /// Terminate and relaunch the app before every test.
    pub fn with_reset_app(mut self, reset_app: bool) -> Self {
        self.reset_app = reset_app;
        self
    }

    /// Default visibility timeout for the page objects this engine builds.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn phase(&self) -> TestPhase {
        self.phase
    }

    /// The published context, while a suite is running.
    pub fn context(&self) -> Option<&TestContext> {
        self.context.as_ref()
    }

    pub fn artifacts(&self) -> &ArtifactSink {
        &self.artifacts
    }

    /// Opens a session and publishes a fresh [`TestContext`].
    ///
    /// Any context left from a previous suite is closed and replaced first,
    /// so at most one session is ever live.
    pub async fn suite_start(
        &mut self,
        suite: &str,
        endpoint: &Endpoint,
        capabilities: &CapabilityDescriptor,
    ) -> Result<&TestContext, HookError> {
        if self.phase == TestPhase::Running {
            return Err(HookError::InvalidTransition { from: self.phase, event: "suite_start" });
        }

        if let Some(stale) = self.context.take() {
            warn!(suite = stale.suite(), "Replacing context left by a previous suite");
            self.manager.close(Some(stale.session().as_ref())).await;
        }
        self.phase = TestPhase::Idle;
        self.current_test = None;

        let session = self.manager.open(endpoint, capabilities).await?;
        let main_page = MainPage::new(&session).with_wait_timeout(self.wait_timeout);
        info!(suite, session_id = %session.id, "Suite started");
        Ok(&*self.context.insert(TestContext::new(suite, session, main_page)))
    }

    /// Idle → Running. Resets the app if configured; a failed reset is
    /// reported as a warning and the test still runs.
    pub async fn before_each(&mut self, test: &str) -> Result<HookOutcome, HookError> {
        match self.phase {
            TestPhase::Idle | TestPhase::Passed | TestPhase::Failed => {}
            TestPhase::Running => {
                return Err(HookError::InvalidTransition { from: self.phase, event: "before_each" })
            }
        }
        self.phase = TestPhase::Running;
        self.current_test = Some(test.to_string());

        let Some(context) = &self.context else {
            return Ok(HookOutcome::Ok);
        };

        info!(test, "Resetting app before test...");
        if self.reset_app {
            if let Err(e) = context.session().reset_app().await {
                warn!(test, error = %e, "Failed to reset app");
                return Ok(HookOutcome::Warning(format!("Failed to reset app: {}", e)));
            }
        }
        info!(test, "App reset complete");
        Ok(HookOutcome::Ok)
    }

    /// Running → Passed/Failed. A failed test gets one screenshot attempt.
    pub async fn after_each(&mut self, signal: OutcomeSignal) -> Result<AfterEachReport, HookError> {
        if self.phase != TestPhase::Running {
            return Err(HookError::InvalidTransition { from: self.phase, event: "after_each" });
        }

        let outcome = signal.classify();
        self.phase = match outcome {
            TestOutcome::Passed => TestPhase::Passed,
            TestOutcome::Failed => TestPhase::Failed,
        };
        let test = self.current_test.take().unwrap_or_else(|| "unknown".to_string());

        if outcome == TestOutcome::Passed {
            return Ok(AfterEachReport { outcome, artifact: None, hook: HookOutcome::Ok });
        }

        error!(test = %test, "Test failed");
        let span = info_span!("capture_failure", test = %test);
        let (artifact, hook) = self.capture_screenshot(&test).instrument(span).await;
        Ok(AfterEachReport { outcome, artifact, hook })
    }

    async fn capture_screenshot(&self, test: &str) -> (Option<PathBuf>, HookOutcome) {
        let Some(context) = &self.context else {
            warn!("No session to take a screenshot with");
            return (None, HookOutcome::Warning("Failed to take screenshot: no active session".into()));
        };

        let screenshot = match context.session().screenshot().await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Failed to take screenshot");
                return (None, HookOutcome::Warning(format!("Failed to take screenshot: {}", e)));
            }
        };

        match self.artifacts.write_screenshot(test, &screenshot) {
            Ok(path) => {
                info!(path = %path.display(), "Screenshot saved");
                (Some(path), HookOutcome::Ok)
            }
            Err(e) => {
                warn!(error = %e, "Failed to save screenshot");
                (None, HookOutcome::Warning(format!("Failed to save screenshot: {}", e)))
            }
        }
    }

    /// Closes the session and clears the published context. Never fails and
    /// is safe to call repeatedly or without a prior `suite_start`.
    pub async fn suite_end(&mut self) -> HookOutcome {
        let context = self.context.take();
        self.phase = TestPhase::Idle;
        self.current_test = None;

        let outcome = self
            .manager
            .close(context.as_ref().map(|c| c.session().as_ref()))
            .await;
        if let Some(context) = context {
            info!(suite = context.suite(), "Suite finished");
        }
        outcome
    }
}
