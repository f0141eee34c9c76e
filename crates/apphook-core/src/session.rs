//! Remote session lifecycle.
//!
//! [`SessionManager`] opens a [`Session`] against an automation server and
//! closes it again. Opening is the one fatal step of a suite: a failure is
//! returned as [`SessionError`] and nothing is retried. Closing is advisory:
//! failures are logged and reported as a [`HookOutcome`] warning, never
//! propagated, and closing twice is a no-op.
//!
//! # Example
//!
//! ```no_run
//! use apphook_core::capabilities::CapabilityDescriptor;
//! use apphook_core::driver::Endpoint;
//! use apphook_core::session::SessionManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = SessionManager::webdriver()?;
//! let session = manager
//!     .open(&Endpoint::default(), &CapabilityDescriptor::default())
//!     .await?;
//!
//! // ... drive the app ...
//!
//! manager.close(Some(&*session)).await;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::capabilities::CapabilityDescriptor;
use crate::driver::{Connector, DriverError, ElementHandle, Endpoint, RemoteDriver};
use crate::locator::Selector;
use crate::outcome::HookOutcome;
use crate::webdriver::WebDriverConnector;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The server was unreachable or rejected the capabilities.
    #[error("failed to create session at {endpoint}: {source}")]
    Creation {
        endpoint: Endpoint,
        #[source]
        source: DriverError,
    },
}

/// A live remote automation session.
///
/// Once closed a session stays closed: every further command fails with
/// [`DriverError::SessionClosed`] and no reconnection is attempted.
pub struct Session {
    /// The server-assigned session identifier.
    pub id: String,

    /// The server this session lives on.
    pub endpoint: Endpoint,

    /// The capabilities the session was created with.
    pub capabilities: CapabilityDescriptor,

    /// When this session was opened.
    pub opened_at: DateTime<Utc>,

    driver: Box<dyn RemoteDriver>,
    closed: AtomicBool,
}

impl Session {
    pub fn new(driver: Box<dyn RemoteDriver>, endpoint: Endpoint, capabilities: CapabilityDescriptor) -> Self {
        Self {
            id: driver.session_id().to_string(),
            endpoint,
            capabilities,
            opened_at: Utc::now(),
            driver,
            closed: AtomicBool::new(false),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.is_closed() {
            Err(DriverError::SessionClosed)
        } else {
            Ok(())
        }
    }

    pub async fn find_element(&self, selector: &Selector) -> Result<Box<dyn ElementHandle>, DriverError> {
        self.ensure_open()?;
        self.driver.find_element(selector).await
    }

    /// Captures the screen as base64-encoded PNG.
    pub async fn screenshot(&self) -> Result<String, DriverError> {
        self.ensure_open()?;
        self.driver.screenshot().await
    }

    pub async fn reset_app(&self) -> Result<(), DriverError> {
        self.ensure_open()?;
        self.driver.reset_app().await
    }

    /// Terminates the session on the server. Only the first call reaches the
    /// server; later calls return `Ok(())`.
    pub async fn close(&self) -> Result<(), DriverError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.driver.delete_session().await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("opened_at", &self.opened_at)
            .field("closed", &self.is_closed())
            .field("driver", &"<dyn RemoteDriver>")
            .finish()
    }
}

/// Opens and closes sessions through a [`Connector`].
#[derive(Clone)]
pub struct SessionManager {
    connector: Arc<dyn Connector>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Convenience constructor using the HTTP [`WebDriverConnector`].
    pub fn webdriver() -> Result<Self, DriverError> {
        Ok(Self::new(Arc::new(WebDriverConnector::new()?)))
    }

    pub async fn open(
        &self,
        endpoint: &Endpoint,
        capabilities: &CapabilityDescriptor,
    ) -> Result<Arc<Session>, SessionError> {
        info!(%endpoint, platform = %capabilities.platform_name, "Opening session");
        let driver = self
            .connector
            .connect(endpoint, capabilities)
            .await
            .map_err(|source| SessionError::Creation {
                endpoint: endpoint.clone(),
                source,
            })?;
        let session = Session::new(driver, endpoint.clone(), capabilities.clone());
        info!(session_id = %session.id, "Session opened");
        Ok(Arc::new(session))
    }

    /// Closes `session` if there is one. Never fails.
    pub async fn close(&self, session: Option<&Session>) -> HookOutcome {
        let Some(session) = session else {
            return HookOutcome::Ok;
        };
        if session.is_closed() {
            return HookOutcome::Ok;
        }
        match session.close().await {
            Ok(()) => {
                info!(session_id = %session.id, "Session closed");
                HookOutcome::Ok
            }
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Failed to close session");
                HookOutcome::Warning(format!("Failed to close session: {}", e))
            }
        }
    }
}
