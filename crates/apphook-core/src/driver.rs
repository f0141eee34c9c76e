//! Automation driver traits for backend-agnostic UI automation.
//!
//! This module defines the narrow interfaces the rest of the crate talks to:
//!
//! - [`Connector`] opens a remote session against an [`Endpoint`]
//! - [`RemoteDriver`] is one live session (element lookup, screenshots,
//!   app reset, termination)
//! - [`ElementHandle`] is one live element on screen
//!
//! The only production implementation is the W3C WebDriver client in
//! [`crate::webdriver`]. Tests substitute in-memory fakes, which keeps the
//! page-object and hook logic independent of the transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::CapabilityDescriptor;
use crate::locator::Selector;

/// Errors that can occur during remote automation operations.
///
/// This enum unifies transport and server-side failures behind a single
/// type, so callers handle errors uniformly regardless of the backend.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The automation server could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The server refused to create a session (e.g. rejected capabilities).
    #[error("Session not created: {0}")]
    SessionNotCreated(String),

    /// The session was closed, locally or by the server.
    #[error("Session is closed")]
    SessionClosed,

    /// No element matched the selector.
    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// A command reached the server but failed.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// The backend does not support the requested operation.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// A request exceeded its timeout.
    #[error("Operation timed out")]
    Timeout,

    /// The server answered with something that is not a valid protocol response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Where the automation server listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    /// Hostname or IP of the automation server.
    pub host: String,
    /// TCP port of the automation server.
    pub port: u16,
    /// Base path of the WebDriver API (`/` for Appium 2, `/wd/hub` for Appium 1).
    pub path: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            path: path.into(),
        }
    }

    /// Returns the HTTP base URL, without a trailing slash.
    pub fn base_url(&self) -> String {
        let path = self.path.trim_matches('/');
        if path.is_empty() {
            format!("http://{}:{}", self.host, self.port)
        } else {
            format!("http://{}:{}/{}", self.host, self.port, path)
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new("localhost", 4723, "/")
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.base_url())
    }
}

/// One live element on screen.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// Whether the element is currently displayed.
    async fn is_displayed(&self) -> Result<bool, DriverError>;

    /// The element's visible text. Empty when the widget exposes none.
    async fn text(&self) -> Result<String, DriverError>;

    /// A named attribute, or `None` if the element does not expose it.
    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError>;

    /// Clear any existing content.
    async fn clear(&self) -> Result<(), DriverError>;

    /// Type `value` into the element.
    async fn set_value(&self, value: &str) -> Result<(), DriverError>;
}

/// A live remote automation session.
#[async_trait]
pub trait RemoteDriver: Send + Sync {
    /// The server-assigned session identifier.
    fn session_id(&self) -> &str;

    /// Look up one element. Fails with [`DriverError::NoSuchElement`] when
    /// nothing matches; no waiting is performed.
    async fn find_element(&self, selector: &Selector) -> Result<Box<dyn ElementHandle>, DriverError>;

    /// Capture the current screen as base64-encoded PNG.
    async fn screenshot(&self) -> Result<String, DriverError>;

    /// Return the app under test to its launch state.
    async fn reset_app(&self) -> Result<(), DriverError>;

    /// Terminate the session on the server.
    async fn delete_session(&self) -> Result<(), DriverError>;
}

/// Opens remote sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        capabilities: &CapabilityDescriptor,
    ) -> Result<Box<dyn RemoteDriver>, DriverError>;
}
