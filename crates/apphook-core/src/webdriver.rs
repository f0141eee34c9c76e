//! W3C WebDriver client for Appium-style automation servers.
//!
//! This module provides the HTTP/JSON transport behind the driver traits:
//!
//! - [`WebDriverConnector`] creates sessions (`POST /session`)
//! - [`WebDriverSession`] implements [`RemoteDriver`]
//! - [`WebDriverElement`] implements [`ElementHandle`]
//!
//! Every command is a JSON request whose reply wraps its payload in a
//! `value` member. Error replies carry `value.error` (a W3C error code) and
//! `value.message`; legacy JSON Wire Protocol servers use a numeric `status`
//! instead. Both are mapped onto [`DriverError`].
//!
//! # Example
//!
//! ```no_run
//! use apphook_core::capabilities::CapabilityDescriptor;
//! use apphook_core::driver::{Connector, Endpoint, RemoteDriver};
//! use apphook_core::locator::Selector;
//! use apphook_core::webdriver::WebDriverConnector;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = WebDriverConnector::new()?;
//! let driver = connector
//!     .connect(&Endpoint::default(), &CapabilityDescriptor::default())
//!     .await?;
//!
//! let field = driver.find_element(&Selector::parse("id:editTextAmount")).await?;
//! field.set_value("100").await?;
//! driver.delete_session().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, debug_span, trace, Instrument};

use crate::capabilities::CapabilityDescriptor;
use crate::driver::{Connector, DriverError, ElementHandle, Endpoint, RemoteDriver};
use crate::locator::Selector;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Timeout for establishing a TCP connection to the server.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for session creation. Installing and launching an app on an
/// emulator routinely takes minutes.
const NEW_SESSION_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for every other command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// W3C web element identifier key.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// JSON Wire Protocol element identifier key.
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// HTTP plumbing shared by sessions and elements. `base` is the URL every
/// command path is appended to.
#[derive(Clone)]
struct Transport {
    http: reqwest::Client,
    base: String,
}

impl Transport {
    fn child(&self, path: &str) -> Self {
        Self {
            http: self.http.clone(),
            base: format!("{}{}", self.base, path),
        }
    }

    async fn get(&self, path: &str) -> Result<Value, DriverError> {
        self.command(Method::GET, path, None, COMMAND_TIMEOUT).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, DriverError> {
        self.command(Method::POST, path, Some(body), COMMAND_TIMEOUT).await
    }

    async fn delete(&self, path: &str) -> Result<Value, DriverError> {
        self.command(Method::DELETE, path, None, COMMAND_TIMEOUT).await
    }

    /// Send one command and return the unwrapped `value` payload.
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        timeout: Duration,
    ) -> Result<Value, DriverError> {
        let url = format!("{}{}", self.base, path);
        let span = debug_span!("webdriver", method = %method, url = %url);
        async {
            let mut request = self.http.request(method, &url).timeout(timeout);
            if let Some(body) = body {
                request = request.json(&body);
            }

            let response = request.send().await.map_err(transport_error)?;
            let status = response.status();
            let text = response.text().await.map_err(transport_error)?;
            trace!(%status, bytes = text.len(), "response received");

            let mut payload: Value = if text.trim().is_empty() {
                Value::Null
            } else {
                serde_json::from_str(&text)
                    .map_err(|e| DriverError::InvalidResponse(format!("HTTP {}: {}", status, e)))?
            };

            if let Some(err) = protocol_error(status, &payload) {
                debug!(error = %err, "command failed");
                return Err(err);
            }
            normalize_legacy_session(&mut payload);
            Ok(payload.get("value").cloned().unwrap_or(Value::Null))
        }
        .instrument(span)
        .await
    }
}

fn transport_error(err: reqwest::Error) -> DriverError {
    if err.is_timeout() {
        DriverError::Timeout
    } else if err.is_connect() {
        DriverError::ConnectionFailed(err.to_string())
    } else {
        DriverError::CommandFailed(err.to_string())
    }
}

/// Extracts an error from a reply, if it is one.
fn protocol_error(status: StatusCode, payload: &Value) -> Option<DriverError> {
    let value = payload.get("value");
    let message = value
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if let Some(code) = value.and_then(|v| v.get("error")).and_then(Value::as_str) {
        return Some(match code {
            "no such element" => DriverError::NoSuchElement(message),
            "invalid session id" => DriverError::SessionClosed,
            "session not created" => DriverError::SessionNotCreated(message),
            "timeout" | "script timeout" => DriverError::Timeout,
            other => DriverError::CommandFailed(format!("{}: {}", other, message)),
        });
    }

    // JSON Wire Protocol status codes.
    if let Some(code) = payload.get("status").and_then(Value::as_i64) {
        return match code {
            0 => None,
            6 => Some(DriverError::SessionClosed),
            7 => Some(DriverError::NoSuchElement(message)),
            33 => Some(DriverError::SessionNotCreated(message)),
            other => Some(DriverError::CommandFailed(format!("status {}: {}", other, message))),
        };
    }

    if !status.is_success() {
        return Some(DriverError::CommandFailed(format!("HTTP {}", status)));
    }
    None
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Opens WebDriver sessions over HTTP.
#[derive(Clone)]
pub struct WebDriverConnector {
    http: reqwest::Client,
}

impl WebDriverConnector {
    pub fn new() -> Result<Self, DriverError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| DriverError::ConnectionFailed(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Connector for WebDriverConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        capabilities: &CapabilityDescriptor,
    ) -> Result<Box<dyn RemoteDriver>, DriverError> {
        let root = Transport {
            http: self.http.clone(),
            base: endpoint.base_url(),
        };
        let body = json!({
            "capabilities": {
                "alwaysMatch": capabilities.to_json(),
                "firstMatch": [{}],
            }
        });

        debug!(%endpoint, "creating session");
        let reply = root
            .command(Method::POST, "/session", Some(body), NEW_SESSION_TIMEOUT)
            .await
            .map_err(|e| match e {
                DriverError::CommandFailed(msg) | DriverError::InvalidResponse(msg) => {
                    DriverError::SessionNotCreated(msg)
                }
                other => other,
            })?;

        let session_id = reply
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::InvalidResponse("new session reply has no sessionId".into()))?
            .to_string();

        debug!(%session_id, "session created");
        Ok(Box::new(WebDriverSession {
            transport: root.child(&format!("/session/{}", session_id)),
            session_id,
            app_package: capabilities.app_package().map(str::to_string),
        }))
    }
}

/// Legacy servers put `sessionId` next to `value` instead of inside it.
/// Callers only ever see the unwrapped `value`, so lift it there.
fn normalize_legacy_session(payload: &mut Value) {
    if let Some(id) = payload.get("sessionId").cloned() {
        if let Some(value) = payload.get_mut("value").and_then(Value::as_object_mut) {
            value.entry("sessionId").or_insert(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One live WebDriver session.
pub struct WebDriverSession {
    transport: Transport,
    session_id: String,
    app_package: Option<String>,
}

impl WebDriverSession {
    async fn execute(&self, script: &str, args: Value) -> Result<Value, DriverError> {
        self.transport
            .post("/execute/sync", json!({ "script": script, "args": [args] }))
            .await
    }
}

#[async_trait]
impl RemoteDriver for WebDriverSession {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn find_element(&self, selector: &Selector) -> Result<Box<dyn ElementHandle>, DriverError> {
        let reply = self
            .transport
            .post("/element", json!({ "using": selector.using, "value": selector.value }))
            .await?;

        let element_id = reply
            .get(ELEMENT_KEY)
            .or_else(|| reply.get(LEGACY_ELEMENT_KEY))
            .and_then(Value::as_str)
            .ok_or_else(|| DriverError::InvalidResponse(format!("no element reference for {}", selector)))?;

        Ok(Box::new(WebDriverElement {
            transport: self.transport.child(&format!("/element/{}", element_id)),
        }))
    }

    async fn screenshot(&self) -> Result<String, DriverError> {
        self.transport
            .get("/screenshot")
            .await?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DriverError::InvalidResponse("screenshot is not a string".into()))
    }

    async fn reset_app(&self) -> Result<(), DriverError> {
        let package = self
            .app_package
            .as_deref()
            .ok_or_else(|| DriverError::Unsupported("app reset needs the appium:appPackage capability".into()))?;
        self.execute("mobile: terminateApp", json!({ "appId": package })).await?;
        self.execute("mobile: activateApp", json!({ "appId": package })).await?;
        Ok(())
    }

    async fn delete_session(&self) -> Result<(), DriverError> {
        self.transport.delete("").await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

pub struct WebDriverElement {
    transport: Transport,
}

#[async_trait]
impl ElementHandle for WebDriverElement {
    async fn is_displayed(&self) -> Result<bool, DriverError> {
        Ok(self.transport.get("/displayed").await?.as_bool().unwrap_or(false))
    }

    async fn text(&self) -> Result<String, DriverError> {
        Ok(self
            .transport
            .get("/text")
            .await?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        let value = self.transport.get(&format!("/attribute/{}", name)).await?;
        Ok(match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    async fn clear(&self) -> Result<(), DriverError> {
        self.transport.post("/clear", json!({})).await?;
        Ok(())
    }

    async fn set_value(&self, value: &str) -> Result<(), DriverError> {
        let chars: Vec<String> = value.chars().map(String::from).collect();
        self.transport
            .post("/value", json!({ "text": value, "value": chars }))
            .await?;
        Ok(())
    }
}
