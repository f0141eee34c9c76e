//! Shared test helpers for apphook-core integration tests.
//!
//! Provides an in-memory automation backend whose behavior is scripted per
//! test: which elements exist, when they become visible, what they contain,
//! and which operations fail. Every call is counted so tests can assert on
//! exactly what the hooks and page objects asked for.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use apphook_core::capabilities::CapabilityDescriptor;
use apphook_core::driver::{Connector, DriverError, ElementHandle, Endpoint, RemoteDriver};
use apphook_core::locator::Selector;
use apphook_core::session::SessionManager;

/// 1x1 transparent PNG, base64-encoded.
pub const PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

// ---------------------------------------------------------------------------
// Scripted state
// ---------------------------------------------------------------------------

/// One element on the fake screen, keyed by selector value.
#[derive(Debug, Clone)]
pub struct FakeField {
    pub text: String,
    pub attributes: HashMap<String, String>,
    /// When the element starts reporting displayed; `None` = never.
    pub visible_at: Option<Instant>,
    /// Make `set_value` fail.
    pub reject_input: bool,
    /// Widget renders typed input only through the `value` attribute.
    pub value_only: bool,
}

impl FakeField {
    pub fn visible() -> Self {
        Self {
            text: String::new(),
            attributes: HashMap::new(),
            visible_at: Some(Instant::now()),
            reject_input: false,
            value_only: false,
        }
    }

    pub fn visible_after(delay: Duration) -> Self {
        Self {
            visible_at: Some(Instant::now() + delay),
            ..Self::visible()
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible_at: None,
            ..Self::visible()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub fields: HashMap<String, FakeField>,
    pub fail_screenshot: bool,
    pub screenshot: Option<String>,
    pub fail_reset: bool,
    pub fail_delete: bool,
    pub finds: usize,
    pub screenshots: usize,
    pub resets: usize,
    pub deletes: usize,
}

pub type SharedState = Arc<Mutex<FakeState>>;

pub fn new_state() -> SharedState {
    let state = FakeState {
        screenshot: Some(PNG_B64.to_string()),
        ..FakeState::default()
    };
    Arc::new(Mutex::new(state))
}

/// State with the main screen's amount field present and visible.
pub fn amount_screen() -> SharedState {
    let state = new_state();
    state
        .lock()
        .unwrap()
        .fields
        .insert("editTextAmount".to_string(), FakeField::visible());
    state
}

// ---------------------------------------------------------------------------
// Fake driver
// ---------------------------------------------------------------------------

pub struct FakeElement {
    key: String,
    state: SharedState,
}

impl FakeElement {
    fn with_field<T>(&self, f: impl FnOnce(&mut FakeField) -> T) -> Result<T, DriverError> {
        let mut state = self.state.lock().unwrap();
        state
            .fields
            .get_mut(&self.key)
            .map(f)
            .ok_or_else(|| DriverError::NoSuchElement(format!("stale element {}", self.key)))
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn is_displayed(&self) -> Result<bool, DriverError> {
        let now = Instant::now();
        self.with_field(|f| f.visible_at.map_or(false, |at| at <= now))
    }

    async fn text(&self) -> Result<String, DriverError> {
        self.with_field(|f| f.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        self.with_field(|f| f.attributes.get(name).cloned())
    }

    async fn clear(&self) -> Result<(), DriverError> {
        self.with_field(|f| {
            f.text.clear();
            f.attributes.remove("value");
        })
    }

    async fn set_value(&self, value: &str) -> Result<(), DriverError> {
        self.with_field(|f| {
            if f.reject_input {
                return Err(DriverError::CommandFailed("element not interactable".into()));
            }
            if f.value_only {
                f.attributes.insert("value".to_string(), value.to_string());
            } else {
                f.text = value.to_string();
            }
            Ok(())
        })?
    }
}

pub struct FakeDriver {
    id: String,
    state: SharedState,
}

#[async_trait]
impl RemoteDriver for FakeDriver {
    fn session_id(&self) -> &str {
        &self.id
    }

    async fn find_element(&self, selector: &Selector) -> Result<Box<dyn ElementHandle>, DriverError> {
        let mut state = self.state.lock().unwrap();
        state.finds += 1;
        if state.fields.contains_key(&selector.value) {
            Ok(Box::new(FakeElement {
                key: selector.value.clone(),
                state: self.state.clone(),
            }))
        } else {
            Err(DriverError::NoSuchElement(selector.to_string()))
        }
    }

    async fn screenshot(&self) -> Result<String, DriverError> {
        let mut state = self.state.lock().unwrap();
        state.screenshots += 1;
        if state.fail_screenshot {
            return Err(DriverError::CommandFailed("screenshot unavailable".into()));
        }
        state
            .screenshot
            .clone()
            .ok_or_else(|| DriverError::InvalidResponse("no screenshot".into()))
    }

    async fn reset_app(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.resets += 1;
        if state.fail_reset {
            return Err(DriverError::CommandFailed("cannot terminate app".into()));
        }
        Ok(())
    }

    async fn delete_session(&self) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        state.deletes += 1;
        if state.fail_delete {
            return Err(DriverError::ConnectionFailed("connection reset".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake connector
// ---------------------------------------------------------------------------

pub struct FakeConnector {
    pub state: SharedState,
    pub reject: Option<fn() -> DriverError>,
    pub opened: AtomicUsize,
}

impl FakeConnector {
    pub fn new(state: SharedState) -> Arc<Self> {
        Arc::new(Self {
            state,
            reject: None,
            opened: AtomicUsize::new(0),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            state: new_state(),
            reject: Some(|| DriverError::ConnectionFailed("connection refused".into())),
            opened: AtomicUsize::new(0),
        })
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _endpoint: &Endpoint,
        _capabilities: &CapabilityDescriptor,
    ) -> Result<Box<dyn RemoteDriver>, DriverError> {
        if let Some(reject) = self.reject {
            return Err(reject());
        }
        let n = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Box::new(FakeDriver {
            id: format!("fake-session-{}", n),
            state: self.state.clone(),
        }))
    }
}

pub fn manager(connector: Arc<FakeConnector>) -> SessionManager {
    SessionManager::new(connector)
}

pub fn endpoint() -> Endpoint {
    Endpoint::default()
}

pub fn caps() -> CapabilityDescriptor {
    CapabilityDescriptor::default()
}

/// Files currently in `dir`, sorted by name.
pub fn files_in(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    files.sort();
    files
}
