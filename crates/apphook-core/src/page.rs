//! Page objects: screen-level operations over a session.
//!
//! A [`PageObject`] pairs a [`LocatorRegistry`] for one screen with a
//! non-owning reference to the [`Session`] it drives. Tests talk in logical
//! element names ("amount-field"); the page object resolves them, waits for
//! visibility where needed, and reads or writes field content.
//!
//! The page object never closes the session. If the session has been
//! dropped by its owner every operation fails with [`PageError::SessionGone`];
//! if it has been closed, with [`DriverError::SessionClosed`].

use std::sync::{Arc, Weak};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::config::DEFAULT_WAIT_TIMEOUT_MS;
use crate::driver::{DriverError, ElementHandle};
use crate::locator::{Locator, LocatorError, LocatorRegistry};
use crate::session::Session;

/// Interval between visibility polls.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Attributes consulted, in order, when an element has no visible text.
const CONTENT_ATTRIBUTES: &[&str] = &["text", "value"];

#[derive(Error, Debug)]
pub enum PageError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("element '{name}' not visible after {}ms", timeout.as_millis())]
    ElementNotVisible { name: String, timeout: Duration },

    #[error("session is no longer available")]
    SessionGone,

    #[error(transparent)]
    Driver(#[from] DriverError),
}

pub struct PageObject {
    session: Weak<Session>,
    locators: LocatorRegistry,
    wait_timeout: Duration,
}

impl PageObject {
    pub fn new(session: &Arc<Session>, locators: &[Locator]) -> Self {
        Self {
            session: Arc::downgrade(session),
            locators: LocatorRegistry::new(locators),
            wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
        }
    }

    /// Overrides the timeout used when [`wait_visible`](Self::wait_visible)
    /// is called without one.
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn locators(&self) -> &LocatorRegistry {
        &self.locators
    }

    fn session(&self) -> Result<Arc<Session>, PageError> {
        self.session.upgrade().ok_or(PageError::SessionGone)
    }

    /// Resolves `name` and fetches the live element. No waiting.
    pub async fn locate(&self, name: &str) -> Result<Box<dyn ElementHandle>, PageError> {
        let selector = self.locators.resolve(name)?;
        let session = self.session()?;
        Ok(session.find_element(selector).await?)
    }

    /// Polls until `name` is displayed.
    ///
    /// An element that does not exist yet counts as not visible. Fails with
    /// [`PageError::ElementNotVisible`] once `timeout` (default: the page's
    /// wait timeout) has fully elapsed.
    pub async fn wait_visible(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Box<dyn ElementHandle>, PageError> {
        let timeout = timeout.unwrap_or(self.wait_timeout);
        let selector = self.locators.resolve(name)?;
        let session = self.session()?;
        let deadline = Instant::now() + timeout;

        loop {
            match session.find_element(selector).await {
                Ok(element) => match element.is_displayed().await {
                    Ok(true) => return Ok(element),
                    Ok(false) | Err(DriverError::NoSuchElement(_)) => {}
                    Err(e) => return Err(e.into()),
                },
                Err(DriverError::NoSuchElement(_)) => {}
                Err(e) => return Err(e.into()),
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(element = name, timeout_ms = timeout.as_millis() as u64, "wait timed out");
                return Err(PageError::ElementNotVisible {
                    name: name.to_string(),
                    timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Waits for `name`, clears it, then types `value`.
    pub async fn set_value(&self, name: &str, value: &str) -> Result<(), PageError> {
        let element = self.wait_visible(name, None).await?;
        element.clear().await?;
        element.set_value(value).await?;
        debug!(element = name, value, "value set");
        Ok(())
    }

    /// Reads the content of `name` without waiting.
    ///
    /// Widget backends expose field content differently, so this tries the
    /// displayed text, then the `text` attribute, then the `value` attribute.
    /// An element with no content yields an empty string, not an error.
    pub async fn get_value(&self, name: &str) -> Result<String, PageError> {
        let element = self.locate(name).await?;

        let text = element.text().await?;
        if !text.is_empty() {
            return Ok(text);
        }
        for attribute in CONTENT_ATTRIBUTES {
            if let Some(value) = element.attribute(attribute).await? {
                if !value.is_empty() {
                    return Ok(value);
                }
            }
        }
        Ok(String::new())
    }
}

impl std::fmt::Debug for PageObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageObject")
            .field("locators", &self.locators)
            .field("wait_timeout", &self.wait_timeout)
            .field("session_alive", &(self.session.strong_count() > 0))
            .finish()
    }
}
