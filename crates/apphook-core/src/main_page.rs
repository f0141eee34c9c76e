//! The calculator's main screen.

use std::sync::Arc;
use std::time::Duration;

use crate::driver::ElementHandle;
use crate::locator::Locator;
use crate::page::{PageError, PageObject};
use crate::session::Session;

/// Logical name of the amount input.
pub const AMOUNT_FIELD: &str = "amount-field";

pub const MAIN_PAGE_LOCATORS: &[Locator] = &[Locator::new(AMOUNT_FIELD, "id:editTextAmount")];

#[derive(Debug)]
pub struct MainPage {
    page: PageObject,
}

impl MainPage {
    pub fn new(session: &Arc<Session>) -> Self {
        Self {
            page: PageObject::new(session, MAIN_PAGE_LOCATORS),
        }
    }

    pub fn with_wait_timeout(self, timeout: Duration) -> Self {
        Self {
            page: self.page.with_wait_timeout(timeout),
        }
    }

    /// The generic page object, for operations on any registered element.
    pub fn page(&self) -> &PageObject {
        &self.page
    }

    pub async fn wait_for_amount(&self, timeout: Option<Duration>) -> Result<Box<dyn ElementHandle>, PageError> {
        self.page.wait_visible(AMOUNT_FIELD, timeout).await
    }

    pub async fn set_amount(&self, value: &str) -> Result<(), PageError> {
        self.page.set_value(AMOUNT_FIELD, value).await
    }

    pub async fn get_amount(&self) -> Result<String, PageError> {
        self.page.get_value(AMOUNT_FIELD).await
    }
}
