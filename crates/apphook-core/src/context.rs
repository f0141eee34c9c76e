//! The per-suite test context.
//!
//! A [`TestContext`] is built once at suite start from a freshly opened
//! session and handed by reference to every test in that suite. It owns the
//! session; the page object only holds a weak reference to it. When the
//! suite ends the context is dropped, so no later suite can observe it.

use std::sync::Arc;

use crate::main_page::MainPage;
use crate::session::Session;

#[derive(Debug)]
pub struct TestContext {
    session: Arc<Session>,
    main_page: MainPage,
    suite: String,
}

impl TestContext {
    pub fn new(suite: impl Into<String>, session: Arc<Session>, main_page: MainPage) -> Self {
        Self {
            session,
            main_page,
            suite: suite.into(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn main_page(&self) -> &MainPage {
        &self.main_page
    }

    /// Name of the suite this context was built for.
    pub fn suite(&self) -> &str {
        &self.suite
    }
}
