//! # apphook-core
//!
//! Core library for functional UI tests of mobile apps driven through an
//! Appium-style WebDriver server.
//!
//! The crate manages the lifecycle of a remote automation session, exposes
//! screens to tests as page objects, and captures a screenshot whenever a
//! test fails.
//!
//! ## Modules
//!
//! - [`driver`] - Backend-agnostic connector, session and element traits
//! - [`webdriver`] - W3C WebDriver HTTP client implementing those traits
//! - [`capabilities`] - Capability descriptors sent on session creation
//! - [`locator`] - Logical element names and selector parsing
//! - [`session`] - Opening and closing sessions
//! - [`page`] / [`main_page`] - Page objects over a session
//! - [`context`] - The per-suite context handed to each test
//! - [`hooks`] - Suite and per-test lifecycle with failure capture
//! - [`artifact`] - Screenshot files on disk
//! - [`outcome`] - Test and hook outcomes
//! - [`runner`] - Ordered, timeout-bounded suite execution
//! - [`config`] - Persistent harness configuration
//!
//! ## External Dependencies
//!
//! A running automation server (e.g. `appium --port 4723`) with a device or
//! emulator attached.
//!
//! ## Example
//!
//! ```no_run
//! use apphook_core::capabilities::CapabilityDescriptor;
//! use apphook_core::config::HarnessConfig;
//! use apphook_core::hooks::HookEngine;
//! use apphook_core::session::SessionManager;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::load();
//! let mut hooks = HookEngine::from_config(SessionManager::webdriver()?, &config);
//!
//! let ctx = hooks
//!     .suite_start("smoke", &config.endpoint, &CapabilityDescriptor::default())
//!     .await?;
//! ctx.main_page().set_amount("100").await?;
//!
//! hooks.suite_end().await;
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod capabilities;
pub mod config;
pub mod context;
pub mod driver;
pub mod hooks;
pub mod locator;
pub mod main_page;
pub mod outcome;
pub mod page;
pub mod runner;
pub mod session;
pub mod webdriver;
