//! Logical element names and the selectors they resolve to.
//!
//! Screens declare their elements once as a static slice of [`Locator`]s.
//! A [`LocatorRegistry`] built from that slice resolves a logical name such
//! as `amount-field` to a [`Selector`] in the remote protocol's addressing
//! scheme.
//!
//! # Selector syntax
//!
//! | Input                      | Strategy                 |
//! |----------------------------|--------------------------|
//! | `id:editTextAmount`        | `id`                     |
//! | `accessibility id:Submit`  | `accessibility id`       |
//! | `~Submit`                  | `accessibility id`       |
//! | `//android.widget.Button`  | `xpath`                  |
//! | `android=new UiSelector()` | `-android uiautomator`   |
//! | anything else              | `css selector`           |

use std::collections::HashMap;

use thiserror::Error;

/// Strategies accepted in the explicit `<strategy>:<value>` form.
const STRATEGIES: &[&str] = &[
    "id",
    "xpath",
    "name",
    "css selector",
    "class name",
    "tag name",
    "link text",
    "partial link text",
    "accessibility id",
    "-android uiautomator",
    "-android datamatcher",
    "-android viewtag",
    "-ios predicate string",
    "-ios class chain",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("Unknown locator '{0}'")]
    UnknownLocator(String),
}

/// A protocol-level element selector: a strategy plus its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    /// The lookup strategy (`using` in the WebDriver protocol).
    pub using: String,
    /// The strategy argument.
    pub value: String,
}

impl Selector {
    pub fn new(using: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            using: using.into(),
            value: value.into(),
        }
    }

    /// Parses a selector string. Never fails: unrecognised input is treated
    /// as a CSS selector.
    pub fn parse(raw: &str) -> Self {
        if let Some((prefix, rest)) = raw.split_once(':') {
            if STRATEGIES.contains(&prefix) {
                return Self::new(prefix, rest);
            }
        }
        if let Some(rest) = raw.strip_prefix('~') {
            return Self::new("accessibility id", rest);
        }
        if let Some(rest) = raw.strip_prefix("android=") {
            return Self::new("-android uiautomator", rest);
        }
        if raw.starts_with('/') || raw.starts_with('(') {
            return Self::new("xpath", raw);
        }
        Self::new("css selector", raw)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.using, self.value)
    }
}

/// A logical element name paired with its selector string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub name: &'static str,
    pub selector: &'static str,
}

impl Locator {
    pub const fn new(name: &'static str, selector: &'static str) -> Self {
        Self { name, selector }
    }
}

/// Name → selector lookup for one screen.
#[derive(Debug, Clone, Default)]
pub struct LocatorRegistry {
    entries: HashMap<&'static str, Selector>,
}

impl LocatorRegistry {
    /// Builds a registry from a screen's declared locators. A later entry
    /// with the same name replaces an earlier one.
    pub fn new(locators: &[Locator]) -> Self {
        let entries = locators
            .iter()
            .map(|l| (l.name, Selector::parse(l.selector)))
            .collect();
        Self { entries }
    }

    pub fn resolve(&self, name: &str) -> Result<&Selector, LocatorError> {
        self.entries
            .get(name)
            .ok_or_else(|| LocatorError::UnknownLocator(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
