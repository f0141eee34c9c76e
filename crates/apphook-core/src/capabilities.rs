//! Capability descriptors for session creation.
//!
//! A [`CapabilityDescriptor`] describes the platform, device and app the
//! session should target. It is sent to the server verbatim as the
//! `alwaysMatch` capabilities of a new-session request, including any keys
//! this crate does not model explicitly.
//!
//! # Example
//!
//! ```
//! use apphook_core::capabilities::CapabilityDescriptor;
//!
//! let caps: CapabilityDescriptor = serde_json::from_str(r#"{
//!     "platformName": "Android",
//!     "appium:automationName": "UiAutomator2",
//!     "appium:appPackage": "com.example.calc"
//! }"#).unwrap();
//!
//! assert_eq!(caps.app_package(), Some("com.example.calc"));
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ConfigError;

const APP_PACKAGE_KEY: &str = "appium:appPackage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    #[serde(rename = "platformName")]
    pub platform_name: String,

    #[serde(rename = "appium:deviceName", default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,

    #[serde(rename = "appium:platformVersion", default, skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,

    #[serde(rename = "appium:automationName", default, skip_serializing_if = "Option::is_none")]
    pub automation_name: Option<String>,

    /// Path or URL of the application binary to install.
    #[serde(rename = "appium:app", default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,

    /// Activity pattern the server waits for after launch (`*` = any).
    #[serde(rename = "appium:appWaitActivity", default, skip_serializing_if = "Option::is_none")]
    pub app_wait_activity: Option<String>,

    #[serde(rename = "appium:autoGrantPermissions", default, skip_serializing_if = "Option::is_none")]
    pub auto_grant_permissions: Option<bool>,

    /// Every other capability, passed through unmodified.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for CapabilityDescriptor {
    /// An Android emulator running UiAutomator2. No app binary is set; the
    /// server attaches to whatever `appium:app` or package the caller adds.
    fn default() -> Self {
        Self {
            platform_name: "Android".to_string(),
            device_name: Some("Android Emulator".to_string()),
            platform_version: Some("16".to_string()),
            automation_name: Some("UiAutomator2".to_string()),
            app: None,
            app_wait_activity: Some("*".to_string()),
            auto_grant_permissions: Some(true),
            extra: Map::new(),
        }
    }
}

impl CapabilityDescriptor {
    /// Reads a descriptor from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The descriptor as the JSON object sent on the wire.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// The Android package of the app under test, if configured.
    pub fn app_package(&self) -> Option<&str> {
        self.extra.get(APP_PACKAGE_KEY).and_then(Value::as_str)
    }
}
