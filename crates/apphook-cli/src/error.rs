use std::process::ExitCode;

use apphook_core::config::ConfigError;
use apphook_core::driver::DriverError;
use apphook_core::hooks::HookError;

#[derive(Debug)]
pub enum CliError {
    /// The suite ran and at least one test failed.
    TestsFailed { failed: usize, total: usize },
    /// No session could be opened, so no test ran.
    Setup(String),
    /// Bad configuration or capability file.
    Config(String),
    /// A result could not be written out.
    Output(String),
}

impl CliError {
    pub fn code(&self) -> u8 {
        match self {
            CliError::TestsFailed { .. } => 1,
            CliError::Setup(_) => 2,
            CliError::Config(_) => 3,
            CliError::Output(_) => 4,
        }
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::TestsFailed { failed, total } => write!(f, "{} of {} tests failed", failed, total),
            CliError::Setup(msg) => write!(f, "Suite setup failed: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Serialize(_) => CliError::Output(e.to_string()),
            _ => CliError::Config(e.to_string()),
        }
    }
}

impl From<HookError> for CliError {
    fn from(e: HookError) -> Self {
        CliError::Setup(e.to_string())
    }
}

impl From<DriverError> for CliError {
    fn from(e: DriverError) -> Self {
        CliError::Setup(e.to_string())
    }
}
