//! Runs the mobile UI sample suite against an Appium server.
//!
//! # Usage
//!
//! ```bash
//! # Run the suite against a local Appium server
//! apphook run
//!
//! # Point at another server and capability file
//! apphook --host 10.0.0.5 --port 4724 --capabilities pixel.json run
//!
//! # Print the JSON report instead of the summary
//! apphook run --json
//!
//! # Show the capabilities a session would be created with
//! apphook capabilities
//!
//! # Show, or persist, the effective configuration
//! apphook config
//! apphook --reset-app config --save
//! apphook --no-reset-app run
//! ```

mod error;
mod suites;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use apphook_core::capabilities::CapabilityDescriptor;
use apphook_core::config::{logs_dir, HarnessConfig};
use apphook_core::hooks::HookEngine;
use apphook_core::outcome::TestOutcome;
use apphook_core::runner::SuiteReport;
use apphook_core::session::SessionManager;

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "apphook")]
#[command(about = "Functional UI tests for mobile apps over an Appium server")]
#[command(version)]
struct Cli {
    /// Automation server host
    #[arg(long, global = true, env = "APPHOOK_HOST")]
    host: Option<String>,

    /// Automation server port
    #[arg(long, global = true, env = "APPHOOK_PORT")]
    port: Option<u16>,

    /// WebDriver base path (`/wd/hub` for Appium 1)
    #[arg(long, global = true, env = "APPHOOK_PATH")]
    path: Option<String>,

    /// JSON capability file
    #[arg(short, long, global = true, env = "APPHOOK_CAPABILITIES")]
    capabilities: Option<PathBuf>,

    /// Directory for failure screenshots
    #[arg(short, long, global = true, env = "APPHOOK_ARTIFACTS")]
    artifacts_dir: Option<PathBuf>,

    /// Overall timeout per test in milliseconds
    #[arg(long, global = true)]
    test_timeout_ms: Option<u64>,

    /// Element visibility timeout in milliseconds
    #[arg(long, global = true)]
    wait_timeout_ms: Option<u64>,

    /// Terminate and relaunch the app before every test
    #[arg(long, global = true, overrides_with = "no_reset_app")]
    reset_app: bool,

    /// Leave the app running between tests, even if the config enables reset
    #[arg(long, global = true, overrides_with = "reset_app")]
    no_reset_app: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the sample suite
    Run {
        /// Print the suite report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the capabilities sessions are created with
    Capabilities,

    /// Print the effective configuration
    Config {
        /// Persist it to ~/.apphook/config.json
        #[arg(long)]
        save: bool,
    },
}

impl Cli {
    /// The stored configuration with command-line overrides applied.
    fn effective_config(&self) -> HarnessConfig {
        let mut config = HarnessConfig::load();
        if let Some(host) = &self.host {
            config.endpoint.host = host.clone();
        }
        if let Some(port) = self.port {
            config.endpoint.port = port;
        }
        if let Some(path) = &self.path {
            config.endpoint.path = path.clone();
        }
        if let Some(file) = &self.capabilities {
            config.capabilities_file = Some(file.clone());
        }
        if let Some(dir) = &self.artifacts_dir {
            config.artifacts_dir = dir.clone();
        }
        if let Some(ms) = self.test_timeout_ms {
            config.test_timeout_ms = ms;
        }
        if let Some(ms) = self.wait_timeout_ms {
            config.wait_timeout_ms = ms;
        }
        if self.reset_app {
            config.reset_app = true;
        }
        if self.no_reset_app {
            config.reset_app = false;
        }
        config
    }
}

fn load_capabilities(config: &HarnessConfig) -> Result<CapabilityDescriptor, CliError> {
    match &config.capabilities_file {
        Some(path) => Ok(CapabilityDescriptor::load(path)?),
        None => Ok(CapabilityDescriptor::default()),
    }
}

fn init_logging() {
    let file_appender = tracing_appender::rolling::never(logs_dir(), "apphook.log");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr.and(file_appender))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.effective_config();

    match cli.command {
        Command::Run { json } => run_suite(&config, json).await,
        Command::Capabilities => {
            let capabilities = load_capabilities(&config)?;
            print_json(&capabilities.to_json())
        }
        Command::Config { save } => {
            if save {
                let path = config.save()?;
                eprintln!("Saved to {}", path.display());
            }
            print_json(&config)
        }
    }
}

async fn run_suite(config: &HarnessConfig, json: bool) -> Result<(), CliError> {
    let capabilities = load_capabilities(config)?;
    let manager = SessionManager::webdriver()?;
    let mut engine = HookEngine::from_config(manager, config);
    let suite = suites::amount_suite().with_test_timeout(config.test_timeout());

    info!(endpoint = %config.endpoint, suite = suite.name(), "Starting run");
    let report = suite
        .run(&mut engine, &config.endpoint, &capabilities)
        .await
        .inspect_err(|e| error!(error = %e, "Suite setup failed"))?;

    if json {
        print_json(&report)?;
    } else {
        print_summary(&report);
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(CliError::TestsFailed { failed: report.failed(), total: report.tests.len() })
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn print_summary(report: &SuiteReport) {
    println!("Suite: {}", report.suite);
    for test in &report.tests {
        let mark = match test.outcome {
            TestOutcome::Passed => "ok",
            TestOutcome::Failed => "FAILED",
        };
        println!("  {} ... {} ({}ms)", test.name, mark, test.duration_ms);
        if let Some(reason) = &test.failure {
            println!("      {}", reason);
        }
        if let Some(path) = &test.artifact {
            println!("      screenshot: {}", path.display());
        }
        for warning in &test.warnings {
            println!("      warning: {}", warning);
        }
    }
    if let Some(warning) = &report.teardown_warning {
        println!("  warning: {}", warning);
    }
    println!("{} passed, {} failed", report.passed(), report.failed());
}
