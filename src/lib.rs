//! # aamva-verify
//!
//! Browser-driven verification harness for the AAMVA driver's-license barcode
//! form app. Launches headless Chromium, walks the app through a jurisdiction
//! → version → identity-field workflow, and asserts the page reached an
//! error-free state with a painted barcode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aamva_verify::{Config, Harness};
//!
//! # #[tokio::main]
//! # async fn main() -> aamva_verify::Result<()> {
//! let config = Config::default();
//! let report = Harness::run(&config).await?;
//! println!("Passed: {}", report.passed);
//! # Ok(())
//! # }
//! ```

mod config;
mod diagnostics;
mod harness;
mod session;

pub use config::{
    BrowserConfig, Config, FieldValue, PageContract, Scenario, Target, Timeouts, URL_ENV_VAR,
};
pub use diagnostics::{DiagnosticKind, Diagnostics};
pub use harness::{Harness, RunReport, Step, SurfaceBox};
pub use session::Session;

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or a verification run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session error: {0}")]
    Session(String),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("element not ready: {0}")]
    ElementNotReady(String),

    #[error("assertion failed: {0}")]
    AssertionFailed(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
