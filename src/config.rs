//! Harness configuration. Every field has a default so the binary runs with
//! no arguments against a locally served copy of the app.
//!
//! The original verification scripts disagreed about the serving port (8000
//! vs 8080) and the document version ("08" vs "09"); both are plain config
//! values here, defaulting to 8000 and "09".

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides the whole target URL.
pub const URL_ENV_VAR: &str = "AAMVA_VERIFY_URL";

/// Top-level config structure.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where the app is served.
    #[serde(default)]
    pub target: Target,

    /// Browser launch configuration.
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Bounded-wait deadlines.
    #[serde(default)]
    pub timeouts: Timeouts,

    /// DOM contract of the app under test.
    #[serde(default)]
    pub page: PageContract,

    /// The user workflow to drive and the expected outcome.
    #[serde(default)]
    pub scenario: Scenario,

    /// Where the evidence screenshot is written.
    #[serde(default = "default_evidence_path")]
    pub evidence_path: String,
}

fn default_evidence_path() -> String {
    "verification/app_verified.png".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: Target::default(),
            browser: BrowserConfig::default(),
            timeouts: Timeouts::default(),
            page: PageContract::default(),
            scenario: Scenario::default(),
            evidence_path: default_evidence_path(),
        }
    }
}

impl Config {
    /// Load config from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse config from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config.
    pub fn validate(&self) -> Result<()> {
        if self.target.host.is_empty() {
            return Err(Error::Config("target.host must not be empty".into()));
        }
        if self.scenario.jurisdiction.is_empty() {
            return Err(Error::Config(
                "scenario.jurisdiction must not be empty".into(),
            ));
        }
        if self.scenario.version.is_empty() {
            return Err(Error::Config("scenario.version must not be empty".into()));
        }
        for field in &self.scenario.fields {
            if field.code.is_empty() {
                return Err(Error::Config("scenario field code must not be empty".into()));
            }
        }
        if self.timeouts.ready_ms == 0 {
            return Err(Error::Config("timeouts.ready_ms must be at least 1".into()));
        }
        if self.timeouts.cascade_ms == 0 {
            return Err(Error::Config(
                "timeouts.cascade_ms must be at least 1".into(),
            ));
        }
        if self.timeouts.poll_ms == 0 {
            return Err(Error::Config("timeouts.poll_ms must be at least 1".into()));
        }
        if self.evidence_path.is_empty() {
            return Err(Error::Config("evidence_path must not be empty".into()));
        }
        Ok(())
    }
}

/// Where the app under test is served.
///
/// Host and port are opaque operator-supplied values; the harness only joins
/// them into a URL. `url` (or the `AAMVA_VERIFY_URL` env var) bypasses the
/// host/port/path parts entirely.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Target {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_path")]
    pub path: String,

    /// Full URL override.
    #[serde(default)]
    pub url: Option<String>,
}

fn default_host() -> String {
    "localhost".into()
}

fn default_port() -> u16 {
    8000
}

fn default_path() -> String {
    "index.html".into()
}

impl Default for Target {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
            url: None,
        }
    }
}

impl Target {
    /// The URL the harness navigates to.
    pub fn url(&self) -> String {
        if let Ok(url) = std::env::var(URL_ENV_VAR) {
            if !url.is_empty() {
                return url;
            }
        }
        if let Some(ref url) = self.url {
            return url.clone();
        }
        format!("http://{}:{}/{}", self.host, self.port, self.path)
    }
}

/// Browser launch configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrowserConfig {
    /// Run in headless mode.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Viewport size.
    pub viewport: Option<Viewport>,
}

fn default_true() -> bool {
    true
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: None,
        }
    }
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Deadlines for the bounded waits, in milliseconds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Timeouts {
    /// Readiness gate: dataset loaded and jurisdiction selector populated.
    #[serde(default = "default_ready_ms")]
    pub ready_ms: u64,

    /// Version selector repopulation after a jurisdiction change.
    #[serde(default = "default_cascade_ms")]
    pub cascade_ms: u64,

    /// Best-effort settle after live-update inputs (no completion signal).
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Interval between condition probes.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
}

fn default_ready_ms() -> u64 {
    10_000
}

fn default_cascade_ms() -> u64 {
    5_000
}

fn default_settle_ms() -> u64 {
    1_000
}

fn default_poll_ms() -> u64 {
    100
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ready_ms: default_ready_ms(),
            cascade_ms: default_cascade_ms(),
            settle_ms: default_settle_ms(),
            poll_ms: default_poll_ms(),
        }
    }
}

/// DOM contract of the app under test. The app is an external collaborator;
/// these are the stable identifiers it exposes.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageContract {
    /// Jurisdiction selector, populated from the reference dataset.
    #[serde(default = "default_state_select")]
    pub state_select: String,

    /// Version selector, options depend on the selected jurisdiction.
    #[serde(default = "default_version_select")]
    pub version_select: String,

    /// Error-reporting region.
    #[serde(default = "default_error_box")]
    pub error_box: String,

    /// Barcode rendering surface, painted on field input.
    #[serde(default = "default_canvas")]
    pub barcode_canvas: String,

    /// Global holding the reference dataset, keyed by jurisdiction code.
    #[serde(default = "default_dataset_global")]
    pub dataset_global: String,
}

fn default_state_select() -> String {
    "#stateSelect".into()
}

fn default_version_select() -> String {
    "#versionSelect".into()
}

fn default_error_box() -> String {
    "#errorBox".into()
}

fn default_canvas() -> String {
    "#barcodeCanvas".into()
}

fn default_dataset_global() -> String {
    "AAMVA_STATES".into()
}

impl Default for PageContract {
    fn default() -> Self {
        Self {
            state_select: default_state_select(),
            version_select: default_version_select(),
            error_box: default_error_box(),
            barcode_canvas: default_canvas(),
            dataset_global: default_dataset_global(),
        }
    }
}

/// One identity field: AAMVA field code and the value to type into it.
/// The app renders each field as an input whose id is the field code.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FieldValue {
    pub code: String,
    pub value: String,
}

impl FieldValue {
    /// CSS selector for this field's input.
    pub fn selector(&self) -> String {
        format!("#{}", self.code)
    }
}

/// The workflow to drive and the final state expected of the app.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Two-letter jurisdiction code, e.g. "NY".
    #[serde(default = "default_jurisdiction")]
    pub jurisdiction: String,

    /// Document version tag, e.g. "09".
    #[serde(default = "default_version")]
    pub version: String,

    /// Identity fields to fill, in order. Empty for negative scenarios that
    /// exercise the app's required-field validation.
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldValue>,

    /// Expected substring of the error box. `None` asserts the box is empty.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Option expected to be present among the jurisdiction selector's
    /// choices, as proof the reference dataset populated it.
    #[serde(default = "default_expect_option")]
    pub expect_option: Option<String>,
}

fn default_jurisdiction() -> String {
    "NY".into()
}

fn default_version() -> String {
    "09".into()
}

fn default_fields() -> Vec<FieldValue> {
    vec![FieldValue {
        code: "DCS".into(),
        value: "TESTNAME".into(),
    }]
}

fn default_expect_option() -> Option<String> {
    Some("CA".into())
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            jurisdiction: default_jurisdiction(),
            version: default_version(),
            fields: default_fields(),
            expect_error: None,
            expect_option: default_expect_option(),
        }
    }
}
