//! Run orchestration: acquire → attach diagnostics → navigate → ready gate →
//! workflow → assertions → evidence → release. Release and the evidence
//! screenshot happen whatever the earlier stages did.

mod gate;
mod verify;
mod workflow;

pub use verify::SurfaceBox;
pub use workflow::Step;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::session::Session;
use crate::{Error, Result};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Outcome of one verification run.
#[derive(Debug)]
pub struct RunReport {
    /// Whether every step and assertion held.
    pub passed: bool,
    /// The failure, when one was raised.
    pub failure: Option<String>,
    /// Number of workflow steps applied before the run ended.
    pub steps_applied: usize,
    /// Rendered size of the barcode surface, for positive scenarios that
    /// passed. Stable across repeated runs of an unchanged app.
    pub surface: Option<SurfaceBox>,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
    /// Evidence screenshot path, when one was written.
    pub evidence: Option<String>,
}

/// The verification harness. One session, one scenario, no retries.
pub struct Harness;

impl Harness {
    /// Run the configured scenario once. Session-level failures (the engine
    /// cannot start or stop) surface as `Err`; workflow and assertion
    /// failures are reported in the `RunReport` after evidence capture and
    /// release have run.
    pub async fn run(config: &Config) -> Result<RunReport> {
        config.validate()?;
        let start = Instant::now();

        let session = Session::acquire(&config.browser).await?;

        // Listeners go on before navigation so startup diagnostics (missing
        // data file, init exception) are not missed.
        let _diagnostics = match Diagnostics::attach(&session).await {
            Ok(d) => d,
            Err(e) => {
                let _ = session.release().await;
                return Err(Error::Session(format!("diagnostics attach: {}", e)));
            }
        };

        let outcome = Self::drive(&session, config).await;

        // Evidence is best-effort and unconditional, so a failing run still
        // leaves something to look at.
        let evidence = match verify::capture_evidence(session.page(), &config.evidence_path).await
        {
            Ok(()) => Some(config.evidence_path.clone()),
            Err(e) => {
                warn!("evidence capture: {}", e);
                None
            }
        };

        session.release().await?;

        let (passed, failure, steps_applied, surface) = match outcome {
            Ok((steps, surface)) => (true, None, steps, surface),
            Err((e, steps)) => (false, Some(e.to_string()), steps, None),
        };

        Ok(RunReport {
            passed,
            failure,
            steps_applied,
            surface,
            duration_ms: start.elapsed().as_millis() as u64,
            evidence,
        })
    }

    /// Navigate, gate on readiness, run the workflow, assert the end state.
    /// Errors carry how many steps were applied before the run aborted.
    async fn drive(
        session: &Session,
        config: &Config,
    ) -> std::result::Result<(usize, Option<SurfaceBox>), (Error, usize)> {
        let page = session.page();
        let url = config.target.url();
        let poll = Duration::from_millis(config.timeouts.poll_ms);

        info!("verifying {}", url);
        gate::navigate(page, &url).await.map_err(|e| (e, 0))?;

        gate::await_ready(
            page,
            &config.page.dataset_global,
            &config.page.state_select,
            Duration::from_millis(config.timeouts.ready_ms),
            poll,
        )
        .await
        .map_err(|e| (e, 0))?;

        let steps = workflow::run(page, config).await?;

        let surface = verify::assert_state(page, config)
            .await
            .map_err(|e| (e, steps))?;

        Ok((steps, surface))
    }
}
