//! Final-state predicates and the evidence screenshot.
//!
//! Every predicate failure carries the predicate and the observed value, not
//! a bare boolean. The screenshot is written whether the predicates held or
//! not, so failing runs still leave visual evidence.

use crate::config::Config;
use crate::{Error, Result};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Rendered size of the barcode surface.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SurfaceBox {
    pub width: f64,
    pub height: f64,
}

/// Evaluate the fixed set of final-state predicates. Returns the painted
/// surface size for positive scenarios so callers can compare it across
/// repeated runs of an unchanged app.
pub async fn assert_state(page: &Page, config: &Config) -> Result<Option<SurfaceBox>> {
    let contract = &config.page;
    let scenario = &config.scenario;

    if let Some(ref option) = scenario.expect_option {
        assert_option_present(page, &contract.state_select, option).await?;
    }

    let error_text = visible_text(page, &contract.error_box).await?;
    check_error_text(&error_text, scenario.expect_error.as_deref())?;

    // A painted surface is only asserted for positive scenarios; when an
    // error is expected the app deliberately leaves the barcode blank.
    if scenario.expect_error.is_none() {
        let surface = surface_box(page, &contract.barcode_canvas).await?;
        check_dimensions(&contract.barcode_canvas, surface)?;
        return Ok(Some(surface));
    }

    Ok(None)
}

/// Write the evidence screenshot. Called unconditionally after assertions,
/// pass or fail; the path is fixed and overwritten each run.
pub async fn capture_evidence(page: &Page, path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(true)
        .build();
    let data = page.screenshot(params).await?;
    std::fs::write(path, data)?;
    println!("Screenshot taken: {}", path);
    Ok(())
}

/// Text content of an element, empty when the element is hidden. The app
/// hides the error box instead of clearing it, so display matters.
async fn visible_text(page: &Page, selector: &str) -> Result<String> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return JSON.stringify(null);
            const style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden') {{
                return JSON.stringify('');
            }}
            return JSON.stringify((el.textContent || '').trim());
        }})()"#,
        sel = serde_json::to_string(selector).unwrap()
    );
    let raw: String = page.evaluate(js).await?.into_value()?;
    let text: Option<String> = serde_json::from_str(&raw)?;
    text.ok_or_else(|| {
        Error::AssertionFailed(format!("error region {} not present in DOM", selector))
    })
}

async fn surface_box(page: &Page, selector: &str) -> Result<SurfaceBox> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return JSON.stringify(null);
            const rect = el.getBoundingClientRect();
            return JSON.stringify({{ width: rect.width, height: rect.height }});
        }})()"#,
        sel = serde_json::to_string(selector).unwrap()
    );
    let raw: String = page.evaluate(js).await?.into_value()?;
    let rect: Option<SurfaceBox> = serde_json::from_str(&raw)?;
    rect.ok_or_else(|| {
        Error::AssertionFailed(format!("rendering surface {} not present in DOM", selector))
    })
}

async fn assert_option_present(page: &Page, selector: &str, option: &str) -> Result<()> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el || !el.options) return false;
            return Array.from(el.options).some(o => o.value === {val} || o.text === {val});
        }})()"#,
        sel = serde_json::to_string(selector).unwrap(),
        val = serde_json::to_string(option).unwrap()
    );
    let present: bool = page.evaluate(js).await?.into_value()?;
    debug!("option '{}' present in {}: {}", option, selector, present);
    if present {
        Ok(())
    } else {
        Err(Error::AssertionFailed(format!(
            "option '{}' expected among choices of {}, not found",
            option, selector
        )))
    }
}

/// Error-box predicate: empty for valid workflows, matching the expected
/// message for negative ones.
fn check_error_text(observed: &str, expected: Option<&str>) -> Result<()> {
    match expected {
        None => {
            if observed.is_empty() {
                Ok(())
            } else {
                Err(Error::AssertionFailed(format!(
                    "error region expected empty, observed '{}'",
                    observed
                )))
            }
        }
        Some(expected) => {
            if observed.contains(expected) {
                Ok(())
            } else {
                Err(Error::AssertionFailed(format!(
                    "error region expected to contain '{}', observed '{}'",
                    expected, observed
                )))
            }
        }
    }
}

/// Paint predicate: strictly positive bounding box in both dimensions. This
/// proves content was painted, not that the pixels decode correctly.
fn check_dimensions(selector: &str, surface: SurfaceBox) -> Result<()> {
    if surface.width > 0.0 && surface.height > 0.0 {
        Ok(())
    } else {
        Err(Error::AssertionFailed(format!(
            "rendering surface {} expected positive dimensions, observed {}x{}",
            selector, surface.width, surface.height
        )))
    }
}
