//! The ordered user-interaction sequence.
//!
//! Steps are applied strictly in order: the jurisdiction selection triggers
//! the app's own cascade that repopulates the version selector, the version
//! determines which identity fields exist, and field input triggers the live
//! barcode re-render. A missing or disabled control aborts the whole run —
//! there is no partial-success outcome.

use super::gate;
use crate::config::Config;
use crate::{Error, Result};
use chromiumoxide::Page;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// One user action against a stable control identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Set a `<select>` to the option with the given value and fire `change`.
    Select { selector: String, value: String },
    /// Set an input's text and fire `input` (the app's live-update trigger).
    Fill { selector: String, value: String },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Select { selector, value } => write!(f, "select {} = '{}'", selector, value),
            Step::Fill { selector, value } => write!(f, "fill {} = '{}'", selector, value),
        }
    }
}

/// The identity-field steps of a scenario. The two selections are issued
/// separately because the cascade wait sits between them.
pub fn field_steps(config: &Config) -> Vec<Step> {
    config
        .scenario
        .fields
        .iter()
        .map(|field| Step::Fill {
            selector: field.selector(),
            value: field.value.clone(),
        })
        .collect()
}

/// Run the scenario's workflow. Returns the number of steps applied; on
/// failure the error carries the count applied before the abort, so failure
/// reports say how far the run got.
pub async fn run(page: &Page, config: &Config) -> std::result::Result<usize, (Error, usize)> {
    let scenario = &config.scenario;
    let contract = &config.page;
    let poll = Duration::from_millis(config.timeouts.poll_ms);
    let mut applied = 0;

    // Jurisdiction first; the app reacts by repopulating the version list.
    apply(
        page,
        &Step::Select {
            selector: contract.state_select.clone(),
            value: scenario.jurisdiction.clone(),
        },
    )
    .await
    .map_err(|e| (e, applied))?;
    applied += 1;
    println!("Selected {}", scenario.jurisdiction);

    // The cascade has no completion callback; observe its effect instead.
    let version_select = contract.version_select.clone();
    gate::poll_until(
        &format!("version cascade ({} populated)", contract.version_select),
        Duration::from_millis(config.timeouts.cascade_ms),
        poll,
        move || {
            let version_select = version_select.clone();
            async move { Ok(gate::option_count(page, &version_select).await? > 0) }
        },
    )
    .await
    .map_err(|e| (e, applied))?;

    apply(
        page,
        &Step::Select {
            selector: contract.version_select.clone(),
            value: scenario.version.clone(),
        },
    )
    .await
    .map_err(|e| (e, applied))?;
    applied += 1;
    println!("Selected Version {}", scenario.version);

    for step in field_steps(config) {
        apply(page, &step).await.map_err(|e| (e, applied))?;
        applied += 1;
        if let Step::Fill { selector, .. } = &step {
            println!("Filled {}", selector.trim_start_matches('#'));
        }
    }

    // Field input triggers the barcode re-render with no done signal; give
    // the page a bounded moment before asserting on the result.
    gate::settle(Duration::from_millis(config.timeouts.settle_ms)).await;

    Ok(applied)
}

/// Apply a single step after verifying its target is present and enabled.
pub async fn apply(page: &Page, step: &Step) -> Result<()> {
    debug!("{}", step);
    match step {
        Step::Select { selector, value } => {
            ensure_interactable(page, selector).await?;
            select_option(page, selector, value).await
        }
        Step::Fill { selector, value } => {
            ensure_interactable(page, selector).await?;
            fill_input(page, selector, value).await
        }
    }
}

async fn ensure_interactable(page: &Page, selector: &str) -> Result<()> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return 'missing';
            if (el.disabled) return 'disabled';
            return 'ok';
        }})()"#,
        sel = serde_json::to_string(selector).unwrap()
    );
    let state: String = page.evaluate(js).await?.into_value()?;
    match state.as_str() {
        "ok" => Ok(()),
        "missing" => Err(Error::ElementNotReady(format!("{} not found", selector))),
        _ => Err(Error::ElementNotReady(format!("{} is disabled", selector))),
    }
}

async fn select_option(page: &Page, selector: &str, value: &str) -> Result<()> {
    let js = format!(
        r#"(() => {{
            const sel = document.querySelector({sel});
            if (!sel) return 'element_not_found';
            const opt = Array.from(sel.options).find(o => o.value === {val} || o.text === {val});
            if (!opt) return 'option_not_found';
            sel.value = opt.value;
            sel.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return 'ok';
        }})()"#,
        sel = serde_json::to_string(selector).unwrap(),
        val = serde_json::to_string(value).unwrap()
    );
    let result: String = page.evaluate(js).await?.into_value()?;
    match result.as_str() {
        "ok" => Ok(()),
        "element_not_found" => Err(Error::ElementNotReady(format!("{} not found", selector))),
        "option_not_found" => Err(Error::ElementNotReady(format!(
            "option '{}' not present in {}",
            value, selector
        ))),
        other => Err(Error::ElementNotReady(format!(
            "select on {} failed: {}",
            selector, other
        ))),
    }
}

async fn fill_input(page: &Page, selector: &str, value: &str) -> Result<()> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return 'element_not_found';
            el.value = {val};
            el.dispatchEvent(new Event('input', {{ bubbles: true }}));
            return 'ok';
        }})()"#,
        sel = serde_json::to_string(selector).unwrap(),
        val = serde_json::to_string(value).unwrap()
    );
    let result: String = page.evaluate(js).await?.into_value()?;
    match result.as_str() {
        "ok" => Ok(()),
        _ => Err(Error::ElementNotReady(format!("{} not found", selector))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FieldValue};

    #[test]
    fn test_field_steps_preserve_order() {
        let mut config = Config::default();
        config.scenario.fields = vec![
            FieldValue {
                code: "DCS".into(),
                value: "DOE".into(),
            },
            FieldValue {
                code: "DAC".into(),
                value: "JOHN".into(),
            },
        ];
        let steps = field_steps(&config);
        assert_eq!(
            steps,
            vec![
                Step::Fill {
                    selector: "#DCS".into(),
                    value: "DOE".into(),
                },
                Step::Fill {
                    selector: "#DAC".into(),
                    value: "JOHN".into(),
                },
            ]
        );
    }

    #[test]
    fn test_no_field_steps_for_negative_scenario() {
        let mut config = Config::default();
        config.scenario.fields.clear();
        assert!(field_steps(&config).is_empty());
    }

    #[test]
    fn test_step_display() {
        let step = Step::Select {
            selector: "#stateSelect".into(),
            value: "NY".into(),
        };
        assert_eq!(step.to_string(), "select #stateSelect = 'NY'");

        let step = Step::Fill {
            selector: "#DCS".into(),
            value: "TESTNAME".into(),
        };
        assert_eq!(step.to_string(), "fill #DCS = 'TESTNAME'");
    }
}
