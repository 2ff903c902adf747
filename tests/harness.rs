//! End-to-end runs against file:// fixtures that implement the app's DOM
//! contract. These launch a real headless Chromium, so they are ignored by
//! default; run with `cargo test -- --ignored` on a machine with Chromium.

use aamva_verify::{Config, FieldValue, Harness};
use std::path::PathBuf;

fn fixture_url(name: &str) -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = PathBuf::from(manifest_dir)
        .join("tests")
        .join("fixtures")
        .join(name);
    format!("file://{}", path.display())
}

fn evidence_path(name: &str) -> String {
    std::env::temp_dir()
        .join(format!("aamva_verify_{}_{}.png", name, std::process::id()))
        .display()
        .to_string()
}

fn fixture_config(fixture: &str, evidence: &str) -> Config {
    let mut config = Config::default();
    config.target.url = Some(fixture_url(fixture));
    config.evidence_path = evidence_path(evidence);
    config.timeouts.ready_ms = 5_000;
    config.timeouts.cascade_ms = 3_000;
    config.timeouts.settle_ms = 300;
    config.timeouts.poll_ms = 50;
    config
}

#[tokio::test]
#[ignore = "requires a local Chromium install"]
async fn valid_workflow_paints_barcode_and_leaves_no_error() {
    let mut config = fixture_config("app.html", "valid");
    config.scenario.jurisdiction = "NY".into();
    config.scenario.version = "09".into();
    config.scenario.fields = vec![FieldValue {
        code: "DCS".into(),
        value: "TESTNAME".into(),
    }];

    let report = Harness::run(&config).await.expect("session should run");
    assert!(report.passed, "failure: {:?}", report.failure);
    assert_eq!(report.steps_applied, 3);
    assert!(report.surface.is_some());
    let evidence = report.evidence.expect("evidence should be written");
    assert!(std::fs::metadata(&evidence).unwrap().len() > 0);
    let _ = std::fs::remove_file(&evidence);
}

#[tokio::test]
#[ignore = "requires a local Chromium install"]
async fn two_field_workflow_passes_for_second_jurisdiction() {
    let mut config = fixture_config("app.html", "two_fields");
    config.scenario.jurisdiction = "CA".into();
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

    let report = Harness::run(&config).await.expect("session should run");
    assert!(report.passed, "failure: {:?}", report.failure);
    assert_eq!(report.steps_applied, 4);
    if let Some(evidence) = report.evidence {
        let _ = std::fs::remove_file(evidence);
    }
}

#[tokio::test]
#[ignore = "requires a local Chromium install"]
async fn repeated_runs_report_stable_surface_dimensions() {
    let mut config = fixture_config("app.html", "repeat");
    config.scenario.jurisdiction = "NY".into();
    config.scenario.fields = vec![FieldValue {
        code: "DCS".into(),
        value: "TESTNAME".into(),
    }];

    let first = Harness::run(&config).await.expect("session should run");
    assert!(first.passed, "failure: {:?}", first.failure);
    let second = Harness::run(&config).await.expect("session should run");
    assert!(second.passed, "failure: {:?}", second.failure);

    // The app is unchanged between runs, so the painted surface is too.
    let first_surface = first.surface.expect("surface measured on pass");
    let second_surface = second.surface.expect("surface measured on pass");
    assert_eq!(first_surface, second_surface);

    // Evidence was rewritten in place on the second run.
    let evidence = second.evidence.expect("evidence should be written");
    assert!(std::fs::metadata(&evidence).unwrap().len() > 0);
    let _ = std::fs::remove_file(&evidence);
}

#[tokio::test]
#[ignore = "requires a local Chromium install"]
async fn unsupported_version_aborts_with_partial_step_count() {
    let mut config = fixture_config("app.html", "bad_version");
    // The fixture's cascade never offers "08"; the second select must fail.
    config.scenario.version = "08".into();

    let report = Harness::run(&config).await.expect("session should run");
    assert!(!report.passed);
    assert_eq!(report.steps_applied, 1);
    let failure = report.failure.expect("failure should be reported");
    assert!(failure.contains("option '08'"), "got: {}", failure);
    if let Some(evidence) = report.evidence {
        let _ = std::fs::remove_file(evidence);
    }
}

#[tokio::test]
#[ignore = "requires a local Chromium install"]
async fn omitted_required_field_reports_error() {
    let mut config = fixture_config("app.html", "negative");
    config.scenario.fields.clear();
    config.scenario.expect_error = Some("Missing required field".into());

    let report = Harness::run(&config).await.expect("session should run");
    assert!(report.passed, "failure: {:?}", report.failure);
    assert_eq!(report.steps_applied, 2);
    if let Some(evidence) = report.evidence {
        let _ = std::fs::remove_file(evidence);
    }
}

#[tokio::test]
#[ignore = "requires a local Chromium install"]
async fn readiness_gate_times_out_without_dataset() {
    let mut config = fixture_config("bare.html", "bare");
    config.timeouts.ready_ms = 1_500;

    let report = Harness::run(&config).await.expect("session should run");
    assert!(!report.passed);
    assert_eq!(report.steps_applied, 0);
    let failure = report.failure.expect("timeout should be reported");
    assert!(failure.contains("timeout"), "got: {}", failure);
    // Evidence is still attempted on failing runs.
    if let Some(evidence) = report.evidence {
        let _ = std::fs::remove_file(evidence);
    }
}

#[tokio::test]
#[ignore = "requires a local Chromium install"]
async fn unreachable_target_fails_before_any_step() {
    let mut config = fixture_config("app.html", "unreachable");
    config.target.url = Some("http://127.0.0.1:9/index.html".into());
    config.timeouts.ready_ms = 2_000;

    let report = Harness::run(&config).await.expect("session should run");
    assert!(!report.passed);
    assert_eq!(report.steps_applied, 0);
    assert!(report.failure.is_some());
}
