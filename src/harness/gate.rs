//! Navigation and bounded condition waits.
//!
//! Application readiness latency varies with asset parse time, so fixed
//! sleeps are not used as gates. Everything blocking here is a poll against
//! an explicit deadline; expiry surfaces as `Error::Timeout`, never a hang.

use crate::{Error, Result};
use chromiumoxide::Page;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

/// Drive the page to the target URL. Failures here are session-level: the
/// app was never reached, no workflow step has run yet.
pub async fn navigate(page: &Page, url: &str) -> Result<()> {
    debug!("navigating to {}", url);
    page.goto(url)
        .await
        .map_err(|e| Error::Session(format!("navigation to {}: {}", url, e)))?;
    page.wait_for_navigation()
        .await
        .map_err(|e| Error::Session(format!("navigation to {}: {}", url, e)))?;
    Ok(())
}

/// Poll `probe` every `interval` until it reports true or `timeout` elapses.
pub async fn poll_until<F, Fut>(
    desc: &str,
    timeout: Duration,
    interval: Duration,
    mut probe: F,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if probe().await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(Error::Timeout(format!(
                "{} not satisfied within {}ms",
                desc,
                timeout.as_millis()
            )));
        }
        tokio::time::sleep(interval).await;
    }
}

/// Block until the reference dataset is loaded and the given selector exists
/// with at least one option.
pub async fn await_ready(
    page: &Page,
    dataset_global: &str,
    selector: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    let desc = format!(
        "readiness (window.{} loaded, {} populated)",
        dataset_global, selector
    );
    let global = dataset_global.to_string();
    let sel = selector.to_string();
    poll_until(&desc, timeout, interval, move || {
        let global = global.clone();
        let sel = sel.clone();
        async move {
            let loaded = dataset_size(page, &global).await? > 0;
            let populated = option_count(page, &sel).await? > 0;
            Ok(loaded && populated)
        }
    })
    .await
}

/// Number of options of a `<select>`, or -1 if the element is absent.
pub async fn option_count(page: &Page, selector: &str) -> Result<i64> {
    let js = format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el || !el.options) return -1;
            return el.options.length;
        }})()"#,
        sel = serde_json::to_string(selector).unwrap()
    );
    let count: i64 = page.evaluate(js).await?.into_value()?;
    Ok(count)
}

/// Key count of the globally exposed reference dataset, or -1 if missing.
pub async fn dataset_size(page: &Page, global: &str) -> Result<i64> {
    let js = format!(
        r#"(() => {{
            const data = window[{name}];
            if (!data || typeof data !== 'object') return -1;
            return Object.keys(data).length;
        }})()"#,
        name = serde_json::to_string(global).unwrap()
    );
    let size: i64 = page.evaluate(js).await?.into_value()?;
    Ok(size)
}

/// Best-effort settle after an action with no observable completion signal
/// (the app's live barcode re-render). Not a correctness gate.
pub async fn settle(duration: Duration) {
    debug!("settle wait: {}ms", duration.as_millis());
    tokio::time::sleep(duration).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_poll_until_passes_once_condition_holds() {
        let calls = AtomicU32::new(0);
        let result = poll_until(
            "test condition",
            Duration::from_secs(5),
            Duration::from_millis(1),
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(n >= 3) }
            },
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_poll_until_times_out_with_typed_error() {
        let start = Instant::now();
        let result = poll_until(
            "never true",
            Duration::from_millis(30),
            Duration::from_millis(5),
            || async { Ok(false) },
        )
        .await;
        match result {
            Err(Error::Timeout(msg)) => {
                assert!(msg.contains("never true"));
                assert!(msg.contains("30ms"));
            }
            other => panic!("expected timeout, got {:?}", other.map(|_| ())),
        }
        // Bounded wait, not an indefinite block.
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_poll_until_propagates_probe_errors() {
        let result = poll_until(
            "failing probe",
            Duration::from_secs(5),
            Duration::from_millis(1),
            || async { Err(Error::Session("page context gone".into())) },
        )
        .await;
        match result {
            Err(Error::Session(msg)) => assert!(msg.contains("page context gone")),
            other => panic!("expected session error, got {:?}", other.map(|_| ())),
        }
    }
}
