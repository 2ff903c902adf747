//! Passive console/page-error capture.
//!
//! Listeners are registered before navigation so early-lifecycle diagnostics
//! (a missing data file, a startup exception) are not lost. Events are
//! printed as they arrive on the CDP notification channel; the main flow
//! never blocks on them, and nothing here can fail a run.

use crate::session::Session;
use crate::Result;
use chromiumoxide::cdp::js_protocol::runtime::{
    ConsoleApiCalledType, EventConsoleApiCalled, EventExceptionThrown, RemoteObject,
};
use futures::StreamExt;
use std::fmt;
use tokio::task::JoinHandle;

/// Kind of an asynchronously delivered diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    ConsoleLog,
    ConsoleWarning,
    ConsoleError,
    PageError,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiagnosticKind::ConsoleLog => "console-log",
            DiagnosticKind::ConsoleWarning => "console-warning",
            DiagnosticKind::ConsoleError => "console-error",
            DiagnosticKind::PageError => "page-error",
        };
        f.write_str(label)
    }
}

impl From<&ConsoleApiCalledType> for DiagnosticKind {
    fn from(kind: &ConsoleApiCalledType) -> Self {
        match kind {
            ConsoleApiCalledType::Error => DiagnosticKind::ConsoleError,
            ConsoleApiCalledType::Warning => DiagnosticKind::ConsoleWarning,
            _ => DiagnosticKind::ConsoleLog,
        }
    }
}

/// Handles to the two listener tasks. Dropped (and aborted) when the run's
/// session goes away; the streams also end on their own at browser close.
pub struct Diagnostics {
    console_task: JoinHandle<()>,
    error_task: JoinHandle<()>,
}

impl Diagnostics {
    /// Register console and uncaught-exception listeners on the session's
    /// page. Must run before navigation.
    pub async fn attach(session: &Session) -> Result<Self> {
        let mut console_events = session
            .page()
            .event_listener::<EventConsoleApiCalled>()
            .await?;
        let mut error_events = session
            .page()
            .event_listener::<EventExceptionThrown>()
            .await?;

        let console_task = tokio::spawn(async move {
            while let Some(event) = console_events.next().await {
                let kind = DiagnosticKind::from(&event.r#type);
                let text = event
                    .args
                    .iter()
                    .map(remote_object_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{}: {}", kind, text);
            }
        });

        let error_task = tokio::spawn(async move {
            while let Some(event) = error_events.next().await {
                let details = &event.exception_details;
                let text = details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                println!("{}: {}", DiagnosticKind::PageError, text);
            }
        });

        Ok(Self {
            console_task,
            error_task,
        })
    }
}

impl Drop for Diagnostics {
    fn drop(&mut self) {
        self.console_task.abort();
        self.error_task.abort();
    }
}

/// Best-effort text rendering of a console argument. Malformed payloads
/// degrade to a placeholder, never to an error.
fn remote_object_text(obj: &RemoteObject) -> String {
    if let Some(ref value) = obj.value {
        return match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        };
    }
    if let Some(ref description) = obj.description {
        return description.clone();
    }
    "<unserializable>".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(DiagnosticKind::ConsoleLog.to_string(), "console-log");
        assert_eq!(DiagnosticKind::ConsoleError.to_string(), "console-error");
        assert_eq!(DiagnosticKind::PageError.to_string(), "page-error");
    }

    #[test]
    fn test_kind_from_console_type() {
        assert_eq!(
            DiagnosticKind::from(&ConsoleApiCalledType::Error),
            DiagnosticKind::ConsoleError
        );
        assert_eq!(
            DiagnosticKind::from(&ConsoleApiCalledType::Warning),
            DiagnosticKind::ConsoleWarning
        );
        assert_eq!(
            DiagnosticKind::from(&ConsoleApiCalledType::Log),
            DiagnosticKind::ConsoleLog
        );
        assert_eq!(
            DiagnosticKind::from(&ConsoleApiCalledType::Info),
            DiagnosticKind::ConsoleLog
        );
    }

    fn remote_object(json: serde_json::Value) -> RemoteObject {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_remote_object_text_prefers_string_value() {
        let obj = remote_object(serde_json::json!({"type": "string", "value": "hello"}));
        assert_eq!(remote_object_text(&obj), "hello");
    }

    #[test]
    fn test_remote_object_text_renders_non_string_value() {
        let obj = remote_object(serde_json::json!({"type": "number", "value": 42}));
        assert_eq!(remote_object_text(&obj), "42");
    }

    #[test]
    fn test_remote_object_text_falls_back_to_description() {
        let obj = remote_object(serde_json::json!({
            "type": "object",
            "description": "TypeError: x is not a function"
        }));
        assert_eq!(remote_object_text(&obj), "TypeError: x is not a function");
    }
}
