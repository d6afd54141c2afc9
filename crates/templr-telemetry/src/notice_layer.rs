//! Tracing layer that surfaces alert-level events to the client UI.
//!
//! Warnings and errors logged anywhere in the client (a failed seed, a
//! sign-out the provider rejected) are forwarded over a channel so the UI can
//! show them as notices.

use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// One warning or error as delivered to the UI.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClientNotice {
    /// Module path of the emitting code (e.g. "templr_application::publish")
    pub target: String,
    /// "WARN" or "ERROR"
    pub level: String,
    pub message: String,
    /// Structured fields other than the message
    pub fields: HashMap<String, Value>,
    /// RFC 3339
    pub timestamp: String,
}

/// Forwards WARN and ERROR events to a channel; other levels are ignored.
pub struct NoticeLayer {
    sender: mpsc::UnboundedSender<ClientNotice>,
}

impl NoticeLayer {
    pub fn new(sender: mpsc::UnboundedSender<ClientNotice>) -> Self {
        Self { sender }
    }
}

impl<S> Layer<S> for NoticeLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level > Level::WARN {
            return;
        }

        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        let message = match fields.remove("message") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let notice = ClientNotice {
            target: event.metadata().target().to_string(),
            level: level.to_string(),
            message,
            fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // The UI may have gone away; notices are best effort.
        let _ = self.sender.send(notice);
    }
}

struct FieldVisitor<'a>(&'a mut HashMap<String, Value>);

impl Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(
            field.name().to_string(),
            serde_json::json!(format!("{:?}", value)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::prelude::*;

    fn capture(f: impl FnOnce()) -> Vec<ClientNotice> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = tracing_subscriber::registry().with(NoticeLayer::new(tx));
        tracing::subscriber::with_default(subscriber, f);

        let mut notices = Vec::new();
        while let Ok(notice) = rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    #[test]
    fn test_only_warnings_and_errors_are_forwarded() {
        let notices = capture(|| {
            tracing::debug!("[ListingSynchronizer] Snapshot with 12 listings");
            tracing::info!("[SessionManager] Signed in u1");
            tracing::warn!("[InteractionTracker] Could not persist viewed ids");
            tracing::error!("[SessionManager] Sign-out failed at provider");
        });

        let levels: Vec<_> = notices.iter().map(|n| n.level.as_str()).collect();
        assert_eq!(levels, vec!["WARN", "ERROR"]);
        assert_eq!(notices[1].message, "[SessionManager] Sign-out failed at provider");
    }

    #[test]
    fn test_structured_fields_are_kept_apart_from_message() {
        let notices = capture(|| {
            tracing::warn!(
                target: "templr::uploads",
                listing = "abc",
                attempts = 3u64,
                "[AssetUploader] Upload never started"
            );
        });

        assert_eq!(notices.len(), 1);
        let notice = &notices[0];
        assert_eq!(notice.target, "templr::uploads");
        assert_eq!(notice.message, "[AssetUploader] Upload never started");
        assert_eq!(notice.fields.get("listing"), Some(&serde_json::json!("abc")));
        assert_eq!(notice.fields.get("attempts"), Some(&serde_json::json!(3)));
        assert!(!notice.fields.contains_key("message"));
        assert!(chrono::DateTime::parse_from_rfc3339(&notice.timestamp).is_ok());
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let subscriber = tracing_subscriber::registry().with(NoticeLayer::new(tx));
        tracing::subscriber::with_default(subscriber, || {
            tracing::error!("nobody listening");
        });
    }
}
