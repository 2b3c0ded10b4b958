//! Notification payloads, the formatter, and delivery transports.
//!
//! The pipeline hands exactly one payload per run to a [`Notifier`]. Delivery
//! is never retried or queued; a failure is reported to the caller, which
//! logs it as a warning.

pub mod format;
pub mod pushplus;

pub use format::{format_price, render, style, SignalStyle};
pub use pushplus::PushPlusNotifier;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Final output of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    /// HTML markup.
    pub body: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport unreachable: {0}")]
    Transport(String),

    #[error("notification rejected with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("notification service refused message (code {code}): {message}")]
    Refused { code: i64, message: String },
}

/// Delivery channel for notification payloads.
pub trait Notifier: Send + Sync {
    /// Human-readable name of this transport.
    fn name(&self) -> &str;

    /// Deliver one payload. Implementations do not retry.
    fn deliver(&self, payload: &NotificationPayload) -> Result<(), NotifyError>;
}

/// Writes the payload to the log instead of sending it.
///
/// Used for dry runs and whenever no push token is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    fn deliver(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        info!(
            title = %payload.title,
            generated_at = %payload.generated_at,
            body = %payload.body,
            "notification (not sent)"
        );
        Ok(())
    }
}
