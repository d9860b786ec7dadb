//! User-facing notice and audible-cue capability.
//!
//! The listener never touches a toast service or audio device directly;
//! it is handed a [`Notifier`] and calls [`Notifier::notify`] and
//! [`Notifier::play_cue`]. Implementations decide where those go.

mod channel;
mod tone;
mod tracing_notifier;

pub use channel::{ChannelNotifier, NotifierEvent};
pub use tone::CueTone;
pub use tracing_notifier::TracingNotifier;

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::Result;

/// Title used for incoming chat message notices.
pub const NEW_MESSAGE_TITLE: &str = "Новое сообщение";

/// Title used when a scheduled rollover job fails.
pub const JOB_FAILED_TITLE: &str = "Ошибка задания";

/// Visual style of a notice.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeVariant {
    /// Neutral information.
    #[default]
    Default,
    /// Error or destructive outcome.
    Destructive,
}

/// A transient notice that dismisses itself after `duration_ms`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    /// Heading line.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Visual style.
    pub variant: NoticeVariant,
    /// Time on screen before self-dismissal.
    pub duration_ms: u64,
}

impl Notice {
    /// Build the notice shown for an incoming chat message.
    #[must_use]
    pub fn new_message(sender: &str, preview: &str, duration_ms: u64) -> Self {
        Self {
            title: NEW_MESSAGE_TITLE.to_owned(),
            body: format!("{sender}: {preview}"),
            variant: NoticeVariant::Default,
            duration_ms,
        }
    }

    /// Build the notice raised when the scheduled `job` fails with `error`.
    #[must_use]
    pub fn job_failed(job: &str, error: &str, duration_ms: u64) -> Self {
        Self {
            title: JOB_FAILED_TITLE.to_owned(),
            body: format!("{job}: {error}"),
            variant: NoticeVariant::Destructive,
            duration_ms,
        }
    }
}

/// Boxed future returned by [`Notifier`] methods.
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Capability for surfacing notices and the audible cue.
pub trait Notifier: Send + Sync {
    /// Show a transient notice.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Notify`](crate::AppError::Notify) if the notice
    /// cannot be delivered.
    fn notify<'a>(&'a self, notice: &'a Notice) -> NotifyFuture<'a>;

    /// Play the short new-message cue.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Notify`](crate::AppError::Notify) if sound
    /// cannot be produced.
    fn play_cue(&self) -> NotifyFuture<'_>;
}
