//! Notifier that hands notices to an attached UI over a channel.

use tokio::sync::mpsc;

use super::{Notice, Notifier, NotifyFuture};
use crate::AppError;

/// What a [`ChannelNotifier`] forwards to its receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierEvent {
    /// Show this notice.
    Notice(Notice),
    /// Play the new-message cue.
    Cue,
}

/// Forwards notices and cue requests to an `mpsc` receiver owned by a UI.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<NotifierEvent>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver its events arrive on.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NotifierEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    async fn forward(&self, event: NotifierEvent) -> crate::Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| AppError::Notify("notice receiver closed".into()))
    }
}

impl Notifier for ChannelNotifier {
    fn notify<'a>(&'a self, notice: &'a Notice) -> NotifyFuture<'a> {
        Box::pin(self.forward(NotifierEvent::Notice(notice.clone())))
    }

    fn play_cue(&self) -> NotifyFuture<'_> {
        Box::pin(self.forward(NotifierEvent::Cue))
    }
}
