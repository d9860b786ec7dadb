//! Notifier that writes notices to the log.

use tracing::info;

use super::{CueTone, Notice, Notifier, NotifyFuture};

/// Logs every notice at `info` and renders (but does not play) the cue.
///
/// Used by headless deployments where no UI is attached.
#[derive(Debug, Clone)]
pub struct TracingNotifier {
    tone: CueTone,
    sample_rate: u32,
}

impl TracingNotifier {
    /// Create a notifier rendering the default cue at `sample_rate`.
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            tone: CueTone::default(),
            sample_rate,
        }
    }
}

impl Notifier for TracingNotifier {
    fn notify<'a>(&'a self, notice: &'a Notice) -> NotifyFuture<'a> {
        Box::pin(async move {
            info!(
                title = %notice.title,
                body = %notice.body,
                variant = ?notice.variant,
                duration_ms = notice.duration_ms,
                "notice"
            );
            Ok(())
        })
    }

    fn play_cue(&self) -> NotifyFuture<'_> {
        Box::pin(async move {
            let samples = self.tone.samples(self.sample_rate)?;
            info!(samples = samples.len(), frequency_hz = self.tone.frequency_hz, "cue");
            Ok(())
        })
    }
}
