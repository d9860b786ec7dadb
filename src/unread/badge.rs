//! Held unread count with single-flight refresh.
//!
//! At most one aggregation runs per badge. A refresh requested while one
//! is running only records that another pass is needed; the running call
//! picks that up before it returns, so the last published value always
//! comes from a pass that started after the latest request.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use super::UnreadSource;

/// What a call to [`UnreadBadge::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No user was given; the held value is unchanged.
    Skipped,
    /// Another refresh was in flight and will run once more on our behalf.
    Coalesced,
    /// This call ran the aggregation (possibly several passes).
    Ran,
}

#[derive(Default)]
struct RefreshSlot {
    in_flight: bool,
    rerun_for: Option<String>,
}

/// Clears the slot if the running refresh is dropped mid-flight.
struct SlotGuard<'a> {
    slot: &'a Mutex<RefreshSlot>,
    armed: bool,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.in_flight = false;
            slot.rerun_for = None;
        }
    }
}

/// The latest unread count for one viewer, plus its refresh slot.
pub struct UnreadBadge {
    source: Arc<dyn UnreadSource>,
    value: watch::Sender<u64>,
    slot: Mutex<RefreshSlot>,
}

impl UnreadBadge {
    /// Create a badge showing 0 until the first successful refresh.
    #[must_use]
    pub fn new(source: Arc<dyn UnreadSource>) -> Self {
        let (value, _) = watch::channel(0);
        Self {
            source,
            value,
            slot: Mutex::new(RefreshSlot::default()),
        }
    }

    /// The held count.
    #[must_use]
    pub fn current(&self) -> u64 {
        *self.value.borrow()
    }

    /// Watch the held count for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.value.subscribe()
    }

    /// Recompute the count for `user_id` and publish it.
    ///
    /// Without a user nothing happens. Aggregation failures are logged and
    /// leave the held value as it was; they are never returned.
    pub async fn refresh(&self, user_id: Option<&str>) -> RefreshOutcome {
        let Some(user_id) = user_id else {
            debug!("unread refresh skipped: no user");
            return RefreshOutcome::Skipped;
        };

        {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.in_flight {
                slot.rerun_for = Some(user_id.to_owned());
                return RefreshOutcome::Coalesced;
            }
            slot.in_flight = true;
        }

        let mut guard = SlotGuard {
            slot: &self.slot,
            armed: true,
        };
        let mut user = user_id.to_owned();

        loop {
            match self.source.count_unread(&user).await {
                Ok(count) => {
                    self.value.send_replace(count);
                    debug!(user_id = %user, count, "unread badge updated");
                }
                Err(err) => {
                    error!(user_id = %user, %err, "unread count failed; keeping previous value");
                }
            }

            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(next) = slot.rerun_for.take() {
                user = next;
                continue;
            }
            slot.in_flight = false;
            guard.armed = false;
            break;
        }

        RefreshOutcome::Ran
    }
}

/// Spawn a task refreshing `badge` for `user_id` every `interval`.
///
/// Ticks that land while a refresh is running coalesce into it instead of
/// starting a second aggregation.
#[must_use]
pub fn spawn_unread_poller(
    badge: Arc<UnreadBadge>,
    user_id: String,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("unread poller shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let _ = badge.refresh(Some(&user_id)).await;
                    }
                }
            }
        }
        .instrument(info_span!("unread_poller")),
    )
}
