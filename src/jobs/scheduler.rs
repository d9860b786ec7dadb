//! Optional in-process daily trigger for the rollover jobs.
//!
//! Each job gets its own background task that sleeps until the next
//! configured UTC time of day, runs the job once, and repeats. A job runs
//! at most once per calendar day even if the wall clock steps backward
//! while the task sleeps.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use super::{run_job, JobKind, JobOutcome};
use crate::notify::{Notice, Notifier};
use crate::persistence::db::Database;
use crate::Result;

/// How long a failed-job notice stays visible.
const FAILURE_NOTICE_MS: u64 = 10_000;

/// Next occurrence of `at` (UTC) strictly after `now`, on a day later than
/// `last_run`.
#[must_use]
pub fn next_run(
    now: DateTime<Utc>,
    at: NaiveTime,
    last_run: Option<NaiveDate>,
) -> DateTime<Utc> {
    let mut day = now.date_naive();
    if let Some(last) = last_run.filter(|last| *last >= day) {
        day = last.checked_add_days(Days::new(1)).unwrap_or(last);
    }

    let target = day.and_time(at).and_utc();
    if target > now {
        return target;
    }
    day.checked_add_days(Days::new(1))
        .map_or(target, |next| next.and_time(at).and_utc())
}

/// Time from `now` until the next occurrence of `at` (UTC).
///
/// An `at` equal to the current time of day is scheduled for tomorrow.
#[must_use]
pub fn until_next(now: DateTime<Utc>, at: NaiveTime) -> Duration {
    (next_run(now, at, None) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Run `kind` for `day`, logging the outcome and raising a destructive
/// notice on failure.
///
/// # Errors
///
/// Returns the job's error after it has been reported.
pub async fn run_scheduled(
    db: Arc<Database>,
    kind: JobKind,
    day: NaiveDate,
    notifier: &dyn Notifier,
) -> Result<JobOutcome> {
    match run_job(db, kind, day).await {
        Ok(outcome) => {
            info!(
                count = outcome.count(),
                message = %outcome.message,
                %day,
                "scheduled rollover finished"
            );
            Ok(outcome)
        }
        Err(err) => {
            error!(%err, %day, "scheduled rollover failed");
            let notice = Notice::job_failed(kind.count_key(), &err.to_string(), FAILURE_NOTICE_MS);
            if let Err(notify_err) = notifier.notify(&notice).await {
                warn!(err = %notify_err, "failed to show job failure notice");
            }
            Err(err)
        }
    }
}

/// Spawn a task that runs `kind` every day at `at` UTC until cancelled.
///
/// Failures are reported through `notifier`.
#[must_use]
pub fn spawn_daily_job(
    db: Arc<Database>,
    kind: JobKind,
    at: NaiveTime,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let mut last_run: Option<NaiveDate> = None;
            loop {
                let now = Utc::now();
                let target = next_run(now, at, last_run);
                let wait = (target - now).to_std().unwrap_or(Duration::ZERO);
                info!(%target, wait_secs = wait.as_secs(), "next rollover run scheduled");
                tokio::select! {
                    () = cancel.cancelled() => {
                        info!("rollover scheduler shutting down");
                        break;
                    }
                    () = tokio::time::sleep(wait) => {
                        let day = target.date_naive();
                        last_run = Some(day);
                        let _ = run_scheduled(Arc::clone(&db), kind, day, notifier.as_ref()).await;
                    }
                }
            }
        }
        .instrument(info_span!("rollover_scheduler", job = ?kind)),
    )
}
