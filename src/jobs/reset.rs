//! Reset job: completed daily tasks go back to pending.

use tracing::{info, info_span, Instrument};

use super::{JobKind, JobOutcome};
use crate::persistence::task_repo::TaskRepo;
use crate::Result;

/// Set every completed daily task to pending and clear `completed_at`.
///
/// Not scoped by date. Running it twice in a row is safe: the second run
/// finds nothing to update.
///
/// # Errors
///
/// Returns `AppError::Db` if the update fails; nothing is changed then.
pub async fn reset_daily_tasks(repo: &TaskRepo) -> Result<JobOutcome> {
    reset(repo)
        .instrument(info_span!("reset_daily_tasks"))
        .await
}

async fn reset(repo: &TaskRepo) -> Result<JobOutcome> {
    let tasks = repo.reset_completed_daily().await?;
    let message = if tasks.is_empty() {
        "No completed daily tasks to reset".to_owned()
    } else {
        format!("Reset {} daily tasks to pending", tasks.len())
    };
    info!(count = tasks.len(), "daily task reset complete");

    Ok(JobOutcome {
        kind: JobKind::Reset,
        message,
        tasks,
    })
}
