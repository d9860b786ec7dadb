//! Duplication job: yesterday's completed daily tasks reappear today.

use chrono::{Days, NaiveDate};
use tracing::{info, info_span, Instrument};

use super::{JobKind, JobOutcome};
use crate::models::task::Task;
use crate::persistence::task_repo::TaskRepo;
use crate::{AppError, Result};

/// Insert a pending copy due `today` of every daily task completed for
/// the previous day.
///
/// The source rows are left untouched. There is no check for an existing
/// copy, so a second run on the same day inserts every copy again.
///
/// # Errors
///
/// Returns `AppError::Db` if the fetch or the bulk insert fails; a failed
/// insert leaves no partial copies.
pub async fn duplicate_daily_tasks(repo: &TaskRepo, today: NaiveDate) -> Result<JobOutcome> {
    let yesterday = today
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| AppError::Db(format!("no calendar day before {today}")))?;

    duplicate(repo, yesterday, today)
        .instrument(info_span!("duplicate_daily_tasks", %today))
        .await
}

async fn duplicate(repo: &TaskRepo, yesterday: NaiveDate, today: NaiveDate) -> Result<JobOutcome> {
    let sources = repo.list_completed_daily_due(yesterday).await?;
    if sources.is_empty() {
        info!("no completed daily tasks to duplicate");
        return Ok(JobOutcome {
            kind: JobKind::Duplicate,
            message: format!("No completed daily tasks due {yesterday}"),
            tasks: Vec::new(),
        });
    }

    let copies: Vec<Task> = sources
        .iter()
        .map(|task| task.rollover_copy(today))
        .collect();
    let tasks = repo.insert_many(&copies).await?;
    info!(count = tasks.len(), "daily tasks duplicated");

    Ok(JobOutcome {
        kind: JobKind::Duplicate,
        message: format!(
            "Duplicated {} daily tasks from {yesterday} to {today}",
            tasks.len()
        ),
        tasks,
    })
}
