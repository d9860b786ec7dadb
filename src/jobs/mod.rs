//! Daily-task rollover jobs.
//!
//! Two independent batch operations, each run by an external trigger (HTTP
//! endpoint, `run-job` CLI) or the optional in-process [`scheduler`]:
//!
//! - [`reset::reset_daily_tasks`] puts every completed daily task back to
//!   pending, whatever its due date.
//! - [`duplicate::duplicate_daily_tasks`] copies the daily tasks completed
//!   for yesterday into fresh pending rows due today.
//!
//! Nothing coordinates the two. Run on the same night, a task completed
//! yesterday is both reset and duplicated.

pub mod duplicate;
pub mod reset;
pub mod scheduler;

use std::sync::Arc;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::Serialize;

use crate::models::task::Task;
use crate::persistence::db::Database;
use crate::persistence::task_repo::TaskRepo;
use crate::Result;

/// Which rollover job to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Completed daily tasks back to pending.
    Reset,
    /// Yesterday's completed daily tasks copied to today.
    Duplicate,
}

impl JobKind {
    /// Key under which the affected-row count is reported.
    #[must_use]
    pub fn count_key(self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Duplicate => "duplicated",
        }
    }
}

/// Result of one successful job invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Job that ran.
    pub kind: JobKind,
    /// Human-readable summary.
    pub message: String,
    /// Rows updated (reset) or inserted (duplicate).
    pub tasks: Vec<Task>,
}

impl JobOutcome {
    /// Number of rows affected.
    #[must_use]
    pub fn count(&self) -> usize {
        self.tasks.len()
    }
}

/// Run `kind` once against `db`; `today` only matters for duplication.
///
/// # Errors
///
/// Returns `AppError::Db` if any read or write fails.
pub async fn run_job(db: Arc<Database>, kind: JobKind, today: NaiveDate) -> Result<JobOutcome> {
    let repo = TaskRepo::new(db);
    match kind {
        JobKind::Reset => reset::reset_daily_tasks(&repo).await,
        JobKind::Duplicate => duplicate::duplicate_daily_tasks(&repo, today).await,
    }
}
