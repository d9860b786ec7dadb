//! Task model and the daily rollover copy rule.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status for a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started, or reset for a new day.
    Pending,
    /// Being worked on.
    InProgress,
    /// Finished; `completed_at` is set.
    Completed,
    /// Abandoned.
    Cancelled,
}

/// Recurrence class of a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Expected to recur once per calendar day.
    Daily,
    /// Done once.
    OneTime,
    /// Expected to recur once per week.
    Weekly,
}

/// Task urgency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low urgency.
    Low,
    /// Default urgency.
    Medium,
    /// High urgency.
    High,
}

/// A unit of work assigned to an employee.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    /// Unique record identifier.
    pub id: String,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: Option<String>,
    /// Employee the task is assigned to.
    pub assignee_id: Option<String>,
    /// Urgency.
    pub priority: TaskPriority,
    /// Recurrence class.
    pub task_type: TaskType,
    /// Calendar day the task is due.
    pub due_date: Option<NaiveDate>,
    /// Owning department.
    pub department: Option<String>,
    /// Employee who created the task.
    pub creator_id: Option<String>,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Set when the task reached `Completed`.
    pub completed_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Construct a new pending task with medium priority.
    #[must_use]
    pub fn new(title: String, task_type: TaskType, due_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            description: None,
            assignee_id: None,
            priority: TaskPriority::Medium,
            task_type,
            due_date,
            department: None,
            creator_id: None,
            status: TaskStatus::Pending,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Mark the task completed at `at`.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
    }

    /// Fresh pending copy of this task due on `due`.
    ///
    /// Copies title, description, assignee, priority, type, department and
    /// creator; everything else starts over.
    #[must_use]
    pub fn rollover_copy(&self, due: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            assignee_id: self.assignee_id.clone(),
            priority: self.priority,
            task_type: self.task_type,
            due_date: Some(due),
            department: self.department.clone(),
            creator_id: self.creator_id.clone(),
            status: TaskStatus::Pending,
            completed_at: None,
            created_at: Utc::now(),
        }
    }
}
