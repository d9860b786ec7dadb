//! Task repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite};

use crate::models::task::{Task, TaskPriority, TaskStatus, TaskType};
use crate::models::{format_timestamp, parse_timestamp};
use crate::{AppError, Result};

use super::db::Database;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository for `tasks` rows.
#[derive(Clone)]
pub struct TaskRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    title: String,
    description: Option<String>,
    assignee_id: Option<String>,
    priority: String,
    task_type: String,
    due_date: Option<String>,
    department: Option<String>,
    creator_id: Option<String>,
    status: String,
    completed_at: Option<String>,
    created_at: String,
}

impl TaskRow {
    /// Convert a database row into the domain model.
    fn into_task(self) -> Result<Task> {
        let due_date = self
            .due_date
            .as_deref()
            .map(|raw| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT)
                    .map_err(|e| AppError::Db(format!("invalid due_date: {e}")))
            })
            .transpose()?;
        let completed_at = self
            .completed_at
            .as_deref()
            .map(|raw| parse_timestamp("completed_at", raw))
            .transpose()?;

        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            assignee_id: self.assignee_id,
            priority: parse_priority(&self.priority)?,
            task_type: parse_task_type(&self.task_type)?,
            due_date,
            department: self.department,
            creator_id: self.creator_id,
            status: parse_status(&self.status)?,
            completed_at,
            created_at: parse_timestamp("created_at", &self.created_at)?,
        })
    }
}

fn parse_status(s: &str) -> Result<TaskStatus> {
    match s {
        "pending" => Ok(TaskStatus::Pending),
        "in_progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        "cancelled" => Ok(TaskStatus::Cancelled),
        other => Err(AppError::Db(format!("invalid task status: {other}"))),
    }
}

fn status_str(s: TaskStatus) -> &'static str {
    match s {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in_progress",
        TaskStatus::Completed => "completed",
        TaskStatus::Cancelled => "cancelled",
    }
}

fn parse_task_type(s: &str) -> Result<TaskType> {
    match s {
        "daily" => Ok(TaskType::Daily),
        "one_time" => Ok(TaskType::OneTime),
        "weekly" => Ok(TaskType::Weekly),
        other => Err(AppError::Db(format!("invalid task type: {other}"))),
    }
}

fn task_type_str(t: TaskType) -> &'static str {
    match t {
        TaskType::Daily => "daily",
        TaskType::OneTime => "one_time",
        TaskType::Weekly => "weekly",
    }
}

fn parse_priority(s: &str) -> Result<TaskPriority> {
    match s {
        "low" => Ok(TaskPriority::Low),
        "medium" => Ok(TaskPriority::Medium),
        "high" => Ok(TaskPriority::High),
        other => Err(AppError::Db(format!("invalid task priority: {other}"))),
    }
}

fn priority_str(p: TaskPriority) -> &'static str {
    match p {
        TaskPriority::Low => "low",
        TaskPriority::Medium => "medium",
        TaskPriority::High => "high",
    }
}

fn date_str(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

impl TaskRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a single task.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the database insert fails.
    pub async fn create(&self, task: &Task) -> Result<Task> {
        let mut inserted = self.insert_many(std::slice::from_ref(task)).await?;
        inserted
            .pop()
            .ok_or_else(|| AppError::Db("failed to create task".into()))
    }

    /// Insert all `tasks` in one statement.
    ///
    /// An empty slice issues no statement and returns an empty list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the insert fails; no row is inserted then.
    pub async fn insert_many(&self, tasks: &[Task]) -> Result<Vec<Task>> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO tasks (id, title, description, assignee_id, priority, task_type, \
             due_date, department, creator_id, status, completed_at, created_at) ",
        );
        builder.push_values(tasks, |mut row, task| {
            row.push_bind(task.id.clone())
                .push_bind(task.title.clone())
                .push_bind(task.description.clone())
                .push_bind(task.assignee_id.clone())
                .push_bind(priority_str(task.priority))
                .push_bind(task_type_str(task.task_type))
                .push_bind(task.due_date.map(date_str))
                .push_bind(task.department.clone())
                .push_bind(task.creator_id.clone())
                .push_bind(status_str(task.status))
                .push_bind(task.completed_at.map(format_timestamp))
                .push_bind(format_timestamp(task.created_at));
        });

        builder.build().execute(self.db.as_ref()).await?;
        Ok(tasks.to_vec())
    }

    /// Retrieve a task by its ID.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(TaskRow::into_task).transpose()
    }

    /// List every task, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> =
            sqlx::query_as("SELECT * FROM tasks ORDER BY created_at ASC, id ASC")
                .fetch_all(self.db.as_ref())
                .await?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    /// Mark a task completed at `at`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if no task has `id`, or `AppError::Db`
    /// if the update fails.
    pub async fn complete(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'completed', completed_at = ?1 WHERE id = ?2",
        )
        .bind(format_timestamp(at))
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("task {id}")));
        }
        Ok(())
    }

    /// Set every completed daily task back to pending and clear its
    /// completion time, regardless of due date.
    ///
    /// Returns the rows as they are after the update.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the update fails.
    pub async fn reset_completed_daily(&self) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "UPDATE tasks SET status = 'pending', completed_at = NULL \
             WHERE task_type = 'daily' AND status = 'completed' \
             RETURNING *",
        )
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    /// List completed daily tasks due on `due`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_completed_daily_due(&self, due: NaiveDate) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks \
             WHERE task_type = 'daily' AND status = 'completed' AND due_date = ?1 \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(date_str(due))
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }
}
