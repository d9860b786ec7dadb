//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` and are safe to
//! re-run on every startup.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table and index definitions to the connected database.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS profiles (
    id              TEXT PRIMARY KEY NOT NULL,
    full_name       TEXT,
    email           TEXT,
    department      TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chats (
    id              TEXT PRIMARY KEY NOT NULL,
    name            TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_members (
    chat_id         TEXT NOT NULL,
    user_id         TEXT NOT NULL,
    last_read_at    TEXT,
    joined_at       TEXT NOT NULL,
    PRIMARY KEY (chat_id, user_id)
);

CREATE TABLE IF NOT EXISTS messages (
    id              TEXT PRIMARY KEY NOT NULL,
    chat_id         TEXT NOT NULL,
    sender_id       TEXT NOT NULL,
    content         TEXT,
    file_url        TEXT,
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id              TEXT PRIMARY KEY NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT,
    assignee_id     TEXT,
    priority        TEXT NOT NULL CHECK(priority IN ('low','medium','high')),
    task_type       TEXT NOT NULL CHECK(task_type IN ('daily','one_time','weekly')),
    due_date        TEXT,
    department      TEXT,
    creator_id      TEXT,
    status          TEXT NOT NULL CHECK(status IN ('pending','in_progress','completed','cancelled')),
    completed_at    TEXT,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_members_user ON chat_members(user_id);
CREATE INDEX IF NOT EXISTS idx_messages_chat_created ON messages(chat_id, created_at);
CREATE INDEX IF NOT EXISTS idx_tasks_rollover ON tasks(task_type, status, due_date);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
