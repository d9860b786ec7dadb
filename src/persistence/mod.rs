//! Persistence layer modules.

pub mod chat_repo;
pub mod db;
pub mod message_repo;
pub mod profile_repo;
pub mod schema;
pub mod task_repo;

/// Re-export the database pool type for convenience.
pub use sqlx::SqlitePool;
