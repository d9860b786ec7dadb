#![forbid(unsafe_code)]

//! Task tracker core: unread-message badges, live chat notifications, and
//! the daily-task rollover jobs.

pub mod config;
pub mod errors;
pub mod feed;
pub mod http;
pub mod jobs;
pub mod listener;
pub mod messaging;
pub mod models;
pub mod notify;
pub mod persistence;
pub mod unread;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
