// Task records and the values derived from them

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Default display format for `createdAt`, e.g. `2025/3/7 09:41:05`
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%-m/%-d %H:%M:%S";

/// Task identifier: milliseconds since the Unix epoch at creation time
pub type TaskId = i64;

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Task {
    /// Build a new task from already-trimmed text
    pub fn new(id: TaskId, text: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            created_at: created_at.into(),
        }
    }
}

/// Counts shown next to the task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
}

impl Stats {
    pub fn of(tasks: &[Task]) -> Self {
        Self {
            total: tasks.len(),
            completed: tasks.iter().filter(|t| t.completed).count(),
        }
    }
}

/// Check that `format` is a usable chrono strftime string
pub fn validate_date_format(format: &str) -> Result<()> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(eyre!("Invalid date format: {:?}", format));
    }
    Ok(())
}

/// Format a timestamp for display in `createdAt`
///
/// Falls back to [`DEFAULT_DATE_FORMAT`] when `format` cannot be rendered.
pub fn format_created_at<Tz: TimeZone>(at: &DateTime<Tz>, format: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", at.format(format)).is_ok() {
        return out;
    }
    at.format(DEFAULT_DATE_FORMAT).to_string()
}

/// Current local time
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Current timestamp in milliseconds
pub fn now_ms() -> i64 {
    now().timestamp_millis()
}
