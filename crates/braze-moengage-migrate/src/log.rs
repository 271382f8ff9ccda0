//! Append-only migration log.
//!
//! The orchestrator records every notable event of a run here, timestamped
//! at emission time. Callers render the log for auditing; it is never
//! replayed to drive behavior.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One timestamped log event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the event was emitted.
    pub timestamp: DateTime<Utc>,

    /// Event severity.
    pub level: LogLevel,

    /// Event text.
    pub message: String,
}

/// Strictly append-ordered event sequence for one migration run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationLog {
    entries: Vec<LogEntry>,
}

impl MigrationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, stamping it with the current time.
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        self.entries.push(LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        });
    }

    /// All recorded entries, oldest first.
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
