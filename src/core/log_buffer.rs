/// LogBuffer (C9): a bounded ring of structured log entries for
/// observability, alongside the crate's ordinary `tracing` output.
///
/// `add`/`debug`/`info`/`warning`/`error` both push into the ring and emit
/// the matching `tracing` event, so the two views of the crate's log never
/// drift: stderr during local development, and a snapshot any MCP client or
/// test can read back.
use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

pub struct LogBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(4096))),
        }
    }

    /// Thread-safe append; drops the oldest entry once `capacity` is
    /// exceeded.
    pub fn add(&self, level: LogLevel, message: impl Into<String>, exception: Option<String>) {
        let message = message.into();
        let entry = LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.clone(),
            exception: exception.clone(),
        };
        {
            let mut entries = self.entries.lock().expect("log buffer poisoned");
            if entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }
        match (level, &exception) {
            (LogLevel::Debug, None) => tracing::debug!("{message}"),
            (LogLevel::Debug, Some(e)) => tracing::debug!(exception = %e, "{message}"),
            (LogLevel::Info, None) => tracing::info!("{message}"),
            (LogLevel::Info, Some(e)) => tracing::info!(exception = %e, "{message}"),
            (LogLevel::Warning, None) => tracing::warn!("{message}"),
            (LogLevel::Warning, Some(e)) => tracing::warn!(exception = %e, "{message}"),
            (LogLevel::Error, None) => tracing::error!("{message}"),
            (LogLevel::Error, Some(e)) => tracing::error!(exception = %e, "{message}"),
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.add(LogLevel::Debug, message, None);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.add(LogLevel::Info, message, None);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.add(LogLevel::Warning, message, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.add(LogLevel::Error, message, None);
    }

    /// Copies the current entries for UI/API display, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        let entries = self.entries.lock().expect("log buffer poisoned");
        entries.iter().cloned().collect()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().expect("log buffer poisoned");
        entries.clear();
    }

    pub fn len(&self) -> usize {
        let entries = self.entries.lock().expect("log buffer poisoned");
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
