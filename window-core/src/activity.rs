//! User-facing activity log shown under the action buttons.

use chrono::{Local, NaiveTime};
use std::collections::VecDeque;

use crate::model::{LogEntry, LogLevel};

pub const MAX_LOG_ENTRIES: usize = 30;

/// Bounded log, newest entry first. Pushing past capacity drops the oldest.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    next_id: u64,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }
}

impl ActivityLog {
    /// A capacity of zero is raised to one so the newest entry is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            next_id: 0,
            capacity,
        }
    }

    pub fn info(&mut self, message: impl Into<String>) -> &LogEntry {
        self.push(message, LogLevel::Info)
    }

    pub fn error(&mut self, message: impl Into<String>) -> &LogEntry {
        self.push(message, LogLevel::Error)
    }

    pub fn push(&mut self, message: impl Into<String>, level: LogLevel) -> &LogEntry {
        self.push_at(Local::now().time(), message, level)
    }

    pub fn push_at(
        &mut self,
        at: NaiveTime,
        message: impl Into<String>,
        level: LogLevel,
    ) -> &LogEntry {
        self.next_id += 1;
        self.entries.push_front(LogEntry {
            id: self.next_id,
            time: at.format("%H:%M:%S").to_string(),
            message: message.into(),
            level,
        });
        self.entries.truncate(self.capacity);

        &self.entries[0]
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_level(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }
}
