//! Log entry structure

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::fmt;
use std::panic::Location;

/// Source location of a logging call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryCaller {
    pub file: &'static str,
    pub line: u32,
}

impl EntryCaller {
    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// `path/to/file.rs:42`
    pub fn full_path(&self) -> String {
        format!("{}:{}", self.file, self.line)
    }

    /// Only the last directory and the file name: `core/logger.rs:42`
    pub fn trimmed_path(&self) -> String {
        let file = self.file;
        let trimmed = match file.rfind(['/', '\\']) {
            Some(last) => match file[..last].rfind(['/', '\\']) {
                Some(prev) => &file[prev + 1..],
                None => file,
            },
            None => file,
        };
        format!("{}:{}", trimmed, self.line)
    }
}

impl fmt::Display for EntryCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Metadata of one log event.
///
/// Fields are passed next to the entry rather than inside it, so the same
/// entry can be written with different field sets without being rebuilt.
#[derive(Debug, Clone)]
pub struct Entry {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Dot-separated logger path, empty for an unnamed logger
    pub logger_name: String,
    pub message: String,
    pub caller: Option<EntryCaller>,
    pub stack: Option<String>,
}

impl Entry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            logger_name: String::new(),
            message: message.into(),
            caller: None,
            stack: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger_name = name.into();
        self
    }

    pub fn with_caller(mut self, caller: EntryCaller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}
