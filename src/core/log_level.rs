//! Log level definitions and level predicates

use super::error::LoggerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Severity of a log entry. Higher is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    /// Logged, then the calling thread panics.
    Panic = 4,
    /// Logged, then the process terminates.
    Fatal = 5,
}

impl LogLevel {
    /// Every level, least severe first
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Panic,
        LogLevel::Fatal,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Panic => "PANIC",
            LogLevel::Fatal => "FATAL",
        }
    }

    pub fn as_lowercase(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Panic => "panic",
            LogLevel::Fatal => "fatal",
        }
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Magenta,
            LogLevel::Info => Blue,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Panic => Red,
            LogLevel::Fatal => BrightRed,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            4 => LogLevel::Panic,
            _ => LogLevel::Fatal,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_lowercase())
    }
}

impl FromStr for LogLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" | "" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "panic" => Ok(LogLevel::Panic),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(LoggerError::UnrecognizedLevel(s.to_string())),
        }
    }
}

/// Decides whether entries of a given level should be processed.
pub trait LevelEnabler: Send + Sync {
    fn enabled(&self, level: LogLevel) -> bool;
}

/// A level used as a static threshold.
impl LevelEnabler for LogLevel {
    #[inline]
    fn enabled(&self, level: LogLevel) -> bool {
        level >= *self
    }
}

impl<T: LevelEnabler + ?Sized> LevelEnabler for Arc<T> {
    #[inline]
    fn enabled(&self, level: LogLevel) -> bool {
        (**self).enabled(level)
    }
}

impl<T: LevelEnabler + ?Sized> LevelEnabler for Box<T> {
    #[inline]
    fn enabled(&self, level: LogLevel) -> bool {
        (**self).enabled(level)
    }
}

/// Adapts a predicate into a [`LevelEnabler`].
///
/// Useful for splitting traffic between cores:
///
/// ```
/// use rust_structured_logger::{LevelEnabler, LevelEnablerFn, LogLevel};
///
/// let high = LevelEnablerFn::new(|level| level >= LogLevel::Error);
/// let low = LevelEnablerFn::new(|level| level < LogLevel::Error);
/// assert!(high.enabled(LogLevel::Fatal));
/// assert!(low.enabled(LogLevel::Info));
/// assert!(!low.enabled(LogLevel::Error));
/// ```
#[derive(Clone, Copy)]
pub struct LevelEnablerFn<F>(F);

impl<F> LevelEnablerFn<F>
where
    F: Fn(LogLevel) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<F> LevelEnabler for LevelEnablerFn<F>
where
    F: Fn(LogLevel) -> bool + Send + Sync,
{
    #[inline]
    fn enabled(&self, level: LogLevel) -> bool {
        (self.0)(level)
    }
}

impl<F> fmt::Debug for LevelEnablerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelEnablerFn").finish_non_exhaustive()
    }
}
