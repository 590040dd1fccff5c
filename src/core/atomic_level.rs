//! A shared, mutable level threshold

use super::error::LoggerError;
use super::log_level::{LevelEnabler, LogLevel};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// A level threshold that can be changed at runtime.
///
/// Clones share the same cell, so every core built from an `AtomicLevel`
/// sees a [`set_level`](AtomicLevel::set_level) as soon as it returns.
///
/// # Example
///
/// ```
/// use rust_structured_logger::{AtomicLevel, LevelEnabler, LogLevel};
///
/// let level = AtomicLevel::new();
/// let shared = level.clone();
/// assert!(shared.enabled(LogLevel::Info));
///
/// level.set_level(LogLevel::Error);
/// assert!(!shared.enabled(LogLevel::Info));
/// ```
#[derive(Clone)]
pub struct AtomicLevel {
    level: Arc<AtomicU8>,
}

impl AtomicLevel {
    /// Create a level enabled at Info and above
    pub fn new() -> Self {
        Self::new_at(LogLevel::Info)
    }

    pub fn new_at(level: LogLevel) -> Self {
        Self {
            level: Arc::new(AtomicU8::new(level as u8)),
        }
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::SeqCst))
    }

    /// Replace the threshold for every holder of this level
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::SeqCst);
    }
}

impl Default for AtomicLevel {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelEnabler for AtomicLevel {
    #[inline]
    fn enabled(&self, level: LogLevel) -> bool {
        self.level().enabled(level)
    }
}

impl From<LogLevel> for AtomicLevel {
    fn from(level: LogLevel) -> Self {
        Self::new_at(level)
    }
}

impl fmt::Debug for AtomicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicLevel").field(&self.level()).finish()
    }
}

impl fmt::Display for AtomicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.level(), f)
    }
}

impl FromStr for AtomicLevel {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<LogLevel>().map(Self::new_at)
    }
}

impl Serialize for AtomicLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.level().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AtomicLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
