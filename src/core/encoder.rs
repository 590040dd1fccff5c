//! Encoder trait and encoder configuration
//!
//! An encoder turns an [`Entry`] and its fields into the bytes of one log
//! line. The concrete wire formats live in [`crate::encoders`]; this module
//! holds what they share: the trait, the key/format configuration, and the
//! per-element formatting choices.

use super::error::Result;
use super::field::Field;
use super::log_entry::{Entry, EntryCaller};
use super::log_level::LogLevel;
use super::timestamp::{DurationEncoder, TimeEncoder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Serializes entries into one wire format.
///
/// Implementations are immutable: [`with_fields`](Encoder::with_fields)
/// returns a new encoder carrying the extra context and leaves `self`
/// untouched, so one encoder can be shared between threads and cores.
pub trait Encoder: Send + Sync {
    /// Clone this encoder with `fields` appended to its context.
    fn with_fields(&self, fields: &[Field]) -> Box<dyn Encoder>;

    /// Encode one complete line, line ending included.
    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<Vec<u8>>;
}

/// A scalar produced by one of the element encoders
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Int(i) => write!(f, "{}", i),
            Primitive::Float(fl) => write!(f, "{}", fl),
            Primitive::Text(s) => f.write_str(s),
        }
    }
}

/// How the level is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelEncoder {
    /// `info`
    #[default]
    Lowercase,
    /// `INFO`
    Capital,
    /// `info` wrapped in the level's ANSI color
    LowercaseColor,
    /// `INFO` wrapped in the level's ANSI color
    CapitalColor,
}

impl LevelEncoder {
    pub fn from_name(name: &str) -> Self {
        match name {
            "capital" => LevelEncoder::Capital,
            "color" => LevelEncoder::LowercaseColor,
            "capitalColor" => LevelEncoder::CapitalColor,
            _ => LevelEncoder::Lowercase,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LevelEncoder::Lowercase => "lowercase",
            LevelEncoder::Capital => "capital",
            LevelEncoder::LowercaseColor => "color",
            LevelEncoder::CapitalColor => "capitalColor",
        }
    }

    pub fn encode(&self, level: LogLevel) -> String {
        match self {
            LevelEncoder::Lowercase => level.as_lowercase().to_string(),
            LevelEncoder::Capital => level.to_str().to_string(),
            LevelEncoder::LowercaseColor => colorize(level, level.as_lowercase()),
            LevelEncoder::CapitalColor => colorize(level, level.to_str()),
        }
    }
}

fn colorize(level: LogLevel, text: &str) -> String {
    format!("\x1b[{}m{}\x1b[0m", level.color_code().to_fg_str(), text)
}

/// How the caller location is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CallerEncoder {
    /// Full source path: `src/core/logger.rs:42`
    #[default]
    Full,
    /// Last directory and file: `core/logger.rs:42`
    Short,
}

impl CallerEncoder {
    pub fn from_name(name: &str) -> Self {
        match name {
            "short" => CallerEncoder::Short,
            _ => CallerEncoder::Full,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CallerEncoder::Full => "full",
            CallerEncoder::Short => "short",
        }
    }

    pub fn encode(&self, caller: &EntryCaller) -> String {
        match self {
            CallerEncoder::Full => caller.full_path(),
            CallerEncoder::Short => caller.trimmed_path(),
        }
    }
}

/// Element encoders are configured by name; unknown names fall back to the
/// element's default instead of failing.
macro_rules! impl_named_serde {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.name())
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                    let name = String::deserialize(deserializer)?;
                    Ok(<$ty>::from_name(&name))
                }
            }
        )*
    };
}

impl_named_serde!(LevelEncoder, CallerEncoder, TimeEncoder, DurationEncoder);

/// Keys and formatting choices shared by every encoder.
///
/// An empty key omits that element from the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EncoderConfig {
    pub message_key: String,
    pub level_key: String,
    pub time_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub stacktrace_key: String,
    pub line_ending: String,
    pub console_separator: String,
    pub level_encoder: LevelEncoder,
    pub time_encoder: TimeEncoder,
    pub duration_encoder: DurationEncoder,
    pub caller_encoder: CallerEncoder,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            message_key: String::new(),
            level_key: String::new(),
            time_key: String::new(),
            name_key: String::new(),
            caller_key: String::new(),
            stacktrace_key: String::new(),
            line_ending: "\n".to_string(),
            console_separator: "\t".to_string(),
            level_encoder: LevelEncoder::default(),
            time_encoder: TimeEncoder::default(),
            duration_encoder: DurationEncoder::default(),
            caller_encoder: CallerEncoder::default(),
        }
    }
}

impl EncoderConfig {
    /// Machine-oriented keys and formats
    pub fn production() -> Self {
        Self {
            message_key: "msg".to_string(),
            level_key: "level".to_string(),
            time_key: "ts".to_string(),
            name_key: "logger".to_string(),
            caller_key: "caller".to_string(),
            stacktrace_key: "stacktrace".to_string(),
            level_encoder: LevelEncoder::Lowercase,
            time_encoder: TimeEncoder::Epoch,
            duration_encoder: DurationEncoder::Seconds,
            caller_encoder: CallerEncoder::Short,
            ..Self::default()
        }
    }

    /// Short keys and human-friendly formats
    pub fn development() -> Self {
        Self {
            message_key: "M".to_string(),
            level_key: "L".to_string(),
            time_key: "T".to_string(),
            name_key: "N".to_string(),
            caller_key: "C".to_string(),
            stacktrace_key: "S".to_string(),
            level_encoder: LevelEncoder::Capital,
            time_encoder: TimeEncoder::Iso8601,
            duration_encoder: DurationEncoder::String,
            caller_encoder: CallerEncoder::Short,
            ..Self::default()
        }
    }

    /// Line terminator, `"\n"` when left empty
    pub fn line_ending(&self) -> &str {
        if self.line_ending.is_empty() {
            "\n"
        } else {
            &self.line_ending
        }
    }

    pub fn console_separator(&self) -> &str {
        if self.console_separator.is_empty() {
            "\t"
        } else {
            &self.console_separator
        }
    }
}
