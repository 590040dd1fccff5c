//! Declarative logger construction
//!
//! [`Config`] describes the common setup in one value: level, encoding,
//! outputs, sampling and a few logger options. It derives `Deserialize`,
//! so it can come straight from a JSON or TOML document that the caller
//! has already parsed.
//!
//! ```
//! use rust_structured_logger::core::Config;
//!
//! let raw = r#"{
//!     "level": "debug",
//!     "encoding": "json",
//!     "outputPaths": [],
//!     "encoderConfig": { "messageKey": "message", "levelKey": "level" },
//!     "initialFields": { "service": "billing" }
//! }"#;
//! let config: Config = serde_json::from_str(raw).unwrap();
//! let logger = config.build([]).unwrap();
//! logger.info("ready", &[]).unwrap();
//! ```

use super::{
    atomic_level::AtomicLevel,
    encoder::EncoderConfig,
    error::{LoggerError, Result},
    field::{Field, FieldValue},
    log_core::{Core, IoCore},
    log_level::{LevelEnabler, LogLevel},
    logger::{Logger, LoggerOption},
    sampling::{Sampler, SamplingConfig},
    write_syncer::open_sinks,
};
use crate::encoders::new_encoder;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// How the minimum level of a built logger is given
#[derive(Clone)]
pub enum LevelSetting {
    /// A fixed threshold
    Static(LogLevel),
    /// A shared threshold the caller keeps a handle to
    Atomic(AtomicLevel),
    /// Level text, parsed when the logger is built
    ///
    /// Deserialized configs never hold this variant; level text is parsed
    /// into [`LevelSetting::Atomic`] as it is read.
    Named(String),
}

impl LevelSetting {
    /// The enabler this setting resolves to.
    ///
    /// A named level becomes a fresh [`AtomicLevel`].
    pub fn resolve(&self) -> Result<Arc<dyn LevelEnabler>> {
        Ok(match self {
            LevelSetting::Static(level) => Arc::new(*level),
            LevelSetting::Atomic(level) => Arc::new(level.clone()),
            LevelSetting::Named(text) => Arc::new(text.parse::<AtomicLevel>()?),
        })
    }
}

impl Default for LevelSetting {
    fn default() -> Self {
        LevelSetting::Atomic(AtomicLevel::new())
    }
}

impl From<LogLevel> for LevelSetting {
    fn from(level: LogLevel) -> Self {
        LevelSetting::Static(level)
    }
}

impl From<AtomicLevel> for LevelSetting {
    fn from(level: AtomicLevel) -> Self {
        LevelSetting::Atomic(level)
    }
}

impl fmt::Debug for LevelSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSetting::Static(level) => write!(f, "Static({})", level),
            LevelSetting::Atomic(level) => write!(f, "Atomic({})", level),
            LevelSetting::Named(text) => write!(f, "Named({:?})", text),
        }
    }
}

impl Serialize for LevelSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            LevelSetting::Static(level) => level.serialize(serializer),
            LevelSetting::Atomic(level) => level.serialize(serializer),
            LevelSetting::Named(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for LevelSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse::<AtomicLevel>()
            .map(LevelSetting::Atomic)
            .map_err(serde::de::Error::custom)
    }
}

/// Everything needed to assemble a standard logger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub level: LevelSetting,

    /// Stacktraces from Warn instead of Error
    pub development: bool,

    pub disable_caller: bool,

    pub disable_stacktrace: bool,

    /// Throttle repeated messages; `None` writes everything
    pub sampling: Option<SamplingConfig>,

    /// `"json"` or `"console"`
    pub encoding: String,

    pub encoder_config: EncoderConfig,

    /// Where entries go: `"stdout"`, `"stderr"` or file paths
    pub output_paths: Vec<String>,

    /// Where the logger reports its own write failures
    pub error_output_paths: Vec<String>,

    /// Context added to every entry, in key order
    pub initial_fields: BTreeMap<String, serde_json::Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: LevelSetting::default(),
            development: false,
            disable_caller: false,
            disable_stacktrace: false,
            sampling: None,
            encoding: "json".to_string(),
            encoder_config: EncoderConfig::production(),
            output_paths: vec!["stderr".to_string()],
            error_output_paths: vec!["stderr".to_string()],
            initial_fields: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Info and above as JSON on stderr, sampled at 100 then every 100th.
    pub fn production() -> Self {
        Self {
            level: LevelSetting::Atomic(AtomicLevel::new_at(LogLevel::Info)),
            sampling: Some(SamplingConfig::new(100, 100)),
            ..Self::default()
        }
    }

    /// Debug and above in console format on stderr, stacktraces from Warn.
    pub fn development() -> Self {
        Self {
            level: LevelSetting::Atomic(AtomicLevel::new_at(LogLevel::Debug)),
            development: true,
            encoding: "console".to_string(),
            encoder_config: EncoderConfig::development(),
            ..Self::default()
        }
    }

    /// The shared threshold a built logger follows, if the level is atomic.
    ///
    /// Loggers built from this config keep reading the same cell, so
    /// `set_level` on the returned handle changes them in place.
    pub fn atomic_level(&self) -> Option<&AtomicLevel> {
        match &self.level {
            LevelSetting::Atomic(level) => Some(level),
            _ => None,
        }
    }

    /// Assemble the logger, then apply `options` on top.
    ///
    /// Fails if the level text is unknown, the encoding has no encoder or
    /// an output path cannot be opened.
    pub fn build(&self, options: impl IntoIterator<Item = LoggerOption>) -> Result<Logger> {
        let enabler = self.level.resolve()?;
        let encoder = new_encoder(&self.encoding, self.encoder_config.clone())?;

        if let Some(sampling) = &self.sampling {
            if sampling.initial == 0 && sampling.thereafter == 0 {
                return Err(LoggerError::config(
                    "sampling",
                    "initial and thereafter cannot both be zero",
                ));
            }
        }

        let out = open_sinks(&self.output_paths)?;
        let error_out = open_sinks(&self.error_output_paths)?;

        let mut core: Arc<dyn Core> = Arc::new(IoCore::from_parts(Arc::from(encoder), out, enabler));
        if let Some(sampling) = &self.sampling {
            core = Arc::new(Sampler::new(core, sampling.clone()));
        }

        let mut built = vec![LoggerOption::ErrorOutput(error_out)];
        if !self.disable_caller {
            built.push(LoggerOption::AddCaller(true));
        }
        if !self.disable_stacktrace {
            let threshold = if self.development {
                LogLevel::Warn
            } else {
                LogLevel::Error
            };
            built.push(LoggerOption::AddStacktrace(threshold));
        }
        if !self.initial_fields.is_empty() {
            built.push(LoggerOption::Fields(self.initial_fields()));
        }

        Ok(Logger::new(core).with_options(built.into_iter().chain(options)))
    }

    fn initial_fields(&self) -> Vec<Field> {
        self.initial_fields
            .iter()
            .map(|(key, value)| Field::new(key.clone(), FieldValue::from(value.clone())))
            .collect()
    }
}
