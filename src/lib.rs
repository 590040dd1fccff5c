//! # Rust Structured Logger
//!
//! Leveled, structured logging built from small composable parts.
//!
//! ## Features
//!
//! - **Structured**: typed key/value fields, encoded as JSON or as
//!   human-friendly console lines
//! - **Composable**: cores bind an encoder, a sink and a level filter, and
//!   can be teed together or wrapped in a sampler
//! - **Cheap when disabled**: [`Logger::check`] and the macros skip all
//!   formatting and field construction for filtered levels
//! - **Thread Safe**: loggers are immutable and cheap to clone; levels can
//!   be changed at runtime through [`AtomicLevel`]
//!
//! ## Quick start
//!
//! ```
//! use rust_structured_logger::prelude::*;
//! use rust_structured_logger::info;
//!
//! let sink = MemorySink::new();
//! let core = IoCore::new(JsonEncoder::new(EncoderConfig::production()), sink.clone(), LogLevel::Info);
//! let logger = Logger::new(std::sync::Arc::new(core)).named("api");
//!
//! info!(logger, "listening on port {}", 8080; Field::string("scheme", "https"));
//! assert!(sink.contents().contains(r#""msg":"listening on port 8080","scheme":"https""#));
//! ```

pub mod core;
pub mod encoders;
pub mod macros;

pub mod prelude {
    pub use crate::core::{
        AtomicLevel, Config, Core, CoreTransform, Entry, EncoderConfig, FatalHook, Field,
        FieldValue, IoCore, LevelEnabler, LogLevel, Logger, LoggerError, LoggerOption,
        LoggerSlot, MemorySink, NopCore, Result, SamplingConfig, WriteSyncer,
    };
    pub use crate::encoders::{ConsoleEncoder, JsonEncoder};
}

pub use crate::core::{
    AtomicLevel, CheckedEntry, Config, Core, CoreTransform, Encoder, EncoderConfig, Entry,
    FatalHook, Field, FieldValue, IoCore, LevelEnabler, LevelEnablerFn, LogLevel, Logger,
    LoggerBuilder, LoggerError, LoggerOption, LoggerSlot, MarshalLog, NopCore, Result, Sampler,
    SamplingConfig, Tee, WriteSyncer,
};
pub use encoders::{ConsoleEncoder, JsonEncoder};
