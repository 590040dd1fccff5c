//! Core logger types and traits

pub mod atomic_level;
pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod log_core;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod sampling;
pub mod slot;
pub mod timestamp;
pub mod write_syncer;

pub use atomic_level::AtomicLevel;
pub use config::{Config, LevelSetting};
pub use encoder::{CallerEncoder, Encoder, EncoderConfig, LevelEncoder, Primitive};
pub use error::{LoggerError, Result};
pub use field::{Field, FieldValue, MarshalLog};
pub use log_core::{tee, Core, CoreTransform, IoCore, LevelFilterCore, NopCore, Tee};
pub use log_entry::{Entry, EntryCaller};
pub use log_level::{LevelEnabler, LevelEnablerFn, LogLevel};
pub use logger::{CheckedEntry, FatalHook, Logger, LoggerBuilder, LoggerOption};
pub use sampling::{Sampler, SamplerMetrics, SamplingConfig};
pub use slot::{LoggerSlot, SlotGuard};
pub use timestamp::{format_duration, DurationEncoder, TimeEncoder};
pub use write_syncer::{
    open_sinks, AddSync, FileSyncer, Lock, MemorySink, MultiWriteSyncer, WriteSyncer,
};
