//! Cores: where level filtering, encoding and writing meet
//!
//! A [`Core`] decides whether an entry is wanted and, if so, turns it into
//! bytes on a sink. Cores are immutable and shared as `Arc<dyn Core>`;
//! adding fields, teeing or sampling always builds a new core around the
//! existing one.

use super::encoder::Encoder;
use super::error::{LoggerError, Result};
use super::field::Field;
use super::log_entry::Entry;
use super::log_level::{LevelEnabler, LogLevel};
use super::sampling::{Sampler, SamplingConfig};
use super::write_syncer::WriteSyncer;
use std::sync::Arc;

/// The minimal, fast interface behind a [`Logger`](super::logger::Logger).
pub trait Core: Send + Sync {
    /// Whether entries at `level` could be written by this core.
    fn enabled(&self, level: LogLevel) -> bool;

    /// A new core with `fields` added to its context.
    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Core>;

    /// Add every core that should write `entry` to `selected`.
    ///
    /// Decorators either add themselves, delegate to what they wrap, or add
    /// nothing when they reject the entry.
    fn check(self: Arc<Self>, entry: &Entry, selected: &mut Vec<Arc<dyn Core>>);

    /// Encode and write an entry that passed [`check`](Core::check).
    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()>;

    /// Flush buffered output.
    fn sync(&self) -> Result<()>;

    fn name(&self) -> &str;
}

/// Binds one encoder, one sink and one level filter.
pub struct IoCore {
    enabler: Arc<dyn LevelEnabler>,
    encoder: Arc<dyn Encoder>,
    out: Arc<dyn WriteSyncer>,
}

impl IoCore {
    /// # Example
    ///
    /// ```
    /// use rust_structured_logger::core::{EncoderConfig, IoCore, LogLevel, MemorySink};
    /// use rust_structured_logger::encoders::JsonEncoder;
    ///
    /// let sink = MemorySink::new();
    /// let core = IoCore::new(JsonEncoder::new(EncoderConfig::production()), sink.clone(), LogLevel::Info);
    /// ```
    pub fn new<E, W, L>(encoder: E, out: W, enabler: L) -> Self
    where
        E: Encoder + 'static,
        W: WriteSyncer + 'static,
        L: LevelEnabler + 'static,
    {
        Self::from_parts(Arc::new(encoder), Arc::new(out), Arc::new(enabler))
    }

    pub fn from_parts(
        encoder: Arc<dyn Encoder>,
        out: Arc<dyn WriteSyncer>,
        enabler: Arc<dyn LevelEnabler>,
    ) -> Self {
        Self {
            enabler,
            encoder,
            out,
        }
    }
}

impl Core for IoCore {
    #[inline]
    fn enabled(&self, level: LogLevel) -> bool {
        self.enabler.enabled(level)
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Core> {
        Arc::new(Self {
            enabler: Arc::clone(&self.enabler),
            encoder: Arc::from(self.encoder.with_fields(fields)),
            out: Arc::clone(&self.out),
        })
    }

    fn check(self: Arc<Self>, entry: &Entry, selected: &mut Vec<Arc<dyn Core>>) {
        if self.enabled(entry.level) {
            selected.push(self);
        }
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        let written = self.encoder.encode_entry(entry, fields).and_then(|line| {
            self.out
                .write(&line)
                .map(|_| ())
                .map_err(|e| LoggerError::io_operation("writing log entry", "sink rejected the write", e))
        });

        // Panic and Fatal entries may be the last thing the process writes;
        // sync them even when the write failed
        if entry.level > LogLevel::Error {
            let synced = self.sync();
            return LoggerError::combine(written.err().into_iter().chain(synced.err()).collect());
        }
        written
    }

    fn sync(&self) -> Result<()> {
        self.out
            .sync()
            .map_err(|e| LoggerError::io_operation("syncing sink", "flush failed", e))
    }

    fn name(&self) -> &str {
        "io"
    }
}

/// Sends every entry to several cores.
///
/// Each child applies its own level filter, encoder and sink. Writes and
/// syncs reach every child even when some fail; the failures are combined.
pub struct Tee {
    children: Vec<Arc<dyn Core>>,
}

impl Tee {
    pub fn new(children: Vec<Arc<dyn Core>>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Arc<dyn Core>] {
        &self.children
    }
}

/// Tee `cores` together, without a wrapper when there are fewer than two.
pub fn tee(mut cores: Vec<Arc<dyn Core>>) -> Arc<dyn Core> {
    match cores.len() {
        0 => Arc::new(NopCore),
        1 => cores.remove(0),
        _ => Arc::new(Tee::new(cores)),
    }
}

impl Core for Tee {
    fn enabled(&self, level: LogLevel) -> bool {
        self.children.iter().any(|child| child.enabled(level))
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Core> {
        Arc::new(Self {
            children: self
                .children
                .iter()
                .map(|child| child.with_fields(fields))
                .collect(),
        })
    }

    fn check(self: Arc<Self>, entry: &Entry, selected: &mut Vec<Arc<dyn Core>>) {
        for child in &self.children {
            Arc::clone(child).check(entry, selected);
        }
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        let errors = self
            .children
            .iter()
            .filter_map(|child| child.write(entry, fields).err())
            .collect();
        LoggerError::combine(errors)
    }

    fn sync(&self) -> Result<()> {
        let errors = self
            .children
            .iter()
            .filter_map(|child| child.sync().err())
            .collect();
        LoggerError::combine(errors)
    }

    fn name(&self) -> &str {
        "tee"
    }
}

/// A core that is never enabled and writes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopCore;

impl Core for NopCore {
    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }

    fn with_fields(&self, _fields: &[Field]) -> Arc<dyn Core> {
        Arc::new(NopCore)
    }

    fn check(self: Arc<Self>, _entry: &Entry, _selected: &mut Vec<Arc<dyn Core>>) {}

    fn write(&self, _entry: &Entry, _fields: &[Field]) -> Result<()> {
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "nop"
    }
}

/// Raises the minimum level of a wrapped core.
///
/// It can only make a core stricter: an entry must pass both this filter
/// and the wrapped core's own.
pub struct LevelFilterCore {
    inner: Arc<dyn Core>,
    min: LogLevel,
}

impl LevelFilterCore {
    pub fn new(inner: Arc<dyn Core>, min: LogLevel) -> Self {
        Self { inner, min }
    }
}

impl Core for LevelFilterCore {
    fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min && self.inner.enabled(level)
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Core> {
        Arc::new(Self {
            inner: self.inner.with_fields(fields),
            min: self.min,
        })
    }

    fn check(self: Arc<Self>, entry: &Entry, selected: &mut Vec<Arc<dyn Core>>) {
        if entry.level >= self.min {
            Arc::clone(&self.inner).check(entry, selected);
        }
    }

    fn write(&self, entry: &Entry, fields: &[Field]) -> Result<()> {
        self.inner.write(entry, fields)
    }

    fn sync(&self) -> Result<()> {
        self.inner.sync()
    }

    fn name(&self) -> &str {
        "level_filter"
    }
}

/// A named rewrite of a logger's core
#[derive(Clone)]
pub enum CoreTransform {
    /// Leave the core as it is
    Nop,
    /// Swap in a different core
    Replace(Arc<dyn Core>),
    /// Also write to these cores
    Tee(Vec<Arc<dyn Core>>),
    /// Write every entry `n` times through the same core
    Repeat(usize),
    /// Throttle repeated messages
    Sample(SamplingConfig),
    /// Drop entries below a level
    IncreaseLevel(LogLevel),
}

impl CoreTransform {
    /// Build the transformed core. `core` itself is left untouched.
    pub fn apply(&self, core: Arc<dyn Core>) -> Arc<dyn Core> {
        match self {
            CoreTransform::Nop => core,
            CoreTransform::Replace(replacement) => Arc::clone(replacement),
            CoreTransform::Tee(extra) => {
                let mut cores = Vec::with_capacity(extra.len() + 1);
                cores.push(core);
                cores.extend(extra.iter().cloned());
                tee(cores)
            }
            CoreTransform::Repeat(n) => tee(std::iter::repeat(core).take(*n).collect()),
            CoreTransform::Sample(config) => Arc::new(Sampler::new(core, config.clone())),
            CoreTransform::IncreaseLevel(level) => Arc::new(LevelFilterCore::new(core, *level)),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CoreTransform::Nop => "nop",
            CoreTransform::Replace(_) => "replace",
            CoreTransform::Tee(_) => "tee",
            CoreTransform::Repeat(_) => "repeat",
            CoreTransform::Sample(_) => "sample",
            CoreTransform::IncreaseLevel(_) => "increase_level",
        }
    }
}

impl std::fmt::Debug for CoreTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreTransform::Repeat(n) => write!(f, "Repeat({})", n),
            CoreTransform::Sample(config) => write!(f, "Sample({:?})", config),
            CoreTransform::IncreaseLevel(level) => write!(f, "IncreaseLevel({:?})", level),
            other => f.write_str(other.name()),
        }
    }
}
