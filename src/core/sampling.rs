//! Log sampling for high-volume scenarios
//!
//! A [`Sampler`] wraps a core and caps how often the same message is
//! written. Within each tick the first `initial` occurrences of a message
//! pass, then only every `thereafter`-th one. Counters start over when the
//! tick elapses.
//!
//! # Example
//!
//! ```
//! use rust_structured_logger::core::{
//!     Core, EncoderConfig, Entry, IoCore, LogLevel, MemorySink, Sampler, SamplingConfig,
//! };
//! use rust_structured_logger::encoders::JsonEncoder;
//! use std::sync::Arc;
//!
//! let sink = MemorySink::new();
//! let io = IoCore::new(JsonEncoder::new(EncoderConfig::production()), sink.clone(), LogLevel::Debug);
//! let sampler = Arc::new(Sampler::new(Arc::new(io), SamplingConfig::new(1, 0)));
//!
//! let entry = Entry::new(LogLevel::Info, "cache miss");
//! let mut selected = Vec::new();
//! Arc::clone(&sampler).check(&entry, &mut selected);
//! Arc::clone(&sampler).check(&entry, &mut selected);
//! assert_eq!(selected.len(), 1);
//! ```

use super::error::Result;
use super::field::Field;
use super::log_core::Core;
use super::log_entry::Entry;
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const COUNTER_SLOTS: usize = 4096;

/// Sampling thresholds
///
/// Defaults to 100 initial entries, then every 100th, per one-second tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    /// Entries per message and tick that always pass
    pub initial: u64,

    /// After `initial`, pass every `thereafter`-th entry; 0 drops them all
    pub thereafter: u64,

    /// Counter lifetime
    #[serde(skip, default = "default_tick")]
    pub tick: Duration,
}

fn default_tick() -> Duration {
    Duration::from_secs(1)
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self::new(100, 100)
    }
}

impl SamplingConfig {
    pub fn new(initial: u64, thereafter: u64) -> Self {
        Self {
            initial,
            thereafter,
            tick: default_tick(),
        }
    }

    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Whether occurrence `n` (1-based) within a tick passes
    #[inline]
    pub fn admits(&self, n: u64) -> bool {
        n <= self.initial || (self.thereafter > 0 && (n - self.initial) % self.thereafter == 0)
    }
}

/// Counts of sampling decisions
///
/// Shared between a sampler and every core derived from it through
/// [`Core::with_fields`].
#[derive(Debug, Default)]
pub struct SamplerMetrics {
    sampled_count: AtomicU64,
    dropped_count: AtomicU64,
    total_count: AtomicU64,
}

impl SamplerMetrics {
    pub const fn new() -> Self {
        Self {
            sampled_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            total_count: AtomicU64::new(0),
        }
    }

    /// Entries let through to the wrapped core
    #[inline]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_count(&self) -> u64 {
        self.total_count.load(Ordering::Relaxed)
    }

    #[inline]
    fn record(&self, sampled: bool) {
        let counter = if sampled {
            &self.sampled_count
        } else {
            &self.dropped_count
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of entries that passed, 1.0 before anything was seen
    pub fn effective_sample_rate(&self) -> f64 {
        match self.total_count() {
            0 => 1.0,
            total => self.sampled_count() as f64 / total as f64,
        }
    }
}

#[derive(Debug, Default)]
struct Counter {
    reset_at: AtomicI64,
    count: AtomicU64,
}

impl Counter {
    /// Count one occurrence at `now` and return the count within the
    /// current tick, starting a new tick if the last one has expired.
    fn inc_check_reset(&self, now: i64, tick: i64) -> u64 {
        let reset_after = self.reset_at.load(Ordering::SeqCst);
        if reset_after > now {
            return self.count.fetch_add(1, Ordering::SeqCst) + 1;
        }

        self.count.store(1, Ordering::SeqCst);
        let next_reset = now.saturating_add(tick);
        if self
            .reset_at
            .compare_exchange(reset_after, next_reset, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // lost the race: someone else started this tick
            return self.count.fetch_add(1, Ordering::SeqCst) + 1;
        }
        1
    }
}

struct Counters {
    slots: Box<[Counter]>,
}

impl Counters {
    fn new() -> Self {
        Self {
            slots: (0..COUNTER_SLOTS).map(|_| Counter::default()).collect(),
        }
    }

    fn get(&self, key: &str) -> &Counter {
        &self.slots[fnv32a(key) as usize % COUNTER_SLOTS]
    }
}

/// FNV-1a, 32 bit
fn fnv32a(key: &str) -> u32 {
    const OFFSET: u32 = 2_166_136_261;
    const PRIME: u32 = 16_777_619;

    key.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(PRIME))
}

/// A core that drops repetitive entries before they reach the wrapped core.
///
/// Entries are told apart by message text only. Counting is lock-free and
/// approximate: hash collisions and races may let slightly more or fewer
/// entries through than the exact rule would.
pub struct Sampler {
    inner: Arc<dyn Core>,
    config: SamplingConfig,
    tick_nanos: i64,
    counters: Arc<Counters>,
    metrics: Arc<SamplerMetrics>,
}

impl Sampler {
    pub fn new(inner: Arc<dyn Core>, config: SamplingConfig) -> Self {
        let tick_nanos = i64::try_from(config.tick.as_nanos()).unwrap_or(i64::MAX);
        Self {
            inner,
            config,
            tick_nanos,
            counters: Arc::new(Counters::new()),
            metrics: Arc::new(SamplerMetrics::new()),
        }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }

    fn admit(&self, entry: &Entry) -> bool {
        let now = entry.timestamp.timestamp_nanos_opt().unwrap_or(0);
        let n = self
            .counters
            .get(&entry.message)
            .inc_check_reset(now, self.tick_nanos);
        let sampled = self.config.admits(n);
        self.metrics.record(sampled);
        sampled
    }
}

impl Core for Sampler {
    fn enabled(&self, level: LogLevel) -> bool {
        self.inner.enabled(level)
    }

    fn with_fields(&self, fields: &[Field]) -> Arc<dyn Core> {
        Arc::new(Self {
            inner: self.inner.with_fields(fields),
            config: self.config.clone(),
            tick_nanos: self.tick_nanos,
            counters: Arc::clone(&self.counters),
            metrics: Arc::clone(&self.metrics),
        })
    }

    fn check(self: Arc<Self>, entry: &Entry, selected: &mut Vec<Arc<dyn Core>>) {
        if !self.enabled(entry.level) {
            return;
        }
        if self.admit(entry) {
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
        "sampler"
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EncoderConfig, IoCore, MemorySink};
    use crate::encoders::JsonEncoder;
    use chrono::{DateTime, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap()
    }

    fn sampled_core(config: SamplingConfig) -> (Arc<Sampler>, MemorySink) {
        let sink = MemorySink::new();
        let io = IoCore::new(
            JsonEncoder::new(EncoderConfig {
                message_key: "msg".to_string(),
                ..EncoderConfig::default()
            }),
            sink.clone(),
            LogLevel::Debug,
        );
        (Arc::new(Sampler::new(Arc::new(io), config)), sink)
    }

    fn log(core: &Arc<Sampler>, entry: &Entry) {
        let mut selected = Vec::new();
        Arc::clone(core).check(entry, &mut selected);
        for c in selected {
            c.write(entry, &[]).unwrap();
        }
    }

    #[test]
    fn test_admits_rule() {
        let config = SamplingConfig::new(2, 100);
        let passed: Vec<u64> = (1..=250).filter(|n| config.admits(*n)).collect();
        assert_eq!(passed, vec![1, 2, 102, 202]);

        let config = SamplingConfig::new(3, 0);
        assert!(config.admits(3));
        assert!(!config.admits(4));
        assert!(!config.admits(1000));
    }

    #[test]
    fn test_initial_then_thereafter() {
        let (core, sink) = sampled_core(SamplingConfig::new(2, 100));
        let entry = Entry::new(LogLevel::Info, "repeated").with_timestamp(start());

        for _ in 0..201 {
            log(&core, &entry);
        }

        assert_eq!(sink.lines().len(), 3);
        assert_eq!(core.metrics().sampled_count(), 3);
        assert_eq!(core.metrics().dropped_count(), 198);
    }

    #[test]
    fn test_two_hundred_five_occurrences_write_four() {
        let (core, sink) = sampled_core(SamplingConfig::new(2, 100));
        let entry = Entry::new(LogLevel::Info, "repeated").with_timestamp(start());

        let mut written_at = Vec::new();
        for n in 1..=205 {
            let before = sink.lines().len();
            log(&core, &entry);
            if sink.lines().len() > before {
                written_at.push(n);
            }
        }

        assert_eq!(written_at, vec![1, 2, 102, 202]);
        assert_eq!(core.metrics().sampled_count(), 4);
        assert_eq!(core.metrics().dropped_count(), 201);
    }

    #[test]
    fn test_messages_are_counted_separately() {
        let (core, sink) = sampled_core(SamplingConfig::new(1, 0));
        let ts = start();

        log(&core, &Entry::new(LogLevel::Info, "a").with_timestamp(ts));
        log(&core, &Entry::new(LogLevel::Info, "a").with_timestamp(ts));
        log(&core, &Entry::new(LogLevel::Info, "b").with_timestamp(ts));
        // level is not part of the key
        log(&core, &Entry::new(LogLevel::Error, "b").with_timestamp(ts));

        assert_eq!(sink.lines(), vec![r#"{"msg":"a"}"#, r#"{"msg":"b"}"#]);
    }

    #[test]
    fn test_counts_reset_after_tick() {
        let config = SamplingConfig::new(1, 0).with_tick(Duration::from_millis(10));
        let (core, sink) = sampled_core(config);
        let ts = start();

        log(&core, &Entry::new(LogLevel::Info, "tick").with_timestamp(ts));
        log(&core, &Entry::new(LogLevel::Info, "tick").with_timestamp(ts));
        let later = ts + chrono::Duration::milliseconds(11);
        log(&core, &Entry::new(LogLevel::Info, "tick").with_timestamp(later));

        assert_eq!(sink.lines().len(), 2);
    }

    #[test]
    fn test_with_fields_shares_counters() {
        let (core, sink) = sampled_core(SamplingConfig::new(1, 0));
        let child = core.with_fields(&[Field::int("worker", 1)]);
        let entry = Entry::new(LogLevel::Info, "shared").with_timestamp(start());

        log(&core, &entry);
        let mut selected = Vec::new();
        child.check(&entry, &mut selected);
        assert!(selected.is_empty());
        assert_eq!(sink.lines().len(), 1);
        assert_eq!(core.metrics().total_count(), 2);
    }

    #[test]
    fn test_disabled_levels_are_not_counted() {
        let sink = MemorySink::new();
        let io = IoCore::new(
            JsonEncoder::new(EncoderConfig::production()),
            sink,
            LogLevel::Warn,
        );
        let core = Arc::new(Sampler::new(Arc::new(io), SamplingConfig::new(1, 0)));
        let mut selected = Vec::new();
        Arc::clone(&core).check(&Entry::new(LogLevel::Debug, "skip"), &mut selected);
        assert_eq!(core.metrics().total_count(), 0);
        assert_eq!(core.metrics().effective_sample_rate(), 1.0);
    }

    #[test]
    fn test_fnv32a_known_values() {
        assert_eq!(fnv32a(""), 0x811c_9dc5);
        assert_eq!(fnv32a("a"), 0xe40c_292c);
    }

    #[test]
    fn test_config_deserialize() {
        let config: SamplingConfig =
            serde_json::from_str(r#"{"initial": 5, "thereafter": 50}"#).unwrap();
        assert_eq!(config, SamplingConfig::new(5, 50));
        assert_eq!(config.tick, Duration::from_secs(1));
    }
}
