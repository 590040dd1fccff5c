//! Stress tests for concurrent logging
//!
//! These tests verify:
//! - Entries from many threads never interleave
//! - Level changes are visible across threads
//! - Sampling counts stay exact under contention
//! - Filtered macro calls never evaluate their arguments

use rust_structured_logger::core::{
    AtomicLevel, Core, EncoderConfig, Field, IoCore, LogLevel, Logger, MemorySink, Sampler,
    SamplingConfig,
};
use rust_structured_logger::encoders::JsonEncoder;
use rust_structured_logger::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const THREADS: usize = 8;
const PER_THREAD: usize = 500;

fn json_config() -> EncoderConfig {
    EncoderConfig {
        message_key: "msg".to_string(),
        level_key: "level".to_string(),
        ..EncoderConfig::default()
    }
}

/// Every line written concurrently to a shared sink is a whole JSON object
#[test]
fn test_concurrent_writes_stay_whole() {
    let sink = MemorySink::new();
    let core = IoCore::new(JsonEncoder::new(json_config()), sink.clone(), LogLevel::Info);
    let logger = Logger::new(Arc::new(core));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = logger.with(&[Field::uint("thread", t as u64)]);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..PER_THREAD {
                    logger
                        .info("tick", &[Field::uint("i", i as u64), Field::string("pad", "x".repeat(64))])
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let lines = sink.lines();
    assert_eq!(lines.len(), THREADS * PER_THREAD);

    let mut seen = HashSet::new();
    for line in &lines {
        let entry: Value = serde_json::from_str(line).expect("interleaved line");
        let key = (entry["thread"].as_u64().unwrap(), entry["i"].as_u64().unwrap());
        assert!(seen.insert(key), "duplicate entry {:?}", key);
    }
}

/// Concurrent writes through a file sink never interleave either
#[test]
fn test_concurrent_file_writes() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("stress.log");

    let mut config = rust_structured_logger::Config::production();
    config.sampling = None;
    config.output_paths = vec![log_file.display().to_string()];
    config.error_output_paths = Vec::new();
    let logger = config.build([]).expect("Failed to build logger");

    thread::scope(|scope| {
        for t in 0..THREADS {
            let logger = &logger;
            scope.spawn(move || {
                for i in 0..PER_THREAD {
                    info!(logger, "worker {} step {}", t, i);
                }
            });
        }
    });
    logger.sync().unwrap();

    let content = std::fs::read_to_string(&log_file).unwrap();
    let count = content
        .lines()
        .inspect(|line| {
            serde_json::from_str::<Value>(line).expect("interleaved line");
        })
        .count();
    assert_eq!(count, THREADS * PER_THREAD);
}

/// A level change on one thread is seen by loggers on every other thread
#[test]
fn test_atomic_level_across_threads() {
    let level = AtomicLevel::new_at(LogLevel::Error);
    let sink = MemorySink::new();
    let core = IoCore::new(JsonEncoder::new(json_config()), sink.clone(), level.clone());
    let logger = Logger::new(Arc::new(core));

    let before = Arc::new(Barrier::new(THREADS + 1));
    let after = Arc::new(Barrier::new(THREADS + 1));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let logger = logger.clone();
            let (before, after) = (Arc::clone(&before), Arc::clone(&after));
            thread::spawn(move || {
                assert!(!logger.enabled(LogLevel::Debug));
                before.wait();
                after.wait();
                assert!(logger.enabled(LogLevel::Debug));
                logger.debug("now visible", &[]).unwrap();
            })
        })
        .collect();

    before.wait();
    level.set_level(LogLevel::Debug);
    after.wait();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(sink.lines().len(), THREADS);
}

/// Contended sampling still admits exactly the configured occurrences
#[test]
fn test_sampler_under_contention() {
    let sink = MemorySink::new();
    let io = IoCore::new(JsonEncoder::new(json_config()), sink.clone(), LogLevel::Debug);
    let config = SamplingConfig::new(10, 100).with_tick(Duration::from_secs(3600));
    let sampler = Arc::new(Sampler::new(Arc::new(io), config));
    let logger = Logger::new(Arc::clone(&sampler) as Arc<dyn Core>);

    // the first occurrence starts the tick before any contention
    logger.info("hot path", &[]).unwrap();

    thread::scope(|scope| {
        for _ in 0..THREADS {
            let logger = logger.clone();
            scope.spawn(move || {
                for _ in 0..PER_THREAD {
                    logger.info("hot path", &[]).unwrap();
                }
            });
        }
    });

    // the first 10 occurrences pass, then 110, 210, 310 and so on
    let total = (THREADS * PER_THREAD) as u64 + 1;
    let expected = 10 + (total - 10) / 100;
    assert_eq!(sink.lines().len() as u64, expected);
    assert_eq!(sampler.metrics().total_count(), total);
    assert_eq!(sampler.metrics().sampled_count(), expected);
    assert_eq!(sampler.metrics().dropped_count(), total - expected);
}

/// Filtered macro calls skip formatting and field construction entirely
#[test]
fn test_disabled_macro_is_free() {
    let sink = MemorySink::new();
    let core = IoCore::new(JsonEncoder::new(json_config()), sink.clone(), LogLevel::Info);
    let logger = Logger::new(Arc::new(core));
    let evaluated = Arc::new(AtomicUsize::new(0));

    thread::scope(|scope| {
        for _ in 0..THREADS {
            let (logger, evaluated) = (&logger, &evaluated);
            scope.spawn(move || {
                for _ in 0..PER_THREAD {
                    debug!(logger, "state {}", evaluated.fetch_add(1, Ordering::SeqCst);
                        Field::uint("n", evaluated.fetch_add(1, Ordering::SeqCst) as u64));
                }
            });
        }
    });

    assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    assert!(sink.contents().is_empty());
}
