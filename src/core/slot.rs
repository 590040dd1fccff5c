//! A shared, replaceable logger
//!
//! Components that need "the application logger" take a `LoggerSlot`
//! instead of reaching for a process-wide global. Whoever owns the slot
//! can swap the logger for everyone holding it.

use super::logger::Logger;
use parking_lot::RwLock;
use std::sync::Arc;

/// Holds a [`Logger`] that can be read and replaced from any thread.
///
/// Clones share the same slot.
///
/// # Example
///
/// ```
/// use rust_structured_logger::{Logger, LoggerSlot};
///
/// let slot = LoggerSlot::new(Logger::nop());
/// {
///     let _guard = slot.replace_scoped(Logger::nop().named("test"));
///     assert_eq!(slot.get().name(), "test");
/// }
/// assert_eq!(slot.get().name(), "");
/// ```
#[derive(Debug, Clone)]
pub struct LoggerSlot {
    logger: Arc<RwLock<Logger>>,
}

impl LoggerSlot {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger: Arc::new(RwLock::new(logger)),
        }
    }

    /// The current logger
    pub fn get(&self) -> Logger {
        self.logger.read().clone()
    }

    /// Install `logger` and return the one it replaced.
    pub fn replace(&self, logger: Logger) -> Logger {
        std::mem::replace(&mut *self.logger.write(), logger)
    }

    /// Install `logger` until the returned guard is dropped.
    #[must_use = "the previous logger is restored as soon as the guard is dropped"]
    pub fn replace_scoped(&self, logger: Logger) -> SlotGuard {
        let previous = self.replace(logger);
        SlotGuard {
            slot: Arc::clone(&self.logger),
            previous: Some(previous),
        }
    }
}

impl Default for LoggerSlot {
    fn default() -> Self {
        Self::new(Logger::nop())
    }
}

/// RAII guard that puts the previous logger back into its slot on drop.
pub struct SlotGuard {
    slot: Arc<RwLock<Logger>>,
    previous: Option<Logger>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.slot.write() = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_replace_returns_previous() {
        let slot = LoggerSlot::new(Logger::nop().named("first"));
        let previous = slot.replace(Logger::nop().named("second"));
        assert_eq!(previous.name(), "first");
        assert_eq!(slot.get().name(), "second");
    }

    #[test]
    fn test_scoped_replacement_restores() {
        let slot = LoggerSlot::default();
        {
            let _guard = slot.replace_scoped(Logger::nop().named("scoped"));
            assert_eq!(slot.get().name(), "scoped");
        }
        assert_eq!(slot.get().name(), "");
    }

    #[test]
    fn test_clones_share_the_slot() {
        let slot = LoggerSlot::default();
        let shared = slot.clone();

        thread::spawn(move || {
            shared.replace(Logger::nop().named("from-thread"));
        })
        .join()
        .unwrap();

        assert_eq!(slot.get().name(), "from-thread");
    }
}
