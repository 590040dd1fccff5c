//! Logging macros with `format!`-style messages.
//!
//! Every macro takes a logger, a format string with its arguments and,
//! after a `;`, any number of fields. Nothing after the logger is
//! evaluated unless the level is enabled, so expensive arguments and
//! fields cost nothing when filtered out.
//!
//! Write failures are already reported on the logger's error output, so
//! the macros discard them. Call the [`Logger`](crate::Logger) methods
//! directly to handle them.
//!
//! # Examples
//!
//! ```
//! use rust_structured_logger::prelude::*;
//! use rust_structured_logger::{info, warn};
//!
//! let logger = Logger::example();
//!
//! // Basic logging
//! info!(logger, "server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "listening on port {}", port);
//!
//! // With fields
//! warn!(logger, "retrying request"; Field::int("attempt", 3), Field::string("host", "db-1"));
//! ```

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::example();
/// use rust_structured_logger::log;
/// log!(logger, LogLevel::Info, "simple message");
/// log!(logger, LogLevel::Error, "error code: {}", 500);
/// log!(logger, LogLevel::Warn, "slow query"; Field::float("seconds", 2.5));
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $fmt:literal $(, $arg:expr)* $(,)? ; $($field:expr),* $(,)?) => {{
        let logger: &$crate::Logger = &$logger;
        let level: $crate::LogLevel = $level;
        if logger.enabled(level) {
            if let ::std::option::Option::Some(entry) =
                logger.check_fmt(level, ::std::format_args!($fmt $(, $arg)*))
            {
                let _ = entry.write(&[$($field),*]);
            }
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        let level: $crate::LogLevel = $level;
        if logger.enabled(level) {
            if let ::std::option::Option::Some(entry) =
                logger.check_fmt(level, ::std::format_args!($($arg)+))
            {
                let _ = entry.write(&[]);
            }
        }
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::example();
/// use rust_structured_logger::debug;
/// debug!(logger, "cache warmed");
/// debug!(logger, "entries: {}", 10; Field::bool("cold", false));
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::example();
/// use rust_structured_logger::info;
/// info!(logger, "application started");
/// info!(logger, "processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::example();
/// use rust_structured_logger::warn;
/// warn!(logger, "low disk space");
/// warn!(logger, "retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::example();
/// use rust_structured_logger::error;
/// error!(logger, "failed to connect to database");
/// error!(logger, "request failed"; Field::int("status", 500));
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message, then run the logger's fatal hook.
///
/// With the default hook the process exits with status 1.
///
/// # Examples
///
/// ```no_run
/// # use rust_structured_logger::prelude::*;
/// # let logger = Logger::example();
/// use rust_structured_logger::fatal;
/// fatal!(logger, "unable to recover: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
