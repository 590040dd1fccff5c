//! Main logger implementation

use super::{
    encoder::EncoderConfig,
    error::{LoggerError, Result},
    field::Field,
    log_core::{Core, CoreTransform, IoCore, NopCore},
    log_entry::{Entry, EntryCaller},
    log_level::LogLevel,
    write_syncer::{AddSync, WriteSyncer},
};
use crate::encoders::JsonEncoder;
use chrono::{SecondsFormat, Utc};
use std::backtrace::Backtrace;
use std::fmt;
use std::io;
use std::panic::Location;
use std::sync::Arc;

/// What happens after a Fatal entry has been written and synced
#[derive(Clone)]
pub enum FatalHook {
    /// Terminate the process with this exit code
    Exit(i32),
    /// Panic with the entry's message
    Panic,
    /// Run a callback and return to the caller
    Custom(Arc<dyn Fn(&Entry) + Send + Sync>),
}

impl Default for FatalHook {
    fn default() -> Self {
        FatalHook::Exit(1)
    }
}

impl FatalHook {
    fn run(&self, entry: &Entry) {
        match self {
            FatalHook::Exit(code) => std::process::exit(*code),
            FatalHook::Panic => panic!("{}", entry.message),
            FatalHook::Custom(hook) => hook(entry),
        }
    }
}

impl fmt::Debug for FatalHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalHook::Exit(code) => write!(f, "Exit({})", code),
            FatalHook::Panic => f.write_str("Panic"),
            FatalHook::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Logger settings applied by [`Logger::with_options`]
#[derive(Clone, Debug)]
pub enum LoggerOption {
    /// Rewrite the core
    WrapCore(CoreTransform),
    /// Add context fields
    Fields(Vec<Field>),
    /// Where write failures are reported
    ErrorOutput(Arc<dyn WriteSyncer>),
    /// Record the file and line of each logging call
    AddCaller(bool),
    /// Attach a stacktrace to entries at this level and above
    AddStacktrace(LogLevel),
    OnFatal(FatalHook),
}

/// A fast, leveled, structured logger.
///
/// Loggers are cheap to clone and never change once built: [`with`],
/// [`named`] and [`with_options`] return new loggers and leave the
/// original as it was.
///
/// [`with`]: Logger::with
/// [`named`]: Logger::named
/// [`with_options`]: Logger::with_options
///
/// # Example
///
/// ```
/// use rust_structured_logger::prelude::*;
/// use std::time::Duration;
///
/// let logger = Logger::example();
/// logger
///     .info(
///         "failed to fetch URL",
///         &[
///             Field::string("url", "http://example.com"),
///             Field::int("attempt", 3),
///             Field::duration("backoff", Duration::from_secs(1)),
///         ],
///     )
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct Logger {
    core: Arc<dyn Core>,
    name: String,
    fields: Arc<Vec<Field>>,
    add_caller: bool,
    add_stack: Option<LogLevel>,
    error_output: Arc<dyn WriteSyncer>,
    on_fatal: FatalHook,
}

impl Logger {
    /// A logger writing through `core`, without caller or stacktrace
    /// capture, reporting its own failures on stderr.
    #[must_use]
    pub fn new(core: Arc<dyn Core>) -> Self {
        Self {
            core,
            name: String::new(),
            fields: Arc::new(Vec::new()),
            add_caller: false,
            add_stack: None,
            error_output: Arc::new(AddSync(io::stderr())),
            on_fatal: FatalHook::default(),
        }
    }

    /// A logger that writes nothing.
    ///
    /// Panic and Fatal entries still run their terminal action.
    #[must_use]
    pub fn nop() -> Self {
        Self::new(Arc::new(NopCore))
    }

    /// JSON on stdout at Debug level, with no timestamps, for examples
    /// and doctests whose output must not vary.
    #[must_use]
    pub fn example() -> Self {
        let config = EncoderConfig {
            message_key: "msg".to_string(),
            level_key: "level".to_string(),
            name_key: "logger".to_string(),
            ..EncoderConfig::default()
        };
        let core = IoCore::new(
            JsonEncoder::new(config),
            AddSync(io::stdout()),
            LogLevel::Debug,
        );
        Self::new(Arc::new(core))
    }

    /// Create a builder around `core`
    #[must_use]
    pub fn builder(core: Arc<dyn Core>) -> LoggerBuilder {
        LoggerBuilder::new(core)
    }

    /// A child logger that adds `fields` to every entry.
    #[must_use]
    pub fn with(&self, fields: &[Field]) -> Self {
        if fields.is_empty() {
            return self.clone();
        }

        let mut child = self.clone();
        child.core = self.core.with_fields(fields);
        let mut accumulated = Vec::with_capacity(self.fields.len() + fields.len());
        accumulated.extend(self.fields.iter().cloned());
        accumulated.extend(fields.iter().cloned());
        child.fields = Arc::new(accumulated);
        child
    }

    /// A child logger whose name gains `segment`, joined with a dot.
    ///
    /// ```
    /// use rust_structured_logger::Logger;
    ///
    /// let logger = Logger::nop().named("http").named("client");
    /// assert_eq!(logger.name(), "http.client");
    /// ```
    #[must_use]
    pub fn named(&self, segment: &str) -> Self {
        let mut child = self.clone();
        if segment.is_empty() {
            return child;
        }
        child.name = if self.name.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{}", self.name, segment)
        };
        child
    }

    #[must_use]
    pub fn with_options(&self, options: impl IntoIterator<Item = LoggerOption>) -> Self {
        let mut logger = self.clone();
        for option in options {
            logger = logger.apply(option);
        }
        logger
    }

    fn apply(mut self, option: LoggerOption) -> Self {
        match option {
            LoggerOption::WrapCore(transform) => {
                self.core = transform.apply(Arc::clone(&self.core));
            }
            LoggerOption::Fields(fields) => return self.with(&fields),
            LoggerOption::ErrorOutput(out) => self.error_output = out,
            LoggerOption::AddCaller(enabled) => self.add_caller = enabled,
            LoggerOption::AddStacktrace(level) => self.add_stack = Some(level),
            LoggerOption::OnFatal(hook) => self.on_fatal = hook,
        }
        self
    }

    /// Whether an entry at `level` would be processed at all.
    ///
    /// Panic and Fatal are always processed so their terminal action runs.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= LogLevel::Panic || self.core.enabled(level)
    }

    /// Admit an entry at `level` before any fields are built.
    ///
    /// Returns `None` when nothing would be written, so callers can skip
    /// the cost of building fields:
    ///
    /// ```
    /// use rust_structured_logger::prelude::*;
    ///
    /// let logger = Logger::nop();
    /// if let Some(entry) = logger.check(LogLevel::Debug, "cache state") {
    ///     entry.write(&[Field::int("entries", 1024)]).unwrap();
    /// }
    /// ```
    #[track_caller]
    pub fn check(&self, level: LogLevel, message: &str) -> Option<CheckedEntry> {
        self.check_with(level, || message.to_string())
    }

    /// Like [`check`](Logger::check), formatting the message only once the
    /// entry is admitted.
    #[track_caller]
    pub fn check_fmt(&self, level: LogLevel, args: fmt::Arguments<'_>) -> Option<CheckedEntry> {
        self.check_with(level, || fmt::format(args))
    }

    #[track_caller]
    fn check_with(&self, level: LogLevel, message: impl FnOnce() -> String) -> Option<CheckedEntry> {
        if !self.enabled(level) {
            return None;
        }

        let mut entry = Entry::new(level, message()).with_logger_name(self.name.as_str());
        if self.add_caller {
            entry.caller = Some(EntryCaller::from_location(Location::caller()));
        }

        let mut cores = Vec::new();
        Arc::clone(&self.core).check(&entry, &mut cores);

        let action = match level {
            LogLevel::Panic => Terminal::Panic,
            LogLevel::Fatal => Terminal::Fatal(self.on_fatal.clone()),
            _ if cores.is_empty() => return None,
            _ => Terminal::None,
        };

        if self.add_stack.is_some_and(|threshold| level >= threshold) {
            entry.stack = Some(Backtrace::force_capture().to_string());
        }

        Some(CheckedEntry {
            entry,
            cores,
            error_output: Arc::clone(&self.error_output),
            action,
        })
    }

    /// Log at `level`.
    ///
    /// Errors from the sinks are returned and also reported on the error
    /// output.
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: &str, fields: &[Field]) -> Result<()> {
        match self.check(level, message) {
            Some(entry) => entry.write(fields),
            None => Ok(()),
        }
    }

    #[track_caller]
    #[inline]
    pub fn debug(&self, message: &str, fields: &[Field]) -> Result<()> {
        self.log(LogLevel::Debug, message, fields)
    }

    #[track_caller]
    #[inline]
    pub fn info(&self, message: &str, fields: &[Field]) -> Result<()> {
        self.log(LogLevel::Info, message, fields)
    }

    #[track_caller]
    #[inline]
    pub fn warn(&self, message: &str, fields: &[Field]) -> Result<()> {
        self.log(LogLevel::Warn, message, fields)
    }

    #[track_caller]
    #[inline]
    pub fn error(&self, message: &str, fields: &[Field]) -> Result<()> {
        self.log(LogLevel::Error, message, fields)
    }

    /// Log, then panic with `message`.
    #[track_caller]
    pub fn panic(&self, message: &str, fields: &[Field]) -> Result<()> {
        self.log(LogLevel::Panic, message, fields)
    }

    /// Log, then run the fatal hook (by default, exit with status 1).
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: &[Field]) -> Result<()> {
        self.log(LogLevel::Fatal, message, fields)
    }

    /// Flush every sink reachable from this logger's core.
    pub fn sync(&self) -> Result<()> {
        self.core.sync()
    }

    pub fn core(&self) -> &Arc<dyn Core> {
        &self.core
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Context fields added so far, oldest first
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("core", &self.core.name())
            .field("fields", &self.fields.len())
            .field("add_caller", &self.add_caller)
            .field("add_stack", &self.add_stack)
            .field("on_fatal", &self.on_fatal)
            .finish()
    }
}

enum Terminal {
    None,
    Panic,
    Fatal(FatalHook),
}

/// An entry that passed the level and sampling checks, waiting for its
/// fields.
#[must_use = "a checked entry does nothing until written"]
pub struct CheckedEntry {
    entry: Entry,
    cores: Vec<Arc<dyn Core>>,
    error_output: Arc<dyn WriteSyncer>,
    action: Terminal,
}

impl CheckedEntry {
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Write to every admitted core, then run the terminal action for
    /// Panic and Fatal entries.
    pub fn write(self, fields: &[Field]) -> Result<()> {
        let errors = self
            .cores
            .iter()
            .filter_map(|core| core.write(&self.entry, fields).err())
            .collect();
        let result = LoggerError::combine(errors);

        if let Err(err) = &result {
            let line = format!(
                "{} write error: {}\n",
                Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                err
            );
            // nowhere left to report a failing error output
            let _ = self.error_output.write(line.as_bytes());
            let _ = self.error_output.sync();
        }

        match &self.action {
            Terminal::None => {}
            Terminal::Panic => panic!("{}", self.entry.message),
            Terminal::Fatal(hook) => hook.run(&self.entry),
        }
        result
    }
}

/// Builder for [`Logger`]
///
/// # Example
///
/// ```
/// use rust_structured_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder(Arc::new(NopCore))
///     .name("worker")
///     .add_caller(true)
///     .add_stacktrace(LogLevel::Error)
///     .build();
/// assert_eq!(logger.name(), "worker");
/// ```
pub struct LoggerBuilder {
    core: Arc<dyn Core>,
    name: String,
    options: Vec<LoggerOption>,
}

impl LoggerBuilder {
    pub fn new(core: Arc<dyn Core>) -> Self {
        Self {
            core,
            name: String::new(),
            options: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn fields(mut self, fields: Vec<Field>) -> Self {
        self.options.push(LoggerOption::Fields(fields));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn add_caller(mut self, enabled: bool) -> Self {
        self.options.push(LoggerOption::AddCaller(enabled));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn add_stacktrace(mut self, level: LogLevel) -> Self {
        self.options.push(LoggerOption::AddStacktrace(level));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_output(mut self, out: Arc<dyn WriteSyncer>) -> Self {
        self.options.push(LoggerOption::ErrorOutput(out));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn on_fatal(mut self, hook: FatalHook) -> Self {
        self.options.push(LoggerOption::OnFatal(hook));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn wrap_core(mut self, transform: CoreTransform) -> Self {
        self.options.push(LoggerOption::WrapCore(transform));
        self
    }

    pub fn build(self) -> Logger {
        Logger::new(self.core)
            .named(&self.name)
            .with_options(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MemorySink, Tee};
    use parking_lot::Mutex;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn json_config() -> EncoderConfig {
        EncoderConfig {
            level_key: "level".to_string(),
            name_key: "logger".to_string(),
            message_key: "msg".to_string(),
            caller_key: "caller".to_string(),
            stacktrace_key: "stacktrace".to_string(),
            ..EncoderConfig::default()
        }
    }

    fn memory_logger(level: LogLevel) -> (Logger, MemorySink) {
        let sink = MemorySink::new();
        let core = IoCore::new(JsonEncoder::new(json_config()), sink.clone(), level);
        (Logger::new(Arc::new(core)), sink)
    }

    struct FailingSink;

    impl WriteSyncer for FailingSink {
        fn write(&self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn sync(&self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_leveled_methods() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        logger.debug("hidden", &[]).unwrap();
        logger.info("shown", &[Field::int("n", 1)]).unwrap();
        logger.error("also shown", &[]).unwrap();

        assert_eq!(
            sink.lines(),
            vec![
                r#"{"level":"info","msg":"shown","n":1}"#,
                r#"{"level":"error","msg":"also shown"}"#,
            ]
        );
    }

    #[test]
    fn test_with_keeps_parent_unchanged() {
        let (logger, sink) = memory_logger(LogLevel::Debug);
        let child = logger.with(&[Field::string("request_id", "abc")]);
        child.info("child", &[]).unwrap();
        logger.info("parent", &[]).unwrap();

        assert_eq!(child.fields().len(), 1);
        assert!(logger.fields().is_empty());
        assert_eq!(
            sink.lines(),
            vec![
                r#"{"level":"info","msg":"child","request_id":"abc"}"#,
                r#"{"level":"info","msg":"parent"}"#,
            ]
        );
    }

    #[test]
    fn test_call_site_fields_follow_context() {
        let (logger, sink) = memory_logger(LogLevel::Debug);
        let logger = logger.with(&[Field::int("attempt", 1)]);
        logger.info("retry", &[Field::int("attempt", 2)]).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&sink.lines()[0]).unwrap();
        assert_eq!(parsed["attempt"], 2);
    }

    #[test]
    fn test_named() {
        let (logger, sink) = memory_logger(LogLevel::Debug);
        logger.info("unnamed", &[]).unwrap();
        logger.named("a").named("").named("b").info("named", &[]).unwrap();

        assert_eq!(
            sink.lines(),
            vec![
                r#"{"level":"info","msg":"unnamed"}"#,
                r#"{"level":"info","logger":"a.b","msg":"named"}"#,
            ]
        );
    }

    #[test]
    fn test_check_skips_disabled_levels() {
        let (logger, sink) = memory_logger(LogLevel::Warn);
        assert!(logger.check(LogLevel::Info, "nope").is_none());

        let checked = logger.check(LogLevel::Warn, "yes").unwrap();
        assert_eq!(checked.entry().level, LogLevel::Warn);
        checked.write(&[]).unwrap();
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn test_caller_is_the_logging_call() {
        let (logger, sink) = memory_logger(LogLevel::Debug);
        let logger = logger.with_options([LoggerOption::AddCaller(true)]);
        let line = line!() + 1;
        logger.info("here", &[]).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&sink.lines()[0]).unwrap();
        let caller = parsed["caller"].as_str().unwrap();
        assert!(caller.ends_with(&format!("logger.rs:{}", line)), "{}", caller);
    }

    #[test]
    fn test_stacktrace_threshold() {
        let (logger, sink) = memory_logger(LogLevel::Debug);
        let logger = logger.with_options([LoggerOption::AddStacktrace(LogLevel::Error)]);
        logger.warn("no stack", &[]).unwrap();
        logger.error("with stack", &[]).unwrap();

        let lines = sink.lines();
        assert!(!lines[0].contains("stacktrace"));
        let parsed: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert!(parsed["stacktrace"].is_string());
    }

    #[test]
    fn test_write_errors_are_returned_and_reported() {
        let errors = MemorySink::new();
        let core = IoCore::new(JsonEncoder::new(json_config()), FailingSink, LogLevel::Debug);
        let logger = Logger::new(Arc::new(core))
            .with_options([LoggerOption::ErrorOutput(Arc::new(errors.clone()))]);

        let err = logger.info("lost", &[]).unwrap_err();
        assert!(err.to_string().contains("disk full"));

        let reported = errors.lines();
        assert_eq!(reported.len(), 1);
        assert!(reported[0].contains(" write error: "));
        assert!(reported[0].contains("disk full"));
        assert_eq!(errors.sync_count(), 1);
    }

    #[test]
    fn test_panic_writes_before_panicking() {
        let (logger, sink) = memory_logger(LogLevel::Debug);
        let result = catch_unwind(AssertUnwindSafe(|| logger.panic("gave up", &[])));

        let payload = result.unwrap_err();
        assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("gave up"));
        assert_eq!(sink.lines(), vec![r#"{"level":"panic","msg":"gave up"}"#]);
        assert_eq!(sink.sync_count(), 1);
    }

    #[test]
    fn test_panic_runs_even_when_disabled() {
        let logger = Logger::nop();
        let result = catch_unwind(AssertUnwindSafe(|| logger.panic("still panics", &[])));
        assert!(result.is_err());
    }

    #[test]
    fn test_fatal_runs_hook_after_write() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let hook_seen = Arc::clone(&seen);
        let (logger, sink) = memory_logger(LogLevel::Debug);
        let logger = logger.with_options([LoggerOption::OnFatal(FatalHook::Custom(Arc::new(
            move |entry: &Entry| hook_seen.lock().push(entry.message.clone()),
        )))]);

        logger.fatal("shutting down", &[]).unwrap();
        assert_eq!(sink.lines().len(), 1);
        assert_eq!(sink.sync_count(), 1);
        assert_eq!(*seen.lock(), vec!["shutting down".to_string()]);
    }

    #[test]
    fn test_wrap_core_leaves_original() {
        let (logger, sink) = memory_logger(LogLevel::Debug);
        let silent = logger.with_options([LoggerOption::WrapCore(CoreTransform::Replace(
            Arc::new(NopCore),
        ))]);
        let doubled = logger.with_options([LoggerOption::WrapCore(CoreTransform::Repeat(2))]);

        silent.info("dropped", &[]).unwrap();
        doubled.info("twice", &[]).unwrap();
        logger.info("once", &[]).unwrap();

        assert_eq!(sink.lines().len(), 3);
        assert_eq!(doubled.core().name(), "tee");
        assert_eq!(logger.core().name(), "io");
    }

    #[test]
    fn test_builder() {
        let sink = MemorySink::new();
        let core = IoCore::new(JsonEncoder::new(json_config()), sink.clone(), LogLevel::Info);
        let tee: Arc<dyn Core> = Arc::new(Tee::new(vec![Arc::new(core)]));
        let logger = Logger::builder(tee)
            .name("svc")
            .fields(vec![Field::bool("canary", true)])
            .build();

        logger.info("up", &[]).unwrap();
        assert_eq!(
            sink.lines(),
            vec![r#"{"level":"info","logger":"svc","msg":"up","canary":true}"#]
        );
        assert!(format!("{:?}", logger).contains("svc"));
    }

    #[test]
    fn test_sync_reaches_sinks() {
        let (logger, sink) = memory_logger(LogLevel::Info);
        logger.sync().unwrap();
        assert_eq!(sink.sync_count(), 1);
    }
}
