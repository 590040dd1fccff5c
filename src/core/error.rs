//! Errors raised while building loggers and writing entries

use std::fmt;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A sink write or sync failed
    #[error("IO error while {operation}: {message}: {source}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Filesystem failure outside a sink operation
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A value could not be turned into JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Level text that does not name a known level
    #[error("unrecognized level: '{0}'")]
    UnrecognizedLevel(String),

    /// Encoding name with no registered encoder
    #[error("no encoder registered for name '{0}'")]
    UnknownEncoding(String),

    /// Output path that could not be opened
    #[error("couldn't open sink '{path}': {source}")]
    SinkOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A build option that cannot be honored
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Several independent failures, e.g. from a tee or a multi-sink
    #[error("{}", DisplayAll(.0))]
    Multiple(Vec<LoggerError>),

    /// Anything else
    #[error("{0}")]
    Other(String),
}

struct DisplayAll<'a>(&'a [LoggerError]);

impl fmt::Display for DisplayAll<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl LoggerError {
    /// Wrap an I/O failure with what was being attempted
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Reject a setting of `component`
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a sink open error
    pub fn sink_open(path: impl Into<String>, source: std::io::Error) -> Self {
        LoggerError::SinkOpen {
            path: path.into(),
            source,
        }
    }

    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Fold a list of failures into a single result.
    ///
    /// No errors is `Ok(())`, one error is returned as-is, and more than one
    /// is wrapped in [`LoggerError::Multiple`] in the order given. Nested
    /// `Multiple` values are flattened.
    pub fn combine(errors: Vec<LoggerError>) -> Result<()> {
        let mut flat = Vec::with_capacity(errors.len());
        for err in errors {
            match err {
                LoggerError::Multiple(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => Ok(()),
            1 => Err(flat.remove(0)),
            _ => Err(LoggerError::Multiple(flat)),
        }
    }

    /// Number of underlying failures this error stands for
    pub fn count(&self) -> usize {
        match self {
            LoggerError::Multiple(errors) => errors.len(),
            _ => 1,
        }
    }
}
