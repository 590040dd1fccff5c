//! Output sinks
//!
//! A [`WriteSyncer`] is where encoded lines end up. Every implementation is
//! safe to share between threads and never interleaves two writes.

use super::error::{LoggerError, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A byte sink that can be flushed to durable storage.
pub trait WriteSyncer: Send + Sync {
    /// Write all of `buf` as one unit.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Flush anything buffered.
    fn sync(&self) -> io::Result<()>;
}

impl std::fmt::Debug for dyn WriteSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WriteSyncer(..)")
    }
}

impl<T: WriteSyncer + ?Sized> WriteSyncer for Arc<T> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn sync(&self) -> io::Result<()> {
        (**self).sync()
    }
}

/// Adapts a writer that already serializes its own writes, such as
/// [`io::Stdout`], [`io::Stderr`] or [`File`].
///
/// `sync` only flushes user-space buffering.
#[derive(Debug)]
pub struct AddSync<W>(pub W);

impl<W> WriteSyncer for AddSync<W>
where
    W: Send + Sync,
    for<'a> &'a W: Write,
{
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (&self.0).write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        (&self.0).flush()
    }
}

/// Wraps any writer in a mutex so concurrent writes never interleave.
#[derive(Debug)]
pub struct Lock<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> Lock<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W: Write + Send> WriteSyncer for Lock<W> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// A file opened for appending; `sync` reaches the disk.
#[derive(Debug)]
pub struct FileSyncer {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSyncer {
    /// Open `path` for appending, creating it if missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::sink_open(path.display().to_string(), e))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WriteSyncer for FileSyncer {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.file.lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        match self.file.lock().sync_all() {
            // character devices and pipes cannot be fsynced
            Err(e) if matches!(e.kind(), io::ErrorKind::InvalidInput | io::ErrorKind::Unsupported) => {
                Ok(())
            }
            other => other,
        }
    }
}

/// Duplicates every write to several sinks.
///
/// Every sink is attempted even when an earlier one fails; the failures are
/// reported together.
pub struct MultiWriteSyncer {
    sinks: Vec<Arc<dyn WriteSyncer>>,
}

impl MultiWriteSyncer {
    pub fn new(sinks: Vec<Arc<dyn WriteSyncer>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn for_each(&self, mut op: impl FnMut(&dyn WriteSyncer) -> io::Result<()>) -> io::Result<()> {
        let mut errors: Vec<io::Error> = self
            .sinks
            .iter()
            .filter_map(|sink| op(sink.as_ref()).err())
            .collect();

        if errors.len() <= 1 {
            return errors.pop().map_or(Ok(()), Err);
        }
        let message = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Err(io::Error::other(message))
    }
}

impl WriteSyncer for MultiWriteSyncer {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.for_each(|sink| sink.write(buf).map(|_| ()))?;
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        self.for_each(|sink| sink.sync())
    }
}

/// An in-memory sink whose clones share one buffer.
///
/// Handy for tests and for capturing output to inspect later.
///
/// ```
/// use rust_structured_logger::core::{MemorySink, WriteSyncer};
///
/// let sink = MemorySink::new();
/// let handle = sink.clone();
/// sink.write(b"first\nsecond\n").unwrap();
/// assert_eq!(handle.lines(), vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
    syncs: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Number of times `sync` was called
    pub fn sync_count(&self) -> usize {
        self.syncs.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.buf.lock().clear();
    }
}

impl WriteSyncer for MemorySink {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn sync(&self) -> io::Result<()> {
        self.syncs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Open every path and combine them into one sink.
///
/// `"stdout"` and `"stderr"` (also spelled `/dev/stdout`, `/dev/stderr`)
/// name the standard streams; anything else is a file opened for appending.
/// Paths that lead to the same place are opened once. No paths at all gives
/// a sink that discards everything.
pub fn open_sinks<S: AsRef<str>>(paths: &[S]) -> Result<Arc<dyn WriteSyncer>> {
    let mut sinks = resolve_sinks(paths)?;
    Ok(match sinks.len() {
        0 => Arc::new(AddSync(io::sink())),
        1 => sinks.remove(0),
        _ => Arc::new(MultiWriteSyncer::new(sinks)),
    })
}

fn resolve_sinks<S: AsRef<str>>(paths: &[S]) -> Result<Vec<Arc<dyn WriteSyncer>>> {
    let mut seen = HashSet::new();
    let mut sinks: Vec<Arc<dyn WriteSyncer>> = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        match path {
            "stdout" | "/dev/stdout" => {
                if seen.insert(PathBuf::from("stdout")) {
                    sinks.push(Arc::new(AddSync(io::stdout())));
                }
            }
            "stderr" | "/dev/stderr" => {
                if seen.insert(PathBuf::from("stderr")) {
                    sinks.push(Arc::new(AddSync(io::stderr())));
                }
            }
            _ => {
                let file = FileSyncer::open(path)?;
                let key = fs::canonicalize(path).map_err(|e| LoggerError::sink_open(path, e))?;
                if seen.insert(key) {
                    sinks.push(Arc::new(file));
                }
            }
        }
    }

    Ok(sinks)
}
