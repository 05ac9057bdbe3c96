//! Log subscriber installation and runtime verbosity.
//!
//! [`init`] installs the process-wide `tracing` subscriber once. Its filter
//! sits behind a `reload` layer and its output goes through a switchable
//! sink, so [`set_level`] and [`set_target`] apply to a running driver.

use parking_lot::{Mutex, MutexGuard};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload::{self, Handle};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use tux_common::config::LogLevel;

/// Errors raised while configuring logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// [`init`] already ran, or another subscriber is installed.
    #[error("Log subscriber already installed")]
    AlreadyInstalled,

    /// [`init`] has not run.
    #[error("Log subscriber not installed")]
    NotInstalled,

    /// The filter could not be swapped.
    #[error("Log filter reload failed: {0}")]
    Reload(String),

    /// The log file could not be opened.
    #[error("Cannot open log file {path}: {reason}")]
    File {
        /// File path.
        path: PathBuf,
        /// OS error.
        reason: String,
    },
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogTarget {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
    /// Appended to a file.
    File(PathBuf),
}

/// Line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

enum Sink {
    Stdout,
    Stderr,
    File(File),
}

impl Sink {
    fn open(target: &LogTarget) -> Result<Self, LoggingError> {
        Ok(match target {
            LogTarget::Stdout => Sink::Stdout,
            LogTarget::Stderr => Sink::Stderr,
            LogTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| LoggingError::File {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                Sink::File(file)
            }
        })
    }
}

#[derive(Clone)]
struct SinkWriter(Arc<Mutex<Sink>>);

struct SinkGuard<'a>(MutexGuard<'a, Sink>);

impl Write for SinkGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *self.0 {
            Sink::Stdout => io::stdout().write(buf),
            Sink::Stderr => io::stderr().write(buf),
            Sink::File(file) => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.0 {
            Sink::Stdout => io::stdout().flush(),
            Sink::Stderr => io::stderr().flush(),
            Sink::File(file) => file.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for SinkWriter {
    type Writer = SinkGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        SinkGuard(self.0.lock())
    }
}

struct Logging {
    filter: Handle<EnvFilter, Registry>,
    sink: Arc<Mutex<Sink>>,
}

static LOGGING: OnceLock<Logging> = OnceLock::new();

/// `RUST_LOG` directives with `level` as the baseline.
fn filter_for(level: Level) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(level.into())
}

/// Install the global subscriber.
///
/// # Errors
/// [`LoggingError::AlreadyInstalled`] on a second call or when another
/// subscriber owns the process, [`LoggingError::File`] when `target` is a
/// file that cannot be opened.
pub fn init(level: Level, format: LogFormat, target: &LogTarget) -> Result<(), LoggingError> {
    if LOGGING.get().is_some() {
        return Err(LoggingError::AlreadyInstalled);
    }
    let sink = Arc::new(Mutex::new(Sink::open(target)?));
    let writer = SinkWriter(Arc::clone(&sink));
    let (filter, handle) = reload::Layer::new(filter_for(level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_ansi(false).with_writer(writer))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
    };
    installed.map_err(|_| LoggingError::AlreadyInstalled)?;

    LOGGING
        .set(Logging {
            filter: handle,
            sink,
        })
        .map_err(|_| LoggingError::AlreadyInstalled)
}

fn installed() -> Result<&'static Logging, LoggingError> {
    LOGGING.get().ok_or(LoggingError::NotInstalled)
}

/// Change the verbosity of the installed subscriber.
///
/// # Errors
/// [`LoggingError::NotInstalled`] before [`init`].
pub fn set_level(level: LogLevel) -> Result<(), LoggingError> {
    installed()?
        .filter
        .reload(filter_for(level.into()))
        .map_err(|e| LoggingError::Reload(e.to_string()))
}

/// Redirect the installed subscriber's output.
///
/// # Errors
/// [`LoggingError::NotInstalled`] before [`init`], [`LoggingError::File`]
/// when the file cannot be opened. The previous target stays in place on
/// error.
pub fn set_target(target: &LogTarget) -> Result<(), LoggingError> {
    let logging = installed()?;
    let sink = Sink::open(target)?;
    *logging.sink.lock() = sink;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_log_file_is_reported() {
        let target = LogTarget::File(PathBuf::from("/nonexistent-dir/tux/driver.log"));
        assert!(matches!(
            Sink::open(&target),
            Err(LoggingError::File { .. })
        ));
    }

    #[test]
    fn standard_streams_always_open() {
        assert!(matches!(Sink::open(&LogTarget::Stdout), Ok(Sink::Stdout)));
        assert!(matches!(Sink::open(&LogTarget::Stderr), Ok(Sink::Stderr)));
    }
}
