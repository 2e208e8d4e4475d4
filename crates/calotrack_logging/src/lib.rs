//! Shared logging setup for calotrack binaries.
//!
//! Two sinks: a size-rolled file under `$CALOTRACK_HOME/logs` that always
//! records at the `RUST_LOG`/default level, and stderr whose level follows the
//! task debug level. Stdout stays free for JSON output.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "calotrack=info,calotrack_protocol=info";
const KEEP_ROLLED_FILES: usize = 4;
const MAX_LOG_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Logging configuration shared by calotrack binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Force debug output on the console regardless of `debug_level`
    pub verbose: bool,
    /// Task debug level: 0 info, 1 debug, 2+ trace
    pub debug_level: i32,
}

/// Console directive for a task debug level.
pub fn console_directive(debug_level: i32) -> &'static str {
    match debug_level {
        i32::MIN..=0 => "calotrack=info,calotrack_protocol=warn",
        1 => "calotrack=debug,calotrack_protocol=debug",
        _ => "calotrack=trace,calotrack_protocol=trace",
    }
}

/// Initialize tracing with a rolling file writer and stderr output.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = ensure_logs_dir().context("Failed to ensure log directory")?;
    let file_writer = SharedLogWriter::open(&log_dir, config.app_name)
        .context("Failed to initialize rolling log writer")?;

    let file_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let console_filter = if std::env::var_os("RUST_LOG").is_some() {
        file_filter.clone()
    } else if config.verbose {
        EnvFilter::new(console_directive(1))
    } else {
        EnvFilter::new(console_directive(config.debug_level))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(())
}

/// calotrack home directory: `$CALOTRACK_HOME` or `~/.calotrack`.
pub fn calotrack_home() -> PathBuf {
    if let Some(override_path) = std::env::var_os("CALOTRACK_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".calotrack")
}

/// Logs directory: `<home>/logs`
pub fn logs_dir() -> PathBuf {
    calotrack_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

/// Append-only log file that rolls to `<name>.log.1 .. <name>.log.N` once it
/// grows past `limit` bytes. The oldest roll is dropped.
struct RollingLog {
    dir: PathBuf,
    stem: String,
    keep: usize,
    limit: u64,
    file: Option<File>,
    written: u64,
}

impl RollingLog {
    fn open(dir: &Path, app_name: &str, keep: usize, limit: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut log = Self {
            dir: dir.to_path_buf(),
            stem: file_stem(app_name),
            keep,
            limit,
            file: None,
            written: 0,
        };
        log.reopen()?;
        if log.written > log.limit {
            log.roll()?;
        }
        Ok(log)
    }

    fn active_path(&self) -> PathBuf {
        self.dir.join(format!("{}.log", self.stem))
    }

    fn rolled_path(&self, generation: usize) -> PathBuf {
        self.dir.join(format!("{}.log.{}", self.stem, generation))
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.active_path())?;
        self.written = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn roll(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            let _ = file.flush();
        }

        if self.keep == 0 {
            fs::remove_file(self.active_path()).or_else(ignore_missing)?;
            return self.reopen();
        }

        fs::remove_file(self.rolled_path(self.keep)).or_else(ignore_missing)?;
        for generation in (1..self.keep).rev() {
            let from = self.rolled_path(generation);
            if from.exists() {
                fs::rename(&from, self.rolled_path(generation + 1))?;
            }
        }
        let active = self.active_path();
        if active.exists() {
            fs::rename(&active, self.rolled_path(1))?;
        }

        self.reopen()
    }
}

fn ignore_missing(err: io::Error) -> io::Result<()> {
    if err.kind() == io::ErrorKind::NotFound {
        Ok(())
    } else {
        Err(err)
    }
}

impl Write for RollingLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.limit {
            self.roll()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let n = file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// `MakeWriter` handle over one shared [`RollingLog`].
#[derive(Clone)]
struct SharedLogWriter {
    inner: Arc<Mutex<RollingLog>>,
}

impl SharedLogWriter {
    fn open(dir: &Path, app_name: &str) -> Result<Self> {
        let log = RollingLog::open(dir, app_name, KEEP_ROLLED_FILES, MAX_LOG_FILE_SIZE)
            .with_context(|| format!("Failed to open log file for {}", app_name))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(log)),
        })
    }

    fn with_log<T>(&self, op: impl FnOnce(&mut RollingLog) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        op(&mut guard)
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogWriter {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_log(|log| log.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_log(|log| log.flush())
    }
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "calotrack".to_string()
    } else {
        stem
    }
}
