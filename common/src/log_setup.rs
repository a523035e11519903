use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation, RollingFileAppender};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where and how verbosely a binary logs.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Filter used when `RUST_LOG` is unset, e.g. `"info"` or `"astrostack=debug"`.
    pub level: String,
    pub dir: PathBuf,
    pub file_prefix: String,
    /// Rotated files to keep.
    pub max_files: usize,
}

impl LogSettings {
    pub fn new(level: &str, dir: &Path, file_prefix: &str) -> Self {
        Self {
            level: level.to_string(),
            dir: dir.to_path_buf(),
            file_prefix: file_prefix.to_string(),
            max_files: 5,
        }
    }
}

/// Install console logging plus a daily-rolling log file.
///
/// WARN and above also go to stderr. Panics if called twice or if the log
/// directory cannot be created.
pub fn setup_logging(level: &str, dir: &Path, file_prefix: &str) {
    install(&LogSettings::new(level, dir, file_prefix));
}

pub fn install(settings: &LogSettings) {
    let filter = env_filter(&settings.level);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender(settings));
    if FILE_GUARD.set(guard).is_err() {
        panic!("Logging already initialized");
    }

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stdout.and(std::io::stderr.with_min_level(Level::WARN)));

    let file = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .unwrap_or_else(|e| panic!("Logger initialization failed: {}", e));
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|e| panic!("Invalid log filter {:?}: {}", level, e))
}

fn file_appender(settings: &LogSettings) -> RollingFileAppender {
    std::fs::create_dir_all(&settings.dir).unwrap_or_else(|e| {
        panic!("Failed to create log directory {:?}: {}", settings.dir, e)
    });
    Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(&settings.file_prefix)
        .filename_suffix("log")
        .max_log_files(settings.max_files)
        .build(&settings.dir)
        .unwrap_or_else(|e| panic!("Failed to create log file appender: {}", e))
}

/// Subscriber writing through the libtest capture. Only the first call installs it.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
