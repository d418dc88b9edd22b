use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "vocab-trainer.log";

/// Keeps the background file writer alive. Dropping it flushes pending lines.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Installs the global subscriber: events on stderr and, when `log_dir` is
/// set, a daily rolling plain-text file. Only the binary calls this.
pub fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> Option<FileLogGuard> {
    let opened = log_dir.map(|dir| (dir, open_file_writer(dir)));
    let (file_writer, guard, failure) = match opened {
        Some((_, Ok((writer, guard)))) => (Some(writer), Some(FileLogGuard { _guard: guard }), None),
        Some((dir, Err(err))) => (None, None, Some((dir, err))),
        None => (None, None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(file_writer.map(|writer| fmt::layer().with_writer(writer).with_ansi(false)))
        .init();

    if let Some((dir, err)) = failure {
        tracing::warn!(dir = %dir.display(), error = %err, "file logging disabled");
    }
    guard
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_file_writer(dir: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}
