//! Logging and observability helpers.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "qorefeed.log";
const LOG_RETENTION_DAYS: u64 = 14;
const LOG_DIR_ENV: &str = "QOREFEED_LOG_DIR";
const DEFAULT_FILTER: &str = "qorefeed=info";

/// Installs the JSON file subscriber and a panic hook that logs panics.
///
/// `dir` overrides the log directory; otherwise `QOREFEED_LOG_DIR` or
/// `~/.qorefeed/logs` is used. Returns the directory logs are written to.
pub fn init_tracing(dir: Option<&Path>) -> PathBuf {
    let log_dir = dir.map(Path::to_path_buf).unwrap_or_else(log_directory);
    let _ = fs::create_dir_all(&log_dir);

    // 1. Clean up old logs
    if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    // 2. Setup file appender
    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // 3. Setup subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .json()
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    // 4. Register panic hook
    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("PANIC: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("PANIC: {}", s)
        } else {
            "PANIC: unknown cause".to_string()
        };

        tracing::error!(target: "panic", location = %location, message = %msg, "Feed engine panicked");

        previous_hook(panic_info);
    }));

    tracing::info!("Tracing initialized. Logs directory: {:?}", log_dir);
    log_dir
}

fn log_directory() -> PathBuf {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    let home = if cfg!(windows) {
        std::env::var_os("USERPROFILE")
    } else {
        std::env::var_os("HOME")
    };
    let mut path = PathBuf::from(home.unwrap_or_default());
    path.push(".qorefeed");
    path.push("logs");
    path
}

/// Removes `.log` files older than `retention_days`. Returns how many were removed.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let retention_duration = Duration::from_secs(retention_days * 24 * 60 * 60);
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();

        let is_log = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with(LOG_FILE_PREFIX) || name.ends_with(".log"))
            .unwrap_or(false);
        if !is_log || !path.is_file() {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|metadata| metadata.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());
        if let Some(age) = age {
            if age > retention_duration {
                match fs::remove_file(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => eprintln!("Failed to remove old log file {:?}: {}", path, e),
                }
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_keeps_fresh_logs_and_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("qorefeed.log.2026-01-01"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let removed = cleanup_old_logs(dir.path(), LOG_RETENTION_DAYS).unwrap();
        assert_eq!(removed, 0);
        assert!(dir.path().join("qorefeed.log.2026-01-01").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn zero_retention_removes_only_log_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("qorefeed.log.2026-01-01"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();
        std::thread::sleep(Duration::from_millis(20));

        let removed = cleanup_old_logs(dir.path(), 0).unwrap();
        assert_eq!(removed, 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn cleanup_of_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cleanup_old_logs(&dir.path().join("absent"), 1).is_err());
    }
}
