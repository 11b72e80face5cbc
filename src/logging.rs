use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_FILE_PREFIX: &str = "clubrisk.log";

/// File logging for the TUI. The terminal owns stdout/stderr while the
/// dashboard is up, so there is no console layer. Keep the guard alive for
/// the lifetime of the process or buffered lines are lost.
pub fn init_file_logging(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("create log dir {}", log_dir.display()))?;

    // The builder reports an unwritable log file as an error; `rolling::daily`
    // panics on it.
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
        .with_context(|| format!("open log file in {}", log_dir.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,clubrisk_terminal=debug,reqwest=warn"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("install tracing subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use chrono::Utc;

    use super::{LOG_FILE_PREFIX, init_file_logging};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("clubrisk-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("scratch dir should be creatable");
        dir
    }

    #[test]
    fn blocked_log_file_is_an_error() {
        let dir = scratch_dir("blocked-log");
        // Daily files are named `<prefix>.<YYYY-MM-DD>` in UTC. Occupy today's
        // (and tomorrow's, in case the test straddles midnight) with directories.
        let today = Utc::now().date_naive();
        for day in [today, today.succ_opt().unwrap_or(today)] {
            let name = format!("{LOG_FILE_PREFIX}.{}", day.format("%Y-%m-%d"));
            fs::create_dir_all(dir.join(name)).expect("blocking dir should be creatable");
        }

        let result = init_file_logging(&dir);
        assert!(result.is_err());
        let msg = format!("{:#}", result.err().expect("error checked above"));
        assert!(msg.contains("open log file"), "unexpected error: {msg}");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn log_dir_that_is_a_file_is_an_error() {
        let dir = scratch_dir("file-as-dir");
        let not_a_dir = dir.join("occupied");
        fs::write(&not_a_dir, "x").expect("file should be writable");

        let result = init_file_logging(&not_a_dir);
        assert!(result.is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
