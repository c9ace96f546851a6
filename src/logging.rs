use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Route tracing output to a log file so it never draws over the TUI.
///
/// `RUST_LOG` wins over the configured level; `verbose` forces debug.
/// The returned guard flushes pending lines on drop and must outlive the program's work.
pub fn init(log_path: &Path, level: &str, verbose: bool) -> std::io::Result<WorkerGuard> {
    let dir = log_path.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = log_path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("contentplanner.log"));

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = if verbose {
        EnvFilter::new("contentplanner=debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(format!("contentplanner={}", level)))
            .unwrap_or_else(|_| EnvFilter::new("contentplanner=info"))
    };

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(filter)
        .try_init();

    Ok(guard)
}
