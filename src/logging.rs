use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "streaming_catalog=debug,info";

/// Console output on stderr plus a JSON file rotated daily under `config.dir`.
///
/// Hold the returned guard until exit so buffered file output is flushed.
/// A second call keeps the first subscriber and only warns.
pub fn init_logging(config: &LoggingConfig) -> WorkerGuard {
    if let Err(e) = std::fs::create_dir_all(&config.dir) {
        eprintln!("Cannot create log directory '{}': {}", config.dir, e);
    }

    let file_appender = tracing_appender::rolling::daily(&config.dir, "catalog.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();
    if installed.is_err() {
        tracing::warn!("Logging already initialized; keeping the existing subscriber");
    }
    guard
}
