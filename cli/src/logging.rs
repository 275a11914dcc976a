//! Logging initialization: logs go only to a file (or are dropped), never to the console.
//!
//! When `LOG_FILE` is set, logs are appended to that file; otherwise they are dropped so
//! stdout carries only the answer.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Installs the global subscriber.
///
/// - **RUST_LOG**: filter, e.g. `info`, `stageloop=debug`. Default: `info`.
/// - **LOG_FILE**: append plain-text logs here.
pub fn init() -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper_util=off,reqwest=warn"));

    match std::env::var("LOG_FILE") {
        Ok(path) if !path.trim().is_empty() => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_filter(filter);
            let _ = tracing_subscriber::registry().with(file_layer).try_init();
            tracing::info!(path = %path, "stageloop logging to file");
        }
        _ => {
            let sink_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::sink)
                .with_filter(filter);
            let _ = tracing_subscriber::registry().with(sink_layer).try_init();
        }
    }
    Ok(())
}
