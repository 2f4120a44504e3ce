use std::fs::OpenOptions;

use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Environment variable naming an optional debug log file
pub const LOG_FILE_ENV: &str = "BULLCHAT_LOG_FILE";

pub fn init_tracing() {
    init_tracing_with_service("bullchat");
}

/// Install the global subscriber.
///
/// stderr gets WARN and above (or whatever `RUST_LOG` asks for). When
/// `BULLCHAT_LOG_FILE` is set, a second layer appends DEBUG output there.
pub fn init_tracing_with_service(service_name: &str) {
    let stderr_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file = std::env::var(LOG_FILE_ENV).ok().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(&log_path) {
            Ok(file) => Some((log_path, file)),
            Err(e) => {
                eprintln!("Cannot open log file {log_path}: {e}");
                None
            }
        }
    });

    let result = if let Some((log_path, file)) = file {
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_filter(LevelFilter::DEBUG);
        let result = registry.with(file_layer).try_init();
        tracing::debug!(service = service_name, path = %log_path, "file logging enabled");
        result
    } else {
        registry.try_init()
    };

    // A subscriber installed earlier (tests, embedding host) wins.
    if result.is_err() {
        tracing::debug!(service = service_name, "tracing already initialized");
    }
}
