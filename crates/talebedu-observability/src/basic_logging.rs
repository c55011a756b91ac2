use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set: `LOG_LEVEL` (default "info") for
/// our crates, warn for noisy dependencies.
pub(crate) fn default_env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::new(format!(
            "talebedu={level},talebedu_sync={level},talebedu_cache={level},talebedu_db={level},reqwest=warn,hyper=warn,sqlx=warn",
            level = log_level
        ))
    })
}

/// Initialize basic console logging when observability is disabled.
///
/// # Configuration
///
/// - **Log Level**: `RUST_LOG`, falling back to `LOG_LEVEL` (default: "info")
/// - **Format**: Compact format with ANSI colors, written to stderr so
///   command output on stdout stays clean
pub fn init_basic_console_logging() {
    let console_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_filter(default_env_filter());

    if tracing_subscriber::registry()
        .with(console_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Tracing subscriber already installed, keeping the existing one");
    }
}
