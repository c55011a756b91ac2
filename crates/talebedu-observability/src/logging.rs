use std::path::Path;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::basic_logging::{default_env_filter, init_basic_console_logging};
use crate::metrics::is_observability_enabled;

/// Initialize the tracing subscriber.
///
/// Always logs to the console (stderr). When `LOG_DIR` is set, also writes
/// daily-rotated files: `talebedu-sync.log` for errors and
/// `talebedu-sync.json` for structured info-level events.
///
/// Falls back to [`init_basic_console_logging`] when `OBSERVABILITY_ENABLED`
/// is false.
pub fn init_tracing() {
    if !is_observability_enabled() {
        init_basic_console_logging();
        return;
    }

    let console_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(default_env_filter())
        .boxed();

    let mut layers: Vec<BoxedLayer> = vec![console_layer];

    let log_dir = std::env::var("LOG_DIR").ok().filter(|dir| !dir.is_empty());
    if let Some(dir) = log_dir.as_deref() {
        match std::fs::create_dir_all(dir) {
            Ok(()) => layers.extend(file_layers(Path::new(dir))),
            Err(e) => {
                eprintln!("Failed to create log directory {dir}: {e}. Logging to console only");
            }
        }
    }

    let result = tracing_subscriber::registry().with(layers).try_init();

    match result {
        Ok(()) => match log_dir {
            Some(dir) => info!(log_dir = %dir, "Tracing initialized with file logging"),
            None => info!("Tracing initialized (console only)"),
        },
        Err(_) => eprintln!("Tracing subscriber already installed, keeping the existing one"),
    }
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn file_layers(dir: &Path) -> [BoxedLayer; 2] {
    // Plain file for errors
    let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "talebedu-sync.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_filter(EnvFilter::new("error"))
        .boxed();

    // JSON file for structured logs
    let json_appender = RollingFileAppender::new(Rotation::DAILY, dir, "talebedu-sync.json");
    let json_layer = fmt::layer()
        .json()
        .with_writer(json_appender)
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"))
        .boxed();

    [file_layer, json_layer]
}
