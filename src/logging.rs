use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::{ChurnError, Result};

/// Initialize structured logging system
///
/// Returns the appender guard when file logging is enabled; the caller must
/// keep it alive for the lifetime of the process or buffered lines are lost.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ChurnError::InvalidConfig(format!("Failed to create log filter: {e}")))?;

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    // Console layer
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true);
    if config.format == "json" {
        layers.push(console_layer.json().boxed());
    } else {
        layers.push(console_layer.boxed());
    }

    // File layer if a log file is configured
    let mut guard = None;
    if let Some(file_path) = config.file_path.as_deref() {
        let path = Path::new(file_path);
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let prefix = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("churn.log");
        let file_appender = rolling::daily(directory, prefix);
        let (non_blocking_appender, appender_guard) = non_blocking(file_appender);
        guard = Some(appender_guard);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .json();
        layers.push(file_layer.boxed());
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| ChurnError::Other(format!("Failed to set global subscriber: {e}")))?;

    info!("Logging system initialized");
    Ok(guard)
}

/// Performance timing utilities
pub struct OperationTimer {
    operation: String,
    start: std::time::Instant,
    finished: bool,
}

impl OperationTimer {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: std::time::Instant::now(),
            finished: false,
        }
    }

    pub fn finish(mut self) -> u128 {
        self.finished = true;
        let duration = self.start.elapsed().as_millis();
        tracing::info!(
            operation = self.operation,
            duration_ms = duration,
            "Operation completed"
        );
        duration
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        // Fallback for early returns that never reached finish()
        if !self.finished && !std::thread::panicking() {
            let duration = self.start.elapsed().as_millis();
            tracing::debug!(
                operation = self.operation,
                duration_ms = duration,
                "Operation finished"
            );
        }
    }
}
