//! Logging and lightweight metrics.
//!
//! Everything goes to stderr: stdout carries the MCP protocol. Metrics are plain
//! `tracing` events under the `metrics` target.

use tracing_subscriber::EnvFilter;

/// Configuration for the telemetry system
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Name of the service, recorded once at startup
    pub service_name: String,
    /// Log level or `EnvFilter` directive; `RUST_LOG` takes precedence
    pub log_level: String,
    /// Include the event target in each line
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "mcp-ask-human".to_string(),
            log_level: "info".to_string(),
            with_target: true,
        }
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_telemetry(
    config: TelemetryConfig,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(config.with_target)
        .try_init()?;

    tracing::debug!(service = %config.service_name, "Telemetry initialized");
    Ok(())
}

/// Record a single metric with tags
pub fn add_metric(name: &str, value: f64, tags: &[(&str, String)]) {
    let tags_str = tags
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",");

    tracing::info!(
        target: "metrics",
        metric_name = %name,
        metric_value = %value,
        metric_tags = %tags_str,
        "Recorded metric"
    );
}

/// A span duration tracker for measuring operation durations
pub fn span_duration(name: &'static str) -> impl Drop {
    let start = std::time::Instant::now();
    struct Guard {
        name: &'static str,
        start: std::time::Instant,
    }

    impl Drop for Guard {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            tracing::info!(
                target: "metrics",
                duration_ms = duration.as_millis() as f64,
                operation = self.name,
                "Operation completed"
            );
        }
    }

    Guard { name, start }
}
