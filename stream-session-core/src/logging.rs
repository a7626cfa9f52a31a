use std::path::Path;

use tracing::Level;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{Builder as RollingBuilder, Rotation},
};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize structured logging based on configuration
///
/// Console output is always on. When `directory` is set, the same events
/// also go to a rolling log file through a non-blocking writer; the returned
/// guard must be held for the life of the process so buffered lines get flushed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let log_level = parse_log_level(&config.level)?;

    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let json = config.format.as_str() == "json";
    let mut layers: Vec<BoxedLayer> = vec![console_layer(json)];

    let guard = match &config.directory {
        Some(directory) => {
            let appender = RollingBuilder::new()
                .rotation(parse_rotation(&config.rotation)?)
                .filename_prefix(&config.file_name)
                .max_log_files(config.max_files.max(1))
                .build(Path::new(directory))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let file_layer = if json {
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed()
            } else {
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed()
            };
            layers.push(file_layer);
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()?;

    Ok(guard)
}

fn console_layer(json: bool) -> BoxedLayer {
    if json {
        // JSON format for production (structured logging)
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .boxed()
    } else {
        fmt::layer()
            .pretty()
            .with_target(true)
            .with_line_number(true)
            .with_file(false)
            .boxed()
    }
}

/// Parse log level string to tracing Level
fn parse_log_level(level: &str) -> anyhow::Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(anyhow::anyhow!("Invalid log level: {level}")),
    }
}

fn parse_rotation(rotation: &str) -> anyhow::Result<Rotation> {
    match rotation.to_lowercase().as_str() {
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        "minutely" => Ok(Rotation::MINUTELY),
        "never" => Ok(Rotation::NEVER),
        _ => Err(anyhow::anyhow!("Invalid log rotation: {rotation}")),
    }
}
