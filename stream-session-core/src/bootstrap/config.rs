//! Configuration loading

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::Config;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "STREAM_SESSION_CONFIG_PATH";

/// Load configuration from config file or environment variables
///
/// Config file search order:
/// 1. `explicit` (the `--config` flag or `STREAM_SESSION_CONFIG_PATH`); written
///    with defaults first when it does not exist yet
/// 2. ./config.yaml (current working directory)
/// 3. Fall back to environment variables only
///
/// Runs before logging is initialized, so progress goes to stderr.
pub fn load_config(explicit: Option<&str>) -> Result<Config> {
    let config = if let Some(path) = explicit {
        if !Path::new(path).exists() {
            Config::write_default(Path::new(path))
                .with_context(|| format!("Failed to write default config to {path}"))?;
            eprintln!("Wrote default configuration to {path}");
        }
        eprintln!("Loading config from {path}");
        Config::from_file(path).with_context(|| format!("Failed to load {path}"))?
    } else if Path::new("config.yaml").exists() {
        eprintln!("Loading config from config.yaml");
        Config::from_file("config.yaml").context("Failed to load config.yaml")?
    } else {
        eprintln!("No config file found, using environment variables");
        Config::from_env().context("Failed to load config from environment")?
    };

    // Validate configuration (fail fast on misconfigurations)
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Config validation error: {error}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s): {}",
            errors.len(),
            errors.join("; ")
        ));
    }

    Ok(config)
}

/// Log the effective configuration once logging is up.
pub fn log_effective_config(config: &Config) {
    info!("gRPC address: {}", config.grpc_address());
    info!(
        control = %config.relay.control_url(),
        rtsp = %config.relay.rtsp_source(""),
        webrtc = %config.relay.stream_url(""),
        timeout_secs = config.relay.request_timeout_seconds,
        "Media relay"
    );
    if config.redis.url.is_empty() {
        info!("Record store: in-memory");
    } else {
        info!(
            url = %config.redis.redacted_url(),
            key_prefix = %config.redis.key_prefix,
            "Record store: Redis"
        );
    }
    info!(
        enabled = config.reconciler.enabled,
        interval_secs = config.reconciler.interval_seconds,
        "Reconciler"
    );
}
