use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub redis: RedisConfig,
    pub reconciler: ReconcilerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub grpc_port: u16,
    pub enable_reflection: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            grpc_port: 50051,
            enable_reflection: true,
        }
    }
}

/// Relay control API listener
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpEndpointConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpEndpointConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9997,
        }
    }
}

/// WebRTC playback listener, used to build published stream URLs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WebRtcEndpointConfig {
    pub host: String,
    pub port: u16,
}

impl Default for WebRtcEndpointConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8889,
        }
    }
}

/// RTSP listener the relay pulls ingest sources from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RtspConfig {
    pub host: String,
    pub port: u16,
    /// Fixed path prefix placed before every stream sub-path
    pub path: String,
}

impl Default for RtspConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8554,
            path: String::new(),
        }
    }
}

/// Media relay (MediaMTX) endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Control API
    pub http: HttpEndpointConfig,
    pub rtsp: RtspConfig,
    pub webrtc: WebRtcEndpointConfig,
    pub request_timeout_seconds: u64,
    pub list_page_size: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            http: HttpEndpointConfig::default(),
            rtsp: RtspConfig::default(),
            webrtc: WebRtcEndpointConfig::default(),
            request_timeout_seconds: 10,
            list_page_size: 100,
        }
    }
}

impl RelayConfig {
    /// Base URL of the control API
    #[must_use]
    pub fn control_url(&self) -> String {
        format!("http://{}:{}", self.http.host, self.http.port)
    }

    /// RTSP source URL for a stream sub-path (`/cam1`)
    #[must_use]
    pub fn rtsp_source(&self, sub_path: &str) -> String {
        let prefix = self.rtsp.path.trim_matches('/');
        let sub_path = sub_path.trim_start_matches('/');
        if prefix.is_empty() {
            format!("rtsp://{}:{}/{}", self.rtsp.host, self.rtsp.port, sub_path)
        } else {
            format!(
                "rtsp://{}:{}/{}/{}",
                self.rtsp.host, self.rtsp.port, prefix, sub_path
            )
        }
    }

    /// Published playback URL for a session uuid
    #[must_use]
    pub fn stream_url(&self, uuid: &str) -> String {
        format!("http://{}:{}/{}", self.webrtc.host, self.webrtc.port, uuid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Empty selects the in-process store
    pub url: String,
    pub key_prefix: String,
    pub connect_timeout_seconds: u64,
    pub operation_timeout_seconds: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379/0".to_string(),
            key_prefix: "log:stream:".to_string(),
            connect_timeout_seconds: 5,
            operation_timeout_seconds: 5,
        }
    }
}

impl RedisConfig {
    /// URL with any password replaced, safe to log
    #[must_use]
    pub fn redacted_url(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(mut parsed) if parsed.password().is_some() => {
                let _ = parsed.set_password(Some("****"));
                parsed.to_string()
            }
            Ok(parsed) => parsed.to_string(),
            Err(_) => self.url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    /// Directory for rotated log files; console only when unset
    pub directory: Option<String>,
    pub file_name: String,
    pub rotation: String, // "daily", "hourly", "minutely" or "never"
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
            file_name: "stream-session.log".to_string(),
            rotation: "daily".to_string(),
            max_files: 30,
        }
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_file, environment())
    }

    fn load_with_env(config_file: Option<&str>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        let config = builder.add_source(env).build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Write the default configuration as YAML to `path`, creating parent directories.
    pub fn write_default(path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let yaml = serde_yaml::to_string(&Self::default())?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Check the configuration, reporting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }
        if self.server.grpc_port == 0 {
            errors.push("server.grpc_port must be non-zero".to_string());
        }

        let endpoints = [
            ("relay.http", &self.relay.http.host, self.relay.http.port),
            ("relay.rtsp", &self.relay.rtsp.host, self.relay.rtsp.port),
            ("relay.webrtc", &self.relay.webrtc.host, self.relay.webrtc.port),
        ];
        for (name, host, port) in endpoints {
            if host.trim().is_empty() {
                errors.push(format!("{name}.host must not be empty"));
            }
            if port == 0 {
                errors.push(format!("{name}.port must be non-zero"));
            }
        }
        if self.relay.request_timeout_seconds == 0 {
            errors.push("relay.request_timeout_seconds must be positive".to_string());
        }
        if self.relay.list_page_size == 0 {
            errors.push("relay.list_page_size must be positive".to_string());
        }

        if !self.redis.url.is_empty() && self.redis.key_prefix.is_empty() {
            errors.push("redis.key_prefix must not be empty".to_string());
        }
        if self.redis.operation_timeout_seconds == 0 || self.redis.connect_timeout_seconds == 0 {
            errors.push("redis timeouts must be positive".to_string());
        }

        if self.reconciler.interval_seconds == 0 {
            errors.push("reconciler.interval_seconds must be positive".to_string());
        }

        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got {:?}",
                self.logging.format
            ));
        }
        if !matches!(
            self.logging.rotation.as_str(),
            "daily" | "hourly" | "minutely" | "never"
        ) {
            errors.push(format!(
                "logging.rotation must be daily, hourly, minutely or never, got {:?}",
                self.logging.rotation
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Get gRPC address
    #[must_use]
    pub fn grpc_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.grpc_port)
    }
}

/// `STREAM_SESSION__RELAY__HTTP__HOST`, etc.
fn environment() -> Environment {
    Environment::with_prefix("STREAM_SESSION")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
