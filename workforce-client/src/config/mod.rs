use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub access: AccessSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Base URL of the REST backend, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    /// File the persisted session lives in.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".workforce").join("session.json")
}

/// Which users count as elevated. See [`crate::auth::ElevationPolicy`].
#[derive(Debug, Deserialize, Clone)]
pub struct AccessSettings {
    #[serde(default = "default_elevated_roles")]
    pub elevated_roles: Vec<String>,
    #[serde(default = "default_baseline_permission")]
    pub baseline_permission: String,
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self {
            elevated_roles: default_elevated_roles(),
            baseline_permission: default_baseline_permission(),
        }
    }
}

fn default_elevated_roles() -> Vec<String> {
    vec!["admin".to_string(), "manager".to_string()]
}

fn default_baseline_permission() -> String {
    "users".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint; spans are only exported when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Read `config/base.yaml` (relative to the working directory or the crate
/// directory) overlaid with `APP_*` environment variables.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("No working directory: {}", e)))?;

    // Running from the workspace root or from inside the crate
    let configuration_directory = if base_path.ends_with("workforce-client") {
        base_path.join("config")
    } else {
        base_path.join("workforce-client").join("config")
    };

    load_from(&configuration_directory.join("base.yaml"))
}

pub fn load_from(base_file: &Path) -> Result<Settings, config::ConfigError> {
    client_core::config::load_settings(base_file, &["access.elevated_roles"])
}
