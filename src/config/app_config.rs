//! Client configuration - connection, analysis band and storage as TOML values
//!
//! Every section implements `Default`, so an empty or missing file yields a
//! usable (if credential-less) configuration. Credentials are only demanded
//! when a network client is built.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::types::FrequencyBand;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration.
///
/// Load with `AppConfig::load()` which searches:
/// 1. `$T8_CONFIG` env var
/// 2. `./t8_client.toml`
/// 3. Built-in defaults
///
/// and then applies `T8_HOST` / `T8_USER` / `T8_PASSWORD` overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Monitoring service endpoint and credentials
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Default band for locally computed spectra
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Where downloaded and computed files live
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_file_or_default();
        config.connection.apply_env();
        config
    }

    fn load_file_or_default() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_PATH_ENV) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from T8_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from T8_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "T8_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check working directory
        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded config from working directory");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load local config, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No config file found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let mut config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.connection.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Check values for internal consistency.
    ///
    /// Rules:
    /// - timeout must be > 0
    /// - fmin must be finite and >= 0
    /// - fmax, when set, must be finite and >= fmin
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.connection.timeout_secs == 0 {
            errors.push("connection.timeout_secs must be > 0".to_string());
        }

        let a = &self.analysis;
        if !a.fmin_hz.is_finite() || a.fmin_hz < 0.0 {
            errors.push(format!("analysis.fmin_hz ({}) must be a finite value >= 0", a.fmin_hz));
        }
        if let Some(fmax) = a.fmax_hz {
            if !fmax.is_finite() {
                errors.push(format!("analysis.fmax_hz ({fmax}) must be finite"));
            } else if fmax < a.fmin_hz {
                errors.push(format!(
                    "analysis.fmax_hz ({fmax:.3}) must be >= fmin_hz ({:.3})",
                    a.fmin_hz
                ));
            }
        }

        if self.storage.data_dir.as_os_str().is_empty() {
            errors.push("storage.data_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    /// Environment variable names of the missing connection settings
    Missing(Vec<&'static str>),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Missing(fields) => write!(
                f,
                "Missing connection settings: {} (set them in the environment, a .env file, the config file or CLI flags)",
                fields.join(", ")
            ),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Connection
// ============================================================================

/// Endpoint and credentials for the monitoring service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the REST API (trailing `/` is trimmed)
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Verify the server's TLS certificate
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
}

fn default_timeout_secs() -> u64 {
    defaults::DEFAULT_TIMEOUT_SECS
}

fn default_verify_tls() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            password: String::new(),
            timeout_secs: default_timeout_secs(),
            verify_tls: default_verify_tls(),
        }
    }
}

// Keep the password out of logs
impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("timeout_secs", &self.timeout_secs)
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

impl ConnectionConfig {
    /// Override host and credentials from `T8_HOST`, `T8_USER`, `T8_PASSWORD`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(defaults::HOST_ENV).ok(),
            std::env::var(defaults::USER_ENV).ok(),
            std::env::var(defaults::PASSWORD_ENV).ok(),
        );
    }

    /// Replace any field for which a non-empty value is given.
    pub fn apply_overrides(
        &mut self,
        host: Option<String>,
        user: Option<String>,
        password: Option<String>,
    ) {
        if let Some(h) = host.filter(|s| !s.is_empty()) {
            self.host = h;
        }
        if let Some(u) = user.filter(|s| !s.is_empty()) {
            self.user = u;
        }
        if let Some(p) = password.filter(|s| !s.is_empty()) {
            self.password = p;
        }
        self.normalize();
    }

    fn normalize(&mut self) {
        let trimmed = self.host.trim().trim_end_matches('/');
        if trimmed.len() != self.host.len() {
            self.host = trimmed.to_string();
        }
    }

    /// Fail with every missing field named.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.host.is_empty() {
            missing.push(defaults::HOST_ENV);
        }
        if self.user.is_empty() {
            missing.push(defaults::USER_ENV);
        }
        if self.password.is_empty() {
            missing.push(defaults::PASSWORD_ENV);
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Default band for computed spectra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_fmin_hz")]
    pub fmin_hz: f64,

    /// Upper edge; absent means the Nyquist frequency of each waveform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fmax_hz: Option<f64>,
}

fn default_fmin_hz() -> f64 {
    defaults::DEFAULT_FMIN_HZ
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fmin_hz: default_fmin_hz(),
            fmax_hz: None,
        }
    }
}

impl AnalysisConfig {
    pub fn band(&self) -> FrequencyBand {
        FrequencyBand {
            fmin: self.fmin_hz,
            fmax: self.fmax_hz,
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_DATA_DIR)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}
