// crates/veil-config/src/config.rs
// ============================================================================
// Module: Veil Configuration
// Description: Configuration loading and validation for the Veil contract shell.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url, veil-wrapper-gen
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! An explicit path (flag or environment) must exist; the default
//! `veil.toml` is optional and falls back to built-in defaults. Invalid
//! configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;
use veil_wrapper_gen::DEFAULT_WRAPPER_PATH;

use crate::profile::NetworkProfile;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "veil.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "VEIL_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a gateway URL.
const MAX_URL_LENGTH: usize = 2048;
/// Maximum length of a contract address.
const MAX_CONTRACT_ADDRESS_LENGTH: usize = 256;
/// Default contract build directory.
const DEFAULT_BUILD_DIR: &str = "contract/src";
/// Default session log file name inside the profile log directory.
const DEFAULT_LOG_FILE: &str = "veil-session.jsonl";
/// Default gateway connect timeout in milliseconds.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Default gateway request timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 120_000;
/// Minimum allowed timeout in milliseconds.
const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum allowed connect timeout in milliseconds.
const MAX_CONNECT_TIMEOUT_MS: u64 = 60_000;
/// Maximum allowed request timeout in milliseconds.
const MAX_REQUEST_TIMEOUT_MS: u64 = 600_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Veil contract shell configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VeilConfig {
    /// Contract build location.
    #[serde(default)]
    pub contract: ContractConfig,
    /// Wrapper generation settings.
    #[serde(default)]
    pub wrapper: WrapperConfig,
    /// Network profile and gateway settings.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Session log settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VeilConfig {
    /// Loads configuration using the default resolution rules.
    ///
    /// Resolution order is `path`, then `VEIL_CONFIG`, then `veil.toml` in the
    /// working directory. Only the last may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = env::var(CONFIG_ENV_VAR).ok();
        let source = resolve_path(path, env_path.as_deref())?;
        validate_path(&source.path)?;
        if !source.explicit && !source.path.exists() {
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&source.path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.contract.validate()?;
        self.wrapper.validate()?;
        self.network.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the gateway URL, falling back to the profile preset.
    #[must_use]
    pub fn gateway_url(&self) -> String {
        self.network
            .gateway_url
            .clone()
            .unwrap_or_else(|| self.network.profile.endpoints().gateway.to_string())
    }

    /// Returns the session log file path for file sinks.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.logging.path.clone().unwrap_or_else(|| {
            PathBuf::from(self.network.profile.endpoints().log_dir).join(DEFAULT_LOG_FILE)
        })
    }
}

/// Contract build location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractConfig {
    /// Build output directory or artifact path used as the location hint.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,
    /// Optional contract module name used to disambiguate.
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            build_dir: default_build_dir(),
            name: None,
        }
    }
}

impl ContractConfig {
    /// Validates contract settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("contract.build_dir", &self.build_dir.to_string_lossy())?;
        if let Some(name) = &self.name {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Invalid("contract.name must be non-empty".to_string()));
            }
            if trimmed.len() != name.len() {
                return Err(ConfigError::Invalid(
                    "contract.name must not have surrounding whitespace".to_string(),
                ));
            }
            if trimmed.len() > MAX_PATH_COMPONENT_LENGTH {
                return Err(ConfigError::Invalid("contract.name exceeds max length".to_string()));
            }
            if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
                return Err(ConfigError::Invalid(
                    "contract.name must be a single directory name".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Wrapper generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WrapperConfig {
    /// Output path for the generated wrapper module.
    #[serde(default = "default_wrapper_output")]
    pub output: PathBuf,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            output: default_wrapper_output(),
        }
    }
}

impl WrapperConfig {
    /// Validates wrapper settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("wrapper.output", &self.output.to_string_lossy())?;
        if self.output.file_name().is_none() {
            return Err(ConfigError::Invalid("wrapper.output must name a file".to_string()));
        }
        Ok(())
    }
}

/// Network profile and gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Deployment target.
    #[serde(default)]
    pub profile: NetworkProfile,
    /// Gateway endpoint override.
    #[serde(default)]
    pub gateway_url: Option<String>,
    /// Deployed contract address.
    #[serde(default)]
    pub contract_address: Option<String>,
    /// Gateway connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Gateway request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            profile: NetworkProfile::default(),
            gateway_url: None,
            contract_address: None,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl NetworkConfig {
    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validates network settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.gateway_url {
            validate_gateway_url(url)?;
        }
        if let Some(address) = &self.contract_address {
            validate_contract_address(address)?;
        }
        if !(MIN_TIMEOUT_MS ..= MAX_CONNECT_TIMEOUT_MS).contains(&self.connect_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "network.connect_timeout_ms must be between {MIN_TIMEOUT_MS} and \
                 {MAX_CONNECT_TIMEOUT_MS}"
            )));
        }
        if !(MIN_TIMEOUT_MS ..= MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "network.request_timeout_ms must be between {MIN_TIMEOUT_MS} and \
                 {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        if self.request_timeout_ms < self.connect_timeout_ms {
            return Err(ConfigError::Invalid(
                "network.request_timeout_ms must be at least connect_timeout_ms".to_string(),
            ));
        }
        Ok(())
    }
}

/// Session log sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    #[default]
    File,
    /// Discard session events.
    None,
}

/// Session log settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Selected sink.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path for the file sink; defaults under the profile log dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            if self.sink != LogSinkKind::File {
                return Err(ConfigError::Invalid(
                    "logging.path is only valid with sink = \"file\"".to_string(),
                ));
            }
            validate_path_string("logging.path", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Config path plus whether the caller asked for it explicitly.
struct ConfigSource {
    /// Resolved config path.
    path: PathBuf,
    /// True when the path came from a flag or the environment.
    explicit: bool,
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>, env_path: Option<&str>) -> Result<ConfigSource, ConfigError> {
    if let Some(path) = path {
        return Ok(ConfigSource {
            path: path.to_path_buf(),
            explicit: true,
        });
    }
    if let Some(env_path) = env_path {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ConfigSource {
            path: PathBuf::from(env_path),
            explicit: true,
        });
    }
    Ok(ConfigSource {
        path: PathBuf::from(DEFAULT_CONFIG_NAME),
        explicit: false,
    })
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the gateway URL scheme and length.
fn validate_gateway_url(url: &str) -> Result<(), ConfigError> {
    let trimmed = url.trim();
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ConfigError::Invalid("network.gateway_url exceeds max length".to_string()));
    }
    let parsed = Url::parse(trimmed)
        .map_err(|err| ConfigError::Invalid(format!("network.gateway_url is invalid: {err}")))?;
    let http = matches!(parsed.scheme(), "http" | "https");
    if !http || parsed.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Invalid(
            "network.gateway_url must include http:// or https:// and a host".to_string(),
        ));
    }
    Ok(())
}

/// Validates a contract address as optionally `0x`-prefixed hex.
fn validate_contract_address(address: &str) -> Result<(), ConfigError> {
    let trimmed = address.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(ConfigError::Invalid("network.contract_address must be non-empty".to_string()));
    }
    if trimmed.len() > MAX_CONTRACT_ADDRESS_LENGTH {
        return Err(ConfigError::Invalid(
            "network.contract_address exceeds max length".to_string(),
        ));
    }
    if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(ConfigError::Invalid("network.contract_address must be hex".to_string()));
    }
    Ok(())
}

/// Default contract build directory.
fn default_build_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BUILD_DIR)
}

/// Default wrapper output path.
fn default_wrapper_output() -> PathBuf {
    PathBuf::from(DEFAULT_WRAPPER_PATH)
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

// ============================================================================
// SECTION: Tests
// ============================================================================
