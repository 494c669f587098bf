//! TOML Configuration File Support
//!
//! Configuration for the result channel lives at
//! `~/.config/result-channel/channel.toml`. It tunes diagnostics and the wire
//! codec only; delivery semantics are fixed.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. Programmatic overrides ([`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [receiver]
//! queue_warn_depth = 5000
//!
//! [codec]
//! max_frame_size = 1048576
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum encoded envelope size (10 MB)
pub const DEFAULT_MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Default queue depth at which a receiver logs a warning
pub const DEFAULT_QUEUE_WARN_DEPTH: usize = 1000;

const ENV_QUEUE_WARN_DEPTH: &str = "RESULT_CHANNEL_QUEUE_WARN_DEPTH";
const ENV_MAX_FRAME_SIZE: &str = "RESULT_CHANNEL_MAX_FRAME_SIZE";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value set programmatically through [`ConfigOverrides`]
    Override,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Override => write!(f, "override"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Receiver diagnostics
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiverConfig {
    /// Queue depth at which a warning is logged (once per receiver)
    ///
    /// The queue itself is never bounded.
    pub queue_warn_depth: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            queue_warn_depth: DEFAULT_QUEUE_WARN_DEPTH,
        }
    }
}

/// Wire codec limits
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecConfig {
    /// Largest JSON payload accepted or produced, in bytes
    pub max_frame_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Receiver section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverToml {
    /// Queue depth warning threshold
    pub queue_warn_depth: Option<usize>,
}

/// Codec section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecToml {
    /// Maximum frame size in bytes
    pub max_frame_size: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelToml {
    /// Receiver configuration section
    pub receiver: ReceiverToml,

    /// Codec configuration section
    pub codec: CodecToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Consolidated channel configuration
///
/// Use [`load_config`] to load it with proper priority handling.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    /// Receiver diagnostics
    pub receiver: ReceiverConfig,

    /// Wire codec limits
    pub codec: CodecConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            receiver: ReceiverConfig::default(),
            codec: CodecConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ChannelConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the highest-priority source that contributed a value
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check that all limits are usable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` for zero-valued limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.receiver.queue_warn_depth == 0 {
            return Err(ConfigError::ValidationError(
                "receiver.queue_warn_depth must be greater than 0".to_string(),
            ));
        }
        if self.codec.max_frame_size == 0 {
            return Err(ConfigError::ValidationError(
                "codec.max_frame_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/result-channel/channel.toml` or
/// `~/.config/result-channel/channel.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("result-channel").join("channel.toml"))
}

/// Load configuration from the default path, then the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// resulting values fail validation. A missing file is not an error.
pub fn load_config() -> Result<ChannelConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then the environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// if the resulting values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ChannelConfig, ConfigError> {
    let mut config = ChannelConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ChannelToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut ChannelConfig, toml: &ChannelToml) {
    if let Some(depth) = toml.receiver.queue_warn_depth {
        config.receiver.queue_warn_depth = depth;
    }
    if let Some(size) = toml.codec.max_frame_size {
        config.codec.max_frame_size = size;
    }
}

fn apply_env_config(config: &mut ChannelConfig) {
    if let Ok(depth) = std::env::var(ENV_QUEUE_WARN_DEPTH) {
        match depth.parse::<usize>() {
            Ok(n) => {
                config.receiver.queue_warn_depth = n;
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(var = ENV_QUEUE_WARN_DEPTH, value = %depth, "Ignoring unparsable env var"),
        }
    }
    if let Ok(size) = std::env::var(ENV_MAX_FRAME_SIZE) {
        match size.parse::<usize>() {
            Ok(n) => {
                config.codec.max_frame_size = n;
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(var = ENV_MAX_FRAME_SIZE, value = %size, "Ignoring unparsable env var"),
        }
    }
}

// =============================================================================
// Override Support
// =============================================================================

/// Builder for applying programmatic overrides to configuration
///
/// Use this after [`load_config`] for values that must win over the file and
/// the environment.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Queue depth warning threshold override
    pub queue_warn_depth: Option<usize>,

    /// Max frame size override
    pub max_frame_size: Option<usize>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set queue depth warning threshold override
    #[must_use]
    pub fn with_queue_warn_depth(mut self, depth: usize) -> Self {
        self.queue_warn_depth = Some(depth);
        self
    }

    /// Set max frame size override
    #[must_use]
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = Some(size);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if an override is out of range.
    pub fn apply(&self, config: &mut ChannelConfig) -> Result<(), ConfigError> {
        if self.queue_warn_depth.is_some() || self.max_frame_size.is_some() {
            config.source = ConfigSource::Override;
        }
        if let Some(depth) = self.queue_warn_depth {
            config.receiver.queue_warn_depth = depth;
        }
        if let Some(size) = self.max_frame_size {
            config.codec.max_frame_size = size;
        }
        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
