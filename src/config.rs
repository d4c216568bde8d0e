//! Configuration management for the interpretation engine
//!
//! Provides persistent settings storage with schema versioning.
//! Configuration is stored in `~/.souschef/config.json`; every section has
//! serde defaults so partial or older files load cleanly, and the defaults
//! carry the engine's contract constants.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use crate::gesture::classifier::ClassifierConfig;
use crate::voice::arbiter::{
    DEFAULT_MAX_START_ATTEMPTS, DEFAULT_RESUME_SETTLE_MS, DEFAULT_RETRY_BACKOFF_MS,
};

/// Current config schema version
const CURRENT_VERSION: u32 = 1;

/// Global config instance for caching
static CONFIG: OnceLock<RwLock<EngineConfig>> = OnceLock::new();

/// Errors raised by configuration persistence.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to locate home directory")]
    NoHomeDirectory,

    #[error("Failed to create config directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to read config file: {0}")]
    Read(std::io::Error),

    #[error("Failed to write config file: {0}")]
    Write(std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Schema version for migrations
    pub version: u32,
    /// Gesture path settings
    pub gesture: GestureConfig,
    /// Voice path settings
    pub voice: VoiceConfig,
    /// Dispatch settings
    pub dispatch: DispatchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            gesture: GestureConfig::default(),
            voice: VoiceConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

/// Gesture path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Whether gesture control starts enabled
    pub enabled: bool,
    /// Frames a gesture must be held before it may dispatch
    pub min_hold_frames: u32,
    /// Cooldown after a dispatch before the same gesture may reissue (ms)
    pub cooldown_ms: u64,
    /// Hand-absence grace period before a full session reset (ms)
    pub absence_reset_ms: u64,
    /// Classifier thresholds
    pub classifier: ClassifierConfig,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_hold_frames: 1,
            cooldown_ms: 1_500,
            absence_reset_ms: 1_000,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl GestureConfig {
    /// Cooldown window as a [`Duration`]
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Absence grace period as a [`Duration`]
    pub fn absence_reset(&self) -> Duration {
        Duration::from_millis(self.absence_reset_ms)
    }
}

/// Voice path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Whether voice control starts enabled
    pub enabled: bool,
    /// Settle window between synthesis end and input resume (ms)
    pub resume_settle_ms: u64,
    /// Backoff before re-attempting a failed input start (ms)
    pub retry_backoff_ms: u64,
    /// Bound on consecutive input start attempts
    pub max_start_attempts: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resume_settle_ms: DEFAULT_RESUME_SETTLE_MS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            max_start_attempts: DEFAULT_MAX_START_ATTEMPTS,
        }
    }
}

impl VoiceConfig {
    /// Settle window as a [`Duration`]
    pub fn resume_settle(&self) -> Duration {
        Duration::from_millis(self.resume_settle_ms)
    }

    /// Retry backoff as a [`Duration`]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Duplicate-suppression window per path (ms)
    pub suppression_window_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            suppression_window_ms: crate::dispatch::DEFAULT_SUPPRESSION_WINDOW_MS,
        }
    }
}

impl DispatchConfig {
    /// Suppression window as a [`Duration`]
    pub fn suppression_window(&self) -> Duration {
        Duration::from_millis(self.suppression_window_ms)
    }
}

/// Directory holding the config file (`~/.souschef`)
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home.join(".souschef"))
}

/// Full path of the config file
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json"))
}

/// Load configuration from an explicit path.
///
/// A missing file yields the defaults; a malformed file is an error.
pub fn load_config_from(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Read)?;
    let mut config: EngineConfig = serde_json::from_str(&contents)?;

    if config.version != CURRENT_VERSION {
        tracing::info!(
            "Migrating config from version {} to {}",
            config.version,
            CURRENT_VERSION
        );
        config.version = CURRENT_VERSION;
    }

    Ok(config)
}

/// Save configuration to an explicit path, creating parent directories.
pub fn save_config_to(path: &Path, config: &EngineConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(ConfigError::CreateDir)?;
    }

    let contents = serde_json::to_string_pretty(config)?;
    fs::write(path, contents).map_err(ConfigError::Write)
}

/// Load configuration from the default location.
///
/// Falls back to the defaults (and logs a warning) if the file is
/// unreadable, so a corrupt config never prevents startup.
pub fn load_config() -> EngineConfig {
    match config_path().and_then(|path| load_config_from(&path)) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            EngineConfig::default()
        }
    }
}

/// Save configuration to the default location.
pub fn save_config(config: &EngineConfig) -> Result<(), ConfigError> {
    let path = config_path()?;
    save_config_to(&path, config)
}

/// Get the cached configuration, loading it on first access.
pub fn get_config() -> EngineConfig {
    CONFIG
        .get_or_init(|| RwLock::new(load_config()))
        .read()
        .clone()
}

/// Replace the cached configuration and persist it.
pub fn set_config(config: EngineConfig) -> Result<(), ConfigError> {
    save_config(&config)?;
    *CONFIG
        .get_or_init(|| RwLock::new(EngineConfig::default()))
        .write() = config;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_contract_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.version, CURRENT_VERSION);
        assert_eq!(config.gesture.min_hold_frames, 1);
        assert_eq!(config.gesture.cooldown_ms, 1_500);
        assert_eq!(config.gesture.absence_reset_ms, 1_000);
        assert_eq!(config.voice.resume_settle_ms, 1_500);
        assert_eq!(config.voice.retry_backoff_ms, 2_000);
        assert_eq!(config.voice.max_start_attempts, 3);
        assert_eq!(config.dispatch.suppression_window_ms, 2_000);
    }

    #[test]
    fn test_duration_helpers() {
        let config = EngineConfig::default();
        assert_eq!(config.gesture.cooldown(), Duration::from_millis(1_500));
        assert_eq!(config.voice.retry_backoff(), Duration::from_secs(2));
        assert_eq!(
            config.dispatch.suppression_window(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let json = r#"{"voice": {"max_start_attempts": 5}}"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.voice.max_start_attempts, 5);
        // Everything unspecified falls back to the defaults.
        assert_eq!(config.voice.retry_backoff_ms, 2_000);
        assert_eq!(config.gesture.cooldown_ms, 1_500);
    }

    #[test]
    fn test_round_trip() {
        let mut config = EngineConfig::default();
        config.gesture.min_hold_frames = 3;
        config.gesture.classifier.scale_by_hand_span = true;

        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.gesture.min_hold_frames, 3);
        assert!(back.gesture.classifier.scale_by_hand_span);
    }
}
