//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/warriorplus/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/warriorplus/` (~/.config/warriorplus/)
//! - Data: `$XDG_DATA_HOME/warriorplus/` (~/.local/share/warriorplus/)
//! - State/Logs: `$XDG_STATE_HOME/warriorplus/` (~/.local/state/warriorplus/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Document store connection
    #[serde(default)]
    pub store: StoreConfig,

    /// Classification thresholds used by the aggregator
    #[serde(default)]
    pub thresholds: Thresholds,

    /// Export defaults
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Firestore connection settings.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Firebase project id (required for remote fetches)
    pub project_id: Option<String>,

    /// REST endpoint root
    #[serde(default = "default_store_base_url")]
    pub base_url: String,

    /// Web API key, sent as the `key` query parameter
    pub api_key: Option<String>,

    /// Firebase ID token of an admin user, sent as a bearer token
    pub id_token: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,

    /// Documents requested per list page (max 300)
    #[serde(default = "default_store_page_size")]
    pub page_size: usize,

    /// Collection names
    #[serde(default)]
    pub collections: CollectionNames,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            base_url: default_store_base_url(),
            api_key: None,
            id_token: None,
            timeout_secs: default_store_timeout(),
            page_size: default_store_page_size(),
            collections: CollectionNames::default(),
        }
    }
}

impl StoreConfig {
    /// Check if the store is configured well enough to fetch from
    pub fn is_ready(&self) -> bool {
        self.project_id.is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_none() {
            return Err(Error::Config(
                "store.project_id is required for remote exports".to_string(),
            ));
        }
        if self.page_size == 0 || self.page_size > 300 {
            return Err(Error::Config(
                "store.page_size must be between 1 and 300".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_store_base_url() -> String {
    "https://firestore.googleapis.com".to_string()
}

fn default_store_timeout() -> u64 {
    30
}

fn default_store_page_size() -> usize {
    300
}

/// Names of the collections the exporter reads.
///
/// `user_medications` and `crisis_entries` are subcollections under each
/// user document and are read with a collection-group query.
#[derive(Debug, Deserialize, Clone)]
pub struct CollectionNames {
    #[serde(default = "default_users_collection")]
    pub users: String,
    #[serde(default = "default_global_medications_collection")]
    pub global_medications: String,
    #[serde(default = "default_user_medications_collection")]
    pub user_medications: String,
    #[serde(default = "default_crisis_entries_collection")]
    pub crisis_entries: String,
    #[serde(default = "default_admin_collection")]
    pub admin: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            users: default_users_collection(),
            global_medications: default_global_medications_collection(),
            user_medications: default_user_medications_collection(),
            crisis_entries: default_crisis_entries_collection(),
            admin: default_admin_collection(),
        }
    }
}

fn default_users_collection() -> String {
    "Users".to_string()
}

fn default_global_medications_collection() -> String {
    "GlobalMedications".to_string()
}

fn default_user_medications_collection() -> String {
    "Medications".to_string()
}

fn default_crisis_entries_collection() -> String {
    "PainJournal".to_string()
}

fn default_admin_collection() -> String {
    "Admin".to_string()
}

/// Thresholds for medication and patient classification.
///
/// Efficacy thresholds are compared against `avgEfficacy` as stored, which
/// the platform writes on a 0-5 rating scale. Values above
/// `efficacy_scale_max` are logged because they suggest a percentage scale.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Thresholds {
    /// Efficacy at or above which a medication is "Recommended"
    #[serde(default = "default_recommended_efficacy")]
    pub recommended_efficacy: f64,

    /// Efficacy at or above which a medication is highly effective
    #[serde(default = "default_highly_effective_efficacy")]
    pub highly_effective_efficacy: f64,

    /// Efficacy below which a medication is under-performing
    #[serde(default = "default_under_performing_efficacy")]
    pub under_performing_efficacy: f64,

    /// Side-effect percentage above which risk is high
    #[serde(default = "default_high_risk_side_effects")]
    pub high_risk_side_effect_pct: f64,

    /// Side-effect percentage above which risk is moderate
    #[serde(default = "default_moderate_risk_side_effects")]
    pub moderate_risk_side_effect_pct: f64,

    /// Side-effect percentage above which a safety signal is raised
    #[serde(default = "default_safety_signal_side_effects")]
    pub safety_signal_side_effect_pct: f64,

    /// Crisis count above which a patient is high risk
    #[serde(default = "default_high_risk_crisis_count")]
    pub high_risk_crisis_count: usize,

    /// Upper bound of the efficacy rating scale
    #[serde(default = "default_efficacy_scale_max")]
    pub efficacy_scale_max: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            recommended_efficacy: default_recommended_efficacy(),
            highly_effective_efficacy: default_highly_effective_efficacy(),
            under_performing_efficacy: default_under_performing_efficacy(),
            high_risk_side_effect_pct: default_high_risk_side_effects(),
            moderate_risk_side_effect_pct: default_moderate_risk_side_effects(),
            safety_signal_side_effect_pct: default_safety_signal_side_effects(),
            high_risk_crisis_count: default_high_risk_crisis_count(),
            efficacy_scale_max: default_efficacy_scale_max(),
        }
    }
}

fn default_recommended_efficacy() -> f64 {
    3.0
}

fn default_highly_effective_efficacy() -> f64 {
    4.0
}

fn default_under_performing_efficacy() -> f64 {
    2.0
}

fn default_high_risk_side_effects() -> f64 {
    25.0
}

fn default_moderate_risk_side_effects() -> f64 {
    10.0
}

fn default_safety_signal_side_effects() -> f64 {
    15.0
}

fn default_high_risk_crisis_count() -> usize {
    5
}

fn default_efficacy_scale_max() -> f64 {
    5.0
}

/// Defaults applied when the CLI is run without explicit selectors
#[derive(Debug, Deserialize)]
pub struct ExportConfig {
    /// Directory export files are written to (defaults to the data dir)
    pub output_dir: Option<PathBuf>,

    /// Report type used when none is given
    #[serde(default = "default_report_type")]
    pub report_type: String,

    /// Time window used when none is given
    #[serde(default = "default_window")]
    pub window: String,

    /// Output format used when none is given
    #[serde(default = "default_format")]
    pub format: String,

    /// Anonymization level used when none is given (none, partial, full)
    #[serde(default = "default_anonymization")]
    pub anonymization: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            report_type: default_report_type(),
            window: default_window(),
            format: default_format(),
            anonymization: default_anonymization(),
        }
    }
}

impl ExportConfig {
    /// Directory export files go to
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| Config::data_dir().join("exports"))
    }
}

fn default_report_type() -> String {
    "comprehensive".to_string()
}

fn default_window() -> String {
    "30d".to_string()
}

fn default_format() -> String {
    "json".to_string()
}

fn default_anonymization() -> String {
    "full".to_string()
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/warriorplus/config.toml` (~/.config/warriorplus/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("warriorplus").join("config.toml")
    }

    /// Returns the data directory path (default export location)
    ///
    /// `$XDG_DATA_HOME/warriorplus/` (~/.local/share/warriorplus/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("warriorplus")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/warriorplus/` (~/.local/state/warriorplus/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("warriorplus")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/warriorplus/warriorplus.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("warriorplus.log")
    }
}
