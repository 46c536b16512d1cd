use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TriageError};

/// Top-level configuration for the triage assistant.
///
/// Loaded from `~/.triage/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dialog: DialogConfig,
    #[serde(default)]
    pub phrasing: PhrasingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl TriageConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TriageConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TriageError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject settings the dialogue engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.dialog.auto_diagnose_pairs == 0 {
            return Err(TriageError::Config(
                "dialog.auto_diagnose_pairs must be at least 1".to_string(),
            ));
        }
        if self.dialog.manual_diagnose_pairs < self.dialog.auto_diagnose_pairs {
            return Err(TriageError::Config(format!(
                "dialog.manual_diagnose_pairs ({}) must not be below auto_diagnose_pairs ({})",
                self.dialog.manual_diagnose_pairs, self.dialog.auto_diagnose_pairs
            )));
        }
        if self.phrasing.enabled && self.phrasing.timeout_secs == 0 {
            return Err(TriageError::Config(
                "phrasing.timeout_secs must be positive when phrasing is enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Dialogue engine limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogConfig {
    /// Number of trailing transcript entries fed to the topic detector.
    pub recent_window: usize,
    /// Question/answer pairs after which diagnosis runs automatically.
    pub auto_diagnose_pairs: u32,
    /// Question/answer pairs after which the user may request diagnosis.
    pub manual_diagnose_pairs: u32,
    /// Trailing messages scanned for the strong-signal early stop.
    pub strong_signal_window: usize,
    /// Idle minutes before a session is discarded.
    pub session_timeout_minutes: u32,
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            recent_window: 3,
            auto_diagnose_pairs: 9,
            manual_diagnose_pairs: 10,
            strong_signal_window: 8,
            session_timeout_minutes: 30,
        }
    }
}

/// External question-phrasing model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhrasingConfig {
    /// Whether the remote phrasing adapter is consulted at all.
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible endpoint.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Bearer token. Empty means "read TRIAGE_PHRASING_API_KEY".
    pub api_key: String,
    /// Hard upper bound for one adapter call, in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for PhrasingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            timeout_secs: 5,
            temperature: 0.2,
        }
    }
}

impl PhrasingConfig {
    /// Resolve the API key: config value first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        std::env::var("TRIAGE_PHRASING_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen port (bound on 127.0.0.1).
    pub port: u16,
    /// Bearer token for session routes. Empty means generate one at start-up.
    pub api_token: String,
    /// Requests allowed per second across session routes.
    pub rate_limit_per_sec: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3040,
            api_token: String::new(),
            rate_limit_per_sec: 50,
        }
    }
}
