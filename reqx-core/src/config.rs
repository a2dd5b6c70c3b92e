use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::Credentials;
use crate::models::UserProfile;

/// Simulated latencies of the fake backend, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Fixture fetch when a stage view mounts
    pub fetch_ms: u64,
    /// Input submission before extraction review opens
    pub processing_ms: u64,
    pub auth_ms: u64,
    /// First suggestions analysis
    pub analysis_ms: u64,
    /// Re-analysis of suggestions
    pub reanalysis_ms: u64,
    /// Assistant "typing" before a reply
    pub assistant_ms: u64,
    /// Loading the comment thread of a generated document
    pub comments_ms: u64,
    /// Posting, editing or deleting a comment
    pub comment_save_ms: u64,
    /// Multiplier applied to the export progress ticks (0 disables them)
    pub export_scale: f64,
    /// Multiplier applied to the collaborator presence timeline
    pub presence_scale: f64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            fetch_ms: 800,
            processing_ms: 1500,
            auth_ms: 300,
            analysis_ms: 2500,
            reanalysis_ms: 2500,
            assistant_ms: 1500,
            comments_ms: 1500,
            comment_save_ms: 1000,
            export_scale: 1.0,
            presence_scale: 1.0,
        }
    }
}

impl DelayConfig {
    /// No waiting anywhere; used by tests and `--instant`
    pub fn instant() -> Self {
        Self {
            fetch_ms: 0,
            processing_ms: 0,
            auth_ms: 0,
            analysis_ms: 0,
            reanalysis_ms: 0,
            assistant_ms: 0,
            comments_ms: 0,
            comment_save_ms: 0,
            export_scale: 0.0,
            presence_scale: 0.0,
        }
    }

    pub fn fetch(&self) -> Duration {
        Duration::from_millis(self.fetch_ms)
    }

    pub fn processing(&self) -> Duration {
        Duration::from_millis(self.processing_ms)
    }

    pub fn auth(&self) -> Duration {
        Duration::from_millis(self.auth_ms)
    }

    pub fn analysis(&self) -> Duration {
        Duration::from_millis(self.analysis_ms)
    }

    pub fn reanalysis(&self) -> Duration {
        Duration::from_millis(self.reanalysis_ms)
    }

    pub fn assistant(&self) -> Duration {
        Duration::from_millis(self.assistant_ms)
    }

    pub fn comments(&self) -> Duration {
        Duration::from_millis(self.comments_ms)
    }

    pub fn comment_save(&self) -> Duration {
        Duration::from_millis(self.comment_save_ms)
    }

    /// Scale factors must be finite and non-negative
    pub fn validate(&self) -> Result<()> {
        for (name, scale) in [
            ("export_scale", self.export_scale),
            ("presence_scale", self.presence_scale),
        ] {
            if !scale.is_finite() || scale < 0.0 {
                anyhow::bail!("delays.{} must be a non-negative number, got {}", name, scale);
            }
        }
        Ok(())
    }
}

/// `ms` stretched by `scale`. Scales that do not give a valid duration
/// (negative, NaN, infinite) count as zero.
pub fn scaled(ms: u64, scale: f64) -> Duration {
    Duration::try_from_secs_f64(ms as f64 / 1000.0 * scale).unwrap_or(Duration::ZERO)
}

/// Settings page preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub ai_enabled: bool,
    pub jira_enabled: bool,
    pub slack_enabled: bool,
    pub email_notifications: bool,
    pub template_format: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            jira_enabled: false,
            slack_enabled: true,
            email_notifications: true,
            template_format: "standard".to_string(),
        }
    }
}

impl Preferences {
    /// Sets a preference by name from its command-line spelling
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let parse_bool = |v: &str| -> Result<bool> {
            match v.to_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(true),
                "false" | "off" | "no" | "0" => Ok(false),
                _ => anyhow::bail!("Expected on/off for {}, got '{}'", name, v),
            }
        };

        match name {
            "ai" | "ai_enabled" => self.ai_enabled = parse_bool(value)?,
            "jira" | "jira_enabled" => self.jira_enabled = parse_bool(value)?,
            "slack" | "slack_enabled" => self.slack_enabled = parse_bool(value)?,
            "email" | "email_notifications" => self.email_notifications = parse_bool(value)?,
            "template" | "template_format" => match value {
                "standard" | "ieee" | "agile" => self.template_format = value.to_string(),
                _ => anyhow::bail!("Unknown template format '{}'", value),
            },
            _ => anyhow::bail!("Unknown setting '{}'", name),
        }
        Ok(())
    }
}

/// Application configuration, read from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub delays: DelayConfig,
    /// The one credential pair the fixture authenticator accepts
    pub demo_credentials: Credentials,
    /// Profile attached to sessions from the demo credentials
    pub profile: UserProfile,
    /// Where the session marker is kept; defaults to the data dir
    pub session_file: Option<PathBuf>,
    pub preferences: Preferences,
}

impl AppConfig {
    /// Loads the config from `path`, falling back to defaults when absent
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config
            .delays
            .validate()
            .with_context(|| format!("Invalid delays in config file: {:?}", path))?;
        Ok(config)
    }

    /// Loads from the default location (see [`get_config_path`])
    pub fn load() -> Result<Self> {
        Self::load_from(get_config_path()?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Resolves the session file location
    pub fn session_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.session_file {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().context("Failed to determine data directory")?;
        Ok(data_dir.join("reqx").join("session.json"))
    }
}

/// Gets the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("REQX_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    let config_dir = dirs::config_dir().context("Failed to determine config directory")?;
    Ok(config_dir.join("reqx").join("config.yaml"))
}
