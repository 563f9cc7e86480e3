use crate::error::{PurgeError, Result};
use crate::executor::{ExecutorConfig, MAX_RUN_BUDGET, MIN_ACTION_DELAY};
use crate::io;
use crate::member::CommunityId;
use crate::outcome::ActionKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// File name looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "guild-purge.yaml";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

impl WarnLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarnLevel::Warning => "warning",
            WarnLevel::Error => "error",
        }
    }
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.as_str(), self.message)
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Tunables for a removal run. The bot token is deliberately absent: it only
/// ever comes from the command line or the environment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Community to target when `--guild` / `DISCORD_GUILD_ID` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,

    #[serde(default = "default_action")]
    pub default_action: ActionKind,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Pause after every identifier, whatever its outcome.
    #[serde(default = "default_action_delay_ms")]
    pub action_delay_ms: u64,

    /// Wall-clock budget for a whole run.
    #[serde(default = "default_run_budget_secs")]
    pub run_budget_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Recorded in the platform's audit log for every kick/ban.
    #[serde(default = "default_audit_reason")]
    pub audit_reason: String,

    /// Override for the REST API root (tests, proxies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

fn default_action() -> ActionKind {
    ActionKind::Kick
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_action_delay_ms() -> u64 {
    500
}

fn default_run_budget_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_audit_reason() -> String {
    "Bulk removal via bot".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            guild_id: None,
            default_action: default_action(),
            connect_timeout_secs: default_connect_timeout_secs(),
            action_delay_ms: default_action_delay_ms(),
            run_budget_secs: default_run_budget_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            audit_reason: default_audit_reason(),
            api_base: None,
        }
    }
}

impl Config {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        io::atomic_write(path, content.as_bytes())
    }

    pub fn community(&self) -> Result<Option<CommunityId>> {
        self.guild_id.as_deref().map(str::parse).transpose()
    }

    pub fn executor(&self) -> ExecutorConfig {
        ExecutorConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            action_delay: Duration::from_millis(self.action_delay_ms).max(MIN_ACTION_DELAY),
            run_budget: Duration::from_secs(self.run_budget_secs),
            audit_reason: self.audit_reason.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut push = |level: WarnLevel, message: String| {
            warnings.push(ConfigWarning { level, message });
        };

        if self.action_delay_ms < MIN_ACTION_DELAY.as_millis() as u64 {
            push(
                WarnLevel::Error,
                format!(
                    "action_delay_ms is {} but the platform's abuse limits need at least {}ms",
                    self.action_delay_ms,
                    MIN_ACTION_DELAY.as_millis()
                ),
            );
        }
        if self.connect_timeout_secs == 0 {
            push(
                WarnLevel::Error,
                "connect_timeout_secs must be greater than 0".to_string(),
            );
        }
        if self.run_budget_secs == 0 {
            push(
                WarnLevel::Error,
                "run_budget_secs must be greater than 0".to_string(),
            );
        } else if self.run_budget_secs > MAX_RUN_BUDGET.as_secs() {
            push(
                WarnLevel::Error,
                format!(
                    "run_budget_secs ({}) exceeds the maximum of {}",
                    self.run_budget_secs,
                    MAX_RUN_BUDGET.as_secs()
                ),
            );
        } else if self.run_budget_secs.saturating_mul(1000) <= self.action_delay_ms {
            push(
                WarnLevel::Warning,
                format!(
                    "run_budget_secs ({}) is shorter than one action delay; at most one member will be processed",
                    self.run_budget_secs
                ),
            );
        }
        if self.audit_reason.trim().is_empty() {
            push(
                WarnLevel::Warning,
                "audit_reason is empty; removals will carry no audit log reason".to_string(),
            );
        }
        if let Some(raw) = &self.guild_id {
            if raw.trim().parse::<u64>().is_err() {
                push(
                    WarnLevel::Error,
                    format!("guild_id '{raw}' is not a numeric snowflake"),
                );
            }
        }
        warnings
    }

    /// Fail on the first error-level warning.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(PurgeError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}
