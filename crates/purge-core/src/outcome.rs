use crate::error::{PurgeError, Result};
use crate::platform::PlatformError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// The destructive call applied to every resolved member in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Kick,
    /// Ban; message history is never purged.
    Ban,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Kick => "kick",
            ActionKind::Ban => "ban",
        }
    }

    /// Past tense for user-facing summaries ("kicked", "banned").
    pub fn past_tense(&self) -> &'static str {
        match self {
            ActionKind::Kick => "kicked",
            ActionKind::Ban => "banned",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = PurgeError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kick" => Ok(ActionKind::Kick),
            "ban" => Ok(ActionKind::Ban),
            _ => Err(PurgeError::InvalidAction(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What happened to one identifier. Produced exactly once per identifier per
/// run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    /// Removed; carries the member's `handle#discriminator`.
    Removed(String),
    SkippedSelf,
    NotFound,
    PermissionDenied,
    PlatformError(String),
    TransientError(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Removed(_))
    }

    /// Short reason shown next to a failed identifier, e.g. `carol (User not found)`.
    pub fn reason(&self) -> Option<String> {
        match self {
            Outcome::Removed(_) => None,
            Outcome::SkippedSelf => Some("Cannot remove bot itself".to_string()),
            Outcome::NotFound => Some("User not found".to_string()),
            Outcome::PermissionDenied => Some("No permission".to_string()),
            Outcome::PlatformError(detail) => Some(format!("Discord error: {detail}")),
            Outcome::TransientError(detail) => Some(format!("Transient error: {detail}")),
        }
    }

    /// Classify a failed destructive call.
    pub fn from_platform_error(err: &PlatformError) -> Self {
        if err.is_authorization() {
            Outcome::PermissionDenied
        } else if err.is_transient() {
            Outcome::TransientError(err.to_string())
        } else {
            Outcome::PlatformError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::UserId;
    use std::time::Duration;

    #[test]
    fn action_kind_parses_case_insensitively() {
        assert_eq!("KICK".parse::<ActionKind>().unwrap(), ActionKind::Kick);
        assert_eq!(" ban ".parse::<ActionKind>().unwrap(), ActionKind::Ban);
        assert!("mute".parse::<ActionKind>().is_err());
    }

    #[test]
    fn classify_platform_errors() {
        assert_eq!(
            Outcome::from_platform_error(&PlatformError::Forbidden("Missing Permissions".into())),
            Outcome::PermissionDenied
        );
        assert!(matches!(
            Outcome::from_platform_error(&PlatformError::RateLimited {
                retry_after: Duration::from_secs(2)
            }),
            Outcome::TransientError(_)
        ));
        // Gone between listing and action
        assert!(matches!(
            Outcome::from_platform_error(&PlatformError::UnknownMember(UserId(9))),
            Outcome::PlatformError(_)
        ));
    }

    #[test]
    fn reasons() {
        assert_eq!(Outcome::NotFound.reason().unwrap(), "User not found");
        assert_eq!(
            Outcome::SkippedSelf.reason().unwrap(),
            "Cannot remove bot itself"
        );
        assert!(Outcome::Removed("alice#1".into()).reason().is_none());
    }

    #[test]
    fn serializes_with_tag() {
        let json = serde_json::to_value(Outcome::Removed("bob#2".into())).unwrap();
        assert_eq!(json["type"], "removed");
        assert_eq!(json["detail"], "bob#2");
        let json = serde_json::to_value(Outcome::NotFound).unwrap();
        assert_eq!(json["type"], "not_found");
    }
}
