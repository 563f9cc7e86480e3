use crate::error::{PurgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-assigned numeric user identity (a Discord snowflake).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The community (guild) a run targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub u64);

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CommunityId {
    type Err = PurgeError;
    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(CommunityId)
            .map_err(|_| PurgeError::InvalidCommunityId(s.to_string()))
    }
}

/// A member record as the platform reported it at listing time.
///
/// `roles` holds optional role assignments only; the implicit baseline role
/// every member carries is never listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: UserId,
    pub username: String,
    pub discriminator: String,
    pub display_name: String,
    #[serde(default)]
    pub roles: Vec<u64>,
}

impl Member {
    /// Primary handle plus discriminant, e.g. `alice#1`. This is what the
    /// report records for a removal, not the identifier the caller typed.
    pub fn handle(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }

    pub fn has_optional_roles(&self) -> bool {
        !self.roles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_includes_discriminator() {
        let m = Member {
            id: UserId(7),
            username: "alice".into(),
            discriminator: "1".into(),
            display_name: "Alice A".into(),
            roles: vec![10, 11],
        };
        assert_eq!(m.handle(), "alice#1");
        assert!(m.has_optional_roles());
    }

    #[test]
    fn community_id_parses_snowflake() {
        let id: CommunityId = " 1393935478503243917 ".parse().unwrap();
        assert_eq!(id.0, 1393935478503243917);
        assert!("guild-name".parse::<CommunityId>().is_err());
    }
}
