//! Wire types for the subset of the Discord API this crate reads.
//!
//! Snowflakes arrive as JSON strings and are parsed at the conversion
//! boundary. Unknown fields are ignored.

use purge_core::{Member, UserId};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default = "default_discriminator")]
    pub discriminator: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

fn default_discriminator() -> String {
    "0".to_string()
}

impl User {
    pub fn user_id(&self) -> Option<UserId> {
        self.id.parse().ok().map(UserId)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuildMember {
    /// Absent only in some gateway payloads; REST listings always carry it.
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    /// Role ids, excluding the implicit @everyone role.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl GuildMember {
    /// Convert to the orchestrator's member record. Display name follows
    /// Discord's precedence: guild nickname, then global name, then username.
    pub fn into_member(self) -> Option<Member> {
        let user = self.user?;
        let id = user.user_id()?;
        let display_name = self
            .nick
            .or(user.global_name)
            .unwrap_or_else(|| user.username.clone());
        Some(Member {
            id,
            username: user.username,
            discriminator: user.discriminator,
            display_name,
            roles: self.roles.iter().filter_map(|r| r.parse().ok()).collect(),
        })
    }
}

/// JSON error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u64,
    #[serde(default)]
    pub message: String,
    /// Seconds; present on 429 responses.
    #[serde(default)]
    pub retry_after: Option<f64>,
}

/// Error codes the session maps to dedicated platform errors.
pub mod codes {
    pub const UNKNOWN_MEMBER: u64 = 10007;
    pub const UNKNOWN_USER: u64 = 10013;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_prefers_nickname_then_global_name() {
        let json = r#"{
            "user": {"id": "81384788765712384", "username": "alice", "discriminator": "0", "global_name": "Alice A"},
            "nick": "Al",
            "roles": ["41771983423143936", "41771983423143937"],
            "joined_at": "2015-04-26T06:26:56.936000+00:00"
        }"#;
        let gm: GuildMember = serde_json::from_str(json).unwrap();
        let member = gm.into_member().unwrap();
        assert_eq!(member.id, UserId(81384788765712384));
        assert_eq!(member.display_name, "Al");
        assert_eq!(member.roles.len(), 2);
        assert_eq!(member.handle(), "alice#0");

        let json = r#"{"user": {"id": "2", "username": "bob", "global_name": "Bobby"}, "roles": []}"#;
        let member = serde_json::from_str::<GuildMember>(json)
            .unwrap()
            .into_member()
            .unwrap();
        assert_eq!(member.display_name, "Bobby");
        assert_eq!(member.discriminator, "0");
        assert!(!member.has_optional_roles());
    }

    #[test]
    fn member_without_user_is_skipped() {
        let gm: GuildMember = serde_json::from_str(r#"{"roles": []}"#).unwrap();
        assert!(gm.into_member().is_none());
    }

    #[test]
    fn parse_rate_limit_body() {
        let body: ApiError = serde_json::from_str(
            r#"{"message": "You are being rate limited.", "retry_after": 1.25, "global": false}"#,
        )
        .unwrap();
        assert_eq!(body.code, 0);
        assert_eq!(body.retry_after, Some(1.25));
    }
}
