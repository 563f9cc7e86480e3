//! The seam between the orchestrator and the remote community platform.
//!
//! The orchestrator never speaks a wire protocol itself. It drives a
//! [`Platform`] to obtain an owned [`Session`], and issues every read and
//! destructive call through that session. `discord-rest` provides the real
//! implementation; tests use an in-memory one.

use crate::credential::Credential;
use crate::member::{CommunityId, Member, UserId};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlatformError {
    #[error("authentication rejected: the bot token is invalid")]
    Unauthorized,

    #[error("missing permissions: {0}")]
    Forbidden(String),

    #[error("community {0} not found or not visible to the bot")]
    UnknownCommunity(CommunityId),

    #[error("member {0} is no longer in the community")]
    UnknownMember(UserId),

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("platform unavailable (HTTP {status})")]
    Server { status: u16 },

    #[error("HTTP {status} (code {code}): {message}")]
    Api {
        status: u16,
        code: u64,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

impl PlatformError {
    /// Failures that say nothing about the target itself: the same call may
    /// succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlatformError::RateLimited { .. }
                | PlatformError::Server { .. }
                | PlatformError::Transport(_)
        )
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self, PlatformError::Forbidden(_))
    }
}

/// Factory for sessions against one platform.
#[async_trait]
pub trait Platform: Send + Sync {
    type Session: Session;

    /// Authenticate and locate `community`. Resolves once the session is
    /// usable; callers bound the wait themselves.
    async fn open(
        &self,
        credential: &Credential,
        community: CommunityId,
    ) -> Result<Self::Session, PlatformError>;
}

/// A live, authenticated session bound to one community.
#[async_trait]
pub trait Session: Send + Sync {
    /// The bot's own user id. Never a valid removal target.
    fn self_id(&self) -> UserId;

    fn community(&self) -> CommunityId;

    /// Full member listing, in platform iteration order.
    async fn members(&self) -> Result<Vec<Member>, PlatformError>;

    async fn kick(&self, member: &Member, reason: &str) -> Result<(), PlatformError>;

    /// Ban without deleting any of the member's message history.
    async fn ban(&self, member: &Member, reason: &str) -> Result<(), PlatformError>;

    /// Release the session. Must be safe to call more than once.
    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(PlatformError::Transport("reset".into()).is_transient());
        assert!(PlatformError::Server { status: 502 }.is_transient());
        assert!(PlatformError::RateLimited {
            retry_after: Duration::from_secs(1)
        }
        .is_transient());
        assert!(!PlatformError::UnknownMember(UserId(1)).is_transient());
        assert!(!PlatformError::Forbidden("kick".into()).is_transient());
        assert!(PlatformError::Forbidden("kick".into()).is_authorization());
    }
}
