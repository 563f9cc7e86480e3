use crate::credential::Credential;
use crate::member::CommunityId;
use crate::platform::{Platform, Session};
use std::time::Duration;
use tracing::{error, info, warn};

/// Owns the single session a run uses.
///
/// `connect` never fails loudly: it logs why the session is unusable and
/// returns `false`. `disconnect` is idempotent.
pub struct ConnectionManager<'a, P: Platform> {
    platform: &'a P,
    timeout: Duration,
    session: Option<P::Session>,
    last_error: Option<String>,
}

impl<'a, P: Platform> ConnectionManager<'a, P> {
    pub fn new(platform: &'a P, timeout: Duration) -> Self {
        Self {
            platform,
            timeout,
            session: None,
            last_error: None,
        }
    }

    /// Authenticate and wait (at most `timeout`) for a usable session.
    ///
    /// Calling this while a session is live reuses it instead of opening a
    /// second one.
    pub async fn connect(&mut self, credential: &Credential, community: CommunityId) -> bool {
        if self.session.is_some() {
            warn!(%community, "connect called with a live session; reusing it");
            return true;
        }
        self.last_error = None;

        match tokio::time::timeout(self.timeout, self.platform.open(credential, community)).await
        {
            Ok(Ok(session)) => {
                info!(bot = %session.self_id(), %community, "session ready");
                self.session = Some(session);
                true
            }
            Ok(Err(e)) => {
                error!(%community, error = %e, "failed to connect");
                self.last_error = Some(e.to_string());
                false
            }
            Err(_elapsed) => {
                let secs = self.timeout.as_secs_f64();
                error!(%community, timeout_secs = secs, "timed out waiting for session");
                self.last_error = Some(format!("no usable session within {secs}s"));
                false
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&P::Session> {
        self.session.as_ref()
    }

    /// Why the last `connect` returned `false`, for diagnostics.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
            info!(community = %session.community(), "session closed");
        }
    }
}

impl<P: Platform> Drop for ConnectionManager<'_, P> {
    fn drop(&mut self) {
        if self.session.is_some() {
            warn!("connection manager dropped with a live session; call disconnect() first");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;
    use crate::testing::{sample_roster, Call, FakePlatform, BOT_ID};

    const GUILD: CommunityId = CommunityId(42);

    fn cred() -> Credential {
        Credential::new("token")
    }

    #[tokio::test]
    async fn connect_exposes_session() {
        let platform = FakePlatform::new(sample_roster());
        let mut conn = ConnectionManager::new(&platform, Duration::from_secs(10));
        assert!(conn.connect(&cred(), GUILD).await);
        assert!(conn.is_connected());
        let session = conn.session().unwrap();
        assert_eq!(session.self_id(), BOT_ID);
        assert_eq!(session.community(), GUILD);
        conn.disconnect().await;
    }

    #[tokio::test]
    async fn invalid_credential_returns_false() {
        let platform = FakePlatform::new(vec![]).with_open_error(PlatformError::Unauthorized);
        let mut conn = ConnectionManager::new(&platform, Duration::from_secs(10));
        assert!(!conn.connect(&cred(), GUILD).await);
        assert!(!conn.is_connected());
        assert!(conn.last_error().unwrap().contains("authentication rejected"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_handshake_times_out() {
        let platform = FakePlatform::new(vec![]).with_open_delay(Duration::from_secs(60));
        let mut conn = ConnectionManager::new(&platform, Duration::from_secs(10));
        assert!(!conn.connect(&cred(), GUILD).await);
        assert!(conn.last_error().unwrap().contains("10"));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let platform = FakePlatform::new(sample_roster());
        let mut conn = ConnectionManager::new(&platform, Duration::from_secs(10));

        // Never connected
        conn.disconnect().await;
        assert_eq!(platform.closes(), 0);

        assert!(conn.connect(&cred(), GUILD).await);
        conn.disconnect().await;
        conn.disconnect().await;
        assert_eq!(platform.closes(), 1);
    }

    #[tokio::test]
    async fn second_connect_reuses_session() {
        let platform = FakePlatform::new(sample_roster());
        let mut conn = ConnectionManager::new(&platform, Duration::from_secs(10));
        assert!(conn.connect(&cred(), GUILD).await);
        assert!(conn.connect(&cred(), GUILD).await);
        let opens = platform.calls().iter().filter(|c| **c == Call::Open).count();
        assert_eq!(opens, 1);
        conn.disconnect().await;
    }
}
