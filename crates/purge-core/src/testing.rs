//! In-memory platform used by the orchestrator tests.

use crate::credential::Credential;
use crate::member::{CommunityId, Member, UserId};
use crate::platform::{Platform, PlatformError, Session};
use crate::report::RunReport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub(crate) const BOT_ID: UserId = UserId(999);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Open,
    Members,
    Kick(UserId),
    Ban(UserId),
    Close,
}

impl Call {
    fn is_destructive(&self) -> bool {
        matches!(self, Call::Kick(_) | Call::Ban(_))
    }
}

#[derive(Default)]
struct Log {
    calls: Vec<Call>,
    /// Outcomes already recorded when each destructive call was issued.
    observed: Vec<usize>,
}

pub(crate) fn member(id: u64, username: &str, disc: &str, display: &str, roles: &[u64]) -> Member {
    Member {
        id: UserId(id),
        username: username.to_string(),
        discriminator: disc.to_string(),
        display_name: display.to_string(),
        roles: roles.to_vec(),
    }
}

/// `alice#1` (2 roles), `bob#2` (no optional roles), and the bot itself.
pub(crate) fn sample_roster() -> Vec<Member> {
    vec![
        member(1, "alice", "1", "Alice", &[10, 11]),
        member(2, "bob", "2", "Bobby", &[]),
        member(BOT_ID.0, "purgebot", "0", "Purge Bot", &[50]),
    ]
}

#[derive(Clone)]
pub(crate) struct FakePlatform {
    members: Vec<Member>,
    open_error: Option<PlatformError>,
    open_delay: Option<Duration>,
    members_error: Option<PlatformError>,
    action_errors: HashMap<UserId, PlatformError>,
    action_latency: Duration,
    cancel_after: Option<(usize, CancellationToken)>,
    progress: Arc<Mutex<Option<watch::Receiver<RunReport>>>>,
    log: Arc<Mutex<Log>>,
}

impl FakePlatform {
    pub(crate) fn new(members: Vec<Member>) -> Self {
        Self {
            members,
            open_error: None,
            open_delay: None,
            members_error: None,
            action_errors: HashMap::new(),
            action_latency: Duration::ZERO,
            cancel_after: None,
            progress: Arc::new(Mutex::new(None)),
            log: Arc::new(Mutex::new(Log::default())),
        }
    }

    pub(crate) fn with_open_error(mut self, err: PlatformError) -> Self {
        self.open_error = Some(err);
        self
    }

    pub(crate) fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    pub(crate) fn with_members_error(mut self, err: PlatformError) -> Self {
        self.members_error = Some(err);
        self
    }

    pub(crate) fn with_action_error(mut self, id: u64, err: PlatformError) -> Self {
        self.action_errors.insert(UserId(id), err);
        self
    }

    pub(crate) fn with_action_latency(mut self, latency: Duration) -> Self {
        self.action_latency = latency;
        self
    }

    /// Trigger `token` once `n` destructive calls have been issued.
    pub(crate) fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    /// Watch run progress so destructive calls can note how many outcomes
    /// were already recorded.
    pub(crate) fn observe(&self, rx: watch::Receiver<RunReport>) {
        *self.progress.lock().unwrap() = Some(rx);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().calls.clone()
    }

    pub(crate) fn destructive_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_destructive).collect()
    }

    pub(crate) fn closes(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Close).count()
    }

    pub(crate) fn observed(&self) -> Vec<usize> {
        self.log.lock().unwrap().observed.clone()
    }

    fn push(&self, call: Call) {
        self.log.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl Platform for FakePlatform {
    type Session = FakeSession;

    async fn open(
        &self,
        _credential: &Credential,
        community: CommunityId,
    ) -> Result<FakeSession, PlatformError> {
        self.push(Call::Open);
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }
        Ok(FakeSession {
            platform: self.clone(),
            community,
        })
    }
}

pub(crate) struct FakeSession {
    platform: FakePlatform,
    community: CommunityId,
}

impl FakeSession {
    async fn act(&self, call: Call, id: UserId) -> Result<(), PlatformError> {
        if !self.platform.action_latency.is_zero() {
            tokio::time::sleep(self.platform.action_latency).await;
        }
        let issued = {
            let processed = self
                .platform
                .progress
                .lock()
                .unwrap()
                .as_ref()
                .map(|rx| rx.borrow().processed());
            let mut log = self.platform.log.lock().unwrap();
            if let Some(p) = processed {
                log.observed.push(p);
            }
            log.calls.push(call);
            log.calls.iter().filter(|c| c.is_destructive()).count()
        };
        if let Some((n, token)) = &self.platform.cancel_after {
            if issued >= *n {
                token.cancel();
            }
        }
        match self.platform.action_errors.get(&id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Session for FakeSession {
    fn self_id(&self) -> UserId {
        BOT_ID
    }

    fn community(&self) -> CommunityId {
        self.community
    }

    async fn members(&self) -> Result<Vec<Member>, PlatformError> {
        self.platform.push(Call::Members);
        match &self.platform.members_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.platform.members.clone()),
        }
    }

    async fn kick(&self, member: &Member, _reason: &str) -> Result<(), PlatformError> {
        self.act(Call::Kick(member.id), member.id).await
    }

    async fn ban(&self, member: &Member, _reason: &str) -> Result<(), PlatformError> {
        self.act(Call::Ban(member.id), member.id).await
    }

    async fn close(&mut self) {
        self.platform.push(Call::Close);
    }
}
