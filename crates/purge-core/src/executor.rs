//! Rate-limited removal runs.
//!
//! A run connects once, loads the roster, then walks the identifiers
//! strictly in order: resolve, guard against removing the bot itself, issue
//! the destructive call, record the outcome, pause. The pause follows every
//! identifier, including misses, because the platform polices request
//! cadence rather than per-call cost.
//!
//! Cancellation and the wall-clock budget are checked only between
//! identifiers; an issued kick or ban is never aborted and never undone.
//! The session is released exactly once on every exit path.

use crate::aggregator::Aggregator;
use crate::connection::ConnectionManager;
use crate::credential::Credential;
use crate::error::{PurgeError, Result};
use crate::identifier::{Identifier, IdentifierSet};
use crate::member::CommunityId;
use crate::outcome::{ActionKind, Outcome};
use crate::platform::{Platform, PlatformError, Session};
use crate::report::{RunReport, RunState};
use crate::resolver::Roster;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Floor for the pause between identifiers.
pub const MIN_ACTION_DELAY: Duration = Duration::from_millis(500);

/// Ceiling for the wall-clock budget of one run.
pub const MAX_RUN_BUDGET: Duration = Duration::from_secs(7 * 24 * 3600);

// ---------------------------------------------------------------------------
// ExecutorConfig / RunRequest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub connect_timeout: Duration,
    pub action_delay: Duration,
    pub run_budget: Duration,
    pub audit_reason: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            action_delay: MIN_ACTION_DELAY,
            run_budget: Duration::from_secs(300),
            audit_reason: "Bulk removal via bot".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub credential: Credential,
    pub community: CommunityId,
    pub action: ActionKind,
    pub identifiers: IdentifierSet,
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct Executor<P: Platform> {
    platform: P,
    config: ExecutorConfig,
}

impl<P: Platform> Executor<P> {
    pub fn new(platform: P, config: ExecutorConfig) -> Self {
        Self { platform, config }
    }

    /// Drive one run to a terminal state on the current task.
    ///
    /// Progress is published through `aggregator`; the returned report is the
    /// sealed final snapshot.
    pub async fn execute(
        &self,
        request: &RunRequest,
        aggregator: &mut Aggregator,
        cancel: &CancellationToken,
    ) -> RunReport {
        let deadline = Instant::now() + self.config.run_budget.min(MAX_RUN_BUDGET);
        info!(
            action = %request.action,
            community = %request.community,
            identifiers = request.identifiers.len(),
            "run starting"
        );

        aggregator.set_state(RunState::Connecting);
        let mut conn = ConnectionManager::new(&self.platform, self.config.connect_timeout);

        let state = if conn.connect(&request.credential, request.community).await {
            match conn.session() {
                Some(session) => {
                    self.drive(session, request, aggregator, cancel, deadline)
                        .await
                }
                None => RunState::Completed,
            }
        } else {
            let reason = conn.last_error().unwrap_or("no usable session");
            aggregator.set_diagnostic(format!("could not connect: {reason}"));
            RunState::Completed
        };

        conn.disconnect().await;

        let report = aggregator.finish(state);
        info!(
            state = %report.state,
            removed = report.removed_count(),
            failed = report.failed_count(),
            "run finished"
        );
        report
    }

    async fn drive(
        &self,
        session: &P::Session,
        request: &RunRequest,
        aggregator: &mut Aggregator,
        cancel: &CancellationToken,
        deadline: Instant,
    ) -> RunState {
        aggregator.set_state(RunState::Running);

        let roster = match Roster::load(session).await {
            Ok(roster) => roster,
            Err(e) => {
                error!(error = %e, "could not load member roster");
                aggregator.set_diagnostic(format!("could not load member roster: {e}"));
                return RunState::Completed;
            }
        };

        let total = request.identifiers.len();
        for (index, identifier) in request.identifiers.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(processed = index, total, "run cancelled");
                return RunState::Cancelled;
            }
            if Instant::now() >= deadline {
                warn!(processed = index, total, "run budget exhausted");
                return RunState::TimedOut;
            }

            let (outcome, pause) = self
                .apply(session, &roster, identifier, request.action)
                .await;
            aggregator.record(identifier, outcome);

            if index + 1 < total {
                // Never sleep past the budget; the deadline check above ends the run.
                let wake = Instant::now()
                    .checked_add(pause)
                    .map_or(deadline, |t| t.min(deadline));
                tokio::select! {
                    _ = tokio::time::sleep_until(wake) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        RunState::Completed
    }

    /// Resolve and act on a single identifier. Returns the outcome and how
    /// long to wait before the next identifier.
    async fn apply(
        &self,
        session: &P::Session,
        roster: &Roster,
        identifier: &Identifier,
        action: ActionKind,
    ) -> (Outcome, Duration) {
        let pause = self.config.action_delay;

        let Some(member) = roster.resolve(identifier) else {
            warn!(identifier = %identifier, "user not found");
            return (Outcome::NotFound, pause);
        };
        if member.id == session.self_id() {
            warn!(identifier = %identifier, "refusing to remove the bot itself");
            return (Outcome::SkippedSelf, pause);
        }

        let reason = self.config.audit_reason.as_str();
        let result = match action {
            ActionKind::Kick => session.kick(member, reason).await,
            ActionKind::Ban => session.ban(member, reason).await,
        };

        match result {
            Ok(()) => {
                info!(handle = %member.handle(), %action, "member removed");
                (Outcome::Removed(member.handle()), pause)
            }
            Err(e) => {
                error!(identifier = %identifier, handle = %member.handle(), error = %e, "removal failed");
                let pause = match &e {
                    PlatformError::RateLimited { retry_after } => pause.max(*retry_after),
                    _ => pause,
                };
                (Outcome::from_platform_error(&e), pause)
            }
        }
    }
}

impl<P> Executor<P>
where
    P: Platform + 'static,
    P::Session: 'static,
{
    /// Run on a dedicated task. The caller keeps a [`RunHandle`] to watch
    /// progress, cancel, and collect the final report.
    pub fn spawn(self, request: RunRequest) -> RunHandle {
        let mut aggregator = Aggregator::new(request.action, request.identifiers.len());
        let progress = aggregator.subscribe();
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            self.execute(&request, &mut aggregator, &token).await
        });

        RunHandle {
            progress,
            cancel,
            task,
        }
    }
}

// ---------------------------------------------------------------------------
// RunHandle
// ---------------------------------------------------------------------------

/// Observer side of a spawned run. Everything it exposes is a value copy.
pub struct RunHandle {
    progress: watch::Receiver<RunReport>,
    cancel: CancellationToken,
    task: JoinHandle<RunReport>,
}

impl RunHandle {
    pub fn snapshot(&self) -> RunReport {
        self.progress.borrow().clone()
    }

    /// A receiver that wakes on every published snapshot.
    pub fn progress(&self) -> watch::Receiver<RunReport> {
        self.progress.clone()
    }

    /// Request cooperative cancellation. Takes effect before the next
    /// identifier; an in-flight call completes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn join(self) -> Result<RunReport> {
        self.task
            .await
            .map_err(|e| PurgeError::RunAborted(e.to_string()))
    }
}
