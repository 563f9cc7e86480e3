use std::time::Duration;

use async_trait::async_trait;
use purge_core::{CommunityId, Credential, Member, Platform, PlatformError, Session, UserId};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::error::DiscordError;
use crate::types::{codes, ApiError, Guild, GuildMember, User};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Largest page the member listing endpoint accepts.
const MAX_PAGE_SIZE: usize = 1000;

/// Used when a 429 carries no usable `retry_after`.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Longest wait honoured from a 429, whatever the server asks for.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

// ─── ClientOptions ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// API root without a trailing slash.
    pub api_base: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Members requested per listing page (1–1000).
    pub page_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(15),
            page_size: MAX_PAGE_SIZE,
        }
    }
}

// ─── DiscordPlatform ──────────────────────────────────────────────────────

/// Opens [`DiscordSession`]s. Cheap to clone; the HTTP connection pool is
/// shared.
#[derive(Debug, Clone)]
pub struct DiscordPlatform {
    http: reqwest::Client,
    api_base: String,
    page_size: usize,
}

impl DiscordPlatform {
    pub fn new(opts: ClientOptions) -> Result<Self, DiscordError> {
        let api_base = opts.api_base.trim_end_matches('/').to_string();
        if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
            return Err(DiscordError::InvalidBaseUrl(opts.api_base));
        }
        let http = reqwest::Client::builder()
            .timeout(opts.request_timeout)
            .user_agent(concat!(
                "DiscordBot (https://github.com/orchard9/guild-purge, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;
        Ok(Self {
            http,
            api_base,
            page_size: opts.page_size.clamp(1, MAX_PAGE_SIZE),
        })
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    type Session = DiscordSession;

    async fn open(
        &self,
        credential: &Credential,
        community: CommunityId,
    ) -> Result<DiscordSession, PlatformError> {
        let auth = format!("Bot {}", credential.expose());

        let me: User = send(
            self.http
                .get(format!("{}/users/@me", self.api_base))
                .header("Authorization", &auth),
        )
        .await?
        .json()
        .await
        .map_err(malformed)?;
        let me_id = me
            .user_id()
            .ok_or_else(|| PlatformError::Transport(format!("malformed user id '{}'", me.id)))?;
        debug!(bot = %me.username, id = %me_id, "authenticated");

        let guild: Guild = send(
            self.http
                .get(format!("{}/guilds/{}", self.api_base, community))
                .header("Authorization", &auth),
        )
        .await
        .map_err(|e| match e {
            PlatformError::Api { status: 404, .. } | PlatformError::Forbidden(_) => {
                PlatformError::UnknownCommunity(community)
            }
            other => other,
        })?
        .json()
        .await
        .map_err(malformed)?;
        debug!(guild = %guild.name, id = %guild.id, "guild located");

        Ok(DiscordSession {
            http: self.http.clone(),
            api_base: self.api_base.clone(),
            page_size: self.page_size,
            auth,
            me: me_id,
            guild: community,
            guild_name: guild.name,
            closed: false,
        })
    }
}

// ─── DiscordSession ───────────────────────────────────────────────────────

/// An authenticated bot bound to one guild.
pub struct DiscordSession {
    http: reqwest::Client,
    api_base: String,
    page_size: usize,
    auth: String,
    me: UserId,
    guild: CommunityId,
    guild_name: String,
    closed: bool,
}

impl std::fmt::Debug for DiscordSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSession")
            .field("api_base", &self.api_base)
            .field("auth", &"<redacted>")
            .field("me", &self.me)
            .field("guild", &self.guild)
            .field("guild_name", &self.guild_name)
            .field("closed", &self.closed)
            .finish()
    }
}

impl DiscordSession {
    pub fn guild_name(&self) -> &str {
        &self.guild_name
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, PlatformError> {
        if self.closed {
            return Err(PlatformError::Transport("session closed".into()));
        }
        Ok(self
            .http
            .request(method, format!("{}{}", self.api_base, path))
            .header("Authorization", &self.auth))
    }

    fn member_path(&self, member: &Member) -> String {
        format!("/guilds/{}/members/{}", self.guild, member.id)
    }
}

#[async_trait]
impl Session for DiscordSession {
    fn self_id(&self) -> UserId {
        self.me
    }

    fn community(&self) -> CommunityId {
        self.guild
    }

    async fn members(&self) -> Result<Vec<Member>, PlatformError> {
        let mut members = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let path = format!("/guilds/{}/members", self.guild);
            let mut req = self
                .request(Method::GET, &path)?
                .query(&[("limit", self.page_size.to_string())]);
            if let Some(after) = &after {
                req = req.query(&[("after", after)]);
            }
            let page: Vec<GuildMember> = send(req)
                .await?
                .json()
                .await
                .map_err(malformed)?;
            let page_len = page.len();
            after = page
                .last()
                .and_then(|m| m.user.as_ref())
                .map(|u| u.id.clone());

            for gm in page {
                match gm.into_member() {
                    Some(m) => members.push(m),
                    None => warn!(guild = %self.guild, "skipping member without a valid user"),
                }
            }

            if page_len < self.page_size || after.is_none() {
                break;
            }
        }

        debug!(guild = %self.guild, count = members.len(), "member listing complete");
        Ok(members)
    }

    async fn kick(&self, member: &Member, reason: &str) -> Result<(), PlatformError> {
        let req = self
            .request(Method::DELETE, &self.member_path(member))?
            .header("X-Audit-Log-Reason", audit_reason(reason));
        send(req).await.map_err(|e| unknown_member(e, member.id))?;
        Ok(())
    }

    async fn ban(&self, member: &Member, reason: &str) -> Result<(), PlatformError> {
        let path = format!("/guilds/{}/bans/{}", self.guild, member.id);
        let req = self
            .request(Method::PUT, &path)?
            .header("X-Audit-Log-Reason", audit_reason(reason))
            .json(&serde_json::json!({ "delete_message_seconds": 0 }));
        send(req).await.map_err(|e| unknown_member(e, member.id))?;
        Ok(())
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            debug!(guild = %self.guild, "session released");
        }
    }
}

// ─── Internal ─────────────────────────────────────────────────────────────

/// Send a request and turn every non-2xx response into a [`PlatformError`].
async fn send(req: RequestBuilder) -> Result<Response, PlatformError> {
    let resp = req.send().await.map_err(|e| {
        if e.is_timeout() {
            PlatformError::Transport("request timed out".into())
        } else {
            PlatformError::Transport(e.to_string())
        }
    })?;

    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let header_retry = resp
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<f64>().ok());
    let body: ApiError = resp.json().await.unwrap_or_default();
    Err(classify(status, body, header_retry))
}

fn classify(status: StatusCode, body: ApiError, header_retry: Option<f64>) -> PlatformError {
    match status {
        StatusCode::UNAUTHORIZED => PlatformError::Unauthorized,
        StatusCode::FORBIDDEN => PlatformError::Forbidden(if body.message.is_empty() {
            "Missing Permissions".to_string()
        } else {
            body.message
        }),
        StatusCode::TOO_MANY_REQUESTS => {
            PlatformError::RateLimited {
                retry_after: retry_after(body.retry_after.or(header_retry)),
            }
        }
        s if s.is_server_error() => PlatformError::Server { status: s.as_u16() },
        s => PlatformError::Api {
            status: s.as_u16(),
            code: body.code,
            message: body.message,
        },
    }
}

fn unknown_member(err: PlatformError, id: UserId) -> PlatformError {
    match err {
        PlatformError::Api { code, .. }
            if code == codes::UNKNOWN_MEMBER || code == codes::UNKNOWN_USER =>
        {
            PlatformError::UnknownMember(id)
        }
        PlatformError::Api {
            status: 404, code: 0, ..
        } => PlatformError::UnknownMember(id),
        other => other,
    }
}

fn malformed(e: reqwest::Error) -> PlatformError {
    PlatformError::Transport(format!("malformed response: {e}"))
}

/// Seconds from a 429 as a bounded wait. Negative, NaN and infinite values
/// fall back to the default.
fn retry_after(secs: Option<f64>) -> Duration {
    secs.filter(|s| s.is_finite() && *s >= 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .map_or(DEFAULT_RETRY_AFTER, |d| d.min(MAX_RETRY_AFTER))
}

/// Audit log reasons travel in a header and must be percent-encoded.
fn audit_reason(reason: &str) -> String {
    urlencoding::encode(reason).into_owned()
}

// ─── Tests ────────────────────────────────────────────────────────────────
