//! `discord-rest`: Discord REST v10 binding for `purge-core`.
//!
//! Implements [`purge_core::Platform`] and [`purge_core::Session`] over
//! plain HTTPS so the orchestrator can run against a real guild without a
//! gateway connection.
//!
//! # Architecture
//!
//! ```text
//! ClientOptions
//!     │
//!     ▼
//! DiscordPlatform   ← shared reqwest::Client, API root
//!     │  open(): GET /users/@me, GET /guilds/{id}
//!     ▼
//! DiscordSession    ← bot identity + guild, owned by the run
//!     │  members(): GET /guilds/{id}/members (paginated)
//!     │  kick():    DELETE /guilds/{id}/members/{user}
//!     │  ban():     PUT /guilds/{id}/bans/{user}
//!     ▼
//! wire types        ← serde structs for the JSON bodies we read
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use discord_rest::{ClientOptions, DiscordPlatform};
//! use purge_core::{Credential, CommunityId, Platform, Session};
//!
//! let platform = DiscordPlatform::new(ClientOptions::default())?;
//! let session = platform
//!     .open(&Credential::new(token), CommunityId(1393935478503243917))
//!     .await?;
//! let members = session.members().await?;
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientOptions, DiscordPlatform, DiscordSession, DEFAULT_API_BASE};
pub use error::DiscordError;
