pub mod aggregator;
pub mod config;
pub mod connection;
pub mod credential;
pub mod error;
pub mod executor;
pub mod identifier;
pub mod io;
pub mod member;
pub mod outcome;
pub mod platform;
pub mod report;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::Aggregator;
pub use config::Config;
pub use connection::ConnectionManager;
pub use credential::Credential;
pub use error::{PurgeError, Result};
pub use executor::{Executor, ExecutorConfig, RunHandle, RunRequest};
pub use identifier::{Identifier, IdentifierSet};
pub use member::{CommunityId, Member, UserId};
pub use outcome::{ActionKind, Outcome};
pub use platform::{Platform, PlatformError, Session};
pub use report::{ReportEntry, RunReport, RunState};
pub use resolver::{list_roleless, Roster};
