//! Membership resolution against a roster snapshot.
//!
//! A [`Roster`] is the member listing as the platform returned it at load
//! time. It is advisory: a member matched here may already be gone when the
//! destructive call lands, which surfaces as a platform error outcome rather
//! than a resolver concern.
//!
//! Matching order: every member's username is tried first, then every
//! member's display name. Within each pass the first hit in platform
//! iteration order wins. A username match therefore beats a display-name
//! match even when the display-name holder comes earlier in the listing. The platform does not promise a stable iteration
//! order, so two members sharing a display name may resolve differently
//! across runs.

use crate::connection::ConnectionManager;
use crate::identifier::{Identifier, IdentifierSet};
use crate::member::Member;
use crate::platform::{Platform, PlatformError, Session};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<Member>,
}

impl Roster {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub async fn load<S: Session>(session: &S) -> Result<Self, PlatformError> {
        let members = session.members().await?;
        debug!(count = members.len(), community = %session.community(), "roster loaded");
        Ok(Self::new(members))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn resolve(&self, identifier: &Identifier) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| identifier.matches(&m.username))
            .or_else(|| {
                self.members
                    .iter()
                    .find(|m| identifier.matches(&m.display_name))
            })
    }

    /// Usernames of members holding no optional roles.
    pub fn roleless(&self) -> IdentifierSet {
        IdentifierSet::from_raw(
            self.members
                .iter()
                .filter(|m| !m.has_optional_roles())
                .map(|m| m.username.as_str()),
        )
    }

    /// Resolve every identifier without acting on anything.
    pub fn preview<'r>(
        &'r self,
        identifiers: &'r IdentifierSet,
    ) -> Vec<(&'r Identifier, Option<&'r Member>)> {
        identifiers.iter().map(|id| (id, self.resolve(id))).collect()
    }
}

/// Members with zero optional roles in the connected community.
///
/// Soft-fails to an empty set when there is no session or the listing
/// fails; this feeds an optional filter, never a destructive path.
pub async fn list_roleless<P: Platform>(conn: &ConnectionManager<'_, P>) -> IdentifierSet {
    let Some(session) = conn.session() else {
        warn!("list_roleless called without a live session");
        return IdentifierSet::new();
    };
    match Roster::load(session).await {
        Ok(roster) => roster.roleless(),
        Err(e) => {
            warn!(community = %session.community(), error = %e, "could not list members");
            IdentifierSet::new()
        }
    }
}
