//! Human-supplied member identifiers and case-insensitive merging of sources.

use crate::error::{PurgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// A trimmed, non-empty string that should match a member's username or
/// display name. Comparison is case-insensitive; the original spelling is
/// kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    raw: String,
    folded: String,
}

impl Identifier {
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        if raw.is_empty() {
            return Err(PurgeError::EmptyIdentifier);
        }
        Ok(Self {
            raw: raw.to_string(),
            folded: raw.to_lowercase(),
        })
    }

    /// The identifier as the caller spelled it (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Lower-cased form used for all comparisons.
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Case-insensitive comparison against a platform-side name.
    pub fn matches(&self, name: &str) -> bool {
        name.to_lowercase() == self.folded
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for Identifier {}

impl std::hash::Hash for Identifier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for Identifier {
    type Err = PurgeError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = PurgeError;
    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.raw
    }
}

// ---------------------------------------------------------------------------
// IdentifierSet
// ---------------------------------------------------------------------------

/// Ordered, case-insensitively deduplicated collection of identifiers.
///
/// The first spelling seen wins; later duplicates from any source are
/// dropped. Iteration follows first-seen order so a run's outcome order is
/// reproducible for a given input, even though the merge itself has set
/// semantics.
#[derive(Debug, Clone, Default)]
pub struct IdentifierSet {
    items: Vec<Identifier>,
    seen: HashSet<String>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw strings, skipping blanks.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        set.extend_raw(raw);
        set
    }

    /// Insert an identifier. Returns `false` if a case-insensitive duplicate
    /// was already present.
    pub fn insert(&mut self, id: Identifier) -> bool {
        if !self.seen.insert(id.folded.clone()) {
            return false;
        }
        self.items.push(id);
        true
    }

    /// Insert every non-blank string from `raw`. Returns how many were new.
    pub fn extend_raw<I, S>(&mut self, raw: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .filter_map(|s| Identifier::parse(s.as_ref()).ok())
            .filter(|id| self.insert(id.clone()))
            .count()
    }

    /// Union with another source.
    pub fn merge(&mut self, other: IdentifierSet) {
        for id in other.items {
            self.insert(id);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identifier> {
        self.items.iter()
    }
}

impl IntoIterator for IdentifierSet {
    type Item = Identifier;
    type IntoIter = std::vec::IntoIter<Identifier>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Identifier> for IdentifierSet {
    fn from_iter<T: IntoIterator<Item = Identifier>>(iter: T) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_blank() {
        let id = Identifier::parse("  Alice \t").unwrap();
        assert_eq!(id.as_str(), "Alice");
        assert_eq!(id.folded(), "alice");
        assert!(matches!(
            Identifier::parse("   "),
            Err(PurgeError::EmptyIdentifier)
        ));
    }

    #[test]
    fn equality_ignores_case() {
        let a = Identifier::parse("BOB").unwrap();
        let b = Identifier::parse("bob").unwrap();
        assert_eq!(a, b);
        assert!(a.matches("Bob"));
        assert!(!a.matches("bobby"));
    }

    #[test]
    fn set_keeps_first_spelling() {
        let set = IdentifierSet::from_raw(["Alice", "alice", "ALICE", "bob"]);
        let names: Vec<_> = set.iter().map(|i| i.as_str()).collect();
        assert_eq!(names, vec!["Alice", "bob"]);
    }

    #[test]
    fn set_skips_blank_cells() {
        let set = IdentifierSet::from_raw(["", "  ", "carol"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn merge_size_is_case_insensitive_union() {
        let mut file = IdentifierSet::from_raw(["alice", "Bob", "carol"]);
        let roleless = IdentifierSet::from_raw(["bob", "dave", "CAROL"]);
        file.merge(roleless);
        assert_eq!(file.len(), 4);
        let names: Vec<_> = file.iter().map(|i| i.as_str()).collect();
        assert_eq!(names, vec!["alice", "Bob", "carol", "dave"]);
    }

    #[test]
    fn serde_uses_plain_string() {
        let id = Identifier::parse("Zed").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Zed\"");
        let back: Identifier = serde_json::from_str("\" zed \"").unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<Identifier>("\"\"").is_err());
    }
}
