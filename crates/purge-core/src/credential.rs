use crate::error::{PurgeError, Result};
use crate::member::UserId;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use std::fmt;

/// Long-lived bot token. Never printed: `Debug` and `Display` redact it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_string())
    }

    /// Raw token for the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Offline sanity check: a bot token is three dot-separated segments and
    /// the first one is the bot's user id in base64. Returns that id without
    /// contacting the platform.
    pub fn bot_id_hint(&self) -> Result<UserId> {
        let parts: Vec<&str> = self.0.split('.').collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(PurgeError::InvalidToken(
                "expected three dot-separated segments".into(),
            ));
        }
        let head = parts[0].trim_end_matches('=');
        let bytes = STANDARD_NO_PAD
            .decode(head)
            .or_else(|_| URL_SAFE_NO_PAD.decode(head))
            .map_err(|e| PurgeError::InvalidToken(format!("first segment is not base64: {e}")))?;
        let text = String::from_utf8(bytes)
            .map_err(|_| PurgeError::InvalidToken("first segment is not UTF-8".into()))?;
        text.parse::<u64>()
            .map(UserId)
            .map_err(|_| PurgeError::InvalidToken("first segment is not a user id".into()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_for(id: &str) -> String {
        format!("{}.GhIjKl.abcdefghijklmnopqrstuvwxyz", STANDARD_NO_PAD.encode(id))
    }

    #[test]
    fn bot_id_hint_decodes_first_segment() {
        let cred = Credential::new(token_for("1234567890123456789"));
        assert_eq!(cred.bot_id_hint().unwrap(), UserId(1234567890123456789));
    }

    #[test]
    fn bot_id_hint_tolerates_padding() {
        let padded = format!("{}==.x.y", STANDARD_NO_PAD.encode("42"));
        assert_eq!(Credential::new(padded).bot_id_hint().unwrap(), UserId(42));
    }

    #[test]
    fn bot_id_hint_rejects_wrong_shape() {
        assert!(Credential::new("not-a-token").bot_id_hint().is_err());
        assert!(Credential::new("a..b").bot_id_hint().is_err());
        let non_numeric = format!("{}.x.y", STANDARD_NO_PAD.encode("hello"));
        assert!(Credential::new(non_numeric).bot_id_hint().is_err());
    }

    #[test]
    fn debug_never_shows_token() {
        let cred = Credential::new("super.secret.token");
        assert!(!format!("{cred:?}").contains("secret"));
        assert!(!cred.to_string().contains("secret"));
    }
}
