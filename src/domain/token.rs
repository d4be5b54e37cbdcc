use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, printable identifier for a shared session.
///
/// Invariant: non-empty, valid UTF-8, no control characters. Tokens are
/// either generated locally when this device becomes host, or received
/// verbatim from a peer's advertisement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TokenError {
    #[error("Session token is empty")]
    Empty,

    #[error("Session token contains control characters")]
    ControlCharacters,
}

impl SessionToken {
    /// Validate and wrap a token value.
    pub fn new(value: impl Into<String>) -> Result<Self, TokenError> {
        let value = value.into();
        if value.is_empty() {
            return Err(TokenError::Empty);
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(TokenError::ControlCharacters);
        }
        Ok(SessionToken(value))
    }

    /// Generate a fresh, collision-improbable token for a self-hosted
    /// session: `prefix` followed by the first 8 hex chars of a v4 UUID.
    pub fn generate(prefix: &str) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        SessionToken(format!("{}{}", prefix, &id[..8]))
    }

    /// Parse a discovery payload. Returns `None` for malformed input
    /// (empty, non-UTF-8, or containing control characters).
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let value = std::str::from_utf8(bytes).ok()?;
        SessionToken::new(value).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SessionToken {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        SessionToken::new(value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}
