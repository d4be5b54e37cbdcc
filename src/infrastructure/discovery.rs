use crate::domain::SessionToken;
use crate::infrastructure::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;

/// A peer advertisement received while listening.
///
/// The payload is the UTF-8 encoding of the advertised session token; no
/// further framing is defined at this boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryMessage {
    pub data: Vec<u8>,
    pub source: Option<String>,
}

impl DiscoveryMessage {
    pub fn new(data: Vec<u8>, source: Option<String>) -> Self {
        Self { data, source }
    }

    /// Decode the advertised token. `None` for malformed payloads, which
    /// must never affect controller state.
    pub fn session_token(&self) -> Option<SessionToken> {
        SessionToken::from_bytes(&self.data)
    }
}

/// Capability: listen for advertisements from nearby peers.
#[async_trait]
pub trait DiscoveryService: Send + Sync {
    /// Start listening. On success, returns the stream of messages for
    /// this listening period; the stream yields nothing once `try_stop`
    /// has completed. Fails when the capability is unavailable or the
    /// underlying transport cannot start.
    async fn try_start(&self) -> Result<UnboundedReceiver<DiscoveryMessage>>;

    /// Stop listening. Idempotent; stopping an inactive listener is a
    /// no-op.
    async fn try_stop(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_decodes_valid_token() {
        let msg = DiscoveryMessage::new(b"coloc-1a2b3c4d".to_vec(), None);
        assert_eq!(msg.session_token().unwrap().as_str(), "coloc-1a2b3c4d");
    }

    #[test]
    fn test_message_rejects_empty_payload() {
        let msg = DiscoveryMessage::new(Vec::new(), None);
        assert!(msg.session_token().is_none());
    }

    #[test]
    fn test_message_rejects_non_utf8_payload() {
        let msg = DiscoveryMessage::new(vec![0xff, 0x00, 0x9c], None);
        assert!(msg.session_token().is_none());
    }
}
