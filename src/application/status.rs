use crate::domain::BridgeState;
use serde::{Deserialize, Serialize};

/// Read-only snapshot for observers (UI, logging).
///
/// Published on every transition; `last_failure` carries the most recent
/// session-start failure reason and is cleared when a new discovery
/// attempt begins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub state: BridgeState,
    pub session_token: Option<String>,
    pub is_connected: bool,
    pub participant_count: usize,
    pub last_failure: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot() {
        let status = BridgeStatus::default();
        assert_eq!(status.state, BridgeState::Idle);
        assert!(status.session_token.is_none());
        assert!(!status.is_connected);
        assert_eq!(status.participant_count, 0);
    }

    #[test]
    fn test_serializes_for_observers() {
        let status = BridgeStatus {
            state: BridgeState::Connected,
            session_token: Some("coloc-1a2b3c4d".to_string()),
            is_connected: true,
            participant_count: 2,
            last_failure: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "connected");
        assert_eq!(json["participant_count"], 2);
    }
}
