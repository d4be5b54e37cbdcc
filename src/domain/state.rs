use serde::{Deserialize, Serialize};

/// Bootstrap protocol state.
///
/// `Idle` and `Connected` are the resting states; `Discovering` and
/// `Advertising` are ongoing. A device that elected itself host stays in
/// `Advertising` until teardown so nearby peers can keep finding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    Idle,
    Discovering,
    Advertising,
    Connected,
}

impl Default for BridgeState {
    fn default() -> Self {
        BridgeState::Idle
    }
}

impl std::fmt::Display for BridgeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BridgeState::Idle => "idle",
            BridgeState::Discovering => "discovering",
            BridgeState::Advertising => "advertising",
            BridgeState::Connected => "connected",
        };
        write!(f, "{}", s)
    }
}
