/// Infrastructure layer errors
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Discovery not available on this device")]
    DiscoveryUnavailable,

    #[error("Failed to start discovery: {0}")]
    DiscoveryStart(String),

    #[error("Failed to start advertisement: {0}")]
    AdvertisementStart(String),

    #[error("Failed to start session: {0}")]
    SessionStart(String),

    #[error("Invalid discovery payload")]
    InvalidPayload,

    #[error("Invalid session token: {0}")]
    InvalidToken(#[from] crate::domain::TokenError),

    #[error("Channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
