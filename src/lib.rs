// Domain layer (core types)
pub mod domain;

// Application layer (bootstrap state machine)
pub mod application;

// Infrastructure layer (capability traits and adapters)
pub mod infrastructure;

// Re-exports for convenience
pub use application::{
    BootstrapController, BridgeCommand, BridgeConfig, BridgeHandle, BridgeStatus,
};
pub use domain::{BridgeState, ResolutionGuard, SessionToken, TokenError};
pub use infrastructure::{
    AdvertisementService, BridgeError, DiscoveryMessage, DiscoveryService, LanAdvertiser,
    LanConfig, LanDiscovery, LocalHub, Result, SessionTransport,
};
