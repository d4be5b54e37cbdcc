mod bridge;
mod config;
mod status;

pub use bridge::{BootstrapController, BridgeCommand, BridgeHandle};
pub use config::BridgeConfig;
pub use status::BridgeStatus;
