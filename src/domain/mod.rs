mod guard;
mod state;
mod token;

pub use guard::ResolutionGuard;
pub use state::BridgeState;
pub use token::{SessionToken, TokenError};
