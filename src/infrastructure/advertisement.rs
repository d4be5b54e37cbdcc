use crate::domain::SessionToken;
use crate::infrastructure::error::Result;
use async_trait::async_trait;

/// Capability: broadcast this device's session token so nearby peers can
/// discover it.
#[async_trait]
pub trait AdvertisementService: Send + Sync {
    /// Start advertising `token`. While active, the token stays
    /// discoverable to peers running a `DiscoveryService`.
    async fn try_start(&self, token: &SessionToken) -> Result<()>;

    /// Stop advertising. Idempotent.
    async fn try_stop(&self);
}
