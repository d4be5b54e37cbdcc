use crate::domain::SessionToken;
use crate::infrastructure::error::Result;
use async_trait::async_trait;

/// Capability: the underlying shared-session transport (external
/// collaborator). Reliability, membership, and payload delivery live
/// behind this boundary.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Create-or-join the session identified by `token`: if no session
    /// for the token exists yet it is created with this caller as its
    /// first member, otherwise the caller joins. A session previously
    /// held by this transport is fully shut down first.
    async fn start_session(&self, token: &SessionToken) -> Result<()>;

    /// Leave and release the current session, if any.
    async fn shutdown(&self);

    fn is_connected(&self) -> bool;

    fn session_token(&self) -> Option<SessionToken>;

    fn participant_count(&self) -> usize;
}
