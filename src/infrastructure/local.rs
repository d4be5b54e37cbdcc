//! In-process colocation hub.
//!
//! Simulates several colocated devices inside one process: adverts posted
//! by one device are delivered to every listening device, and sessions are
//! tracked in a shared registry keyed by token. Used by the demo binary
//! and by tests; failure injection covers the capability error paths.

use crate::domain::SessionToken;
use crate::infrastructure::advertisement::AdvertisementService;
use crate::infrastructure::discovery::{DiscoveryMessage, DiscoveryService};
use crate::infrastructure::error::{BridgeError, Result};
use crate::infrastructure::transport::SessionTransport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Default)]
struct HubInner {
    listeners: HashMap<u64, UnboundedSender<DiscoveryMessage>>,
    adverts: HashMap<u64, Vec<u8>>,
    sessions: HashMap<SessionToken, usize>,
    next_id: u64,
    discovery_enabled: bool,
    session_failure: Option<String>,
    advertisement_failure: Option<String>,
    discovery_starts: usize,
    session_starts: usize,
}

impl HubInner {
    fn broadcast(&mut self, data: &[u8]) {
        self.listeners
            .retain(|_, tx| tx.send(DiscoveryMessage::new(data.to_vec(), None)).is_ok());
    }
}

/// Shared in-process hub; hand one clone to each simulated device.
#[derive(Clone)]
pub struct LocalHub {
    inner: Arc<Mutex<HubInner>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                discovery_enabled: true,
                ..HubInner::default()
            })),
        }
    }

    pub fn discovery(&self) -> LocalDiscovery {
        LocalDiscovery {
            inner: self.inner.clone(),
            listener_id: Mutex::new(None),
        }
    }

    pub fn advertisement(&self) -> LocalAdvertiser {
        LocalAdvertiser {
            inner: self.inner.clone(),
            advert_id: Mutex::new(None),
        }
    }

    pub fn transport(&self) -> LocalTransport {
        LocalTransport {
            inner: self.inner.clone(),
            current: Mutex::new(None),
        }
    }

    /// Simulate a device without the discovery capability.
    pub fn disable_discovery(&self) {
        self.lock().discovery_enabled = false;
    }

    /// Make every subsequent session start fail with `reason`.
    pub fn fail_sessions(&self, reason: &str) {
        self.lock().session_failure = Some(reason.to_string());
    }

    /// Make every subsequent advertisement start fail with `reason`.
    pub fn fail_advertisements(&self, reason: &str) {
        self.lock().advertisement_failure = Some(reason.to_string());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        let mut hub = self.lock();
        hub.session_failure = None;
        hub.advertisement_failure = None;
    }

    /// Deliver an arbitrary payload to all current listeners.
    pub fn broadcast_raw(&self, data: &[u8]) {
        self.lock().broadcast(data);
    }

    pub fn discovery_start_count(&self) -> usize {
        self.lock().discovery_starts
    }

    pub fn session_start_count(&self) -> usize {
        self.lock().session_starts
    }

    pub fn participant_count(&self, token: &SessionToken) -> usize {
        self.lock().sessions.get(token).copied().unwrap_or(0)
    }

    pub fn active_sessions(&self) -> usize {
        self.lock().sessions.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HubInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(inner: &Arc<Mutex<HubInner>>) -> std::sync::MutexGuard<'_, HubInner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// Per-device discovery listener over a [`LocalHub`].
pub struct LocalDiscovery {
    inner: Arc<Mutex<HubInner>>,
    listener_id: Mutex<Option<u64>>,
}

#[async_trait]
impl DiscoveryService for LocalDiscovery {
    async fn try_start(&self) -> Result<UnboundedReceiver<DiscoveryMessage>> {
        // Slot before hub, matching try_stop.
        let mut slot = self.listener_id.lock().unwrap_or_else(|e| e.into_inner());
        let mut hub = lock(&self.inner);
        if !hub.discovery_enabled {
            return Err(BridgeError::DiscoveryUnavailable);
        }
        hub.discovery_starts += 1;

        let (tx, rx) = mpsc::unbounded_channel();

        // Adverts are continuous broadcasts; a listener that starts late
        // still hears everything currently on the air.
        for payload in hub.adverts.values() {
            let _ = tx.send(DiscoveryMessage::new(payload.clone(), None));
        }

        let id = hub.next_id;
        hub.next_id += 1;
        if let Some(previous) = slot.take() {
            hub.listeners.remove(&previous);
        }
        *slot = Some(id);
        hub.listeners.insert(id, tx);
        Ok(rx)
    }

    async fn try_stop(&self) {
        let mut slot = self.listener_id.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(id) = slot.take() {
            lock(&self.inner).listeners.remove(&id);
        }
    }
}

/// Per-device advertisement publisher over a [`LocalHub`].
pub struct LocalAdvertiser {
    inner: Arc<Mutex<HubInner>>,
    advert_id: Mutex<Option<u64>>,
}

#[async_trait]
impl AdvertisementService for LocalAdvertiser {
    async fn try_start(&self, token: &SessionToken) -> Result<()> {
        // Slot before hub, matching try_stop.
        let mut slot = self.advert_id.lock().unwrap_or_else(|e| e.into_inner());
        let mut hub = lock(&self.inner);
        if let Some(reason) = hub.advertisement_failure.clone() {
            return Err(BridgeError::AdvertisementStart(reason));
        }

        let id = hub.next_id;
        hub.next_id += 1;
        let payload = token.as_bytes().to_vec();
        hub.adverts.insert(id, payload.clone());
        hub.broadcast(&payload);

        if let Some(previous) = slot.replace(id) {
            hub.adverts.remove(&previous);
        }
        Ok(())
    }

    async fn try_stop(&self) {
        let mut slot = self.advert_id.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(id) = slot.take() {
            lock(&self.inner).adverts.remove(&id);
        }
    }
}

/// Per-device session transport over a [`LocalHub`] session registry.
pub struct LocalTransport {
    inner: Arc<Mutex<HubInner>>,
    current: Mutex<Option<SessionToken>>,
}

impl LocalTransport {
    fn leave(hub: &mut HubInner, token: &SessionToken) {
        if let Some(count) = hub.sessions.get_mut(token) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                hub.sessions.remove(token);
            }
        }
    }
}

#[async_trait]
impl SessionTransport for LocalTransport {
    async fn start_session(&self, token: &SessionToken) -> Result<()> {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let mut hub = lock(&self.inner);
        hub.session_starts += 1;

        if let Some(reason) = hub.session_failure.clone() {
            return Err(BridgeError::SessionStart(reason));
        }
        if let Some(previous) = current.take() {
            tracing::warn!("Session {} already active, shutting down first", previous);
            Self::leave(&mut hub, &previous);
        }

        *hub.sessions.entry(token.clone()).or_insert(0) += 1;
        *current = Some(token.clone());
        Ok(())
    }

    async fn shutdown(&self) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = current.take() {
            Self::leave(&mut lock(&self.inner), &token);
        }
    }

    fn is_connected(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn session_token(&self) -> Option<SessionToken> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn participant_count(&self) -> usize {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        match current.as_ref() {
            Some(token) => lock(&self.inner)
                .sessions
                .get(token)
                .copied()
                .unwrap_or(0),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_hears_advertisement() {
        let hub = LocalHub::new();
        let discovery = hub.discovery();
        let advertiser = hub.advertisement();

        let mut messages = discovery.try_start().await.unwrap();

        let token = SessionToken::generate("coloc-");
        advertiser.try_start(&token).await.unwrap();

        let msg = messages.recv().await.unwrap();
        assert_eq!(msg.session_token().unwrap(), token);
    }

    #[tokio::test]
    async fn test_late_listener_hears_active_advertisement() {
        let hub = LocalHub::new();
        let advertiser = hub.advertisement();
        let token = SessionToken::generate("coloc-");
        advertiser.try_start(&token).await.unwrap();

        let discovery = hub.discovery();
        let mut messages = discovery.try_start().await.unwrap();
        let msg = messages.recv().await.unwrap();
        assert_eq!(msg.session_token().unwrap(), token);
    }

    #[tokio::test]
    async fn test_no_messages_after_stop() {
        let hub = LocalHub::new();
        let discovery = hub.discovery();
        let mut messages = discovery.try_start().await.unwrap();
        discovery.try_stop().await;

        hub.broadcast_raw(b"coloc-deadbeef");
        // Sender side was dropped on stop, so the stream ends.
        assert!(messages.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_try_stop_inactive_is_noop() {
        let hub = LocalHub::new();
        let discovery = hub.discovery();
        discovery.try_stop().await;
        discovery.try_stop().await;
    }

    #[tokio::test]
    async fn test_disabled_discovery_reports_unavailable() {
        let hub = LocalHub::new();
        hub.disable_discovery();
        let discovery = hub.discovery();
        assert!(matches!(
            discovery.try_start().await,
            Err(BridgeError::DiscoveryUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_session_registry_counts_participants() {
        let hub = LocalHub::new();
        let a = hub.transport();
        let b = hub.transport();
        let token = SessionToken::generate("coloc-");

        a.start_session(&token).await.unwrap();
        assert_eq!(a.participant_count(), 1);

        b.start_session(&token).await.unwrap();
        assert_eq!(a.participant_count(), 2);
        assert_eq!(b.participant_count(), 2);

        a.shutdown().await;
        assert!(!a.is_connected());
        assert_eq!(b.participant_count(), 1);
    }

    #[tokio::test]
    async fn test_start_session_replaces_previous() {
        let hub = LocalHub::new();
        let transport = hub.transport();
        let first = SessionToken::generate("coloc-");
        let second = SessionToken::generate("coloc-");

        transport.start_session(&first).await.unwrap();
        transport.start_session(&second).await.unwrap();

        assert_eq!(hub.participant_count(&first), 0);
        assert_eq!(hub.participant_count(&second), 1);
        assert_eq!(transport.session_token().unwrap(), second);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_start_and_stop_make_progress() {
        let hub = LocalHub::new();
        let discovery = Arc::new(hub.discovery());
        let advertiser = Arc::new(hub.advertisement());
        let token = SessionToken::generate("coloc-");

        let d = discovery.clone();
        let a = advertiser.clone();
        let starter = tokio::spawn(async move {
            for _ in 0..500 {
                let _ = d.try_start().await;
                let _ = a.try_start(&token).await;
            }
        });
        let stopper = tokio::spawn(async move {
            for _ in 0..500 {
                discovery.try_stop().await;
                advertiser.try_stop().await;
            }
        });

        tokio::time::timeout(std::time::Duration::from_secs(10), async {
            starter.await.unwrap();
            stopper.await.unwrap();
        })
        .await
        .expect("start/stop churn stalled");
    }

    #[tokio::test]
    async fn test_injected_session_failure() {
        let hub = LocalHub::new();
        hub.fail_sessions("no route to relay");
        let transport = hub.transport();
        let token = SessionToken::generate("coloc-");

        let err = transport.start_session(&token).await.unwrap_err();
        assert!(matches!(err, BridgeError::SessionStart(_)));
        assert!(!transport.is_connected());
    }
}
