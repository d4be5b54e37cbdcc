use crate::domain::SessionToken;
use crate::infrastructure::discovery::{DiscoveryMessage, DiscoveryService};
use crate::infrastructure::error::{BridgeError, Result};
use crate::infrastructure::AdvertisementService;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

/// Default UDP port for LAN discovery.
pub const DEFAULT_LAN_PORT: u16 = 19733;

/// Default interval between token announcements in milliseconds.
pub const DEFAULT_ANNOUNCE_INTERVAL_MS: u64 = 1000;

/// Maximum accepted advertisement payload size.
pub const MAX_PAYLOAD_SIZE: usize = 512;

/// Configuration for the UDP-broadcast adapters.
#[derive(Debug, Clone)]
pub struct LanConfig {
    /// UDP port advertisements are sent to and received on.
    pub port: u16,
    /// Bind address for the listening socket.
    pub bind_addr: String,
    /// Broadcast address advertisements are sent to.
    pub broadcast_addr: String,
    /// Interval between announcements in milliseconds.
    pub announce_interval_ms: u64,
}

impl Default for LanConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_LAN_PORT,
            bind_addr: "0.0.0.0".to_string(),
            broadcast_addr: "255.255.255.255".to_string(),
            announce_interval_ms: DEFAULT_ANNOUNCE_INTERVAL_MS,
        }
    }
}

impl LanConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_announce_interval(mut self, ms: u64) -> Self {
        self.announce_interval_ms = ms;
        self
    }
}

/// Listens for session-token broadcasts on the local network.
pub struct LanDiscovery {
    config: LanConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LanDiscovery {
    pub fn new(config: LanConfig) -> Self {
        Self {
            config,
            task: Mutex::new(None),
        }
    }

    fn replace_task(&self, next: Option<JoinHandle<()>>) {
        let mut slot = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = next;
    }
}

#[async_trait]
impl DiscoveryService for LanDiscovery {
    async fn try_start(&self) -> Result<UnboundedReceiver<DiscoveryMessage>> {
        let bind = format!("{}:{}", self.config.bind_addr, self.config.port);
        let socket = UdpSocket::bind(bind.as_str())
            .await
            .map_err(|e| BridgeError::DiscoveryStart(e.to_string()))?;
        socket
            .set_broadcast(true)
            .map_err(|e| BridgeError::DiscoveryStart(e.to_string()))?;

        tracing::debug!("LAN discovery listening on {}", bind);

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut buf = [0u8; MAX_PAYLOAD_SIZE];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, addr)) => {
                        let msg =
                            DiscoveryMessage::new(buf[..len].to_vec(), Some(addr.to_string()));
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("LAN discovery receive failed: {}", e);
                        break;
                    }
                }
            }
        });

        self.replace_task(Some(handle));
        Ok(rx)
    }

    async fn try_stop(&self) {
        self.replace_task(None);
    }
}

/// Periodically broadcasts this device's session token.
pub struct LanAdvertiser {
    config: LanConfig,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LanAdvertiser {
    pub fn new(config: LanConfig) -> Self {
        Self {
            config,
            task: Mutex::new(None),
        }
    }

    fn replace_task(&self, next: Option<JoinHandle<()>>) {
        let mut slot = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = next;
    }
}

#[async_trait]
impl AdvertisementService for LanAdvertiser {
    async fn try_start(&self, token: &SessionToken) -> Result<()> {
        let socket = UdpSocket::bind((self.config.bind_addr.as_str(), 0))
            .await
            .map_err(|e| BridgeError::AdvertisementStart(e.to_string()))?;
        socket
            .set_broadcast(true)
            .map_err(|e| BridgeError::AdvertisementStart(e.to_string()))?;

        let target = format!("{}:{}", self.config.broadcast_addr, self.config.port);
        let payload = token.as_bytes().to_vec();
        // A zero period would panic inside tokio's interval.
        let interval = Duration::from_millis(self.config.announce_interval_ms.max(1));

        tracing::debug!("LAN advertisement of {} to {}", token, target);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = socket.send_to(&payload, target.as_str()).await {
                    tracing::warn!("LAN advertisement send failed: {}", e);
                }
            }
        });

        self.replace_task(Some(handle));
        Ok(())
    }

    async fn try_stop(&self) {
        self.replace_task(None);
    }
}

impl Drop for LanDiscovery {
    fn drop(&mut self) {
        self.replace_task(None);
    }
}

impl Drop for LanAdvertiser {
    fn drop(&mut self) {
        self.replace_task(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SessionToken;

    #[tokio::test]
    async fn test_try_stop_is_idempotent_when_inactive() {
        let discovery = LanDiscovery::new(LanConfig::default());
        discovery.try_stop().await;
        discovery.try_stop().await;
    }

    #[tokio::test]
    async fn test_advertiser_reaches_listener() {
        // Loopback instead of broadcast so the test is self-contained.
        let config = LanConfig {
            broadcast_addr: "127.0.0.1".to_string(),
            port: 39733,
            announce_interval_ms: 10,
            ..LanConfig::default()
        };

        let discovery = LanDiscovery::new(config.clone());
        let advertiser = LanAdvertiser::new(config);

        let mut messages = discovery.try_start().await.unwrap();

        let token = SessionToken::generate("coloc-");
        advertiser.try_start(&token).await.unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(5), messages.recv())
            .await
            .expect("expected an advertisement within the window")
            .expect("stream closed");
        assert_eq!(msg.session_token().unwrap(), token);

        advertiser.try_stop().await;
        discovery.try_stop().await;
    }

    #[tokio::test]
    async fn test_zero_announce_interval_still_announces() {
        let config = LanConfig {
            broadcast_addr: "127.0.0.1".to_string(),
            port: 39734,
            ..LanConfig::default()
        }
        .with_announce_interval(0);

        let discovery = LanDiscovery::new(config.clone());
        let advertiser = LanAdvertiser::new(config);

        let mut messages = discovery.try_start().await.unwrap();

        let token = SessionToken::generate("coloc-");
        advertiser.try_start(&token).await.unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(5), messages.recv())
            .await
            .expect("expected an advertisement within the window")
            .expect("stream closed");
        assert_eq!(msg.session_token().unwrap(), token);

        advertiser.try_stop().await;
        discovery.try_stop().await;
    }
}
