use std::time::Duration;

/// Configuration for the bootstrap controller.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How long to listen for peers before electing to host.
    pub discovery_timeout: Duration,

    /// Namespace prefix for locally generated session tokens.
    pub session_prefix: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            discovery_timeout: Duration::from_secs(5),
            session_prefix: "coloc-".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_session_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.session_prefix = prefix.into();
        self
    }

    /// Defaults overridable via `COLOC_DISCOVERY_TIMEOUT_MS` and
    /// `COLOC_SESSION_PREFIX`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(ms) = std::env::var("COLOC_DISCOVERY_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse::<u64>() {
                config.discovery_timeout = Duration::from_millis(ms);
            }
        }
        if let Ok(prefix) = std::env::var("COLOC_SESSION_PREFIX") {
            if !prefix.is_empty() {
                config.session_prefix = prefix;
            }
        }
        config
    }
}
