use crate::application::{BridgeConfig, BridgeStatus};
use crate::domain::{BridgeState, ResolutionGuard, SessionToken};
use crate::infrastructure::{
    AdvertisementService, BridgeError, DiscoveryService, SessionTransport,
};
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Operator controls accepted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Start a discovery attempt. No-op unless the controller is idle.
    BeginDiscovery,
    /// Skip discovery and host immediately. No-op once resolved.
    ForceHost,
    /// Tear down and exit the run loop.
    Shutdown,
}

/// Cloneable handle to a running [`BootstrapController`].
#[derive(Clone)]
pub struct BridgeHandle {
    commands: mpsc::UnboundedSender<BridgeCommand>,
    status: watch::Receiver<BridgeStatus>,
}

impl BridgeHandle {
    pub fn begin_discovery(&self) {
        let _ = self.commands.send(BridgeCommand::BeginDiscovery);
    }

    pub fn force_host(&self) {
        let _ = self.commands.send(BridgeCommand::ForceHost);
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(BridgeCommand::Shutdown);
    }

    /// Latest published snapshot.
    pub fn status(&self) -> BridgeStatus {
        self.status.borrow().clone()
    }

    /// Wait until the published status satisfies `predicate`.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&BridgeStatus) -> bool,
    ) -> Result<BridgeStatus, BridgeError> {
        let status = self
            .status
            .wait_for(predicate)
            .await
            .map_err(|_| BridgeError::ChannelClosed)?;
        Ok(status.clone())
    }
}

/// Orchestrates colocated session bootstrap.
///
/// One controller per device. A discovery attempt races three events in a
/// single scheduling context: a peer advertisement arriving, the
/// discovery timeout elapsing, and an operator forcing host election.
/// Whichever wins the [`ResolutionGuard`] decides the outcome; the losers
/// become no-ops. The controller owns all state transitions; observers
/// only ever see [`BridgeStatus`] snapshots.
pub struct BootstrapController<D, A, T>
where
    D: DiscoveryService + 'static,
    A: AdvertisementService + 'static,
    T: SessionTransport + 'static,
{
    discovery: Arc<D>,
    advertisement: Arc<A>,
    transport: Arc<T>,
    config: BridgeConfig,
    state: BridgeState,
    guard: ResolutionGuard,
    last_failure: Option<String>,
    commands: mpsc::UnboundedReceiver<BridgeCommand>,
    command_tx: mpsc::UnboundedSender<BridgeCommand>,
    status_tx: watch::Sender<BridgeStatus>,
    status_rx: watch::Receiver<BridgeStatus>,
}

impl<D, A, T> BootstrapController<D, A, T>
where
    D: DiscoveryService + 'static,
    A: AdvertisementService + 'static,
    T: SessionTransport + 'static,
{
    pub fn new(discovery: D, advertisement: A, transport: T, config: BridgeConfig) -> Self {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(BridgeStatus::default());
        Self {
            discovery: Arc::new(discovery),
            advertisement: Arc::new(advertisement),
            transport: Arc::new(transport),
            config,
            state: BridgeState::Idle,
            guard: ResolutionGuard::new(),
            last_failure: None,
            commands,
            command_tx,
            status_tx,
            status_rx,
        }
    }

    pub fn handle(&self) -> BridgeHandle {
        BridgeHandle {
            commands: self.command_tx.clone(),
            status: self.status_rx.clone(),
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Drive the controller until shutdown. All transitions execute here,
    /// on one scheduling context.
    pub async fn run(mut self) {
        while let Some(cmd) = self.commands.recv().await {
            match cmd {
                BridgeCommand::BeginDiscovery => {
                    if self.state != BridgeState::Idle {
                        tracing::debug!("BeginDiscovery ignored in state {}", self.state);
                        continue;
                    }
                    if self.run_discovery_attempt().await.is_break() {
                        return;
                    }
                }
                BridgeCommand::ForceHost => {
                    if self.state == BridgeState::Idle {
                        tracing::info!("Host election forced from idle");
                        self.last_failure = None;
                        self.elect_host().await;
                    } else {
                        tracing::debug!("ForceHost ignored in state {}", self.state);
                    }
                }
                BridgeCommand::Shutdown => {
                    self.teardown().await;
                    return;
                }
            }
        }
    }

    /// One discovery attempt: listen, race the timeout, resolve once.
    /// Breaks when a shutdown arrived mid-attempt.
    async fn run_discovery_attempt(&mut self) -> ControlFlow<()> {
        self.guard.reset();
        self.last_failure = None;

        tracing::info!("Starting colocation discovery");
        self.set_state(BridgeState::Discovering);

        let mut messages = match self.discovery.try_start().await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!("Could not start discovery, becoming host: {}", e);
                self.elect_host().await;
                return ControlFlow::Continue(());
            }
        };

        let deadline = tokio::time::sleep(self.config.discovery_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                msg = messages.recv() => match msg {
                    Some(msg) => {
                        let Some(token) = msg.session_token() else {
                            tracing::debug!(
                                "Ignoring malformed discovery payload ({} bytes)",
                                msg.data.len()
                            );
                            continue;
                        };
                        if !self.guard.try_resolve() {
                            continue;
                        }
                        tracing::info!("Discovered session {}", token);
                        self.discovery.try_stop().await;
                        self.join_session(token).await;
                        return ControlFlow::Continue(());
                    }
                    None => {
                        // Listener died underneath us; same fallback as a
                        // start failure.
                        if self.guard.try_resolve() {
                            tracing::warn!("Discovery stream closed, becoming host");
                            self.discovery.try_stop().await;
                            self.elect_host().await;
                        }
                        return ControlFlow::Continue(());
                    }
                },
                () = &mut deadline => {
                    if self.guard.try_resolve() {
                        tracing::info!("Discovery timed out, becoming host");
                        self.discovery.try_stop().await;
                        self.elect_host().await;
                    }
                    return ControlFlow::Continue(());
                }
                cmd = self.commands.recv() => match cmd {
                    Some(BridgeCommand::ForceHost) => {
                        if self.guard.try_resolve() {
                            tracing::info!("Host election forced");
                            self.discovery.try_stop().await;
                            self.elect_host().await;
                        }
                        return ControlFlow::Continue(());
                    }
                    Some(BridgeCommand::BeginDiscovery) => {
                        tracing::debug!("BeginDiscovery ignored while discovering");
                    }
                    Some(BridgeCommand::Shutdown) | None => {
                        self.teardown().await;
                        return ControlFlow::Break(());
                    }
                }
            }
        }
    }

    /// Join-path resolution: enter the session a peer advertised.
    async fn join_session(&mut self, token: SessionToken) {
        match self.transport.start_session(&token).await {
            Ok(()) => {
                tracing::info!("Joined session {}", token);
                self.set_state(BridgeState::Connected);
            }
            Err(e) => self.fail_session(e),
        }
    }

    /// Host-path resolution: create a session and advertise it.
    async fn elect_host(&mut self) {
        let token = SessionToken::generate(&self.config.session_prefix);
        tracing::info!("Creating session {} as host", token);

        if let Err(e) = self.transport.start_session(&token).await {
            self.fail_session(e);
            return;
        }
        self.set_state(BridgeState::Connected);

        match self.advertisement.try_start(&token).await {
            Ok(()) => {
                tracing::info!("Advertisement active for {}", token);
                self.set_state(BridgeState::Advertising);
            }
            Err(e) => {
                // Non-fatal: the session runs, peers just cannot find it.
                tracing::warn!("Advertisement failed, hosting undiscoverable: {}", e);
            }
        }
    }

    fn fail_session(&mut self, error: BridgeError) {
        tracing::error!("Session start failed: {}", error);
        self.last_failure = Some(error.to_string());
        self.set_state(BridgeState::Idle);
    }

    /// Stop everything. Outstanding capability stops are fire-and-forget
    /// so teardown never blocks on an external subsystem.
    async fn teardown(&mut self) {
        tracing::debug!("Tearing down bootstrap controller");

        let discovery = self.discovery.clone();
        tokio::spawn(async move { discovery.try_stop().await });
        let advertisement = self.advertisement.clone();
        tokio::spawn(async move { advertisement.try_stop().await });

        self.transport.shutdown().await;
        self.set_state(BridgeState::Idle);
    }

    fn set_state(&mut self, state: BridgeState) {
        self.state = state;
        let _ = self.status_tx.send(BridgeStatus {
            state: self.state,
            session_token: self.transport.session_token().map(|t| t.to_string()),
            is_connected: self.transport.is_connected(),
            participant_count: self.transport.participant_count(),
            last_failure: self.last_failure.clone(),
        });
    }
}
