use coloc_session::{BootstrapController, BridgeConfig, BridgeState, LocalHub};
use std::time::Duration;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Demo: two simulated colocated devices on one in-process hub. The first
/// device times out quickly and elects itself host; the second discovers
/// the advertisement and joins the same session.
#[tokio::main]
pub async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("coloc_session=debug"));

    fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();

    let hub = LocalHub::new();

    let host = BootstrapController::new(
        hub.discovery(),
        hub.advertisement(),
        hub.transport(),
        BridgeConfig::from_env().with_discovery_timeout(Duration::from_secs(1)),
    );
    let guest = BootstrapController::new(
        hub.discovery(),
        hub.advertisement(),
        hub.transport(),
        BridgeConfig::from_env(),
    );

    let mut host_handle = host.handle();
    let mut guest_handle = guest.handle();
    tokio::spawn(host.run());
    tokio::spawn(guest.run());

    host_handle.begin_discovery();
    guest_handle.begin_discovery();

    let hosting = host_handle
        .wait_for(|s| s.state == BridgeState::Advertising)
        .await
        .expect("host controller exited");
    tracing::info!("Device A is hosting {:?}", hosting.session_token);

    let joined = guest_handle
        .wait_for(|s| s.state == BridgeState::Connected)
        .await
        .expect("guest controller exited");
    tracing::info!(
        "Device B joined {:?} ({} participants)",
        joined.session_token,
        joined.participant_count
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&guest_handle.status()).expect("status is serializable")
    );

    guest_handle.shutdown();
    host_handle.shutdown();
}
