pub mod advertisement;
pub mod discovery;
pub mod error;
pub mod lan;
pub mod local;
pub mod transport;

pub use advertisement::AdvertisementService;
pub use discovery::{DiscoveryMessage, DiscoveryService};
pub use error::{BridgeError, Result};
pub use lan::{LanAdvertiser, LanConfig, LanDiscovery};
pub use local::LocalHub;
pub use transport::SessionTransport;
