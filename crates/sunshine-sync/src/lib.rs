//! Phone-to-wearable weather sync.
//!
//! [`Transport`] abstracts the device-messaging layer, [`WeatherBundle`] is
//! the payload on the wire and [`SyncRelay`] is the phone-side service that
//! answers refresh requests.

pub mod bundle;
pub mod memory;
pub mod relay;
pub mod transport;

pub use bundle::{icon_data_item, WeatherBundle};
pub use memory::{MemoryBus, MemoryTransport};
pub use relay::{RelayReport, SyncRelay};
pub use transport::{
    path_matches, DataItem, Node, NodeId, Transport, TransportError, TransportEvent,
    ICON_ASSET_KEY, ICON_PATH, WEATHER_UPDATE_PATH,
};
