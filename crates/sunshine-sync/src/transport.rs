//! Device-to-device transport abstraction.
//!
//! Two primitives are modelled: one-shot *messages* addressed to a single
//! peer by path, and *data items* that the transport replicates to every
//! connected peer. A vendor binding implements [`Transport`]; [`MemoryBus`]
//! is the in-process implementation.
//!
//! [`MemoryBus`]: crate::memory::MemoryBus

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use sunshine_core::{AppError, TransportFailure};
use thiserror::Error;

/// Path used both to ask the phone for fresh weather and to deliver it.
pub const WEATHER_UPDATE_PATH: &str = "/weather-update";
/// Data item path carrying the condition icon.
pub const ICON_PATH: &str = "/image";
/// Asset key of the PNG inside the icon data item.
pub const ICON_ASSET_KEY: &str = "weather_icon";

/// Paths compare case-insensitively.
pub fn path_matches(path: &str, expected: &str) -> bool {
    path.eq_ignore_ascii_case(expected)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A peer reachable over the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub display_name: String,
}

/// A replicated record: small string entries plus binary assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataItem {
    pub path: String,
    pub entries: BTreeMap<String, String>,
    pub assets: BTreeMap<String, Vec<u8>>,
}

impl DataItem {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_asset(mut self, key: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.assets.insert(key.into(), bytes);
        self
    }
}

/// Something that arrived from a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Message {
        source: NodeId,
        path: String,
        payload: Vec<u8>,
    },
    DataChanged {
        source: NodeId,
        item: DataItem,
    },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport is not connected")]
    NotConnected,

    #[error("Unknown or disconnected node: {0}")]
    UnknownNode(NodeId),

    #[error("Send to {node} failed: {reason}")]
    SendFailed { node: NodeId, reason: String },

    #[error("Payload codec error: {0}")]
    Codec(String),
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        let failure = match err {
            TransportError::NotConnected => TransportFailure::NotConnected,
            TransportError::UnknownNode(node) => TransportFailure::PeerUnreachable(node.to_string()),
            TransportError::SendFailed { node, .. } => {
                TransportFailure::PeerUnreachable(node.to_string())
            }
            TransportError::Codec(msg) => TransportFailure::Rejected(msg),
        };
        AppError::Transport(failure)
    }
}

/// Device-messaging transport shared by the phone and the wearable.
#[async_trait]
pub trait Transport: Send + Sync {
    /// This endpoint's own node id
    fn local_node(&self) -> &NodeId;

    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    /// Peers currently reachable, excluding this node
    async fn connected_nodes(&self) -> Result<Vec<Node>, TransportError>;

    /// Fire-and-forget message to a single peer
    async fn send_message(
        &self,
        node: &NodeId,
        path: &str,
        payload: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// Publish a data item to every connected peer
    async fn put_data_item(&self, item: DataItem) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matching_ignores_case() {
        assert!(path_matches("/Weather-Update", WEATHER_UPDATE_PATH));
        assert!(!path_matches("/image", WEATHER_UPDATE_PATH));
    }

    #[test]
    fn test_send_failure_maps_to_unreachable_peer() {
        let err: AppError = TransportError::SendFailed {
            node: NodeId::from("watch-1"),
            reason: "timeout".into(),
        }
        .into();
        assert!(matches!(
            err,
            AppError::Transport(TransportFailure::PeerUnreachable(ref node)) if node == "watch-1"
        ));
    }

    #[test]
    fn test_data_item_builder() {
        let item = DataItem::new(ICON_PATH).with_asset(ICON_ASSET_KEY, vec![1, 2, 3]);
        assert_eq!(item.path, "/image");
        assert_eq!(item.assets.get(ICON_ASSET_KEY), Some(&vec![1, 2, 3]));
        assert!(item.entries.is_empty());
    }
}
