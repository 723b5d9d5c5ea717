//! In-process transport.
//!
//! Every endpoint that joins a [`MemoryBus`] gets a [`MemoryTransport`] and
//! the receiving half of its inbound event channel. Messages are routed to
//! the addressed endpoint; data items are copied to every other connected
//! endpoint. The bus keeps a bounded log of recent deliveries so callers
//! can inspect traffic.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::transport::{DataItem, Node, NodeId, Transport, TransportError, TransportEvent};

/// Entries kept per delivery log; the oldest are dropped first
pub const LOG_CAPACITY: usize = 256;

/// A message the bus delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredMessage {
    pub from: NodeId,
    pub to: NodeId,
    pub path: String,
    pub payload: Vec<u8>,
}

/// A data item the bus replicated, with the peers that received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedItem {
    pub from: NodeId,
    pub item: DataItem,
    pub recipients: Vec<NodeId>,
}

struct Endpoint {
    display_name: String,
    connected: bool,
    tx: mpsc::UnboundedSender<TransportEvent>,
}

#[derive(Default)]
struct BusState {
    endpoints: BTreeMap<NodeId, Endpoint>,
    unreachable: HashSet<NodeId>,
    messages: VecDeque<DeliveredMessage>,
    items: VecDeque<PublishedItem>,
}

fn push_bounded<T>(log: &mut VecDeque<T>, entry: T) {
    if log.len() == LOG_CAPACITY {
        log.pop_front();
    }
    log.push_back(entry);
}

#[derive(Clone, Default)]
pub struct MemoryBus {
    state: Arc<Mutex<BusState>>,
}

impl MemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint. It starts disconnected.
    pub fn join(
        &self,
        id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> (MemoryTransport, mpsc::UnboundedReceiver<TransportEvent>) {
        let id = NodeId::new(id);
        let (tx, rx) = mpsc::unbounded_channel();

        self.state.lock().endpoints.insert(
            id.clone(),
            Endpoint {
                display_name: display_name.into(),
                connected: false,
                tx,
            },
        );

        let transport = MemoryTransport {
            id,
            bus: self.clone(),
        };
        (transport, rx)
    }

    /// Make sends to `node` fail until [`MemoryBus::restore`] is called
    pub fn set_unreachable(&self, node: &str) {
        self.state.lock().unreachable.insert(NodeId::from(node));
    }

    pub fn restore(&self, node: &str) {
        self.state.lock().unreachable.remove(&NodeId::from(node));
    }

    pub fn messages(&self) -> Vec<DeliveredMessage> {
        self.state.lock().messages.iter().cloned().collect()
    }

    pub fn messages_to(&self, node: &str) -> Vec<DeliveredMessage> {
        self.state
            .lock()
            .messages
            .iter()
            .filter(|m| m.to.as_str() == node)
            .cloned()
            .collect()
    }

    pub fn published_items(&self) -> Vec<PublishedItem> {
        self.state.lock().items.iter().cloned().collect()
    }

    /// Forget every logged message and data item
    pub fn clear_log(&self) {
        let mut state = self.state.lock();
        state.messages.clear();
        state.items.clear();
    }

    fn is_connected(&self, node: &NodeId) -> bool {
        self.state
            .lock()
            .endpoints
            .get(node)
            .is_some_and(|e| e.connected)
    }

    fn set_connected(&self, node: &NodeId, connected: bool) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let endpoint = state
            .endpoints
            .get_mut(node)
            .ok_or_else(|| TransportError::UnknownNode(node.clone()))?;
        endpoint.connected = connected;
        Ok(())
    }
}

/// One endpoint's handle onto a [`MemoryBus`]
#[derive(Clone)]
pub struct MemoryTransport {
    id: NodeId,
    bus: MemoryBus,
}

#[async_trait]
impl Transport for MemoryTransport {
    fn local_node(&self) -> &NodeId {
        &self.id
    }

    async fn connect(&self) -> Result<(), TransportError> {
        self.bus.set_connected(&self.id, true)?;
        tracing::debug!("{} connected", self.id);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.bus.set_connected(&self.id, false)?;
        tracing::debug!("{} disconnected", self.id);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.bus.is_connected(&self.id)
    }

    async fn connected_nodes(&self) -> Result<Vec<Node>, TransportError> {
        let state = self.bus.state.lock();
        if !state.endpoints.get(&self.id).is_some_and(|e| e.connected) {
            return Err(TransportError::NotConnected);
        }

        Ok(state
            .endpoints
            .iter()
            .filter(|(id, e)| **id != self.id && e.connected)
            .map(|(id, e)| Node {
                id: id.clone(),
                display_name: e.display_name.clone(),
            })
            .collect())
    }

    async fn send_message(
        &self,
        node: &NodeId,
        path: &str,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        let mut state = self.bus.state.lock();
        if !state.endpoints.get(&self.id).is_some_and(|e| e.connected) {
            return Err(TransportError::NotConnected);
        }
        if state.unreachable.contains(node) {
            return Err(TransportError::SendFailed {
                node: node.clone(),
                reason: "peer unreachable".to_string(),
            });
        }

        let target = state
            .endpoints
            .get(node)
            .filter(|e| e.connected)
            .ok_or_else(|| TransportError::UnknownNode(node.clone()))?;

        target
            .tx
            .send(TransportEvent::Message {
                source: self.id.clone(),
                path: path.to_string(),
                payload: payload.clone(),
            })
            .map_err(|_| TransportError::SendFailed {
                node: node.clone(),
                reason: "receiver closed".to_string(),
            })?;

        push_bounded(
            &mut state.messages,
            DeliveredMessage {
                from: self.id.clone(),
                to: node.clone(),
                path: path.to_string(),
                payload,
            },
        );
        Ok(())
    }

    async fn put_data_item(&self, item: DataItem) -> Result<(), TransportError> {
        let mut state = self.bus.state.lock();
        if !state.endpoints.get(&self.id).is_some_and(|e| e.connected) {
            return Err(TransportError::NotConnected);
        }

        let mut recipients = Vec::new();
        for (id, endpoint) in &state.endpoints {
            if *id == self.id || !endpoint.connected || state.unreachable.contains(id) {
                continue;
            }
            let event = TransportEvent::DataChanged {
                source: self.id.clone(),
                item: item.clone(),
            };
            if endpoint.tx.send(event).is_ok() {
                recipients.push(id.clone());
            }
        }

        push_bounded(
            &mut state.items,
            PublishedItem {
                from: self.id.clone(),
                item,
                recipients,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_message_routed_to_addressed_node() {
        let bus = MemoryBus::new();
        let (phone, _phone_rx) = bus.join("phone", "Phone");
        let (watch, mut watch_rx) = bus.join("watch", "Watch");
        phone.connect().await.unwrap();
        watch.connect().await.unwrap();

        phone
            .send_message(&NodeId::from("watch"), "/ping", b"hi".to_vec())
            .await
            .unwrap();

        match watch_rx.try_recv().unwrap() {
            TransportEvent::Message { source, path, payload } => {
                assert_eq!(source.as_str(), "phone");
                assert_eq!(path, "/ping");
                assert_eq!(payload, b"hi");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(bus.messages_to("watch").len(), 1);
    }

    #[tokio::test]
    async fn test_connected_nodes_excludes_self_and_offline_peers() {
        let bus = MemoryBus::new();
        let (phone, _rx1) = bus.join("phone", "Phone");
        let (watch, _rx2) = bus.join("watch", "Watch");
        let (_other, _rx3) = bus.join("tablet", "Tablet");
        phone.connect().await.unwrap();
        watch.connect().await.unwrap();

        let nodes = phone.connected_nodes().await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id.as_str(), "watch");
        assert_eq!(nodes[0].display_name, "Watch");
    }

    #[tokio::test]
    async fn test_disconnected_endpoint_cannot_send() {
        let bus = MemoryBus::new();
        let (phone, _rx) = bus.join("phone", "Phone");

        assert!(!phone.is_connected());
        assert!(matches!(
            phone.connected_nodes().await,
            Err(TransportError::NotConnected)
        ));
        assert!(matches!(
            phone.put_data_item(DataItem::new("/x")).await,
            Err(TransportError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_node_fails_send() {
        let bus = MemoryBus::new();
        let (phone, _rx1) = bus.join("phone", "Phone");
        let (watch, _rx2) = bus.join("watch", "Watch");
        phone.connect().await.unwrap();
        watch.connect().await.unwrap();
        bus.set_unreachable("watch");

        let result = phone
            .send_message(&NodeId::from("watch"), "/ping", vec![])
            .await;
        assert!(matches!(result, Err(TransportError::SendFailed { .. })));
        assert!(bus.messages().is_empty());

        bus.restore("watch");
        assert!(phone
            .send_message(&NodeId::from("watch"), "/ping", vec![])
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_data_item_replicated_to_every_connected_peer() {
        let bus = MemoryBus::new();
        let (phone, _rx0) = bus.join("phone", "Phone");
        let (watch_a, mut rx_a) = bus.join("watch-a", "Watch A");
        let (watch_b, mut rx_b) = bus.join("watch-b", "Watch B");
        for t in [&phone, &watch_a, &watch_b] {
            t.connect().await.unwrap();
        }

        phone
            .put_data_item(DataItem::new("/image").with_asset("k", vec![7]))
            .await
            .unwrap();

        assert!(matches!(rx_a.try_recv(), Ok(TransportEvent::DataChanged { .. })));
        assert!(matches!(rx_b.try_recv(), Ok(TransportEvent::DataChanged { .. })));
        let published = bus.published_items();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].recipients.len(), 2);
    }

    #[tokio::test]
    async fn test_log_is_bounded_and_clearable() {
        let bus = MemoryBus::new();
        let (phone, _rx1) = bus.join("phone", "Phone");
        let (watch, _rx2) = bus.join("watch", "Watch");
        phone.connect().await.unwrap();
        watch.connect().await.unwrap();

        for i in 0..LOG_CAPACITY + 10 {
            phone
                .send_message(&NodeId::from("watch"), "/n", vec![i as u8])
                .await
                .unwrap();
        }
        phone.put_data_item(DataItem::new("/image")).await.unwrap();

        let messages = bus.messages();
        assert_eq!(messages.len(), LOG_CAPACITY);
        assert_eq!(messages[0].payload, vec![10]);
        assert_eq!(bus.published_items().len(), 1);

        bus.clear_log();
        assert!(bus.messages().is_empty());
        assert!(bus.published_items().is_empty());
    }
}
