//! Overlay capability traits
//!
//! The routing core does not own a transport. The embedding host supplies
//! these capabilities at start; the test harness supplies in-memory
//! doubles. All trait objects are held behind `Arc` and shared across the
//! background tasks.

use async_trait::async_trait;

use crate::network::provider::ProviderNotifier;
use crate::routing::types::{Record, RecordRef};

/// Error from an overlay capability.
#[derive(Debug)]
pub enum OverlayError {
    /// Transport-level failure
    Network(String),
    /// The requested resource does not exist on the remote side
    NotFound(String),
}

impl std::fmt::Display for OverlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayError::Network(e) => write!(f, "overlay network error: {}", e),
            OverlayError::NotFound(e) => write!(f, "not found: {}", e),
        }
    }
}

impl std::error::Error for OverlayError {}

/// DHT content-provider interface.
///
/// The host configures the DHT itself (validators for the label
/// namespaces, record TTL, server mode). The core registers a
/// notification sink through which the DHT's provider store reports
/// every observed provider, including re-announcements.
#[async_trait]
pub trait ContentRouting: Send + Sync {
    /// Announce that the local node provides `cid`.
    async fn provide(&self, cid: &str) -> Result<(), OverlayError>;

    /// Install the sink for provider notifications. Called once at start.
    fn install_notifier(&self, notifier: ProviderNotifier);

    /// Current size of the DHT routing table (diagnostics).
    fn routing_table_size(&self) -> usize;
}

/// Remote record retrieval, used by the reconciler's pull fallback.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record body from a remote peer.
    async fn pull(&self, peer_id: &str, record_ref: &RecordRef) -> Result<Record, OverlayError>;
}

/// A raw message delivered from the gossip topic.
///
/// `source` is the peer the gossip router received the message from.
/// This is distinct from the `peer_id` claimed inside the payload: a
/// relayed message can claim any peer_id, so self-filtering at the
/// subscription uses `source`.
#[derive(Debug, Clone)]
pub struct GossipMessage {
    pub source: String,
    pub data: Vec<u8>,
}

/// Publish half of the label topic.
#[async_trait]
pub trait GossipTopic: Send + Sync {
    /// Submit a message to the topic. Success means the message entered
    /// the local router; delivery is best-effort.
    async fn publish(&self, data: Vec<u8>) -> Result<(), OverlayError>;

    /// Peers currently subscribed to the topic (diagnostics).
    fn peers(&self) -> Vec<String>;

    /// Leave the topic and release resources.
    async fn close(&self) -> Result<(), OverlayError>;
}

/// Subscribe half of the label topic.
#[async_trait]
pub trait GossipSubscription: Send + Sync {
    /// Next message, or `None` once the subscription is cancelled or the
    /// topic is closed.
    async fn next(&mut self) -> Option<GossipMessage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_error_display() {
        let err = OverlayError::Network("dial timeout".to_string());
        assert_eq!(err.to_string(), "overlay network error: dial timeout");

        let err = OverlayError::NotFound("bafy1".to_string());
        assert_eq!(err.to_string(), "not found: bafy1");
    }
}
