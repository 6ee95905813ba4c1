//! Gossip label announcements
//!
//! Wide, low-latency propagation path of the hybrid discovery protocol.
//! Publishes `LabelAnnouncement` messages on the fixed labels topic and
//! drains the subscription into a callback installed at construction.
//!
//! The topic name and message limits are protocol constants; see
//! `routing::constants`.

pub mod announcement;

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::labels::Label;
use crate::network::overlay::{GossipSubscription, GossipTopic};
use crate::routing::constants::TOPIC_LABELS;

pub use announcement::{AnnouncementError, LabelAnnouncement};

/// Error publishing a label announcement.
#[derive(Debug)]
pub enum GossipError {
    /// The announcement failed validation or encoding
    Invalid(String),
    /// The topic rejected the message
    Publish(String),
}

impl std::fmt::Display for GossipError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GossipError::Invalid(e) => write!(f, "invalid announcement: {}", e),
            GossipError::Publish(e) => write!(f, "failed to publish announcement: {}", e),
        }
    }
}

impl std::error::Error for GossipError {}

/// Callback invoked with each valid announcement from a remote peer.
/// Installed once at construction; never rebound.
pub type AnnouncementCallback = Arc<dyn Fn(LabelAnnouncement) + Send + Sync>;

/// Publishes and receives label announcements on the labels topic.
pub struct GossipAnnouncer {
    local_peer_id: String,
    topic: Arc<dyn GossipTopic>,
    handler: JoinHandle<()>,
}

impl GossipAnnouncer {
    /// Join the labels topic and start the subscription handler.
    pub fn start(
        local_peer_id: String,
        topic: Arc<dyn GossipTopic>,
        subscription: Box<dyn GossipSubscription>,
        on_announcement: AnnouncementCallback,
    ) -> Self {
        let handler = tokio::spawn(Self::handle_messages(
            local_peer_id.clone(),
            subscription,
            on_announcement,
        ));

        info!(topic = TOPIC_LABELS, peer_id = %local_peer_id, "gossip announcer started");

        GossipAnnouncer {
            local_peer_id,
            topic,
            handler,
        }
    }

    /// Announce a record's labels to the network.
    ///
    /// Non-blocking best effort: success means the message entered the
    /// local gossip router, not that any peer received it.
    pub async fn publish_labels(&self, cid: &str, labels: &[Label]) -> Result<(), GossipError> {
        let announcement = LabelAnnouncement {
            cid: cid.to_string(),
            peer_id: self.local_peer_id.clone(),
            labels: labels.iter().map(|l| l.as_str().to_string()).collect(),
            timestamp: Utc::now(),
        };

        announcement
            .validate()
            .map_err(|e| GossipError::Invalid(e.to_string()))?;

        let data = announcement
            .encode()
            .map_err(|e| GossipError::Invalid(e.to_string()))?;
        let size = data.len();

        self.topic
            .publish(data)
            .await
            .map_err(|e| GossipError::Publish(e.to_string()))?;

        debug!(
            cid = %cid,
            labels = labels.len(),
            size = size,
            topic_peers = self.topic.peers().len(),
            "published label announcement"
        );

        Ok(())
    }

    /// Peers currently subscribed to the labels topic.
    pub fn topic_peers(&self) -> Vec<String> {
        self.topic.peers()
    }

    /// Subscription drain loop: skip own deliveries, decode, validate,
    /// hand off to the callback. Invalid messages are logged and skipped;
    /// the loop only exits when the subscription ends.
    async fn handle_messages(
        local_peer_id: String,
        mut subscription: Box<dyn GossipSubscription>,
        on_announcement: AnnouncementCallback,
    ) {
        while let Some(msg) = subscription.next().await {
            // Filter on the delivering peer, not the claimed peer_id: a
            // relayed message can claim anything
            if msg.source == local_peer_id {
                continue;
            }

            let announcement = match LabelAnnouncement::decode(&msg.data) {
                Ok(a) => a,
                Err(e) => {
                    warn!(
                        from = %msg.source,
                        size = msg.data.len(),
                        error = %e,
                        "received invalid label announcement"
                    );
                    continue;
                }
            };

            debug!(
                from = %msg.source,
                cid = %announcement.cid,
                peer = %announcement.peer_id,
                labels = announcement.labels.len(),
                "received label announcement"
            );

            on_announcement(announcement);
        }

        debug!("gossip message handler stopped");
    }

    /// Stop the handler and leave the topic.
    pub async fn close(&self) {
        self.handler.abort();
        if let Err(e) = self.topic.close().await {
            warn!(error = %e, "failed to close gossip topic");
        }
    }
}
