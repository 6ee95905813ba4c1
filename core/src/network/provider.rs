//! DHT provider announcements
//!
//! Fallback discovery path of the hybrid protocol. Wraps the host's
//! content-routing capability: `provide` pushes our CIDs into the DHT;
//! incoming provider observations arrive through a bounded channel
//! consumed by the reconciler. The channel applies backpressure to the
//! DHT side; notifications are never silently dropped here.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::network::overlay::{ContentRouting, OverlayError};
use crate::routing::constants::NOTIFICATION_CHANNEL_SIZE;
use crate::routing::types::{Peer, RecordRef};

/// A DHT observation that some peer provides some CID.
#[derive(Debug, Clone)]
pub struct ProviderNotification {
    /// The providing peer, with whatever addresses the DHT learned.
    pub peer: Peer,
    /// The provided record.
    pub record_ref: RecordRef,
}

/// Sink handed to the DHT's provider store. Cloneable; each observed
/// provider event is pushed through here.
#[derive(Clone)]
pub struct ProviderNotifier {
    tx: mpsc::Sender<ProviderNotification>,
}

impl ProviderNotifier {
    /// Push one provider observation. Blocks when the reconciler is
    /// behind; returns an error only after the core has shut down.
    pub async fn notify(&self, notification: ProviderNotification) -> Result<(), OverlayError> {
        self.tx
            .send(notification)
            .await
            .map_err(|_| OverlayError::Network("provider channel closed".to_string()))
    }
}

/// Announces local CIDs on the DHT and owns the notification channel.
pub struct ProviderAnnouncer {
    routing: Arc<dyn ContentRouting>,
}

impl ProviderAnnouncer {
    /// Wire up the announcer: installs the notification sink on the
    /// content-routing capability and returns the receive side for the
    /// reconciler.
    pub fn new(routing: Arc<dyn ContentRouting>) -> (Self, mpsc::Receiver<ProviderNotification>) {
        let (tx, rx) = mpsc::channel(NOTIFICATION_CHANNEL_SIZE);
        routing.install_notifier(ProviderNotifier { tx });
        (ProviderAnnouncer { routing }, rx)
    }

    /// Announce that the local node provides `cid`.
    pub async fn provide(&self, cid: &str) -> Result<(), OverlayError> {
        self.routing.provide(cid).await?;
        debug!(cid = %cid, "announced cid to dht");
        Ok(())
    }

    /// Current DHT routing table size (diagnostics).
    pub fn routing_table_size(&self) -> usize {
        self.routing.routing_table_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemContentRouting;

    #[tokio::test]
    async fn test_provide_delegates_to_dht() {
        let dht = Arc::new(MemContentRouting::new());
        let (announcer, _rx) = ProviderAnnouncer::new(dht.clone());

        announcer.provide("bafy1").await.unwrap();
        announcer.provide("bafy2").await.unwrap();

        assert_eq!(dht.provided(), vec!["bafy1".to_string(), "bafy2".to_string()]);
    }

    #[tokio::test]
    async fn test_notifications_flow_through_channel() {
        let dht = Arc::new(MemContentRouting::new());
        let (_announcer, mut rx) = ProviderAnnouncer::new(dht.clone());

        dht.announce_provider(Peer::new("peer-b", vec![]), "bafy9")
            .await
            .unwrap();

        let notif = rx.recv().await.unwrap();
        assert_eq!(notif.peer.id, "peer-b");
        assert_eq!(notif.record_ref.cid, "bafy9");
    }

    #[tokio::test]
    async fn test_notify_errors_after_receiver_dropped() {
        let dht = Arc::new(MemContentRouting::new());
        let (_announcer, rx) = ProviderAnnouncer::new(dht.clone());
        drop(rx);

        let err = dht
            .announce_provider(Peer::new("peer-b", vec![]), "bafy9")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("closed"));
    }
}
