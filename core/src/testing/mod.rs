//! Test utilities
//!
//! In-memory doubles for the overlay capabilities, so routing behavior
//! can be exercised without a network:
//!
//! - `MemGossipHub`: a broadcast hub standing in for the gossip router
//! - `MemContentRouting`: records provides and forwards injected
//!   provider notifications
//! - `MemRecordStore`: serves records for the pull fallback
//!
//! The hub delivers published messages to every member including the
//! publisher, like a real gossip mesh, so self-filtering is exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::network::overlay::{
    ContentRouting, GossipMessage, GossipSubscription, GossipTopic, OverlayError, RecordStore,
};
use crate::network::provider::{ProviderNotification, ProviderNotifier};
use crate::routing::types::{Peer, Record, RecordRef};

/// A random identifier with the given prefix, for tests that need fresh
/// CIDs or peer IDs.
pub fn random_id(prefix: &str) -> String {
    use rand::Rng;
    const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..16)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}{}", prefix, suffix)
}

struct HubMember {
    peer_id: String,
    tx: mpsc::UnboundedSender<GossipMessage>,
}

/// An in-memory gossip mesh shared by test nodes.
#[derive(Clone, Default)]
pub struct MemGossipHub {
    members: Arc<Mutex<Vec<HubMember>>>,
}

impl MemGossipHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the hub as `peer_id`, returning the topic and subscription
    /// halves for that member.
    pub fn join(&self, peer_id: &str) -> (MemGossipTopic, MemGossipSubscription) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.members.lock().expect("lock poisoned").push(HubMember {
            peer_id: peer_id.to_string(),
            tx,
        });

        (
            MemGossipTopic {
                hub: self.clone(),
                peer_id: peer_id.to_string(),
            },
            MemGossipSubscription { rx },
        )
    }

    fn broadcast(&self, source: &str, data: Vec<u8>) {
        let members = self.members.lock().expect("lock poisoned");
        for member in members.iter() {
            // Delivery to self included, as in a real mesh
            let _ = member.tx.send(GossipMessage {
                source: source.to_string(),
                data: data.clone(),
            });
        }
    }

    fn leave(&self, peer_id: &str) {
        let mut members = self.members.lock().expect("lock poisoned");
        members.retain(|m| m.peer_id != peer_id);
    }

    fn peers_other_than(&self, peer_id: &str) -> Vec<String> {
        let members = self.members.lock().expect("lock poisoned");
        members
            .iter()
            .filter(|m| m.peer_id != peer_id)
            .map(|m| m.peer_id.clone())
            .collect()
    }
}

/// Publish half of a hub membership.
pub struct MemGossipTopic {
    hub: MemGossipHub,
    peer_id: String,
}

#[async_trait]
impl GossipTopic for MemGossipTopic {
    async fn publish(&self, data: Vec<u8>) -> Result<(), OverlayError> {
        self.hub.broadcast(&self.peer_id, data);
        Ok(())
    }

    fn peers(&self) -> Vec<String> {
        self.hub.peers_other_than(&self.peer_id)
    }

    async fn close(&self) -> Result<(), OverlayError> {
        self.hub.leave(&self.peer_id);
        Ok(())
    }
}

/// Subscribe half of a hub membership.
pub struct MemGossipSubscription {
    rx: mpsc::UnboundedReceiver<GossipMessage>,
}

#[async_trait]
impl GossipSubscription for MemGossipSubscription {
    async fn next(&mut self) -> Option<GossipMessage> {
        self.rx.recv().await
    }
}

/// In-memory stand-in for the DHT content-provider interface.
#[derive(Default)]
pub struct MemContentRouting {
    provided: Mutex<Vec<String>>,
    notifier: Mutex<Option<ProviderNotifier>>,
    fail_provides: AtomicBool,
    routing_table_size: AtomicUsize,
}

impl MemContentRouting {
    pub fn new() -> Self {
        Self::default()
    }

    /// CIDs announced via `provide`, in order.
    pub fn provided(&self) -> Vec<String> {
        self.provided.lock().expect("lock poisoned").clone()
    }

    /// Make subsequent `provide` calls fail.
    pub fn fail_provides(&self) {
        self.fail_provides.store(true, Ordering::SeqCst);
    }

    pub fn set_routing_table_size(&self, size: usize) {
        self.routing_table_size.store(size, Ordering::SeqCst);
    }

    /// Inject a provider observation, as the DHT's provider store would.
    pub async fn announce_provider(&self, peer: Peer, cid: &str) -> Result<(), OverlayError> {
        let notifier = {
            let guard = self.notifier.lock().expect("lock poisoned");
            guard.clone()
        };
        let notifier =
            notifier.ok_or_else(|| OverlayError::Network("no notifier installed".to_string()))?;

        notifier
            .notify(ProviderNotification {
                peer,
                record_ref: RecordRef::new(cid),
            })
            .await
    }
}

#[async_trait]
impl ContentRouting for MemContentRouting {
    async fn provide(&self, cid: &str) -> Result<(), OverlayError> {
        if self.fail_provides.load(Ordering::SeqCst) {
            return Err(OverlayError::Network("provide failed".to_string()));
        }
        self.provided
            .lock()
            .expect("lock poisoned")
            .push(cid.to_string());
        Ok(())
    }

    fn install_notifier(&self, notifier: ProviderNotifier) {
        *self.notifier.lock().expect("lock poisoned") = Some(notifier);
    }

    fn routing_table_size(&self) -> usize {
        self.routing_table_size.load(Ordering::SeqCst)
    }
}

/// In-memory record store serving the pull fallback.
#[derive(Default)]
pub struct MemRecordStore {
    records: Mutex<HashMap<(String, String), Record>>,
    pulls: AtomicUsize,
}

impl MemRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `record` pullable from `peer_id`.
    pub fn insert(&self, peer_id: &str, record: Record) {
        self.records
            .lock()
            .expect("lock poisoned")
            .insert((peer_id.to_string(), record.cid.clone()), record);
    }

    /// Number of pull attempts, successful or not.
    pub fn pull_count(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MemRecordStore {
    async fn pull(&self, peer_id: &str, record_ref: &RecordRef) -> Result<Record, OverlayError> {
        self.pulls.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().expect("lock poisoned");
        records
            .get(&(peer_id.to_string(), record_ref.cid.clone()))
            .cloned()
            .ok_or_else(|| OverlayError::NotFound(format!("{}@{}", record_ref.cid, peer_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{scan_all_namespaces, MemoryDatastore};
    use crate::labels::{parse_enhanced_label_key, Label, LabelMetadata};
    use crate::routing::{Overlay, Record, RecordRef, Routing, RoutingConfig};
    use std::time::Duration;

    struct TestNode {
        routing: Routing,
        dht: Arc<MemContentRouting>,
        records: Arc<MemRecordStore>,
        store: Arc<MemoryDatastore>,
    }

    async fn start_node(hub: &MemGossipHub, peer_id: &str) -> TestNode {
        let dht = Arc::new(MemContentRouting::new());
        let records = Arc::new(MemRecordStore::new());
        let store = Arc::new(MemoryDatastore::new());
        let (topic, subscription) = hub.join(peer_id);

        let overlay = Overlay {
            local_peer_id: peer_id.to_string(),
            content_routing: dht.clone(),
            record_store: records.clone(),
            gossip_topic: Some(Arc::new(topic)),
            gossip_subscription: Some(Box::new(subscription)),
        };

        let routing = Routing::start(RoutingConfig::for_testing(), overlay, store.clone())
            .await
            .unwrap();

        TestNode {
            routing,
            dht,
            records,
            store,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(80)).await;
    }

    fn remote_keys(store: &MemoryDatastore, cid: &str, peer: &str) -> Vec<(String, LabelMetadata)> {
        scan_all_namespaces(store)
            .into_iter()
            .filter_map(|entry| {
                let parsed = parse_enhanced_label_key(&entry.key).ok()?;
                if parsed.cid == cid && parsed.peer_id == peer {
                    Some((entry.key, LabelMetadata::decode(&entry.value).unwrap()))
                } else {
                    None
                }
            })
            .collect()
    }

    fn sample_record(cid: &str) -> Record {
        Record::new(
            cid,
            vec![Label::new("/skills/AI/ML"), Label::new("/domains/research")],
        )
    }

    // ========== Hybrid propagation scenarios ==========

    #[tokio::test]
    async fn test_gossip_first_race() {
        let hub = MemGossipHub::new();
        let node_a = start_node(&hub, "peer-a").await;
        let node_b = start_node(&hub, "peer-b").await;

        // A publishes; gossip reaches B first
        node_a
            .routing
            .publish(&RecordRef::new("c1"), &sample_record("c1"))
            .await
            .unwrap();
        settle().await;

        let cached = remote_keys(&node_b.store, "c1", "peer-a");
        assert_eq!(cached.len(), 2, "both labels cached from gossip");
        let seen_before: Vec<_> = cached.iter().map(|(_, m)| m.last_seen).collect();

        // The provider notification arrives later: fast path refreshes
        // last_seen without pulling
        node_b
            .dht
            .announce_provider(Peer::new("peer-a", vec![]), "c1")
            .await
            .unwrap();
        settle().await;

        let cached = remote_keys(&node_b.store, "c1", "peer-a");
        assert_eq!(cached.len(), 2, "no duplicate entries after notification");
        for ((_, meta), before) in cached.iter().zip(seen_before) {
            assert!(meta.last_seen >= before);
        }
        assert_eq!(node_b.records.pull_count(), 0, "fast path must not pull");

        node_a.routing.stop().await;
        node_b.routing.stop().await;
    }

    #[tokio::test]
    async fn test_dht_first_race() {
        let hub = MemGossipHub::new();
        let node_b = start_node(&hub, "peer-b").await;

        // No gossip yet: B learns about the record from the DHT and
        // falls back to pulling it from A
        node_b.records.insert("peer-a", sample_record("c1"));
        node_b
            .dht
            .announce_provider(Peer::new("peer-a", vec![]), "c1")
            .await
            .unwrap();
        settle().await;

        let cached = remote_keys(&node_b.store, "c1", "peer-a");
        assert_eq!(cached.len(), 2, "labels cached via pull fallback");
        assert_eq!(node_b.records.pull_count(), 1);
        for (_, meta) in &cached {
            assert_eq!(meta.timestamp, meta.last_seen, "pull stamps both times");
        }

        // The late gossip announcement overwrites the metadata in place
        let node_a = start_node(&hub, "peer-a").await;
        node_a
            .routing
            .publish(&RecordRef::new("c1"), &sample_record("c1"))
            .await
            .unwrap();
        settle().await;

        let cached = remote_keys(&node_b.store, "c1", "peer-a");
        assert_eq!(cached.len(), 2, "same key set after gossip arrival");
        for (_, meta) in &cached {
            assert!(meta.last_seen >= meta.timestamp);
        }

        node_a.routing.stop().await;
        node_b.routing.stop().await;
    }

    #[tokio::test]
    async fn test_self_filter_on_both_paths() {
        let hub = MemGossipHub::new();
        let node_a = start_node(&hub, "peer-a").await;

        node_a
            .routing
            .publish(&RecordRef::new("c1"), &sample_record("c1"))
            .await
            .unwrap();
        settle().await;

        // Only the two owned entries; the gossip handler did not write a
        // second copy
        assert_eq!(node_a.store.len(), 2);

        // Our own provider notification must not trigger a pull
        node_a
            .dht
            .announce_provider(Peer::new("peer-a", vec![]), "c1")
            .await
            .unwrap();
        settle().await;

        assert_eq!(node_a.store.len(), 2);
        assert_eq!(node_a.records.pull_count(), 0);

        node_a.routing.stop().await;
    }

    #[tokio::test]
    async fn test_publish_then_search_on_remote_node() {
        let hub = MemGossipHub::new();
        let node_a = start_node(&hub, "peer-a").await;
        let node_b = start_node(&hub, "peer-b").await;

        let cid = random_id("bafy");
        node_a
            .routing
            .publish(&RecordRef::new(cid.clone()), &sample_record(&cid))
            .await
            .unwrap();
        settle().await;

        use crate::routing::{QueryKind, RecordQuery, SearchRequest};
        let mut rx = node_b
            .routing
            .search(SearchRequest {
                queries: vec![
                    RecordQuery::new(QueryKind::Skill, "AI/ML"),
                    RecordQuery::new(QueryKind::Domain, "research"),
                ],
                limit: 0,
                min_match_score: 2,
            })
            .await
            .unwrap();

        let hit = rx.recv().await.unwrap();
        assert_eq!(hit.record_ref.cid, cid);
        assert_eq!(hit.peer.id, "peer-a");
        assert_eq!(hit.match_score, 2);
        assert!(rx.recv().await.is_none());

        // The publisher's own search must not return its own record
        let mut rx = node_a
            .routing
            .search(SearchRequest {
                queries: vec![RecordQuery::new(QueryKind::Skill, "AI/ML")],
                limit: 0,
                min_match_score: 1,
            })
            .await
            .unwrap();
        assert!(rx.recv().await.is_none());

        node_a.routing.stop().await;
        node_b.routing.stop().await;
    }

    #[tokio::test]
    async fn test_peer_addresses_learned_from_notification() {
        let hub = MemGossipHub::new();
        let node_b = start_node(&hub, "peer-b").await;
        node_b.records.insert("peer-a", sample_record("c1"));

        node_b
            .dht
            .announce_provider(
                Peer::new(
                    "peer-a",
                    vec!["/ip4/10.0.0.1/tcp/8999/dir/grpc.peer-a.example:8888".to_string()],
                ),
                "c1",
            )
            .await
            .unwrap();
        settle().await;

        use crate::routing::{QueryKind, RecordQuery, SearchRequest};
        let mut rx = node_b
            .routing
            .search(SearchRequest {
                queries: vec![RecordQuery::new(QueryKind::Skill, "AI/ML")],
                limit: 0,
                min_match_score: 1,
            })
            .await
            .unwrap();

        let hit = rx.recv().await.unwrap();
        assert_eq!(hit.peer.addrs, vec!["grpc.peer-a.example:8888".to_string()]);

        node_b.routing.stop().await;
    }
}
