//! Main Routing implementation
//!
//! Hybrid label discovery: every publish announces the record's CID on
//! the DHT (reliable, k-limited) and broadcasts its labels over gossip
//! (fast, best-effort). Remote observations from both paths converge in
//! the label index via the reconciler, and searches are answered from
//! that index alone.

use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::data::Datastore;
use crate::handlers;
use crate::labels::{build_enhanced_label_key, Label, LabelMetadata};
use crate::network::gossip::{AnnouncementCallback, GossipAnnouncer};
use crate::network::overlay::{ContentRouting, GossipSubscription, GossipTopic, RecordStore};
use crate::network::provider::ProviderAnnouncer;
use crate::tasks;

use super::config::RoutingConfig;
use super::constants::{CLEANUP_INTERVAL, REMOTE_TTL, REPUBLISH_INTERVAL};
use super::error::{validate_cid, RoutingError};
use super::search::{deduplicate_queries, search_remote_records};
use super::types::{Record, RecordRef, SearchRequest, SearchResponse};

/// Capacity of a search result stream.
const SEARCH_CHANNEL_SIZE: usize = 64;

/// The overlay capabilities supplied by the embedding host.
///
/// The host owns transport concerns (listen address, bootstrap, DHT
/// validators and record TTL, gossip router); the core only consumes
/// these interfaces. Gossip halves may be absent when the host does not
/// run the labels topic.
pub struct Overlay {
    /// This node's overlay identity, fixed for the process lifetime.
    pub local_peer_id: String,
    /// DHT content-provider interface.
    pub content_routing: Arc<dyn ContentRouting>,
    /// Remote record retrieval for the pull fallback.
    pub record_store: Arc<dyn RecordStore>,
    /// Publish half of the labels topic.
    pub gossip_topic: Option<Arc<dyn GossipTopic>>,
    /// Subscribe half of the labels topic.
    pub gossip_subscription: Option<Box<dyn GossipSubscription>>,
}

/// The remote routing core.
pub struct Routing {
    /// Configuration
    #[allow(dead_code)]
    config: RoutingConfig,
    /// Local overlay identity
    local_peer_id: String,
    /// Label index
    store: Arc<dyn Datastore>,
    /// DHT announce path
    provider: Arc<ProviderAnnouncer>,
    /// Gossip announce path (None when disabled)
    gossip: Option<Arc<GossipAnnouncer>>,
    /// Running flag shared with the background loops
    running: Arc<RwLock<bool>>,
    /// Background task handles
    tasks: Arc<RwLock<Vec<JoinHandle<()>>>>,
}

impl Routing {
    /// Start the routing core.
    ///
    /// Wires the provider-notification channel, joins the labels topic
    /// (when gossip is enabled and the host supplies it), and starts the
    /// four background tasks: gossip handler, notification handler,
    /// republish ticker, cleanup ticker.
    pub async fn start(
        config: RoutingConfig,
        overlay: Overlay,
        store: Arc<dyn Datastore>,
    ) -> Result<Self, RoutingError> {
        let local_peer_id = overlay.local_peer_id.clone();
        let running = Arc::new(RwLock::new(true));

        let (provider, notifications) = ProviderAnnouncer::new(overlay.content_routing.clone());
        let provider = Arc::new(provider);

        // Gossip path: enabled by config AND supplied by the host
        let gossip = if config.gossip_enabled {
            match (overlay.gossip_topic, overlay.gossip_subscription) {
                (Some(topic), Some(subscription)) => {
                    let callback_store = store.clone();
                    let callback_peer = local_peer_id.clone();
                    let on_announcement: AnnouncementCallback = Arc::new(move |announcement| {
                        handlers::cache_label_announcement(
                            callback_store.as_ref(),
                            &callback_peer,
                            &announcement,
                        );
                    });

                    info!("gossip label announcements enabled");
                    Some(Arc::new(GossipAnnouncer::start(
                        local_peer_id.clone(),
                        topic,
                        subscription,
                        on_announcement,
                    )))
                }
                _ => {
                    return Err(RoutingError::StartFailed(
                        "gossip enabled but topic or subscription missing".to_string(),
                    ));
                }
            }
        } else {
            info!("gossip disabled, using dht+pull fallback only");
            None
        };

        let routing = Self {
            config,
            local_peer_id,
            store,
            provider,
            gossip,
            running,
            tasks: Arc::new(RwLock::new(Vec::new())),
        };

        routing.start_background_tasks(notifications, overlay.record_store).await;

        info!(peer_id = %routing.local_peer_id, "routing core started");
        Ok(routing)
    }

    /// Spawn the notification handler and the two maintenance tickers.
    async fn start_background_tasks(
        &self,
        notifications: mpsc::Receiver<crate::network::provider::ProviderNotification>,
        record_store: Arc<dyn RecordStore>,
    ) {
        let mut task_handles = self.tasks.write().await;

        // 1. Provider notification handler (reconciler)
        let notify_task = tokio::spawn(handlers::run_notify_loop(
            self.store.clone(),
            record_store,
            self.local_peer_id.clone(),
            notifications,
        ));
        task_handles.push(notify_task);

        // 2. Republish ticker: re-announce owned records through the
        // same path Publish uses, injected as a callback so the
        // maintenance module stays transport-free
        let provider = self.provider.clone();
        let gossip = self.gossip.clone();
        let republish: tasks::RepublishFn = Arc::new(move |cid, labels| {
            let provider = provider.clone();
            let gossip = gossip.clone();
            async move {
                publish_to_network(&provider, gossip.as_deref(), &cid, &labels)
                    .await
                    .map_err(|e| e.to_string())
            }
            .boxed()
        });

        let republish_task = tokio::spawn(tasks::run_republish_loop(
            self.store.clone(),
            self.local_peer_id.clone(),
            republish,
            self.running.clone(),
            REPUBLISH_INTERVAL,
        ));
        task_handles.push(republish_task);

        // 3. Cleanup ticker
        let cleanup_task = tokio::spawn(tasks::run_cleanup_loop(
            self.store.clone(),
            self.local_peer_id.clone(),
            self.running.clone(),
            CLEANUP_INTERVAL,
            REMOTE_TTL,
        ));
        task_handles.push(cleanup_task);

        info!("background tasks started");
    }

    /// Our overlay identity.
    pub fn local_peer_id(&self) -> &str {
        &self.local_peer_id
    }

    /// Announce a newly stored record to the network.
    ///
    /// Writes the owned index entries, announces the CID on the DHT
    /// (hard requirement: the error surfaces), and broadcasts the labels
    /// over gossip (best effort: failures are logged, the DHT+pull
    /// fallback covers discovery).
    pub async fn publish(&self, record_ref: &RecordRef, record: &Record) -> Result<(), RoutingError> {
        self.check_running().await?;
        validate_cid(&record_ref.cid)?;

        debug!(cid = %record_ref.cid, "publishing record to network");

        let labels = record.labels();

        // Owned entries back search-independent republish; they are
        // never TTL-evicted
        let now = Utc::now();
        for label in labels {
            let key = build_enhanced_label_key(label, &record_ref.cid, &self.local_peer_id);
            let metadata = LabelMetadata::now(now);
            match metadata.encode() {
                Ok(encoded) => {
                    if let Err(e) = self.store.put(&key, &encoded) {
                        warn!(key = %key, error = %e, "failed to store owned label entry");
                    }
                }
                Err(e) => warn!(key = %key, error = %e, "failed to encode owned label metadata"),
            }
        }

        publish_to_network(&self.provider, self.gossip.as_deref(), &record_ref.cid, labels).await?;

        debug!(
            cid = %record_ref.cid,
            dht_peers = self.provider.routing_table_size(),
            gossip_enabled = self.gossip.is_some(),
            "announced record to network"
        );

        Ok(())
    }

    /// Search remotely cached labels with OR logic and a minimum match
    /// threshold. Results stream through the returned receiver; drop it
    /// to cancel the scan.
    pub async fn search(
        &self,
        request: SearchRequest,
    ) -> Result<mpsc::Receiver<SearchResponse>, RoutingError> {
        self.check_running().await?;

        let queries = deduplicate_queries(&request.queries);
        if queries.len() != request.queries.len() {
            info!(
                original = request.queries.len(),
                deduplicated = queries.len(),
                "deduplicated search queries"
            );
        }

        // Contract: an unset threshold means "match at least one query"
        let min_match_score = request
            .min_match_score
            .max(super::constants::DEFAULT_MIN_MATCH_SCORE);

        let (tx, rx) = mpsc::channel(SEARCH_CHANNEL_SIZE);
        let store = self.store.clone();
        let local_peer_id = self.local_peer_id.clone();
        let limit = request.limit;

        tokio::spawn(async move {
            search_remote_records(
                store.as_ref(),
                &local_peer_id,
                queries,
                limit,
                min_match_score,
                tx,
            )
            .await;
        });

        Ok(rx)
    }

    /// Stop the routing core: gossip subscription and topic first, then
    /// the background tasks.
    pub async fn stop(&self) {
        info!("stopping routing core");

        {
            let mut running = self.running.write().await;
            *running = false;
        }

        if let Some(gossip) = &self.gossip {
            gossip.close().await;
        }

        {
            let mut task_handles = self.tasks.write().await;
            for task in task_handles.drain(..) {
                task.abort();
            }
        }

        info!("routing core stopped");
    }

    async fn check_running(&self) -> Result<(), RoutingError> {
        let running = self.running.read().await;
        if !*running {
            return Err(RoutingError::NotRunning);
        }
        Ok(())
    }
}

/// Shared announce path for Publish and the republish ticker: DHT
/// provide is the hard step, gossip is best effort.
pub(crate) async fn publish_to_network(
    provider: &ProviderAnnouncer,
    gossip: Option<&GossipAnnouncer>,
    cid: &str,
    labels: &[Label],
) -> Result<(), RoutingError> {
    // 1. Announce the CID to the DHT (content discovery)
    provider
        .provide(cid)
        .await
        .map_err(|e| RoutingError::Network(format!("failed to announce cid to dht: {}", e)))?;

    // 2. Broadcast the labels over gossip; DHT+pull covers loss
    if let Some(gossip) = gossip {
        if !labels.is_empty() {
            match gossip.publish_labels(cid, labels).await {
                Ok(()) => debug!(
                    cid = %cid,
                    labels = labels.len(),
                    topic_peers = gossip.topic_peers().len(),
                    "published labels via gossip"
                ),
                Err(e) => warn!(
                    cid = %cid,
                    error = %e,
                    "failed to publish labels via gossip, dht+pull will handle discovery"
                ),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryDatastore;
    use crate::labels::parse_enhanced_label_key;
    use crate::routing::types::{QueryKind, RecordQuery};
    use crate::testing::{MemContentRouting, MemGossipHub, MemRecordStore};

    async fn start_node(
        hub: &MemGossipHub,
        peer_id: &str,
    ) -> (Routing, Arc<MemContentRouting>, Arc<MemRecordStore>, Arc<MemoryDatastore>) {
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
        (routing, dht, records, store)
    }

    #[tokio::test]
    async fn test_publish_writes_one_owned_entry_per_label() {
        let hub = MemGossipHub::new();
        let (routing, dht, _records, store) = start_node(&hub, "local").await;

        let record = Record::new(
            "bafy1",
            vec![Label::new("/skills/AI/ML"), Label::new("/domains/research")],
        );
        routing.publish(&RecordRef::new("bafy1"), &record).await.unwrap();

        let mut owned = 0;
        for ns in crate::labels::Namespace::ALL {
            for (key, _) in store.query_prefix(&ns.prefix()).unwrap() {
                let parsed = parse_enhanced_label_key(&key).unwrap();
                assert_eq!(parsed.peer_id, "local");
                assert_eq!(parsed.cid, "bafy1");
                owned += 1;
            }
        }
        assert_eq!(owned, 2);
        assert_eq!(dht.provided(), vec!["bafy1".to_string()]);

        routing.stop().await;
    }

    #[tokio::test]
    async fn test_publish_rejects_invalid_cid() {
        let hub = MemGossipHub::new();
        let (routing, dht, _records, _store) = start_node(&hub, "local").await;

        let record = Record::new("bad/cid", vec![Label::new("/skills/AI/ML")]);
        let err = routing
            .publish(&RecordRef::new("bad/cid"), &record)
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::InvalidCid(_)));
        assert!(dht.provided().is_empty());

        routing.stop().await;
    }

    #[tokio::test]
    async fn test_publish_surfaces_dht_failure() {
        let hub = MemGossipHub::new();
        let (routing, dht, _records, _store) = start_node(&hub, "local").await;
        dht.fail_provides();

        let record = Record::new("bafy1", vec![Label::new("/skills/AI/ML")]);
        let err = routing
            .publish(&RecordRef::new("bafy1"), &record)
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::Network(_)));

        routing.stop().await;
    }

    #[tokio::test]
    async fn test_search_clamps_zero_min_match_score() {
        let hub = MemGossipHub::new();
        let (routing, _dht, _records, store) = start_node(&hub, "local").await;

        // A remote record matching one query
        let meta = LabelMetadata::now(Utc::now());
        store
            .put("/skills/AI/ML/c1/p1", &meta.encode().unwrap())
            .unwrap();

        let mut rx = routing
            .search(SearchRequest {
                queries: vec![RecordQuery::new(QueryKind::Skill, "AI/ML")],
                limit: 0,
                min_match_score: 0,
            })
            .await
            .unwrap();

        let hit = rx.recv().await.unwrap();
        assert!(hit.match_score >= 1);
        assert!(rx.recv().await.is_none());

        routing.stop().await;
    }

    #[tokio::test]
    async fn test_operations_fail_after_stop() {
        let hub = MemGossipHub::new();
        let (routing, _dht, _records, _store) = start_node(&hub, "local").await;
        routing.stop().await;

        let record = Record::new("bafy1", vec![Label::new("/skills/AI/ML")]);
        let err = routing
            .publish(&RecordRef::new("bafy1"), &record)
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::NotRunning));

        let err = routing
            .search(SearchRequest {
                queries: vec![],
                limit: 0,
                min_match_score: 0,
            })
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RoutingError::NotRunning));
    }

    #[tokio::test]
    async fn test_start_requires_gossip_halves_when_enabled() {
        let dht = Arc::new(MemContentRouting::new());
        let records = Arc::new(MemRecordStore::new());
        let store = Arc::new(MemoryDatastore::new());

        let overlay = Overlay {
            local_peer_id: "local".to_string(),
            content_routing: dht,
            record_store: records,
            gossip_topic: None,
            gossip_subscription: None,
        };

        let err = Routing::start(RoutingConfig::for_testing(), overlay, store)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RoutingError::StartFailed(_)));
    }

    #[tokio::test]
    async fn test_start_without_gossip_when_disabled() {
        let dht = Arc::new(MemContentRouting::new());
        let records = Arc::new(MemRecordStore::new());
        let store = Arc::new(MemoryDatastore::new());

        let overlay = Overlay {
            local_peer_id: "local".to_string(),
            content_routing: dht.clone(),
            record_store: records,
            gossip_topic: None,
            gossip_subscription: None,
        };

        let routing = Routing::start(
            RoutingConfig::for_testing().without_gossip(),
            overlay,
            store,
        )
        .await
        .unwrap();

        // Publishing still works via the DHT alone
        let record = Record::new("bafy1", vec![Label::new("/skills/AI/ML")]);
        routing.publish(&RecordRef::new("bafy1"), &record).await.unwrap();
        assert_eq!(dht.provided(), vec!["bafy1".to_string()]);

        routing.stop().await;
    }
}
