//! Provider notification handler
//!
//! Fallback label discovery via DHT + pull. For every provider
//! observation the reconciler either refreshes the timestamps of labels
//! the gossip path already cached (the common case) or pulls the record
//! and extracts labels itself (gossip lost, lagging, or disabled).
//!
//! A pull failure is not retried here; the provider's next
//! reannouncement drives another attempt.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::data::Datastore;
use crate::labels::{build_enhanced_label_key, LabelMetadata};
use crate::network::overlay::RecordStore;
use crate::network::provider::ProviderNotification;
use crate::routing::constants::PEER_ADDRS_PREFIX;

use super::{has_remote_record_cached, update_remote_record_last_seen};

/// Drain the provider-notification channel until it closes or the task
/// is aborted at shutdown.
pub(crate) async fn run_notify_loop(
    store: Arc<dyn Datastore>,
    records: Arc<dyn RecordStore>,
    local_peer_id: String,
    mut notifications: mpsc::Receiver<ProviderNotification>,
) {
    info!("provider notification handler started");

    while let Some(notification) = notifications.recv().await {
        handle_provider_notification(store.as_ref(), records.as_ref(), &local_peer_id, notification)
            .await;
    }

    info!("provider notification handler stopped");
}

/// Process one provider observation.
///
/// Flow:
///  1. Drop self-announcements.
///  2. Learn the peer's addresses (first write wins for this process).
///  3. Fast path: labels already cached, refresh `last_seen` only.
///  4. Slow path: pull the record and cache its labels.
pub(crate) async fn handle_provider_notification(
    store: &dyn Datastore,
    records: &dyn RecordStore,
    local_peer_id: &str,
    notification: ProviderNotification,
) {
    let peer_id = notification.peer.id.clone();
    let cid = notification.record_ref.cid.clone();

    if peer_id == local_peer_id {
        debug!(cid = %cid, "ignoring self announcement");
        return;
    }

    // Remember how to reach this peer. Later notifications do not
    // overwrite, to avoid address thrash within one process lifetime.
    if !notification.peer.addrs.is_empty() {
        let key = format!("{}{}", PEER_ADDRS_PREFIX, peer_id);
        match store.get(&key) {
            Ok(None) => match serde_json::to_vec(&notification.peer.addrs) {
                Ok(encoded) => {
                    if let Err(e) = store.put(&key, &encoded) {
                        error!(peer = %peer_id, error = %e, "failed to store peer addresses");
                    } else {
                        debug!(peer = %peer_id, addrs = notification.peer.addrs.len(), "stored peer addresses");
                    }
                }
                Err(e) => error!(peer = %peer_id, error = %e, "failed to encode peer addresses"),
            },
            Ok(Some(_)) => {}
            Err(e) => error!(peer = %peer_id, error = %e, "failed to read peer addresses"),
        }
    }

    // Fast path: gossip (or an earlier pull) already cached the labels
    if has_remote_record_cached(store, &cid, &peer_id) {
        debug!(cid = %cid, peer = %peer_id, "labels already cached, updating last_seen");
        update_remote_record_last_seen(store, &cid, &peer_id, Utc::now());
        return;
    }

    // Slow path: no cached labels, pull the record
    debug!(cid = %cid, peer = %peer_id, "no cached labels, falling back to pull");

    let record = match records.pull(&peer_id, &notification.record_ref).await {
        Ok(record) => record,
        Err(e) => {
            error!(cid = %cid, peer = %peer_id, error = %e, "failed to pull remote record for label caching");
            return;
        }
    };

    let labels = record.labels();
    if labels.is_empty() {
        warn!(cid = %cid, peer = %peer_id, "no labels found in remote record");
        return;
    }

    let now = Utc::now();
    let mut cached = 0;

    for label in labels {
        let key = build_enhanced_label_key(label, &cid, &peer_id);
        let metadata = LabelMetadata::now(now);

        let encoded = match metadata.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode label metadata");
                continue;
            }
        };

        match store.put(&key, &encoded) {
            Ok(()) => cached += 1,
            Err(e) => warn!(key = %key, error = %e, "failed to cache pulled label"),
        }
    }

    info!(
        cid = %cid,
        peer = %peer_id,
        total = labels.len(),
        cached = cached,
        "cached labels via pull fallback"
    );
}
