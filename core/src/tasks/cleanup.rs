//! Remote label cleanup
//!
//! Remote entries whose `last_seen` has aged past REMOTE_TTL are
//! evicted; a live publisher refreshes them via republish long before
//! that. Owned entries are never TTL-evicted. Malformed keys and values
//! are skipped, never deleted en masse.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, trace, warn};

use crate::data::{scan_all_namespaces, Datastore};
use crate::labels::{parse_enhanced_label_key, LabelMetadata};

/// Sweep once: delete remote entries older than `ttl`. Returns the
/// number of deleted keys. Per-entry failures are logged and the sweep
/// continues.
pub(crate) fn cleanup_remote_labels(
    store: &dyn Datastore,
    local_peer_id: &str,
    now: DateTime<Utc>,
    ttl: Duration,
) -> usize {
    let mut deleted = 0;

    for entry in scan_all_namespaces(store) {
        let parsed = match parse_enhanced_label_key(&entry.key) {
            Ok(parsed) => parsed,
            Err(e) => {
                trace!(key = %entry.key, error = %e, "skipping malformed key");
                continue;
            }
        };

        // Owned entries live until the record is unpublished
        if parsed.peer_id == local_peer_id {
            continue;
        }

        let metadata = match LabelMetadata::decode(&entry.value) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(key = %entry.key, error = %e, "skipping entry with undecodable metadata");
                continue;
            }
        };

        let age = now.signed_duration_since(metadata.last_seen);
        if age.num_seconds() <= ttl.as_secs() as i64 {
            continue;
        }

        match store.delete(&entry.key) {
            Ok(()) => {
                deleted += 1;
                trace!(key = %entry.key, age_secs = age.num_seconds(), "evicted stale remote label");
            }
            Err(e) => warn!(key = %entry.key, error = %e, "failed to delete stale remote label"),
        }
    }

    deleted
}

/// Run the periodic cleanup loop until the core stops.
pub(crate) async fn run_cleanup_loop(
    store: Arc<dyn Datastore>,
    local_peer_id: String,
    running: Arc<RwLock<bool>>,
    interval: Duration,
    ttl: Duration,
) {
    info!(
        interval_secs = interval.as_secs(),
        ttl_secs = ttl.as_secs(),
        "cleanup loop started"
    );

    loop {
        if !*running.read().await {
            break;
        }

        tokio::time::sleep(interval).await;

        // Skip if stopped during sleep
        if !*running.read().await {
            break;
        }

        let deleted = cleanup_remote_labels(store.as_ref(), &local_peer_id, Utc::now(), ttl);
        if deleted > 0 {
            info!(deleted = deleted, "cleanup: evicted stale remote labels");
        } else {
            trace!("cleanup: nothing to evict");
        }
    }

    info!("cleanup loop stopped");
}
