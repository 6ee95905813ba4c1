//! Republish loop
//!
//! DHT provider records expire at RECORD_TTL and remote caches evict at
//! REMOTE_TTL, so locally owned records are re-announced on a fixed
//! period. The actual announce goes through a callback injected by the
//! routing core: this module walks the index, the core owns the
//! transports.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::{info, trace, warn};

use crate::data::{scan_all_namespaces, Datastore};
use crate::labels::{parse_enhanced_label_key, Label};

/// Re-announce one owned record: DHT provide plus gossip broadcast.
pub(crate) type RepublishFn =
    Arc<dyn Fn(String, Vec<Label>) -> BoxFuture<'static, Result<(), String>> + Send + Sync>;

/// Group the locally owned index entries by CID, collecting each
/// record's label set. Malformed keys are skipped.
pub(crate) fn collect_owned_records(
    store: &dyn Datastore,
    local_peer_id: &str,
) -> Vec<(String, Vec<Label>)> {
    let mut order: Vec<String> = Vec::new();
    let mut labels_by_cid: std::collections::HashMap<String, Vec<Label>> =
        std::collections::HashMap::new();

    for entry in scan_all_namespaces(store) {
        let parsed = match parse_enhanced_label_key(&entry.key) {
            Ok(parsed) => parsed,
            Err(_) => continue,
        };

        if parsed.peer_id != local_peer_id {
            continue;
        }

        let labels = labels_by_cid.entry(parsed.cid.clone()).or_insert_with(|| {
            order.push(parsed.cid.clone());
            Vec::new()
        });
        labels.push(parsed.label);
    }

    order
        .into_iter()
        .map(|cid| {
            let labels = labels_by_cid.remove(&cid).unwrap_or_default();
            (cid, labels)
        })
        .collect()
}

/// Re-announce every owned record once. Per-record failures are logged
/// and the sweep continues. Returns (announced, failed).
pub(crate) async fn republish_owned_records(
    store: &dyn Datastore,
    local_peer_id: &str,
    republish: &RepublishFn,
) -> (usize, usize) {
    let owned = collect_owned_records(store, local_peer_id);
    let mut announced = 0;
    let mut failed = 0;

    for (cid, labels) in owned {
        match republish(cid.clone(), labels).await {
            Ok(()) => announced += 1,
            Err(e) => {
                warn!(cid = %cid, error = %e, "failed to republish record");
                failed += 1;
            }
        }
    }

    (announced, failed)
}

/// Run the periodic republish loop until the core stops.
pub(crate) async fn run_republish_loop(
    store: Arc<dyn Datastore>,
    local_peer_id: String,
    republish: RepublishFn,
    running: Arc<RwLock<bool>>,
    interval: Duration,
) {
    info!(interval_secs = interval.as_secs(), "republish loop started");

    loop {
        if !*running.read().await {
            break;
        }

        tokio::time::sleep(interval).await;

        // Skip if stopped during sleep
        if !*running.read().await {
            break;
        }

        let (announced, failed) =
            republish_owned_records(store.as_ref(), &local_peer_id, &republish).await;

        if announced > 0 || failed > 0 {
            info!(announced = announced, failed = failed, "republished owned records");
        } else {
            trace!("republish: no owned records");
        }
    }

    info!("republish loop stopped");
}
