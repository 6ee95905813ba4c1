//! Reconciler
//!
//! Resolves the race between the two announcement paths into one
//! consistent local index:
//!
//! - `gossip`: caches labels straight from received announcements
//! - `notify`: handles DHT provider notifications — fast path refreshes
//!   timestamps when gossip already cached the labels, slow path pulls
//!   the record and extracts them
//!
//! Shared helpers for locating and refreshing cached entries live here.

pub(crate) mod gossip;
pub(crate) mod notify;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::data::{scan_all_namespaces, Datastore};
use crate::labels::{parse_enhanced_label_key, LabelMetadata};

pub(crate) use gossip::cache_label_announcement;
pub(crate) use notify::run_notify_loop;

/// Refresh `last_seen` on a single cached entry: decode, overwrite,
/// re-encode, put. Decoding failure returns without writing.
pub(crate) fn update_label_last_seen(
    store: &dyn Datastore,
    key: &str,
    value: &[u8],
    now: DateTime<Utc>,
) -> Result<(), String> {
    let mut metadata =
        LabelMetadata::decode(value).map_err(|e| format!("failed to decode label metadata: {}", e))?;

    metadata.last_seen = now;

    let encoded = metadata
        .encode()
        .map_err(|e| format!("failed to encode label metadata: {}", e))?;

    store
        .put(key, &encoded)
        .map_err(|e| format!("failed to save label metadata: {}", e))
}

/// Whether any enhanced key for `(cid, peer)` is already cached.
pub(crate) fn has_remote_record_cached(store: &dyn Datastore, cid: &str, peer_id: &str) -> bool {
    scan_all_namespaces(store).iter().any(|entry| {
        parse_enhanced_label_key(&entry.key)
            .map(|parsed| parsed.cid == cid && parsed.peer_id == peer_id)
            .unwrap_or(false)
    })
}

/// Refresh `last_seen` on every cached entry for `(cid, peer)`.
/// Used on reannouncements, where the labels are already cached.
pub(crate) fn update_remote_record_last_seen(
    store: &dyn Datastore,
    cid: &str,
    peer_id: &str,
    now: DateTime<Utc>,
) {
    let mut updated = 0;

    for entry in scan_all_namespaces(store) {
        let parsed = match parse_enhanced_label_key(&entry.key) {
            Ok(parsed) => parsed,
            Err(_) => continue,
        };

        if parsed.cid != cid || parsed.peer_id != peer_id {
            continue;
        }

        match update_label_last_seen(store, &entry.key, &entry.value, now) {
            Ok(()) => updated += 1,
            Err(e) => warn!(key = %entry.key, error = %e, "failed to update last_seen"),
        }
    }

    debug!(cid = %cid, peer = %peer_id, updated = updated, "refreshed last_seen for reannounced record");
}
