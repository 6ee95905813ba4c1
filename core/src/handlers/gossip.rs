//! Gossip announcement handler
//!
//! Primary label discovery path: converts a received announcement into
//! enhanced-key entries without ever touching the record body.

use chrono::Utc;
use tracing::{info, warn};

use crate::data::Datastore;
use crate::labels::{build_enhanced_label_key, Label, LabelMetadata};
use crate::network::gossip::LabelAnnouncement;

/// Cache the labels carried by a gossip announcement.
///
/// Writes are unconditional: a later announcement overwrites the
/// metadata of an earlier pull for the same (label, cid, peer), which is
/// fine — both carry the same triple. Per-label failures are logged and
/// the loop continues.
pub(crate) fn cache_label_announcement(
    store: &dyn Datastore,
    local_peer_id: &str,
    announcement: &LabelAnnouncement,
) {
    // Our own announcements were cached during Publish
    if announcement.peer_id == local_peer_id {
        return;
    }

    let now = Utc::now();
    let mut cached = 0;

    for label_str in &announcement.labels {
        let label = Label::new(label_str.clone());
        let key = build_enhanced_label_key(&label, &announcement.cid, &announcement.peer_id);

        let metadata = LabelMetadata {
            timestamp: announcement.timestamp,
            last_seen: now,
        };

        let encoded = match metadata.encode() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode label metadata");
                continue;
            }
        };

        match store.put(&key, &encoded) {
            Ok(()) => cached += 1,
            Err(e) => warn!(key = %key, error = %e, "failed to cache gossiped label"),
        }
    }

    info!(
        cid = %announcement.cid,
        peer = %announcement.peer_id,
        total = announcement.labels.len(),
        cached = cached,
        "cached labels from gossip announcement"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryDatastore;
    use chrono::{DateTime, TimeZone};

    fn announcement(cid: &str, peer: &str, labels: &[&str]) -> LabelAnnouncement {
        LabelAnnouncement {
            cid: cid.to_string(),
            peer_id: peer.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            timestamp: Utc.with_ymd_and_hms(2025, 10, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_caches_one_entry_per_label() {
        let store = MemoryDatastore::new();
        let ann = announcement("c1", "p1", &["/skills/AI/ML", "/domains/research"]);

        cache_label_announcement(&store, "local-peer", &ann);

        assert!(store.get("/skills/AI/ML/c1/p1").unwrap().is_some());
        assert!(store.get("/domains/research/c1/p1").unwrap().is_some());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_metadata_keeps_announcer_timestamp() {
        let store = MemoryDatastore::new();
        let ann = announcement("c1", "p1", &["/skills/AI/ML"]);

        cache_label_announcement(&store, "local-peer", &ann);

        let meta = LabelMetadata::decode(&store.get("/skills/AI/ML/c1/p1").unwrap().unwrap()).unwrap();
        assert_eq!(meta.timestamp, ann.timestamp);
        assert!(meta.last_seen > ann.timestamp);
    }

    #[test]
    fn test_self_announcements_ignored() {
        let store = MemoryDatastore::new();
        let ann = announcement("c1", "local-peer", &["/skills/AI/ML"]);

        cache_label_announcement(&store, "local-peer", &ann);
        assert!(store.is_empty());
    }

    #[test]
    fn test_repeat_announcement_is_idempotent_on_keys() {
        let store = MemoryDatastore::new();
        let ann = announcement("c1", "p1", &["/skills/AI/ML", "/domains/research"]);

        cache_label_announcement(&store, "local-peer", &ann);
        let first: DateTime<Utc> =
            LabelMetadata::decode(&store.get("/skills/AI/ML/c1/p1").unwrap().unwrap())
                .unwrap()
                .last_seen;

        cache_label_announcement(&store, "local-peer", &ann);
        let second =
            LabelMetadata::decode(&store.get("/skills/AI/ML/c1/p1").unwrap().unwrap())
                .unwrap()
                .last_seen;

        // Same key set, only last_seen advances
        assert_eq!(store.len(), 2);
        assert!(second >= first);
    }
}
