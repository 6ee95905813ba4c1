//! Remote search engine
//!
//! Answers multi-query OR searches entirely from cached labels: no
//! record bodies move over the network. Queries are deduplicated so a
//! client repeating a query cannot inflate a record's score; records
//! score one point per distinct matching query and are emitted when the
//! score reaches the (clamped) minimum.
//!
//! Results stream in scan order. The only ordering guarantee is that no
//! CID appears twice within one call.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::data::{scan_all_namespaces, Datastore};
use crate::labels::{parse_enhanced_label_key, Label};
use crate::routing::constants::{DIRECTORY_API_PROTOCOL, PEER_ADDRS_PREFIX};
use crate::routing::types::{Peer, RecordQuery, RecordRef, SearchResponse};

/// Collapse structurally identical queries, preserving first-seen order.
pub(crate) fn deduplicate_queries(queries: &[RecordQuery]) -> Vec<RecordQuery> {
    let mut deduplicated: Vec<RecordQuery> = Vec::with_capacity(queries.len());
    for query in queries {
        if !deduplicated.contains(query) {
            deduplicated.push(query.clone());
        }
    }
    deduplicated
}

/// Extract the directory-API endpoint from a component address string
/// like `/ip4/1.2.3.4/tcp/8999/dir/grpc.example.org:8888`: the value is
/// the segment following the `dir` component.
fn directory_api_endpoint(addr: &str) -> Option<String> {
    let mut segments = addr.split('/');
    while let Some(segment) = segments.next() {
        if segment == DIRECTORY_API_PROTOCOL {
            return segments.next().filter(|v| !v.is_empty()).map(|v| v.to_string());
        }
    }
    None
}

/// Build the peer info for a search hit from the stored address record.
/// Missing or undecodable records yield an empty address list; the peer
/// ID is still usable.
fn create_peer_info(store: &dyn Datastore, peer_id: &str) -> Peer {
    let key = format!("{}{}", PEER_ADDRS_PREFIX, peer_id);

    let raw = match store.get(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Peer::new(peer_id, vec![]),
        Err(e) => {
            warn!(peer = %peer_id, error = %e, "failed to read peer addresses");
            return Peer::new(peer_id, vec![]);
        }
    };

    let addrs: Vec<String> = match serde_json::from_slice(&raw) {
        Ok(addrs) => addrs,
        Err(e) => {
            warn!(peer = %peer_id, error = %e, "failed to decode peer addresses");
            return Peer::new(peer_id, vec![]);
        }
    };

    for addr in &addrs {
        if let Some(endpoint) = directory_api_endpoint(addr) {
            return Peer::new(peer_id, vec![endpoint]);
        }
    }

    Peer::new(peer_id, vec![])
}

/// Execute a search over the cached remote labels, streaming hits into
/// `out`. Returns when the scan is exhausted, the limit is reached, or
/// the receiver is dropped.
pub(crate) async fn search_remote_records(
    store: &dyn Datastore,
    local_peer_id: &str,
    queries: Vec<RecordQuery>,
    limit: u32,
    min_match_score: u32,
    out: mpsc::Sender<SearchResponse>,
) {
    debug!(
        queries = queries.len(),
        limit = limit,
        min_match_score = min_match_score,
        "starting remote search"
    );

    // One scan pass: group labels per (cid, peer) so scoring never
    // rescans the store per candidate
    let mut order: Vec<(String, String)> = Vec::new();
    let mut labels_by_record: HashMap<(String, String), Vec<Label>> = HashMap::new();

    for entry in scan_all_namespaces(store) {
        let parsed = match parse_enhanced_label_key(&entry.key) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(key = %entry.key, error = %e, "failed to parse enhanced label key");
                continue;
            }
        };

        // Remote records only
        if parsed.peer_id == local_peer_id {
            continue;
        }

        let record = (parsed.cid, parsed.peer_id);
        labels_by_record
            .entry(record.clone())
            .or_insert_with(|| {
                order.push(record.clone());
                Vec::new()
            })
            .push(parsed.label);
    }

    let mut emitted_cids: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut emitted = 0usize;

    for (cid, peer_id) in order {
        if limit > 0 && emitted >= limit as usize {
            break;
        }

        // A record may carry many labels and may be held by many peers;
        // each CID is emitted at most once per call
        if emitted_cids.contains(&cid) {
            continue;
        }

        let labels = &labels_by_record[&(cid.clone(), peer_id.clone())];

        let match_queries: Vec<RecordQuery> = queries
            .iter()
            .filter(|query| query.matches_labels(labels))
            .cloned()
            .collect();
        let match_score = u32::try_from(match_queries.len()).unwrap_or(u32::MAX);

        if match_score < min_match_score {
            debug!(cid = %cid, score = match_score, "record below minimum match score");
            continue;
        }

        let response = SearchResponse {
            record_ref: RecordRef::new(cid.clone()),
            peer: create_peer_info(store, &peer_id),
            match_queries,
            match_score,
        };

        if out.send(response).await.is_err() {
            debug!("search receiver dropped, aborting scan");
            return;
        }

        emitted_cids.insert(cid);
        emitted += 1;
    }

    info!(emitted = emitted, queries = queries.len(), "completed remote search");
}
