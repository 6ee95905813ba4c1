//! Beacon Core
//!
//! Remote routing core for the Beacon record directory: makes records
//! stored on one node discoverable across a peer-to-peer overlay and
//! answers multi-label searches against records held by remote peers.
//!
//! Discovery is hybrid. Every publish announces the record's CID on the
//! DHT and broadcasts its labels over a gossip topic; remote nodes
//! reconcile whichever path arrives first into a local label index and
//! answer searches from that index alone, without pulling record bodies.
//!
//! # Module Structure
//!
//! - `routing/`: Public interface (Routing, config, constants, types, search)
//! - `labels/`: Label namespaces, enhanced-key codec, metadata
//! - `network/`: Overlay capability traits, gossip announcer, provider announcer
//! - `handlers/`: Reconciler for gossip announcements and provider notifications
//! - `tasks/`: Background automation (republish, cleanup)
//! - `data/`: Keyed byte-store contract, SQLite and in-memory backends
//! - `testing/`: In-memory overlay doubles
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use beacon_core::{Overlay, Record, RecordRef, Routing, RoutingConfig, SqliteDatastore};
//!
//! // The host supplies overlay capabilities (DHT, gossip topic, record store)
//! let store = Arc::new(SqliteDatastore::open("labels.db")?);
//! let routing = Routing::start(RoutingConfig::default(), overlay, store).await?;
//!
//! // Announce a stored record
//! routing.publish(&record_ref, &record).await?;
//!
//! // Search records cached from remote peers
//! let mut results = routing.search(request).await?;
//! while let Some(hit) = results.recv().await {
//!     println!("{} @ {} (score {})", hit.record_ref.cid, hit.peer.id, hit.match_score);
//! }
//! ```

// Public interface
pub mod routing;

// Internal modules
pub(crate) mod handlers;
pub(crate) mod tasks;

// Infrastructure modules (pub for flexibility)
pub mod data;
pub mod labels;
pub mod network;
pub mod testing;

// Re-export main API types for convenience
pub use data::{Datastore, MemoryDatastore, SqliteDatastore, StoreError};
pub use labels::{Label, LabelMetadata, Namespace};
pub use network::gossip::{GossipError, LabelAnnouncement};
pub use network::overlay::{
    ContentRouting, GossipMessage, GossipSubscription, GossipTopic, OverlayError, RecordStore,
};
pub use network::provider::{ProviderNotification, ProviderNotifier};
pub use routing::{
    Overlay, Peer, QueryKind, Record, RecordQuery, RecordRef, Routing, RoutingConfig, RoutingError,
    SearchRequest, SearchResponse,
};
