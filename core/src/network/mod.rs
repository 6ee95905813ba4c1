//! Overlay-facing layer
//!
//! The host overlay (peer identity, DHT primitives, gossip topic
//! machinery, record retrieval) is consumed through the capability
//! traits in `overlay`; this layer wraps them into the two announce
//! paths of the hybrid discovery protocol:
//!
//! - `gossip`: label announcements on a fixed broadcast topic
//! - `provider`: DHT content-provider announcements and notifications

pub mod gossip;
pub mod overlay;
pub mod provider;
