//! Public routing interface
//!
//! The `Routing` struct is the entry point: it wires the overlay
//! capabilities, the label index, the reconciler, and the maintenance
//! loops together. Implementation is split across:
//! - `core`: struct, start/stop, publish
//! - `search`: the remote search engine
//! - `config`, `constants`, `error`, `types`: the supporting surface

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub(crate) mod search;
pub mod types;

pub use self::config::RoutingConfig;
pub use self::core::{Overlay, Routing};
pub use self::error::RoutingError;
pub use self::types::{
    Peer, QueryKind, Record, RecordQuery, RecordRef, SearchRequest, SearchResponse,
};
