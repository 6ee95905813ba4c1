//! Routing errors

use crate::data::StoreError;

/// Errors surfaced by the routing core's public operations.
#[derive(Debug)]
pub enum RoutingError {
    /// Failed to start the routing core
    StartFailed(String),
    /// Datastore error
    Store(String),
    /// Overlay/network error (DHT provide, pull)
    Network(String),
    /// Gossip publish or subscription error
    Gossip(String),
    /// The CID supplied at publish time is not valid
    InvalidCid(String),
    /// Invalid input provided
    InvalidInput(String),
    /// The routing core has been stopped
    NotRunning,
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::StartFailed(e) => write!(f, "failed to start routing: {}", e),
            RoutingError::Store(e) => write!(f, "store error: {}", e),
            RoutingError::Network(e) => write!(f, "network error: {}", e),
            RoutingError::Gossip(e) => write!(f, "gossip error: {}", e),
            RoutingError::InvalidCid(e) => write!(f, "invalid cid: {}", e),
            RoutingError::InvalidInput(e) => write!(f, "invalid input: {}", e),
            RoutingError::NotRunning => write!(f, "routing is not running"),
        }
    }
}

impl std::error::Error for RoutingError {}

impl From<StoreError> for RoutingError {
    fn from(e: StoreError) -> Self {
        RoutingError::Store(e.to_string())
    }
}

/// Check a CID string at publish time.
///
/// The CID is otherwise opaque, but it becomes a raw path segment of the
/// enhanced key, so it must be non-empty and free of `/` and whitespace.
pub fn validate_cid(cid: &str) -> Result<(), RoutingError> {
    if cid.is_empty() {
        return Err(RoutingError::InvalidCid("empty".to_string()));
    }
    if cid
        .chars()
        .any(|c| c == '/' || c.is_whitespace() || !c.is_ascii_graphic())
    {
        return Err(RoutingError::InvalidCid(cid.to_string()));
    }
    Ok(())
}
