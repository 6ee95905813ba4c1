//! Routing configuration
//!
//! Operator-tunable knobs only. Protocol-level parameters (topic name,
//! message limits, TTLs) are fixed constants in `constants.rs` so that
//! all peers on a network interoperate.

use std::path::PathBuf;

/// Configuration for the routing core.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Path to the label index database.
    /// If None, an in-memory store is expected from the embedder.
    pub db_path: Option<PathBuf>,

    /// Bootstrap peers for the overlay (peer IDs or dialable addresses,
    /// interpreted by the host).
    pub bootstrap_peers: Vec<String>,

    /// Overlay listen address (interpreted by the host).
    pub listen_address: Option<String>,

    /// Path to the node's identity key.
    pub key_path: Option<PathBuf>,

    /// DHT routing table refresh interval (seconds).
    /// Default: 120
    pub refresh_interval_secs: u64,

    /// Whether gossip label announcements are enabled.
    /// When false the core runs on DHT + pull fallback only.
    /// Default: true
    pub gossip_enabled: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            bootstrap_peers: Vec::new(),
            listen_address: None,
            key_path: None,
            refresh_interval_secs: 120,
            gossip_enabled: true,
        }
    }
}

impl RoutingConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the database path
    pub fn with_db_path(mut self, path: PathBuf) -> Self {
        self.db_path = Some(path);
        self
    }

    /// Add a bootstrap peer
    pub fn with_bootstrap_peer(mut self, peer: String) -> Self {
        self.bootstrap_peers.push(peer);
        self
    }

    /// Set bootstrap peers (replaces existing)
    pub fn with_bootstrap_peers(mut self, peers: Vec<String>) -> Self {
        self.bootstrap_peers = peers;
        self
    }

    /// Set the overlay listen address
    pub fn with_listen_address(mut self, addr: String) -> Self {
        self.listen_address = Some(addr);
        self
    }

    /// Set the identity key path
    pub fn with_key_path(mut self, path: PathBuf) -> Self {
        self.key_path = Some(path);
        self
    }

    /// Set the DHT refresh interval
    pub fn with_refresh_interval(mut self, secs: u64) -> Self {
        self.refresh_interval_secs = secs;
        self
    }

    /// Disable gossip announcements (DHT + pull fallback only)
    pub fn without_gossip(mut self) -> Self {
        self.gossip_enabled = false;
        self
    }

    /// Configuration for testing (no bootstrap, fast refresh)
    pub fn for_testing() -> Self {
        Self {
            db_path: None,
            bootstrap_peers: vec![],
            listen_address: None,
            key_path: None,
            refresh_interval_secs: 5,
            gossip_enabled: true,
        }
    }
}
