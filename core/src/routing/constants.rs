//! Protocol constants
//!
//! Wire-level parameters shared by every node on the network. These are
//! intentionally NOT configurable: peers that disagree on the topic name
//! or message limits cannot interoperate. Operator-tunable knobs live in
//! `RoutingConfig` instead.

use std::time::Duration;

/// Gossip topic carrying label announcements.
pub const TOPIC_LABELS: &str = "/beacon/labels/v1";

/// Maximum encoded size of a label announcement, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024;

/// Maximum number of labels in one announcement.
pub const MAX_LABELS_PER_ANNOUNCEMENT: usize = 64;

/// DHT protocol prefix for this network.
pub const PROTOCOL_PREFIX: &str = "/beacon";

/// Rendezvous string for overlay auto-discovery.
pub const PROTOCOL_RENDEZVOUS: &str = "beacon/connect";

/// TTL for DHT records; provider records expire after this and must be
/// republished.
pub const RECORD_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How often locally owned records are re-announced (DHT + gossip).
pub const REPUBLISH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// How often the remote-label cleanup sweep runs.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Remote entries unseen for longer than this are evicted.
pub const REMOTE_TTL: Duration = Duration::from_secs(3 * 60 * 60);

/// Capacity of the provider-notification channel. The DHT side blocks
/// when it fills; notifications are never dropped by this core.
pub const NOTIFICATION_CHANNEL_SIZE: usize = 1000;

/// Minimum match score applied when a search request asks for less.
pub const DEFAULT_MIN_MATCH_SCORE: u32 = 1;

/// Address component naming a peer's directory API endpoint.
pub const DIRECTORY_API_PROTOCOL: &str = "dir";

/// Key prefix for stored peer address records.
pub const PEER_ADDRS_PREFIX: &str = "peer_addrs/";
