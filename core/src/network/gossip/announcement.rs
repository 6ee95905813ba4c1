//! Label announcement wire format
//!
//! The gossip message advertising that a peer holds a record with a given
//! label set. JSON on the wire with exactly the fields `cid`, `peer_id`,
//! `labels`, `timestamp` (RFC-3339 with timezone). Receivers ignore
//! unknown fields but this node never produces any.
//!
//! Example:
//!
//! ```json
//! {
//!   "cid": "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi",
//!   "peer_id": "12D3KooWD3bfmNbuuuT5Zch8fj9Cg9dQR2FpGm7JzCfCzPWZnxLn",
//!   "labels": ["/skills/AI/ML", "/domains/research"],
//!   "timestamp": "2025-10-01T10:00:00Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::routing::constants::{MAX_LABELS_PER_ANNOUNCEMENT, MAX_MESSAGE_SIZE};

/// Error validating or (de)serializing a label announcement.
#[derive(Debug)]
pub enum AnnouncementError {
    /// Missing CID
    MissingCid,
    /// Missing peer ID
    MissingPeerId,
    /// No labels provided
    NoLabels,
    /// More than MAX_LABELS_PER_ANNOUNCEMENT labels
    TooManyLabels(usize),
    /// Missing or zero timestamp
    MissingTimestamp,
    /// Encoded size exceeds MAX_MESSAGE_SIZE
    TooLarge(usize),
    /// JSON (de)serialization failed
    Encoding(String),
}

impl std::fmt::Display for AnnouncementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnouncementError::MissingCid => write!(f, "missing cid"),
            AnnouncementError::MissingPeerId => write!(f, "missing peer_id"),
            AnnouncementError::NoLabels => write!(f, "no labels provided"),
            AnnouncementError::TooManyLabels(n) => {
                write!(f, "too many labels: {} > {}", n, MAX_LABELS_PER_ANNOUNCEMENT)
            }
            AnnouncementError::MissingTimestamp => write!(f, "missing timestamp"),
            AnnouncementError::TooLarge(n) => {
                write!(f, "announcement exceeds maximum size: {} > {}", n, MAX_MESSAGE_SIZE)
            }
            AnnouncementError::Encoding(e) => write!(f, "encoding error: {}", e),
        }
    }
}

impl std::error::Error for AnnouncementError {}

/// A label announcement as carried on the gossip topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelAnnouncement {
    /// Content identifier of the announced record.
    pub cid: String,

    /// Overlay identity of the node that holds the record.
    pub peer_id: String,

    /// Label paths attached to the record, e.g. `/skills/AI/ML`.
    pub labels: Vec<String>,

    /// The announcer's clock at publish time. Advisory only.
    pub timestamp: DateTime<Utc>,
}

impl LabelAnnouncement {
    /// Check that the announcement is well-formed and safe to process.
    pub fn validate(&self) -> Result<(), AnnouncementError> {
        if self.cid.is_empty() {
            return Err(AnnouncementError::MissingCid);
        }
        if self.peer_id.is_empty() {
            return Err(AnnouncementError::MissingPeerId);
        }
        if self.labels.is_empty() {
            return Err(AnnouncementError::NoLabels);
        }
        if self.labels.len() > MAX_LABELS_PER_ANNOUNCEMENT {
            return Err(AnnouncementError::TooManyLabels(self.labels.len()));
        }
        if self.timestamp == DateTime::<Utc>::UNIX_EPOCH {
            return Err(AnnouncementError::MissingTimestamp);
        }
        Ok(())
    }

    /// Serialize for transmission, enforcing the size cap.
    pub fn encode(&self) -> Result<Vec<u8>, AnnouncementError> {
        let data = serde_json::to_vec(self).map_err(|e| AnnouncementError::Encoding(e.to_string()))?;
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(AnnouncementError::TooLarge(data.len()));
        }
        Ok(data)
    }

    /// Deserialize and validate a received announcement.
    ///
    /// The size check runs before parsing to bound work on hostile input.
    pub fn decode(data: &[u8]) -> Result<Self, AnnouncementError> {
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(AnnouncementError::TooLarge(data.len()));
        }

        let announcement: LabelAnnouncement =
            serde_json::from_slice(data).map_err(|e| AnnouncementError::Encoding(e.to_string()))?;

        announcement.validate()?;
        Ok(announcement)
    }
}
