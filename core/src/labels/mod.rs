//! Label model for the record directory
//!
//! Records carry namespaced hierarchical labels such as `/skills/AI/ML`.
//! The first path segment selects a namespace from a closed set; the rest
//! is an opaque hierarchical tail. Labels are compared by exact string
//! equality.
//!
//! This module also defines the metadata value stored per cached label
//! (`LabelMetadata`) and the enhanced-key codec (`key` submodule).

pub mod key;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use key::{build_enhanced_label_key, parse_enhanced_label_key, LabelKeyError, ParsedLabelKey};

/// The closed set of label namespaces understood by the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Skills,
    Domains,
    Modules,
    Locators,
}

impl Namespace {
    /// All namespaces, in the fixed scan order.
    pub const ALL: [Namespace; 4] = [
        Namespace::Skills,
        Namespace::Domains,
        Namespace::Modules,
        Namespace::Locators,
    ];

    /// The bare namespace name, e.g. `skills`.
    pub fn name(&self) -> &'static str {
        match self {
            Namespace::Skills => "skills",
            Namespace::Domains => "domains",
            Namespace::Modules => "modules",
            Namespace::Locators => "locators",
        }
    }

    /// The key prefix for this namespace, e.g. `/skills`.
    pub fn prefix(&self) -> String {
        format!("/{}", self.name())
    }

    /// Parse a bare namespace name.
    pub fn parse(name: &str) -> Option<Namespace> {
        match name {
            "skills" => Some(Namespace::Skills),
            "domains" => Some(Namespace::Domains),
            "modules" => Some(Namespace::Modules),
            "locators" => Some(Namespace::Locators),
            _ => None,
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A namespaced label path, e.g. `/skills/AI/ML`.
///
/// Stored with its leading slash. A label whose first segment is not a
/// known namespace is representable but will never be indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(path: impl Into<String>) -> Self {
        Label(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace of this label, if the first segment is a known one.
    pub fn namespace(&self) -> Option<Namespace> {
        let mut segments = self.0.trim_start_matches('/').split('/');
        Namespace::parse(segments.next().unwrap_or(""))
    }

    /// The path after the namespace segment, e.g. `AI/ML` for `/skills/AI/ML`.
    pub fn tail(&self) -> Option<&str> {
        let trimmed = self.0.trim_start_matches('/');
        let (first, rest) = trimmed.split_once('/')?;
        Namespace::parse(first)?;
        if rest.is_empty() {
            return None;
        }
        Some(rest)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Timing metadata stored per cached label entry.
///
/// `timestamp` is the announcer's claimed publish time (advisory only);
/// `last_seen` is this node's wall clock at the most recent observation.
/// Encoded as JSON with fixed field order so byte-equal values round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelMetadata {
    pub timestamp: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl LabelMetadata {
    /// Metadata for an entry observed right now.
    pub fn now(now: DateTime<Utc>) -> Self {
        LabelMetadata {
            timestamp: now,
            last_seen: now,
        }
    }

    /// Encode to canonical JSON.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode from JSON bytes.
    pub fn decode(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
