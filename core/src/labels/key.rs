//! Enhanced label key codec
//!
//! Cached labels are indexed under composite keys of the form
//! `/{namespace}/{label-tail}/{cid}/{peer}`, e.g.
//! `/skills/AI/ML/bafy.../12D3...`. The key alone identifies the
//! (label, cid, peer) triple; values carry timing metadata only.
//!
//! CID and PeerID are raw path segments, so neither may contain `/`.
//! Publish-time CID validation enforces this on the local side.

use super::{Label, Namespace};

/// Error parsing an enhanced label key.
#[derive(Debug)]
pub enum LabelKeyError {
    /// The first path segment is not a known namespace
    UnknownNamespace(String),
    /// The key cannot be partitioned into `/{ns}/{tail}/{cid}/{peer}`
    Malformed(String),
}

impl std::fmt::Display for LabelKeyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelKeyError::UnknownNamespace(ns) => write!(f, "unknown namespace: {}", ns),
            LabelKeyError::Malformed(key) => write!(f, "malformed enhanced label key: {}", key),
        }
    }
}

impl std::error::Error for LabelKeyError {}

/// The components of a parsed enhanced label key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLabelKey {
    pub namespace: Namespace,
    pub label: Label,
    pub cid: String,
    pub peer_id: String,
}

/// Compose the canonical enhanced key for a (label, cid, peer) triple.
///
/// Never call with empty components; the result would not parse back.
pub fn build_enhanced_label_key(label: &Label, cid: &str, peer_id: &str) -> String {
    format!("{}/{}/{}", label.as_str(), cid, peer_id)
}

/// Split an enhanced key back into its components.
///
/// Fails for keys that do not start with a known namespace or whose tail
/// cannot be cleanly partitioned into `.../cid/peer` with a non-empty
/// label path in between.
pub fn parse_enhanced_label_key(key: &str) -> Result<ParsedLabelKey, LabelKeyError> {
    let trimmed = key.strip_prefix('/').ok_or_else(|| LabelKeyError::Malformed(key.to_string()))?;

    let segments: Vec<&str> = trimmed.split('/').collect();
    // namespace + at least one label segment + cid + peer
    if segments.len() < 4 {
        return Err(LabelKeyError::Malformed(key.to_string()));
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(LabelKeyError::Malformed(key.to_string()));
    }

    let namespace = Namespace::parse(segments[0])
        .ok_or_else(|| LabelKeyError::UnknownNamespace(segments[0].to_string()))?;

    let peer_id = segments[segments.len() - 1].to_string();
    let cid = segments[segments.len() - 2].to_string();
    let label = Label::new(format!("/{}", segments[..segments.len() - 2].join("/")));

    Ok(ParsedLabelKey {
        namespace,
        label,
        cid,
        peer_id,
    })
}
