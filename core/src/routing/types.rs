//! Public types for the routing API
//!
//! Wire-adjacent request/response types for publish and search, plus the
//! minimal record handle the discovery path carries around.

use serde::{Deserialize, Serialize};

use crate::labels::{Label, Namespace};

/// The minimal handle for a record: its content identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    pub cid: String,
}

impl RecordRef {
    pub fn new(cid: impl Into<String>) -> Self {
        RecordRef { cid: cid.into() }
    }
}

/// A record as seen by the discovery path: a CID plus its label set.
///
/// Record bodies are opaque to this core; storage and retrieval live
/// behind the `RecordStore` capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub cid: String,
    pub labels: Vec<Label>,
}

impl Record {
    pub fn new(cid: impl Into<String>, labels: Vec<Label>) -> Self {
        Record {
            cid: cid.into(),
            labels,
        }
    }

    /// The labels attached to this record.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }
}

/// A remote peer in search results: overlay identity plus the directory
/// API endpoints learned for it (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub id: String,
    pub addrs: Vec<String>,
}

impl Peer {
    pub fn new(id: impl Into<String>, addrs: Vec<String>) -> Self {
        Peer {
            id: id.into(),
            addrs,
        }
    }
}

/// The label namespace a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKind {
    Skill,
    Domain,
    Module,
    Locator,
}

impl QueryKind {
    /// The namespace this query kind selects labels from.
    pub fn namespace(&self) -> Namespace {
        match self {
            QueryKind::Skill => Namespace::Skills,
            QueryKind::Domain => Namespace::Domains,
            QueryKind::Module => Namespace::Modules,
            QueryKind::Locator => Namespace::Locators,
        }
    }
}

/// One query against a record's label set.
///
/// A query matches a record when the record carries the label
/// `/{namespace}/{value}` exactly; hierarchical values are compared as
/// whole tails (`AI/ML` matches `/skills/AI/ML`, not `/skills/AI`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordQuery {
    pub kind: QueryKind,
    pub value: String,
}

impl RecordQuery {
    pub fn new(kind: QueryKind, value: impl Into<String>) -> Self {
        RecordQuery {
            kind,
            value: value.into(),
        }
    }

    /// The full label path this query selects, e.g. `/skills/AI/ML`.
    pub fn label_path(&self) -> String {
        format!(
            "{}/{}",
            self.kind.namespace().prefix(),
            self.value.trim_start_matches('/')
        )
    }

    /// OR-match: true when any of `labels` equals this query's path.
    pub fn matches_labels(&self, labels: &[Label]) -> bool {
        let expected = self.label_path();
        labels.iter().any(|label| label.as_str() == expected)
    }
}

/// A multi-query search over remotely cached labels.
///
/// Queries are OR-combined: a record's score is the number of distinct
/// queries it matches, and only records with
/// `score >= min_match_score` are returned. A `limit` of 0 means
/// unlimited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub queries: Vec<RecordQuery>,
    pub limit: u32,
    pub min_match_score: u32,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub record_ref: RecordRef,
    pub peer: Peer,
    pub match_queries: Vec<RecordQuery>,
    pub match_score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_label_path() {
        let q = RecordQuery::new(QueryKind::Skill, "AI/ML");
        assert_eq!(q.label_path(), "/skills/AI/ML");

        // A leading slash in the value is tolerated
        let q = RecordQuery::new(QueryKind::Domain, "/research");
        assert_eq!(q.label_path(), "/domains/research");
    }

    #[test]
    fn test_query_matches_exact_label() {
        let labels = vec![Label::new("/skills/AI/ML"), Label::new("/domains/research")];

        assert!(RecordQuery::new(QueryKind::Skill, "AI/ML").matches_labels(&labels));
        assert!(RecordQuery::new(QueryKind::Domain, "research").matches_labels(&labels));
    }

    #[test]
    fn test_query_does_not_match_prefix() {
        let labels = vec![Label::new("/skills/AI/ML")];

        // Whole-tail equality, not hierarchy-aware matching
        assert!(!RecordQuery::new(QueryKind::Skill, "AI").matches_labels(&labels));
        assert!(!RecordQuery::new(QueryKind::Skill, "AI/ML/extra").matches_labels(&labels));
    }

    #[test]
    fn test_query_respects_namespace() {
        let labels = vec![Label::new("/skills/research")];
        assert!(!RecordQuery::new(QueryKind::Domain, "research").matches_labels(&labels));
        assert!(RecordQuery::new(QueryKind::Skill, "research").matches_labels(&labels));
    }

    #[test]
    fn test_query_structural_equality() {
        let a = RecordQuery::new(QueryKind::Skill, "AI/ML");
        let b = RecordQuery::new(QueryKind::Skill, "AI/ML");
        let c = RecordQuery::new(QueryKind::Skill, "AI");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_record_labels_accessor() {
        let record = Record::new("bafy1", vec![Label::new("/skills/AI/ML")]);
        assert_eq!(record.labels().len(), 1);
        assert_eq!(record.cid, "bafy1");
    }

    #[test]
    fn test_search_request_serde_roundtrip() {
        let req = SearchRequest {
            queries: vec![
                RecordQuery::new(QueryKind::Skill, "AI/ML"),
                RecordQuery::new(QueryKind::Domain, "research"),
            ],
            limit: 10,
            min_match_score: 2,
        };

        let json = serde_json::to_string(&req).unwrap();
        let back: SearchRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, req);
    }
}
