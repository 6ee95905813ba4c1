//! Namespace scanner
//!
//! Search, cleanup, and last-seen refresh all walk the same set of label
//! namespaces; centralizing the walk keeps namespace membership in one
//! place. A failure in one namespace is logged and the walk continues
//! with the others.

use tracing::warn;

use crate::labels::Namespace;

use super::Datastore;

/// One entry produced by the namespace walk.
#[derive(Debug, Clone)]
pub struct NamespaceEntry {
    pub namespace: Namespace,
    pub key: String,
    pub value: Vec<u8>,
}

/// Drain every label namespace into a flat entry list.
///
/// Entries arrive in namespace order, then key order within a namespace.
pub fn scan_all_namespaces(store: &dyn Datastore) -> Vec<NamespaceEntry> {
    let mut entries = Vec::new();

    for namespace in Namespace::ALL {
        let results = match store.query_prefix(&namespace.prefix()) {
            Ok(results) => results,
            Err(e) => {
                warn!(namespace = %namespace, error = %e, "failed to query namespace");
                continue;
            }
        };

        for (key, value) in results {
            entries.push(NamespaceEntry {
                namespace,
                key,
                value,
            });
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryDatastore;
    use crate::labels::parse_enhanced_label_key;

    #[test]
    fn test_scan_empty_store() {
        let store = MemoryDatastore::new();
        assert!(scan_all_namespaces(&store).is_empty());
    }

    #[test]
    fn test_scan_covers_all_namespaces() {
        let store = MemoryDatastore::new();
        store.put("/skills/AI/c1/p1", b"a").unwrap();
        store.put("/domains/research/c1/p1", b"b").unwrap();
        store.put("/modules/runtime/c1/p1", b"c").unwrap();
        store.put("/locators/docker/c1/p1", b"d").unwrap();

        let entries = scan_all_namespaces(&store);
        assert_eq!(entries.len(), 4);

        let namespaces: Vec<Namespace> = entries.iter().map(|e| e.namespace).collect();
        assert_eq!(namespaces, Namespace::ALL.to_vec());
    }

    #[test]
    fn test_scan_skips_foreign_keys() {
        let store = MemoryDatastore::new();
        store.put("/skills/AI/c1/p1", b"a").unwrap();
        store.put("peer_addrs/p1", b"[]").unwrap();

        let entries = scan_all_namespaces(&store);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "/skills/AI/c1/p1");
    }

    #[test]
    fn test_scan_namespace_matches_parsed_key() {
        let store = MemoryDatastore::new();
        store.put("/skills/AI/ML/c1/p1", b"a").unwrap();
        store.put("/modules/tensorflow/c2/p2", b"b").unwrap();

        for entry in scan_all_namespaces(&store) {
            let parsed = parse_enhanced_label_key(&entry.key).unwrap();
            assert_eq!(parsed.namespace, entry.namespace);
        }
    }
}
