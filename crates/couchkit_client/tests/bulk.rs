//! Bulk write scenarios, including stores that misbehave during the retry.

use couchkit_client::{
    store, store_many, BulkItemResult, BulkOutcome, CouchError, CouchResult, Document,
    DocumentResponse, DocumentStore, MemoryStore, StoreOp,
};
use serde_json::json;
use std::collections::BTreeSet;

/// Delegates to a [`MemoryStore`], with hooks around revision lookups.
struct Flaky {
    inner: MemoryStore,
    revision_fails: bool,
    race_after_revision: bool,
}

impl Flaky {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            revision_fails: false,
            race_after_revision: false,
        }
    }
}

impl DocumentStore for Flaky {
    fn fetch_range(&self, start: &str, end: &str, include_docs: bool) -> CouchResult<Vec<Document>> {
        self.inner.fetch_range(start, end, include_docs)
    }

    fn fetch(&self, id: &str) -> CouchResult<Document> {
        self.inner.fetch(id)
    }

    fn current_revision(&self, id: &str) -> CouchResult<String> {
        if self.revision_fails {
            return Err(CouchError::transport("connection reset"));
        }
        let rev = self.inner.current_revision(id)?;
        if self.race_after_revision {
            // Another writer gets in before the retry.
            let mut doc = self.inner.get(id).unwrap_or_else(|| Document::new(id));
            doc.fields.insert("raced".into(), json!(true));
            self.inner.insert(doc);
        }
        Ok(rev)
    }

    fn put(&self, doc: &Document) -> CouchResult<DocumentResponse> {
        self.inner.put(doc)
    }

    fn delete(&self, id: &str, rev: &str) -> CouchResult<DocumentResponse> {
        self.inner.delete(id, rev)
    }

    fn bulk_write(&self, docs: &[Document]) -> CouchResult<Vec<BulkItemResult>> {
        self.inner.bulk_write(docs)
    }
}

fn ids(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn new_and_conflicted_documents_are_both_written() {
    let db = MemoryStore::new();
    db.insert(Document::new("B").with_field("score", 1));

    let report = store_many(
        &db,
        vec![
            Document::new("A").with_field("score", 10),
            Document::new("B").with_field("score", 20),
        ],
    )
    .unwrap();

    assert_eq!(report.created, ids(&["A"]));
    assert_eq!(report.updated, ids(&["B"]));
    assert_eq!(report.written(), ids(&["A", "B"]));
    assert!(matches!(report.outcomes[1], BulkOutcome::Conflict { .. }));
    assert_eq!(report.retry_outcomes.len(), 1);
    assert!(report.retry_outcomes[0].is_created());
    assert_eq!(db.get("B").unwrap().field("score"), Some(&json!(20)));
}

#[test]
fn failed_revision_lookup_drops_the_document() {
    let inner = MemoryStore::new();
    inner.insert(Document::new("b"));
    let mut flaky = Flaky::new(inner);
    flaky.revision_fails = true;

    let report = store_many(&flaky, vec![Document::new("a"), Document::new("b")]).unwrap();

    assert_eq!(report.created, ids(&["a"]));
    assert!(report.updated.is_empty());
    assert_eq!(report.dropped, vec!["b".to_string()]);
    assert!(!report.is_complete());

    let bulk_calls = flaky
        .inner
        .operations()
        .into_iter()
        .filter(|op| matches!(op, StoreOp::BulkWrite { .. }))
        .count();
    assert_eq!(bulk_calls, 1);
}

#[test]
fn second_conflict_is_reported_not_retried() {
    let inner = MemoryStore::new();
    inner.insert(Document::new("b"));
    let mut flaky = Flaky::new(inner);
    flaky.race_after_revision = true;

    let report = store_many(&flaky, vec![Document::new("b").with_field("v", 2)]).unwrap();

    assert!(report.created.is_empty());
    assert!(report.updated.is_empty());
    assert_eq!(report.conflicts_remaining, vec!["b".to_string()]);
    assert_eq!(flaky.inner.get("b").unwrap().field("raced"), Some(&json!(true)));
}

#[test]
fn duplicate_ids_resubmit_the_last_version() {
    let db = MemoryStore::new();

    let report = store_many(
        &db,
        vec![
            Document::new("dup").with_field("v", 1),
            Document::new("dup").with_field("v", 2),
        ],
    )
    .unwrap();

    assert_eq!(report.created, ids(&["dup"]));
    assert_eq!(report.updated, ids(&["dup"]));
    assert_eq!(report.written(), ids(&["dup"]));
    assert_eq!(db.get("dup").unwrap().field("v"), Some(&json!(2)));
}

#[test]
fn bulk_call_error_is_returned() {
    struct Down;
    impl DocumentStore for Down {
        fn fetch_range(&self, _: &str, _: &str, _: bool) -> CouchResult<Vec<Document>> {
            Ok(Vec::new())
        }
        fn fetch(&self, id: &str) -> CouchResult<Document> {
            Err(CouchError::transport(format!("cannot fetch {id}")))
        }
        fn current_revision(&self, id: &str) -> CouchResult<String> {
            Err(CouchError::transport(format!("cannot head {id}")))
        }
        fn put(&self, _: &Document) -> CouchResult<DocumentResponse> {
            Err(CouchError::transport("down"))
        }
        fn delete(&self, _: &str, _: &str) -> CouchResult<DocumentResponse> {
            Err(CouchError::transport("down"))
        }
        fn bulk_write(&self, _: &[Document]) -> CouchResult<Vec<BulkItemResult>> {
            Err(CouchError::transport("down"))
        }
    }

    let err = store_many(&Down, vec![Document::new("a")]).unwrap_err();
    assert!(matches!(err, CouchError::Transport { .. }));
}

#[test]
fn store_upserts_a_single_document() {
    let db = MemoryStore::new();

    let first = store(&db, Document::new("player:1").with_field("name", "ada")).unwrap();
    let second = store(&db, Document::new("player:1").with_field("name", "grace")).unwrap();

    assert!(first.rev.starts_with("1-"));
    assert!(second.rev.starts_with("2-"));
    assert_eq!(db.get("player:1").unwrap().field("name"), Some(&json!("grace")));
    assert_eq!(
        db.operations(),
        vec![
            StoreOp::Revision {
                id: "player:1".into()
            },
            StoreOp::Put {
                id: "player:1".into()
            },
            StoreOp::Revision {
                id: "player:1".into()
            },
            StoreOp::Put {
                id: "player:1".into()
            },
        ]
    );
}
