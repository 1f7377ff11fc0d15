//! In-memory document store.

use crate::error::{CouchError, CouchResult};
use crate::store::DocumentStore;
use couchkit_protocol::{BulkItemResult, Document, DocumentResponse};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};

/// A call observed by a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    /// `fetch_range(start, end, ..)`.
    FetchRange {
        /// Range start.
        start: String,
        /// Range end.
        end: String,
    },
    /// `fetch(id)`.
    Fetch {
        /// Document ID.
        id: String,
    },
    /// `current_revision(id)`.
    Revision {
        /// Document ID.
        id: String,
    },
    /// `put(doc)`.
    Put {
        /// Document ID.
        id: String,
    },
    /// `delete(id, rev)`.
    Delete {
        /// Document ID.
        id: String,
    },
    /// `bulk_write(docs)`.
    BulkWrite {
        /// IDs in request order.
        ids: Vec<String>,
    },
}

/// A document store that keeps everything in memory.
///
/// Revision checks behave like the HTTP store: a write must carry the
/// current revision, and a missing document is reported as not found.
/// Every call through [`DocumentStore`] is recorded so tests can assert on
/// the order of operations, and individual IDs can be made to fail.
pub struct MemoryStore {
    docs: RwLock<BTreeMap<String, Document>>,
    sequence: AtomicU64,
    log: RwLock<Vec<StoreOp>>,
    failing: RwLock<HashSet<String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(BTreeMap::new()),
            sequence: AtomicU64::new(0),
            log: RwLock::new(Vec::new()),
            failing: RwLock::new(HashSet::new()),
        }
    }

    /// Stores a document directly, bypassing revision checks and the call log.
    ///
    /// Returns the revision assigned to it.
    pub fn insert(&self, mut doc: Document) -> String {
        let mut docs = self.docs.write();
        let current = docs.get(&doc.id).and_then(|d| d.rev.clone());
        let rev = self.next_rev(current.as_deref());
        doc.rev = Some(rev.clone());
        docs.insert(doc.id.clone(), doc);
        rev
    }

    /// Removes a document directly, bypassing the call log.
    pub fn remove(&self, id: &str) -> Option<Document> {
        self.docs.write().remove(id)
    }

    /// Returns a stored document.
    pub fn get(&self, id: &str) -> Option<Document> {
        self.docs.read().get(id).cloned()
    }

    /// Returns all stored IDs in order.
    pub fn ids(&self) -> Vec<String> {
        self.docs.read().keys().cloned().collect()
    }

    /// Returns the number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    /// Returns true if the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }

    /// Makes every call touching `id` fail with a server error.
    ///
    /// Range reads fail when `id` is the start of the range.
    pub fn fail_on(&self, id: impl Into<String>) {
        self.failing.write().insert(id.into());
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.failing.write().clear();
    }

    /// Returns the recorded calls.
    pub fn operations(&self) -> Vec<StoreOp> {
        self.log.read().clone()
    }

    /// Clears the recorded calls.
    pub fn clear_operations(&self) {
        self.log.write().clear();
    }

    fn record(&self, op: StoreOp) {
        self.log.write().push(op);
    }

    fn check_failure(&self, method: &str, id: &str) -> CouchResult<()> {
        if self.failing.read().contains(id) {
            return Err(CouchError::from_status(
                method,
                &memory_url(id),
                500,
                "internal_server_error",
                "injected failure",
            ));
        }
        Ok(())
    }

    fn next_rev(&self, current: Option<&str>) -> String {
        let generation = current
            .and_then(|rev| rev.split_once('-'))
            .and_then(|(n, _)| n.parse::<u64>().ok())
            .unwrap_or(0);
        let token = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{:08x}", generation + 1, token)
    }

    /// Applies a write under an already held lock.
    fn write_locked(
        &self,
        docs: &mut BTreeMap<String, Document>,
        doc: &Document,
    ) -> Result<String, &'static str> {
        let current = docs.get(&doc.id).and_then(|d| d.rev.clone());
        if current.as_deref() != doc.rev() {
            return Err("Document update conflict.");
        }
        let rev = self.next_rev(current.as_deref());
        let mut stored = doc.clone();
        stored.rev = Some(rev.clone());
        docs.insert(stored.id.clone(), stored);
        Ok(rev)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn memory_url(id: &str) -> String {
    format!("memory:///{id}")
}

fn not_found(method: &str, id: &str) -> CouchError {
    CouchError::from_status(method, &memory_url(id), 404, "not_found", "missing")
}

impl DocumentStore for MemoryStore {
    fn fetch_range(&self, start: &str, end: &str, include_docs: bool) -> CouchResult<Vec<Document>> {
        self.record(StoreOp::FetchRange {
            start: start.to_string(),
            end: end.to_string(),
        });
        self.check_failure("GET", start)?;
        if start > end {
            return Ok(Vec::new());
        }

        let docs = self.docs.read();
        Ok(docs
            .range::<str, _>((Bound::Included(start), Bound::Included(end)))
            .map(|(id, doc)| {
                if include_docs {
                    doc.clone()
                } else {
                    Document {
                        id: id.clone(),
                        rev: doc.rev.clone(),
                        ..Document::default()
                    }
                }
            })
            .collect())
    }

    fn fetch(&self, id: &str) -> CouchResult<Document> {
        self.record(StoreOp::Fetch { id: id.to_string() });
        self.check_failure("GET", id)?;
        self.get(id).ok_or_else(|| not_found("GET", id))
    }

    fn current_revision(&self, id: &str) -> CouchResult<String> {
        self.record(StoreOp::Revision { id: id.to_string() });
        self.check_failure("HEAD", id)?;
        self.docs
            .read()
            .get(id)
            .and_then(|d| d.rev.clone())
            .ok_or_else(|| not_found("HEAD", id))
    }

    fn put(&self, doc: &Document) -> CouchResult<DocumentResponse> {
        self.record(StoreOp::Put { id: doc.id.clone() });
        self.check_failure("PUT", &doc.id)?;
        if doc.id.is_empty() {
            return Err(CouchError::InvalidArgument("document has no id".into()));
        }

        let mut docs = self.docs.write();
        let rev = self.write_locked(&mut docs, doc).map_err(|reason| {
            CouchError::from_status("PUT", &memory_url(&doc.id), 409, "conflict", reason)
        })?;
        Ok(DocumentResponse::success(doc.id.clone(), rev))
    }

    fn delete(&self, id: &str, rev: &str) -> CouchResult<DocumentResponse> {
        self.record(StoreOp::Delete { id: id.to_string() });
        self.check_failure("DELETE", id)?;

        let mut docs = self.docs.write();
        let current = docs
            .get(id)
            .and_then(|d| d.rev.clone())
            .ok_or_else(|| not_found("DELETE", id))?;
        if current != rev {
            return Err(CouchError::from_status(
                "DELETE",
                &memory_url(id),
                409,
                "conflict",
                "Document update conflict.",
            ));
        }
        docs.remove(id);
        Ok(DocumentResponse::success(id, self.next_rev(Some(&current))))
    }

    fn bulk_write(&self, docs: &[Document]) -> CouchResult<Vec<BulkItemResult>> {
        self.record(StoreOp::BulkWrite {
            ids: docs.iter().map(|d| d.id.clone()).collect(),
        });

        let failing = self.failing.read().clone();
        let mut stored = self.docs.write();
        Ok(docs
            .iter()
            .map(|doc| {
                if failing.contains(&doc.id) {
                    return BulkItemResult::failure(&doc.id, "internal_server_error", "injected failure");
                }
                match self.write_locked(&mut stored, doc) {
                    Ok(rev) => BulkItemResult::success(&doc.id, rev),
                    Err(_) => BulkItemResult::conflict(&doc.id),
                }
            })
            .collect())
    }
}
