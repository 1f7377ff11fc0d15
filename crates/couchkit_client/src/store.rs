//! Document store abstraction.

use crate::error::CouchResult;
use couchkit_protocol::{BulkItemResult, Document, DocumentResponse};

/// A document store holds versioned documents behind optimistic concurrency.
///
/// This trait is the only thing the seeding and bulk-write logic know about
/// the database, allowing different implementations (HTTP, in-memory, etc.).
///
/// # Invariants
///
/// - Every successful write assigns a new revision token
/// - `put` and `delete` fail with a conflict when the supplied revision is
///   not the current one
/// - `bulk_write` reports success or failure per document and fails as a
///   whole only on transport errors
/// - Calls are independent; implementations provide no cross-call locking
pub trait DocumentStore: Send + Sync {
    /// Returns documents whose IDs fall in `start..=end`, in ID order.
    ///
    /// With `include_docs` unset, only `_id` and `_rev` are populated.
    fn fetch_range(&self, start: &str, end: &str, include_docs: bool) -> CouchResult<Vec<Document>>;

    /// Fetches a document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CouchError::NotFound`] if the document does not exist.
    fn fetch(&self, id: &str) -> CouchResult<Document>;

    /// Returns the current revision of a document without fetching its body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CouchError::NotFound`] if the document does not exist.
    fn current_revision(&self, id: &str) -> CouchResult<String>;

    /// Creates or updates a document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CouchError::Conflict`] if `doc.rev` is not the
    /// current revision (or is missing for an existing document).
    fn put(&self, doc: &Document) -> CouchResult<DocumentResponse>;

    /// Deletes a document at the given revision.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CouchError::Conflict`] on a stale revision and
    /// [`crate::CouchError::NotFound`] if the document does not exist.
    fn delete(&self, id: &str, rev: &str) -> CouchResult<DocumentResponse>;

    /// Writes many documents in one request.
    ///
    /// Returns one entry per input document, in input order.
    fn bulk_write(&self, docs: &[Document]) -> CouchResult<Vec<BulkItemResult>>;
}
