//! Database handle.

use crate::bulk::{self, BulkReport};
use crate::error::CouchResult;
use crate::seed::{ReservedNames, SeedReport, Seeder, UnderscorePrefix};
use crate::store::DocumentStore;
use couchkit_protocol::{BulkItemResult, DesignDocument, Difference, Document, DocumentResponse};
use std::sync::Arc;

/// A single database on top of a [`DocumentStore`].
///
/// The handle holds no state besides the store and the reserved-name rule
/// used when seeding; every call goes straight to the store.
pub struct Database<S: DocumentStore> {
    store: S,
    reserved: Arc<dyn ReservedNames>,
}

impl<S: DocumentStore> Database<S> {
    /// Creates a database handle that protects `_`-prefixed design documents.
    pub fn new(store: S) -> Self {
        Self {
            store,
            reserved: Arc::new(UnderscorePrefix),
        }
    }

    /// Replaces the rule deciding which design documents are never deleted.
    pub fn with_reserved(mut self, reserved: impl ReservedNames + 'static) -> Self {
        self.reserved = Arc::new(reserved);
        self
    }

    /// Returns the underlying store.
    pub fn inner(&self) -> &S {
        &self.store
    }

    fn seeder(&self) -> Seeder<'_, S> {
        Seeder::new(&self.store).with_reserved(self.reserved.as_ref())
    }

    /// Returns every design document in the database.
    pub fn all_design_docs(&self) -> CouchResult<Vec<DesignDocument>> {
        self.seeder().observed()
    }

    /// Fetches a document.
    pub fn get(&self, id: &str) -> CouchResult<Document> {
        self.store.fetch(id)
    }

    /// Writes a document as is; `doc.rev` must be current for updates.
    pub fn put(&self, doc: &Document) -> CouchResult<DocumentResponse> {
        self.store.put(doc)
    }

    /// Deletes a document at the given revision.
    pub fn delete(&self, id: &str, rev: &str) -> CouchResult<DocumentResponse> {
        self.store.delete(id, rev)
    }

    /// Writes documents in one bulk call without conflict handling.
    pub fn bulk(&self, docs: &[Document]) -> CouchResult<Vec<BulkItemResult>> {
        self.store.bulk_write(docs)
    }

    /// Creates or overwrites a single document.
    pub fn store(&self, doc: Document) -> CouchResult<DocumentResponse> {
        bulk::store(&self.store, doc)
    }

    /// Writes documents in bulk, retrying conflicts once.
    pub fn store_many(&self, docs: Vec<Document>) -> CouchResult<BulkReport> {
        bulk::store_many(&self.store, docs)
    }

    /// Computes what [`Database::seed`] would change, without writing.
    pub fn plan_seed(&self, desired: &[DesignDocument]) -> CouchResult<Difference> {
        self.seeder().plan(desired)
    }

    /// Makes the database's design documents match `desired`.
    pub fn seed(&self, desired: &[DesignDocument]) -> CouchResult<SeedReport> {
        self.seeder().seed(desired)
    }
}
