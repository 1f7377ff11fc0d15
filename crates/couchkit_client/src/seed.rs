//! Design document reconciliation.
//!
//! Seeding brings the design documents of a database in line with a desired
//! set: documents missing remotely are created, documents whose views differ
//! are updated, and documents no longer desired are deleted.
//!
//! ## Key Invariants
//!
//! - Revisions never take part in the comparison, only views do
//! - Reserved design documents (e.g. `_design/_auth`) are never deleted
//! - Deletions run first, then changes, then additions
//! - The first failing call aborts the run; earlier writes are kept, and
//!   re-running converges

use crate::error::{CouchError, CouchResult};
use crate::store::DocumentStore;
use couchkit_protocol::{DesignDocument, Difference, DESIGN_PREFIX, DESIGN_RANGE_END};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Decides which design document names belong to the server.
///
/// Any `Fn(&str) -> bool` closure can be used as a rule.
pub trait ReservedNames: Send + Sync {
    /// Returns true if the named design document must never be deleted.
    fn is_reserved(&self, name: &str) -> bool;
}

/// The CouchDB rule: names starting with `_` are reserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderscorePrefix;

impl ReservedNames for UnderscorePrefix {
    fn is_reserved(&self, name: &str) -> bool {
        name.starts_with('_')
    }
}

impl<F> ReservedNames for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_reserved(&self, name: &str) -> bool {
        self(name)
    }
}

/// Computes the operations that turn `observed` into `desired`.
pub fn diff(
    desired: &[DesignDocument],
    observed: &[DesignDocument],
    reserved: &dyn ReservedNames,
) -> Difference {
    let by_id: HashMap<&str, &DesignDocument> =
        observed.iter().map(|d| (d.id.as_str(), d)).collect();
    let wanted: HashSet<&str> = desired.iter().map(|d| d.id.as_str()).collect();

    let mut difference = Difference::default();

    for doc in desired {
        match by_id.get(doc.id.as_str()) {
            None => difference.additions.push(doc.clone()),
            Some(current) if !doc.same_views(current) => difference.changes.push(doc.clone()),
            Some(_) => {}
        }
    }

    for doc in observed {
        if !wanted.contains(doc.id.as_str()) && !reserved.is_reserved(doc.name()) {
            difference.deletions.push(doc.clone());
        }
    }

    difference
}

/// IDs written by a seeding run, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Deleted design documents.
    pub deleted: Vec<String>,
    /// Updated design documents.
    pub updated: Vec<String>,
    /// Created design documents.
    pub created: Vec<String>,
}

impl SeedReport {
    /// Returns true if the run wrote nothing.
    pub fn is_noop(&self) -> bool {
        self.deleted.is_empty() && self.updated.is_empty() && self.created.is_empty()
    }
}

/// Reconciles the design documents of one database.
pub struct Seeder<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    reserved: &'a dyn ReservedNames,
}

impl<'a, S: DocumentStore + ?Sized> Seeder<'a, S> {
    /// Creates a seeder that protects `_`-prefixed names.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            reserved: &UnderscorePrefix,
        }
    }

    /// Replaces the reserved-name rule.
    pub fn with_reserved(mut self, reserved: &'a dyn ReservedNames) -> Self {
        self.reserved = reserved;
        self
    }

    /// Fetches every design document currently in the database.
    pub fn observed(&self) -> CouchResult<Vec<DesignDocument>> {
        self.store
            .fetch_range(DESIGN_PREFIX, DESIGN_RANGE_END, true)?
            .iter()
            .map(|doc| DesignDocument::from_document(doc).map_err(CouchError::from))
            .collect()
    }

    /// Computes the difference against the database without writing.
    pub fn plan(&self, desired: &[DesignDocument]) -> CouchResult<Difference> {
        let observed = self.observed()?;
        Ok(diff(desired, &observed, self.reserved))
    }

    /// Makes the database's design documents match `desired`.
    pub fn seed(&self, desired: &[DesignDocument]) -> CouchResult<SeedReport> {
        let difference = self.plan(desired)?;
        info!(
            additions = difference.additions.len(),
            changes = difference.changes.len(),
            deletions = difference.deletions.len(),
            "seeding design documents"
        );
        self.apply(difference)
    }

    /// Writes a previously computed difference.
    ///
    /// Deletions use the revision captured in the difference; changes
    /// re-read the document first so they carry the latest revision.
    pub fn apply(&self, difference: Difference) -> CouchResult<SeedReport> {
        let mut report = SeedReport::default();

        for doc in &difference.deletions {
            let rev = doc
                .rev
                .as_deref()
                .ok_or_else(|| CouchError::MissingRevision { id: doc.id.clone() })?;
            debug!(id = %doc.id, rev, "deleting design document");
            self.store.delete(&doc.id, rev)?;
            report.deleted.push(doc.id.clone());
        }

        for mut doc in difference.changes {
            let current = self.store.fetch(&doc.id)?;
            doc.rev = current.rev;
            debug!(id = %doc.id, rev = ?doc.rev, "updating design document");
            self.store.put(&doc.to_document()?)?;
            report.updated.push(doc.id);
        }

        for mut doc in difference.additions {
            doc.rev = None;
            debug!(id = %doc.id, "creating design document");
            self.store.put(&doc.to_document()?)?;
            report.created.push(doc.id);
        }

        info!(
            deleted = report.deleted.len(),
            updated = report.updated.len(),
            created = report.created.len(),
            "design documents seeded"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use couchkit_protocol::DesignView;

    fn ddoc(id: &str, map: &str) -> DesignDocument {
        DesignDocument::with_id(id).with_view("v1", DesignView::map(map))
    }

    #[test]
    fn missing_document_is_an_addition() {
        let difference = diff(&[ddoc("_design/a", "m1")], &[], &UnderscorePrefix);

        assert_eq!(difference.addition_ids(), vec!["_design/a"]);
        assert!(difference.change_ids().is_empty());
        assert!(difference.deletion_ids().is_empty());
    }

    #[test]
    fn different_views_are_a_change() {
        let difference = diff(
            &[ddoc("_design/a", "m2")],
            &[ddoc("_design/a", "m1")],
            &UnderscorePrefix,
        );

        assert!(difference.addition_ids().is_empty());
        assert_eq!(difference.change_ids(), vec!["_design/a"]);
        assert!(difference.deletion_ids().is_empty());
    }

    #[test]
    fn equal_views_ignore_revision() {
        let mut remote = ddoc("_design/a", "m1");
        remote.rev = Some("5-abc".into());

        let difference = diff(&[ddoc("_design/a", "m1")], &[remote], &UnderscorePrefix);
        assert!(difference.is_empty());
    }

    #[test]
    fn reserved_documents_are_not_deleted() {
        let difference = diff(
            &[],
            &[ddoc("_design/a", "m"), ddoc("_auth", "m"), ddoc("_design/_users", "m")],
            &UnderscorePrefix,
        );

        assert_eq!(difference.deletion_ids(), vec!["_design/a"]);
    }

    #[test]
    fn order_follows_inputs() {
        let desired = [ddoc("_design/z", "m"), ddoc("_design/b", "new"), ddoc("_design/a", "m")];
        let observed = [ddoc("_design/y", "m"), ddoc("_design/b", "old"), ddoc("_design/x", "m")];

        let difference = diff(&desired, &observed, &UnderscorePrefix);
        assert_eq!(difference.addition_ids(), vec!["_design/z", "_design/a"]);
        assert_eq!(difference.change_ids(), vec!["_design/b"]);
        assert_eq!(difference.deletion_ids(), vec!["_design/y", "_design/x"]);
    }

    #[test]
    fn custom_reserved_rule() {
        let keep_legacy = |name: &str| name.starts_with("legacy_");
        let observed = [ddoc("_design/legacy_reports", "m"), ddoc("_design/_auth", "m")];

        let difference = diff(&[], &observed, &keep_legacy);
        assert_eq!(difference.deletion_ids(), vec!["_design/_auth"]);
    }

    #[test]
    fn report_noop() {
        assert!(SeedReport::default().is_noop());
        let report = SeedReport {
            created: vec!["_design/a".into()],
            ..SeedReport::default()
        };
        assert!(!report.is_noop());
    }
}
