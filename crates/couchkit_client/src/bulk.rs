//! Bulk writes with conflict retry, and single-document upserts.
//!
//! [`store_many`] writes a batch in one `_bulk_docs` call. Documents the
//! server rejects with a revision conflict are re-read for their current
//! revision and submitted once more in a second, smaller bulk call.
//! Conflicts are expected here; they are never a top-level error.

use crate::error::CouchResult;
use crate::store::DocumentStore;
use couchkit_protocol::{BulkOutcome, Document, DocumentResponse};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Result of [`store_many`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    /// IDs written by the first bulk call.
    pub created: BTreeSet<String>,
    /// IDs written by the retry call after a conflict.
    pub updated: BTreeSet<String>,
    /// Per-document failures other than conflicts, from either call.
    ///
    /// These are not retried.
    pub failed: Vec<BulkOutcome>,
    /// IDs whose current revision could not be read, so no retry was made.
    pub dropped: Vec<String>,
    /// IDs that conflicted again during the retry.
    pub conflicts_remaining: Vec<String>,
    /// Classified results of the first call, in request order.
    pub outcomes: Vec<BulkOutcome>,
    /// Classified results of the retry call, in request order.
    pub retry_outcomes: Vec<BulkOutcome>,
}

impl BulkReport {
    /// IDs written by either call.
    pub fn written(&self) -> BTreeSet<String> {
        self.created.union(&self.updated).cloned().collect()
    }

    /// Returns true if every submitted document was written.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.dropped.is_empty() && self.conflicts_remaining.is_empty()
    }
}

/// Writes `docs` in bulk, retrying conflicted documents once.
///
/// When several documents share an ID, the last one in `docs` is the one
/// resubmitted on conflict.
///
/// # Errors
///
/// Returns the error of either bulk call. Failing to read the current
/// revision of a conflicted document is not an error; the document is
/// listed in [`BulkReport::dropped`].
pub fn store_many<S: DocumentStore + ?Sized>(store: &S, docs: Vec<Document>) -> CouchResult<BulkReport> {
    let mut report = BulkReport::default();
    if docs.is_empty() {
        return Ok(report);
    }

    let results = store.bulk_write(&docs)?;

    let mut by_id: HashMap<String, Document> = HashMap::with_capacity(docs.len());
    for doc in docs {
        by_id.insert(doc.id.clone(), doc);
    }

    let mut retry = Vec::new();
    for result in &results {
        let outcome = result.outcome();
        match &outcome {
            BulkOutcome::Created { id, .. } => {
                report.created.insert(id.clone());
            }
            BulkOutcome::Conflict { id } => {
                // A second conflict entry for the same ID finds the map empty.
                if let Some(mut doc) = by_id.remove(id) {
                    match store.current_revision(id) {
                        Ok(rev) => {
                            debug!(id = %id, rev = %rev, "refreshed revision after conflict");
                            doc.set_rev(rev);
                            retry.push(doc);
                        }
                        Err(err) => {
                            warn!(id = %id, error = %err, "dropping conflicted document");
                            report.dropped.push(id.clone());
                        }
                    }
                }
            }
            BulkOutcome::Failed { id, error, reason } => {
                warn!(id = %id, error = %error, reason = %reason, "bulk write rejected document");
                report.failed.push(outcome.clone());
            }
        }
        report.outcomes.push(outcome);
    }

    if !retry.is_empty() {
        debug!(count = retry.len(), "retrying conflicted documents");
        for result in store.bulk_write(&retry)? {
            let outcome = result.outcome();
            match &outcome {
                BulkOutcome::Created { id, .. } => {
                    report.updated.insert(id.clone());
                }
                BulkOutcome::Conflict { id } => {
                    warn!(id = %id, "document still conflicts after retry");
                    report.conflicts_remaining.push(id.clone());
                }
                BulkOutcome::Failed { .. } => report.failed.push(outcome.clone()),
            }
            report.retry_outcomes.push(outcome);
        }
    }

    info!(
        created = report.created.len(),
        updated = report.updated.len(),
        failed = report.failed.len(),
        dropped = report.dropped.len(),
        "bulk write finished"
    );
    Ok(report)
}

/// Creates or overwrites a single document.
///
/// If the document exists, its current revision is stamped onto `doc` and
/// the write replaces it; otherwise the document is created. A conflict
/// from a concurrent writer is returned to the caller, not retried.
pub fn store<S: DocumentStore + ?Sized>(store: &S, mut doc: Document) -> CouchResult<DocumentResponse> {
    match store.current_revision(&doc.id) {
        Ok(rev) => doc.set_rev(rev),
        Err(err) if err.is_not_found() => doc.clear_rev(),
        Err(err) => return Err(err),
    }
    store.put(&doc)
}
