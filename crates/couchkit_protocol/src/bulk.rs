//! Bulk write types (`POST /{db}/_bulk_docs`).

use crate::document::Document;
use serde::{Deserialize, Serialize};

/// Error kind the server reports for a revision mismatch.
pub const CONFLICT_ERROR: &str = "conflict";

/// Body of a `_bulk_docs` request.
#[derive(Debug, Clone, Serialize)]
pub struct BulkDocsRequest<'a> {
    /// Documents to write.
    pub docs: &'a [Document],
    /// Ask the server to commit all documents or none.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub all_or_nothing: bool,
    /// Set to `false` to store revisions as given (replication mode).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_edits: Option<bool>,
}

impl<'a> BulkDocsRequest<'a> {
    /// Creates a plain bulk request.
    pub fn new(docs: &'a [Document]) -> Self {
        Self {
            docs,
            all_or_nothing: false,
            new_edits: None,
        }
    }
}

/// Per-document entry of a `_bulk_docs` response.
///
/// Successful entries carry `ok` and the new `rev`; failed entries carry
/// `error` and `reason` instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItemResult {
    /// Whether the write was accepted.
    #[serde(default)]
    pub ok: bool,
    /// Document ID.
    #[serde(default)]
    pub id: String,
    /// New revision token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Error kind, e.g. `conflict` or `forbidden`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Human readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BulkItemResult {
    /// Creates a successful entry.
    pub fn success(id: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: id.into(),
            rev: Some(rev.into()),
            error: None,
            reason: None,
        }
    }

    /// Creates a failed entry.
    pub fn failure(id: impl Into<String>, error: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: id.into(),
            rev: None,
            error: Some(error.into()),
            reason: Some(reason.into()),
        }
    }

    /// Creates a conflict entry.
    pub fn conflict(id: impl Into<String>) -> Self {
        Self::failure(id, CONFLICT_ERROR, "Document update conflict.")
    }

    /// Returns true if the server rejected the write for a stale revision.
    pub fn is_conflict(&self) -> bool {
        !self.ok && self.error.as_deref() == Some(CONFLICT_ERROR)
    }

    /// Classifies this entry.
    pub fn outcome(&self) -> BulkOutcome {
        if self.ok {
            BulkOutcome::Created {
                id: self.id.clone(),
                rev: self.rev.clone().unwrap_or_default(),
            }
        } else if self.is_conflict() {
            BulkOutcome::Conflict {
                id: self.id.clone(),
            }
        } else {
            BulkOutcome::Failed {
                id: self.id.clone(),
                error: self.error.clone().unwrap_or_else(|| "unknown".into()),
                reason: self.reason.clone().unwrap_or_default(),
            }
        }
    }
}

/// Classified result of one document in a bulk write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    /// The document was written.
    Created {
        /// Document ID.
        id: String,
        /// New revision token.
        rev: String,
    },
    /// The supplied revision did not match the server's.
    Conflict {
        /// Document ID.
        id: String,
    },
    /// Any other per-document error (e.g. `forbidden`).
    Failed {
        /// Document ID.
        id: String,
        /// Error kind.
        error: String,
        /// Human readable reason.
        reason: String,
    },
}

impl BulkOutcome {
    /// Returns the document ID.
    pub fn id(&self) -> &str {
        match self {
            BulkOutcome::Created { id, .. }
            | BulkOutcome::Conflict { id }
            | BulkOutcome::Failed { id, .. } => id,
        }
    }

    /// Returns true for [`BulkOutcome::Created`].
    pub fn is_created(&self) -> bool {
        matches!(self, BulkOutcome::Created { .. })
    }
}
