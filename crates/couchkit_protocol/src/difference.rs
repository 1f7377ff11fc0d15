//! Difference between a desired and an observed set of design documents.

use crate::design::DesignDocument;

/// The create/update/delete operations needed to converge a database.
///
/// The three lists are disjoint. `additions` and `changes` follow the order
/// of the desired documents, `deletions` the order of the observed ones.
/// Additions and changes hold the desired documents; deletions hold the
/// observed documents, revision included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Difference {
    /// Desired but not present remotely.
    pub additions: Vec<DesignDocument>,
    /// Present on both sides with different views.
    pub changes: Vec<DesignDocument>,
    /// Present remotely but no longer desired.
    pub deletions: Vec<DesignDocument>,
}

impl Difference {
    /// Returns true if nothing needs to be written.
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.changes.is_empty() && self.deletions.is_empty()
    }

    /// Total number of operations.
    pub fn len(&self) -> usize {
        self.additions.len() + self.changes.len() + self.deletions.len()
    }

    /// IDs of the documents to create.
    pub fn addition_ids(&self) -> Vec<&str> {
        self.additions.iter().map(|d| d.id.as_str()).collect()
    }

    /// IDs of the documents to update.
    pub fn change_ids(&self) -> Vec<&str> {
        self.changes.iter().map(|d| d.id.as_str()).collect()
    }

    /// IDs of the documents to delete.
    pub fn deletion_ids(&self) -> Vec<&str> {
        self.deletions.iter().map(|d| d.id.as_str()).collect()
    }
}
