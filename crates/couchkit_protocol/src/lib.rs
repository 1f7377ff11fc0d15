//! # CouchKit Protocol
//!
//! Document model and CouchDB wire types for CouchKit.
//!
//! This crate provides:
//! - [`Document`], a versioned JSON document with `_id`, `_rev` and attachment stubs
//! - [`DesignDocument`] and [`DesignView`] for map/reduce view definitions
//! - [`Difference`], the outcome of comparing desired and observed design documents
//! - Bulk write types ([`BulkDocsRequest`], [`BulkItemResult`], [`BulkOutcome`])
//! - `_all_docs` query and response types
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod bulk;
mod design;
mod difference;
mod document;
mod query;

pub use bulk::{BulkDocsRequest, BulkItemResult, BulkOutcome, CONFLICT_ERROR};
pub use design::{DesignDocument, DesignView, DESIGN_PREFIX, DESIGN_RANGE_END, LANGUAGE_JAVASCRIPT};
pub use difference::Difference;
pub use document::{Attachment, Document, DocumentResponse};
pub use query::{AllDocsQuery, AllDocsResponse, PurgeResponse, Row};
