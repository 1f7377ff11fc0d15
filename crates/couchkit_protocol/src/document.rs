//! Versioned documents.

use crate::design::DESIGN_PREFIX;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A document stored in a CouchDB database.
///
/// Every document has an `_id` that is unique within its database and a
/// `_rev` revision token assigned by the server on each successful write.
/// Updates and deletes must present the current revision; a stale one is
/// rejected with a conflict.
///
/// # Fields
///
/// - `id`: Document ID, immutable once created
/// - `rev`: Revision token, `None` before the first write
/// - `attachments`: Attachment stubs as returned by the server
/// - `fields`: All remaining top-level members of the JSON body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID.
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Revision token.
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// Attachment stubs keyed by file name.
    #[serde(
        rename = "_attachments",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub attachments: BTreeMap<String, Attachment>,
    /// Application fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    /// Creates an empty document with the given ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets an application field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Sets the revision token.
    pub fn with_rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    /// Returns the document ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the revision token, if any.
    pub fn rev(&self) -> Option<&str> {
        self.rev.as_deref()
    }

    /// Replaces the revision token.
    pub fn set_rev(&mut self, rev: impl Into<String>) {
        self.rev = Some(rev.into());
    }

    /// Removes the revision token so the next write is a create.
    pub fn clear_rev(&mut self) {
        self.rev = None;
    }

    /// Returns an application field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns true if this document lives in the design namespace.
    pub fn is_design(&self) -> bool {
        self.id.starts_with(DESIGN_PREFIX)
    }
}

/// Attachment metadata carried inside a document body.
///
/// The client never interprets attachment content; stubs are passed through
/// unchanged so that writes do not drop existing attachments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME type of the attachment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Inline base64 data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Content digest computed by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Compressed length, when the server stores it encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_length: Option<u64>,
    /// Compression codec, when the server stores it encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Length in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    /// Revision number at which the attachment was last changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revpos: Option<u64>,
    /// True for metadata-only stubs.
    #[serde(default, skip_serializing_if = "is_false")]
    pub stub: bool,
    /// True when the content follows in a multipart body.
    #[serde(default, skip_serializing_if = "is_false")]
    pub follows: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Response to a single-document write or delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResponse {
    /// Whether the write was accepted.
    #[serde(default)]
    pub ok: bool,
    /// Document ID.
    #[serde(default)]
    pub id: String,
    /// New revision token.
    #[serde(default)]
    pub rev: String,
}

impl DocumentResponse {
    /// Creates a successful response.
    pub fn success(id: impl Into<String>, rev: impl Into<String>) -> Self {
        Self {
            ok: true,
            id: id.into(),
            rev: rev.into(),
        }
    }
}
