//! `_all_docs` and purge wire types.

use crate::document::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameters of a `GET /{db}/_all_docs` request.
///
/// Key parameters are JSON values on the wire (`startkey="a"`), so they are
/// JSON encoded before being percent-encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllDocsQuery {
    /// Return only the row with this key.
    pub key: Option<String>,
    /// Start of the key range.
    pub start_key: Option<String>,
    /// End of the key range.
    pub end_key: Option<String>,
    /// Whether `end_key` itself is included (server default is `true`).
    pub inclusive_end: Option<bool>,
    /// Embed full documents in the rows.
    pub include_docs: bool,
    /// Reverse the row order.
    pub descending: bool,
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub skip: Option<u64>,
}

impl AllDocsQuery {
    /// Creates an empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the query to the key range `start..=end`.
    pub fn range(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_key: Some(start.into()),
            end_key: Some(end.into()),
            ..Self::default()
        }
    }

    /// Embeds full documents in the rows.
    pub fn with_docs(mut self) -> Self {
        self.include_docs = true;
        self
    }

    /// Sets the row limit.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the URL query string (without the leading `?`).
    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(key) = &self.key {
            pairs.push(("key", json_string(key)));
        }
        if let Some(start) = &self.start_key {
            pairs.push(("startkey", json_string(start)));
        }
        if let Some(end) = &self.end_key {
            pairs.push(("endkey", json_string(end)));
        }
        if let Some(inclusive) = self.inclusive_end {
            pairs.push(("inclusive_end", inclusive.to_string()));
        }
        if self.include_docs {
            pairs.push(("include_docs", "true".into()));
        }
        if self.descending {
            pairs.push(("descending", "true".into()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }

        pairs
            .iter()
            .map(|(name, value)| format!("{}={}", name, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn json_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Response of `GET /{db}/_all_docs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllDocsResponse {
    /// Number of documents in the database.
    #[serde(default)]
    pub total_rows: u64,
    /// Offset of the first returned row.
    #[serde(default)]
    pub offset: u64,
    /// Result rows.
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl AllDocsResponse {
    /// Consumes the response and returns the embedded documents.
    ///
    /// Rows without a document (deleted or missing keys) are skipped.
    pub fn into_documents(self) -> Vec<Document> {
        self.rows.into_iter().filter_map(|row| row.doc).collect()
    }
}

/// A single `_all_docs` row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Document ID.
    #[serde(default)]
    pub id: String,
    /// Row key (the document ID for `_all_docs`).
    #[serde(default)]
    pub key: Value,
    /// Row value (`{"rev": ...}` for `_all_docs`).
    #[serde(default)]
    pub value: Value,
    /// Embedded document when `include_docs=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<Document>,
}

/// Response of `POST /{db}/_purge`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurgeResponse {
    /// Purge sequence (a number on 1.x servers, a string on 2.x and later).
    #[serde(default)]
    pub purge_seq: Value,
    /// Purged revisions keyed by document ID.
    #[serde(default)]
    pub purged: BTreeMap<String, Vec<String>>,
}
