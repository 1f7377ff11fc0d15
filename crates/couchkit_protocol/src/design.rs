//! Design documents.

use crate::document::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ID prefix of the design document namespace.
pub const DESIGN_PREFIX: &str = "_design/";

/// Exclusive upper bound of the design namespace in `_all_docs` key order.
///
/// `'0'` sorts directly after `'/'`, so the range `_design/`..`_design0`
/// covers every design document and nothing else.
pub const DESIGN_RANGE_END: &str = "_design0";

/// Language tag for JavaScript view servers.
pub const LANGUAGE_JAVASCRIPT: &str = "javascript";

/// A map function and an optional reduce function.
///
/// Both are opaque source strings; they are only ever compared for equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignView {
    /// Map function source.
    #[serde(default)]
    pub map: String,
    /// Reduce function source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<String>,
}

impl DesignView {
    /// Creates a view with only a map function.
    pub fn map(source: impl Into<String>) -> Self {
        Self {
            map: source.into(),
            reduce: None,
        }
    }

    /// Adds a reduce function.
    pub fn with_reduce(mut self, source: impl Into<String>) -> Self {
        self.reduce = Some(source.into());
        self
    }
}

/// A document whose payload holds view definitions rather than data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignDocument {
    /// Document ID, normally `_design/<name>`.
    #[serde(rename = "_id")]
    pub id: String,
    /// Revision token.
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    /// View server language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Views keyed by view name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub views: BTreeMap<String, DesignView>,
    /// Filter functions keyed by filter name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
}

impl DesignDocument {
    /// Creates a design document named `name` (ID `_design/<name>`).
    pub fn new(name: &str) -> Self {
        Self::with_id(format!("{DESIGN_PREFIX}{name}"))
    }

    /// Creates a design document with an explicit ID.
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the view server language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Adds or replaces a view.
    pub fn with_view(mut self, name: impl Into<String>, view: DesignView) -> Self {
        self.views.insert(name.into(), view);
        self
    }

    /// Returns the name without the `_design/` prefix.
    ///
    /// IDs outside the design namespace are returned unchanged.
    pub fn name(&self) -> &str {
        self.id.strip_prefix(DESIGN_PREFIX).unwrap_or(&self.id)
    }

    /// Returns true if both documents define the same views.
    ///
    /// Revisions, language and filters are not part of the comparison.
    pub fn same_views(&self, other: &DesignDocument) -> bool {
        self.views == other.views
    }

    /// Converts to a generic document.
    pub fn to_document(&self) -> serde_json::Result<Document> {
        serde_json::from_value(serde_json::to_value(self)?)
    }

    /// Decodes a design document from a generic document.
    pub fn from_document(doc: &Document) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::to_value(doc)?)
    }
}
