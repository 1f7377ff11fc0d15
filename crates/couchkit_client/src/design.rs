//! Loading design documents from a directory tree.
//!
//! The expected layout is one directory per design document and one
//! directory per view, holding `map.js` and an optional `reduce.js`:
//!
//! ```text
//! design/
//! |-- player/
//! |   |-- by_age/
//! |   |   |-- map.js
//! |   |   `-- reduce.js
//! |   `-- by_name/
//! |       `-- map.js
//! `-- user/
//!     `-- by_email/
//!         `-- map.js
//! ```

use crate::error::CouchResult;
use couchkit_protocol::{DesignDocument, DesignView, LANGUAGE_JAVASCRIPT};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File holding a view's map function.
pub const MAP_FILE: &str = "map.js";

/// File holding a view's reduce function.
pub const REDUCE_FILE: &str = "reduce.js";

/// Parses every design document below `dir`.
///
/// Design documents and views are returned in file-name order. Plain files
/// next to the directories are ignored.
///
/// # Errors
///
/// Returns an I/O error if a directory cannot be read or a view lacks
/// `map.js`. A missing `reduce.js` is not an error.
pub fn parse_dir(dir: impl AsRef<Path>) -> CouchResult<Vec<DesignDocument>> {
    let mut docs = Vec::new();

    for ddoc_dir in subdirectories(dir.as_ref())? {
        let name = file_name(&ddoc_dir);
        let mut doc = DesignDocument::new(&name).with_language(LANGUAGE_JAVASCRIPT);

        for view_dir in subdirectories(&ddoc_dir)? {
            let map = fs::read_to_string(view_dir.join(MAP_FILE))?;
            let reduce = match fs::read_to_string(view_dir.join(REDUCE_FILE)) {
                Ok(source) => Some(source),
                Err(err) if err.kind() == io::ErrorKind::NotFound => None,
                Err(err) => return Err(err.into()),
            };
            doc.views
                .insert(file_name(&view_dir), DesignView { map, reduce });
        }

        debug!(id = %doc.id, views = doc.views.len(), "parsed design document");
        docs.push(doc);
    }

    Ok(docs)
}

fn subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
