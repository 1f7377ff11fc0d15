//! Bulk command implementation.

use couchkit_client::{BulkOutcome, BulkReport, Database, Document, DocumentStore};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Accepted input shapes: a bare array or a `_bulk_docs` style body.
#[derive(Deserialize)]
#[serde(untagged)]
enum BulkInput {
    Docs(Vec<Document>),
    Body { docs: Vec<Document> },
}

/// Reads the documents to write from a JSON file.
pub fn load_documents(path: &Path) -> Result<Vec<Document>, Box<dyn std::error::Error>> {
    let data = fs::read(path)?;
    let docs = match serde_json::from_slice(&data)? {
        BulkInput::Docs(docs) | BulkInput::Body { docs } => docs,
    };
    if let Some(doc) = docs.iter().find(|d| d.id.is_empty()) {
        return Err(format!("Document without _id in {:?}: {:?}", path, doc.fields).into());
    }
    Ok(docs)
}

/// Runs the bulk command.
///
/// Fails if any document was not written, after printing which ones.
pub fn run<S: DocumentStore>(db: &Database<S>, path: &Path) -> Result<BulkReport, Box<dyn std::error::Error>> {
    let docs = load_documents(path)?;
    println!("Writing {} documents from {:?}", docs.len(), path);

    let report = db.store_many(docs)?;

    println!();
    println!("  Created: {}", report.created.len());
    println!("  Updated: {}", report.updated.len());
    for outcome in &report.failed {
        if let BulkOutcome::Failed { id, error, reason } = outcome {
            println!("  Failed:  {id} ({error}: {reason})");
        }
    }
    for id in &report.dropped {
        println!("  Dropped: {id} (revision lookup failed)");
    }
    for id in &report.conflicts_remaining {
        println!("  Conflict: {id} (changed again during retry)");
    }

    if !report.is_complete() {
        let missing = report.failed.len() + report.dropped.len() + report.conflicts_remaining.len();
        return Err(format!("{missing} documents were not written").into());
    }
    Ok(report)
}
