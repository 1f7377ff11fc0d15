//! Diff command implementation.

use couchkit_client::{parse_dir, Database, Difference, DocumentStore};
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

/// Design document IDs grouped by the operation `seed` would perform.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DiffSummary {
    /// IDs that would be deleted.
    pub deletions: Vec<String>,
    /// IDs that would be updated.
    pub changes: Vec<String>,
    /// IDs that would be created.
    pub additions: Vec<String>,
}

impl From<&Difference> for DiffSummary {
    fn from(difference: &Difference) -> Self {
        let owned = |ids: Vec<&str>| -> Vec<String> { ids.into_iter().map(str::to_string).collect() };
        Self {
            deletions: owned(difference.deletion_ids()),
            changes: owned(difference.change_ids()),
            additions: owned(difference.addition_ids()),
        }
    }
}

/// Runs the diff command.
pub fn run<S: DocumentStore>(
    db: &Database<S>,
    dir: &Path,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let desired = parse_dir(dir)?;
    let difference = db.plan_seed(&desired)?;
    print!("{}", render(&difference, format)?);
    Ok(())
}

/// Formats a difference as `text` or `json`.
pub fn render(difference: &Difference, format: &str) -> Result<String, Box<dyn std::error::Error>> {
    let summary = DiffSummary::from(difference);
    match format {
        "json" => Ok(format!("{}\n", serde_json::to_string_pretty(&summary)?)),
        "text" => {
            let mut out = String::new();
            if difference.is_empty() {
                writeln!(out, "Design documents are up to date")?;
                return Ok(out);
            }
            for id in &summary.deletions {
                writeln!(out, "- {id}")?;
            }
            for id in &summary.changes {
                writeln!(out, "~ {id}")?;
            }
            for id in &summary.additions {
                writeln!(out, "+ {id}")?;
            }
            writeln!(
                out,
                "\n{} to delete, {} to update, {} to create",
                summary.deletions.len(),
                summary.changes.len(),
                summary.additions.len()
            )?;
            Ok(out)
        }
        other => Err(format!("Unknown format: {other}").into()),
    }
}
