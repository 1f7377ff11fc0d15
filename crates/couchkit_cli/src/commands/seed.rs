//! Seed command implementation.

use super::diff;
use couchkit_client::{parse_dir, Database, DocumentStore};
use std::path::Path;

/// Runs the seed command.
pub fn run<S: DocumentStore>(
    db: &Database<S>,
    dir: &Path,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let desired = parse_dir(dir)?;
    println!("Seeding {} design documents from {:?}", desired.len(), dir);

    if dry_run {
        println!("(dry run - no changes will be made)");
        println!();
        let difference = db.plan_seed(&desired)?;
        print!("{}", diff::render(&difference, "text")?);
        return Ok(());
    }

    let report = db.seed(&desired)?;
    println!();
    if report.is_noop() {
        println!("Design documents are up to date");
        return Ok(());
    }
    println!("  Deleted: {}", report.deleted.len());
    println!("  Updated: {}", report.updated.len());
    println!("  Created: {}", report.created.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use couchkit_client::{DesignDocument, DesignView, MemoryStore};
    use std::fs;
    use tempfile::TempDir;

    fn design_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in ["players", "teams"] {
            let view = dir.path().join(name).join("all");
            fs::create_dir_all(&view).unwrap();
            fs::write(view.join("map.js"), "function(doc){emit(doc._id)}").unwrap();
        }
        dir
    }

    fn stale_db() -> Database<MemoryStore> {
        let store = MemoryStore::new();
        store.insert(
            DesignDocument::new("stale")
                .with_view("all", DesignView::map("m"))
                .to_document()
                .unwrap(),
        );
        Database::new(store)
    }

    #[test]
    fn seeds_directory() {
        let dir = design_dir();
        let db = stale_db();

        run(&db, dir.path(), false).unwrap();
        assert_eq!(db.inner().ids(), vec!["_design/players", "_design/teams"]);
    }

    #[test]
    fn dry_run_leaves_database_untouched() {
        let dir = design_dir();
        let db = stale_db();

        run(&db, dir.path(), true).unwrap();
        assert_eq!(db.inner().ids(), vec!["_design/stale"]);
    }

    #[test]
    fn missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        assert!(run(&stale_db(), &dir.path().join("missing"), false).is_err());
    }
}
