//! Document discovery under the configured root.

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::parse;

/// Find every supported document under `root`, recursively.
///
/// A missing root is created (first run) and yields an empty list. Results
/// are sorted by file name, then full path, so ingestion order is stable
/// across runs.
pub fn find_documents(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        std::fs::create_dir_all(root)?;
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if parse::is_supported(entry.path()) {
            documents.push(entry.path().to_path_buf());
        }
    }

    documents.sort_by(|a, b| {
        a.file_name()
            .cmp(&b.file_name())
            .then_with(|| a.cmp(b))
    });

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_root_is_created_and_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path().join("documents");
        let found = find_documents(&root).unwrap();
        assert!(found.is_empty());
        assert!(root.exists());
    }

    #[test]
    fn only_supported_files_found_in_stable_order() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("beta.txt"), "b").unwrap();
        std::fs::write(dir.path().join("alpha.md"), "a").unwrap();
        std::fs::write(dir.path().join("skip.png"), "x").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/gamma.txt"), "c").unwrap();

        let found = find_documents(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["alpha.md", "beta.txt", "gamma.txt"]);
    }
}
