use crate::types::{AppError, Document, Result};
use std::path::{Path, PathBuf};

/// Reads the knowledge-base directory into ordered documents.
///
/// Every `.txt` or `.md` file becomes one [`Document`] whose `source_id` is
/// the file stem. Files are loaded in lexicographic filename order so the
/// chunk insertion order, and with it retrieval tie-breaking, is stable
/// across reloads.
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn load_all(&self) -> Result<Vec<Document>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            AppError::IndexBuild(format!(
                "Failed to read document directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("txt") | Some("md")
                )
            })
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let raw_text = std::fs::read_to_string(&path).map_err(|e| {
                AppError::IndexBuild(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let source_id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("unknown")
                .to_string();
            documents.push(Document {
                source_id,
                raw_text,
            });
        }

        Ok(documents)
    }
}
