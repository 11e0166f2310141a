//! JSON-file storage for the accumulated knowledge base.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("knowledge base at {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// On-disk shape of the knowledge base file
#[derive(Debug, Serialize, Deserialize)]
struct KnowledgeFile<T> {
    knowledge: T,
}

/// Single-file store for one document's knowledge points.
///
/// The whole list is rewritten on every save; order is page order.
pub struct KnowledgeStore {
    path: PathBuf,
}

impl KnowledgeStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load existing knowledge, or an empty list when no file exists yet
    pub fn load(&self) -> Result<Vec<String>, KnowledgeError> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(KnowledgeError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let file: KnowledgeFile<Vec<String>> =
            serde_json::from_slice(&data).map_err(|source| KnowledgeError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(file.knowledge)
    }

    /// Replace the stored knowledge with `knowledge`.
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the target, so the file is either the old or the new list.
    pub fn save(&self, knowledge: &[String]) -> Result<(), KnowledgeError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let io_err = |source| KnowledgeError::Io {
            path: self.path.clone(),
            source,
        };

        let body = serde_json::to_vec_pretty(&KnowledgeFile { knowledge })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&body).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> KnowledgeStore {
        KnowledgeStore::new(dir.path().join("book_knowledge.json"))
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let knowledge = vec![
            "Virtue is the only good".to_string(),
            "The obstacle is the way".to_string(),
            "Memento mori".to_string(),
        ];

        store.save(&knowledge).unwrap();
        assert_eq!(store.load().unwrap(), knowledge);
    }

    #[test]
    fn save_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&["a".to_string(), "b".to_string()]).unwrap();
        store.save(&["c".to_string()]).unwrap();

        assert_eq!(store.load().unwrap(), vec!["c".to_string()]);

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn writes_knowledge_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&["point".to_string()]).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({ "knowledge": ["point"] }));
    }

    #[test]
    fn invalid_json_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(KnowledgeError::Corrupt { .. })));
    }

    #[test]
    fn wrong_shape_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"knowledge": [1, 2, 3]}"#).unwrap();
        assert!(matches!(store.load(), Err(KnowledgeError::Corrupt { .. })));

        std::fs::write(store.path(), r#"["loose", "list"]"#).unwrap();
        assert!(matches!(store.load(), Err(KnowledgeError::Corrupt { .. })));
    }
}
