//! Output directory preparation and source staging.

use crate::config::{OutputPolicy, RunConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("source document {name} not found at {staged:?} or {source_path:?}")]
    MissingSource {
        name: String,
        staged: PathBuf,
        source_path: PathBuf,
    },
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SetupError + '_ {
    move |source| SetupError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Prepare the output layout for a run and return the staged document path.
///
/// With [`OutputPolicy::Fresh`] every file in the knowledge and summaries
/// directories is removed first.
pub fn prepare(config: &RunConfig) -> Result<PathBuf, SetupError> {
    let layout = &config.layout;

    if config.policy == OutputPolicy::Fresh {
        for dir in [&layout.knowledge, &layout.summaries] {
            clear_files(dir)?;
        }
    }

    for dir in [&layout.pdfs, &layout.knowledge, &layout.summaries] {
        std::fs::create_dir_all(dir).map_err(io_error(dir))?;
    }

    stage_document(config)
}

/// Delete the plain files in `dir`, leaving subdirectories alone
fn clear_files(dir: &Path) -> Result<(), SetupError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(io_error(dir)(e)),
    };

    let mut removed = 0usize;
    for entry in entries {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_file() {
            std::fs::remove_file(&path).map_err(io_error(&path))?;
            removed += 1;
        }
    }
    if removed > 0 {
        info!(dir = %dir.display(), removed, "cleared previous output");
    }
    Ok(())
}

/// Copy the document into the pdfs directory unless it is already there
fn stage_document(config: &RunConfig) -> Result<PathBuf, SetupError> {
    let staged = config.staged_document();
    if staged.exists() {
        return Ok(staged);
    }

    if !config.source.is_file() {
        return Err(SetupError::MissingSource {
            name: config.document.clone(),
            staged,
            source_path: config.source.clone(),
        });
    }

    std::fs::copy(&config.source, &staged).map_err(io_error(&staged))?;
    info!(from = %config.source.display(), to = %staged.display(), "staged source document");
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn run_config(base: &Path, policy: OutputPolicy) -> RunConfig {
        let mut config = Config::default();
        config.document.name = "book.pdf".to_string();
        config.document.source = Some(base.join("incoming").join("book.pdf"));
        config.storage.path = base.join("analysis");
        config.run.policy = policy;
        config.run_config().unwrap()
    }

    fn write_source(base: &Path) {
        std::fs::create_dir_all(base.join("incoming")).unwrap();
        std::fs::write(base.join("incoming").join("book.pdf"), b"%PDF-1.4").unwrap();
    }

    #[test]
    fn creates_layout_and_stages_source() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path());
        let config = run_config(dir.path(), OutputPolicy::Fresh);

        let staged = prepare(&config).unwrap();

        assert_eq!(staged, config.staged_document());
        assert_eq!(std::fs::read(&staged).unwrap(), b"%PDF-1.4");
        assert!(config.layout.knowledge.is_dir());
        assert!(config.layout.summaries.is_dir());
        // copied, not moved
        assert!(config.source.exists());
    }

    #[test]
    fn already_staged_document_needs_no_source() {
        let dir = tempfile::tempdir().unwrap();
        let config = run_config(dir.path(), OutputPolicy::Fresh);
        std::fs::create_dir_all(&config.layout.pdfs).unwrap();
        std::fs::write(config.staged_document(), b"staged").unwrap();

        assert_eq!(prepare(&config).unwrap(), config.staged_document());
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = run_config(dir.path(), OutputPolicy::Fresh);

        assert!(matches!(
            prepare(&config),
            Err(SetupError::MissingSource { .. })
        ));
    }

    #[test]
    fn fresh_policy_clears_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path());
        let config = run_config(dir.path(), OutputPolicy::Fresh);
        prepare(&config).unwrap();
        std::fs::write(config.knowledge_path(), r#"{"knowledge": ["old"]}"#).unwrap();
        std::fs::write(config.layout.summaries.join("book_final_001.md"), "old").unwrap();

        prepare(&config).unwrap();

        assert!(!config.knowledge_path().exists());
        assert_eq!(std::fs::read_dir(&config.layout.summaries).unwrap().count(), 0);
        assert!(config.staged_document().exists());
    }

    #[test]
    fn resume_policy_keeps_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        write_source(dir.path());
        let config = run_config(dir.path(), OutputPolicy::Resume);
        prepare(&config).unwrap();
        std::fs::write(config.knowledge_path(), r#"{"knowledge": ["old"]}"#).unwrap();

        prepare(&config).unwrap();

        assert!(config.knowledge_path().exists());
    }
}
