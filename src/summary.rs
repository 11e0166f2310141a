//! Numbered markdown summaries written alongside the knowledge base.

use chrono::Local;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SummaryError {
    let path = path.to_path_buf();
    move |source| SummaryError::Io { path, source }
}

/// Whether a summary was produced mid-book or after the last page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    Interval,
    Final,
}

impl SummaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interval => "interval",
            Self::Final => "final",
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes `<stem>_<kind>_<NNN>.md` files into the summaries directory.
///
/// Existing files are never overwritten, so history accumulates across runs
/// that share a directory.
pub struct SummaryWriter {
    dir: PathBuf,
    document: String,
    stem: String,
}

impl SummaryWriter {
    pub fn new<P: AsRef<Path>>(dir: P, document: &str, stem: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            document: document.to_string(),
            stem: stem.to_string(),
        }
    }

    /// Persist `text` as the next summary of `kind`.
    ///
    /// Returns `Ok(None)` without touching the disk when `text` is blank.
    pub fn write(&self, text: &str, kind: SummaryKind) -> Result<Option<PathBuf>, SummaryError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_error(&self.dir))?;
        tmp.write_all(self.render(text).as_bytes())
            .map_err(io_error(&self.dir))?;
        tmp.as_file().sync_all().map_err(io_error(&self.dir))?;

        let mut number = self.next_number(kind)?;
        loop {
            let path = self.dir.join(self.file_name(kind, number));
            match tmp.persist_noclobber(&path) {
                Ok(_) => return Ok(Some(path)),
                // a gap in the numbering; move past the taken slot
                Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                    tmp = e.file;
                    number += 1;
                }
                Err(e) => return Err(io_error(&path)(e.error)),
            }
        }
    }

    /// Count of existing summaries of `kind`, plus one
    pub fn next_number(&self, kind: SummaryKind) -> Result<usize, SummaryError> {
        let entries = std::fs::read_dir(&self.dir).map_err(io_error(&self.dir))?;

        let prefix = format!("{}_{}_", self.stem, kind);
        let existing = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with(&prefix) && name.ends_with(".md")
            })
            .count();

        Ok(existing + 1)
    }

    fn file_name(&self, kind: SummaryKind, number: usize) -> String {
        format!("{}_{}_{:03}.md", self.stem, kind, number)
    }

    fn render(&self, text: &str) -> String {
        format!(
            "# Book Analysis: {}\nGenerated on: {}\n\n{}\n\n---\n*Analysis generated by pagewise*\n",
            self.document,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer_in(dir: &tempfile::TempDir) -> SummaryWriter {
        SummaryWriter::new(dir.path(), "meditations.pdf", "meditations")
    }

    fn names(dir: &tempfile::TempDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn numbers_sequentially_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer_in(&dir);

        for _ in 0..3 {
            writer.write("## Notes", SummaryKind::Interval).unwrap();
        }
        writer.write("## All notes", SummaryKind::Final).unwrap();

        assert_eq!(
            names(&dir),
            vec![
                "meditations_final_001.md",
                "meditations_interval_001.md",
                "meditations_interval_002.md",
                "meditations_interval_003.md",
            ]
        );
    }

    #[test]
    fn numbering_continues_across_writers() {
        let dir = tempfile::tempdir().unwrap();
        writer_in(&dir).write("first", SummaryKind::Interval).unwrap();

        let path = writer_in(&dir)
            .write("second", SummaryKind::Interval)
            .unwrap()
            .unwrap();
        assert!(path.ends_with("meditations_interval_002.md"));
    }

    #[test]
    fn blank_text_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer_in(&dir);

        assert!(writer.write("", SummaryKind::Final).unwrap().is_none());
        assert!(writer.write("  \n", SummaryKind::Interval).unwrap().is_none());
        assert!(names(&dir).is_empty());
    }

    #[test]
    fn never_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("meditations_final_001.md"), "keep me").unwrap();
        std::fs::write(dir.path().join("meditations_final_003.md"), "keep me too").unwrap();

        // two existing files point at 003, which is taken
        let path = writer_in(&dir)
            .write("new", SummaryKind::Final)
            .unwrap()
            .unwrap();

        assert!(path.ends_with("meditations_final_004.md"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("meditations_final_003.md")).unwrap(),
            "keep me too"
        );
    }

    #[test]
    fn leaves_no_partial_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer_in(&dir);
        writer.write("one", SummaryKind::Interval).unwrap();
        std::fs::write(dir.path().join("meditations_interval_002.md"), "taken").unwrap();
        writer.write("two", SummaryKind::Interval).unwrap();

        assert_eq!(
            names(&dir),
            vec![
                "meditations_interval_001.md",
                "meditations_interval_002.md",
                "meditations_interval_003.md",
            ]
        );
        let content =
            std::fs::read_to_string(dir.path().join("meditations_interval_003.md")).unwrap();
        assert!(content.contains("\n\ntwo\n\n"));
    }

    #[test]
    fn ignores_other_documents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("other_interval_001.md"), "x").unwrap();

        assert_eq!(writer_in(&dir).next_number(SummaryKind::Interval).unwrap(), 1);
    }

    #[test]
    fn renders_title_body_and_footer() {
        let dir = tempfile::tempdir().unwrap();
        let path = writer_in(&dir)
            .write("## Stoicism\n- **Virtue**", SummaryKind::Final)
            .unwrap()
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("# Book Analysis: meditations.pdf\nGenerated on: "));
        assert!(content.contains("\n\n## Stoicism\n- **Virtue**\n\n---\n"));
        assert!(content.ends_with("*Analysis generated by pagewise*\n"));
    }
}
