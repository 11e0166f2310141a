//! Page-level text extraction from source documents.
//!
//! Uses pdf-extract to pull the text of every page up front.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("failed to extract text from {path:?}: {message}")]
    ExtractError { path: PathBuf, message: String },
    #[error("page {index} is out of range ({count} pages)")]
    OutOfRange { index: usize, count: usize },
}

/// Ordered source of page text
pub trait PageSource {
    /// Total number of pages in the document
    fn page_count(&self) -> usize;

    /// Text of the page at `index`; an empty string is a valid page
    fn page_text(&self, index: usize) -> Result<String, PageError>;
}

/// Text of a PDF, one entry per page
#[derive(Debug, Clone)]
pub struct PdfPages {
    pages: Vec<String>,
}

impl PdfPages {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PageError> {
        let path = path.as_ref();
        let pages =
            pdf_extract::extract_text_by_pages(path).map_err(|e| PageError::ExtractError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self { pages })
    }
}

impl From<Vec<String>> for PdfPages {
    fn from(pages: Vec<String>) -> Self {
        Self { pages }
    }
}

impl PageSource for PdfPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> Result<String, PageError> {
        self.pages
            .get(index)
            .cloned()
            .ok_or(PageError::OutOfRange {
                index,
                count: self.pages.len(),
            })
    }
}
