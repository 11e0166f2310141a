//! # Pagewise
//!
//! Page-by-page knowledge extraction for books using LLMs.
//!
//! ## Features
//!
//! - **Incremental Knowledge Base**: every page's knowledge points are persisted as soon as they are extracted
//! - **Periodic Summaries**: numbered interval and final markdown summaries that never overwrite each other
//! - **Provider Agnostic**: supports Gemini and OpenAI via rstructor

pub mod agent;
pub mod config;
pub mod knowledge;
pub mod pages;
pub mod pipeline;
pub mod setup;
pub mod summary;
pub mod ui;

pub use agent::{Classifier, LlmAgent, PageContent, Summarizer};
pub use config::{Config, RunConfig};
pub use knowledge::KnowledgeStore;
pub use pages::{PageSource, PdfPages};
pub use pipeline::{PageOutcome, RunReport};
pub use summary::{SummaryKind, SummaryWriter};
