//! Page-by-page orchestration.
//!
//! Each page is extracted, classified, appended to the knowledge base and
//! persisted before the next one starts. Interval and final summaries are
//! triggered from the page count.

use crate::agent::{AgentError, Classifier, Summarizer};
use crate::config::RunConfig;
use crate::knowledge::{KnowledgeError, KnowledgeStore};
use crate::pages::{PageError, PageSource};
use crate::summary::{SummaryError, SummaryKind, SummaryWriter};
use crate::ui;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("knowledge base error: {0}")]
    Knowledge(#[from] KnowledgeError),
    #[error("page extraction error: {0}")]
    Pages(#[from] PageError),
    #[error("agent error on page {page}: {source}")]
    Classify { page: usize, source: AgentError },
    #[error("summarization failed: {0}")]
    Summarize(AgentError),
    #[error("summary write error: {0}")]
    Summary(#[from] SummaryError),
}

/// What happened to a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Page had content; holds the number of knowledge points appended
    Accumulated(usize),
    /// Classifier reported no relevant content
    Skipped,
    /// Classifier reply was unusable; the page was skipped
    Failed(String),
}

/// Totals for a completed run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub pages_processed: usize,
    pub pages_with_content: usize,
    pub pages_skipped: usize,
    pub pages_failed: usize,
    pub knowledge_points: usize,
    pub interval_summaries: Vec<PathBuf>,
    pub final_summary: Option<PathBuf>,
}

/// Which summary, if any, is due after `done` of `last` pages
fn summary_due(config: &RunConfig, done: usize, last: usize) -> Option<SummaryKind> {
    if done == last {
        return Some(SummaryKind::Final);
    }
    match config.interval {
        Some(k) if done % k.get() == 0 => Some(SummaryKind::Interval),
        _ => None,
    }
}

/// Run the page loop over `pages` and return totals.
///
/// Knowledge already stored at the canonical path is loaded first and
/// appended to. Malformed classifier replies skip the page; any other
/// error ends the run with everything processed so far already saved.
pub async fn run<P, C, S>(
    config: &RunConfig,
    pages: &P,
    classifier: &C,
    summarizer: &S,
) -> Result<RunReport, PipelineError>
where
    P: PageSource,
    C: Classifier,
    S: Summarizer,
{
    let store = KnowledgeStore::new(config.knowledge_path());
    let writer = SummaryWriter::new(&config.layout.summaries, &config.document, &config.stem);

    let mut knowledge = store.load()?;
    ui::knowledge_loaded(knowledge.len());

    let total = pages.page_count();
    let last = config.page_limit.map_or(total, |limit| limit.min(total));
    ui::processing_pages(last);
    info!(document = %config.document, total, last, "starting page loop");

    let mut report = RunReport::default();

    for index in 0..last {
        ui::page_started(index);
        let text = pages.page_text(index)?;

        let outcome = match classifier.classify(&text).await {
            Ok(content) if content.has_content => {
                let added = content.knowledge.len();
                knowledge.extend(content.knowledge);
                PageOutcome::Accumulated(added)
            }
            Ok(_) => PageOutcome::Skipped,
            Err(e) if e.is_recoverable() => PageOutcome::Failed(e.to_string()),
            Err(source) => {
                return Err(PipelineError::Classify {
                    page: index + 1,
                    source,
                })
            }
        };

        match &outcome {
            PageOutcome::Accumulated(added) => {
                ui::page_found(*added);
                report.pages_with_content += 1;
            }
            PageOutcome::Skipped => {
                ui::page_skipped();
                report.pages_skipped += 1;
            }
            PageOutcome::Failed(reason) => {
                warn!(page = index + 1, %reason, "skipping page after classifier contract violation");
                ui::page_failed(reason);
                report.pages_failed += 1;
            }
        }

        ui::knowledge_saved(knowledge.len());
        store.save(&knowledge)?;
        report.pages_processed += 1;

        let done = index + 1;
        if let Some(kind) = summary_due(config, done, last) {
            ui::summary_started(kind, done, last);
            if let Some(path) = write_summary(&writer, summarizer, &knowledge, kind).await? {
                ui::summary_saved(kind, &path);
                match kind {
                    SummaryKind::Interval => report.interval_summaries.push(path),
                    SummaryKind::Final => report.final_summary = Some(path),
                }
            }
        }
    }

    report.knowledge_points = knowledge.len();
    info!(
        pages = report.pages_processed,
        knowledge = report.knowledge_points,
        "page loop finished"
    );
    Ok(report)
}

/// Summarize and persist; `None` when there was nothing to summarize
async fn write_summary<S: Summarizer>(
    writer: &SummaryWriter,
    summarizer: &S,
    knowledge: &[String],
    kind: SummaryKind,
) -> Result<Option<PathBuf>, PipelineError> {
    if knowledge.is_empty() {
        ui::summary_skipped();
        return Ok(None);
    }

    let text = summarizer
        .summarize(knowledge)
        .await
        .map_err(PipelineError::Summarize)?;
    let path = writer.write(&text, kind)?;
    if path.is_none() {
        ui::summary_skipped();
    }
    Ok(path)
}
