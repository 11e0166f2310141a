//! Console output and the start-up confirmation prompt.

use crate::config::RunConfig;
use crate::summary::SummaryKind;
use colored::Colorize;
use dialoguer::Confirm;
use std::path::Path;

/// Print what the run is about to do
pub fn print_instructions(config: &RunConfig) {
    let interval = match config.interval {
        Some(k) => format!("every {} pages", k),
        None => "disabled".to_string(),
    };
    let limit = match config.page_limit {
        Some(n) => format!("first {} pages", n),
        None => "entire document".to_string(),
    };

    println!("{}", "\n📚 PDF Book Analysis 📚".cyan().bold());
    println!("{}", "---------------------------".cyan());
    println!("The book will be processed page by page:");
    println!("  - knowledge points are extracted and saved after every page");
    println!("  - interval summaries are written as configured");
    println!("  - a final summary is written after the last page\n");
    println!("  Document:           {}", config.document);
    println!("  Output:             {}", config.layout.base.display());
    println!("  Interval summaries: {}", interval);
    println!("  Pages:              {}", limit);
    println!("  Previous output:    {:?}\n", config.policy);
}

/// Ask before starting; `false` means the user declined or cancelled
pub fn confirm_start() -> Result<bool, dialoguer::Error> {
    let answer = Confirm::new()
        .with_prompt("Start processing?")
        .default(true)
        .interact_opt()?;
    Ok(answer.unwrap_or(false))
}

pub fn cancelled() {
    println!("{}", "\n❌ Process cancelled by user".red());
}

pub fn knowledge_loaded(count: usize) {
    if count == 0 {
        println!("{}", "🆕 Starting with fresh knowledge base".cyan());
    } else {
        println!(
            "{}",
            format!("✅ Loaded {} existing knowledge points", count).green()
        );
    }
}

pub fn processing_pages(count: usize) {
    println!("{}", format!("\n📚 Processing {} pages...", count).cyan());
}

pub fn page_started(index: usize) {
    println!("{}", format!("\n📖 Processing page {}...", index + 1).yellow());
}

pub fn page_found(points: usize) {
    println!(
        "{}",
        format!("✅ Found {} new knowledge points", points).green()
    );
}

pub fn page_skipped() {
    println!("{}", "⏭️  Skipping page (no relevant content)".yellow());
}

pub fn page_failed(reason: &str) {
    println!(
        "{}",
        format!("⚠️  Could not classify page, skipping: {}", reason).red()
    );
}

pub fn knowledge_saved(count: usize) {
    println!(
        "{}",
        format!("💾 Saving knowledge base ({} items)...", count).blue()
    );
}

pub fn summary_started(kind: SummaryKind, done: usize, total: usize) {
    let line = match kind {
        SummaryKind::Interval => format!("\n📊 Progress: {}/{} pages processed", done, total),
        SummaryKind::Final => format!("\n📊 Final page ({}/{}) processed", done, total),
    };
    println!("{}", line.cyan());
}

pub fn summary_skipped() {
    println!(
        "{}",
        "⚠️  Skipping analysis: No knowledge points collected".yellow()
    );
}

pub fn summary_saved(kind: SummaryKind, path: &Path) {
    println!(
        "{}",
        format!("✅ {} analysis saved to: {}", kind, path.display()).green()
    );
}

pub fn finished() {
    println!("{}", "\n✨ Processing complete! ✨".green().bold());
}
