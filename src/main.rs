//! Pagewise CLI - knowledge extraction and summarisation for books
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use pagewise::{pipeline, setup, ui, Config, LlmAgent, PdfPages};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagewise")]
#[command(author, version, about = "Extract knowledge from a book page by page and summarise it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the configured book (default)
    Run {
        /// Path to a pagewise.toml
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match verbose {
        0 => "pagewise=warn",
        1 => "pagewise=info",
        _ => "pagewise=debug",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "pagewise", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Run { config, yes }) => run(config, yes).await,
        None => run(None, false).await,
    }
}

async fn run(config_path: Option<PathBuf>, yes: bool) -> anyhow::Result<()> {
    let config = Config::load(config_path.as_deref())?;
    let run_config = config.run_config()?;

    ui::print_instructions(&run_config);
    if !yes && !ui::confirm_start()? {
        ui::cancelled();
        return Ok(());
    }

    let agent = LlmAgent::from_config(&config)?;
    let staged = setup::prepare(&run_config)?;
    let pages = PdfPages::open(&staged)?;

    let report = pipeline::run(&run_config, &pages, &agent, &agent).await?;

    if report.pages_failed > 0 {
        println!(
            "\n{} of {} pages could not be classified and were skipped",
            report.pages_failed, report.pages_processed
        );
    }
    ui::finished();
    Ok(())
}
