//! recast CLI, the main entry point.
//!
//! `recast [INPUT]` cuts INPUT into chunks, asks the configured model for a
//! summary and a rewrite of each one, and writes the reassembled rewrite.
//! Without INPUT the path is read from stdin.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use recast_config::AppConfig;
use recast_core::{Error, Result};
use recast_pipeline::{Pipeline, RunReport};

const INPUT_PROMPT: &str = "Please enter the path to the large source file: ";

#[derive(Parser)]
#[command(
    name = "recast",
    about = "recast: summarize and rewrite large source files chunk by chunk",
    version,
    author
)]
struct Cli {
    /// Source file to process (prompted for when omitted)
    input: Option<PathBuf>,

    /// Config file to use instead of ./recast.toml or ~/.recast/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    if cli.print_default_config {
        print!("{}", AppConfig::default_toml());
        return ExitCode::SUCCESS;
    }

    match run(cli).await {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("❌ {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<RunReport> {
    let config = load_config(&cli)?;

    let input = match cli.input {
        Some(path) => path,
        None => prompt_for_input(&mut io::stdin().lock(), &mut io::stdout())?,
    };

    let provider = recast_providers::build_from_config(&config)?;
    let pipeline = Pipeline::new(config, provider)?;
    pipeline.run(&input).await
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => AppConfig::load_with_env(path)?,
        None => AppConfig::load()?,
    };
    Ok(config)
}

/// Ask for the input path. Surrounding whitespace is dropped.
fn prompt_for_input(reader: &mut impl BufRead, writer: &mut impl Write) -> Result<PathBuf> {
    let stdio_err = |e: io::Error| Error::filesystem("<stdin>", e);

    write!(writer, "{INPUT_PROMPT}").map_err(stdio_err)?;
    writer.flush().map_err(stdio_err)?;

    let mut line = String::new();
    reader.read_line(&mut line).map_err(stdio_err)?;

    let path = line.trim();
    if path.is_empty() {
        return Err(Error::config("No input file given"));
    }
    Ok(PathBuf::from(path))
}

fn print_report(report: &RunReport) {
    println!(
        "✅ Rewrote {} chunk(s) into {}",
        report.chunk_count,
        report.output_file.display()
    );
    if let Some(log) = &report.summary_log {
        println!("   Summaries: {}", log.display());
    }
    if report.intermediates_removed {
        println!("   Intermediate chunk files removed");
    }
}
