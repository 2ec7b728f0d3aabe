//! `html-to-md` command line tool
//!
//! Converts an HTML file, a folder, or a directory tree to Markdown and copies
//! referenced local assets into the export directory.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use html_to_md_converter::{ExportOptions, Exporter, MarkdownConverter};

#[derive(Parser, Debug)]
#[command(
    name = "html-to-md",
    version,
    about = "Convert HTML files to Markdown and export their local assets"
)]
struct Cli {
    /// HTML file or directory to convert
    input: PathBuf,

    /// Directory receiving the Markdown files and copied assets
    /// (default: next to each input file)
    #[arg(short, long, env = "HTML_TO_MD_EXPORT_DIR")]
    export_dir: Option<PathBuf>,

    /// Convert the whole directory tree instead of the top level only
    #[arg(short, long)]
    recursive: bool,

    /// Stop at the first document that fails
    #[arg(long)]
    stop_on_error: bool,

    /// Print the Markdown of a single file to stdout instead of writing files
    /// (any export directory is ignored)
    #[arg(long)]
    stdout: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Log to stderr to keep stdout clean for --stdout
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_markdown(cli: &Cli) -> Result<()> {
    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let result = MarkdownConverter::new()
        .convert_bytes(&bytes)
        .with_context(|| format!("Failed to decode {}", cli.input.display()))?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(result.markdown.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn run(cli: &Cli) -> Result<bool> {
    if cli.stdout {
        anyhow::ensure!(
            cli.input.is_file(),
            "--stdout needs a single input file, got {}",
            cli.input.display()
        );
        if let Some(export_dir) = &cli.export_dir {
            tracing::debug!(export_dir = %export_dir.display(), "ignoring export dir with --stdout");
        }
        print_markdown(cli)?;
        return Ok(true);
    }

    let exporter = Exporter::new(ExportOptions {
        export_dir: cli.export_dir.clone(),
        stop_on_error: cli.stop_on_error,
    });
    let report = exporter.convert_path(&cli.input, cli.recursive)?;

    for failure in &report.failed {
        eprintln!("error: {failure}");
    }
    tracing::info!(
        converted = report.converted.len(),
        failed = report.failed.len(),
        "Export finished"
    );
    Ok(report.is_success())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
