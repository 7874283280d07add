//! `mdpage`: convert a markdown status report into a paginated PDF.
//!
//! Usage:
//!   mdpage [-m report.md] [-o reports] [-p] [--page-numbers]
//!
//! Without `-m` the newest `.md` file in the output directory is converted.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use mdpage::{extract_key_sections, text_preview};
use mdpage_pdf::{generate_report, latest_markdown, ReportOutcome};
use mdpage_render::{LayoutConfig, RenderEngine, RenderEngineOptions};

#[derive(Parser, Debug)]
#[command(name = "mdpage")]
#[command(version)]
#[command(about = "Render a markdown report as a paginated PDF", long_about = None)]
struct Cli {
    /// Markdown report to convert (defaults to the newest .md in the output directory)
    #[arg(short, long, value_name = "FILE")]
    markdown_file: Option<PathBuf>,

    /// Directory the PDF is written to
    #[arg(short, long, value_name = "DIR", default_value = "reports", env = "MDPAGE_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Print the key report sections to stdout
    #[arg(short, long)]
    print_sections: bool,

    /// JSON layout overrides
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the render pages as JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Add a "Page N of M" footer to every page
    #[arg(long)]
    page_numbers: bool,

    /// Log layout decisions at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let markdown_path = match &cli.markdown_file {
        Some(path) => path.clone(),
        None => latest_markdown(&cli.output_dir).map_err(|e| e.to_string())?,
    };

    let mut layout = match &cli.config {
        Some(path) => load_layout(path)?,
        None => LayoutConfig::default(),
    };
    if cli.page_numbers {
        layout.page_chrome.footer_enabled = true;
    }
    let engine = RenderEngine::new(RenderEngineOptions { layout });

    let outcome =
        generate_report(&engine, &markdown_path, &cli.output_dir).map_err(|e| e.to_string())?;

    if let Some(json_path) = &cli.json {
        outcome
            .rendered
            .write_json(json_path)
            .map_err(|e| e.to_string())?;
    }
    if cli.print_sections {
        print_sections(&markdown_path)?;
    }
    print_summary(&outcome);
    Ok(())
}

fn load_layout(path: &Path) -> Result<LayoutConfig, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("invalid layout config {}: {}", path.display(), e))
}

fn print_sections(markdown_path: &Path) -> Result<(), String> {
    let text = fs::read_to_string(markdown_path)
        .map_err(|e| format!("failed to read {}: {}", markdown_path.display(), e))?;
    let sections = extract_key_sections(&text);
    if sections.is_empty() {
        println!("{}", text_preview(&text).trim_end());
        return Ok(());
    }
    for (title, body) in sections.entries() {
        println!("== {} ==", title);
        println!("{}", body.trim_end());
        println!();
    }
    Ok(())
}

fn print_summary(outcome: &ReportOutcome) {
    println!("markdown:    {}", outcome.markdown_path.display());
    println!("pdf:         {}", outcome.pdf_path.display());
    println!("pages:       {}", outcome.rendered.page_count());
    println!("diagnostics: {}", outcome.rendered.diagnostics.len());
    for diagnostic in &outcome.rendered.diagnostics {
        println!("  {}", diagnostic);
    }
}
