use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use log::{debug, info};
use mdpage_render::{RenderConfig, RenderEngine, RenderEngineError, RenderedDocument};
use thiserror::Error;

use crate::metrics::HelveticaMeasurer;
use crate::writer::{write_pdf, PdfError};

/// Failure producing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No markdown file was given and none was found in the directory.
    #[error("no markdown files found in {dir}")]
    NoMarkdown { dir: PathBuf },
    /// Listing the output directory failed.
    #[error("failed to read directory {dir}: {source}")]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The markdown file could not be loaded or rendered.
    #[error(transparent)]
    Render(#[from] RenderEngineError),
    /// The PDF could not be written.
    #[error(transparent)]
    Pdf(#[from] PdfError),
}

/// Result of one report conversion.
#[derive(Debug)]
pub struct ReportOutcome {
    pub markdown_path: PathBuf,
    pub pdf_path: PathBuf,
    pub rendered: RenderedDocument,
}

/// Output path for `markdown_path`: `<out_dir>/<stem>.pdf`.
pub fn pdf_path_for(markdown_path: &Path, out_dir: &Path) -> PathBuf {
    let stem = markdown_path
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_else(|| "report".into());
    let mut path = out_dir.join(stem);
    path.set_extension("pdf");
    path
}

/// Most recently modified `.md` file directly inside `dir`.
pub fn latest_markdown(dir: &Path) -> Result<PathBuf, ReportError> {
    let entries = fs::read_dir(dir).map_err(|source| ReportError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    })?;
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_markdown = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        if !is_markdown || !path.is_file() {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().is_none_or(|(best, _)| modified > *best) {
            newest = Some((modified, path));
        }
    }
    newest
        .map(|(_, path)| path)
        .ok_or_else(|| ReportError::NoMarkdown {
            dir: dir.to_path_buf(),
        })
}

/// Render `markdown_path` with Helvetica metrics and write the PDF into
/// `out_dir`.
pub fn generate_report(
    engine: &RenderEngine,
    markdown_path: &Path,
    out_dir: &Path,
) -> Result<ReportOutcome, ReportError> {
    let config = RenderConfig::default().with_text_measurer(Arc::new(HelveticaMeasurer));
    let rendered = engine.render_file(markdown_path, config)?;
    let pdf_path = pdf_path_for(markdown_path, out_dir);
    debug!(
        "writing {} pages from {} to {}",
        rendered.page_count(),
        markdown_path.display(),
        pdf_path.display()
    );
    write_pdf(&rendered.pages, &engine.options().layout, &pdf_path)?;
    info!("wrote {}", pdf_path.display());
    Ok(ReportOutcome {
        markdown_path: markdown_path.to_path_buf(),
        pdf_path,
        rendered,
    })
}
