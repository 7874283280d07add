//! PDF backend for `mdpage` render pages.
//!
//! Pages produced by [`mdpage_render::RenderEngine`] are serialized with the
//! base-14 Helvetica family. Measure text with [`HelveticaMeasurer`] so line
//! fitting agrees with the glyphs the PDF viewer draws.

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod metrics;
mod report;
mod writer;

pub use metrics::HelveticaMeasurer;
pub use report::{generate_report, latest_markdown, pdf_path_for, ReportError, ReportOutcome};
pub use writer::{render_pdf_bytes, write_pdf, PdfError};
