//! Document loading errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Structural failure loading a report document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document has no non-blank lines.
    #[error("document is empty")]
    Empty,

    /// The document could not be read.
    #[error("failed to read document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The document is not valid UTF-8.
    #[error("document {path} is not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },
}
