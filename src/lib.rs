//! Markdown report model for fixed-page rendering.
//!
//! `mdpage` turns the constrained markdown emitted by report generators
//! (headings, paragraphs, bullets, rules, bold labels and image references)
//! into a typed block stream. Layout and pagination live in `mdpage-render`.
//!
//! ```
//! use mdpage::{Block, Document};
//!
//! let doc = Document::from_text("# Title\n## Status\nAll good.\n").unwrap();
//! let blocks = doc.classify();
//! assert!(matches!(blocks[1], Block::Heading { level: 2, .. }));
//! ```

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented
    )
)]

pub mod block;
pub mod error;
pub mod images;
pub mod inline;
pub mod sanitize;
pub mod sections;

pub use block::{classify_lines, Block, BlockRole, Document, ImageRef, Section};
pub use error::DocumentError;
pub use images::ImageAssociator;
pub use inline::{parse_runs, strip_inline_markup, RunStyle, TextRun};
pub use sanitize::{is_representable, sanitize, PLACEHOLDER};
pub use sections::{extract_key_sections, text_preview, KeySections};
