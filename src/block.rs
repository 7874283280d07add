//! Document lines and block classification.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::error::DocumentError;
use crate::inline::{parse_runs, plain_text, strip_inline_markup, TextRun};

#[allow(clippy::unwrap_used)]
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!\[([^\]]*)\]\(([^)\s]+)(?:\s+[^)]*)?\)$").unwrap());

const MAX_HEADING_LEVEL: u8 = 3;

/// Raw report text as an ordered list of lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
}

impl Document {
    /// Build a document from in-memory text.
    ///
    /// Fails with [`DocumentError::Empty`] when no line has content.
    pub fn from_text(text: &str) -> Result<Self, DocumentError> {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        if lines.iter().all(|line| line.trim().is_empty()) {
            return Err(DocumentError::Empty);
        }
        Ok(Self { lines })
    }

    /// Read a UTF-8 document from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|_| DocumentError::InvalidUtf8 {
            path: path.to_path_buf(),
        })?;
        Self::from_text(&text)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Classify every line into a typed block.
    pub fn classify(&self) -> Vec<Block> {
        classify_lines(self.lines.iter().map(String::as_str))
    }
}

/// A level-2 heading that owns the images following it.
///
/// `ordinal` counts level-2 headings from zero in document order, so two
/// headings with the same title remain distinct sections.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Section {
    pub ordinal: usize,
    pub title: String,
}

/// An image reference `![alt](path)` and the section it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    /// Position among image references in document order.
    pub id: usize,
    pub alt: String,
    pub path: PathBuf,
    /// Nearest preceding level-2 heading, if any.
    pub section: Option<Section>,
    /// Italic line directly after the reference.
    pub caption: Option<String>,
}

/// Semantic role of a block, used to pick a style tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockRole {
    /// Paragraph text.
    Body,
    /// Heading block by level.
    Heading(u8),
    /// Bullet list item.
    ListItem,
    /// Standalone bold line.
    Label,
    /// Image caption line.
    Caption,
}

/// One classified unit of the source document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// Heading of level 1 to 3. Deeper headings are clamped to 3.
    Heading { level: u8, text: String },
    /// Bullet item; `runs` is empty unless the text has bold spans.
    BulletItem { text: String, runs: Vec<TextRun> },
    /// Horizontal rule.
    Rule,
    /// A line wholly wrapped in bold markers.
    BoldLabel(String),
    /// Image reference.
    ImageRef(ImageRef),
    /// Plain paragraph line; `runs` is empty unless it mixes bold spans.
    Paragraph { text: String, runs: Vec<TextRun> },
    /// Blank line: a paragraph-sized gap.
    Blank,
}

impl Block {
    pub fn role(&self) -> Option<BlockRole> {
        match self {
            Self::Heading { level, .. } => Some(BlockRole::Heading(*level)),
            Self::BulletItem { .. } => Some(BlockRole::ListItem),
            Self::BoldLabel(_) => Some(BlockRole::Label),
            Self::Paragraph { .. } => Some(BlockRole::Body),
            Self::Rule | Self::ImageRef(_) | Self::Blank => None,
        }
    }

    /// Styled runs of a text block. Text without bold spans is one regular run.
    pub fn runs(&self) -> Vec<TextRun> {
        match self {
            Self::BulletItem { text, runs } | Self::Paragraph { text, runs } => {
                if runs.is_empty() {
                    vec![TextRun::regular(text.clone())]
                } else {
                    runs.clone()
                }
            }
            Self::Heading { text, .. } => vec![TextRun::regular(text.clone())],
            Self::BoldLabel(text) => vec![TextRun::bold(text.clone())],
            Self::Rule | Self::ImageRef(_) | Self::Blank => Vec::new(),
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Self::Heading { .. })
    }

    /// Paragraph-like blocks that count toward the prose lookahead.
    pub fn is_prose(&self) -> bool {
        matches!(
            self,
            Self::Paragraph { .. } | Self::BulletItem { .. } | Self::BoldLabel(_)
        )
    }
}

#[derive(Default)]
struct ClassifyState {
    blocks: Vec<Block>,
    section: Option<Section>,
    sections_seen: usize,
    images_seen: usize,
}

impl ClassifyState {
    fn push_line(mut self, raw: &str) -> Self {
        let line = raw.trim();
        if line.is_empty() {
            self.blocks.push(Block::Blank);
            return self;
        }
        if let Some(caption) = italic_text(line) {
            if let Some(Block::ImageRef(image)) = self.blocks.last_mut() {
                if image.caption.is_none() {
                    image.caption = Some(caption.to_string());
                    return self;
                }
            }
        }
        let block = self.classify(line);
        self.blocks.push(block);
        self
    }

    fn classify(&mut self, line: &str) -> Block {
        if let Some((level, text)) = heading(line) {
            if level == 2 {
                self.section = Some(Section {
                    ordinal: self.sections_seen,
                    title: text.clone(),
                });
                self.sections_seen += 1;
            }
            return Block::Heading { level, text };
        }
        if let Some(item) = ["- ", "* ", "+ "]
            .iter()
            .find_map(|marker| line.strip_prefix(marker))
        {
            let text = strip_inline_markup(item.trim());
            let runs = parse_runs(&text);
            return Block::BulletItem {
                text: plain_or_literal(&text, &runs),
                runs,
            };
        }
        if line.len() >= 3 && line.chars().all(|ch| ch == '-') {
            return Block::Rule;
        }
        if let Some(caps) = IMAGE_RE.captures(line) {
            let image = ImageRef {
                id: self.images_seen,
                alt: caps[1].trim().to_string(),
                path: PathBuf::from(&caps[2]),
                section: self.section.clone(),
                caption: None,
            };
            self.images_seen += 1;
            return Block::ImageRef(image);
        }
        if let Some(label) = bold_label(line) {
            return Block::BoldLabel(strip_inline_markup(label));
        }
        if let Some(text) = italic_text(line) {
            return Block::Paragraph {
                text: strip_inline_markup(text),
                runs: Vec::new(),
            };
        }
        let text = strip_inline_markup(line);
        let runs = parse_runs(&text);
        Block::Paragraph {
            text: plain_or_literal(&text, &runs),
            runs,
        }
    }
}

/// Classify `lines` in order.
///
/// Each image reference is tagged with the nearest preceding level-2
/// heading, carried through the pass as fold state.
pub fn classify_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<Block> {
    let state = lines
        .into_iter()
        .fold(ClassifyState::default(), ClassifyState::push_line);
    debug!(
        "classified {} blocks ({} sections, {} images)",
        state.blocks.len(),
        state.sections_seen,
        state.images_seen
    );
    state.blocks
}

fn heading(line: &str) -> Option<(u8, String)> {
    let hashes = line.chars().take_while(|ch| *ch == '#').count();
    if hashes == 0 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let level = u8::try_from(hashes)
        .unwrap_or(MAX_HEADING_LEVEL)
        .min(MAX_HEADING_LEVEL);
    let text = strip_inline_markup(rest.trim()).replace("**", "");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some((level, text.to_string()))
}

fn bold_label(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("**")?.strip_suffix("**")?;
    if inner.trim().is_empty() || inner.contains("**") {
        return None;
    }
    Some(inner.trim())
}

/// Inner text of a line wrapped in single `*` markers.
fn italic_text(line: &str) -> Option<&str> {
    if line.starts_with("**") || line.ends_with("**") {
        return None;
    }
    let inner = line.strip_prefix('*')?.strip_suffix('*')?;
    let inner = inner.trim();
    if inner.is_empty() || inner.contains('*') {
        return None;
    }
    Some(inner)
}

fn plain_or_literal(text: &str, runs: &[TextRun]) -> String {
    if runs.is_empty() {
        text.to_string()
    } else {
        plain_text(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(ordinal: usize, title: &str) -> Option<Section> {
        Some(Section {
            ordinal,
            title: title.to_string(),
        })
    }

    #[test]
    fn from_text_rejects_blank_documents() {
        assert!(matches!(Document::from_text(""), Err(DocumentError::Empty)));
        assert!(matches!(
            Document::from_text("  \n\n\t\n"),
            Err(DocumentError::Empty)
        ));
    }

    #[test]
    fn read_reports_missing_file() {
        let err = Document::read("/definitely/not/here.md").unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }

    #[test]
    fn classifies_each_block_kind() {
        let blocks = classify_lines([
            "# Sprint Report",
            "## Status",
            "### Details",
            "#### Deep",
            "- item one",
            "---",
            "![Burndown](charts/burndown.png)",
            "**Key Metrics**",
            "Just text.",
            "",
        ]);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                text: "Sprint Report".into()
            }
        );
        assert!(matches!(blocks[1], Block::Heading { level: 2, .. }));
        assert!(matches!(blocks[2], Block::Heading { level: 3, .. }));
        assert_eq!(
            blocks[3],
            Block::Heading {
                level: 3,
                text: "Deep".into()
            }
        );
        assert!(matches!(&blocks[4], Block::BulletItem { text, .. } if text == "item one"));
        assert_eq!(blocks[5], Block::Rule);
        match &blocks[6] {
            Block::ImageRef(image) => {
                assert_eq!(image.alt, "Burndown");
                assert_eq!(image.path, PathBuf::from("charts/burndown.png"));
                assert_eq!(image.section, section(0, "Status"));
            }
            other => panic!("expected image ref, got {other:?}"),
        }
        assert_eq!(blocks[7], Block::BoldLabel("Key Metrics".into()));
        assert!(matches!(&blocks[8], Block::Paragraph { text, runs } if text == "Just text." && runs.is_empty()));
        assert_eq!(blocks[9], Block::Blank);
    }

    #[test]
    fn image_before_any_section_has_no_section() {
        let blocks = classify_lines(["![early](a.png)", "## Later", "![late](b.png)"]);
        let sections: Vec<_> = blocks
            .iter()
            .filter_map(|block| match block {
                Block::ImageRef(image) => Some(image.section.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(sections, vec![None, section(0, "Later")]);
    }

    #[test]
    fn level_three_heading_keeps_current_section() {
        let blocks = classify_lines(["## A", "### Sub", "![x](x.png)", "## B"]);
        let Block::ImageRef(image) = &blocks[2] else {
            panic!("expected image ref");
        };
        assert_eq!(image.section, section(0, "A"));
    }

    #[test]
    fn italic_line_after_image_becomes_caption() {
        let blocks = classify_lines(["![chart](c.png)", "*Legend*", "*standalone*"]);
        assert_eq!(blocks.len(), 2);
        let Block::ImageRef(image) = &blocks[0] else {
            panic!("expected image ref");
        };
        assert_eq!(image.caption.as_deref(), Some("Legend"));
        assert!(matches!(&blocks[1], Block::Paragraph { text, .. } if text == "standalone"));
    }

    #[test]
    fn italic_line_after_blank_is_not_a_caption() {
        let blocks = classify_lines(["![chart](c.png)", "", "*Legend*"]);
        let Block::ImageRef(image) = &blocks[0] else {
            panic!("expected image ref");
        };
        assert!(image.caption.is_none());
        assert_eq!(blocks.len(), 3);
    }

    #[test]
    fn bullets_and_paragraphs_carry_bold_runs() {
        let blocks = classify_lines(["- **Owner**: Dana", "Plain **bold** plain"]);
        match &blocks[0] {
            Block::BulletItem { text, runs } => {
                assert_eq!(text, "Owner: Dana");
                assert_eq!(runs[0], TextRun::bold("Owner"));
            }
            other => panic!("expected bullet, got {other:?}"),
        }
        match &blocks[1] {
            Block::Paragraph { text, runs } => {
                assert_eq!(text, "Plain bold plain");
                assert_eq!(runs.len(), 3);
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
    }

    #[test]
    fn bold_label_requires_whole_line() {
        let blocks = classify_lines(["**a** and **b**", "**Label:**"]);
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
        assert_eq!(blocks[1], Block::BoldLabel("Label:".into()));
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        let blocks = classify_lines(["#hashtag"]);
        assert!(matches!(blocks[0], Block::Paragraph { .. }));
    }

    #[test]
    fn heading_text_drops_markup() {
        let blocks = classify_lines(["## **Risk** [Analysis](http://x)"]);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 2,
                text: "Risk Analysis".into()
            }
        );
    }

    #[test]
    fn image_ids_follow_document_order() {
        let blocks = classify_lines(["![a](a.png)", "text", "![b](b.png)"]);
        let ids: Vec<usize> = blocks
            .iter()
            .filter_map(|block| match block {
                Block::ImageRef(image) => Some(image.id),
                _ => None,
            })
            .collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn block_runs_default_to_single_regular_run() {
        let block = Block::Paragraph {
            text: "hello".into(),
            runs: Vec::new(),
        };
        assert_eq!(block.runs(), vec![TextRun::regular("hello")]);
        assert_eq!(block.role(), Some(BlockRole::Body));
    }
}
