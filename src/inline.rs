//! Inline markup: bold runs, links and code spans.

use std::sync::LazyLock;

use log::warn;
use regex::{Captures, Regex};

const BOLD_MARKER: &str = "**";

#[allow(clippy::unwrap_used)]
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[([^\]]*)\]\([^)]*\)").unwrap());

#[allow(clippy::unwrap_used)]
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]*)`").unwrap());

/// Emphasis of a text run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunStyle {
    #[default]
    Regular,
    Bold,
}

/// A span of text with a single emphasis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub style: RunStyle,
}

impl TextRun {
    pub fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::Regular,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::Bold,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.style == RunStyle::Bold
    }
}

/// Split `text` on `**` markers into alternating regular/bold runs.
///
/// Returns an empty vector when the text has no complete marker pair, so
/// callers can treat it as one regular run. An unmatched trailing marker is
/// kept as literal text. Whitespace around markers is preserved inside the
/// neighbouring regular runs; it decides whether segments are word-separated.
pub fn parse_runs(text: &str) -> Vec<TextRun> {
    let marker_count = text.matches(BOLD_MARKER).count();
    if marker_count < 2 {
        return Vec::new();
    }

    let mut pieces: Vec<String> = text.split(BOLD_MARKER).map(str::to_string).collect();
    if marker_count % 2 == 1 {
        // Re-join the last unmatched marker with its tail.
        if let (Some(tail), Some(prev)) = (pieces.pop(), pieces.last_mut()) {
            prev.push_str(BOLD_MARKER);
            prev.push_str(&tail);
        }
    }

    let mut runs = Vec::with_capacity(pieces.len());
    for (idx, piece) in pieces.into_iter().enumerate() {
        if piece.is_empty() {
            continue;
        }
        let style = if idx % 2 == 1 {
            RunStyle::Bold
        } else {
            RunStyle::Regular
        };
        if style == RunStyle::Bold && piece.trim().is_empty() {
            continue;
        }
        if let Some(last) = runs.last_mut().filter(|run: &&mut TextRun| run.style == style) {
            last.text.push_str(&piece);
            continue;
        }
        runs.push(TextRun { text: piece, style });
    }

    if runs.iter().any(TextRun::is_bold) {
        runs
    } else {
        Vec::new()
    }
}

/// Plain text of a run list with markers removed.
pub fn plain_text(runs: &[TextRun]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

/// Replace `[text](url)` with `text`, drop inline `![alt](src)` and unwrap
/// `` `code` `` spans.
pub fn strip_inline_markup(text: &str) -> String {
    let no_links = LINK_RE.replace_all(text, |caps: &Captures<'_>| {
        if &caps[1] == "!" {
            warn!("inline image {} dropped; images must stand on their own line", &caps[0]);
            String::new()
        } else {
            caps[2].to_string()
        }
    });
    CODE_RE.replace_all(&no_links, "$1").into_owned()
}
