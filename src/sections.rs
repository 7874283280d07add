//! Key-section extraction and plain-text preview of a report.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::unwrap_used)]
static IMAGE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*!\[[^\]]*\]\([^)]*\)[ \t]*\r?\n?").unwrap());

const RISK_ANALYSIS: (u8, &str) = (2, "Risk Analysis");
const OVERDUE_TASKS: (u8, &str) = (3, "Overdue Tasks");
const GOALS: (u8, &str) = (2, "Goals Until Next Sprint Meeting");

/// Bodies of the report sections shown in notifications and terminal output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeySections {
    pub risk_analysis: Option<String>,
    pub overdue_tasks: Option<String>,
    pub goals: Option<String>,
}

impl KeySections {
    pub fn is_empty(&self) -> bool {
        self.risk_analysis.is_none() && self.overdue_tasks.is_none() && self.goals.is_none()
    }

    /// `(title, body)` pairs of the sections that were found.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            (RISK_ANALYSIS.1, &self.risk_analysis),
            (OVERDUE_TASKS.1, &self.overdue_tasks),
            (GOALS.1, &self.goals),
        ]
        .into_iter()
        .filter_map(|(title, body)| body.as_deref().map(|body| (title, body)))
        .collect()
    }
}

/// Pull the risk, overdue and goal sections out of report text.
///
/// A section body runs until the next heading of any level, so subsections
/// such as "Overdue Tasks" are not folded into their parent's body.
/// Leading emoji and punctuation in heading titles are ignored.
pub fn extract_key_sections(text: &str) -> KeySections {
    let lines: Vec<&str> = text.lines().collect();
    KeySections {
        risk_analysis: section_body(&lines, RISK_ANALYSIS),
        overdue_tasks: section_body(&lines, OVERDUE_TASKS),
        goals: section_body(&lines, GOALS),
    }
}

/// Report text with image reference lines removed.
pub fn text_preview(text: &str) -> String {
    IMAGE_LINE_RE.replace_all(text, "").into_owned()
}

fn section_body(lines: &[&str], (level, title): (u8, &str)) -> Option<String> {
    let start = lines.iter().position(|line| {
        heading_parts(line).is_some_and(|(lvl, found)| lvl == level && found == title)
    })?;
    let body: Vec<&str> = lines[start + 1..]
        .iter()
        .take_while(|line| heading_parts(line).is_none())
        .copied()
        .collect();
    let body = body.join("\n");
    let body = body.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

fn heading_parts(line: &str) -> Option<(u8, &str)> {
    let line = line.trim_start();
    let hashes = line.chars().take_while(|ch| *ch == '#').count();
    if hashes == 0 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let level = u8::try_from(hashes).unwrap_or(u8::MAX);
    let title = rest
        .trim_start_matches(|ch: char| !ch.is_alphanumeric())
        .trim_end();
    Some((level, title))
}
