use mdpage::BlockRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::render_ir::ResolvedTextStyle;

/// Glyph-width oracle for line fitting.
pub trait TextMeasurer: Send + Sync {
    /// Measure rendered text width in page units for the provided style.
    fn measure_text(&self, text: &str, style: &ResolvedTextStyle) -> f32;
}

/// Class-based width estimate used when no backend metrics are installed.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicMeasurer;

impl TextMeasurer for HeuristicMeasurer {
    fn measure_text(&self, text: &str, style: &ResolvedTextStyle) -> f32 {
        heuristic_measure_text(text, style)
    }
}

fn heuristic_measure_text(text: &str, style: &ResolvedTextStyle) -> f32 {
    let em_sum: f32 = text.chars().map(proportional_glyph_em_width).sum();
    let mut scale = 1.0;
    if style.is_bold() {
        scale += 0.04;
    }
    if style.italic {
        scale += 0.01;
    }
    em_sum * style.size * scale
}

fn proportional_glyph_em_width(ch: char) -> f32 {
    match ch {
        ' ' => 0.28,
        'i' | 'l' | 'I' | '|' | '!' => 0.24,
        '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.28,
        '-' => 0.34,
        '(' | ')' | '[' | ']' | '{' | '}' => 0.34,
        'f' | 't' | 'j' | 'r' => 0.32,
        'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.86,
        c if c.is_ascii_digit() => 0.56,
        c if c.is_ascii_uppercase() => 0.68,
        c if c.is_ascii_lowercase() => 0.54,
        c if c.is_ascii_punctuation() => 0.50,
        _ => 0.60,
    }
}

/// Font metrics for one style tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextTier {
    /// Font size in points.
    pub size: f32,
    /// Line height multiplier.
    pub line_height: f32,
}

impl TextTier {
    pub const fn new(size: f32, line_height: f32) -> Self {
        Self { size, line_height }
    }
}

/// Where the source caption line of an image is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionPlacement {
    /// Caption line before the image.
    Above,
    /// Caption line after the image and its alt caption.
    #[default]
    Below,
}

/// Page chrome emission policy and geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageChromeConfig {
    /// Emit a "Page N of M" footer on every page.
    pub footer_enabled: bool,
    /// Footer text baseline offset from the bottom edge.
    pub footer_baseline_from_bottom: f32,
}

impl Default for PageChromeConfig {
    fn default() -> Self {
        Self {
            footer_enabled: false,
            footer_baseline_from_bottom: 20.0,
        }
    }
}

/// Layout configuration for page construction, in page units (points).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Physical page width.
    pub page_width: f32,
    /// Physical page height.
    pub page_height: f32,
    /// Left margin.
    pub margin_left: f32,
    /// Right margin.
    pub margin_right: f32,
    /// Top margin.
    pub margin_top: f32,
    /// Bottom margin.
    pub margin_bottom: f32,
    /// Level-1 heading tier.
    pub heading1: TextTier,
    /// Level-2 heading tier.
    pub heading2: TextTier,
    /// Level-3 heading tier.
    pub heading3: TextTier,
    /// Paragraph, bullet and label tier.
    pub body: TextTier,
    /// Image caption tier.
    pub caption: TextTier,
    /// Gap emitted for a blank source line.
    pub paragraph_gap: f32,
    /// Gap before a heading that is not first on its page.
    pub heading_gap: f32,
    /// Left indent of bullet text relative to the marker.
    pub list_indent: f32,
    /// Bullet marker glyph.
    pub bullet_marker: String,
    /// Vertical space taken by a horizontal rule.
    pub rule_height: f32,
    /// Rule stroke thickness.
    pub rule_thickness: f32,
    /// Maximum image width as a fraction of the content width.
    pub image_max_width_ratio: f32,
    /// Gap above and below an image block.
    pub image_gap: f32,
    /// Placement of the source caption line.
    pub caption_placement: CaptionPlacement,
    /// Emit the alt text centered below each image.
    pub alt_text_captions: bool,
    /// Keep headings with at least this many following lines.
    pub heading_keep_with_next_lines: u8,
    /// Prose lines allowed between a section heading and its images.
    pub section_image_lookahead: usize,
    /// Heading of the trailing section holding unassociated images.
    pub supplementary_title: String,
    /// Page chrome emission policy.
    pub page_chrome: PageChromeConfig,
}

impl LayoutConfig {
    /// A4 portrait in points.
    pub const A4: (f32, f32) = (595.0, 842.0);
    /// US Letter portrait in points.
    pub const LETTER: (f32, f32) = (612.0, 792.0);

    /// Convenience for a page size with default margins and tiers.
    pub fn for_page(width: f32, height: f32) -> Self {
        Self {
            page_width: width,
            page_height: height,
            ..Self::default()
        }
    }

    pub fn content_left(&self) -> f32 {
        self.margin_left
    }

    pub fn content_width(&self) -> f32 {
        (self.page_width - self.margin_left - self.margin_right).max(0.0)
    }

    pub fn content_top(&self) -> f32 {
        self.margin_top
    }

    pub fn content_bottom(&self) -> f32 {
        (self.page_height - self.margin_bottom).max(self.margin_top)
    }

    pub fn content_height(&self) -> f32 {
        self.content_bottom() - self.content_top()
    }

    /// Metrics tier for a block role.
    pub fn tier(&self, role: BlockRole) -> TextTier {
        match role {
            BlockRole::Heading(1) => self.heading1,
            BlockRole::Heading(2) => self.heading2,
            BlockRole::Heading(_) => self.heading3,
            BlockRole::Caption => self.caption,
            BlockRole::Body | BlockRole::ListItem | BlockRole::Label => self.body,
        }
    }

    /// Regular style for a block role. Headings and labels are bold.
    pub fn style_for(&self, role: BlockRole) -> ResolvedTextStyle {
        let tier = self.tier(role);
        let weight = match role {
            BlockRole::Heading(_) | BlockRole::Label => ResolvedTextStyle::BOLD_WEIGHT,
            _ => ResolvedTextStyle::REGULAR_WEIGHT,
        };
        ResolvedTextStyle {
            weight,
            italic: false,
            size: tier.size,
            line_height: tier.line_height,
            role,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let (page_width, page_height) = Self::A4;
        Self {
            page_width,
            page_height,
            margin_left: 56.0,
            margin_right: 56.0,
            margin_top: 56.0,
            margin_bottom: 42.0,
            heading1: TextTier::new(20.0, 1.6),
            heading2: TextTier::new(16.0, 1.6),
            heading3: TextTier::new(13.0, 1.5),
            body: TextTier::new(11.0, 1.5),
            caption: TextTier::new(9.0, 1.4),
            paragraph_gap: 8.0,
            heading_gap: 6.0,
            list_indent: 12.0,
            bullet_marker: "-".to_string(),
            rule_height: 12.0,
            rule_thickness: 0.75,
            image_max_width_ratio: 0.85,
            image_gap: 6.0,
            caption_placement: CaptionPlacement::default(),
            alt_text_captions: true,
            heading_keep_with_next_lines: 1,
            section_image_lookahead: 2,
            supplementary_title: "Supplementary Figures".to_string(),
            page_chrome: PageChromeConfig::default(),
        }
    }
}

/// Input span for wrapping.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledSpan {
    pub text: String,
    pub style: ResolvedTextStyle,
    /// Keep the span's words together on one line when possible.
    pub atomic: bool,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: ResolvedTextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            atomic: false,
        }
    }

    pub fn atomic(text: impl Into<String>, style: ResolvedTextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            atomic: true,
        }
    }
}

/// One styled piece of a fitted line.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedSegment {
    pub text: String,
    pub style: ResolvedTextStyle,
    /// Offset from the line start.
    pub x_offset: f32,
    pub width: f32,
}

/// A wrapped line ready for placement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FittedLine {
    pub segments: Vec<FittedSegment>,
    /// Measured width of the whole line.
    pub width: f32,
    /// Vertical advance required by the tallest segment.
    pub height: f32,
    /// The line exceeds the target width or was laid out without wrapping.
    pub degraded: bool,
}

impl FittedLine {
    /// Concatenated text with inter-segment spaces restored.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut end = 0.0f32;
        for seg in &self.segments {
            if !out.is_empty() && seg.x_offset > end + f32::EPSILON {
                out.push(' ');
            }
            out.push_str(&seg.text);
            end = seg.x_offset + seg.width;
        }
        out
    }

    /// Baseline offset from the line top for the tallest segment.
    pub fn baseline_offset(&self) -> f32 {
        self.segments
            .iter()
            .map(|seg| seg.style.baseline_offset())
            .fold(0.0, f32::max)
    }
}

#[derive(Clone, Debug)]
struct Word {
    text: String,
    style: ResolvedTextStyle,
    span: usize,
    atomic: bool,
    space_before: bool,
    width: f32,
}

/// Greedy word wrapper over a glyph-width oracle.
#[derive(Clone)]
pub struct LineWrapper {
    measurer: Arc<dyn TextMeasurer>,
}

impl core::fmt::Debug for LineWrapper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LineWrapper").finish_non_exhaustive()
    }
}

impl LineWrapper {
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> Self {
        Self { measurer }
    }

    pub fn measure(&self, text: &str, style: &ResolvedTextStyle) -> f32 {
        self.measurer.measure_text(text, style)
    }

    /// Wrap a single-style run.
    pub fn wrap(&self, text: &str, style: ResolvedTextStyle, max_width: f32) -> Vec<FittedLine> {
        self.wrap_spans(&[StyledSpan::new(text, style)], max_width)
    }

    /// Wrap mixed-style spans into lines no wider than `max_width`.
    ///
    /// Breaks happen only at whitespace. Pieces with no whitespace between
    /// them (e.g. a bold label followed by `:`) move together. Words of an
    /// atomic span move together unless the span alone is wider than a line.
    /// A single word wider than `max_width` sits alone on a degraded line. A
    /// non-positive `max_width` yields one degraded line.
    pub fn wrap_spans(&self, spans: &[StyledSpan], max_width: f32) -> Vec<FittedLine> {
        let words = self.words(spans);
        if words.is_empty() {
            return Vec::new();
        }
        if max_width <= 0.0 {
            let mut line = self.build_line(&words);
            line.degraded = true;
            return vec![line];
        }

        let mut units: Vec<Vec<Word>> = Vec::new();
        for unit in group_units(words) {
            if unit.len() > 1 && self.unit_width(&unit) > max_width {
                units.extend(split_unit(unit));
            } else {
                units.push(unit);
            }
        }

        let mut lines = Vec::new();
        let mut current: Vec<Word> = Vec::new();
        let mut x = 0.0f32;
        for mut unit in units {
            let width = self.unit_width(&unit);
            let gap = match (current.last(), unit.first()) {
                (Some(prev), Some(first)) if first.space_before => self.space_width(&prev.style),
                _ => 0.0,
            };
            if !current.is_empty() && x + gap + width > max_width {
                lines.push(self.finish_line(&current, max_width));
                current.clear();
                x = 0.0;
                if let Some(first) = unit.first_mut() {
                    first.space_before = false;
                }
                current.extend(unit);
                x += width;
                continue;
            }
            if current.is_empty() {
                if let Some(first) = unit.first_mut() {
                    first.space_before = false;
                }
            }
            x += gap + width;
            current.extend(unit);
        }
        if !current.is_empty() {
            lines.push(self.finish_line(&current, max_width));
        }
        lines
    }

    fn words(&self, spans: &[StyledSpan]) -> Vec<Word> {
        let mut words = Vec::new();
        let mut pending_space = false;
        for (span_idx, span) in spans.iter().enumerate() {
            let mut rest = span.text.as_str();
            loop {
                let trimmed = rest.trim_start();
                if trimmed.len() != rest.len() {
                    pending_space = true;
                }
                if trimmed.is_empty() {
                    break;
                }
                let end = trimmed
                    .find(char::is_whitespace)
                    .unwrap_or(trimmed.len());
                let text = &trimmed[..end];
                words.push(Word {
                    text: text.to_string(),
                    style: span.style,
                    span: span_idx,
                    atomic: span.atomic,
                    space_before: pending_space,
                    width: self.measure(text, &span.style),
                });
                pending_space = false;
                rest = &trimmed[end..];
            }
        }
        words
    }

    fn space_width(&self, style: &ResolvedTextStyle) -> f32 {
        self.measure(" ", style)
    }

    fn unit_width(&self, unit: &[Word]) -> f32 {
        let mut width = 0.0;
        for (idx, word) in unit.iter().enumerate() {
            if idx > 0 && word.space_before {
                width += self.space_width(&unit[idx - 1].style);
            }
            width += word.width;
        }
        width
    }

    fn finish_line(&self, words: &[Word], max_width: f32) -> FittedLine {
        let mut line = self.build_line(words);
        line.degraded = line.width > max_width;
        line
    }

    fn build_line(&self, words: &[Word]) -> FittedLine {
        let mut segments: Vec<FittedSegment> = Vec::new();
        let mut x = 0.0f32;
        for (idx, word) in words.iter().enumerate() {
            let gap = if idx > 0 && word.space_before {
                self.space_width(&words[idx - 1].style)
            } else {
                0.0
            };
            match segments.last_mut() {
                Some(seg) if seg.style == word.style => {
                    if gap > 0.0 {
                        seg.text.push(' ');
                    }
                    seg.text.push_str(&word.text);
                    seg.width = self.measure(&seg.text, &seg.style);
                    x = seg.x_offset + seg.width;
                }
                _ => {
                    x += gap;
                    segments.push(FittedSegment {
                        text: word.text.clone(),
                        style: word.style,
                        x_offset: x,
                        width: word.width,
                    });
                    x += word.width;
                }
            }
        }
        let height = segments
            .iter()
            .map(|seg| seg.style.line_advance())
            .fold(0.0, f32::max);
        FittedLine {
            segments,
            width: x,
            height,
            degraded: false,
        }
    }
}

/// Group words into unbreakable units.
fn group_units(words: Vec<Word>) -> Vec<Vec<Word>> {
    let mut units: Vec<Vec<Word>> = Vec::new();
    for word in words {
        let joins = match units.last().and_then(|unit| unit.last()) {
            Some(prev) => {
                !word.space_before || (word.atomic && prev.atomic && prev.span == word.span)
            }
            None => false,
        };
        match units.last_mut() {
            Some(unit) if joins => unit.push(word),
            _ => units.push(vec![word]),
        }
    }
    units
}

/// Re-split an oversized unit at its whitespace boundaries.
fn split_unit(unit: Vec<Word>) -> Vec<Vec<Word>> {
    let mut parts: Vec<Vec<Word>> = Vec::new();
    for word in unit {
        match parts.last_mut() {
            Some(part) if !word.space_before => part.push(word),
            _ => parts.push(vec![word]),
        }
    }
    parts
}
