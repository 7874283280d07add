use mdpage_render::{ResolvedTextStyle, TextMeasurer};

/// Advance width used for characters outside the printable ASCII tables.
const FALLBACK_ADVANCE: u16 = 556;

/// Helvetica advance widths in 1/1000 em for codes 32..=126.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advance widths in 1/1000 em for codes 32..=126.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Glyph-width oracle matching the base-14 Helvetica family the PDF writer
/// selects. Oblique faces share the upright advances.
#[derive(Clone, Copy, Debug, Default)]
pub struct HelveticaMeasurer;

impl HelveticaMeasurer {
    /// Advance of one character in 1/1000 em.
    pub fn advance(ch: char, bold: bool) -> u16 {
        let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
        (ch as usize)
            .checked_sub(32)
            .and_then(|idx| table.get(idx))
            .copied()
            .unwrap_or(FALLBACK_ADVANCE)
    }

    /// Width of `text` in points at `size`.
    pub fn width(text: &str, size: f32, bold: bool) -> f32 {
        let units: u32 = text
            .chars()
            .map(|ch| u32::from(Self::advance(ch, bold)))
            .sum();
        units as f32 / 1000.0 * size
    }
}

impl TextMeasurer for HelveticaMeasurer {
    fn measure_text(&self, text: &str, style: &ResolvedTextStyle) -> f32 {
        Self::width(text, style.size, style.is_bold())
    }
}
