//! Map text onto the glyph set of the base PDF fonts.
//!
//! The renderable set is printable ASCII. Known symbols become short words,
//! accented letters lose their marks, emoji become bracketed tags and any
//! other character collapses to [`PLACEHOLDER`]. Every substitution yields
//! renderable characters only, which makes [`sanitize`] idempotent.

use std::borrow::Cow;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Replacement for characters with no known approximation.
pub const PLACEHOLDER: char = '?';

/// Whether `ch` renders with the active font as-is.
pub fn is_representable(ch: char) -> bool {
    matches!(ch, ' '..='~')
}

/// Return a copy of `text` containing only representable characters.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_representable) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if is_representable(ch) {
            out.push(ch);
        } else if is_combining_mark(ch) {
            // decomposed input: the base letter was already pushed
        } else if let Some(sub) = substitution(ch) {
            out.push_str(sub);
        } else if let Some(base) = strip_marks(ch) {
            out.push_str(&base);
        } else {
            out.push(PLACEHOLDER);
        }
    }
    Cow::Owned(out)
}

fn strip_marks(ch: char) -> Option<String> {
    let base: String = ch.nfd().filter(|c| !is_combining_mark(*c)).collect();
    if !base.is_empty() && base.chars().all(is_representable) {
        Some(base)
    } else {
        None
    }
}

fn substitution(ch: char) -> Option<&'static str> {
    let sub = match ch {
        // whitespace and invisible joiners
        '\t' | '\n' | '\r' | '\u{00A0}' | '\u{2002}' | '\u{2003}' | '\u{2009}' => " ",
        '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FE0E}' | '\u{FE0F}' | '\u{00AD}' => "",

        // punctuation
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' => "-",
        '\u{2014}' | '\u{2015}' => "--",
        '\u{2026}' => "...",
        '\u{2022}' | '\u{00B7}' | '\u{25CF}' | '\u{25AA}' => "-",
        '\u{00AB}' => "<<",
        '\u{00BB}' => ">>",

        // symbols
        '\u{2192}' | '\u{27A1}' => "->",
        '\u{2190}' | '\u{2B05}' => "<-",
        '\u{2191}' | '\u{2B06}' => "^",
        '\u{2193}' | '\u{2B07}' => "v",
        '\u{2194}' => "<->",
        '\u{00D7}' => "x",
        '\u{00F7}' => "/",
        '\u{2264}' => "<=",
        '\u{2265}' => ">=",
        '\u{2260}' => "!=",
        '\u{00B1}' => "+/-",
        '\u{2248}' => "~",
        '\u{00B0}' => " deg",
        '\u{00A9}' => "(c)",
        '\u{00AE}' => "(R)",
        '\u{2122}' => "(TM)",
        '\u{20AC}' => "EUR",
        '\u{00A3}' => "GBP",
        '\u{00A5}' => "JPY",
        '\u{00BD}' => "1/2",
        '\u{00BC}' => "1/4",
        '\u{00BE}' => "3/4",
        '\u{2030}' => "%o",
        '\u{00A7}' => "S.",

        // letters without a canonical decomposition
        '\u{00DF}' => "ss",
        '\u{00C6}' => "AE",
        '\u{00E6}' => "ae",
        '\u{0152}' => "OE",
        '\u{0153}' => "oe",
        '\u{00D8}' => "O",
        '\u{00F8}' => "o",
        '\u{0141}' => "L",
        '\u{0142}' => "l",
        '\u{0110}' | '\u{00D0}' => "D",
        '\u{0111}' | '\u{00F0}' => "d",
        '\u{00DE}' => "Th",
        '\u{00FE}' => "th",
        '\u{0131}' => "i",

        // status markers
        '\u{2705}' | '\u{2714}' | '\u{2713}' | '\u{2611}' => "[done]",
        '\u{274C}' | '\u{2716}' | '\u{2717}' | '\u{2718}' => "[x]",
        '\u{26A0}' => "[warning]",
        '\u{2757}' | '\u{2755}' => "[!]",
        '\u{2753}' | '\u{2754}' => "[?]",
        '\u{23F0}' | '\u{23F3}' | '\u{231B}' => "[deadline]",
        '\u{2B50}' | '\u{2605}' | '\u{1F31F}' => "[star]",
        '\u{1F534}' => "[red]",
        '\u{1F7E0}' => "[orange]",
        '\u{1F7E1}' => "[yellow]",
        '\u{1F7E2}' => "[green]",
        '\u{1F535}' => "[blue]",
        '\u{1F6A8}' => "[alert]",
        '\u{1F6A7}' => "[blocked]",
        '\u{1F6AB}' | '\u{26D4}' => "[stop]",

        // report emoji
        '\u{1F3AF}' => "[goal]",
        '\u{1F389}' | '\u{1F38A}' => "[celebrate]",
        '\u{1F61F}' | '\u{1F615}' | '\u{1F641}' => "[concern]",
        '\u{1F4CA}' => "[chart]",
        '\u{1F4C8}' => "[up]",
        '\u{1F4C9}' => "[down]",
        '\u{1F4C5}' | '\u{1F4C6}' | '\u{1F5D3}' => "[calendar]",
        '\u{1F4CB}' | '\u{1F4DD}' => "[notes]",
        '\u{1F4CC}' | '\u{1F4CD}' => "[pin]",
        '\u{1F4A1}' => "[idea]",
        '\u{1F680}' => "[launch]",
        '\u{1F525}' => "[hot]",
        '\u{1F44D}' => "[+1]",
        '\u{1F44E}' => "[-1]",
        '\u{1F465}' | '\u{1F464}' => "[team]",
        '\u{1F50D}' | '\u{1F50E}' => "[search]",
        '\u{1F512}' => "[locked]",
        '\u{1F527}' | '\u{1F6E0}' => "[fix]",
        '\u{1F41B}' => "[bug]",
        '\u{1F3C6}' | '\u{1F947}' => "[award]",
        '\u{1F4AA}' => "[strong]",
        '\u{1F914}' => "[think]",
        '\u{1F440}' => "[review]",
        '\u{23E9}' | '\u{25B6}' => "[next]",
        _ => return None,
    };
    Some(sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through_borrowed() {
        let text = "Sprint 12: 93.0% done";
        assert!(matches!(sanitize(text), Cow::Borrowed(_)));
    }

    #[test]
    fn emoji_become_bracketed_tags() {
        assert_eq!(sanitize("\u{1F3AF} Goals"), "[goal] Goals");
        assert_eq!(sanitize("\u{2705} Done"), "[done] Done");
        assert_eq!(sanitize("\u{26A0}\u{FE0F} Risk"), "[warning] Risk");
    }

    #[test]
    fn accented_letters_lose_marks() {
        assert_eq!(sanitize("Jos\u{00E9} M\u{00FC}ller"), "Jose Muller");
        assert_eq!(sanitize("Stra\u{00DF}e"), "Strasse");
        assert_eq!(sanitize("\u{00C5}ngstr\u{00F6}m"), "Angstrom");
    }

    #[test]
    fn decomposed_marks_are_dropped() {
        assert_eq!(sanitize("Jose\u{0301}"), "Jose");
        assert_eq!(sanitize("Jose\u{0301} Mu\u{0308}ller"), "Jose Muller");
        assert_eq!(sanitize("\u{0301}alone"), "alone");
    }

    #[test]
    fn symbols_become_words() {
        assert_eq!(sanitize("a \u{2192} b"), "a -> b");
        assert_eq!(sanitize("\u{201C}quoted\u{201D} \u{2014} ok\u{2026}"), "\"quoted\" -- ok...");
    }

    #[test]
    fn unknown_characters_use_placeholder() {
        assert_eq!(sanitize("\u{4E2D}\u{6587}"), "??");
        assert_eq!(sanitize("\u{1F9A9}"), "?");
        assert_eq!(sanitize("\u{0007}"), "?");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let samples = [
            "",
            "plain",
            "\u{1F3AF} Goals Until Next Sprint Meeting",
            "Caf\u{00E9} \u{2014} na\u{00EF}ve r\u{00E9}sum\u{00E9}",
            "\u{4E2D}\u{6587} mixed \u{1F600} text\t\u{00A0}end",
            "\u{0391}\u{03AC}\u{03B2}",
            "e\u{0301} combining",
        ];
        for sample in samples {
            let once = sanitize(sample).into_owned();
            let twice = sanitize(&once).into_owned();
            assert_eq!(once, twice, "sample {sample:?}");
            assert!(once.chars().all(is_representable), "sample {sample:?}");
        }
    }
}
