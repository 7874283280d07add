use std::fs;
use std::path::PathBuf;

use mdpage::{
    extract_key_sections, sanitize, text_preview, Block, Document, DocumentError, ImageAssociator,
    RunStyle, Section,
};

const WEEKLY_REPORT: &str = "\
# \u{1F4CA} Weekly Report

## Summary

**Highlights**
- **Owner**: Platform team
- \u{2705} Released `v2.4` on time
See the [dashboard](https://example.com/d) for details.

![velocity](charts/velocity.png)
*Velocity over the last six sprints*

## Risk Analysis

Vendor API deprecation \u{2014} migration pending.

### Overdue Tasks

- Rotate credentials

---

## \u{1F3AF} Goals Until Next Sprint Meeting

- Ship the exporter

![burndown](charts/burndown.png)
";

fn blocks() -> Vec<Block> {
    Document::from_text(WEEKLY_REPORT)
        .expect("document")
        .classify()
}

#[test]
fn classifies_report_structure_in_source_order() {
    let kinds: Vec<&str> = blocks()
        .iter()
        .filter(|block| !matches!(block, Block::Blank))
        .map(|block| match block {
            Block::Heading { .. } => "heading",
            Block::BulletItem { .. } => "bullet",
            Block::Rule => "rule",
            Block::BoldLabel(_) => "label",
            Block::ImageRef(_) => "image",
            Block::Paragraph { .. } => "paragraph",
            Block::Blank => "blank",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "heading", "heading", "label", "bullet", "bullet", "paragraph", "image", "heading",
            "paragraph", "heading", "bullet", "rule", "heading", "bullet", "image",
        ]
    );
}

#[test]
fn inline_markup_is_cleaned_during_classification() {
    let blocks = blocks();
    let texts: Vec<String> = blocks
        .iter()
        .filter_map(|block| match block {
            Block::Paragraph { text, .. } | Block::BulletItem { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect();
    assert!(texts.contains(&"See the dashboard for details.".to_string()));
    assert!(texts.iter().any(|text| text.contains("Released v2.4 on time")));

    let owner = blocks
        .iter()
        .find_map(|block| match block {
            Block::BulletItem { runs, .. } if !runs.is_empty() => Some(runs.clone()),
            _ => None,
        })
        .expect("bullet with bold runs");
    assert_eq!(owner[0].text, "Owner");
    assert_eq!(owner[0].style, RunStyle::Bold);
}

#[test]
fn images_carry_section_and_caption() {
    let images: Vec<_> = blocks()
        .into_iter()
        .filter_map(|block| match block {
            Block::ImageRef(image) => Some(image),
            _ => None,
        })
        .collect();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].path, PathBuf::from("charts/velocity.png"));
    assert_eq!(
        images[0].caption.as_deref(),
        Some("Velocity over the last six sprints")
    );
    assert_eq!(
        images[0].section.as_ref().map(|s| s.title.as_str()),
        Some("Summary")
    );
    assert_eq!(images[1].caption, None);
    assert_eq!(images[1].section.as_ref().map(|s| s.ordinal), Some(2));
}

#[test]
fn associator_hands_out_each_image_once() {
    let blocks = blocks();
    let mut images = ImageAssociator::from_blocks(&blocks);
    assert_eq!(images.len(), 2);

    let summary = Section {
        ordinal: 0,
        title: "Summary".into(),
    };
    assert_eq!(images.images_for(&summary).len(), 1);
    assert!(images.images_for(&summary).is_empty());
    assert_eq!(images.remaining_images().len(), 1);
    assert_eq!(images.pending_count(), 0);
}

#[test]
fn sanitized_report_text_is_printable_ascii() {
    for line in WEEKLY_REPORT.lines() {
        let clean = sanitize(line);
        assert!(
            clean.chars().all(|ch| (' '..='~').contains(&ch)),
            "{:?} -> {:?}",
            line,
            clean
        );
    }
    assert_eq!(sanitize("\u{2705} Released"), "[done] Released");
    assert_eq!(sanitize("Caf\u{e9} \u{2014} ok"), "Cafe -- ok");
}

#[test]
fn key_sections_and_preview() {
    let sections = extract_key_sections(WEEKLY_REPORT);
    assert!(sections
        .risk_analysis
        .as_deref()
        .is_some_and(|body| body.contains("Vendor API deprecation")));
    assert!(sections
        .overdue_tasks
        .as_deref()
        .is_some_and(|body| body.contains("Rotate credentials")));
    assert!(sections
        .goals
        .as_deref()
        .is_some_and(|body| body.contains("Ship the exporter")));

    let preview = text_preview(WEEKLY_REPORT);
    assert!(!preview.contains("!["));
    assert!(preview.contains("Weekly Report"));
}

#[test]
fn reading_files_reports_failures() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blank = dir.path().join("blank.md");
    fs::write(&blank, "\n\n  \n").expect("write");
    assert!(matches!(Document::read(&blank), Err(DocumentError::Empty)));

    let binary = dir.path().join("binary.md");
    fs::write(&binary, [0xFFu8, 0xFE, 0x00]).expect("write");
    assert!(matches!(
        Document::read(&binary),
        Err(DocumentError::InvalidUtf8 { .. })
    ));

    assert!(matches!(
        Document::read(dir.path().join("missing.md")),
        Err(DocumentError::Io { .. })
    ));
}
