use std::collections::HashSet;
use std::path::Path;

use image::{ImageBuffer, Rgb};
use mdpage::{Document, ImageAssociator};
use mdpage_render::{
    DrawCommand, PageAnnotationKind, RenderConfig, RenderEngine, RenderEngineOptions,
};

fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
    ImageBuffer::from_pixel(width, height, Rgb([30u8, 90, 160]))
        .save(dir.join(name))
        .expect("write png fixture");
}

fn report_with_images(sections: usize, per_section: usize) -> String {
    let mut text = String::from("# Sprint Report\n![orphan](orphan.png)\n");
    for s in 0..sections {
        text.push_str(&format!("## Section {s}\n"));
        text.push_str("Narrative line one.\nNarrative line two.\n");
        for i in 0..per_section {
            text.push_str(&format!("![img-{s}-{i}](img-{s}-{i}.png)\n*Figure {s}.{i}*\n"));
        }
        text.push_str("Closing remark.\n\n");
    }
    text
}

#[test]
fn every_image_is_placed_exactly_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(dir.path(), "orphan.png", 80, 40);
    for s in 0..6 {
        for i in 0..3 {
            write_png(dir.path(), &format!("img-{s}-{i}.png"), 120, 60 + 20 * i as u32);
        }
    }
    let text = report_with_images(6, 3);
    let rendered = RenderEngine::new(RenderEngineOptions::default())
        .render_text(&text, RenderConfig::default().with_base_dir(dir.path()))
        .expect("render");

    let mut seen = HashSet::new();
    for page in &rendered.pages {
        for cmd in &page.content_commands {
            if let DrawCommand::Image(image) = cmd {
                assert!(seen.insert(image.alt.clone()), "{} placed twice", image.alt);
            }
        }
    }
    assert_eq!(seen.len(), 6 * 3 + 1);
    assert!(rendered.page_count() > 1);
    assert!(rendered.diagnostics.is_empty(), "{:?}", rendered.diagnostics);
}

#[test]
fn images_stay_inside_the_content_box() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(dir.path(), "orphan.png", 50, 400);
    for s in 0..4 {
        for i in 0..3 {
            write_png(dir.path(), &format!("img-{s}-{i}.png"), 100, 90);
        }
    }
    let opts = RenderEngineOptions::default();
    let cfg = opts.layout.clone();
    let rendered = RenderEngine::new(opts)
        .render_text(
            &report_with_images(4, 3),
            RenderConfig::default().with_base_dir(dir.path()),
        )
        .expect("render");
    for page in &rendered.pages {
        for cmd in &page.content_commands {
            if let DrawCommand::Image(image) = cmd {
                assert!(image.y >= cfg.content_top());
                assert!(image.y + image.height <= cfg.content_bottom() + 1e-3);
                assert!(image.x >= cfg.content_left());
                assert!(image.x + image.width <= cfg.content_left() + cfg.content_width() + 1e-3);
            }
        }
        let annotated = page
            .annotations
            .iter()
            .filter(|a| a.kind == PageAnnotationKind::ImageSrc)
            .count();
        let placed = page
            .content_commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCommand::Image(_)))
            .count();
        assert_eq!(annotated, placed);
    }
}

#[test]
fn orphan_image_lands_in_trailing_section() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_png(dir.path(), "orphan.png", 80, 40);
    for i in 0..1 {
        write_png(dir.path(), &format!("img-0-{i}.png"), 80, 40);
    }
    let rendered = RenderEngine::new(RenderEngineOptions::default())
        .render_text(
            &report_with_images(1, 1),
            RenderConfig::default().with_base_dir(dir.path()),
        )
        .expect("render");
    let last = rendered.pages.last().expect("pages");
    let texts = last.text_lines();
    let heading = texts
        .iter()
        .position(|t| *t == "Supplementary Figures")
        .expect("supplementary heading");
    assert_eq!(texts[heading + 1], "orphan");
    assert!(matches!(
        last.content_commands.iter().rev().nth(1),
        Some(DrawCommand::Image(image)) if image.alt == "orphan"
    ));
}

#[test]
fn associator_partitions_document_images() {
    let doc = Document::from_text(&report_with_images(3, 2)).expect("document");
    let blocks = doc.classify();
    let mut images = ImageAssociator::from_blocks(&blocks);
    let total = images.len();
    let mut delivered = Vec::new();
    for block in &blocks {
        if let mdpage::Block::ImageRef(image) = block {
            if let Some(section) = &image.section {
                delivered.extend(images.images_for(section).into_iter().map(|img| img.id));
            }
        }
    }
    delivered.extend(images.remaining_images().into_iter().map(|img| img.id));
    delivered.sort_unstable();
    let expected: Vec<usize> = (0..total).collect();
    assert_eq!(delivered, expected);
}
