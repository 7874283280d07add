use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use mdpage_render::{
    DrawCommand, ImageCommand, LayoutConfig, PageChromeCommand, RenderPage, ResolvedTextStyle,
    RuleCommand, TextCommand,
};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};
use thiserror::Error;

use crate::metrics::HelveticaMeasurer;

/// zlib level for content streams and image data.
const DEFLATE_LEVEL: u8 = 6;

/// Base-14 faces registered on every document, indexed by [`font_slot`].
const FONTS: [(&str, &[u8]); 4] = [
    ("F1", b"Helvetica"),
    ("F2", b"Helvetica-Bold"),
    ("F3", b"Helvetica-Oblique"),
    ("F4", b"Helvetica-BoldOblique"),
];

/// PDF serialization error.
#[derive(Debug, Error)]
pub enum PdfError {
    /// Writing the output file failed.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// An image could not be decoded for embedding.
    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Serialize rendered pages into PDF bytes.
///
/// Page geometry comes from `layout`. Images that fail to decode are drawn
/// as an outlined box so the page keeps its flow.
pub fn render_pdf_bytes(pages: &[RenderPage], layout: &LayoutConfig) -> Vec<u8> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    let font_refs: Vec<Ref> = FONTS
        .iter()
        .map(|(_, base_font)| {
            let font_ref = alloc();
            pdf.type1_font(font_ref)
                .base_font(Name(*base_font))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            font_ref
        })
        .collect();

    let mut images = ImageTable::default();
    for cmd in pages.iter().flat_map(|page| page.content_commands.iter()) {
        if let DrawCommand::Image(image) = cmd {
            images.register(&mut pdf, &mut alloc, &image.src);
        }
    }

    let page_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = pages.iter().map(|_| alloc()).collect();

    let page_height = layout.page_height;
    for (page, content_id) in pages.iter().zip(&content_ids) {
        let mut content = Content::new();
        for cmd in page.merged_commands_iter() {
            match cmd {
                DrawCommand::Text(text) => draw_text(&mut content, text, page_height),
                DrawCommand::Rule(rule) => draw_rule(&mut content, rule, page_height),
                DrawCommand::Image(image) => {
                    draw_image(&mut content, image, images.name_for(&image.src), page_height)
                }
                DrawCommand::PageChrome(chrome) => {
                    draw_chrome(&mut content, chrome, layout, page_height)
                }
            }
        }
        let raw = content.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&raw, DEFLATE_LEVEL);
        pdf.stream(*content_id, &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    for (page_id, content_id) in page_ids.iter().zip(&content_ids) {
        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, layout.page_width, layout.page_height))
            .parent(pages_id)
            .contents(*content_id);
        let mut resources = page.resources();
        {
            let mut fonts = resources.fonts();
            for ((name, _), font_ref) in FONTS.iter().zip(&font_refs) {
                fonts.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if !images.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in images.entries() {
                xobjects.pair(Name(name.as_bytes()), xobj_ref);
            }
        }
    }

    debug!(
        "serialized {} pages with {} embedded images",
        pages.len(),
        images.len()
    );
    pdf.finish()
}

/// Serialize rendered pages and write them to `path`.
pub fn write_pdf(
    pages: &[RenderPage],
    layout: &LayoutConfig,
    path: impl AsRef<Path>,
) -> Result<(), PdfError> {
    let path = path.as_ref();
    let bytes = render_pdf_bytes(pages, layout);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PdfError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, bytes).map_err(|source| PdfError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Embedded image XObjects keyed by source path.
#[derive(Debug, Default)]
struct ImageTable {
    by_src: HashMap<String, Option<usize>>,
    objects: Vec<(String, Ref)>,
}

impl ImageTable {
    /// Decode and embed `src` once. Failed decodes are remembered so the
    /// image is not retried for every placement.
    fn register(&mut self, pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref, src: &str) {
        if self.by_src.contains_key(src) {
            return;
        }
        let slot = match decode_rgb(Path::new(src)) {
            Ok(decoded) => {
                let xobj_ref = alloc();
                let name = format!("Im{}", self.objects.len() + 1);
                let compressed =
                    miniz_oxide::deflate::compress_to_vec_zlib(&decoded.data, DEFLATE_LEVEL);
                let mut xobj = pdf.image_xobject(xobj_ref, &compressed);
                xobj.filter(Filter::FlateDecode);
                xobj.width(decoded.width as i32);
                xobj.height(decoded.height as i32);
                xobj.color_space().device_rgb();
                xobj.bits_per_component(8);
                self.objects.push((name, xobj_ref));
                Some(self.objects.len() - 1)
            }
            Err(err) => {
                warn!("{}; drawing placeholder box", err);
                None
            }
        };
        self.by_src.insert(src.to_string(), slot);
    }

    fn name_for(&self, src: &str) -> Option<&str> {
        let idx = self.by_src.get(src).copied().flatten()?;
        self.objects.get(idx).map(|(name, _)| name.as_str())
    }

    fn entries(&self) -> impl Iterator<Item = (&str, Ref)> + '_ {
        self.objects
            .iter()
            .map(|(name, xobj_ref)| (name.as_str(), *xobj_ref))
    }

    fn len(&self) -> usize {
        self.objects.len()
    }

    fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

struct DecodedImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

fn decode_rgb(path: &Path) -> Result<DecodedImage, PdfError> {
    let decoded = image::open(path).map_err(|source| PdfError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let rgb = decoded.to_rgb8();
    Ok(DecodedImage {
        width: rgb.width(),
        height: rgb.height(),
        data: rgb.into_raw(),
    })
}

fn font_slot(style: &ResolvedTextStyle) -> usize {
    match (style.is_bold(), style.italic) {
        (false, false) => 0,
        (true, false) => 1,
        (false, true) => 2,
        (true, true) => 3,
    }
}

/// Encode text for a WinAnsi base-14 font.
///
/// Render text is sanitized to printable ASCII before layout, so anything
/// else here becomes `?`.
fn to_winansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' => ch as u8,
            _ => b'?',
        })
        .collect()
}

fn show_text(content: &mut Content, font: &str, size: f32, x: f32, y: f32, text: &str) {
    let bytes = to_winansi_bytes(text);
    content
        .begin_text()
        .set_font(Name(font.as_bytes()), size)
        .next_line(x, y)
        .show(Str(&bytes))
        .end_text();
}

fn draw_text(content: &mut Content, cmd: &TextCommand, page_height: f32) {
    let (font, _) = FONTS[font_slot(&cmd.style)];
    show_text(
        content,
        font,
        cmd.style.size,
        cmd.x,
        page_height - cmd.baseline_y,
        &cmd.text,
    );
}

fn draw_rule(content: &mut Content, cmd: &RuleCommand, page_height: f32) {
    let y = page_height - cmd.y;
    content
        .save_state()
        .set_line_width(cmd.thickness)
        .set_stroke_gray(0.6)
        .move_to(cmd.x, y)
        .line_to(cmd.x + cmd.length, y)
        .stroke()
        .restore_state();
}

fn draw_image(content: &mut Content, cmd: &ImageCommand, name: Option<&str>, page_height: f32) {
    let bottom = page_height - cmd.y - cmd.height;
    match name {
        Some(name) => {
            content
                .save_state()
                .transform([cmd.width, 0.0, 0.0, cmd.height, cmd.x, bottom])
                .x_object(Name(name.as_bytes()))
                .restore_state();
        }
        None => {
            content
                .save_state()
                .set_line_width(0.5)
                .set_stroke_gray(0.5)
                .rect(cmd.x, bottom, cmd.width, cmd.height)
                .stroke()
                .restore_state();
        }
    }
}

fn draw_chrome(
    content: &mut Content,
    cmd: &PageChromeCommand,
    layout: &LayoutConfig,
    page_height: f32,
) {
    let Some(text) = cmd.text.as_deref() else {
        return;
    };
    let size = layout.caption.size;
    let width = HelveticaMeasurer::width(text, size, false);
    let x = ((layout.page_width - width) / 2.0).max(0.0);
    let (font, _) = FONTS[0];
    show_text(content, font, size, x, page_height - cmd.baseline_y, text);
}
