use log::{debug, info, warn};
use mdpage::{sanitize, Block, BlockRole, Document, DocumentError, ImageAssociator, ImageRef, Section};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::render_assets::{prepare_image, resolve_asset_path, AssetLoader, FsAssetLoader};
use crate::render_flow::PageFlow;
use crate::render_ir::{
    DrawCommand, ImageCommand, PageAnnotation, PageAnnotationKind, PageChromeCommand,
    PageChromeKind, RenderPage, RuleCommand, TextCommand,
};
use crate::render_layout::{
    CaptionPlacement, FittedLine, HeuristicMeasurer, LayoutConfig, LineWrapper, StyledSpan,
    TextMeasurer,
};
use crate::render_persist;

/// Degraded-layout and asset conditions observed during a render.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderDiagnostic {
    /// A single word is wider than the line it was placed on.
    WordOverflow {
        page: usize,
        text: String,
        width: f32,
        max_width: f32,
    },
    /// Text was laid out without wrapping because the available width was not positive.
    NoWrapWidth { page: usize, text: String },
    /// An image was shrunk below its preferred width to fit the page.
    ImageScaled { page: usize, src: String },
    /// An image asset could not be used and was left out.
    AssetSkipped { src: String, reason: String },
}

impl fmt::Display for RenderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WordOverflow {
                page,
                text,
                width,
                max_width,
            } => write!(
                f,
                "page {}: '{}' overflows the line ({:.1} > {:.1})",
                page, text, width, max_width
            ),
            Self::NoWrapWidth { page, text } => {
                write!(f, "page {}: no room to wrap '{}'", page, text)
            }
            Self::ImageScaled { page, src } => {
                write!(f, "page {}: image {} scaled down to fit", page, src)
            }
            Self::AssetSkipped { src, reason } => {
                write!(f, "image {} skipped: {}", src, reason)
            }
        }
    }
}

type DiagnosticCallback = Arc<Mutex<Box<dyn FnMut(&RenderDiagnostic) + Send + 'static>>>;

/// Render-engine options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderEngineOptions {
    /// Layout options used to produce pages.
    pub layout: LayoutConfig,
}

impl RenderEngineOptions {
    /// Build options for a target page size.
    pub fn for_page(width: f32, height: f32) -> Self {
        Self {
            layout: LayoutConfig::for_page(width, height),
        }
    }
}

/// Per-run configuration.
#[derive(Clone, Default)]
pub struct RenderConfig {
    base_dir: Option<PathBuf>,
    text_measurer: Option<Arc<dyn TextMeasurer>>,
    asset_loader: Option<Arc<dyn AssetLoader>>,
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("base_dir", &self.base_dir)
            .field("has_text_measurer", &self.text_measurer.is_some())
            .field("has_asset_loader", &self.asset_loader.is_some())
            .finish()
    }
}

impl RenderConfig {
    /// Directory that relative image paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Attach a glyph-width measurer used by line layout.
    pub fn with_text_measurer(mut self, measurer: Arc<dyn TextMeasurer>) -> Self {
        self.text_measurer = Some(measurer);
        self
    }

    /// Replace the filesystem image prober.
    pub fn with_asset_loader(mut self, loader: Arc<dyn AssetLoader>) -> Self {
        self.asset_loader = Some(loader);
        self
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }
}

/// Pages and diagnostics of one render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedDocument {
    pub pages: Vec<RenderPage>,
    pub diagnostics: Vec<RenderDiagnostic>,
}

impl RenderedDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Serialize pages to the JSON page dump format.
    pub fn to_json(&self) -> Result<String, RenderEngineError> {
        render_persist::pages_to_json(&self.pages)
    }

    /// Write the JSON page dump to `path`.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), RenderEngineError> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json).map_err(|source| RenderEngineError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Render engine for document -> page conversion.
#[derive(Clone, Default)]
pub struct RenderEngine {
    opts: RenderEngineOptions,
    diagnostic_sink: Option<DiagnosticCallback>,
}

impl fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEngine")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl RenderEngine {
    /// Create a render engine.
    pub fn new(opts: RenderEngineOptions) -> Self {
        Self {
            opts,
            diagnostic_sink: None,
        }
    }

    pub fn options(&self) -> &RenderEngineOptions {
        &self.opts
    }

    /// Register or replace the diagnostics sink.
    ///
    /// Clones of this engine share the sink, so concurrent renders call it
    /// from several threads behind its mutex. Everything else a render pass
    /// touches is owned by that pass.
    pub fn set_diagnostic_sink<F>(&mut self, sink: F)
    where
        F: FnMut(&RenderDiagnostic) + Send + 'static,
    {
        self.diagnostic_sink = Some(Arc::new(Mutex::new(Box::new(sink))));
    }

    /// Render in-memory document text.
    pub fn render_text(
        &self,
        text: &str,
        config: RenderConfig,
    ) -> Result<RenderedDocument, RenderEngineError> {
        let doc = Document::from_text(text)?;
        Ok(self.render_document(&doc, config))
    }

    /// Render a document file. Relative image paths resolve against the
    /// file's directory unless the config names a base directory.
    pub fn render_file(
        &self,
        path: impl AsRef<Path>,
        config: RenderConfig,
    ) -> Result<RenderedDocument, RenderEngineError> {
        let path = path.as_ref();
        let doc = Document::read(path)?;
        let config = match path.parent() {
            Some(parent) if config.base_dir.is_none() => config.with_base_dir(parent),
            _ => config,
        };
        Ok(self.render_document(&doc, config))
    }

    /// Render a loaded document.
    pub fn render_document(&self, doc: &Document, config: RenderConfig) -> RenderedDocument {
        self.render_blocks(&doc.classify(), config)
    }

    /// Render classified blocks.
    pub fn render_blocks(&self, blocks: &[Block], config: RenderConfig) -> RenderedDocument {
        let measurer = config
            .text_measurer
            .clone()
            .unwrap_or_else(|| Arc::new(HeuristicMeasurer));
        let loader = config
            .asset_loader
            .clone()
            .unwrap_or_else(|| Arc::new(FsAssetLoader));
        let mut pass = RenderPass {
            cfg: &self.opts.layout,
            wrapper: LineWrapper::new(measurer),
            loader,
            base_dir: config.base_dir(),
            flow: PageFlow::new(&self.opts.layout),
            images: ImageAssociator::from_blocks(blocks),
            pending: Vec::new(),
            lookahead: 0,
            sections_seen: 0,
            diagnostics: Vec::new(),
            sink: self.diagnostic_sink.as_ref(),
        };
        pass.run(blocks);
        let rendered = pass.finish();
        info!(
            "rendered {} blocks into {} pages ({} diagnostics)",
            blocks.len(),
            rendered.pages.len(),
            rendered.diagnostics.len()
        );
        rendered
    }
}

/// State of one document pass.
struct RenderPass<'a> {
    cfg: &'a LayoutConfig,
    wrapper: LineWrapper,
    loader: Arc<dyn AssetLoader>,
    base_dir: Option<&'a Path>,
    flow: PageFlow,
    images: ImageAssociator,
    /// Images of the last section heading awaiting insertion.
    pending: Vec<ImageRef>,
    /// Prose blocks still allowed before `pending` is inserted.
    lookahead: usize,
    sections_seen: usize,
    diagnostics: Vec<RenderDiagnostic>,
    sink: Option<&'a DiagnosticCallback>,
}

impl RenderPass<'_> {
    fn run(&mut self, blocks: &[Block]) {
        for (idx, block) in blocks.iter().enumerate() {
            let rest = &blocks[idx + 1..];
            match block {
                Block::Heading { level, text } => {
                    self.flush_pending();
                    self.emit_heading(*level, text, next_content(rest).is_some());
                    if *level == 2 {
                        self.open_section(text, rest);
                    }
                }
                Block::Blank => self.flow.add_gap(self.cfg.paragraph_gap),
                Block::Rule => {
                    self.flush_pending();
                    self.emit_rule();
                }
                Block::ImageRef(image) => {
                    self.flush_pending();
                    if image.section.is_none() {
                        debug!("image {} deferred to supplementary section", image.id);
                    }
                }
                Block::BulletItem { .. } | Block::Paragraph { .. } | Block::BoldLabel(_) => {
                    self.emit_prose(block);
                    if !self.pending.is_empty() {
                        self.lookahead = self.lookahead.saturating_sub(1);
                        if self.lookahead == 0 {
                            self.flush_pending();
                        }
                    }
                }
            }
        }
        self.flush_pending();

        let remaining = self.images.remaining_images();
        if !remaining.is_empty() {
            debug!("{} images without a rendered section", remaining.len());
            let title = self.cfg.supplementary_title.clone();
            self.emit_heading(2, &title, true);
            for image in &remaining {
                self.emit_image(image);
            }
        }
    }

    fn open_section(&mut self, title: &str, rest: &[Block]) {
        let section = Section {
            ordinal: self.sections_seen,
            title: title.to_string(),
        };
        self.sections_seen += 1;
        self.pending = self.images.images_for(&section);
        self.lookahead = self.cfg.section_image_lookahead;
        let prose_follows = next_content(rest).is_some_and(Block::is_prose);
        if self.lookahead == 0 || !prose_follows {
            self.flush_pending();
        }
    }

    fn flush_pending(&mut self) {
        let pending = core::mem::take(&mut self.pending);
        for image in &pending {
            self.emit_image(image);
        }
    }

    fn finish(self) -> RenderedDocument {
        let cfg = self.cfg;
        let mut pages = self.flow.finish();
        if cfg.page_chrome.footer_enabled {
            let total = pages.len();
            let baseline_y = cfg.page_height - cfg.page_chrome.footer_baseline_from_bottom;
            for page in &mut pages {
                let current = page.page_number;
                page.push_chrome_command(DrawCommand::PageChrome(PageChromeCommand {
                    kind: PageChromeKind::Footer,
                    text: Some(format!("Page {} of {}", current, total)),
                    baseline_y,
                    current: Some(current),
                    total: Some(total),
                }));
            }
        }
        RenderedDocument {
            pages,
            diagnostics: self.diagnostics,
        }
    }

    fn report(&mut self, diagnostic: RenderDiagnostic) {
        warn!("{}", diagnostic);
        if let Some(sink) = self.sink {
            if let Ok(mut sink) = sink.lock() {
                sink(&diagnostic);
            }
        }
        self.diagnostics.push(diagnostic);
    }

    fn emit_heading(&mut self, level: u8, text: &str, keep_with_next: bool) {
        let style = self.cfg.style_for(BlockRole::Heading(level));
        let width = self.cfg.content_width();
        let lines = self
            .wrapper
            .wrap(&sanitize(text), style, width);
        if lines.is_empty() {
            return;
        }
        self.flow.add_gap(self.cfg.heading_gap);
        let mut needed: f32 = lines.iter().map(|line| line.height).sum();
        if keep_with_next {
            let body = self.cfg.style_for(BlockRole::Body).line_advance();
            needed += body * f32::from(self.cfg.heading_keep_with_next_lines);
        }
        if self.flow.ensure(needed) {
            debug!("heading '{}' moved to page {}", text, self.flow.page_number());
        }
        if level == 2 {
            self.flow
                .annotate(PageAnnotation::new(PageAnnotationKind::Section, text));
        }
        let x = self.cfg.content_left();
        self.place_lines(&lines, |_| x, width);
    }

    fn emit_prose(&mut self, block: &Block) {
        let Some(role) = block.role() else {
            return;
        };
        let base = self.cfg.style_for(role);
        let spans: Vec<StyledSpan> = block
            .runs()
            .into_iter()
            .map(|run| {
                let text = sanitize(&run.text).into_owned();
                if run.is_bold() {
                    StyledSpan::atomic(text, base.bold())
                } else {
                    StyledSpan::new(text, base)
                }
            })
            .collect();

        let left = self.cfg.content_left();
        if role == BlockRole::ListItem {
            let indent = self.cfg.list_indent;
            let width = self.cfg.content_width() - indent;
            let lines = self.wrapper.wrap_spans(&spans, width);
            let Some(first) = lines.first() else {
                return;
            };
            self.flow.ensure(first.height);
            let marker_baseline = self.flow.y() + first.baseline_offset();
            let marker = sanitize(&self.cfg.bullet_marker).into_owned();
            self.flow.push(DrawCommand::Text(TextCommand {
                x: left,
                baseline_y: marker_baseline,
                text: marker,
                style: base,
            }));
            self.place_lines(&lines, |_| left + indent, width);
        } else {
            let width = self.cfg.content_width();
            let lines = self.wrapper.wrap_spans(&spans, width);
            self.place_lines(&lines, |_| left, width);
        }
    }

    fn emit_rule(&mut self) {
        let height = self.cfg.rule_height;
        self.flow.ensure(height);
        self.flow.push(DrawCommand::Rule(RuleCommand {
            x: self.cfg.content_left(),
            y: self.flow.y() + height / 2.0,
            length: self.cfg.content_width(),
            thickness: self.cfg.rule_thickness,
        }));
        self.flow.advance(height);
    }

    fn emit_image(&mut self, image: &ImageRef) {
        let cfg = self.cfg;
        let content_w = cfg.content_width();
        let caption_style = cfg.style_for(BlockRole::Caption);

        let alt_lines = if cfg.alt_text_captions && !image.alt.is_empty() {
            self.wrapper
                .wrap(&sanitize(&image.alt), caption_style, content_w)
        } else {
            Vec::new()
        };
        let source_lines = image
            .caption
            .as_deref()
            .map(|caption| {
                self.wrapper
                    .wrap(&sanitize(caption), caption_style.italic(), content_w)
            })
            .unwrap_or_default();
        let captions_h: f32 = alt_lines
            .iter()
            .chain(source_lines.iter())
            .map(|line| line.height)
            .sum();

        let path = resolve_asset_path(self.base_dir, &image.path);
        let src = path.display().to_string();
        // Captions that leave no room on a page flow onto the next one; the
        // image itself always fits a fresh page.
        let image_capacity = (self.flow.page_capacity() - 2.0 * cfg.image_gap).max(1.0);
        let max_h = match image_capacity - captions_h {
            with_captions if with_captions > 0.0 => with_captions,
            _ => image_capacity,
        };
        let placed = match prepare_image(
            self.loader.as_ref(),
            path,
            content_w * cfg.image_max_width_ratio,
            max_h,
        ) {
            Ok(placed) => placed,
            Err(err) => {
                self.report(RenderDiagnostic::AssetSkipped {
                    src,
                    reason: err.to_string(),
                });
                return;
            }
        };

        self.flow.add_gap(cfg.image_gap);
        self.flow.ensure(placed.height + captions_h + cfg.image_gap);
        let left = cfg.content_left();
        let centered = move |line: &FittedLine| left + ((content_w - line.width) / 2.0).max(0.0);

        if cfg.caption_placement == CaptionPlacement::Above {
            self.place_lines(&source_lines, centered, content_w);
        }
        self.flow.ensure(placed.height);
        let y = self.flow.y();
        self.flow.push(DrawCommand::Image(ImageCommand {
            src: src.clone(),
            alt: image.alt.clone(),
            x: left + (content_w - placed.width) / 2.0,
            y,
            width: placed.width,
            height: placed.height,
        }));
        self.flow
            .annotate(PageAnnotation::new(PageAnnotationKind::ImageSrc, src.clone()));
        self.flow.advance(placed.height);
        if placed.scaled {
            let page = self.flow.page_number();
            self.report(RenderDiagnostic::ImageScaled { page, src });
        }
        self.place_lines(&alt_lines, centered, content_w);
        if cfg.caption_placement == CaptionPlacement::Below {
            self.place_lines(&source_lines, centered, content_w);
        }
        self.flow.add_gap(cfg.image_gap);
    }

    /// Place fitted lines one under another, breaking pages between lines.
    fn place_lines(
        &mut self,
        lines: &[FittedLine],
        line_x: impl Fn(&FittedLine) -> f32,
        max_width: f32,
    ) {
        for line in lines {
            self.flow.ensure(line.height);
            let x = line_x(line);
            let baseline_y = self.flow.y() + line.baseline_offset();
            for seg in &line.segments {
                self.flow.push(DrawCommand::Text(TextCommand {
                    x: x + seg.x_offset,
                    baseline_y,
                    text: seg.text.clone(),
                    style: seg.style,
                }));
            }
            if line.degraded {
                self.flag_degraded(line, max_width);
            }
            self.flow.advance(line.height);
        }
    }

    fn flag_degraded(&mut self, line: &FittedLine, max_width: f32) {
        let page = self.flow.page_number();
        let text = line.text();
        self.flow
            .annotate(PageAnnotation::new(PageAnnotationKind::DegradedLayout, text.clone()));
        let diagnostic = if max_width <= 0.0 {
            RenderDiagnostic::NoWrapWidth { page, text }
        } else {
            RenderDiagnostic::WordOverflow {
                page,
                text,
                width: line.width,
                max_width,
            }
        };
        self.report(diagnostic);
    }
}

/// First non-blank block.
fn next_content(rest: &[Block]) -> Option<&Block> {
    rest.iter().find(|block| !matches!(block, Block::Blank))
}

/// Render engine error.
#[derive(Debug, Error)]
pub enum RenderEngineError {
    /// The document could not be loaded or has no content.
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// Writing render output failed.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The page dump could not be encoded or decoded.
    #[error("page dump serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The page dump was written by an incompatible version.
    #[error("unsupported page dump schema version {found}")]
    UnsupportedSchema { found: u8 },
}
