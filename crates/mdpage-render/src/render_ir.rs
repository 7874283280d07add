use core::fmt;
use mdpage::BlockRole;

type LayerCommandIter<'a> =
    core::iter::Chain<core::slice::Iter<'a, DrawCommand>, core::slice::Iter<'a, DrawCommand>>;

/// Page represented as backend-agnostic draw commands.
///
/// Coordinates are page units (PDF points) with the origin at the top-left
/// corner and y growing downward.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderPage {
    /// 1-based page number.
    pub page_number: usize,
    /// Content-layer draw commands (deterministic pagination output).
    pub content_commands: Vec<DrawCommand>,
    /// Chrome-layer draw commands (footer and similar).
    pub chrome_commands: Vec<DrawCommand>,
    /// Structured non-draw annotations associated with this page.
    pub annotations: Vec<PageAnnotation>,
}

impl RenderPage {
    const INITIAL_CONTENT_COMMAND_CAPACITY: usize = 16;

    /// Create an empty page.
    pub fn new(page_number: usize) -> Self {
        Self {
            page_number,
            content_commands: Vec::with_capacity(0),
            chrome_commands: Vec::with_capacity(0),
            annotations: Vec::with_capacity(0),
        }
    }

    /// Push a content-layer command.
    pub fn push_content_command(&mut self, cmd: DrawCommand) {
        if self.content_commands.capacity() == 0 {
            self.content_commands
                .reserve(Self::INITIAL_CONTENT_COMMAND_CAPACITY);
        }
        self.content_commands.push(cmd);
    }

    /// Push a chrome-layer command.
    pub fn push_chrome_command(&mut self, cmd: DrawCommand) {
        self.chrome_commands.push(cmd);
    }

    /// Attach a structured annotation.
    pub fn push_annotation(&mut self, annotation: PageAnnotation) {
        self.annotations.push(annotation);
    }

    /// Iterate content then chrome commands.
    pub fn merged_commands_iter(&self) -> LayerCommandIter<'_> {
        self.content_commands
            .iter()
            .chain(self.chrome_commands.iter())
    }

    pub fn merged_commands_len(&self) -> usize {
        self.content_commands.len() + self.chrome_commands.len()
    }

    /// True when no content has been placed on the page.
    pub fn is_empty(&self) -> bool {
        self.content_commands.is_empty()
    }

    /// Text of every content text command in placement order.
    pub fn text_lines(&self) -> Vec<&str> {
        self.content_commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Structured page annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageAnnotation {
    /// Stable annotation kind/tag.
    pub kind: PageAnnotationKind,
    /// Optional annotation payload.
    pub value: Option<String>,
}

impl PageAnnotation {
    pub fn new(kind: PageAnnotationKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
        }
    }
}

/// Structured page annotation kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PageAnnotationKind {
    /// Source path of an image placed on the page.
    ImageSrc,
    /// Section heading that starts on the page.
    Section,
    /// A line on the page overflows or was laid out without wrapping.
    DegradedLayout,
    /// Forward-compatible fallback for unknown string tags.
    Unknown(String),
}

impl PageAnnotationKind {
    /// Canonical string form used by persisted payloads.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ImageSrc => "image_src",
            Self::Section => "section",
            Self::DegradedLayout => "degraded_layout",
            Self::Unknown(value) => value.as_str(),
        }
    }
}

impl From<&str> for PageAnnotationKind {
    fn from(value: &str) -> Self {
        match value {
            "image_src" => Self::ImageSrc,
            "section" => Self::Section,
            "degraded_layout" => Self::DegradedLayout,
            _ => Self::Unknown(value.to_string()),
        }
    }
}

impl From<String> for PageAnnotationKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "image_src" | "section" | "degraded_layout" => Self::from(value.as_str()),
            _ => Self::Unknown(value),
        }
    }
}

impl fmt::Display for PageAnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Layout output commands.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Draw text.
    Text(TextCommand),
    /// Draw a horizontal rule.
    Rule(RuleCommand),
    /// Draw an image.
    Image(ImageCommand),
    /// Draw page chrome.
    PageChrome(PageChromeCommand),
}

/// Resolved style passed to renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedTextStyle {
    /// Numeric weight.
    pub weight: u16,
    /// Italic flag.
    pub italic: bool,
    /// Size in points.
    pub size: f32,
    /// Line height multiplier.
    pub line_height: f32,
    /// Semantic role.
    pub role: BlockRole,
}

impl ResolvedTextStyle {
    pub const BOLD_WEIGHT: u16 = 700;
    pub const REGULAR_WEIGHT: u16 = 400;

    pub fn is_bold(&self) -> bool {
        self.weight >= Self::BOLD_WEIGHT
    }

    /// Same style with bold weight.
    pub fn bold(self) -> Self {
        Self {
            weight: Self::BOLD_WEIGHT,
            ..self
        }
    }

    /// Same style with italic on.
    pub fn italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }

    /// Vertical advance of one line in this style.
    pub fn line_advance(&self) -> f32 {
        self.size * self.line_height
    }

    /// Distance from the line top to the text baseline.
    pub fn baseline_offset(&self) -> f32 {
        let leading = (self.line_advance() - self.size).max(0.0);
        leading / 2.0 + self.size * 0.8
    }
}

/// Text draw command.
#[derive(Clone, Debug, PartialEq)]
pub struct TextCommand {
    /// Left x.
    pub x: f32,
    /// Baseline y.
    pub baseline_y: f32,
    /// Content.
    pub text: String,
    /// Resolved style.
    pub style: ResolvedTextStyle,
}

/// Rule draw command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuleCommand {
    /// Start x.
    pub x: f32,
    /// Center y of the stroke.
    pub y: f32,
    /// Length.
    pub length: f32,
    /// Stroke thickness.
    pub thickness: f32,
}

/// Image placement command.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageCommand {
    /// Resolved asset path.
    pub src: String,
    /// Alt text.
    pub alt: String,
    /// Left x.
    pub x: f32,
    /// Top y.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

/// Page-level chrome marker.
#[derive(Clone, Debug, PartialEq)]
pub struct PageChromeCommand {
    /// Semantic chrome kind.
    pub kind: PageChromeKind,
    /// Optional text payload (e.g. footer text).
    pub text: Option<String>,
    /// Baseline y of the chrome text.
    pub baseline_y: f32,
    /// Current value (e.g. page number).
    pub current: Option<usize>,
    /// Total value (e.g. page count).
    pub total: Option<usize>,
}

/// Kind of page-level chrome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageChromeKind {
    /// Footer marker.
    Footer,
}
