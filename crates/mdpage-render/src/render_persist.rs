//! JSON page dump.

use mdpage::BlockRole;
use serde::{Deserialize, Serialize};

use crate::render_engine::RenderEngineError;
use crate::render_ir::{
    DrawCommand, ImageCommand, PageAnnotation, PageChromeCommand, PageChromeKind, RenderPage,
    ResolvedTextStyle, RuleCommand, TextCommand,
};

const DUMP_SCHEMA_VERSION: u8 = 1;

/// Encode pages as a versioned JSON document.
pub fn pages_to_json(pages: &[RenderPage]) -> Result<String, RenderEngineError> {
    let envelope = PersistedPageDump {
        version: DUMP_SCHEMA_VERSION,
        pages: pages.iter().map(PersistedRenderPage::from).collect(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Decode pages written by [`pages_to_json`].
pub fn pages_from_json(json: &str) -> Result<Vec<RenderPage>, RenderEngineError> {
    let envelope: PersistedPageDump = serde_json::from_str(json)?;
    if envelope.version != DUMP_SCHEMA_VERSION {
        return Err(RenderEngineError::UnsupportedSchema {
            found: envelope.version,
        });
    }
    Ok(envelope.pages.into_iter().map(RenderPage::from).collect())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PersistedPageDump {
    version: u8,
    pages: Vec<PersistedRenderPage>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PersistedRenderPage {
    page_number: usize,
    content_commands: Vec<PersistedDrawCommand>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    chrome_commands: Vec<PersistedDrawCommand>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    annotations: Vec<PersistedPageAnnotation>,
}

impl From<&RenderPage> for PersistedRenderPage {
    fn from(page: &RenderPage) -> Self {
        Self {
            page_number: page.page_number,
            content_commands: page
                .content_commands
                .iter()
                .map(PersistedDrawCommand::from)
                .collect(),
            chrome_commands: page
                .chrome_commands
                .iter()
                .map(PersistedDrawCommand::from)
                .collect(),
            annotations: page
                .annotations
                .iter()
                .map(PersistedPageAnnotation::from)
                .collect(),
        }
    }
}

impl From<PersistedRenderPage> for RenderPage {
    fn from(value: PersistedRenderPage) -> Self {
        Self {
            page_number: value.page_number,
            content_commands: value
                .content_commands
                .into_iter()
                .map(DrawCommand::from)
                .collect(),
            chrome_commands: value
                .chrome_commands
                .into_iter()
                .map(DrawCommand::from)
                .collect(),
            annotations: value
                .annotations
                .into_iter()
                .map(PageAnnotation::from)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PersistedPageAnnotation {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

impl From<&PageAnnotation> for PersistedPageAnnotation {
    fn from(value: &PageAnnotation) -> Self {
        Self {
            kind: value.kind.as_str().to_string(),
            value: value.value.clone(),
        }
    }
}

impl From<PersistedPageAnnotation> for PageAnnotation {
    fn from(value: PersistedPageAnnotation) -> Self {
        Self {
            kind: value.kind.into(),
            value: value.value,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PersistedDrawCommand {
    Text {
        x: f32,
        baseline_y: f32,
        text: String,
        style: PersistedTextStyle,
    },
    Rule {
        x: f32,
        y: f32,
        length: f32,
        thickness: f32,
    },
    Image {
        src: String,
        alt: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Footer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        baseline_y: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        current: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
    },
}

impl From<&DrawCommand> for PersistedDrawCommand {
    fn from(value: &DrawCommand) -> Self {
        match value {
            DrawCommand::Text(cmd) => Self::Text {
                x: cmd.x,
                baseline_y: cmd.baseline_y,
                text: cmd.text.clone(),
                style: cmd.style.into(),
            },
            DrawCommand::Rule(cmd) => Self::Rule {
                x: cmd.x,
                y: cmd.y,
                length: cmd.length,
                thickness: cmd.thickness,
            },
            DrawCommand::Image(cmd) => Self::Image {
                src: cmd.src.clone(),
                alt: cmd.alt.clone(),
                x: cmd.x,
                y: cmd.y,
                width: cmd.width,
                height: cmd.height,
            },
            DrawCommand::PageChrome(cmd) => match cmd.kind {
                PageChromeKind::Footer => Self::Footer {
                    text: cmd.text.clone(),
                    baseline_y: cmd.baseline_y,
                    current: cmd.current,
                    total: cmd.total,
                },
            },
        }
    }
}

impl From<PersistedDrawCommand> for DrawCommand {
    fn from(value: PersistedDrawCommand) -> Self {
        match value {
            PersistedDrawCommand::Text {
                x,
                baseline_y,
                text,
                style,
            } => Self::Text(TextCommand {
                x,
                baseline_y,
                text,
                style: style.into(),
            }),
            PersistedDrawCommand::Rule {
                x,
                y,
                length,
                thickness,
            } => Self::Rule(RuleCommand {
                x,
                y,
                length,
                thickness,
            }),
            PersistedDrawCommand::Image {
                src,
                alt,
                x,
                y,
                width,
                height,
            } => Self::Image(ImageCommand {
                src,
                alt,
                x,
                y,
                width,
                height,
            }),
            PersistedDrawCommand::Footer {
                text,
                baseline_y,
                current,
                total,
            } => Self::PageChrome(PageChromeCommand {
                kind: PageChromeKind::Footer,
                text,
                baseline_y,
                current,
                total,
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct PersistedTextStyle {
    weight: u16,
    #[serde(default)]
    italic: bool,
    size: f32,
    line_height: f32,
    role: PersistedBlockRole,
}

impl From<ResolvedTextStyle> for PersistedTextStyle {
    fn from(value: ResolvedTextStyle) -> Self {
        Self {
            weight: value.weight,
            italic: value.italic,
            size: value.size,
            line_height: value.line_height,
            role: value.role.into(),
        }
    }
}

impl From<PersistedTextStyle> for ResolvedTextStyle {
    fn from(value: PersistedTextStyle) -> Self {
        Self {
            weight: value.weight,
            italic: value.italic,
            size: value.size,
            line_height: value.line_height,
            role: value.role.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PersistedBlockRole {
    Body,
    Heading(u8),
    ListItem,
    Label,
    Caption,
}

impl From<BlockRole> for PersistedBlockRole {
    fn from(value: BlockRole) -> Self {
        match value {
            BlockRole::Body => Self::Body,
            BlockRole::Heading(level) => Self::Heading(level),
            BlockRole::ListItem => Self::ListItem,
            BlockRole::Label => Self::Label,
            BlockRole::Caption => Self::Caption,
        }
    }
}

impl From<PersistedBlockRole> for BlockRole {
    fn from(value: PersistedBlockRole) -> Self {
        match value {
            PersistedBlockRole::Body => Self::Body,
            PersistedBlockRole::Heading(level) => Self::Heading(level),
            PersistedBlockRole::ListItem => Self::ListItem,
            PersistedBlockRole::Label => Self::Label,
            PersistedBlockRole::Caption => Self::Caption,
        }
    }
}
