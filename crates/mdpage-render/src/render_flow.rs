use log::debug;

use crate::render_ir::{DrawCommand, PageAnnotation, RenderPage};
use crate::render_layout::LayoutConfig;

/// Current write position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    /// 0-based index of the open page.
    pub page_index: usize,
    /// Vertical offset from the top edge of the page.
    pub y_offset: f32,
}

/// Flow state of a page relative to the next block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    /// The block fits below the cursor.
    OnPage,
    /// The open page must be sealed first.
    NeedsBreak,
    /// The page is behind the cursor and accepts no more writes.
    Sealed,
}

/// Vertical content box of a page.
#[derive(Clone, Copy, Debug, PartialEq)]
struct ContentBox {
    top: f32,
    bottom: f32,
}

/// Owns the cursor and the pages of one render pass.
///
/// Pages behind the cursor are sealed and never written again. Content is
/// never placed below the bottom margin: callers ask [`PageFlow::ensure`]
/// for room before placing a block and a break is taken first when needed.
#[derive(Debug)]
pub struct PageFlow {
    content: ContentBox,
    cursor: Cursor,
    page: RenderPage,
    sealed: Vec<RenderPage>,
}

impl PageFlow {
    pub fn new(cfg: &LayoutConfig) -> Self {
        let content = ContentBox {
            top: cfg.content_top(),
            bottom: cfg.content_bottom(),
        };
        Self {
            content,
            cursor: Cursor {
                page_index: 0,
                y_offset: content.top,
            },
            page: RenderPage::new(1),
            sealed: Vec::new(),
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn y(&self) -> f32 {
        self.cursor.y_offset
    }

    /// 1-based number of the open page.
    pub fn page_number(&self) -> usize {
        self.page.page_number
    }

    /// Space left between the cursor and the bottom margin.
    pub fn remaining(&self) -> f32 {
        (self.content.bottom - self.cursor.y_offset).max(0.0)
    }

    /// Full content-box height of a fresh page.
    pub fn page_capacity(&self) -> f32 {
        self.content.bottom - self.content.top
    }

    /// True while nothing has been placed on the open page.
    pub fn page_is_empty(&self) -> bool {
        self.page.is_empty()
    }

    pub fn at_page_top(&self) -> bool {
        self.cursor.y_offset <= self.content.top
    }

    /// Whether a block of `height` fits below the cursor.
    ///
    /// An empty page always accepts the block: breaking would only produce
    /// another empty page.
    pub fn check(&self, height: f32) -> FlowState {
        if self.cursor.y_offset + height <= self.content.bottom || self.page.is_empty() {
            FlowState::OnPage
        } else {
            FlowState::NeedsBreak
        }
    }

    /// State of page `page_index`: sealed pages are behind the cursor.
    pub fn state_of(&self, page_index: usize, height: f32) -> FlowState {
        if page_index < self.cursor.page_index {
            FlowState::Sealed
        } else {
            self.check(height)
        }
    }

    /// Break if `height` does not fit. Returns whether a break happened.
    pub fn ensure(&mut self, height: f32) -> bool {
        match self.check(height) {
            FlowState::NeedsBreak => {
                self.break_page();
                true
            }
            FlowState::OnPage | FlowState::Sealed => false,
        }
    }

    /// Move the cursor down by `dy`, stopping at the bottom margin.
    pub fn advance(&mut self, dy: f32) {
        self.cursor.y_offset = (self.cursor.y_offset + dy.max(0.0)).min(self.content.bottom);
    }

    /// Vertical gap between blocks. Gaps are dropped at the top of a page.
    pub fn add_gap(&mut self, gap: f32) {
        if self.at_page_top() {
            return;
        }
        self.advance(gap);
    }

    /// Seal the open page and continue on a fresh one.
    ///
    /// An empty page is reused instead of sealed.
    pub fn break_page(&mut self) {
        if self.page.is_empty() {
            self.cursor.y_offset = self.content.top;
            return;
        }
        let next_number = self.page.page_number + 1;
        let sealed = core::mem::replace(&mut self.page, RenderPage::new(next_number));
        debug!(
            "page {} sealed at y={:.1} with {} commands",
            sealed.page_number,
            self.cursor.y_offset,
            sealed.content_commands.len()
        );
        self.sealed.push(sealed);
        self.cursor = Cursor {
            page_index: self.cursor.page_index + 1,
            y_offset: self.content.top,
        };
    }

    /// Append a content command to the open page.
    pub fn push(&mut self, cmd: DrawCommand) {
        self.page.push_content_command(cmd);
    }

    pub fn annotate(&mut self, annotation: PageAnnotation) {
        self.page.push_annotation(annotation);
    }

    pub fn sealed_pages(&self) -> &[RenderPage] {
        &self.sealed
    }

    /// Seal the open page and return every page in order.
    ///
    /// Always returns at least one page.
    pub fn finish(mut self) -> Vec<RenderPage> {
        if !self.page.is_empty() || self.sealed.is_empty() {
            self.sealed.push(self.page);
        }
        self.sealed
    }
}
