//! Render IR, line wrapping, page flow and orchestration for `mdpage`.

#![cfg_attr(
    not(test),
    deny(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::panic_in_result_fn,
        clippy::todo,
        clippy::unimplemented
    )
)]

mod render_assets;
mod render_engine;
mod render_flow;
mod render_ir;
mod render_layout;
mod render_persist;

pub use mdpage::BlockRole;
pub use render_assets::{
    fit_image, prepare_image, resolve_asset_path, AssetError, AssetLoader, FsAssetLoader,
    ImageInfo, PlacedImage,
};
pub use render_engine::{
    RenderConfig, RenderDiagnostic, RenderEngine, RenderEngineError, RenderEngineOptions,
    RenderedDocument,
};
pub use render_flow::{Cursor, FlowState, PageFlow};
pub use render_ir::{
    DrawCommand, ImageCommand, PageAnnotation, PageAnnotationKind, PageChromeCommand,
    PageChromeKind, RenderPage, ResolvedTextStyle, RuleCommand, TextCommand,
};
pub use render_layout::{
    CaptionPlacement, FittedLine, FittedSegment, HeuristicMeasurer, LayoutConfig, LineWrapper,
    PageChromeConfig, StyledSpan, TextMeasurer, TextTier,
};
pub use render_persist::{pages_from_json, pages_to_json};
