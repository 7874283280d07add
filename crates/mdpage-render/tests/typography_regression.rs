use std::sync::Arc;

use mdpage_render::{
    BlockRole, DrawCommand, LayoutConfig, LineWrapper, RenderConfig, RenderEngine,
    RenderEngineOptions, RenderPage, ResolvedTextStyle, StyledSpan, TextCommand, TextMeasurer,
};

/// Every glyph is `size * 0.5` wide.
struct FixedMeasurer;

impl TextMeasurer for FixedMeasurer {
    fn measure_text(&self, text: &str, style: &ResolvedTextStyle) -> f32 {
        text.chars().count() as f32 * style.size * 0.5
    }
}

fn config() -> RenderConfig {
    RenderConfig::default().with_text_measurer(Arc::new(FixedMeasurer))
}

fn narrow_engine(content_width: f32) -> RenderEngine {
    let mut opts = RenderEngineOptions::default();
    opts.layout.margin_left = 20.0;
    opts.layout.margin_right = 20.0;
    opts.layout.page_width = content_width + 40.0;
    RenderEngine::new(opts)
}

fn texts(page: &RenderPage) -> Vec<&TextCommand> {
    page.content_commands
        .iter()
        .filter_map(|cmd| match cmd {
            DrawCommand::Text(text) => Some(text),
            _ => None,
        })
        .collect()
}

#[test]
fn bullet_wraps_with_hanging_indent() {
    let engine = narrow_engine(200.0);
    let cfg = engine.options().layout.clone();
    let rendered = engine
        .render_text(
            "- this bullet line is much longer than the narrow content box allows",
            config(),
        )
        .expect("render");
    let page = &rendered.pages[0];
    let cmds = texts(page);
    let marker = cmds[0];
    assert_eq!(marker.text, cfg.bullet_marker);
    assert_eq!(marker.x, cfg.margin_left);

    let body: Vec<&TextCommand> = cmds[1..].to_vec();
    assert!(body.len() >= 2, "expected wrapped bullet, got {body:?}");
    let text_x = cfg.margin_left + cfg.list_indent;
    let max_width = cfg.content_width() - cfg.list_indent;
    for line in &body {
        assert_eq!(line.x, text_x);
        assert!(line.x > marker.x);
        assert!(FixedMeasurer.measure_text(&line.text, &line.style) <= max_width);
    }
    assert_eq!(body[0].baseline_y, marker.baseline_y);
    assert!(body.windows(2).all(|pair| pair[1].baseline_y > pair[0].baseline_y));
    assert!(rendered.diagnostics.is_empty());
}

#[test]
fn mixed_paragraph_shares_a_line_when_it_fits() {
    let rendered = narrow_engine(400.0)
        .render_text("Plain **bold** plain", config())
        .expect("render");
    let cmds = texts(&rendered.pages[0]);
    let labels: Vec<(&str, bool)> = cmds
        .iter()
        .map(|cmd| (cmd.text.as_str(), cmd.style.is_bold()))
        .collect();
    assert_eq!(
        labels,
        vec![("Plain", false), ("bold", true), ("plain", false)]
    );
    assert!(cmds.iter().all(|cmd| cmd.baseline_y == cmds[0].baseline_y));
    assert!(cmds[0].x < cmds[1].x && cmds[1].x < cmds[2].x);
}

#[test]
fn mixed_paragraph_moves_whole_bold_segment_when_it_does_not_fit() {
    // Body glyphs are 5.5 wide: "Plain " fits, "Plain very bold" does not.
    let rendered = narrow_engine(12.0 * 5.5)
        .render_text("Plain **very bold** plain", config())
        .expect("render");
    let cmds = texts(&rendered.pages[0]);
    let bold: Vec<&&TextCommand> = cmds.iter().filter(|cmd| cmd.style.is_bold()).collect();
    assert_eq!(bold.len(), 1);
    assert_eq!(bold[0].text, "very bold");
    assert!(bold[0].baseline_y > cmds[0].baseline_y);
}

#[test]
fn fitted_lines_never_exceed_width_except_single_words() {
    let cfg = LayoutConfig::default();
    let wrapper = LineWrapper::new(Arc::new(FixedMeasurer));
    let body = cfg.style_for(BlockRole::Body);
    let samples = [
        "Sprint velocity dropped by twelve percent compared to the previous sprint.",
        "a bb ccc dddd eeeee ffffff ggggggg hhhhhhhh iiiiiiiii jjjjjjjjjj",
        "Supercalifragilisticexpialidocious is short enough on a wide page",
        "x",
    ];
    for max_width in [30.0f32, 55.0, 120.0, 300.0] {
        for sample in samples {
            let spans = [
                StyledSpan::new(sample, body),
                StyledSpan::atomic("Owner", body.bold()),
                StyledSpan::new(": Dana", body),
            ];
            for line in wrapper.wrap_spans(&spans, max_width) {
                let measured: f32 = line
                    .segments
                    .iter()
                    .map(|seg| seg.x_offset + seg.width)
                    .fold(0.0, f32::max);
                if line.degraded {
                    assert!(
                        !line.text().contains(' '),
                        "only single words may overflow: {:?}",
                        line.text()
                    );
                } else {
                    assert!(
                        measured <= max_width + 1e-3,
                        "{:?} is {} wide, max {}",
                        line.text(),
                        measured,
                        max_width
                    );
                }
            }
        }
    }
}

#[test]
fn cursor_only_moves_down_within_a_page() {
    let mut text = String::from("# Weekly Report\n");
    for idx in 0..60 {
        text.push_str(&format!("## Section {idx}\n"));
        text.push_str("Some **bold** remark about the sprint that goes on for a while.\n");
        text.push_str("- a bullet\n\n---\n");
    }
    let cfg = LayoutConfig::default();
    let rendered = RenderEngine::new(RenderEngineOptions::default())
        .render_text(&text, config())
        .expect("render");
    assert!(rendered.page_count() > 2);
    for page in &rendered.pages {
        let mut last_top = cfg.content_top();
        for cmd in &page.content_commands {
            let top = match cmd {
                DrawCommand::Text(text) => text.baseline_y - text.style.size,
                DrawCommand::Rule(rule) => rule.y,
                _ => continue,
            };
            assert!(top >= last_top - text_tolerance(), "cursor moved up on page {}", page.page_number);
            last_top = last_top.max(top);
            let bottom = match cmd {
                DrawCommand::Text(text) => text.baseline_y,
                DrawCommand::Rule(rule) => rule.y,
                _ => continue,
            };
            assert!(bottom <= cfg.content_bottom());
        }
    }
}

/// Mixed-size lines share a top but not a baseline.
fn text_tolerance() -> f32 {
    12.0
}
