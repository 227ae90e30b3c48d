//! SVG composition and export. Draw order: background, cluster boxes, nodes,
//! then edges and their label mattes, so arrows overlay node art and labels
//! stay legible over both.

use crate::color;
use crate::config::{Config, LayoutConfig};
use crate::error::RenderError;
use crate::icons::IconLibrary;
use crate::ir::Diagram;
use crate::layout::{compute_layout, EdgeLayout, Layout, NodeVisual, SkippedConnection, TextBlock};
use crate::theme::Theme;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::warn;
use std::path::{Path, PathBuf};

const LABEL_PAD_X: f32 = 6.0;
const LABEL_PAD_Y: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Svg,
    #[cfg(feature = "png")]
    Png,
}

/// What one render pass produced besides the image: the degradations that
/// were absorbed instead of failing the render.
#[derive(Debug, Default)]
pub struct RenderReport {
    pub skipped_connections: Vec<SkippedConnection>,
    /// Components drawn as colored boxes because no icon resolved.
    pub fallback_nodes: Vec<String>,
    /// Components whose resolved icon file could not be read at draw time.
    pub unreadable_icons: Vec<String>,
}

pub struct RenderedSvg {
    pub svg: String,
    pub report: RenderReport,
}

/// Full pipeline behind one call: resolve icons, lay out, draw, export.
/// Fatal errors carry their stage; everything else degrades into the report.
pub fn render_to_file(
    diagram: &Diagram,
    icons: &IconLibrary,
    config: &Config,
    output: &Path,
    format: OutputFormat,
) -> Result<RenderReport, RenderError> {
    let layout = compute_layout(diagram, icons, &config.theme, &config.layout);
    let rendered = render_svg(&layout, &config.theme, &config.layout);
    match format {
        OutputFormat::Svg => write_output_svg(&rendered.svg, Some(output))?,
        #[cfg(feature = "png")]
        OutputFormat::Png => write_output_png(&rendered.svg, output, &config.render)?,
    }
    Ok(rendered.report)
}

pub fn render_svg(layout: &Layout, theme: &Theme, config: &LayoutConfig) -> RenderedSvg {
    let mut svg = String::new();
    let mut report = RenderReport {
        skipped_connections: layout.skipped.clone(),
        ..RenderReport::default()
    };
    let width = layout.width.max(200.0);
    let height = layout.height.max(200.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    ));
    svg.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"7\" markerHeight=\"7\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str("</defs>");

    for cluster in &layout.clusters {
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"10\" ry=\"10\" fill=\"{}\" stroke=\"{}\" stroke-dasharray=\"6 4\" stroke-width=\"1.4\"/>",
            cluster.x,
            cluster.y,
            cluster.width,
            cluster.height,
            theme.cluster_background,
            theme.cluster_border
        ));
        let label_x = cluster.x + 12.0;
        let label_y = cluster.y + 20.0;
        svg.push_str(&format!(
            "<text x=\"{label_x:.2}\" y=\"{label_y:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            theme.font_family,
            theme.font_size,
            theme.text_color,
            escape_xml(&cluster.label.text())
        ));
    }

    for node in layout.nodes.values() {
        draw_node(&mut svg, node, theme, config, &mut report);
    }

    for edge in &layout.edges {
        let d = points_to_path(&edge.points);
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" marker-end=\"url(#arrow)\" />",
            d, theme.line_color
        ));
    }

    for (x, y, label) in place_edge_labels(&layout.edges) {
        let rect_x = x - label.width / 2.0 - LABEL_PAD_X;
        let rect_y = y - label.height / 2.0 - LABEL_PAD_Y;
        let rect_w = label.width + LABEL_PAD_X * 2.0;
        let rect_h = label.height + LABEL_PAD_Y * 2.0;
        svg.push_str(&format!(
            "<rect x=\"{rect_x:.2}\" y=\"{rect_y:.2}\" width=\"{rect_w:.2}\" height=\"{rect_h:.2}\" rx=\"6\" ry=\"6\" fill=\"{}\" stroke=\"{}\" stroke-width=\"0.8\"/>",
            theme.edge_label_background, theme.node_border_color
        ));
        svg.push_str(&text_block_svg(x, y, &label, theme, config));
    }

    svg.push_str("</svg>");
    RenderedSvg { svg, report }
}

fn draw_node(
    svg: &mut String,
    node: &crate::layout::NodeLayout,
    theme: &Theme,
    config: &LayoutConfig,
    report: &mut RenderReport,
) {
    match &node.visual {
        NodeVisual::Icon(path) => match embed_image(path) {
            Some(href) => {
                let icon_x = node.x + (node.width - node.icon_box) / 2.0;
                svg.push_str(&format!(
                    "<image x=\"{icon_x:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" preserveAspectRatio=\"xMidYMid meet\" xlink:href=\"{href}\"/>",
                    node.y, node.icon_box, node.icon_box
                ));
                let caption_cx = node.x + node.width / 2.0;
                let caption_cy =
                    node.y + node.icon_box + config.caption_gap + node.caption.height / 2.0;
                // Matte behind the caption keeps it legible over cluster
                // fills and crossing edges.
                let matte_x = caption_cx - node.caption.width / 2.0 - LABEL_PAD_X;
                let matte_y = caption_cy - node.caption.height / 2.0 - LABEL_PAD_Y;
                svg.push_str(&format!(
                    "<rect x=\"{matte_x:.2}\" y=\"{matte_y:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"4\" ry=\"4\" fill=\"{}\"/>",
                    node.caption.width + LABEL_PAD_X * 2.0,
                    node.caption.height + LABEL_PAD_Y * 2.0,
                    theme.caption_background
                ));
                svg.push_str(&text_block_svg(caption_cx, caption_cy, &node.caption, theme, config));
            }
            None => {
                warn!(
                    "icon for `{}` unreadable at {}; using fallback box",
                    node.name,
                    path.display()
                );
                report.unreadable_icons.push(node.name.clone());
                draw_fallback_box(svg, node, &color::fallback_color(&node.kind), theme, config);
            }
        },
        NodeVisual::Fallback { color } => {
            report.fallback_nodes.push(node.name.clone());
            draw_fallback_box(svg, node, color, theme, config);
        }
    }
}

fn draw_fallback_box(
    svg: &mut String,
    node: &crate::layout::NodeLayout,
    fill: &str,
    theme: &Theme,
    config: &LayoutConfig,
) {
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{fill}\" stroke=\"{}\" stroke-width=\"1.2\"/>",
        node.x, node.y, node.width, node.height, theme.node_border_color
    ));
    let (cx, cy) = node.rect().center();
    let mut boxed_theme = theme.clone();
    boxed_theme.text_color = theme.fallback_text_color.clone();
    svg.push_str(&text_block_svg(cx, cy, &node.caption, &boxed_theme, config));
}

/// Base64 data URI for an asset, or `None` when the file cannot be read.
fn embed_image(path: &Path) -> Option<String> {
    let bytes = std::fs::read(path).ok()?;
    if bytes.is_empty() {
        return None;
    }
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        _ => return None,
    };
    Some(format!("data:{mime};base64,{}", BASE64.encode(bytes)))
}

fn points_to_path(points: &[(f32, f32)]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].0, points[0].1));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.0, point.1));
    }
    d
}

fn text_block_svg(x: f32, y: f32, label: &TextBlock, theme: &Theme, config: &LayoutConfig) -> String {
    let total_height = label.lines.len() as f32 * theme.font_size * config.label_line_height;
    let start_y = y - total_height / 2.0 + theme.font_size;
    let mut text = String::new();
    text.push_str(&format!(
        "<text x=\"{x:.2}\" y=\"{start_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        theme.font_family, theme.font_size, theme.text_color
    ));
    for (idx, line) in label.lines.iter().enumerate() {
        let dy = if idx == 0 {
            0.0
        } else {
            theme.font_size * config.label_line_height
        };
        text.push_str(&format!(
            "<tspan x=\"{x:.2}\" dy=\"{dy:.2}\">{}</tspan>",
            escape_xml(line)
        ));
    }
    text.push_str("</text>");
    text
}

/// Greedy label placement: start at the edge midpoint and step downward
/// until the matte stops colliding with already-placed labels.
fn place_edge_labels(edges: &[EdgeLayout]) -> Vec<(f32, f32, TextBlock)> {
    let mut occupied: Vec<(f32, f32, f32, f32)> = Vec::new();
    let mut placed = Vec::new();

    for edge in edges {
        let Some(label) = edge.label.clone() else {
            continue;
        };
        let (mid_x, mid_y) = edge_midpoint(edge);
        let mut position = (mid_x, mid_y);
        let mut offset = 0.0;
        for _ in 0..6 {
            let candidate = (
                mid_x - label.width / 2.0 - LABEL_PAD_X,
                mid_y + offset - label.height / 2.0 - LABEL_PAD_Y,
                label.width + LABEL_PAD_X * 2.0,
                label.height + LABEL_PAD_Y * 2.0,
            );
            if !collides(&candidate, &occupied) {
                occupied.push(candidate);
                position = (mid_x, mid_y + offset);
                break;
            }
            offset += label.height + 6.0;
        }
        placed.push((position.0, position.1, label));
    }

    placed
}

fn edge_midpoint(edge: &EdgeLayout) -> (f32, f32) {
    match edge.points.as_slice() {
        [] => (0.0, 0.0),
        [only] => *only,
        [first, .., last] => ((first.0 + last.0) / 2.0, (first.1 + last.1) / 2.0),
    }
}

fn collides(rect: &(f32, f32, f32, f32), occupied: &[(f32, f32, f32, f32)]) -> bool {
    occupied.iter().any(|(x, y, w, h)| {
        rect.0 < x + w && rect.0 + rect.2 > *x && rect.1 < y + h && rect.1 + rect.3 > *y
    })
}

/// Write SVG to a path (via a sibling temp file and rename, so a failed
/// write never leaves a truncated output) or to stdout when no path is
/// given.
pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<(), RenderError> {
    match output {
        Some(path) => write_atomic(path, svg.as_bytes()),
        None => {
            print!("{svg}");
            Ok(())
        }
    }
}

#[cfg(feature = "png")]
pub fn write_output_png(
    svg: &str,
    output: &Path,
    render_cfg: &crate::config::RenderConfig,
) -> Result<(), RenderError> {
    let mut opt = usvg::Options::default();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .unwrap_or_else(|| usvg::Size::from_wh(800.0, 600.0).unwrap());

    let tree =
        usvg::Tree::from_str(svg, &opt).map_err(|err| RenderError::export(output, err))?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| RenderError::export(output, "failed to allocate pixmap"))?;
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap.as_mut());

    let data = pixmap
        .encode_png()
        .map_err(|err| RenderError::export(output, err))?;
    write_atomic(output, &data)
}

fn write_atomic(output: &Path, data: &[u8]) -> Result<(), RenderError> {
    let temp = temp_path(output);
    std::fs::write(&temp, data).map_err(|err| RenderError::export(output, err))?;
    if let Err(err) = std::fs::rename(&temp, output) {
        let _ = std::fs::remove_file(&temp);
        return Err(RenderError::export(output, err));
    }
    Ok(())
}

fn temp_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output".into());
    name.push(".tmp");
    output.with_file_name(name)
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
