//! Layout engine: size every node, hand placement to the selected strategy,
//! then route connections between the placed regions. Placement is a pure
//! function of the diagram and config; repeated calls yield identical
//! coordinates.

mod grid;
mod rows;
pub(crate) mod types;
pub use types::*;

use crate::color::ColorMap;
use crate::config::{LayoutConfig, LayoutStrategy};
use crate::icons::IconLibrary;
use crate::ir::{Component, Diagram};
use crate::text_metrics;
use crate::theme::Theme;
use log::warn;
use std::collections::BTreeMap;

const FALLBACK_PAD_X: f32 = 12.0;
const FALLBACK_PAD_Y: f32 = 10.0;

pub fn compute_layout(
    diagram: &Diagram,
    icons: &IconLibrary,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let nodes = size_nodes(diagram, icons, theme, config);
    let mut layout = match config.strategy {
        LayoutStrategy::Rows => rows::place(diagram, nodes, theme, config),
        LayoutStrategy::Grid => grid::place(diagram, nodes, theme, config),
    };
    route_connections(diagram, &mut layout, theme, config);
    layout
}

/// Resolve each component's visual and derive its region size. Positions are
/// filled in by the strategy.
fn size_nodes(
    diagram: &Diagram,
    icons: &IconLibrary,
    theme: &Theme,
    config: &LayoutConfig,
) -> BTreeMap<String, NodeLayout> {
    let mut colors = ColorMap::new();
    let mut nodes = BTreeMap::new();
    for component in &diagram.components {
        nodes.insert(component.name.clone(), size_node(component, icons, &mut colors, theme, config));
    }
    nodes
}

fn size_node(
    component: &Component,
    icons: &IconLibrary,
    colors: &mut ColorMap,
    theme: &Theme,
    config: &LayoutConfig,
) -> NodeLayout {
    match icons.resolve(component) {
        Some(path) => {
            let caption = measure_label(&component.name, theme, config);
            NodeLayout {
                name: component.name.clone(),
                kind: component.kind.clone(),
                x: 0.0,
                y: 0.0,
                width: caption.width.max(config.icon_size),
                height: config.icon_size + config.caption_gap + caption.height,
                icon_box: config.icon_size,
                caption,
                visual: NodeVisual::Icon(path),
            }
        }
        None => {
            let text = if component.kind.is_empty() {
                component.name.clone()
            } else {
                format!("{}\n({})", component.name, component.kind)
            };
            let caption = measure_label(&text, theme, config);
            NodeLayout {
                name: component.name.clone(),
                kind: component.kind.clone(),
                x: 0.0,
                y: 0.0,
                width: (caption.width + FALLBACK_PAD_X * 2.0).max(config.icon_size),
                height: (caption.height + FALLBACK_PAD_Y * 2.0).max(config.icon_size),
                icon_box: config.icon_size,
                caption,
                visual: NodeVisual::Fallback {
                    color: colors.color_for(&component.kind),
                },
            }
        }
    }
}

/// Straight segments between resolved anchors, clipped to region borders.
/// Unresolvable endpoints drop the edge with a diagnostic; duplicates are
/// all kept, in input order.
fn route_connections(diagram: &Diagram, layout: &mut Layout, theme: &Theme, config: &LayoutConfig) {
    for connection in &diagram.connections {
        let from_rect = layout.anchor_rect(&connection.from);
        let to_rect = layout.anchor_rect(&connection.to);
        let (Some(from_rect), Some(to_rect)) = (from_rect, to_rect) else {
            let mut unresolved = Vec::new();
            if from_rect.is_none() {
                unresolved.push(connection.from.clone());
            }
            if to_rect.is_none() {
                unresolved.push(connection.to.clone());
            }
            warn!(
                "skipping connection `{}` -> `{}`: unresolved endpoint(s) {}",
                connection.from,
                connection.to,
                unresolved.join(", ")
            );
            layout.skipped.push(SkippedConnection {
                from: connection.from.clone(),
                to: connection.to.clone(),
                unresolved,
            });
            continue;
        };

        let start = from_rect.border_toward(to_rect.center());
        let end = to_rect.border_toward(from_rect.center());
        let label = if connection.label.trim().is_empty() {
            None
        } else {
            Some(measure_label(&connection.label, theme, config))
        };
        layout.edges.push(EdgeLayout {
            from: connection.from.clone(),
            to: connection.to.clone(),
            label,
            points: vec![start, end],
        });
    }
}

pub(crate) fn measure_label(text: &str, theme: &Theme, config: &LayoutConfig) -> TextBlock {
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        lines.extend(wrap_line(raw, config.max_label_width_chars));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    let width = lines
        .iter()
        .map(|line| text_metrics::text_width(line, theme.font_size, &theme.font_family))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * theme.font_size * config.label_line_height;
    TextBlock {
        lines,
        width,
        height,
    }
}

/// Wrap placed nodes and clusters into a `Layout` with bounds. Edges are
/// routed afterwards.
pub(super) fn finish(
    nodes: BTreeMap<String, NodeLayout>,
    clusters: Vec<ClusterLayout>,
    margin: f32,
) -> Layout {
    let mut max_x = 0.0f32;
    let mut max_y = 0.0f32;
    for node in nodes.values() {
        max_x = max_x.max(node.x + node.width);
        max_y = max_y.max(node.y + node.height);
    }
    for cluster in &clusters {
        max_x = max_x.max(cluster.x + cluster.width);
        max_y = max_y.max(cluster.y + cluster.height);
    }
    Layout {
        nodes,
        clusters,
        edges: Vec::new(),
        skipped: Vec::new(),
        width: (max_x + margin).max(200.0),
        height: (max_y + margin).max(200.0),
    }
}

/// Greedy word wrap. Words longer than the budget stay whole.
fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    let line = line.trim();
    if line.chars().count() <= max_chars {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    if out.is_empty() {
        out.push(String::new());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Connection, Group};

    fn diagram() -> Diagram {
        Diagram {
            groups: vec![
                Group {
                    name: "AWS".into(),
                    kind: "cloud_provider".into(),
                },
                Group {
                    name: "User Groups".into(),
                    kind: "user_group".into(),
                },
            ],
            components: vec![
                component("Step Functions", "workflow_service", Some("AWS")),
                component("Lambda Functions", "serverless_function", Some("AWS")),
                component("Redshift", "data_warehouse", Some("AWS")),
                component("Data Analyst", "role", Some("User Groups")),
                component("PostgreSQL", "database", None),
            ],
            connections: vec![
                connection("Step Functions", "Lambda Functions", "invokes"),
                connection("Lambda Functions", "Redshift", "loads data"),
                connection("Data Analyst", "AWS", "monitors"),
            ],
        }
    }

    fn component(name: &str, kind: &str, group: Option<&str>) -> Component {
        Component {
            name: name.into(),
            kind: kind.into(),
            group: group.map(Into::into),
            icon_hint: None,
        }
    }

    fn connection(from: &str, to: &str, label: &str) -> Connection {
        Connection {
            from: from.into(),
            to: to.into(),
            label: label.into(),
        }
    }

    fn layout_with(strategy: LayoutStrategy) -> Layout {
        let mut config = LayoutConfig::default();
        config.strategy = strategy;
        compute_layout(&diagram(), &IconLibrary::empty(), &Theme::light(), &config)
    }

    #[test]
    fn nodes_never_overlap() {
        for strategy in [LayoutStrategy::Rows, LayoutStrategy::Grid] {
            let layout = layout_with(strategy);
            let rects: Vec<_> = layout.nodes.values().map(|n| (n.name.clone(), n.rect())).collect();
            for (i, (name_a, a)) in rects.iter().enumerate() {
                for (name_b, b) in rects.iter().skip(i + 1) {
                    assert!(
                        !a.intersects(b),
                        "{strategy:?}: `{name_a}` overlaps `{name_b}`"
                    );
                }
            }
        }
    }

    #[test]
    fn clusters_contain_their_members() {
        for strategy in [LayoutStrategy::Rows, LayoutStrategy::Grid] {
            let layout = layout_with(strategy);
            for cluster in &layout.clusters {
                for member in &cluster.nodes {
                    let node = &layout.nodes[member];
                    assert!(
                        cluster.rect().contains(&node.rect()),
                        "{strategy:?}: `{member}` outside `{}`",
                        cluster.name
                    );
                }
            }
        }
    }

    #[test]
    fn placement_is_reproducible() {
        for strategy in [LayoutStrategy::Rows, LayoutStrategy::Grid] {
            let first = layout_with(strategy);
            let second = layout_with(strategy);
            for (name, node) in &first.nodes {
                let other = &second.nodes[name];
                assert_eq!((node.x, node.y), (other.x, other.y), "{strategy:?}: `{name}` moved");
            }
            assert_eq!(first.width, second.width);
            assert_eq!(first.height, second.height);
        }
    }

    #[test]
    fn empty_group_still_reserves_a_cluster() {
        let mut input = diagram();
        input.groups.push(Group {
            name: "Empty Tier".into(),
            kind: "tier".into(),
        });
        for strategy in [LayoutStrategy::Rows, LayoutStrategy::Grid] {
            let mut config = LayoutConfig::default();
            config.strategy = strategy;
            let layout =
                compute_layout(&input, &IconLibrary::empty(), &Theme::light(), &config);
            let cluster = layout
                .clusters
                .iter()
                .find(|c| c.name == "Empty Tier")
                .unwrap_or_else(|| panic!("{strategy:?}: empty group lost its cluster"));
            assert!(cluster.width > 0.0 && cluster.height > 0.0);
        }
    }

    #[test]
    fn group_edge_uses_cluster_anchor() {
        let layout = layout_with(LayoutStrategy::Rows);
        let edge = layout
            .edges
            .iter()
            .find(|e| e.to == "AWS")
            .expect("group edge missing");
        let cluster = layout.clusters.iter().find(|c| c.name == "AWS").unwrap();
        let end = *edge.points.last().unwrap();
        // The arrow lands on the cluster border, not on any member region.
        let on_border = (end.0 - cluster.x).abs() < 0.5
            || (end.0 - (cluster.x + cluster.width)).abs() < 0.5
            || (end.1 - cluster.y).abs() < 0.5
            || (end.1 - (cluster.y + cluster.height)).abs() < 0.5;
        assert!(on_border, "edge endpoint {end:?} not on cluster border");
    }

    #[test]
    fn unknown_endpoint_is_skipped_with_diagnostic() {
        let mut input = diagram();
        input
            .connections
            .push(connection("X", "Redshift", "calls"));
        let layout =
            compute_layout(&input, &IconLibrary::empty(), &Theme::light(), &LayoutConfig::default());
        assert_eq!(layout.edges.len(), 3);
        assert_eq!(layout.skipped.len(), 1);
        assert_eq!(layout.skipped[0].unresolved, ["X"]);
    }

    #[test]
    fn duplicate_connections_all_drawn() {
        let mut input = diagram();
        input
            .connections
            .push(connection("Step Functions", "Lambda Functions", "invokes"));
        let layout =
            compute_layout(&input, &IconLibrary::empty(), &Theme::light(), &LayoutConfig::default());
        let count = layout
            .edges
            .iter()
            .filter(|e| e.from == "Step Functions" && e.to == "Lambda Functions")
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn wrap_line_splits_on_budget() {
        assert_eq!(wrap_line("short", 18), vec!["short"]);
        assert_eq!(
            wrap_line("a reasonably long caption here", 14),
            vec!["a reasonably", "long caption", "here"]
        );
        // Oversized single word stays whole.
        assert_eq!(wrap_line("antidisestablishmentarianism", 10).len(), 1);
    }
}
