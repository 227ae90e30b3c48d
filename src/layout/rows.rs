//! Clustered row layout: a vertical stack of bordered group bands, members
//! in a horizontal row inside each band, ungrouped components in a trailing
//! borderless row. Deterministic given declaration order.

use super::*;

pub(super) fn place(
    diagram: &Diagram,
    mut nodes: BTreeMap<String, NodeLayout>,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let margin = config.margin;
    let mut clusters = Vec::new();
    let mut current_y = margin;

    for group in &diagram.groups {
        let members: Vec<String> = diagram.members(&group.name).map(|c| c.name.clone()).collect();
        let row_height = members
            .iter()
            .filter_map(|name| nodes.get(name))
            .map(|n| n.height)
            .fold(0.0, f32::max)
            .max(config.icon_size);
        let content_width: f32 = if members.is_empty() {
            // An empty group still reserves its band.
            config.icon_size
        } else {
            let widths: f32 = members
                .iter()
                .filter_map(|name| nodes.get(name))
                .map(|n| n.width)
                .sum();
            widths + config.node_gap * (members.len() - 1) as f32
        };

        let label = measure_label(&group.name, theme, config);
        let width = content_width.max(label.width) + config.cluster_pad_x * 2.0;
        let height = config.cluster_pad_top + row_height + config.cluster_pad_bottom;

        let mut cursor_x = margin + config.cluster_pad_x;
        for name in &members {
            if let Some(node) = nodes.get_mut(name) {
                node.x = cursor_x;
                node.y = current_y + config.cluster_pad_top + (row_height - node.height) / 2.0;
                cursor_x += node.width + config.node_gap;
            }
        }

        clusters.push(ClusterLayout {
            name: group.name.clone(),
            kind: group.kind.clone(),
            label,
            x: margin,
            y: current_y,
            width,
            height,
            nodes: members,
        });
        current_y += height + config.cluster_gap;
    }

    let free: Vec<String> = diagram.ungrouped().map(|c| c.name.clone()).collect();
    if !free.is_empty() {
        let row_height = free
            .iter()
            .filter_map(|name| nodes.get(name))
            .map(|n| n.height)
            .fold(0.0, f32::max);
        let mut cursor_x = margin + config.cluster_pad_x;
        for name in &free {
            if let Some(node) = nodes.get_mut(name) {
                node.x = cursor_x;
                node.y = current_y + (row_height - node.height) / 2.0;
                cursor_x += node.width + config.node_gap;
            }
        }
    }

    finish(nodes, clusters, margin)
}
