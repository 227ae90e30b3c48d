//! Manual grid layout: one equal-width vertical lane per group (plus a
//! trailing lane for ungrouped components), members arranged in a roughly
//! square grid of uniform cells, each node at its cell center.

use super::*;

pub(super) fn place(
    diagram: &Diagram,
    mut nodes: BTreeMap<String, NodeLayout>,
    theme: &Theme,
    config: &LayoutConfig,
) -> Layout {
    let margin = config.margin;
    let cell_w = nodes.values().map(|n| n.width).fold(0.0, f32::max).max(config.icon_size)
        + config.node_gap;
    let cell_h = nodes.values().map(|n| n.height).fold(0.0, f32::max).max(config.icon_size)
        + config.node_gap;

    let mut lanes: Vec<(Option<&crate::ir::Group>, Vec<String>)> = diagram
        .groups
        .iter()
        .map(|group| {
            (
                Some(group),
                diagram.members(&group.name).map(|c| c.name.clone()).collect(),
            )
        })
        .collect();
    let free: Vec<String> = diagram.ungrouped().map(|c| c.name.clone()).collect();
    if !free.is_empty() {
        lanes.push((None, free));
    }

    // Equal lane width: sized for the widest grid across all lanes.
    let max_cols = lanes
        .iter()
        .map(|(_, members)| grid_shape(members.len()).1)
        .max()
        .unwrap_or(1)
        .max(1);
    let lane_width = max_cols as f32 * cell_w + config.cluster_pad_x * 2.0;

    let mut clusters = Vec::new();
    let mut lane_x = margin;
    for (group, members) in lanes {
        let (grid_rows, grid_cols) = grid_shape(members.len());
        for (idx, name) in members.iter().enumerate() {
            let row = idx / grid_cols.max(1);
            let col = idx % grid_cols.max(1);
            if let Some(node) = nodes.get_mut(name) {
                let center_x =
                    lane_x + config.cluster_pad_x + col as f32 * cell_w + cell_w / 2.0;
                let center_y =
                    margin + config.cluster_pad_top + row as f32 * cell_h + cell_h / 2.0;
                node.x = center_x - node.width / 2.0;
                node.y = center_y - node.height / 2.0;
            }
        }

        if let Some(group) = group {
            // Zero members still reserves a one-cell-high lane.
            let content_rows = grid_rows.max(1);
            clusters.push(ClusterLayout {
                name: group.name.clone(),
                kind: group.kind.clone(),
                label: measure_label(&group.name, theme, config),
                x: lane_x,
                y: margin,
                width: lane_width,
                height: config.cluster_pad_top
                    + content_rows as f32 * cell_h
                    + config.cluster_pad_bottom,
                nodes: members,
            });
        }
        lane_x += lane_width + config.lane_gap;
    }

    finish(nodes, clusters, margin)
}

/// `rows = ceil(sqrt(n))`, `cols = ceil(n / rows)`.
fn grid_shape(count: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let rows = (count as f64).sqrt().ceil() as usize;
    let cols = count.div_ceil(rows);
    (rows, cols)
}
