use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

impl TextBlock {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Axis-aligned region, the unit both components and clusters occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    /// Point where the segment from this rect's center toward `target`
    /// crosses the border. Falls back to the center for degenerate
    /// directions or targets inside the rect.
    pub fn border_toward(&self, target: (f32, f32)) -> (f32, f32) {
        let (cx, cy) = self.center();
        let dx = target.0 - cx;
        let dy = target.1 - cy;
        if dx.abs() < f32::EPSILON && dy.abs() < f32::EPSILON {
            return (cx, cy);
        }
        let tx = if dx.abs() < f32::EPSILON {
            f32::INFINITY
        } else {
            (self.width / 2.0) / dx.abs()
        };
        let ty = if dy.abs() < f32::EPSILON {
            f32::INFINITY
        } else {
            (self.height / 2.0) / dy.abs()
        };
        let t = tx.min(ty).min(1.0);
        (cx + dx * t, cy + dy * t)
    }
}

/// How a node is drawn: a resolved icon image, or a colored box when
/// resolution came up empty.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeVisual {
    Icon(PathBuf),
    Fallback { color: String },
}

#[derive(Debug, Clone)]
pub struct NodeLayout {
    pub name: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Side of the square icon area at the top of the region.
    pub icon_box: f32,
    pub caption: TextBlock,
    pub visual: NodeVisual,
}

impl NodeLayout {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterLayout {
    pub name: String,
    pub kind: String,
    pub label: TextBlock,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<String>,
}

impl ClusterLayout {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Edge endpoint for connections that target the group itself rather
    /// than a member.
    pub fn anchor(&self) -> (f32, f32) {
        self.rect().center()
    }
}

#[derive(Debug, Clone)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub label: Option<TextBlock>,
    pub points: Vec<(f32, f32)>,
}

/// A connection dropped because an endpoint matched neither a component nor
/// a group. Diagnostic, never fatal.
#[derive(Debug, Clone)]
pub struct SkippedConnection {
    pub from: String,
    pub to: String,
    pub unresolved: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub nodes: BTreeMap<String, NodeLayout>,
    pub clusters: Vec<ClusterLayout>,
    pub edges: Vec<EdgeLayout>,
    pub skipped: Vec<SkippedConnection>,
    pub width: f32,
    pub height: f32,
}

impl Layout {
    /// Rect an edge endpoint attaches to. A component wins a name tie with
    /// a group.
    pub fn anchor_rect(&self, name: &str) -> Option<Rect> {
        if let Some(node) = self.nodes.get(name) {
            return Some(node.rect());
        }
        self.clusters
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.rect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn border_toward_clips_horizontally() {
        let rect = Rect {
            x: 0.0,
            y: 0.0,
            width: 20.0,
            height: 10.0,
        };
        let (x, y) = rect.border_toward((100.0, 5.0));
        assert!((x - 20.0).abs() < 1e-3, "x = {x}");
        assert!((y - 5.0).abs() < 1e-3, "y = {y}");
    }

    #[test]
    fn border_toward_same_point_is_center() {
        let rect = Rect {
            x: 0.0,
            y: 0.0,
            width: 20.0,
            height: 10.0,
        };
        assert_eq!(rect.border_toward((10.0, 5.0)), (10.0, 5.0));
    }

    #[test]
    fn intersects_is_strict() {
        let a = Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        let b = Rect {
            x: 10.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(!a.intersects(&b));
        let c = Rect {
            x: 9.0,
            y: 9.0,
            width: 2.0,
            height: 2.0,
        };
        assert!(a.intersects(&c));
    }
}
