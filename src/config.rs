use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placement strategy for the layout engine. Both are deterministic for a
/// fixed input; they trade density for readability differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum LayoutStrategy {
    /// One horizontal band per group, members in a row (left-to-right).
    Rows,
    /// Equal-width vertical lanes per group, members in a near-square grid.
    Grid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub strategy: LayoutStrategy,
    /// Side of the square icon box, in px. Assets are fitted into it
    /// whatever their native resolution.
    pub icon_size: f32,
    pub node_gap: f32,
    pub margin: f32,
    pub cluster_pad_x: f32,
    pub cluster_pad_top: f32,
    pub cluster_pad_bottom: f32,
    pub cluster_gap: f32,
    pub lane_gap: f32,
    pub caption_gap: f32,
    pub label_line_height: f32,
    pub max_label_width_chars: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            strategy: LayoutStrategy::Rows,
            icon_size: 64.0,
            node_gap: 48.0,
            margin: 24.0,
            cluster_pad_x: 28.0,
            cluster_pad_top: 34.0,
            cluster_pad_bottom: 24.0,
            cluster_gap: 48.0,
            lane_gap: 36.0,
            caption_gap: 6.0,
            label_line_height: 1.25,
            max_label_width_chars: 18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

/// On-disk config shape: everything optional, overlaid onto defaults.
/// Parsed as JSON5 so hand-written files may carry comments.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    line_color: Option<String>,
    background: Option<String>,
    cluster_border: Option<String>,
    layout: Option<LayoutConfigFile>,
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LayoutConfigFile {
    strategy: Option<LayoutStrategy>,
    icon_size: Option<f32>,
    node_gap: Option<f32>,
    margin: Option<f32>,
    cluster_gap: Option<f32>,
    max_label_width_chars: Option<usize>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;

    if let Some(name) = parsed.theme.as_deref() {
        config.theme = match name {
            "dark" => Theme::dark(),
            _ => Theme::light(),
        };
    }
    if let Some(v) = parsed.font_family {
        config.theme.font_family = v;
    }
    if let Some(v) = parsed.font_size {
        config.theme.font_size = v;
    }
    if let Some(v) = parsed.line_color {
        config.theme.line_color = v;
    }
    if let Some(v) = parsed.background {
        config.theme.background = v;
    }
    if let Some(v) = parsed.cluster_border {
        config.theme.cluster_border = v;
    }
    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.strategy {
            config.layout.strategy = v;
        }
        if let Some(v) = layout.icon_size {
            config.layout.icon_size = v;
        }
        if let Some(v) = layout.node_gap {
            config.layout.node_gap = v;
        }
        if let Some(v) = layout.margin {
            config.layout.margin = v;
        }
        if let Some(v) = layout.cluster_gap {
            config.layout.cluster_gap = v;
        }
        if let Some(v) = layout.max_label_width_chars {
            config.layout.max_label_width_chars = v;
        }
    }
    if let Some(v) = parsed.width {
        config.render.width = v;
    }
    if let Some(v) = parsed.height {
        config.render.height = v;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.strategy, LayoutStrategy::Rows);
        assert_eq!(config.layout.icon_size, 64.0);
    }

    #[test]
    fn overlay_keeps_unset_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        // JSON5: comments and trailing commas are fine.
        write!(
            file,
            "{{ theme: 'dark', layout: {{ strategy: 'grid', icon_size: 48, }}, // overrides\n }}"
        )
        .unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.layout.strategy, LayoutStrategy::Grid);
        assert_eq!(config.layout.icon_size, 48.0);
        assert_eq!(config.theme.background, Theme::dark().background);
        // untouched default
        assert_eq!(config.layout.node_gap, 48.0);
    }
}
