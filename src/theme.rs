use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub text_color: String,
    pub line_color: String,
    pub background: String,
    pub node_border_color: String,
    pub caption_background: String,
    pub edge_label_background: String,
    pub cluster_background: String,
    pub cluster_border: String,
    pub fallback_text_color: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            text_color: "#1C2430".to_string(),
            line_color: "#5B6B85".to_string(),
            background: "#FFFFFF".to_string(),
            node_border_color: "#C7D2E5".to_string(),
            caption_background: "rgba(255,255,255,0.85)".to_string(),
            edge_label_background: "#FFFFFF".to_string(),
            cluster_background: "#F7FAFF".to_string(),
            cluster_border: "#9AA7BD".to_string(),
            fallback_text_color: "#000000".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            text_color: "#E6EAF2".to_string(),
            line_color: "#8FA0BD".to_string(),
            background: "#14181F".to_string(),
            node_border_color: "#3A4354".to_string(),
            caption_background: "rgba(20,24,31,0.85)".to_string(),
            edge_label_background: "#1E2430".to_string(),
            cluster_background: "#1A202B".to_string(),
            cluster_border: "#4A5568".to_string(),
            fallback_text_color: "#000000".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
