#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod icons;
pub mod ir;
pub mod layout;
pub mod parser;
pub mod render;
pub mod text_metrics;
pub mod theme;

pub use config::{Config, LayoutConfig, LayoutStrategy, RenderConfig};
pub use error::{RenderError, Stage};
pub use icons::IconLibrary;
pub use ir::{Component, Connection, Diagram, Group};
pub use layout::compute_layout;
pub use parser::parse_diagram;
pub use render::{render_svg, render_to_file, OutputFormat, RenderReport, RenderedSvg};
pub use theme::Theme;

#[cfg(feature = "cli")]
pub use cli::run;
