use crate::config::{load_config, LayoutStrategy};
use crate::icons::IconLibrary;
use crate::layout::compute_layout;
use crate::parser::parse_diagram;
use crate::render::{render_svg, render_to_file, write_output_svg, OutputFormat, RenderReport};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "archviz",
    version,
    about = "Render architecture diagrams from structured component descriptions"
)]
pub struct Args {
    /// Input document (JSON, possibly embedded in model output) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Directory of icon assets. Omit to render every node as a labeled box.
    #[arg(long = "icons")]
    pub icons: Option<PathBuf>,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Layout strategy override
    #[arg(short = 'l', long = "layout", value_enum)]
    pub layout: Option<LayoutStrategy>,

    /// Raster width when the SVG carries no intrinsic size
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Raster height when the SVG carries no intrinsic size
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,
}

pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("loading config")?;
    config.render.width = args.width;
    config.render.height = args.height;
    if let Some(strategy) = args.layout {
        config.layout.strategy = strategy;
    }

    let input = read_input(args.input.as_deref())?;
    let diagram = parse_diagram(&input)?;
    info!(
        "parsed diagram: {} groups, {} components, {} connections",
        diagram.groups.len(),
        diagram.components.len(),
        diagram.connections.len()
    );

    let icons = match args.icons.as_deref() {
        Some(dir) => {
            let library = IconLibrary::scan(dir)?;
            info!("icon library: {} assets in {}", library.len(), dir.display());
            library
        }
        None => IconLibrary::empty(),
    };

    let report = match (&args.output, args.output_format) {
        (Some(path), format) => render_to_file(&diagram, &icons, &config, path, format)?,
        (None, OutputFormat::Svg) => {
            let layout = compute_layout(&diagram, &icons, &config.theme, &config.layout);
            let rendered = render_svg(&layout, &config.theme, &config.layout);
            write_output_svg(&rendered.svg, None)?;
            rendered.report
        }
        #[cfg(feature = "png")]
        (None, OutputFormat::Png) => {
            anyhow::bail!("output path required for png output");
        }
    };
    summarize(&report, args.output.as_deref());

    Ok(())
}

fn summarize(report: &RenderReport, output: Option<&Path>) {
    if let Some(path) = output {
        info!("wrote {}", path.display());
    }
    if !report.skipped_connections.is_empty() {
        warn!(
            "{} connection(s) skipped (unresolved endpoints)",
            report.skipped_connections.len()
        );
    }
    if !report.fallback_nodes.is_empty() {
        info!(
            "{} node(s) rendered without an icon: {}",
            report.fallback_nodes.len(),
            report.fallback_nodes.join(", ")
        );
    }
    if !report.unreadable_icons.is_empty() {
        warn!(
            "{} icon file(s) unreadable: {}",
            report.unreadable_icons.len(),
            report.unreadable_icons.join(", ")
        );
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            return Ok(buf);
        }
        return std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
