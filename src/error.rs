use std::fmt;
use std::path::PathBuf;

/// Pipeline stage a fatal error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Schema,
    Assets,
    Export,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Schema => "schema",
            Stage::Assets => "assets",
            Stage::Export => "export",
        };
        f.write_str(name)
    }
}

/// Fatal render errors. Per-node and per-connection problems are not errors:
/// they degrade to fallback visuals or skipped edges and show up in the
/// `RenderReport` instead.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("input schema: {0}")]
    Schema(String),

    #[error("icon assets ({path}): {source}")]
    Assets {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("export to {path}: {message}")]
    Export { path: PathBuf, message: String },
}

impl RenderError {
    pub fn stage(&self) -> Stage {
        match self {
            RenderError::Schema(_) => Stage::Schema,
            RenderError::Assets { .. } => Stage::Assets,
            RenderError::Export { .. } => Stage::Export,
        }
    }

    pub(crate) fn export(path: &std::path::Path, message: impl fmt::Display) -> Self {
        RenderError::Export {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_tags() {
        assert_eq!(RenderError::Schema("x".into()).stage(), Stage::Schema);
        let err = RenderError::export(std::path::Path::new("out.png"), "disk full");
        assert_eq!(err.stage(), Stage::Export);
        assert!(err.to_string().contains("out.png"));
        assert!(err.to_string().contains("disk full"));
    }
}
