//! Project layer: `prism.toml`, on-disk asset discovery and scaffolding
//!
//! A project is a directory holding a `prism.toml` and one subdirectory per
//! asset kind:
//!
//! ```text
//! my-prompts/
//! ├── prism.toml
//! ├── blocks/         *.block.yaml
//! ├── dataschemas/    *.dataschema.yaml
//! ├── recipes/        *.recipe.yaml
//! ├── templates/      *.jinja
//! └── outputs/
//! ```

mod config;
mod loader;
mod scaffold;

use std::path::PathBuf;

use thiserror::Error;

use crate::error::PrismError;

pub use config::{
    CompilerSection, OutputSection, ProjectConfig, ProjectSection, SourcesSection, CONFIG_FILE,
};
pub use loader::{asset_id, ProjectLoader};
pub use scaffold::{ScaffoldKind, Scaffolder};

/// Errors raised outside the compiler core
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("cannot serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("no {} found in {} or any parent directory", CONFIG_FILE, .0.display())]
    ConfigNotFound(PathBuf),

    #[error("recipe '{name}' not found in {}", .dir.display())]
    RecipeNotFound { name: String, dir: PathBuf },

    #[error("{} already exists", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("invalid asset name '{0}': use letters, digits, '_' or '-'")]
    InvalidName(String),

    #[error(transparent)]
    Prism(#[from] PrismError),
}

impl ProjectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The compiler error inside, if this is one
    pub fn as_prism(&self) -> Option<&PrismError> {
        match self {
            Self::Prism(err) => Some(err),
            _ => None,
        }
    }
}
