//! `prism.toml` project configuration

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use super::ProjectError;
use crate::compiler::CompilerOptions;
use crate::PipelineOptions;

/// File name looked up by [`ProjectConfig::find`]
pub const CONFIG_FILE: &str = "prism.toml";

const RECIPE_PLACEHOLDER: &str = "{recipe_name}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Root of the asset directories, relative to the config file
    pub source_root: PathBuf,
    /// Where compiled artifacts are written, relative to the config file
    pub output_root: PathBuf,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: None,
            source_root: PathBuf::from("."),
            output_root: PathBuf::from("outputs"),
        }
    }
}

/// Subdirectory names under the source root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesSection {
    pub blocks: String,
    pub dataschemas: String,
    pub recipes: String,
    pub templates: String,
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            blocks: "blocks".to_string(),
            dataschemas: "dataschemas".to_string(),
            recipes: "recipes".to_string(),
            templates: "templates".to_string(),
        }
    }
}

/// Output file-name patterns; `{recipe_name}` is replaced per recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub template: String,
    pub model: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            template: "{recipe_name}.jinja".to_string(),
            model: "{recipe_name}_model.rs".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSection {
    /// Use contract property defaults as the lowest merge tier
    pub schema_defaults: bool,
    pub generate_models: bool,
}

impl Default for CompilerSection {
    fn default() -> Self {
        Self {
            schema_defaults: true,
            generate_models: true,
        }
    }
}

/// Parsed `prism.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub project: ProjectSection,
    pub sources: SourcesSection,
    pub output: OutputSection,
    pub compiler: CompilerSection,
    /// Directory containing the config file; relative roots resolve here
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl ProjectConfig {
    /// Default configuration rooted at `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let content = fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ProjectError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Find `prism.toml` in `start` or the nearest parent directory
    pub fn find(start: &Path) -> Result<PathBuf, ProjectError> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| ProjectError::ConfigNotFound(start.to_path_buf()))
    }

    /// Serialize back to TOML
    pub fn to_toml(&self) -> Result<String, ProjectError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn source_root(&self) -> PathBuf {
        self.base_dir.join(&self.project.source_root)
    }

    pub fn output_root(&self) -> PathBuf {
        self.base_dir.join(&self.project.output_root)
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.source_root().join(&self.sources.blocks)
    }

    pub fn dataschemas_dir(&self) -> PathBuf {
        self.source_root().join(&self.sources.dataschemas)
    }

    pub fn recipes_dir(&self) -> PathBuf {
        self.source_root().join(&self.sources.recipes)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.source_root().join(&self.sources.templates)
    }

    /// Output path of the compiled template for one recipe
    pub fn template_output(&self, recipe_name: &str) -> PathBuf {
        self.output_root()
            .join(self.output.template.replace(RECIPE_PLACEHOLDER, recipe_name))
    }

    /// Output path of the generated models for one recipe
    pub fn model_output(&self, recipe_name: &str) -> PathBuf {
        self.output_root()
            .join(self.output.model.replace(RECIPE_PLACEHOLDER, recipe_name))
    }

    /// Pipeline options selected by the `[compiler]` section
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions::new()
            .with_compiler(CompilerOptions {
                schema_defaults: self.compiler.schema_defaults,
            })
            .with_models(self.compiler.generate_models)
    }
}
