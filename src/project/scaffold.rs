//! Starter files for new projects and assets

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::{ProjectConfig, ProjectError, CONFIG_FILE};

/// Kind of asset created by [`Scaffolder::new_asset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaffoldKind {
    Block,
    Recipe,
    Dataschema,
}

impl fmt::Display for ScaffoldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScaffoldKind::Block => write!(f, "block"),
            ScaffoldKind::Recipe => write!(f, "recipe"),
            ScaffoldKind::Dataschema => write!(f, "dataschema"),
        }
    }
}

/// Writes starter files into a project
#[derive(Debug, Clone)]
pub struct Scaffolder {
    config: ProjectConfig,
}

impl Scaffolder {
    pub fn new(config: ProjectConfig) -> Self {
        Self { config }
    }

    /// Create a project in `dir`: `prism.toml` plus the asset and output
    /// directories
    pub fn init(dir: &Path) -> Result<Self, ProjectError> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Err(ProjectError::AlreadyExists { path: config_path });
        }

        let mut config = ProjectConfig::with_base_dir(dir);
        config.project.name = dir
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);

        for path in [
            config.blocks_dir(),
            config.dataschemas_dir(),
            config.recipes_dir(),
            config.templates_dir(),
            config.output_root(),
        ] {
            fs::create_dir_all(&path).map_err(|e| ProjectError::io(&path, e))?;
        }
        fs::write(&config_path, config.to_toml()?)
            .map_err(|e| ProjectError::io(&config_path, e))?;

        info!("initialized project in {}", dir.display());
        Ok(Self { config })
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Write the starter file(s) for a new asset and return their paths
    ///
    /// Nothing is written if any target already exists.
    pub fn new_asset(&self, kind: ScaffoldKind, name: &str) -> Result<Vec<PathBuf>, ProjectError> {
        check_name(name)?;

        let files = match kind {
            ScaffoldKind::Block => {
                let template_id = format!("{}_default", name);
                vec![
                    (
                        self.config.blocks_dir().join(format!("{}.block.yaml", name)),
                        block_starter(name, &template_id),
                    ),
                    (
                        self.config
                            .templates_dir()
                            .join(format!("{}.jinja", template_id)),
                        TEMPLATE_STARTER.to_string(),
                    ),
                ]
            }
            ScaffoldKind::Recipe => vec![(
                self.config.recipes_dir().join(format!("{}.recipe.yaml", name)),
                recipe_starter(name),
            )],
            ScaffoldKind::Dataschema => vec![(
                self.config
                    .dataschemas_dir()
                    .join(format!("{}.dataschema.yaml", name)),
                dataschema_starter(name),
            )],
        };

        if let Some((path, _)) = files.iter().find(|(path, _)| path.exists()) {
            return Err(ProjectError::AlreadyExists { path: path.clone() });
        }

        let mut written = Vec::with_capacity(files.len());
        for (path, content) in files {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| ProjectError::io(parent, e))?;
            }
            fs::write(&path, content).map_err(|e| ProjectError::io(&path, e))?;
            info!("created {} {}", kind, path.display());
            written.push(path);
        }
        Ok(written)
    }
}

fn check_name(name: &str) -> Result<(), ProjectError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ProjectError::InvalidName(name.to_string()))
    }
}

fn display_name(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

const TEMPLATE_STARTER: &str = "Answer in {{ language }}.\n";

fn block_starter(name: &str, template_id: &str) -> String {
    format!(
        "meta:
  id: {name}
  name: {title}
  description: What this block adds to a prompt
block_type: Task
defaults:
  language: English
variants:
  - id: default
    template_id: {template_id}
",
        name = name,
        title = display_name(name),
        template_id = template_id,
    )
}

fn recipe_starter(name: &str) -> String {
    format!(
        "meta:
  id: {name}
  name: {title}
imports:
  tasks: []
composition:
  sequence:
    - literal: \"Describe the task here.\\n\"
",
        name = name,
        title = display_name(name),
    )
}

fn dataschema_starter(name: &str) -> String {
    format!(
        "meta:
  id: {name}
  name: {title}
data:
  type: object
  required: [input]
  properties:
    input:
      type: string
      description: Value supplied when the prompt is rendered
",
        name = name,
        title = display_name(name),
    )
}
