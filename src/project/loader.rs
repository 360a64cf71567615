//! Discovers assets on disk and assembles [`CompilationSources`]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, warn};
use serde_json::Value;

use super::{ProjectConfig, ProjectError};
use crate::CompilationSources;

const TEMPLATE_PATTERN: &str = "*.jinja";
const DATASCHEMA_PATTERN: &str = "*.dataschema.y*ml";
const BLOCK_PATTERN: &str = "*.block.y*ml";
const RECIPE_PATTERN: &str = "*.recipe.y*ml";
const RECIPE_EXTENSIONS: [&str; 2] = ["recipe.yaml", "recipe.yml"];

/// Asset id of a file: its name up to the first `.`
pub fn asset_id(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let id = name.split('.').next()?;
    (!id.is_empty()).then(|| id.to_string())
}

/// Reads a project's asset directories
///
/// Templates, dataschemas and blocks are read once and cached, so compiling
/// several recipes touches each file a single time.
#[derive(Debug)]
pub struct ProjectLoader<'c> {
    config: &'c ProjectConfig,
    templates: Option<BTreeMap<String, String>>,
    dataschemas: Option<BTreeMap<String, Value>>,
    blocks: Option<BTreeMap<String, Value>>,
}

impl<'c> ProjectLoader<'c> {
    pub fn new(config: &'c ProjectConfig) -> Self {
        Self {
            config,
            templates: None,
            dataschemas: None,
            blocks: None,
        }
    }

    /// Names of every recipe in the recipes directory, sorted
    pub fn recipe_names(&self) -> Result<Vec<String>, ProjectError> {
        let mut names: Vec<String> = discover(&self.config.recipes_dir(), RECIPE_PATTERN)?
            .iter()
            .filter_map(|path| recipe_name(path))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Everything needed to compile the recipe `name`
    pub fn load_for_recipe(&mut self, name: &str) -> Result<CompilationSources, ProjectError> {
        let recipe_path = self.recipe_path(name)?;
        let recipe = read_yaml(&recipe_path)?;

        Ok(CompilationSources {
            templates: self.templates()?.clone(),
            dataschemas: self.dataschemas()?.clone(),
            blocks: self.blocks()?.clone(),
            recipe,
        })
    }

    fn recipe_path(&self, name: &str) -> Result<PathBuf, ProjectError> {
        let dir = self.config.recipes_dir();
        RECIPE_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| ProjectError::RecipeNotFound {
                name: name.to_string(),
                dir,
            })
    }

    fn templates(&mut self) -> Result<&BTreeMap<String, String>, ProjectError> {
        if self.templates.is_none() {
            let mut templates = BTreeMap::new();
            for path in discover(&self.config.templates_dir(), TEMPLATE_PATTERN)? {
                let Some(id) = asset_id(&path) else { continue };
                let content =
                    fs::read_to_string(&path).map_err(|e| ProjectError::io(&path, e))?;
                templates.insert(id, content);
            }
            debug!("loaded {} templates", templates.len());
            self.templates = Some(templates);
        }
        Ok(self.templates.get_or_insert_with(BTreeMap::new))
    }

    fn dataschemas(&mut self) -> Result<&BTreeMap<String, Value>, ProjectError> {
        if self.dataschemas.is_none() {
            let documents = load_documents(&self.config.dataschemas_dir(), DATASCHEMA_PATTERN)?;
            debug!("loaded {} dataschemas", documents.len());
            self.dataschemas = Some(documents);
        }
        Ok(self.dataschemas.get_or_insert_with(BTreeMap::new))
    }

    fn blocks(&mut self) -> Result<&BTreeMap<String, Value>, ProjectError> {
        if self.blocks.is_none() {
            let documents = load_documents(&self.config.blocks_dir(), BLOCK_PATTERN)?;
            debug!("loaded {} blocks", documents.len());
            self.blocks = Some(documents);
        }
        Ok(self.blocks.get_or_insert_with(BTreeMap::new))
    }
}

fn recipe_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let (stem, _) = name.split_once(".recipe")?;
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Files in `dir` matching `pattern`; a missing directory yields nothing
fn discover(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ProjectError> {
    if !dir.is_dir() {
        warn!("directory {} does not exist, skipping", dir.display());
        return Ok(Vec::new());
    }

    let full = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), pattern);
    let mut paths = Vec::new();
    for entry in glob::glob(&full)? {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(err) => {
                let path = err.path().to_path_buf();
                return Err(ProjectError::io(path, err.into_error()));
            }
        }
    }
    paths.sort();
    Ok(paths)
}

fn load_documents(dir: &Path, pattern: &str) -> Result<BTreeMap<String, Value>, ProjectError> {
    let mut documents = BTreeMap::new();
    for path in discover(dir, pattern)? {
        let Some(id) = asset_id(&path) else { continue };
        let document = read_yaml(&path)?;
        if document.is_null() {
            warn!("{} is empty, skipping", path.display());
            continue;
        }
        if documents.insert(id.clone(), document).is_some() {
            warn!("asset '{}' defined more than once; using {}", id, path.display());
        }
    }
    Ok(documents)
}

fn read_yaml(path: &Path) -> Result<Value, ProjectError> {
    let content = fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
    serde_yaml::from_str(&content).map_err(|source| ProjectError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
