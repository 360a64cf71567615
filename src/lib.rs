//! Prism - a compiler for composable prompt recipes
//!
//! A recipe imports variants of reusable blocks and arranges them, together
//! with literal text, into a composition. Prism resolves every reference,
//! merges defaults, and produces a partially rendered template: compile-time
//! defaults are substituted and runtime variables declared by data contracts
//! are left as `{{ name }}` placeholders.
//!
//! # Example
//!
//! ```rust
//! use prism::{compile_sources, CompilationSources, PipelineOptions};
//! use serde_json::json;
//!
//! let mut sources = CompilationSources::new(json!({
//!     "meta": {"id": "rec_hello", "name": "Hello"},
//!     "imports": {"persona": {"block_id": "blk_persona", "variant_id": "friendly"}},
//!     "composition": {"sequence": [{"block_ref": "persona"}]}
//! }));
//! sources
//!     .templates
//!     .insert("tpl_friendly".to_string(), "Hi, I write {{ language }}.".to_string());
//! sources.blocks.insert(
//!     "blk_persona".to_string(),
//!     json!({
//!         "meta": {"id": "blk_persona", "name": "Persona"},
//!         "block_type": "Persona",
//!         "defaults": {"language": "Rust"},
//!         "variants": [{"id": "friendly", "template_id": "tpl_friendly"}]
//!     }),
//! );
//!
//! let artifacts = compile_sources(&sources, &PipelineOptions::default()).unwrap();
//! assert_eq!(artifacts.template_content, "Hi, I write Rust.");
//! assert!(artifacts.model_code.is_none());
//! ```

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod model;
pub mod project;
pub mod registry;
pub mod template;
pub mod validate;

use std::collections::BTreeMap;

use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

pub use codegen::{ModelGenerator, RustModelGenerator};
pub use compiler::{compile, CompilerOptions, RecipeCompiler};
pub use error::{AssetKind, ErrorKind, PrismError, Violation};
pub use model::{Block, Dataschema, Identifiable, Ir, Recipe};
pub use registry::AssetRegistry;
pub use template::aggregate;
pub use validate::{MetaSchema, MetaSchemaValidator, SchemaValidator};

/// Raw documents for one compilation job, keyed by asset id
#[derive(Debug, Clone, Default)]
pub struct CompilationSources {
    pub templates: BTreeMap<String, String>,
    pub dataschemas: BTreeMap<String, Value>,
    pub blocks: BTreeMap<String, Value>,
    pub recipe: Value,
}

impl CompilationSources {
    /// Start from a recipe document with no assets
    pub fn new(recipe: Value) -> Self {
        Self {
            recipe,
            ..Self::default()
        }
    }
}

/// Everything produced by [`compile_sources`]
#[derive(Debug, Clone)]
pub struct CompilationArtifacts {
    pub ir: Ir,
    /// The partially rendered template
    pub template_content: String,
    /// Generated models for the runtime contracts, if any
    pub model_code: Option<String>,
}

/// Configuration for the complete compile pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub compiler: CompilerOptions,
    /// Generate model code for runtime contracts
    pub generate_models: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            compiler: CompilerOptions::default(),
            generate_models: true,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the compiler options
    pub fn with_compiler(mut self, compiler: CompilerOptions) -> Self {
        self.compiler = compiler;
        self
    }

    /// Enable or disable model-code generation
    pub fn with_models(mut self, generate_models: bool) -> Self {
        self.generate_models = generate_models;
        self
    }
}

fn construct<T>(document: &str, data: &Value) -> Result<T, PrismError>
where
    T: for<'de> Deserialize<'de>,
{
    T::deserialize(data).map_err(|e| PrismError::construction(document, e.to_string()))
}

fn check_id(kind: AssetKind, key: &str, declared: &str) -> Result<(), PrismError> {
    if key == declared {
        Ok(())
    } else {
        Err(PrismError::IdMismatch {
            kind,
            registered_as: key.to_string(),
            declared: declared.to_string(),
        })
    }
}

/// Validate, construct and register every asset in `sources`
///
/// Each document must declare a `meta.id` equal to the key it is stored
/// under. The recipe is not touched; see [`load_recipe`].
pub fn build_registry(
    sources: &CompilationSources,
    validator: &dyn SchemaValidator,
) -> Result<AssetRegistry, PrismError> {
    for (id, data) in &sources.blocks {
        validate::validate_document(
            validator,
            MetaSchema::Block,
            &format!("block '{}'", id),
            data,
        )?;
    }
    for (id, data) in &sources.dataschemas {
        validate::validate_document(
            validator,
            MetaSchema::Dataschema,
            &format!("dataschema '{}'", id),
            data,
        )?;
    }

    let mut registry = AssetRegistry::new();
    for (id, content) in &sources.templates {
        registry.register_template(id.as_str(), content.as_str());
    }

    for (id, data) in &sources.dataschemas {
        let schema: Dataschema = construct(&format!("dataschema '{}'", id), data)?;
        check_id(AssetKind::Dataschema, id, schema.id())?;
        registry.register_dataschema(id.as_str(), schema);
    }

    for (id, data) in &sources.blocks {
        let block: Block = construct(&format!("block '{}'", id), data)?;
        check_id(AssetKind::Block, id, block.id())?;
        registry.register_block(id.as_str(), block);
    }

    let (blocks, dataschemas, templates) = registry.counts();
    debug!(
        "registry built: {} blocks, {} dataschemas, {} templates",
        blocks, dataschemas, templates
    );
    Ok(registry)
}

/// Validate and construct a recipe document
pub fn load_recipe(data: &Value, validator: &dyn SchemaValidator) -> Result<Recipe, PrismError> {
    let document = match validate::document_identifier(data) {
        Some(id) => format!("recipe '{}'", id),
        None => "recipe".to_string(),
    };
    validate::validate_document(validator, MetaSchema::Recipe, &document, data)?;
    construct(&document, data)
}

/// Run the whole pipeline: validate, register, compile, aggregate, generate
pub fn compile_sources(
    sources: &CompilationSources,
    options: &PipelineOptions,
) -> Result<CompilationArtifacts, PrismError> {
    let validator = MetaSchemaValidator::new();
    let registry = build_registry(sources, &validator)?;
    let recipe = load_recipe(&sources.recipe, &validator)?;

    let ir = RecipeCompiler::new(&registry)
        .with_options(options.compiler)
        .compile(&recipe)?;
    let template_content = aggregate(&ir)?;

    let model_code = if options.generate_models {
        RustModelGenerator.generate(&ir.aggregated_contracts)
    } else {
        None
    };

    info!(
        "compiled recipe '{}': {} nodes, {} contracts",
        recipe.id(),
        ir.render_sequence.len(),
        ir.aggregated_contracts.len()
    );

    Ok(CompilationArtifacts {
        ir,
        template_content,
        model_code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn persona_block(id: &str) -> Value {
        json!({
            "meta": {"id": id, "name": "Persona"},
            "block_type": "Persona",
            "variants": [{"id": "plain", "template_id": "tpl_plain"}]
        })
    }

    #[test]
    fn test_build_registry_id_mismatch() {
        let mut sources = CompilationSources::default();
        sources
            .blocks
            .insert("blk_file_name".to_string(), persona_block("blk_declared"));

        let err = build_registry(&sources, &MetaSchemaValidator).unwrap_err();
        match err {
            PrismError::IdMismatch {
                kind,
                registered_as,
                declared,
            } => {
                assert_eq!(kind, AssetKind::Block);
                assert_eq!(registered_as, "blk_file_name");
                assert_eq!(declared, "blk_declared");
            }
            other => panic!("Expected IdMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_build_registry_validates_before_constructing() {
        let mut sources = CompilationSources::default();
        sources.blocks.insert(
            "blk_bad".to_string(),
            json!({"meta": {"id": "blk_bad", "name": "Bad"}, "block_type": "Task", "variants": []}),
        );

        let err = build_registry(&sources, &MetaSchemaValidator).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralValidation);
    }

    #[test]
    fn test_duplicate_variants_are_construction_errors() {
        let mut sources = CompilationSources::default();
        sources.blocks.insert(
            "blk_dup".to_string(),
            json!({
                "meta": {"id": "blk_dup", "name": "Dup"},
                "block_type": "Task",
                "variants": [
                    {"id": "a", "template_id": "tpl"},
                    {"id": "a", "template_id": "tpl"}
                ]
            }),
        );

        let err = build_registry(&sources, &MetaSchemaValidator).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelConstruction);
        assert!(err.to_string().contains("block 'blk_dup'"));
    }

    #[test]
    fn test_load_recipe_rejects_both_fields() {
        let data = json!({
            "meta": {"id": "rec", "name": "Recipe"},
            "imports": {},
            "composition": {"sequence": [{"block_ref": "persona", "literal": "x"}]}
        });
        let err = load_recipe(&data, &MetaSchemaValidator).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelConstruction);
        assert!(err.to_string().contains("exactly one of"));
    }

    #[test]
    fn test_pipeline_without_models() {
        let mut sources = CompilationSources::new(json!({
            "meta": {"id": "rec", "name": "Recipe"},
            "imports": {"persona": {"block_id": "blk_persona", "variant_id": "plain"}},
            "composition": {"sequence": [{"block_ref": "persona"}, {"literal": "!"}]}
        }));
        sources
            .templates
            .insert("tpl_plain".to_string(), "Hello".to_string());
        sources
            .blocks
            .insert("blk_persona".to_string(), persona_block("blk_persona"));

        let options = PipelineOptions::new().with_models(false);
        let artifacts = compile_sources(&sources, &options).unwrap();
        assert_eq!(artifacts.template_content, "Hello!");
        assert!(artifacts.model_code.is_none());
        assert_eq!(artifacts.ir.render_sequence.len(), 2);
    }
}
