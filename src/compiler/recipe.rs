//! Recipe compiler: turns a recipe and a registry into an [`Ir`]

use std::collections::BTreeMap;

use log::{debug, info};

use super::defaults::merge;
use crate::error::PrismError;
use crate::model::{
    Block, Dataschema, Defaults, Identifiable, ImportRef, Ir, LiteralContent, Recipe, RenderItem,
    ResolvedBlock, SequenceItem, Variant,
};
use crate::registry::AssetRegistry;

/// Options that change how imports are compiled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Use contract property defaults as the lowest-priority merge tier
    pub schema_defaults: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            schema_defaults: true,
        }
    }
}

/// One import after Phase A, keyed by its slot string
#[derive(Debug)]
struct CompiledImport<'r> {
    block: &'r Block,
    variant: &'r Variant,
    template_content: &'r str,
    contract: Option<&'r Dataschema>,
    merged_defaults: Defaults,
}

impl CompiledImport<'_> {
    fn to_resolved(&self, source_ref: &str) -> ResolvedBlock {
        ResolvedBlock {
            source_ref: source_ref.to_string(),
            template_content: self.template_content.to_string(),
            runtime_contract: self.contract.cloned(),
            source_block_meta: self.block.meta.clone(),
            source_variant_id: self.variant.id.clone(),
            merged_defaults: self.merged_defaults.clone(),
        }
    }
}

/// Compiles recipes against one registry
#[derive(Debug, Clone, Copy)]
pub struct RecipeCompiler<'r> {
    registry: &'r AssetRegistry,
    options: CompilerOptions,
}

impl<'r> RecipeCompiler<'r> {
    pub fn new(registry: &'r AssetRegistry) -> Self {
        Self {
            registry,
            options: CompilerOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    /// Compile a recipe into an IR
    ///
    /// Stops at the first failure; no partial IR is ever returned.
    pub fn compile(&self, recipe: &Recipe) -> Result<Ir, PrismError> {
        info!("compiling recipe '{}'", recipe.id());

        let imports = self.resolve_imports(recipe)?;
        let keys: Vec<&str> = imports.iter().map(|(key, _)| key.as_str()).collect();

        let mut render_sequence = Vec::with_capacity(recipe.composition.sequence.len());
        let mut aggregated_contracts = BTreeMap::new();

        for item in &recipe.composition.sequence {
            match item {
                SequenceItem::Literal(text) => {
                    render_sequence.push(RenderItem::Literal(LiteralContent {
                        content: text.clone(),
                    }));
                }
                SequenceItem::BlockRef(reference) => {
                    for key in expand_reference(reference, keys.iter().copied())? {
                        let Some((_, import)) = imports.iter().find(|(k, _)| k == key) else {
                            continue;
                        };
                        if let Some(contract) = import.contract {
                            aggregated_contracts
                                .insert(contract.id().to_string(), contract.clone());
                        }
                        render_sequence.push(RenderItem::Block(import.to_resolved(key)));
                    }
                }
            }
        }

        debug!(
            "recipe '{}' compiled to {} nodes with {} contracts",
            recipe.id(),
            render_sequence.len(),
            aggregated_contracts.len()
        );

        Ok(Ir {
            source_recipe_meta: recipe.meta.clone(),
            render_sequence,
            aggregated_contracts,
        })
    }

    /// Phase A: resolve every import in slot order
    fn resolve_imports(
        &self,
        recipe: &Recipe,
    ) -> Result<Vec<(String, CompiledImport<'r>)>, PrismError> {
        let mut compiled = Vec::with_capacity(recipe.imports.len());
        for (key, import) in recipe.imports.entries() {
            let resolved = self.resolve_import(&key, import)?;
            compiled.push((key, resolved));
        }
        Ok(compiled)
    }

    fn resolve_import(
        &self,
        key: &str,
        import: &ImportRef,
    ) -> Result<CompiledImport<'r>, PrismError> {
        let block = self
            .registry
            .resolve_block(&import.block_id, &format!("import slot '{}'", key))?;

        let variant = block
            .variant(&import.variant_id)
            .ok_or_else(|| PrismError::VariantNotFound {
                block_id: import.block_id.clone(),
                variant_id: import.variant_id.clone(),
                available: block.variant_ids().into_iter().map(String::from).collect(),
                context: format!("import slot '{}'", key),
            })?;

        let owner = format!("block '{}' variant '{}'", block.id(), variant.id);
        let template_content = self.registry.resolve_template(&variant.template_id, &owner)?;
        let contract = variant
            .contract_id
            .as_deref()
            .map(|id| self.registry.resolve_dataschema(id, &owner))
            .transpose()?;

        let schema_tier = match contract {
            Some(schema) if self.options.schema_defaults => Some(schema.schema_defaults()),
            _ => None,
        };
        let merged_defaults = merge([
            schema_tier.as_ref(),
            block.defaults.as_ref(),
            variant.defaults.as_ref(),
        ]);

        debug!(
            "resolved import '{}' -> {} ({} defaults)",
            key,
            owner,
            merged_defaults.len()
        );

        Ok(CompiledImport {
            block,
            variant,
            template_content,
            contract,
            merged_defaults,
        })
    }
}

/// Compile a recipe with default options
pub fn compile(registry: &AssetRegistry, recipe: &Recipe) -> Result<Ir, PrismError> {
    RecipeCompiler::new(registry).compile(recipe)
}

/// Expand a composition reference into import keys
///
/// An exact key match wins. Otherwise `reference` names a group and expands
/// to every `reference[N]` key, ordered by `N` numerically.
pub fn expand_reference<'k, I>(reference: &str, keys: I) -> Result<Vec<&'k str>, PrismError>
where
    I: IntoIterator<Item = &'k str>,
{
    let keys: Vec<&'k str> = keys.into_iter().collect();

    if let Some(key) = keys.iter().find(|key| **key == reference) {
        return Ok(vec![*key]);
    }

    let prefix = format!("{}[", reference);
    let mut group: Vec<(usize, &'k str)> = keys
        .iter()
        .filter_map(|key| {
            let index = key.strip_prefix(prefix.as_str())?.strip_suffix(']')?;
            Some((index.parse().ok()?, *key))
        })
        .collect();

    if group.is_empty() {
        return Err(PrismError::RecipeReference {
            reference: reference.to_string(),
            available: keys.iter().map(|key| key.to_string()).collect(),
        });
    }

    group.sort_by_key(|(index, _)| *index);
    Ok(group.into_iter().map(|(_, key)| key).collect())
}
