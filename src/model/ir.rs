//! Intermediate representation produced by the recipe compiler

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::dataschema::Dataschema;
use super::meta::Meta;
use super::Defaults;

/// A block variant with every identifier resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedBlock {
    /// Import key this block came from, e.g. `persona` or `tasks[1]`
    pub source_ref: String,
    pub template_content: String,
    pub runtime_contract: Option<Dataschema>,
    pub source_block_meta: Meta,
    pub source_variant_id: String,
    pub merged_defaults: Defaults,
}

/// Text copied verbatim from the composition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiteralContent {
    pub content: String,
}

/// One node of the render sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderItem {
    Block(ResolvedBlock),
    Literal(LiteralContent),
}

impl RenderItem {
    pub fn as_block(&self) -> Option<&ResolvedBlock> {
        match self {
            RenderItem::Block(block) => Some(block),
            RenderItem::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            RenderItem::Literal(literal) => Some(&literal.content),
            RenderItem::Block(_) => None,
        }
    }
}

/// Compiled recipe, consumed by the template aggregator and model generators
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ir {
    pub source_recipe_meta: Meta,
    pub render_sequence: Vec<RenderItem>,
    /// Runtime contracts keyed by schema id
    pub aggregated_contracts: BTreeMap<String, Dataschema>,
}

impl Ir {
    /// Resolved blocks in render order
    pub fn resolved_blocks(&self) -> impl Iterator<Item = &ResolvedBlock> {
        self.render_sequence.iter().filter_map(RenderItem::as_block)
    }

    /// Variables deferred to execution time: every property of every contract
    pub fn runtime_variables(&self) -> BTreeSet<String> {
        self.aggregated_contracts
            .values()
            .flat_map(|contract| contract.property_names())
            .map(str::to_string)
            .collect()
    }
}
