//! Asset registry for storing and resolving blocks, dataschemas and templates
//!
//! One registry is built per compilation job. Registration is an
//! unconditional upsert and trusts the id it is given: checking that a
//! document's `meta.id` matches its key is the caller's job (see
//! [`crate::build_registry`]).

use std::collections::HashMap;

use log::debug;

use crate::error::{AssetKind, PrismError};
use crate::model::{Block, Dataschema};

/// Lookup tables from identifier to asset
#[derive(Debug, Default, Clone)]
pub struct AssetRegistry {
    blocks: HashMap<String, Block>,
    dataschemas: HashMap<String, Dataschema>,
    templates: HashMap<String, String>,
}

impl AssetRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block, replacing any previous entry with the same id
    pub fn register_block(&mut self, id: impl Into<String>, block: Block) {
        let id = id.into();
        if self.blocks.insert(id.clone(), block).is_some() {
            debug!("replaced block '{}'", id);
        }
    }

    /// Register a dataschema, replacing any previous entry with the same id
    pub fn register_dataschema(&mut self, id: impl Into<String>, schema: Dataschema) {
        let id = id.into();
        if self.dataschemas.insert(id.clone(), schema).is_some() {
            debug!("replaced dataschema '{}'", id);
        }
    }

    /// Register raw template text, replacing any previous entry with the same id
    pub fn register_template(&mut self, id: impl Into<String>, content: impl Into<String>) {
        let id = id.into();
        if self.templates.insert(id.clone(), content.into()).is_some() {
            debug!("replaced template '{}'", id);
        }
    }

    /// Get a block by id
    ///
    /// `context` names what triggered the lookup and ends up in the error.
    pub fn resolve_block(&self, id: &str, context: &str) -> Result<&Block, PrismError> {
        self.blocks
            .get(id)
            .ok_or_else(|| PrismError::not_found(AssetKind::Block, id, context))
    }

    /// Get a dataschema by id
    pub fn resolve_dataschema(&self, id: &str, context: &str) -> Result<&Dataschema, PrismError> {
        self.dataschemas
            .get(id)
            .ok_or_else(|| PrismError::not_found(AssetKind::Dataschema, id, context))
    }

    /// Get template text by id
    pub fn resolve_template(&self, id: &str, context: &str) -> Result<&str, PrismError> {
        self.templates
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| PrismError::not_found(AssetKind::Template, id, context))
    }

    /// Number of registered (blocks, dataschemas, templates)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.blocks.len(), self.dataschemas.len(), self.templates.len())
    }
}
