//! Blocks and their interchangeable variants

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::meta::{Identifiable, Meta};
use super::Defaults;
use crate::error::PrismError;

/// Role a block plays in a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    Persona,
    Task,
    OutputSpecification,
    Rules,
    Examples,
    Context,
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockType::Persona => "Persona",
            BlockType::Task => "Task",
            BlockType::OutputSpecification => "OutputSpecification",
            BlockType::Rules => "Rules",
            BlockType::Examples => "Examples",
            BlockType::Context => "Context",
        };
        f.write_str(name)
    }
}

/// One concrete realization of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variant {
    /// Unique within the owning block
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Defaults>,
    pub template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<String>,
}

impl Variant {
    pub fn new(id: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            defaults: None,
            template_id: template_id.into(),
            contract_id: None,
        }
    }

    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn with_contract(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = Some(contract_id.into());
        self
    }
}

/// Document shape before the variant invariants are checked
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBlock {
    meta: Meta,
    block_type: BlockType,
    #[serde(default)]
    defaults: Option<Defaults>,
    variants: Vec<Variant>,
}

/// A named, typed family of variants
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub meta: Meta,
    pub block_type: BlockType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Defaults>,
    variants: Vec<Variant>,
}

impl Block {
    /// Build a block, rejecting an empty variant list or duplicate variant ids
    pub fn new(
        meta: Meta,
        block_type: BlockType,
        defaults: Option<Defaults>,
        variants: Vec<Variant>,
    ) -> Result<Self, PrismError> {
        let document = format!("block '{}'", meta.id);
        if variants.is_empty() {
            return Err(PrismError::construction(
                document,
                "variants: at least one variant is required",
            ));
        }

        let mut seen = HashSet::new();
        for variant in &variants {
            if !seen.insert(variant.id.as_str()) {
                return Err(PrismError::construction(
                    document,
                    format!("variants: duplicate variant id '{}'", variant.id),
                ));
            }
        }

        Ok(Self {
            meta,
            block_type,
            defaults,
            variants,
        })
    }

    /// Variants in declaration order
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Find a variant by id
    pub fn variant(&self, id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// All variant ids in declaration order
    pub fn variant_ids(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.id.as_str()).collect()
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawBlock::deserialize(deserializer)?;
        Block::new(raw.meta, raw.block_type, raw.defaults, raw.variants)
            .map_err(serde::de::Error::custom)
    }
}

impl Identifiable for Block {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_block() {
        let block: Block = serde_json::from_value(json!({
            "meta": {"id": "blk_persona", "name": "Persona"},
            "block_type": "Persona",
            "defaults": {"language": "JavaScript"},
            "variants": [
                {
                    "id": "expert_teacher",
                    "defaults": {"language": "TypeScript"},
                    "template_id": "tpl_persona_expert"
                },
                {"id": "friendly", "template_id": "tpl_persona_friendly"}
            ]
        }))
        .expect("Should deserialize");

        assert_eq!(block.id(), "blk_persona");
        assert_eq!(block.block_type, BlockType::Persona);
        assert_eq!(block.variant_ids(), vec!["expert_teacher", "friendly"]);
        assert_eq!(block.defaults.as_ref().unwrap()["language"], json!("JavaScript"));
        let variant = block.variant("expert_teacher").expect("variant exists");
        assert_eq!(variant.defaults.as_ref().unwrap()["language"], json!("TypeScript"));
        assert!(block.variant("friendly").unwrap().defaults.is_none());
        assert!(block.variant("missing").is_none());
    }

    #[test]
    fn test_empty_variants_rejected() {
        let result = Block::new(
            Meta::new("blk_empty", "Empty"),
            BlockType::Task,
            None,
            vec![],
        );
        assert!(matches!(result, Err(PrismError::ModelConstruction { .. })));
    }

    #[test]
    fn test_duplicate_variant_ids_rejected() {
        let result: Result<Block, _> = serde_json::from_value(json!({
            "meta": {"id": "blk_dup", "name": "Dup"},
            "block_type": "Rules",
            "variants": [
                {"id": "strict", "template_id": "tpl_a"},
                {"id": "strict", "template_id": "tpl_b"}
            ]
        }));
        let err = result.expect_err("duplicate ids must fail");
        assert!(err.to_string().contains("duplicate variant id 'strict'"));
    }

    #[test]
    fn test_unknown_block_type_rejected() {
        let result: Result<Block, _> = serde_json::from_value(json!({
            "meta": {"id": "blk_x", "name": "X"},
            "block_type": "Summary",
            "variants": [{"id": "a", "template_id": "tpl_a"}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_variant_field_rejected() {
        let result: Result<Block, _> = serde_json::from_value(json!({
            "meta": {"id": "blk_x", "name": "X"},
            "block_type": "Task",
            "variants": [{"id": "a", "template_id": "tpl_a", "model": "gpt"}]
        }));
        assert!(result.is_err());
    }
}
