//! Recipes: imports plus a composition sequence

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::meta::{Identifiable, Meta};
use crate::error::PrismError;

/// Pointer to one block + variant pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportRef {
    pub block_id: String,
    pub variant_id: String,
}

impl ImportRef {
    pub fn new(block_id: impl Into<String>, variant_id: impl Into<String>) -> Self {
        Self {
            block_id: block_id.into(),
            variant_id: variant_id.into(),
        }
    }
}

/// Named import slots of a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportSlot {
    Persona,
    OutputSpec,
    Tasks,
    Rules,
    Examples,
    Contexts,
}

impl ImportSlot {
    /// Every slot, in compilation order
    pub const ALL: [ImportSlot; 6] = [
        ImportSlot::Persona,
        ImportSlot::OutputSpec,
        ImportSlot::Tasks,
        ImportSlot::Rules,
        ImportSlot::Examples,
        ImportSlot::Contexts,
    ];

    /// Field name used in recipe documents and import keys
    pub fn name(self) -> &'static str {
        match self {
            ImportSlot::Persona => "persona",
            ImportSlot::OutputSpec => "output_spec",
            ImportSlot::Tasks => "tasks",
            ImportSlot::Rules => "rules",
            ImportSlot::Examples => "examples",
            ImportSlot::Contexts => "contexts",
        }
    }

    /// Plural slots hold a list and produce indexed keys
    pub fn is_plural(self) -> bool {
        !matches!(self, ImportSlot::Persona | ImportSlot::OutputSpec)
    }
}

impl fmt::Display for ImportSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The imports section of a recipe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Imports {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<ImportRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_spec: Option<ImportRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<ImportRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ImportRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ImportRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<ImportRef>,
}

impl Imports {
    /// References held by one slot (zero or one for singular slots)
    pub fn refs(&self, slot: ImportSlot) -> &[ImportRef] {
        match slot {
            ImportSlot::Persona => self.persona.as_slice(),
            ImportSlot::OutputSpec => self.output_spec.as_slice(),
            ImportSlot::Tasks => &self.tasks,
            ImportSlot::Rules => &self.rules,
            ImportSlot::Examples => &self.examples,
            ImportSlot::Contexts => &self.contexts,
        }
    }

    /// Every import keyed as `"<slot>"` or `"<slot>[<index>]"`, in slot then list order
    pub fn entries(&self) -> Vec<(String, &ImportRef)> {
        let mut entries = Vec::new();
        for slot in ImportSlot::ALL {
            let refs = self.refs(slot);
            if slot.is_plural() {
                for (index, import) in refs.iter().enumerate() {
                    entries.push((format!("{}[{}]", slot.name(), index), import));
                }
            } else {
                entries.extend(refs.iter().map(|import| (slot.name().to_string(), import)));
            }
        }
        entries
    }

    /// Total number of imports across all slots
    pub fn len(&self) -> usize {
        ImportSlot::ALL.iter().map(|slot| self.refs(*slot).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One entry of a composition sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceItem {
    /// Reference to an import key or an import group such as `tasks`
    BlockRef(String),
    /// Text copied into the output verbatim
    Literal(String),
}

/// Two-field document shape of a sequence item
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSequenceItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    literal: Option<String>,
}

impl SequenceItem {
    /// Build from the document form; exactly one field must be set
    pub fn new(block_ref: Option<String>, literal: Option<String>) -> Result<Self, PrismError> {
        match (block_ref, literal) {
            (Some(reference), None) => Ok(SequenceItem::BlockRef(reference)),
            (None, Some(text)) => Ok(SequenceItem::Literal(text)),
            _ => Err(PrismError::construction(
                "sequence item",
                "must provide exactly one of 'block_ref' or 'literal'",
            )),
        }
    }

    pub fn block_ref(reference: impl Into<String>) -> Self {
        SequenceItem::BlockRef(reference.into())
    }

    pub fn literal(text: impl Into<String>) -> Self {
        SequenceItem::Literal(text.into())
    }
}

impl<'de> Deserialize<'de> for SequenceItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawSequenceItem::deserialize(deserializer)?;
        SequenceItem::new(raw.block_ref, raw.literal).map_err(serde::de::Error::custom)
    }
}

impl Serialize for SequenceItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw = match self {
            SequenceItem::BlockRef(reference) => RawSequenceItem {
                block_ref: Some(reference.clone()),
                literal: None,
            },
            SequenceItem::Literal(text) => RawSequenceItem {
                block_ref: None,
                literal: Some(text.clone()),
            },
        };
        raw.serialize(serializer)
    }
}

/// Ordered sequence of block references and literal text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Composition {
    pub sequence: Vec<SequenceItem>,
}

impl Composition {
    pub fn new(sequence: Vec<SequenceItem>) -> Self {
        Self { sequence }
    }
}

/// Top-level compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    pub meta: Meta,
    pub imports: Imports,
    pub composition: Composition,
}

impl Identifiable for Recipe {
    fn meta(&self) -> &Meta {
        &self.meta
    }
}
