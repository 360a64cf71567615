//! Data model for blocks, dataschemas, recipes and the compiled IR
//!
//! All document types deserialize with `serde` and reject unknown fields.
//! Values are immutable once constructed; the compiler only reads them.

mod block;
mod dataschema;
mod ir;
mod meta;
mod recipe;

use std::collections::BTreeMap;

pub use block::{Block, BlockType, Variant};
pub use dataschema::Dataschema;
pub use ir::{Ir, LiteralContent, RenderItem, ResolvedBlock};
pub use meta::{Identifiable, Meta};
pub use recipe::{Composition, ImportRef, ImportSlot, Imports, Recipe, SequenceItem};

/// Key/value defaults attached to blocks, variants and schema properties
pub type Defaults = BTreeMap<String, serde_json::Value>;
