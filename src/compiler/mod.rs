//! Recipe compilation: import resolution, defaults merging and reference expansion
//!
//! Compilation runs in two phases. Phase A resolves every import slot of a
//! recipe against the [`AssetRegistry`](crate::AssetRegistry) and merges the
//! defaults for each one. Phase B walks the composition sequence, expanding
//! block references (exact keys or whole groups like `tasks`) into IR nodes
//! and collecting the runtime contracts they carry.

mod defaults;
mod recipe;

pub use defaults::merge;
pub use recipe::{compile, expand_reference, CompilerOptions, RecipeCompiler};
