//! Shared fixture loading for integration tests

#![allow(dead_code)]

use std::path::PathBuf;

use prism::CompilationSources;
use serde_json::Value;

fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).expect("fixture is valid YAML")
}

/// Root of the happy-path fixture project
pub fn happypath_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/happypath")
}

/// The code-explainer recipe with its blocks, contract and templates
pub fn happypath() -> CompilationSources {
    let mut sources = CompilationSources::new(yaml(include_str!(
        "../fixtures/happypath/recipes/rec_code_explainer.recipe.yaml"
    )));

    for (id, text) in [
        (
            "blk_persona",
            include_str!("../fixtures/happypath/blocks/blk_persona.block.yaml"),
        ),
        (
            "blk_task",
            include_str!("../fixtures/happypath/blocks/blk_task.block.yaml"),
        ),
        (
            "blk_output",
            include_str!("../fixtures/happypath/blocks/blk_output.block.yml"),
        ),
    ] {
        sources.blocks.insert(id.to_string(), yaml(text));
    }

    sources.dataschemas.insert(
        "ds_code_input".to_string(),
        yaml(include_str!(
            "../fixtures/happypath/dataschemas/ds_code_input.dataschema.yaml"
        )),
    );

    for (id, text) in [
        (
            "tpl_expert_teacher",
            include_str!("../fixtures/happypath/templates/tpl_expert_teacher.jinja"),
        ),
        (
            "tpl_explain_code",
            include_str!("../fixtures/happypath/templates/tpl_explain_code.jinja"),
        ),
        (
            "tpl_json_detailed",
            include_str!("../fixtures/happypath/templates/tpl_json_detailed.jinja"),
        ),
    ] {
        sources.templates.insert(id.to_string(), text.to_string());
    }

    sources
}
