//! End-to-end compilation of the code-explainer recipe

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use prism::model::RenderItem;
use prism::project::{ProjectConfig, ProjectLoader};
use prism::{compile_sources, CompilerOptions, PipelineOptions};

const EXPECTED_TEMPLATE: &str = "You are an expert TypeScript teacher. Your tone is strict.\
\n\n---\n\n\
Explain the following code:\n\n{{ user_code }}\
\n\n### REQUIRED OUTPUT FORMAT\n\
Respond with JSON including a confidence score (default 0.95).";

#[test]
fn test_render_sequence_shape() {
    let artifacts = compile_sources(&common::happypath(), &PipelineOptions::default())
        .expect("Should compile");
    let ir = &artifacts.ir;

    assert_eq!(ir.source_recipe_meta.id, "rec_code_explainer");
    assert_eq!(ir.render_sequence.len(), 5);

    let refs: Vec<&str> = ir
        .resolved_blocks()
        .map(|block| block.source_ref.as_str())
        .collect();
    assert_eq!(refs, vec!["persona", "tasks[0]", "output_spec"]);
    assert_eq!(ir.render_sequence[1].as_literal(), Some("\n\n---\n\n"));
    assert!(matches!(ir.render_sequence[4], RenderItem::Block(_)));

    assert_eq!(
        ir.aggregated_contracts.keys().collect::<Vec<_>>(),
        vec!["ds_code_input"]
    );
}

#[test]
fn test_variant_defaults_override_block_defaults() {
    let artifacts = compile_sources(&common::happypath(), &PipelineOptions::default())
        .expect("Should compile");
    let persona = artifacts.ir.render_sequence[0]
        .as_block()
        .expect("persona node");

    assert_eq!(persona.source_variant_id, "expert_teacher");
    assert_eq!(persona.merged_defaults["language"], json!("TypeScript"));
    assert_eq!(persona.merged_defaults["teaching_tone"], json!("strict"));
    assert!(persona.runtime_contract.is_none());

    let output_spec = artifacts.ir.render_sequence[4]
        .as_block()
        .expect("output node");
    assert_eq!(
        output_spec.merged_defaults["confidence_score_default"],
        json!(0.95)
    );
}

#[test]
fn test_partial_render() {
    let artifacts = compile_sources(&common::happypath(), &PipelineOptions::default())
        .expect("Should compile");
    let output = &artifacts.template_content;

    assert!(output.contains("TypeScript"));
    assert!(output.contains("strict"));
    assert!(output.contains("\n\n---\n\n"));
    assert!(output.contains("\n\n### REQUIRED OUTPUT FORMAT\n"));
    assert!(output.contains("{{ user_code }}"));
    assert!(output.contains("0.95"));
    assert!(!output.contains("JavaScript"));
    assert_eq!(output, EXPECTED_TEMPLATE);
}

#[test]
fn test_generated_models() {
    let artifacts = compile_sources(&common::happypath(), &PipelineOptions::default())
        .expect("Should compile");
    let model_code = artifacts.model_code.expect("one contract yields models");

    insta::assert_snapshot!(model_code, @r###"
    //! Runtime input models generated by prism

    use serde::{Deserialize, Serialize};

    /// Source code supplied by the user
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct CodeInput {
        /// The code to explain
        pub user_code: String,
    }
    "###);
}

#[test]
fn test_schema_defaults_tier() {
    let mut sources = common::happypath();
    sources.dataschemas.get_mut("ds_code_input").expect("contract")["data"]["properties"]
        ["audience"] = json!({"type": "string", "default": "beginners"});
    sources.templates.insert(
        "tpl_explain_code".to_string(),
        "Explain {{ user_code }} for {{ audience }}.".to_string(),
    );

    let with_schema = compile_sources(&sources, &PipelineOptions::default()).expect("compile");
    assert!(with_schema
        .template_content
        .contains("Explain {{ user_code }} for beginners."));

    let options = PipelineOptions::new().with_compiler(CompilerOptions {
        schema_defaults: false,
    });
    let without_schema = compile_sources(&sources, &options).expect("compile");
    assert!(without_schema
        .template_content
        .contains("Explain {{ user_code }} for {{ audience }}."));
}

#[test]
fn test_compile_is_repeatable() {
    let sources = common::happypath();
    let first = compile_sources(&sources, &PipelineOptions::default()).expect("compile");
    let second = compile_sources(&sources, &PipelineOptions::default()).expect("compile");

    assert_eq!(first.template_content, second.template_content);
    assert_eq!(first.ir, second.ir);
}

#[test]
fn test_project_loader_matches_in_memory_sources() {
    let config_path = common::happypath_dir().join("prism.toml");
    let config = ProjectConfig::load(&config_path).expect("fixture config");
    let mut loader = ProjectLoader::new(&config);

    assert_eq!(
        loader.recipe_names().expect("recipes"),
        vec!["rec_code_explainer"]
    );

    let sources = loader
        .load_for_recipe("rec_code_explainer")
        .expect("load recipe");
    assert_eq!(sources.blocks.len(), 3);
    assert_eq!(sources.templates.len(), 3);

    let artifacts = compile_sources(&sources, &config.pipeline_options()).expect("compile");
    assert_eq!(artifacts.template_content, EXPECTED_TEMPLATE);
    assert!(config
        .template_output("rec_code_explainer")
        .ends_with("outputs/rec_code_explainer.jinja"));
}
