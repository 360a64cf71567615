//! Template aggregation: render an [`Ir`] into one partially rendered template

use std::collections::BTreeSet;

use log::{debug, info};

use super::parser::{parse_template, VariablePath};
use super::render::{lookup_path, render_partial, Resolution};
use crate::error::PrismError;
use crate::model::{Defaults, Ir, RenderItem};

/// Concatenate every node of the IR with compile-time defaults substituted
///
/// Placeholders naming a runtime contract property are kept as `{{ name }}`.
/// Anything else that cannot be resolved is an error.
pub fn aggregate(ir: &Ir) -> Result<String, PrismError> {
    let runtime = ir.runtime_variables();
    debug!(
        "aggregating recipe '{}' with runtime variables {:?}",
        ir.source_recipe_meta.id,
        runtime
    );

    let mut output = String::new();
    for item in &ir.render_sequence {
        match item {
            RenderItem::Literal(literal) => output.push_str(&literal.content),
            RenderItem::Block(block) => {
                let content = strip_trailing_newline(&block.template_content);
                let template = parse_template(content)
                    .map_err(|err| err.into_prism(&block.source_ref, content))?;
                let rendered = render_partial(&template, &block.source_ref, |path| {
                    resolve(path, &block.merged_defaults, &runtime)
                })?;
                output.push_str(&rendered);
            }
        }
    }

    info!(
        "aggregated recipe '{}' ({} bytes)",
        ir.source_recipe_meta.id,
        output.len()
    );
    Ok(output)
}

/// Drop a single final line break, as Jinja does without `keep_trailing_newline`
fn strip_trailing_newline(content: &str) -> &str {
    content
        .strip_suffix("\r\n")
        .or_else(|| content.strip_suffix('\n'))
        .unwrap_or(content)
}

fn resolve(path: &VariablePath, defaults: &Defaults, runtime: &BTreeSet<String>) -> Resolution {
    if let Some(value) = defaults.get(path.root()) {
        return match lookup_path(value, path.fields()) {
            Some(found) => Resolution::Value(found.clone()),
            None => Resolution::Undefined,
        };
    }
    if runtime.contains(path.root()) {
        Resolution::Preserve
    } else {
        Resolution::Undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dataschema, LiteralContent, Meta, ResolvedBlock};
    use serde_json::{json, Map, Value};
    use std::collections::BTreeMap;

    fn block(source_ref: &str, template: &str, defaults: Value) -> RenderItem {
        RenderItem::Block(ResolvedBlock {
            source_ref: source_ref.to_string(),
            template_content: template.to_string(),
            runtime_contract: None,
            source_block_meta: Meta::new("blk", "Block"),
            source_variant_id: "v".to_string(),
            merged_defaults: serde_json::from_value(defaults).unwrap(),
        })
    }

    fn literal(text: &str) -> RenderItem {
        RenderItem::Literal(LiteralContent {
            content: text.to_string(),
        })
    }

    fn ir(render_sequence: Vec<RenderItem>, contracts: &[(&str, Value)]) -> Ir {
        let aggregated_contracts: BTreeMap<String, Dataschema> = contracts
            .iter()
            .map(|(id, properties)| {
                let mut data = Map::new();
                data.insert("properties".to_string(), properties.clone());
                (id.to_string(), Dataschema::new(Meta::new(*id, *id), data))
            })
            .collect();
        Ir {
            source_recipe_meta: Meta::new("rec", "Recipe"),
            render_sequence,
            aggregated_contracts,
        }
    }

    #[test]
    fn test_full_resolution_without_contracts() {
        let ir = ir(
            vec![
                block("persona", "You teach {{ language }}.", json!({"language": "Rust"})),
                literal("\n---\n"),
                block("rules[0]", "Tone: {{ style.tone }}", json!({"style": {"tone": "strict"}})),
            ],
            &[],
        );
        let output = aggregate(&ir).unwrap();
        assert_eq!(output, "You teach Rust.\n---\nTone: strict");
        assert!(!output.contains("{{"));
    }

    #[test]
    fn test_runtime_variable_preserved() {
        let ir = ir(
            vec![block("tasks[0]", "Explain:\n{{user_code}}", json!({}))],
            &[("ds_code", json!({"user_code": {"type": "string"}}))],
        );
        assert_eq!(aggregate(&ir).unwrap(), "Explain:\n{{ user_code }}");
    }

    #[test]
    fn test_default_wins_over_runtime_variable() {
        let ir = ir(
            vec![block("tasks[0]", "{{ language }}", json!({"language": "Go"}))],
            &[("ds_code", json!({"language": {"type": "string"}}))],
        );
        assert_eq!(aggregate(&ir).unwrap(), "Go");
    }

    #[test]
    fn test_undefined_variable_names_block() {
        let ir = ir(vec![block("persona", "Hi {{ audience }}", json!({}))], &[]);
        match aggregate(&ir).unwrap_err() {
            PrismError::UndefinedVariable {
                source_ref,
                variable,
            } => {
                assert_eq!(source_ref, "persona");
                assert_eq!(variable, "audience");
            }
            other => panic!("Expected UndefinedVariable, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_nested_field_reports_full_path() {
        let ir = ir(
            vec![block("rules[0]", "{{ style.length }}", json!({"style": {"tone": "strict"}}))],
            &[],
        );
        let err = aggregate(&ir).unwrap_err();
        assert_eq!(
            err.to_string(),
            "undefined variable 'style.length' in block 'rules[0]'"
        );
    }

    #[test]
    fn test_syntax_error_carries_source_ref() {
        let ir = ir(vec![block("output_spec", "{{ oops", json!({}))], &[]);
        let err = aggregate(&ir).unwrap_err();
        assert!(matches!(
            err,
            PrismError::TemplateSyntax { ref source_ref, line: 1, column: 1, .. }
                if source_ref == "output_spec"
        ));
    }

    #[test]
    fn test_one_trailing_newline_dropped() {
        let ir = ir(
            vec![
                block("persona", "Answer in {{ language }}.\n", json!({"language": "Rust"})),
                literal("\n---\n"),
                block("tasks[0]", "Keep this gap.\n\n", json!({})),
                literal("|"),
                block("tasks[1]", "Windows\r\n", json!({})),
            ],
            &[],
        );
        assert_eq!(
            aggregate(&ir).unwrap(),
            "Answer in Rust.\n---\nKeep this gap.\n|Windows"
        );
    }

    #[test]
    fn test_empty_ir() {
        assert_eq!(aggregate(&ir(vec![], &[])).unwrap(), "");
    }
}
