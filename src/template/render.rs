//! Partial rendering driven by a resolution callback

use serde_json::Value;

use super::parser::{Segment, Template, VariablePath};
use crate::error::PrismError;

/// What to do with one placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Substitute this value
    Value(Value),
    /// Leave the placeholder in the output as `{{ path }}`
    Preserve,
    /// Fail with an undefined-variable error
    Undefined,
}

/// Render `template`, asking `resolve` about every placeholder
///
/// `source_ref` names the block in error messages.
pub fn render_partial<F>(
    template: &Template,
    source_ref: &str,
    mut resolve: F,
) -> Result<String, PrismError>
where
    F: FnMut(&VariablePath) -> Resolution,
{
    let mut out = String::new();
    for segment in &template.segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Placeholder(placeholder) => match resolve(&placeholder.path) {
                Resolution::Value(value) => out.push_str(&display_value(&value)),
                Resolution::Preserve => {
                    out.push_str("{{ ");
                    out.push_str(&placeholder.path.to_string());
                    out.push_str(" }}");
                }
                Resolution::Undefined => {
                    return Err(PrismError::UndefinedVariable {
                        source_ref: source_ref.to_string(),
                        variable: placeholder.path.to_string(),
                    })
                }
            },
        }
    }
    Ok(out)
}

/// Text form of a value substituted into a template
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Walk `fields` through nested mappings starting at `root`
pub fn lookup_path<'v>(root: &'v Value, fields: &[String]) -> Option<&'v Value> {
    fields
        .iter()
        .try_fold(root, |current, field| current.as_object()?.get(field))
}
