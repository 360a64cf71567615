//! Model-code generation for runtime contracts
//!
//! The aggregated contracts of an IR describe the variables a caller must
//! supply when the template is finally rendered. A [`ModelGenerator`] turns
//! them into typed source code for that caller.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::model::Dataschema;

/// Produces source code from runtime contracts
pub trait ModelGenerator {
    /// `None` when there are no contracts
    fn generate(&self, contracts: &BTreeMap<String, Dataschema>) -> Option<String>;
}

/// Emits one serde struct per contract
#[derive(Debug, Default, Clone, Copy)]
pub struct RustModelGenerator;

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

impl ModelGenerator for RustModelGenerator {
    fn generate(&self, contracts: &BTreeMap<String, Dataschema>) -> Option<String> {
        if contracts.is_empty() {
            return None;
        }

        let mut code = String::new();
        code.push_str("//! Runtime input models generated by prism\n\n");
        code.push_str("use serde::{Deserialize, Serialize};\n");

        let mut used_names = HashSet::new();
        for (id, contract) in contracts {
            let base = struct_name(id, contract);
            let mut name = base.clone();
            let mut suffix = 2;
            while !used_names.insert(name.clone()) {
                name = format!("{}{}", base, suffix);
                suffix += 1;
            }
            code.push('\n');
            code.push_str(&render_struct(&name, contract));
        }

        Some(code)
    }
}

fn struct_name(id: &str, contract: &Dataschema) -> String {
    let name = contract
        .data
        .get("title")
        .and_then(Value::as_str)
        .map(pascal_case)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| pascal_case(id));
    if name.starts_with(|c: char| c.is_ascii_digit()) || name.is_empty() || name == "Self" {
        format!("Model{}", name)
    } else {
        name
    }
}

fn render_struct(name: &str, contract: &Dataschema) -> String {
    let mut out = String::new();

    let summary = contract
        .meta
        .description
        .as_deref()
        .unwrap_or(&contract.meta.name);
    push_doc(&mut out, "", summary);
    out.push_str("#[derive(Debug, Clone, Serialize, Deserialize)]\n");
    out.push_str(&format!("pub struct {} {{\n", name));

    let required: HashSet<&str> = contract.required().into_iter().collect();
    let mut used_fields = HashSet::new();
    if let Some(properties) = contract.properties() {
        for (property, details) in properties {
            let base = field_name(property);
            let mut field = base.clone();
            let mut suffix = 2;
            while !used_fields.insert(field.clone()) {
                field = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            render_field(
                &mut out,
                property,
                &field,
                details,
                required.contains(property.as_str()),
            );
        }
    }

    out.push_str("}\n");
    out
}

/// Doc comment with one `///` line per source line
fn push_doc(out: &mut String, indent: &str, text: &str) {
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            out.push_str(&format!("{}///\n", indent));
        } else {
            out.push_str(&format!("{}/// {}\n", indent, line));
        }
    }
}

fn render_field(out: &mut String, property: &str, field: &str, details: &Value, required: bool) {
    if let Some(description) = details.get("description").and_then(Value::as_str) {
        push_doc(out, "    ", description);
    }
    if let Some(default) = details.get("default") {
        if details.get("description").is_some() {
            out.push_str("    ///\n");
        }
        out.push_str(&format!("    /// Default: `{}`\n", default));
    }

    if field != property {
        out.push_str(&format!("    #[serde(rename = {:?})]\n", property));
    }

    let ty = rust_type(details);
    if required {
        out.push_str(&format!("    pub {}: {},\n", field, ty));
    } else {
        out.push_str("    #[serde(default)]\n");
        out.push_str(&format!("    pub {}: Option<{}>,\n", field, ty));
    }
}

/// Rust type for a property schema
fn rust_type(details: &Value) -> String {
    let declared = match details.get("type") {
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .map(str::to_string),
        Some(other) => other.as_str().map(str::to_string),
        None => None,
    };

    match declared.as_deref() {
        Some("string") => "String".to_string(),
        Some("integer") => "i64".to_string(),
        Some("number") => "f64".to_string(),
        Some("boolean") => "bool".to_string(),
        Some("array") => {
            let item = details
                .get("items")
                .map(rust_type)
                .unwrap_or_else(|| "serde_json::Value".to_string());
            format!("Vec<{}>", item)
        }
        _ => "serde_json::Value".to_string(),
    }
}

fn words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in input.chars() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn pascal_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect()
}

fn field_name(property: &str) -> String {
    let mut name = words(property)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_");
    if name.is_empty() {
        name.push_str("field");
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if RUST_KEYWORDS.contains(&name.as_str()) {
        name.push('_');
    }
    name
}
