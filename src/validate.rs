//! Structural validation of raw documents against embedded meta-schemas
//!
//! Documents are checked before they are turned into model values so that a
//! malformed file reports every problem at once, each with a dotted path,
//! instead of failing on the first missing field.
//!
//! [`MetaSchemaValidator`] is backed by the `jsonschema` crate (Draft 2020-12).

use std::sync::OnceLock;

use jsonschema::paths::{Location, LocationSegment};
use jsonschema::ValidationError;
use serde_json::Value;

use crate::error::{PrismError, Violation};

const ROOT_PATH: &str = "<root>";

/// Checks a payload against a schema
pub trait SchemaValidator {
    /// Collect every violation of `schema` by `payload`
    ///
    /// `Err` is reserved for a malformed schema.
    fn validate(
        &self,
        schema_name: &str,
        schema: &Value,
        payload: &Value,
    ) -> Result<Vec<Violation>, PrismError>;
}

/// Draft 2020-12 validator
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaSchemaValidator;

impl MetaSchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Verify a schema against the Draft 2020-12 meta-schema
    pub fn check_schema(schema_name: &str, schema: &Value) -> Result<(), PrismError> {
        let errors: Vec<String> = jsonschema::draft202012::meta::VALIDATOR
            .iter_errors(schema)
            .map(|error| describe_schema_error(&error))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(internal(schema_name, errors))
        }
    }
}

impl SchemaValidator for MetaSchemaValidator {
    fn validate(
        &self,
        schema_name: &str,
        schema: &Value,
        payload: &Value,
    ) -> Result<Vec<Violation>, PrismError> {
        Self::check_schema(schema_name, schema)?;
        let validator = jsonschema::draft202012::new(schema)
            .map_err(|error| internal(schema_name, vec![describe_schema_error(&error)]))?;

        let mut violations: Vec<Violation> = validator
            .iter_errors(payload)
            .map(|error| Violation::new(dotted_path(&error.instance_path), error.to_string()))
            .collect();
        violations.sort_by(|a, b| (&a.path, &a.message).cmp(&(&b.path, &b.message)));
        Ok(violations)
    }
}

fn internal(schema_name: &str, errors: Vec<String>) -> PrismError {
    PrismError::InternalSchema {
        schema: schema_name.to_string(),
        errors,
    }
}

fn describe_schema_error(error: &ValidationError<'_>) -> String {
    format!("{}: {}", dotted_path(&error.instance_path), error)
}

/// `/imports/tasks/0` becomes `imports.tasks.0`
fn dotted_path(location: &Location) -> String {
    let segments: Vec<String> = location
        .into_iter()
        .map(|segment| match segment {
            LocationSegment::Property(name) => name.replace("~1", "/").replace("~0", "~"),
            LocationSegment::Index(index) => index.to_string(),
        })
        .collect();
    if segments.is_empty() {
        ROOT_PATH.to_string()
    } else {
        segments.join(".")
    }
}

/// Meta-schemas shipped with the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaSchema {
    Block,
    Dataschema,
    Recipe,
}

impl MetaSchema {
    /// File name the meta-schema is embedded from
    pub fn name(self) -> &'static str {
        match self {
            MetaSchema::Block => "block.schema.yaml",
            MetaSchema::Dataschema => "dataschema.schema.yaml",
            MetaSchema::Recipe => "recipe.schema.yaml",
        }
    }

    fn source(self) -> &'static str {
        match self {
            MetaSchema::Block => include_str!("schemas/block.schema.yaml"),
            MetaSchema::Dataschema => include_str!("schemas/dataschema.schema.yaml"),
            MetaSchema::Recipe => include_str!("schemas/recipe.schema.yaml"),
        }
    }

    fn cell(self) -> &'static OnceLock<Result<Value, String>> {
        static BLOCK: OnceLock<Result<Value, String>> = OnceLock::new();
        static DATASCHEMA: OnceLock<Result<Value, String>> = OnceLock::new();
        static RECIPE: OnceLock<Result<Value, String>> = OnceLock::new();
        match self {
            MetaSchema::Block => &BLOCK,
            MetaSchema::Dataschema => &DATASCHEMA,
            MetaSchema::Recipe => &RECIPE,
        }
    }

    /// Parsed meta-schema, loaded once per process
    pub fn load(self) -> Result<&'static Value, PrismError> {
        self.cell()
            .get_or_init(|| serde_yaml::from_str(self.source()).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|message| PrismError::InternalSchema {
                schema: self.name().to_string(),
                errors: vec![message.clone()],
            })
    }
}

/// `meta.id` of a raw document, if it has one
pub fn document_identifier(payload: &Value) -> Option<String> {
    payload
        .get("meta")?
        .get("id")?
        .as_str()
        .map(str::to_string)
}

/// Validate `payload` against a shipped meta-schema
///
/// `document` names the payload in the error, e.g. `block 'blk_persona'`.
pub fn validate_document(
    validator: &dyn SchemaValidator,
    meta_schema: MetaSchema,
    document: &str,
    payload: &Value,
) -> Result<(), PrismError> {
    let schema = meta_schema.load()?;
    let violations = validator.validate(meta_schema.name(), schema, payload)?;
    if violations.is_empty() {
        return Ok(());
    }
    Err(PrismError::StructuralValidation {
        document: document.to_string(),
        identifier: document_identifier(payload),
        violations,
    })
}
