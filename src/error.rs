//! Error types for recipe compilation
//!
//! Every failure in the core is a [`PrismError`]. Each variant carries its
//! own structured payload; [`PrismError::kind`] groups them into the closed
//! [`ErrorKind`] set and [`PrismError::describe`] is the one formatter used
//! for all of them.

use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Byte range in template text
pub type Span = std::ops::Range<usize>;

/// Kind of asset looked up in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Block,
    Variant,
    Template,
    Dataschema,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetKind::Block => "block",
            AssetKind::Variant => "variant",
            AssetKind::Template => "template",
            AssetKind::Dataschema => "dataschema",
        };
        f.write_str(name)
    }
}

/// Closed set of error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An identifier is absent from the registry
    Resolution,
    /// A raw document does not match its meta-schema
    StructuralValidation,
    /// A meta-schema shipped with the tool is itself malformed
    InternalSchema,
    /// A composition reference matches no import
    RecipeReference,
    /// Template rendering failed
    Generation,
    /// A document could not be turned into a model value
    ModelConstruction,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Resolution => "ResolutionError",
            ErrorKind::StructuralValidation => "StructuralValidationError",
            ErrorKind::InternalSchema => "InternalSchemaError",
            ErrorKind::RecipeReference => "RecipeReferenceError",
            ErrorKind::Generation => "GenerationError",
            ErrorKind::ModelConstruction => "ModelConstructionError",
        };
        f.write_str(name)
    }
}

/// A single structural validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path to the offending value (`<root>` for the document itself)
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors raised while validating, constructing, compiling or rendering
#[derive(Debug, Error)]
pub enum PrismError {
    /// Block, template or dataschema id missing from the registry
    #[error("{kind} not found: '{identifier}' (referenced by {context})")]
    NotFound {
        kind: AssetKind,
        identifier: String,
        context: String,
    },

    /// Block exists but has no variant with the requested id
    #[error(
        "variant '{variant_id}' not found in block '{block_id}' (available: {})",
        available.join(", ")
    )]
    VariantNotFound {
        block_id: String,
        variant_id: String,
        available: Vec<String>,
        context: String,
    },

    /// Raw document failed meta-schema validation
    #[error("{document} failed validation: {}", format_violations(.violations))]
    StructuralValidation {
        document: String,
        identifier: Option<String>,
        violations: Vec<Violation>,
    },

    /// Embedded meta-schema is malformed
    #[error("meta-schema '{schema}' is malformed: {}", errors.join("; "))]
    InternalSchema { schema: String, errors: Vec<String> },

    /// Composition `block_ref` that matches no compiled import
    #[error("composition reference '{reference}' is not defined in imports")]
    RecipeReference {
        reference: String,
        available: Vec<String>,
    },

    /// Placeholder that is neither a compile-time default nor a runtime variable
    #[error("undefined variable '{variable}' in block '{source_ref}'")]
    UndefinedVariable { source_ref: String, variable: String },

    /// Malformed template markup
    #[error("template syntax error in block '{source_ref}' at {line}:{column}: {message}")]
    TemplateSyntax {
        source_ref: String,
        line: usize,
        column: usize,
        message: String,
        span: Span,
        template: String,
    },

    /// Document shape rejected during model construction
    #[error("cannot construct {document}: {message}")]
    ModelConstruction { document: String, message: String },

    /// Registration key differs from the document's own `meta.id`
    #[error("{kind} registered as '{registered_as}' declares meta.id '{declared}'")]
    IdMismatch {
        kind: AssetKind,
        registered_as: String,
        declared: String,
    },
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl PrismError {
    /// Create a registry lookup failure
    pub fn not_found(
        kind: AssetKind,
        identifier: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind,
            identifier: identifier.into(),
            context: context.into(),
        }
    }

    /// Create a model construction error
    pub fn construction(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelConstruction {
            document: document.into(),
            message: message.into(),
        }
    }

    /// The category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::VariantNotFound { .. } => ErrorKind::Resolution,
            Self::StructuralValidation { .. } => ErrorKind::StructuralValidation,
            Self::InternalSchema { .. } => ErrorKind::InternalSchema,
            Self::RecipeReference { .. } => ErrorKind::RecipeReference,
            Self::UndefinedVariable { .. } | Self::TemplateSyntax { .. } => ErrorKind::Generation,
            Self::ModelConstruction { .. } | Self::IdMismatch { .. } => {
                ErrorKind::ModelConstruction
            }
        }
    }

    /// Asset kind for resolution failures
    pub fn asset_kind(&self) -> Option<AssetKind> {
        match self {
            Self::NotFound { kind, .. } => Some(*kind),
            Self::VariantNotFound { .. } => Some(AssetKind::Variant),
            Self::IdMismatch { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Structured payload as ordered key/value pairs
    pub fn context(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::NotFound {
                kind,
                identifier,
                context,
            } => vec![
                ("asset_kind", kind.to_string()),
                ("identifier", identifier.clone()),
                ("referenced_by", context.clone()),
            ],
            Self::VariantNotFound {
                block_id,
                variant_id,
                available,
                context,
            } => vec![
                ("block_id", block_id.clone()),
                ("variant_id", variant_id.clone()),
                ("available", available.join(", ")),
                ("referenced_by", context.clone()),
            ],
            Self::StructuralValidation {
                document,
                identifier,
                violations,
            } => {
                let mut pairs = vec![("document", document.clone())];
                if let Some(id) = identifier {
                    pairs.push(("identifier", id.clone()));
                }
                pairs.push(("error_count", violations.len().to_string()));
                pairs.extend(violations.iter().map(|v| ("violation", v.to_string())));
                pairs
            }
            Self::InternalSchema { schema, errors } => {
                let mut pairs = vec![("schema", schema.clone())];
                pairs.extend(errors.iter().map(|e| ("error", e.clone())));
                pairs
            }
            Self::RecipeReference {
                reference,
                available,
            } => vec![
                ("reference", reference.clone()),
                ("available", available.join(", ")),
            ],
            Self::UndefinedVariable {
                source_ref,
                variable,
            } => vec![
                ("source_ref", source_ref.clone()),
                ("variable", variable.clone()),
            ],
            Self::TemplateSyntax {
                source_ref,
                line,
                column,
                ..
            } => vec![
                ("source_ref", source_ref.clone()),
                ("location", format!("{}:{}", line, column)),
            ],
            Self::ModelConstruction { document, .. } => vec![("document", document.clone())],
            Self::IdMismatch {
                kind,
                registered_as,
                declared,
            } => vec![
                ("asset_kind", kind.to_string()),
                ("registered_as", registered_as.clone()),
                ("declared", declared.clone()),
            ],
        }
    }

    /// Render the error as `<Kind>: <message>` followed by its context lines
    pub fn describe(&self) -> String {
        let mut out = format!("{}: {}", self.kind(), self);
        let context = self.context();
        if !context.is_empty() {
            out.push_str("\n[context]");
            for (key, value) in context {
                out.push_str(&format!("\n  - {}: {}", key, value));
            }
        }
        out
    }

    /// Format a template syntax error with source context using ariadne
    ///
    /// Returns `None` for errors that carry no template text.
    pub fn format_report(&self) -> Option<String> {
        let Self::TemplateSyntax {
            source_ref,
            message,
            span,
            template,
            ..
        } = self
        else {
            return None;
        };

        let mut buf = Vec::new();
        let filename = source_ref.as_str();
        Report::build(ReportKind::Error, filename, span.start)
            .with_message(format!("template syntax error in block '{}'", source_ref))
            .with_label(
                Label::new((filename, span.clone()))
                    .with_message(message)
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(template.as_str())), &mut buf)
            .ok()?;
        Some(String::from_utf8_lossy(&buf).into_owned())
    }
}
