//! Template language and aggregation
//!
//! Block templates are plain text with `{{ path }}` placeholders and
//! `{# comment #}` markup. A template is parsed once into [`Template`]
//! segments and rendered through a [`Resolution`] callback, which lets the
//! aggregator substitute compile-time defaults while leaving runtime
//! variables in place for a later rendering pass.
//!
//! ```text
//! You are an expert in {{ language }}.      <- default, substituted
//! Explain this code: {{ user_code }}        <- runtime variable, preserved
//! ```

mod aggregate;
mod lexer;
mod parser;
mod render;

pub use aggregate::aggregate;
pub use lexer::Token;
pub use parser::{
    line_col, parse_template, Placeholder, Segment, Template, TemplateSyntaxError, VariablePath,
};
pub use render::{display_value, lookup_path, render_partial, Resolution};
