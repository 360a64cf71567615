//! Template parsing: split raw text from `{{ }}`, `{# #}` and `{% %}` markup
//!
//! Raw text is scanned by hand. The inside of each `{{ ... }}` is lexed with
//! [`lex`](super::lexer::lex) and parsed with chumsky into a [`VariablePath`].

use std::fmt;

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::lexer::{lex, Token};
use crate::error::{PrismError, Span};

/// Dotted variable reference such as `language` or `settings.tone`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePath {
    segments: Vec<String>,
}

impl VariablePath {
    /// Build a path; `segments` must not be empty
    pub fn new(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    /// The first segment, which decides how the placeholder resolves
    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// Segments after the root
    pub fn fields(&self) -> &[String] {
        &self.segments[1..]
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// A `{{ path }}` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub path: VariablePath,
    /// Byte range of the whole `{{ ... }}` in the template
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Placeholder(Placeholder),
}

/// Parsed template
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Template {
    pub segments: Vec<Segment>,
}

impl Template {
    /// All placeholders in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(placeholder) => Some(placeholder),
            Segment::Text(_) => None,
        })
    }
}

/// Malformed markup, located by byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSyntaxError {
    pub message: String,
    pub span: Span,
}

impl TemplateSyntaxError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Attach the owning block and template text, computing line and column
    pub fn into_prism(self, source_ref: &str, template: &str) -> PrismError {
        let (line, column) = line_col(template, self.span.start);
        PrismError::TemplateSyntax {
            source_ref: source_ref.to_string(),
            line,
            column,
            message: self.message,
            span: self.span,
            template: template.to_string(),
        }
    }
}

/// 1-based line and column (in characters) of a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Parse template text
pub fn parse_template(source: &str) -> Result<Template, TemplateSyntaxError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while let Some(found) = source[pos..].find('{') {
        let start = pos + found;
        let rest = &source[start..];

        if rest.starts_with("{{") {
            let close = find_close(source, start, "}}").ok_or_else(|| {
                TemplateSyntaxError::new("unterminated expression", start..source.len())
            })?;
            text.push_str(&source[pos..start]);
            if !text.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut text)));
            }
            let path = parse_expression(source, start, close)?;
            segments.push(Segment::Placeholder(Placeholder {
                path,
                span: start..close + 2,
            }));
            pos = close + 2;
        } else if rest.starts_with("{#") {
            let close = find_close(source, start, "#}").ok_or_else(|| {
                TemplateSyntaxError::new("unterminated comment", start..source.len())
            })?;
            text.push_str(&source[pos..start]);
            pos = close + 2;
        } else if rest.starts_with("{%") {
            let end = find_close(source, start, "%}").map_or(start + 2, |close| close + 2);
            return Err(TemplateSyntaxError::new(
                "statement tags '{% %}' are not supported",
                start..end,
            ));
        } else {
            text.push_str(&source[pos..=start]);
            pos = start + 1;
        }
    }

    text.push_str(&source[pos..]);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(Template { segments })
}

/// Byte offset of the closing delimiter for markup opened at `open`
fn find_close(source: &str, open: usize, delimiter: &str) -> Option<usize> {
    let body = open + 2;
    source[body..].find(delimiter).map(|i| body + i)
}

/// Parse the inside of `{{ ... }}` spanning `open..close + 2`
fn parse_expression(
    source: &str,
    open: usize,
    close: usize,
) -> Result<VariablePath, TemplateSyntaxError> {
    let body_start = open + 2;
    let body = &source[body_start..close];
    if body.trim().is_empty() {
        return Err(TemplateSyntaxError::new("empty expression", open..close + 2));
    }

    let tokens = lex(body, body_start).map_err(|span| {
        let found = source[span.clone()].chars().next().unwrap_or(' ');
        TemplateSyntaxError::new(format!("unexpected character '{}'", found), span)
    })?;

    let token_iter = tokens.into_iter().map(|(tok, span)| (tok, span.into()));
    let token_stream =
        Stream::from_iter(token_iter).map((close..close).into(), |(t, s): (_, _)| (t, s));

    path_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| match errs.into_iter().next() {
            Some(err) => rich_to_syntax_error(&err),
            None => TemplateSyntaxError::new("invalid expression", open..close + 2),
        })
}

fn path_parser<'a, I>() -> impl Parser<'a, I, VariablePath, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(name) => name,
    };

    identifier
        .separated_by(just(Token::Dot))
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|segments| VariablePath { segments })
}

fn rich_to_syntax_error(err: &Rich<'_, Token>) -> TemplateSyntaxError {
    use chumsky::error::RichPattern;

    let found = match err.found() {
        Some(tok) => tok.to_string(),
        None => "end of expression".to_string(),
    };

    let expected: Vec<String> = err
        .expected()
        .filter_map(|pattern| match pattern {
            RichPattern::Token(tok) => Some(describe_token(tok)),
            RichPattern::Label(label) => Some(label.to_string()),
            RichPattern::EndOfInput => Some("'}}'".to_string()),
            _ => None,
        })
        .collect();

    let message = if expected.is_empty() {
        format!("unexpected {}", found)
    } else {
        format!("unexpected {}, expected {}", found, expected.join(" or "))
    };

    TemplateSyntaxError::new(message, err.span().into_range())
}

fn describe_token(token: &Token) -> String {
    match token {
        Token::Ident(_) => "identifier".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(source: &str) -> Vec<String> {
        parse_template(source)
            .expect("Should parse")
            .placeholders()
            .map(|p| p.path.to_string())
            .collect()
    }

    #[test]
    fn test_text_and_placeholders() {
        let template = parse_template("Hello {{ name }}, you teach {{language}}.").unwrap();
        assert_eq!(template.segments.len(), 5);
        assert_eq!(template.segments[0], Segment::Text("Hello ".to_string()));
        assert_eq!(
            paths("Hello {{ name }}, you teach {{language}}."),
            vec!["name", "language"]
        );
    }

    #[test]
    fn test_dotted_path() {
        let template = parse_template("{{ style.tone.level }}").unwrap();
        let placeholder = template.placeholders().next().unwrap();
        assert_eq!(placeholder.path.root(), "style");
        assert_eq!(placeholder.path.fields(), ["tone", "level"]);
        assert_eq!(placeholder.span, 0..22);
    }

    #[test]
    fn test_comments_dropped() {
        let template = parse_template("a{# note {{ x }} #}b").unwrap();
        assert_eq!(template.segments, vec![Segment::Text("ab".to_string())]);
    }

    #[test]
    fn test_single_braces_are_text() {
        let template = parse_template(r#"{"confidence": 1} {x}"#).unwrap();
        assert_eq!(
            template.segments,
            vec![Segment::Text(r#"{"confidence": 1} {x}"#.to_string())]
        );
    }

    #[test]
    fn test_unterminated_expression() {
        let err = parse_template("Hello {{ name").unwrap_err();
        assert_eq!(err.message, "unterminated expression");
        assert_eq!(err.span, 6..13);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = parse_template("{# never closed").unwrap_err();
        assert_eq!(err.message, "unterminated comment");
    }

    #[test]
    fn test_empty_expression() {
        let err = parse_template("x {{   }}").unwrap_err();
        assert_eq!(err.message, "empty expression");
        assert_eq!(err.span, 2..9);
    }

    #[test]
    fn test_statement_tag_rejected() {
        let err = parse_template("{% if x %}y{% endif %}").unwrap_err();
        assert!(err.message.contains("not supported"));
        assert_eq!(err.span, 0..10);
    }

    #[test]
    fn test_stray_tokens_rejected() {
        let err = parse_template("{{ name | upper }}").unwrap_err();
        assert!(err.message.starts_with("unexpected '|'"), "{}", err.message);
        assert_eq!(err.span, 8..9);

        let err = parse_template("{{ greet('x') }}").unwrap_err();
        assert!(err.message.starts_with("unexpected '('"), "{}", err.message);

        let err = parse_template("{{ name. }}").unwrap_err();
        assert!(err.message.contains("end of expression"), "{}", err.message);
    }

    #[test]
    fn test_unknown_character() {
        let err = parse_template("{{ a ~ b }}").unwrap_err();
        assert_eq!(err.message, "unexpected character '~'");
        assert_eq!(err.span, 5..6);
    }

    #[test]
    fn test_line_col() {
        let source = "line one\nline {{ two";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 14), (2, 6));

        let err = parse_template(source).unwrap_err().into_prism("persona", source);
        match err {
            PrismError::TemplateSyntax { line, column, .. } => {
                assert_eq!((line, column), (2, 6));
            }
            other => panic!("Expected TemplateSyntax, got {:?}", other),
        }
    }
}
