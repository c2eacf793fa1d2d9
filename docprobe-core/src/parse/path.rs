use std::borrow::Cow;

use miette::SourceSpan;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use winnow::{
    Parser,
    combinator::eof,
    error::{ContextError, ParseError},
};

/// Characters that must be escaped when a value is substituted
/// into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Parses a path template, like `/v1/orders/{orderId}/items`.
pub fn parse(input: &str) -> Result<Vec<PathSegment<'_>>, BadPath> {
    (self::parser::template, eof)
        .map(|(segments, _)| segments)
        .parse(input)
        .map_err(BadPath::from_parse_error)
}

/// Cleans up a path token lifted from prose.
///
/// Adds a missing leading slash, drops any query string or fragment,
/// strips trailing punctuation, and rewrites Express-style `:id`
/// parameters as `{id}`.
pub fn normalize(raw: &str) -> String {
    let raw = raw.trim().trim_matches('`');
    let raw = raw.split(['?', '#']).next().unwrap_or_default();
    let raw = raw.trim_end_matches([',', '.', ';', ')', '*', '"', '\'']);
    let segments = raw
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{name}}}"),
            _ => segment.to_owned(),
        });
    let mut path = String::from("/");
    path.push_str(&itertools::join(segments, "/"));
    if raw.len() > 1 && raw.ends_with('/') {
        path.push('/');
    }
    path
}

/// Returns the names of all template parameters in `segments`, in order.
pub fn params<'a>(segments: &'a [PathSegment<'a>]) -> impl Iterator<Item = &'a str> {
    segments
        .iter()
        .flat_map(|segment| segment.fragments())
        .filter_map(|fragment| match fragment {
            &PathFragment::Param(name) => Some(name),
            PathFragment::Literal(_) => None,
        })
}

/// Renders `segments` back into a path, substituting each parameter
/// with the value returned by `value`.
///
/// Substituted values are percent-encoded. Parameters without a value
/// are written as `:name`.
pub fn render<'a>(
    segments: &[PathSegment<'a>],
    mut value: impl FnMut(&'a str) -> Option<String>,
) -> String {
    let mut path = String::new();
    for segment in segments {
        path.push('/');
        for fragment in segment.fragments() {
            match fragment {
                PathFragment::Literal(text) => {
                    path.extend(utf8_percent_encode(text, SEGMENT));
                }
                &PathFragment::Param(name) => match value(name) {
                    Some(text) => path.extend(utf8_percent_encode(&text, SEGMENT)),
                    None => {
                        path.push(':');
                        path.push_str(name);
                    }
                },
            }
        }
    }
    path
}

/// The text between two slashes, split into literal text and
/// `{name}` placeholders.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PathSegment<'input>(Vec<PathFragment<'input>>);

impl<'input> PathSegment<'input> {
    pub fn fragments(&self) -> &[PathFragment<'input>] {
        &self.0
    }
}

/// A piece of a [`PathSegment`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathFragment<'input> {
    /// Literal text.
    Literal(Cow<'input, str>),
    /// The name inside a `{name}` placeholder.
    Param(&'input str),
}

mod parser {
    use super::*;

    use winnow::{
        Parser,
        combinator::{alt, delimited, repeat},
        token::take_while,
    };

    pub fn template<'a>(input: &mut &'a str) -> winnow::Result<Vec<PathSegment<'a>>> {
        alt((
            ('/', segment, template)
                .map(|(_, head, tail)| std::iter::once(head).chain(tail).collect()),
            ('/', segment).map(|(_, segment)| vec![segment]),
            '/'.map(|_| vec![PathSegment::default()]),
        ))
        .parse_next(input)
    }

    fn segment<'a>(input: &mut &'a str) -> winnow::Result<PathSegment<'a>> {
        repeat(1.., fragment).map(PathSegment).parse_next(input)
    }

    fn fragment<'a>(input: &mut &'a str) -> winnow::Result<PathFragment<'a>> {
        alt((param, literal)).parse_next(input)
    }

    fn param<'a>(input: &mut &'a str) -> winnow::Result<PathFragment<'a>> {
        delimited(
            '{',
            take_while(1.., |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')),
            '}',
        )
        .map(PathFragment::Param)
        .parse_next(input)
    }

    fn literal<'a>(input: &mut &'a str) -> winnow::Result<PathFragment<'a>> {
        take_while(1.., |c| {
            matches!(c,
                'A'..='Z' | 'a'..='z' | '0'..='9' |
                '-' | '.' | '_' | '~' | ':' | '@' |
                '!' | '$' | '&' | '\'' | '(' | ')' |
                '*' | '+' | ',' | ';' | '=' | '%'
            )
        })
        .verify_map(|text| {
            percent_encoding::percent_decode_str(text)
                .decode_utf8()
                .ok()
                .map(PathFragment::Literal)
        })
        .parse_next(input)
    }
}

#[derive(Debug, miette::Diagnostic, thiserror::Error)]
#[error("malformed endpoint path")]
pub struct BadPath {
    #[source_code]
    code: String,
    #[label]
    span: SourceSpan,
}

impl BadPath {
    fn from_parse_error(error: ParseError<&str, ContextError>) -> Self {
        let input = *error.input();
        Self {
            code: input.to_owned(),
            span: error.char_span().into(),
        }
    }
}
