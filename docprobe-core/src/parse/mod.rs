//! Turns API documentation text into an unvalidated [`IntermediateModel`].

use std::path::Path;

use miette::SourceSpan;

use crate::{
    error::SerdeError,
    model::{Bounds, ParameterLocation},
};

pub mod document;
pub mod hint;
pub mod markdown;
pub mod path;

#[cfg(test)]
mod tests;

/// Parses `text` in the given format.
///
/// Markdown parsing never fails: anything the parser can't make sense of
/// is skipped, and recorded as a [`ParseWarning`] on the returned model.
/// Structured documents must deserialize cleanly.
pub fn parse(text: &str, format: SourceFormat) -> Result<IntermediateModel, SerdeError> {
    match format {
        SourceFormat::Markdown => Ok(markdown::parse(text)),
        SourceFormat::Structured => Ok(document::Document::from_text(text)?.into_model()),
    }
}

/// The syntax of an input document.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceFormat {
    /// Loosely structured Markdown prose.
    Markdown,
    /// A JSON or YAML document with explicit endpoints.
    Structured,
}

impl SourceFormat {
    /// Picks a format from a file extension, falling back to
    /// sniffing the first non-blank character of `text`.
    pub fn detect(path: &Path, text: &str) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("md" | "markdown" | "mdown" | "txt") => Self::Markdown,
            Some("json" | "yaml" | "yml") => Self::Structured,
            _ => match text.trim_start().chars().next() {
                Some('{' | '[') => Self::Structured,
                _ => Self::Markdown,
            },
        }
    }
}

/// The parser's output: everything it recognized, before normalization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntermediateModel {
    pub title: Option<String>,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub version: Option<String>,
    pub endpoints: Vec<EndpointDraft>,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EndpointDraft {
    /// The method token as written; normalized by the model builder.
    pub method: String,
    pub path: String,
    pub description: String,
    pub params: Vec<ParameterDraft>,
    pub responses: Vec<ResponseDraft>,
    pub origin: Origin,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterDraft {
    pub name: String,
    pub location: Option<ParameterLocation>,
    /// The declared type, if the source had one.
    pub raw_type: Option<String>,
    pub required: Option<bool>,
    pub description: String,
    pub example: Option<Literal>,
    pub default: Option<Literal>,
    pub allowed: Vec<Literal>,
    pub bounds: Option<Bounds>,
    pub origin: Origin,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseDraft {
    /// The status code as written, like `201` or `default`.
    pub status: String,
    pub description: String,
    pub content_type: Option<String>,
    pub origin: Origin,
}

/// A literal value from the source document.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    /// Text from a Markdown cell or list item, interpreted
    /// according to the parameter's domain.
    Text(String),
    /// An already-typed value from a structured document.
    Json(serde_json::Value),
}

/// Where a draft came from in the source text.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Origin {
    /// The 1-based line number.
    pub line: Option<usize>,
    pub span: Option<SourceSpan>,
}

impl Origin {
    pub fn new(line: usize, span: SourceSpan) -> Self {
        Self {
            line: Some(line),
            span: Some(span),
        }
    }

    pub fn warn(self, kind: ParseWarningKind) -> ParseWarning {
        ParseWarning {
            kind,
            line: self.line,
            span: self.span,
        }
    }
}

/// A non-fatal problem with the source document.
#[derive(Clone, Debug, Eq, PartialEq, miette::Diagnostic, thiserror::Error)]
#[error("{kind}")]
#[diagnostic(severity(Warning))]
pub struct ParseWarning {
    pub kind: ParseWarningKind,
    pub line: Option<usize>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ParseWarningKind {
    #[error("parameter table has no type column; its parameters default to `string`")]
    MissingTypeColumn,
    #[error("parameter table header wasn't recognized; assuming `name | type | required | description`")]
    UnrecognizedTableHeader,
    #[error("skipped a table that isn't a parameter or response table")]
    UnrecognizedTable,
    #[error("skipped a malformed row: {0}")]
    MalformedRow(String),
    #[error("skipped {0} that doesn't belong to an endpoint")]
    OrphanedBlock(&'static str),
    #[error("found {0} without a matching {1}")]
    IncompleteEndpoint(&'static str, &'static str),
    #[error("skipped endpoint with unsupported method `{0}`")]
    UnsupportedMethod(String),
    #[error("skipped endpoint with invalid path `{0}`")]
    InvalidPath(String),
    #[error("skipped response with invalid status code `{0}`")]
    InvalidStatusCode(String),
    #[error("code block is never closed")]
    UnterminatedFence,
    #[error("`{0}` is declared more than once; the last declaration wins")]
    DuplicateEndpoint(String),
    #[error("parameter `{0}` stays required; an earlier declaration requires it")]
    RequiredFlagRetained(String),
    #[error("path parameter `{0}` isn't declared; assuming a required string")]
    PathParameterSynthesized(String),
    #[error("path parameter `{0}` is marked optional; path parameters are always required")]
    OptionalPathParameter(String),
    #[error("path parameter `{0}` doesn't appear in the path")]
    UndeclaredPathParameter(String),
    #[error("skipped a parameter without a name")]
    EmptyParameterName,
    #[error("unknown parameter location `{0}`; using the method's default")]
    UnknownLocation(String),
    #[error(
        "length bound of `{0}` is larger than {limit}; testing it as unbounded",
        limit = crate::classify::LENGTH_LIMIT
    )]
    LengthLimitExceeded(String),
    #[error("documented value `{value}` of `{name}` doesn't fit its `{domain}` type; ignoring it")]
    MistypedValue {
        name: String,
        value: String,
        domain: crate::classify::Domain,
    },
}
