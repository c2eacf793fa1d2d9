use std::path::Path;

use crate::{
    parse::{SourceFormat, parse},
    tests::assert_matches,
};

mod document;
mod markdown;

#[test]
fn test_detects_format_from_extension() {
    assert_eq!(
        SourceFormat::detect(Path::new("api.md"), "{}"),
        SourceFormat::Markdown
    );
    assert_eq!(
        SourceFormat::detect(Path::new("api.YAML"), "# a comment"),
        SourceFormat::Structured
    );
}

#[test]
fn test_sniffs_format_without_extension() {
    assert_eq!(
        SourceFormat::detect(Path::new("api"), "  {\"endpoints\": []}"),
        SourceFormat::Structured
    );
    assert_eq!(
        SourceFormat::detect(Path::new("-"), "# Orders API"),
        SourceFormat::Markdown
    );
}

#[test]
fn test_malformed_structured_input_fails() {
    assert_matches!(parse("{\"endpoints\": 42}", SourceFormat::Structured), Err(_));
    assert_matches!(
        parse("{\"endpoints\": 42}", SourceFormat::Markdown),
        Ok(model) if model.endpoints.is_empty(),
    );
}
