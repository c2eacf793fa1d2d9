//! Runs a document through parsing, building, and generation.

use log::debug;

use crate::{
    error::PipelineError,
    generate::{GeneratorConfig, TestCase, generate},
    model::{ApiSpec, Built, build},
    parse::{ParseWarning, SourceFormat, parse},
};

/// Everything a successful run produces.
#[derive(Debug)]
pub struct Generated {
    pub spec: ApiSpec,
    pub cases: Vec<TestCase>,
    /// Problems with the document that were repaired or skipped.
    pub warnings: Vec<ParseWarning>,
}

/// Parses `source`, builds its [`ApiSpec`], and generates test cases
/// for it.
///
/// Either every step succeeds, or nothing but the error (and the
/// warnings collected so far) comes back.
pub fn run(
    source: &str,
    format: SourceFormat,
    config: &GeneratorConfig,
) -> Result<Generated, PipelineError> {
    let Built { spec, warnings } = extract(source, format, &config.default_base_url)?;
    let cases = match generate(&spec, config) {
        Ok(cases) => cases,
        Err(source) => return Err(PipelineError::Generation { source, warnings }),
    };
    debug!(
        "generated {} cases for {} endpoints",
        cases.len(),
        spec.endpoints.len()
    );
    Ok(Generated {
        spec,
        cases,
        warnings,
    })
}

/// Parses `source` and builds its [`ApiSpec`], without generating
/// test cases.
pub fn extract(
    source: &str,
    format: SourceFormat,
    default_base_url: &str,
) -> Result<Built, PipelineError> {
    let model = parse(source, format).map_err(PipelineError::Document)?;
    debug!(
        "parsed {} endpoint drafts with {} warnings",
        model.endpoints.len(),
        model.warnings.len()
    );
    Ok(build(model, default_base_url)?)
}
