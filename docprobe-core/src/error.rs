use crate::parse::ParseWarning;

/// Malformed structured (JSON or YAML) API documents, with or without
/// a path to the offending node.
#[derive(Debug, thiserror::Error)]
pub enum SerdeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    JsonWithPath(#[from] serde_path_to_error::Error<serde_json::Error>),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    YamlWithPath(#[from] serde_path_to_error::Error<serde_yaml::Error>),
}

/// The document doesn't describe a single recognizable endpoint.
///
/// This is the only structural problem that's fatal; everything else is
/// repaired and reported as a [`ParseWarning`].
#[derive(Debug, miette::Diagnostic, thiserror::Error)]
#[error("document doesn't describe any API endpoints")]
#[diagnostic(
    code(docprobe::no_endpoints),
    help("declare endpoints with headings like `## POST /orders`")
)]
pub struct ValidationError {
    #[related]
    pub warnings: Vec<ParseWarning>,
}

/// A misconfigured test case generator.
#[derive(Clone, Debug, Eq, PartialEq, miette::Diagnostic, thiserror::Error)]
pub enum GenerationError {
    #[error("`{option}` can't be negative; got {value}")]
    #[diagnostic(code(docprobe::config::negative))]
    Negative { option: &'static str, value: i64 },

    #[error("`performance_threshold_ms` must be greater than zero")]
    #[diagnostic(code(docprobe::config::threshold))]
    ZeroThreshold,

    #[error("`default_base_url` must be an absolute `http` or `https` URL; got `{0}`")]
    #[diagnostic(code(docprobe::config::base_url))]
    BadBaseUrl(String),
}

/// A fatal error from [`crate::pipeline::run`].
///
/// None of these variants come with a partial [`crate::model::ApiSpec`].
#[derive(Debug, miette::Diagnostic, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to parse structured API document")]
    #[diagnostic(code(docprobe::document))]
    Document(#[source] SerdeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error("{source}")]
    #[diagnostic(code(docprobe::config))]
    Generation {
        source: GenerationError,
        #[related]
        warnings: Vec<ParseWarning>,
    },
}

impl PipelineError {
    /// Returns the warnings that were collected before the pipeline failed.
    pub fn warnings(&self) -> &[ParseWarning] {
        match self {
            Self::Document(_) => &[],
            Self::Validation(err) => &err.warnings,
            Self::Generation { warnings, .. } => warnings,
        }
    }
}
