//! Structured (JSON or YAML) API documents.
//!
//! Endpoints list their parameters either flat, with an `in` location
//! on each parameter, or grouped into `path_parameters`,
//! `query_parameters`, `header_parameters`, and `request_body`.

use std::fmt::Display;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
    error::SerdeError,
    model::{Bounds, ParameterLocation},
};

use super::{
    EndpointDraft, IntermediateModel, Literal, Origin, ParameterDraft, ParseWarning,
    ParseWarningKind, ResponseDraft, hint,
};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "baseUrl", alias = "base_path")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<DocumentEndpoint>,
}

impl Document {
    pub fn from_yaml(yaml: &str) -> Result<Self, SerdeError> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml);
        let result = serde_path_to_error::deserialize(deserializer)?;
        Ok(result)
    }

    pub fn from_json(json: &str) -> Result<Self, SerdeError> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let result = serde_path_to_error::deserialize(&mut deserializer)?;
        deserializer.end()?;
        Ok(result)
    }

    /// Parses a JSON or YAML document, picking the parser by
    /// the first character.
    pub fn from_text(text: &str) -> Result<Self, SerdeError> {
        match text.trim_start().chars().next() {
            Some('{') => Self::from_json(text),
            _ => Self::from_yaml(text),
        }
    }

    pub fn into_model(self) -> IntermediateModel {
        let mut warnings = vec![];
        let endpoints = self
            .endpoints
            .into_iter()
            .map(|endpoint| endpoint.into_draft(&mut warnings))
            .collect();
        IntermediateModel {
            title: self.title,
            description: self.description,
            base_url: self.base_url,
            version: self.version,
            endpoints,
            warnings,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DocumentEndpoint {
    pub path: String,
    pub method: String,
    #[serde(default, alias = "summary")]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<DocumentParameter>,
    #[serde(default)]
    pub path_parameters: Vec<DocumentParameter>,
    #[serde(default)]
    pub query_parameters: Vec<DocumentParameter>,
    #[serde(default, alias = "headers")]
    pub header_parameters: Vec<DocumentParameter>,
    #[serde(default)]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: Responses,
}

impl DocumentEndpoint {
    fn into_draft(self, warnings: &mut Vec<ParseWarning>) -> EndpointDraft {
        let grouped = [
            (None, self.parameters),
            (Some(ParameterLocation::Path), self.path_parameters),
            (Some(ParameterLocation::Query), self.query_parameters),
            (Some(ParameterLocation::Header), self.header_parameters),
            (
                Some(ParameterLocation::Body),
                self.request_body.map(|body| body.parameters).unwrap_or_default(),
            ),
        ];
        let params = grouped
            .into_iter()
            .flat_map(|(location, params)| params.into_iter().map(move |p| (location, p)))
            .map(|(location, param)| param.into_draft(location, warnings))
            .collect();
        let responses = match self.responses {
            Responses::Map(map) => map
                .into_iter()
                .map(|(status, response)| response.into_draft(Some(status)))
                .collect(),
            Responses::List(list) => list
                .into_iter()
                .map(|response| response.into_draft(None))
                .collect(),
        };
        EndpointDraft {
            method: self.method,
            path: self.path,
            description: self.description,
            params,
            responses,
            origin: Origin::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub parameters: Vec<DocumentParameter>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DocumentParameter {
    pub name: String,
    #[serde(default, rename = "in", alias = "location")]
    pub location: Option<String>,
    #[serde(default, rename = "type", alias = "data_type")]
    pub raw_type: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub example: Option<serde_json::Value>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default, rename = "enum", alias = "allowed_values")]
    pub allowed: Vec<serde_json::Value>,
    #[serde(default, alias = "min")]
    pub minimum: Option<f64>,
    #[serde(default, alias = "max")]
    pub maximum: Option<f64>,
    #[serde(default, alias = "minLength")]
    pub min_length: Option<f64>,
    #[serde(default, alias = "maxLength")]
    pub max_length: Option<f64>,
    /// A free-text range, like `1-100`.
    #[serde(default)]
    pub range: Option<String>,
}

impl DocumentParameter {
    fn into_draft(
        self,
        group: Option<ParameterLocation>,
        warnings: &mut Vec<ParseWarning>,
    ) -> ParameterDraft {
        let location = match self.location.as_deref().map(str::parse::<ParameterLocation>) {
            Some(Ok(location)) => Some(location),
            Some(Err(_)) => {
                let location = self.location.clone().unwrap_or_default();
                warnings.push(Origin::default().warn(ParseWarningKind::UnknownLocation(location)));
                group
            }
            None => group,
        };
        let bounds = [
            Bounds {
                min: self.minimum,
                max: self.maximum,
            },
            Bounds {
                min: self.min_length,
                max: self.max_length,
            },
        ]
        .into_iter()
        .find(|bounds| !bounds.is_empty())
        .or_else(|| self.range.as_deref().and_then(hint::bounds));
        let mut draft = ParameterDraft {
            name: self.name,
            location,
            raw_type: self.raw_type,
            required: self.required,
            description: self.description,
            example: self.example.map(Literal::Json),
            default: self.default.map(Literal::Json),
            allowed: self.allowed.into_iter().map(Literal::Json).collect(),
            bounds,
            origin: Origin::default(),
        };
        let raw_type = draft.raw_type.clone();
        hint::apply(&mut draft, raw_type.as_deref());
        draft
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Responses {
    Map(IndexMap<Scalar, DocumentResponse>),
    List(Vec<DocumentResponse>),
}

impl Default for Responses {
    fn default() -> Self {
        Self::List(vec![])
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DocumentResponse {
    #[serde(default, alias = "status", alias = "code")]
    pub status_code: Option<Scalar>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl DocumentResponse {
    fn into_draft(self, key: Option<Scalar>) -> ResponseDraft {
        ResponseDraft {
            status: self
                .status_code
                .or(key)
                .map(|status| status.to_string())
                .unwrap_or_default(),
            description: self.description,
            content_type: self.content_type,
            origin: Origin::default(),
        }
    }
}

/// A status code, which YAML documents may write as a number.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Text(String),
}

impl Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}
