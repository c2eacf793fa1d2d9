//! The canonical API description that test cases are generated from.
//!
//! An [`ApiSpec`] is immutable once [`builder::build`] returns it.

use std::{fmt::Display, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use unicase::UniCase;

use crate::classify::Domain;

pub mod builder;


pub use builder::{Built, build};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ApiSpec {
    pub title: String,
    pub description: String,
    pub base_url: String,
    pub version: String,
    pub endpoints: Vec<Endpoint>,
}

impl ApiSpec {
    pub fn endpoint(&self, method: Method, path: &str) -> Option<&Endpoint> {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.method == method && endpoint.path == path)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Endpoint {
    pub path: String,
    pub method: Method,
    pub description: String,
    /// Parameters, grouped by location in [`ParameterLocation`] order.
    pub params: Vec<Parameter>,
    /// Documented responses, keyed by status code.
    pub responses: IndexMap<String, ResponseSpec>,
}

impl Endpoint {
    #[inline]
    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            method: self.method,
            path: self.path.clone(),
        }
    }

    #[inline]
    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|param| param.name == name)
    }

    pub fn params_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.params
            .iter()
            .filter(move |param| param.location == location)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(|param| param.required)
    }
}

/// Identifies an endpoint within an [`ApiSpec`].
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct EndpointKey {
    pub method: Method,
    pub path: String,
}

impl Display for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(rename = "type")]
    pub domain: Domain,
    pub required: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

/// Numeric bounds for numbers, or length bounds for strings and arrays.
/// Both ends are inclusive.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Bounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Bounds {
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    /// Combines `self` with `other`, preferring `self`'s ends.
    pub fn or(self, other: Option<Bounds>) -> Self {
        let other = other.unwrap_or_default();
        Self {
            min: self.min.or(other.min),
            max: self.max.or(other.max),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }

    /// Returns `true` if repeating a request shouldn't change its result.
    #[inline]
    pub fn is_idempotent(self) -> bool {
        matches!(self, Self::Get | Self::Put | Self::Delete)
    }

    /// Where parameters go when the documentation doesn't say.
    #[inline]
    pub fn default_location(self) -> ParameterLocation {
        match self {
            Self::Post | Self::Put | Self::Patch => ParameterLocation::Body,
            Self::Get | Self::Delete => ParameterLocation::Query,
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = UniCase::new(s.trim());
        Self::ALL
            .into_iter()
            .find(|method| UniCase::new(method.as_str()) == name)
            .ok_or_else(|| UnknownMethod(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown HTTP method `{0}`")]
pub struct UnknownMethod(String);

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Body,
}

impl ParameterLocation {
    pub const ALL: [ParameterLocation; 4] = [
        ParameterLocation::Path,
        ParameterLocation::Query,
        ParameterLocation::Header,
        ParameterLocation::Body,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Body => "body",
        }
    }
}

impl Display for ParameterLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterLocation {
    type Err = UnknownLocation;

    /// Parses a location name, accepting the synonyms that
    /// documentation commonly uses for each.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const SYNONYMS: &[(&str, ParameterLocation)] = &[
            ("path", ParameterLocation::Path),
            ("url", ParameterLocation::Path),
            ("路径", ParameterLocation::Path),
            ("query", ParameterLocation::Query),
            ("querystring", ParameterLocation::Query),
            ("查询", ParameterLocation::Query),
            ("header", ParameterLocation::Header),
            ("headers", ParameterLocation::Header),
            ("请求头", ParameterLocation::Header),
            ("body", ParameterLocation::Body),
            ("form", ParameterLocation::Body),
            ("formdata", ParameterLocation::Body),
            ("json", ParameterLocation::Body),
            ("payload", ParameterLocation::Body),
            ("请求体", ParameterLocation::Body),
        ];
        let name = UniCase::new(s.trim());
        SYNONYMS
            .iter()
            .find(|&&(synonym, _)| UniCase::new(synonym) == name)
            .map(|&(_, location)| location)
            .ok_or_else(|| UnknownLocation(s.to_owned()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown parameter location `{0}`")]
pub struct UnknownLocation(String);

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ResponseSpec {
    pub status_code: u16,
    pub description: String,
    pub content_type: String,
}

impl ResponseSpec {
    pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

    /// The response assumed for endpoints that don't document any.
    pub fn default_success() -> Self {
        Self {
            status_code: 200,
            description: "Success response".to_owned(),
            content_type: Self::DEFAULT_CONTENT_TYPE.to_owned(),
        }
    }
}
