//! Validates and normalizes an [`IntermediateModel`] into an [`ApiSpec`].

use indexmap::{IndexMap, map::Entry};
use log::debug;
use serde_json::Value;

use crate::{
    classify::{Domain, classify, exceeds_length_limit},
    error::ValidationError,
    parse::{
        EndpointDraft, IntermediateModel, Literal, Origin, ParameterDraft, ParseWarning,
        ParseWarningKind, ResponseDraft, path,
    },
};

use super::{ApiSpec, Endpoint, EndpointKey, Method, Parameter, ParameterLocation, ResponseSpec};

const DEFAULT_TITLE: &str = "API Documentation";
const DEFAULT_VERSION: &str = "1.0.0";

/// A built [`ApiSpec`], with the warnings collected while parsing
/// and building it.
#[derive(Debug)]
pub struct Built {
    pub spec: ApiSpec,
    pub warnings: Vec<ParseWarning>,
}

/// Builds an [`ApiSpec`] from a parsed model.
///
/// Duplicate endpoints are resolved last-wins, but a parameter that an
/// earlier declaration required stays required. Path parameters that the
/// path references but the documentation never declares are synthesized
/// as required strings.
///
/// Fails only if `model` has no usable endpoints.
pub fn build(model: IntermediateModel, default_base_url: &str) -> Result<Built, ValidationError> {
    let IntermediateModel {
        title,
        description,
        base_url,
        version,
        endpoints: drafts,
        mut warnings,
    } = model;

    let mut endpoints = IndexMap::<EndpointKey, Endpoint>::new();
    for draft in drafts {
        let origin = draft.origin;
        let Some(mut endpoint) = build_endpoint(draft, &mut warnings) else {
            continue;
        };
        match endpoints.entry(endpoint.key()) {
            Entry::Vacant(entry) => {
                entry.insert(endpoint);
            }
            Entry::Occupied(mut entry) => {
                warnings.push(origin.warn(ParseWarningKind::DuplicateEndpoint(
                    entry.key().to_string(),
                )));
                retain_required(entry.get(), &mut endpoint, origin, &mut warnings);
                entry.insert(endpoint);
            }
        }
    }

    if endpoints.is_empty() {
        return Err(ValidationError { warnings });
    }
    debug!("built {} endpoints", endpoints.len());

    let base_url = base_url
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| default_base_url.to_owned());

    Ok(Built {
        spec: ApiSpec {
            title: non_empty(title).unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
            description: description.unwrap_or_default().trim().to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            version: non_empty(version).unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
            endpoints: endpoints.into_values().collect(),
        },
        warnings,
    })
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

fn build_endpoint(draft: EndpointDraft, warnings: &mut Vec<ParseWarning>) -> Option<Endpoint> {
    let origin = draft.origin;
    let Ok(method) = draft.method.parse::<Method>() else {
        warnings.push(origin.warn(ParseWarningKind::UnsupportedMethod(draft.method)));
        return None;
    };

    let path = path::normalize(&draft.path);
    let template: Vec<String> = match path::parse(&path) {
        Ok(segments) => path::params(&segments).map(str::to_owned).collect(),
        Err(_) => {
            warnings.push(origin.warn(ParseWarningKind::InvalidPath(draft.path)));
            return None;
        }
    };

    let mut params = IndexMap::<(ParameterLocation, String), Parameter>::new();
    for param in draft.params {
        let origin = param.origin;
        let Some(param) = build_param(param, method, &template, warnings) else {
            continue;
        };
        let key = (param.location, param.name.clone());
        match params.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(param);
            }
            Entry::Occupied(mut entry) => {
                let mut param = param;
                if entry.get().required && !param.required {
                    warnings.push(
                        origin.warn(ParseWarningKind::RequiredFlagRetained(param.name.clone())),
                    );
                    param.required = true;
                }
                entry.insert(param);
            }
        }
    }

    for name in &template {
        let key = (ParameterLocation::Path, name.clone());
        if !params.contains_key(&key) {
            warnings.push(origin.warn(ParseWarningKind::PathParameterSynthesized(name.clone())));
            params.insert(key, synthesized_path_param(name));
        }
    }

    let mut params: Vec<_> = params.into_values().collect();
    // Path parameters follow the order of the path; everything else keeps
    // its declaration order.
    params.sort_by_key(|param| {
        let position = match param.location {
            ParameterLocation::Path => template
                .iter()
                .position(|name| *name == param.name)
                .unwrap_or(usize::MAX),
            _ => 0,
        };
        (param.location, position)
    });

    let mut responses = IndexMap::new();
    for response in draft.responses {
        if let Some(response) = build_response(response, warnings) {
            responses.insert(response.status_code.to_string(), response);
        }
    }
    if responses.is_empty() {
        responses.insert("200".to_owned(), ResponseSpec::default_success());
    }

    Some(Endpoint {
        path,
        method,
        description: draft.description.trim().to_owned(),
        params,
        responses,
    })
}

fn build_param(
    draft: ParameterDraft,
    method: Method,
    template: &[String],
    warnings: &mut Vec<ParseWarning>,
) -> Option<Parameter> {
    let origin = draft.origin;
    let name = draft.name.trim().trim_matches('`').to_owned();
    if name.is_empty() {
        warnings.push(origin.warn(ParseWarningKind::EmptyParameterName));
        return None;
    }
    let in_template = template.contains(&name);
    let location = draft.location.unwrap_or(if in_template {
        ParameterLocation::Path
    } else {
        method.default_location()
    });

    let required = match location {
        ParameterLocation::Path => {
            if draft.required == Some(false) {
                warnings.push(origin.warn(ParseWarningKind::OptionalPathParameter(name.clone())));
            }
            if !in_template {
                warnings.push(origin.warn(ParseWarningKind::UndeclaredPathParameter(name.clone())));
            }
            true
        }
        _ => draft.required.unwrap_or(false),
    };

    let domain = draft.raw_type.as_deref().map(classify).unwrap_or_default();
    let bounds = draft.bounds.filter(|bounds| !bounds.is_empty());
    if matches!(domain, Domain::String | Domain::Array)
        && bounds.is_some_and(exceeds_length_limit)
    {
        warnings.push(origin.warn(ParseWarningKind::LengthLimitExceeded(name.clone())));
    }

    let mut documented = |literal: Literal| {
        let value = domain.coerce(literal);
        if domain.accepts(&value) {
            return Some(value);
        }
        warnings.push(origin.warn(ParseWarningKind::MistypedValue {
            name: name.clone(),
            value: text(&value),
            domain,
        }));
        None
    };
    let example = draft.example.and_then(&mut documented);
    let default = draft.default.and_then(&mut documented);
    let allowed = draft.allowed.into_iter().filter_map(&mut documented).collect();

    Some(Parameter {
        name,
        location,
        domain,
        required,
        description: draft.description.trim().to_owned(),
        example,
        default,
        allowed,
        bounds,
    })
}

/// Formats a documented value the way it was written.
fn text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        value => value.to_string(),
    }
}

fn synthesized_path_param(name: &str) -> Parameter {
    Parameter {
        name: name.to_owned(),
        location: ParameterLocation::Path,
        domain: Domain::String,
        required: true,
        description: String::new(),
        example: None,
        default: None,
        allowed: vec![],
        bounds: None,
    }
}

fn build_response(draft: ResponseDraft, warnings: &mut Vec<ParseWarning>) -> Option<ResponseSpec> {
    let status = draft.status.trim();
    let Some(status_code) = status
        .parse::<u16>()
        .ok()
        .filter(|code| (100..=599).contains(code))
    else {
        warnings.push(
            draft
                .origin
                .warn(ParseWarningKind::InvalidStatusCode(status.to_owned())),
        );
        return None;
    };
    Some(ResponseSpec {
        status_code,
        description: draft.description.trim().to_owned(),
        content_type: draft
            .content_type
            .map(|content_type| content_type.trim().to_owned())
            .filter(|content_type| !content_type.is_empty())
            .unwrap_or_else(|| ResponseSpec::DEFAULT_CONTENT_TYPE.to_owned()),
    })
}

/// Keeps parameters that `previous` required required in `next`.
fn retain_required(
    previous: &Endpoint,
    next: &mut Endpoint,
    origin: Origin,
    warnings: &mut Vec<ParseWarning>,
) {
    for param in &mut next.params {
        let stricter = previous.params.iter().any(|earlier| {
            earlier.required && earlier.location == param.location && earlier.name == param.name
        });
        if stricter && !param.required {
            warnings.push(origin.warn(ParseWarningKind::RequiredFlagRetained(param.name.clone())));
            param.required = true;
        }
    }
}
