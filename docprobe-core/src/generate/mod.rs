//! Generates test cases from an [`ApiSpec`].
//!
//! Generation is deterministic: the same API and config always produce
//! the same cases, in the same order, with the same IDs.

use std::fmt::Display;

use indexmap::{IndexMap, map::Entry};
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    classify::{BoundaryValue, Domain, boundary_values, invalid_type_values, representative},
    error::GenerationError,
    model::{ApiSpec, Endpoint, EndpointKey, Parameter, ResponseSpec},
};

mod assignment;
mod slug;


pub use assignment::{Assignment, Slot};
pub use slug::UniqueSlugs;

/// Generates test cases for every endpoint in `spec`, endpoint by
/// endpoint, in [`Category`] order.
pub fn generate(spec: &ApiSpec, config: &GeneratorConfig) -> Result<Vec<TestCase>, GenerationError> {
    let limits = config.validate()?;
    let mut slugs = UniqueSlugs::new();
    let mut cases = Vec::new();
    for endpoint in &spec.endpoints {
        let slug = slugs.slug(endpoint);
        let generated = EndpointCases::new(endpoint, &limits).generate(&slug);
        debug!("generated {} cases for {}", generated.len(), endpoint.key());
        cases.extend(generated);
    }
    Ok(cases)
}

// MARK: Test cases

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TestCase {
    /// A stable ID, like `post-orders.boundary.03`.
    pub id: String,
    pub category: Category,
    pub endpoint: EndpointKey,
    /// The values to send. Parameters without a value aren't sent.
    pub assignment: Assignment,
    pub expected: ExpectedOutcome,
    /// What the executor checks.
    pub assertion: Assertion,
    pub rationale: String,
    /// Other categories whose identical case was merged into this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub also_covers: Vec<Category>,
}

impl TestCase {
    /// Returns `true` if this case was generated for `category`, or
    /// absorbed an identical case from it.
    pub fn covers(&self, category: Category) -> bool {
        self.category == category || self.also_covers.contains(&category)
    }
}

/// Categories, in generation order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Valid,
    Boundary,
    MissingRequired,
    InvalidType,
    Performance,
    DocValidation,
    Idempotency,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Boundary => "boundary",
            Self::MissingRequired => "missing_required",
            Self::InvalidType => "invalid_type",
            Self::Performance => "performance",
            Self::DocValidation => "doc_validation",
            Self::Idempotency => "idempotency",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the API should do with a request. Variants are ordered from
/// least to most strict.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ExpectedOutcome {
    #[serde(rename = "expect_success")]
    Success,
    #[serde(rename = "expect_client_error")]
    ClientError,
    #[serde(rename = "expect_validation_error")]
    ValidationError,
}

impl ExpectedOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "expect_success",
            Self::ClientError => "expect_client_error",
            Self::ValidationError => "expect_validation_error",
        }
    }

    /// The outcome that a documented response status implies.
    pub fn for_status(status_code: u16) -> Self {
        match status_code {
            100..=399 => Self::Success,
            400 | 422 => Self::ValidationError,
            _ => Self::ClientError,
        }
    }
}

impl Display for ExpectedOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an executor checks a response.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assertion {
    /// The response status matches the expected outcome.
    Outcome,
    /// The response arrives within a latency threshold.
    Latency { threshold_ms: u64, iteration: usize },
    /// The response matches a documented status and content type.
    Conformance { status_code: u16, content_type: String },
    /// Repeating the request gives the same response.
    Idempotent { repeat: usize },
}

// MARK: Configuration

/// Options for [`generate`].
///
/// Counts are signed so that a negative count from a config file is
/// reported instead of rejected during deserialization.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// The most boundary cases per parameter.
    pub max_boundary_samples: i64,
    pub performance_case_count: i64,
    /// Whether wrongly typed values should be rejected as validation
    /// errors, rather than any client error.
    pub invalid_type_strict: bool,
    /// The base URL for documents that don't declare one.
    pub default_base_url: String,
    pub performance_threshold_ms: i64,
    /// How many times idempotency cases repeat their request;
    /// zero skips them.
    pub idempotency_repeat_count: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_boundary_samples: 6,
            performance_case_count: 1,
            invalid_type_strict: true,
            default_base_url: "http://localhost:8080".to_owned(),
            performance_threshold_ms: 2000,
            idempotency_repeat_count: 3,
        }
    }
}

impl GeneratorConfig {
    /// Checks the options, and returns them as limits.
    pub fn validate(&self) -> Result<Limits, GenerationError> {
        let count = |option: &'static str, value: i64| {
            usize::try_from(value).map_err(|_| GenerationError::Negative { option, value })
        };
        let max_boundary_samples = count("max_boundary_samples", self.max_boundary_samples)?;
        let performance_case_count = count("performance_case_count", self.performance_case_count)?;
        let idempotency_repeat_count =
            count("idempotency_repeat_count", self.idempotency_repeat_count)?;
        let performance_threshold_ms = match u64::try_from(self.performance_threshold_ms) {
            Ok(0) => return Err(GenerationError::ZeroThreshold),
            Ok(ms) => ms,
            Err(_) => {
                return Err(GenerationError::Negative {
                    option: "performance_threshold_ms",
                    value: self.performance_threshold_ms,
                });
            }
        };
        let url = self.default_base_url.trim();
        let has_host = ["http://", "https://"]
            .iter()
            .filter_map(|scheme| url.strip_prefix(scheme))
            .any(|rest| !rest.is_empty() && !rest.starts_with('/'));
        if !has_host {
            return Err(GenerationError::BadBaseUrl(self.default_base_url.clone()));
        }
        Ok(Limits {
            max_boundary_samples,
            performance_case_count,
            invalid_type_strict: self.invalid_type_strict,
            performance_threshold_ms,
            idempotency_repeat_count,
        })
    }
}

/// Validated [`GeneratorConfig`] options.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Limits {
    pub max_boundary_samples: usize,
    pub performance_case_count: usize,
    pub invalid_type_strict: bool,
    pub performance_threshold_ms: u64,
    pub idempotency_repeat_count: usize,
}

// MARK: Generation

/// A case before deduplication and numbering.
struct Draft {
    category: Category,
    assignment: Assignment,
    expected: ExpectedOutcome,
    assertion: Assertion,
    rationale: String,
}

struct EndpointCases<'a> {
    endpoint: &'a Endpoint,
    limits: &'a Limits,
    /// Every parameter at its representative value.
    valid: Assignment,
    drafts: Vec<Draft>,
}

impl<'a> EndpointCases<'a> {
    fn new(endpoint: &'a Endpoint, limits: &'a Limits) -> Self {
        let mut valid = Assignment::new();
        for param in &endpoint.params {
            valid.insert(param, representative(param));
        }
        Self {
            endpoint,
            limits,
            valid,
            drafts: Vec::new(),
        }
    }

    fn generate(mut self, slug: &str) -> Vec<TestCase> {
        self.valid_cases();
        if !self.endpoint.params.is_empty() {
            self.boundary_cases();
            self.missing_required_cases();
            self.invalid_type_cases();
            self.performance_cases();
        }
        self.doc_validation_cases();
        if !self.endpoint.params.is_empty() {
            self.idempotency_cases();
        }
        let key = self.endpoint.key();
        number(slug, &key, dedup(self.drafts))
    }

    fn push(
        &mut self,
        category: Category,
        assignment: Assignment,
        expected: ExpectedOutcome,
        assertion: Assertion,
        rationale: String,
    ) {
        self.drafts.push(Draft {
            category,
            assignment,
            expected,
            assertion,
            rationale,
        });
    }

    fn valid_cases(&mut self) {
        self.push(
            Category::Valid,
            self.valid.clone(),
            ExpectedOutcome::Success,
            Assertion::Outcome,
            "all parameters, with documented or representative values".to_owned(),
        );
        let mut required = Assignment::new();
        for param in self.endpoint.required_params() {
            required.insert(param, representative(param));
        }
        self.push(
            Category::Valid,
            required,
            ExpectedOutcome::Success,
            Assertion::Outcome,
            "only required parameters".to_owned(),
        );
    }

    fn boundary_cases(&mut self) {
        let endpoint = self.endpoint;
        for param in &endpoint.params {
            let values = sample(boundary_values(param), self.limits.max_boundary_samples);
            for BoundaryValue {
                value,
                probe,
                within,
            } in values
            {
                let expected = if within {
                    ExpectedOutcome::Success
                } else {
                    ExpectedOutcome::ClientError
                };
                let rationale = format!("{} is {probe} ({})", describe(param), abbreviate(&value));
                let assignment = self.valid.with(param, value);
                self.push(
                    Category::Boundary,
                    assignment,
                    expected,
                    Assertion::Outcome,
                    rationale,
                );
            }
        }
    }

    fn missing_required_cases(&mut self) {
        let endpoint = self.endpoint;
        for param in endpoint.required_params() {
            let assignment = self.valid.without(param);
            self.push(
                Category::MissingRequired,
                assignment,
                ExpectedOutcome::ValidationError,
                Assertion::Outcome,
                format!("omits required {}", describe(param)),
            );
        }
    }

    fn invalid_type_cases(&mut self) {
        let expected = if self.limits.invalid_type_strict {
            ExpectedOutcome::ValidationError
        } else {
            ExpectedOutcome::ClientError
        };
        let endpoint = self.endpoint;
        for param in &endpoint.params {
            for value in invalid_type_values(param) {
                let rationale = format!(
                    "{} is {} instead of {}",
                    describe(param),
                    a(Domain::of(&value)),
                    a(param.domain)
                );
                let assignment = self.valid.with(param, value);
                self.push(
                    Category::InvalidType,
                    assignment,
                    expected,
                    Assertion::Outcome,
                    rationale,
                );
            }
        }
    }

    fn performance_cases(&mut self) {
        let count = self.limits.performance_case_count;
        let threshold_ms = self.limits.performance_threshold_ms;
        for iteration in 1..=count {
            self.push(
                Category::Performance,
                self.valid.clone(),
                ExpectedOutcome::Success,
                Assertion::Latency {
                    threshold_ms,
                    iteration,
                },
                format!("responds within {threshold_ms} ms (run {iteration} of {count})"),
            );
        }
    }

    fn doc_validation_cases(&mut self) {
        let responses = self.endpoint.responses.values().cloned().collect_vec();
        for ResponseSpec {
            status_code,
            description,
            content_type,
        } in responses
        {
            let rationale = match description.as_str() {
                "" => format!("matches documented {status_code} response ({content_type})"),
                description => format!(
                    "matches documented {status_code} response ({content_type}): {description}"
                ),
            };
            self.push(
                Category::DocValidation,
                self.valid.clone(),
                ExpectedOutcome::for_status(status_code),
                Assertion::Conformance {
                    status_code,
                    content_type,
                },
                rationale,
            );
        }
    }

    fn idempotency_cases(&mut self) {
        let repeat = self.limits.idempotency_repeat_count;
        if repeat == 0 || !self.endpoint.method.is_idempotent() {
            return;
        }
        self.push(
            Category::Idempotency,
            self.valid.clone(),
            ExpectedOutcome::Success,
            Assertion::Idempotent { repeat },
            format!(
                "{} is idempotent; {repeat} repeats give the same response",
                self.endpoint.method
            ),
        );
    }
}

/// Keeps at most `limit` boundary values, preferring values outside the
/// valid range, then values exactly at an edge. Kept values stay in
/// their original order.
fn sample(values: Vec<BoundaryValue>, limit: usize) -> Vec<BoundaryValue> {
    if values.len() <= limit {
        return values;
    }
    let keep: Vec<usize> = values
        .iter()
        .enumerate()
        .sorted_by_key(|(index, value)| {
            let priority = match (value.within, value.probe.is_edge()) {
                (false, _) => 0,
                (true, true) => 1,
                (true, false) => 2,
            };
            (priority, *index)
        })
        .take(limit)
        .map(|(index, _)| index)
        .collect();
    values
        .into_iter()
        .enumerate()
        .filter(|(index, _)| keep.contains(index))
        .map(|(_, value)| value)
        .collect()
}

/// Merges drafts that send the same values and check the same thing.
///
/// The first draft keeps its place and category. It takes the stricter
/// of the two expected outcomes, and records the other draft's category.
fn dedup(drafts: Vec<Draft>) -> Vec<(Draft, Vec<Category>)> {
    let mut merged = IndexMap::<(Assertion, String), (Draft, Vec<Category>)>::new();
    for draft in drafts {
        let key = (draft.assertion.clone(), draft.assignment.fingerprint());
        match merged.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert((draft, vec![]));
            }
            Entry::Occupied(mut entry) => {
                let (kept, also_covers) = entry.get_mut();
                kept.expected = kept.expected.max(draft.expected);
                if draft.category != kept.category && !also_covers.contains(&draft.category) {
                    also_covers.push(draft.category);
                }
                kept.rationale.push_str("; ");
                kept.rationale.push_str(&draft.rationale);
            }
        }
    }
    merged.into_values().collect()
}

/// Assigns IDs, numbering cases within each category from 1.
fn number(slug: &str, key: &EndpointKey, drafts: Vec<(Draft, Vec<Category>)>) -> Vec<TestCase> {
    let mut counts = IndexMap::<Category, usize>::new();
    drafts
        .into_iter()
        .map(|(draft, also_covers)| {
            let seq = counts.entry(draft.category).or_default();
            *seq += 1;
            TestCase {
                id: format!("{slug}.{}.{seq:02}", draft.category),
                category: draft.category,
                endpoint: key.clone(),
                assignment: draft.assignment,
                expected: draft.expected,
                assertion: draft.assertion,
                rationale: draft.rationale,
                also_covers,
            }
        })
        .collect()
}

fn describe(param: &Parameter) -> String {
    format!("{} parameter `{}`", param.location, param.name)
}

fn a(domain: Domain) -> String {
    match domain {
        Domain::Integer | Domain::Array | Domain::Object => format!("an {domain}"),
        _ => format!("a {domain}"),
    }
}

/// Shortens long values for rationales.
fn abbreviate(value: &Value) -> String {
    match value {
        Value::String(s) if s.chars().count() > 16 => {
            format!("{} characters", s.chars().count())
        }
        Value::String(s) => format!("{s:?}"),
        Value::Array(items) => format!("{} items", items.len()),
        value => value.to_string(),
    }
}
