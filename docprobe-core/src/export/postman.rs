use itertools::Itertools;
use log::warn;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Serialize;
use serde_json::Value;

use crate::{
    generate::{Assertion, ExpectedOutcome, TestCase},
    model::{ApiSpec, Endpoint, ParameterLocation},
    parse::path,
};

use super::IntoExport;

const SCHEMA: &str = "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";
const BASE_URL: &str = "{{baseUrl}}";

/// Characters that must be escaped in query keys and values.
const QUERY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>');

/// Where a collection sends query and body parameter values.
///
/// Path parameters always go in the path, and header parameters
/// always go in headers. A parameter whose name is already taken at
/// its new location stays where it's documented.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Placement {
    /// Where each parameter is documented.
    #[default]
    Declared,
    /// In the JSON request body.
    Body,
    /// In the query string.
    Query,
}

impl Placement {
    fn place(self, location: ParameterLocation) -> ParameterLocation {
        match (self, location) {
            (_, ParameterLocation::Path | ParameterLocation::Header) => location,
            (Self::Declared, _) => location,
            (Self::Body, _) => ParameterLocation::Body,
            (Self::Query, _) => ParameterLocation::Query,
        }
    }
}

/// A Postman v2.1 collection with a folder per endpoint, and a request
/// per test case.
///
/// Requests address the `{{baseUrl}}` collection variable, which
/// defaults to the API's base URL.
#[derive(Clone, Copy, Debug)]
pub struct PostmanCollection<'a> {
    spec: &'a ApiSpec,
    cases: &'a [TestCase],
    placement: Placement,
}

impl<'a> PostmanCollection<'a> {
    pub const PATH: &'static str = "collection.postman.json";

    #[inline]
    pub fn new(spec: &'a ApiSpec, cases: &'a [TestCase], placement: Placement) -> Self {
        Self {
            spec,
            cases,
            placement,
        }
    }

    pub fn to_collection(self) -> Collection {
        let folders = self
            .spec
            .endpoints
            .iter()
            .map(|endpoint| {
                let key = endpoint.key();
                let item = self
                    .cases
                    .iter()
                    .filter(|case| case.endpoint == key)
                    .map(|case| self.request(endpoint, case))
                    .collect_vec();
                Folder {
                    name: key.to_string(),
                    description: endpoint.description.clone(),
                    item,
                }
            })
            .filter(|folder| !folder.item.is_empty())
            .collect();
        Collection {
            info: Info {
                name: self.spec.title.clone(),
                description: self.spec.description.clone(),
                version: self.spec.version.clone(),
                schema: SCHEMA,
            },
            item: folders,
            variable: vec![Variable {
                key: "baseUrl",
                value: self.spec.base_url.clone(),
            }],
        }
    }

    fn request(&self, endpoint: &Endpoint, case: &TestCase) -> Item {
        let mut query = Vec::new();
        let mut header = Vec::new();
        let mut body = serde_json::Map::new();
        for (slot, value) in case.assignment.iter() {
            let mut location = self.placement.place(slot.location);
            if location != slot.location && case.assignment.get(location, &slot.name).is_some() {
                warn!(
                    "`{}`: {} parameter `{}` stays in the {}; a {location} parameter has the same name",
                    case.id, slot.location, slot.name, slot.location
                );
                location = slot.location;
            }
            match location {
                ParameterLocation::Path => (),
                ParameterLocation::Query => query.push(KeyValue {
                    key: slot.name.clone(),
                    value: text(value),
                }),
                ParameterLocation::Header => header.push(KeyValue {
                    key: slot.name.clone(),
                    value: text(value),
                }),
                ParameterLocation::Body => {
                    body.insert(slot.name.clone(), value.clone());
                }
            }
        }

        let body = match body.is_empty() {
            true => None,
            false => {
                header.push(KeyValue {
                    key: "Content-Type".to_owned(),
                    value: "application/json".to_owned(),
                });
                Some(Body {
                    mode: "raw",
                    raw: serde_json::to_string_pretty(&body).unwrap_or_default(),
                    options: BodyOptions {
                        raw: RawOptions { language: "json" },
                    },
                })
            }
        };

        let path = match path::parse(&endpoint.path) {
            Ok(segments) => path::render(&segments, |name| {
                case.assignment
                    .get(ParameterLocation::Path, name)
                    .map(text)
            }),
            Err(_) => endpoint.path.clone(),
        };
        let mut raw = format!("{BASE_URL}{path}");
        if !query.is_empty() {
            raw.push('?');
            raw.push_str(
                &query
                    .iter()
                    .map(|KeyValue { key, value }| {
                        format!(
                            "{}={}",
                            utf8_percent_encode(key, QUERY),
                            utf8_percent_encode(value, QUERY)
                        )
                    })
                    .join("&"),
            );
        }

        Item {
            name: case.id.clone(),
            description: format!("{} ({})", case.rationale, case.expected),
            request: Request {
                method: endpoint.method.as_str(),
                header,
                url: Url {
                    raw,
                    host: [BASE_URL],
                    path: path
                        .split('/')
                        .filter(|segment| !segment.is_empty())
                        .map(str::to_owned)
                        .collect(),
                    query,
                },
                body,
            },
            event: vec![Event {
                listen: "test",
                script: Script {
                    kind: "text/javascript",
                    exec: script(case),
                },
            }],
        }
    }
}

impl IntoExport for PostmanCollection<'_> {
    type Export = (&'static str, Collection);

    fn into_export(self) -> Self::Export {
        (Self::PATH, self.to_collection())
    }
}

/// Writes the test script lines that check a case's assertion.
fn script(case: &TestCase) -> Vec<String> {
    let name = |text: &str| Value::from(text).to_string();
    let mut lines = vec![format!("pm.test({}, function () {{", name(&case.rationale))];
    match &case.assertion {
        Assertion::Outcome => lines.push(outcome(case.expected)),
        Assertion::Latency { threshold_ms, .. } => {
            lines.push(outcome(case.expected));
            lines.push(format!(
                "    pm.expect(pm.response.responseTime).to.be.below({threshold_ms});"
            ));
        }
        Assertion::Conformance {
            status_code,
            content_type,
        } => {
            lines.push(format!("    pm.response.to.have.status({status_code});"));
            lines.push(format!(
                "    pm.expect(pm.response.headers.get(\"Content-Type\") || \"\").to.include({});",
                name(content_type)
            ));
        }
        Assertion::Idempotent { .. } => lines.push(outcome(case.expected)),
    }
    lines.push("});".to_owned());

    if let &Assertion::Idempotent { repeat } = &case.assertion {
        lines.extend([
            "const first = pm.response.text();".to_owned(),
            format!("for (let i = 1; i < {repeat}; i++) {{"),
            "    pm.sendRequest(pm.request, function (err, res) {".to_owned(),
            "        pm.test(\"repeat \" + i + \" gives the same response\", function () {"
                .to_owned(),
            "            pm.expect(err).to.equal(null);".to_owned(),
            "            pm.expect(res.text()).to.equal(first);".to_owned(),
            "        });".to_owned(),
            "    });".to_owned(),
            "}".to_owned(),
        ]);
    }
    lines
}

fn outcome(expected: ExpectedOutcome) -> String {
    match expected {
        ExpectedOutcome::Success => "    pm.expect(pm.response.code).to.be.within(200, 399);",
        ExpectedOutcome::ClientError => "    pm.expect(pm.response.code).to.be.within(400, 499);",
        ExpectedOutcome::ValidationError => "    pm.expect(pm.response.code).to.be.oneOf([400, 422]);",
    }
    .to_owned()
}

/// Formats a value for a query string or header.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        value => value.to_string(),
    }
}

// MARK: Collection format

#[derive(Debug, Serialize)]
pub struct Collection {
    info: Info,
    item: Vec<Folder>,
    variable: Vec<Variable>,
}

#[derive(Debug, Serialize)]
struct Info {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    version: String,
    schema: &'static str,
}

#[derive(Debug, Serialize)]
struct Folder {
    name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    description: String,
    item: Vec<Item>,
}

#[derive(Debug, Serialize)]
struct Item {
    name: String,
    description: String,
    request: Request,
    event: Vec<Event>,
}

#[derive(Debug, Serialize)]
struct Request {
    method: &'static str,
    header: Vec<KeyValue>,
    url: Url,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<Body>,
}

#[derive(Debug, Serialize)]
struct Url {
    raw: String,
    host: [&'static str; 1],
    path: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    query: Vec<KeyValue>,
}

#[derive(Debug, Serialize)]
struct KeyValue {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct Body {
    mode: &'static str,
    raw: String,
    options: BodyOptions,
}

#[derive(Debug, Serialize)]
struct BodyOptions {
    raw: RawOptions,
}

#[derive(Debug, Serialize)]
struct RawOptions {
    language: &'static str,
}

#[derive(Debug, Serialize)]
struct Event {
    listen: &'static str,
    script: Script,
}

#[derive(Debug, Serialize)]
struct Script {
    #[serde(rename = "type")]
    kind: &'static str,
    exec: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Variable {
    key: &'static str,
    value: String,
}
