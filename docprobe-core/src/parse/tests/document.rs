//! Tests for structured JSON and YAML documents.

use itertools::Itertools;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{
    error::SerdeError,
    model::{Bounds, ParameterLocation},
    parse::{Literal, ParseWarningKind, document::Document},
    tests::assert_matches,
};

// MARK: Shapes

#[test]
fn test_flat_parameters_from_yaml() {
    let model = Document::from_yaml(indoc::indoc! {"
        title: Shop
        base_url: https://shop.example.com
        endpoints:
          - path: /orders
            method: post
            summary: Create an order
            parameters:
              - name: quantity
                in: body
                type: integer
                required: true
                minimum: 1
                maximum: 100
              - name: X-Trace
                in: headers
                type: string
            responses:
              201:
                description: Created
              400:
                description: Bad request
    "})
    .unwrap()
    .into_model();

    assert_eq!(model.title.as_deref(), Some("Shop"));
    assert_eq!(model.base_url.as_deref(), Some("https://shop.example.com"));

    let [endpoint] = &*model.endpoints else {
        panic!("expected one endpoint; got {:?}", model.endpoints);
    };
    assert_eq!(endpoint.method, "post");
    assert_eq!(endpoint.description, "Create an order");

    let [quantity, trace] = &*endpoint.params else {
        panic!("expected two parameters; got {:?}", endpoint.params);
    };
    assert_eq!(quantity.location, Some(ParameterLocation::Body));
    assert_eq!(quantity.required, Some(true));
    assert_eq!(
        quantity.bounds,
        Some(Bounds {
            min: Some(1.0),
            max: Some(100.0),
        })
    );
    assert_eq!(trace.location, Some(ParameterLocation::Header));
    assert_eq!(trace.required, None);

    let statuses = endpoint
        .responses
        .iter()
        .map(|response| (response.status.as_str(), response.description.as_str()))
        .collect_vec();
    assert_eq!(statuses, [("201", "Created"), ("400", "Bad request")]);
}

#[test]
fn test_grouped_parameters_from_json() {
    let model = Document::from_json(indoc::indoc! {r#"
        {
          "endpoints": [{
            "path": "/users/{id}",
            "method": "GET",
            "path_parameters": [{"name": "id", "type": "integer"}],
            "query_parameters": [
              {"name": "fields", "type": "string", "enum": ["name", "email"]}
            ],
            "headers": [{"name": "X-Api-Key", "required": true}],
            "responses": [{"status_code": 200, "description": "OK"}, {"code": "404"}]
          }]
        }
    "#})
    .unwrap()
    .into_model();

    let [endpoint] = &*model.endpoints else {
        panic!("expected one endpoint; got {:?}", model.endpoints);
    };
    let params = endpoint
        .params
        .iter()
        .map(|param| (param.name.as_str(), param.location))
        .collect_vec();
    assert_eq!(
        params,
        [
            ("id", Some(ParameterLocation::Path)),
            ("fields", Some(ParameterLocation::Query)),
            ("X-Api-Key", Some(ParameterLocation::Header)),
        ]
    );
    assert_eq!(
        endpoint.params[1].allowed,
        [Literal::Json(json!("name")), Literal::Json(json!("email"))]
    );

    let statuses = endpoint
        .responses
        .iter()
        .map(|response| response.status.as_str())
        .collect_vec();
    assert_eq!(statuses, ["200", "404"]);
}

#[test]
fn test_request_body_parameters() {
    let model = Document::from_text(indoc::indoc! {r#"
        {
          "endpoints": [{
            "path": "/users",
            "method": "PUT",
            "request_body": {
              "content_type": "application/json",
              "parameters": [{"name": "email", "required": true}]
            }
          }]
        }
    "#})
    .unwrap()
    .into_model();

    assert_matches!(
        &*model.endpoints,
        [endpoint] if endpoint.params.len() == 1
            && endpoint.params[0].location == Some(ParameterLocation::Body),
    );
}

// MARK: Hints

#[test]
fn test_length_and_range_hints() {
    let model = Document::from_yaml(indoc::indoc! {"
        endpoints:
          - path: /users
            method: POST
            parameters:
              - name: username
                min_length: 3
                max_length: 8
              - name: bio
                range: 0-280
              - name: sort
                description: Sort order, one of asc, desc. Defaults to asc.
    "})
    .unwrap()
    .into_model();

    let [endpoint] = &*model.endpoints else {
        panic!("expected one endpoint; got {:?}", model.endpoints);
    };
    let [username, bio, sort] = &*endpoint.params else {
        panic!("expected three parameters; got {:?}", endpoint.params);
    };
    assert_eq!(
        username.bounds,
        Some(Bounds {
            min: Some(3.0),
            max: Some(8.0),
        })
    );
    assert_eq!(
        bio.bounds,
        Some(Bounds {
            min: Some(0.0),
            max: Some(280.0),
        })
    );
    assert_eq!(
        sort.allowed,
        [
            Literal::Text("asc".to_owned()),
            Literal::Text("desc".to_owned())
        ]
    );
    assert_eq!(sort.default, Some(Literal::Text("asc".to_owned())));
}

#[test]
fn test_explicit_values_win_over_hints() {
    let model = Document::from_json(indoc::indoc! {r#"
        {
          "endpoints": [{
            "path": "/search",
            "method": "GET",
            "parameters": [{
              "name": "limit",
              "type": "integer",
              "example": 25,
              "maximum": 50,
              "description": "Page size, 1-100, e.g. 10"
            }]
          }]
        }
    "#})
    .unwrap()
    .into_model();

    let param = &model.endpoints[0].params[0];
    assert_eq!(param.example, Some(Literal::Json(json!(25))));
    assert_eq!(
        param.bounds,
        Some(Bounds {
            min: None,
            max: Some(50.0),
        })
    );
}

// MARK: Errors

#[test]
fn test_unknown_location_warns() {
    let model = Document::from_json(indoc::indoc! {r#"
        {
          "endpoints": [{
            "path": "/a",
            "method": "GET",
            "parameters": [{"name": "session", "in": "cookie"}]
          }]
        }
    "#})
    .unwrap()
    .into_model();

    assert_matches!(
        &*model.warnings,
        [warning] if warning.kind == ParseWarningKind::UnknownLocation("cookie".to_owned()),
    );
    assert_eq!(model.endpoints[0].params[0].location, None);
}

#[test]
fn test_malformed_documents() {
    assert_matches!(
        Document::from_json(r#"{"endpoints": [{"path": "/a"}]}"#),
        Err(SerdeError::JsonWithPath(err)) if err.path().to_string().starts_with("endpoints"),
    );
    assert_matches!(Document::from_json("{} trailing"), Err(SerdeError::Json(_)));
    assert_matches!(
        Document::from_yaml("endpoints: 42"),
        Err(SerdeError::YamlWithPath(_)),
    );
}
