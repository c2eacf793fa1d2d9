//! Tests for the Markdown scanner.

use itertools::Itertools;
use pretty_assertions::assert_eq;

use crate::{
    model::{Bounds, ParameterLocation},
    parse::{Literal, ParseWarningKind, markdown::parse},
    tests::assert_matches,
};

// MARK: Document metadata

#[test]
fn test_title_description_and_metadata() {
    let model = parse(indoc::indoc! {"
        # Pet Store API

        A sample API
        for pets.

        Base URL: https://pets.example.com/v1/
        Version: 2.0

        ## GET /pets
    "});

    assert_eq!(model.title.as_deref(), Some("Pet Store API"));
    assert_eq!(model.description.as_deref(), Some("A sample API for pets."));
    assert_eq!(model.base_url.as_deref(), Some("https://pets.example.com/v1/"));
    assert_eq!(model.version.as_deref(), Some("2.0"));
    assert_matches!(&*model.endpoints, [endpoint] if endpoint.path == "/pets");
    assert!(model.warnings.is_empty());
}

// MARK: Endpoints

#[test]
fn test_heading_endpoint_with_tables() {
    let model = parse(indoc::indoc! {"
        # Shop API

        ## POST /orders - Create an order

        **Request Body**

        | Field | Type | Required | Description |
        |-------|------|----------|-------------|
        | quantity | integer | yes | How many to order, 1-100 |
        | coupon | string | no | Coupon code, e.g. SAVE10 |

        ### Responses

        | Status | Description |
        |--------|-------------|
        | 201 | Created |
        | 400 | Bad request |
    "});

    let [endpoint] = &*model.endpoints else {
        panic!("expected one endpoint; got {:?}", model.endpoints);
    };
    assert_eq!(endpoint.method, "POST");
    assert_eq!(endpoint.path, "/orders");
    assert_eq!(endpoint.description, "Create an order");

    let [quantity, coupon] = &*endpoint.params else {
        panic!("expected two parameters; got {:?}", endpoint.params);
    };
    assert_eq!(quantity.name, "quantity");
    assert_eq!(quantity.location, Some(ParameterLocation::Body));
    assert_eq!(quantity.raw_type.as_deref(), Some("integer"));
    assert_eq!(quantity.required, Some(true));
    assert_eq!(
        quantity.bounds,
        Some(Bounds {
            min: Some(1.0),
            max: Some(100.0),
        })
    );
    assert_eq!(coupon.required, Some(false));
    assert_eq!(coupon.example, Some(Literal::Text("SAVE10".to_owned())));

    let statuses = endpoint
        .responses
        .iter()
        .map(|response| (response.status.as_str(), response.description.as_str()))
        .collect_vec();
    assert_eq!(statuses, [("201", "Created"), ("400", "Bad request")]);
    assert!(model.warnings.is_empty());
}

#[test]
fn test_label_declared_endpoint() {
    let model = parse(indoc::indoc! {"
        ### Get user
        Method: GET
        Path: /users/{id}

        Parameters:
        - `id` (integer): The user ID
        - `verbose` (boolean, optional): Include details
    "});

    let [endpoint] = &*model.endpoints else {
        panic!("expected one endpoint; got {:?}", model.endpoints);
    };
    assert_eq!(endpoint.method, "GET");
    assert_eq!(endpoint.path, "/users/{id}");
    assert_eq!(endpoint.description, "Get user");
    assert_eq!(endpoint.origin.line, Some(2));

    let params = endpoint
        .params
        .iter()
        .map(|param| (param.name.as_str(), param.raw_type.as_deref(), param.required))
        .collect_vec();
    assert_eq!(
        params,
        [
            ("id", Some("integer"), None),
            ("verbose", Some("boolean"), Some(false)),
        ]
    );
}

#[test]
fn test_description_follows_endpoint_line() {
    let model = parse(indoc::indoc! {"
        ### List pets

        GET /pets

        Lists every pet
        in the store.

        Unrelated trailing text.
    "});

    assert_matches!(
        &*model.endpoints,
        [endpoint] if endpoint.description == "Lists every pet in the store.",
    );
}

#[test]
fn test_sibling_heading_closes_endpoint() {
    let model = parse(indoc::indoc! {"
        ## GET /a

        ## Changelog

        - `stray` (string): Not a parameter of `/a`

        ## DELETE /b
    "});

    let endpoints = model
        .endpoints
        .iter()
        .map(|endpoint| (endpoint.method.as_str(), endpoint.path.as_str(), endpoint.params.len()))
        .collect_vec();
    assert_eq!(endpoints, [("GET", "/a", 0), ("DELETE", "/b", 0)]);
    assert_matches!(
        &*model.warnings,
        [warning] if warning.kind == ParseWarningKind::OrphanedBlock("a parameter"),
    );
}

// MARK: Responses

#[test]
fn test_response_list_with_content_type() {
    let model = parse(indoc::indoc! {"
        ## GET /orders/{id}

        Content-Type: application/xml

        Responses:
        - 200: The order
        - `404`: Not found
          Content-Type: text/plain
    "});

    let [endpoint] = &*model.endpoints else {
        panic!("expected one endpoint; got {:?}", model.endpoints);
    };
    let responses = endpoint
        .responses
        .iter()
        .map(|response| {
            (
                response.status.as_str(),
                response.description.as_str(),
                response.content_type.as_deref(),
            )
        })
        .collect_vec();
    assert_eq!(
        responses,
        [
            ("200", "The order", Some("application/xml")),
            ("404", "Not found", Some("text/plain")),
        ]
    );
}

// MARK: Degradation

#[test]
fn test_missing_type_column() {
    let model = parse(indoc::indoc! {"
        ## POST /notes

        | Name | Required | Description |
        |------|----------|-------------|
        | note | no | A note |
    "});

    assert_matches!(
        &*model.warnings,
        [warning] if warning.kind == ParseWarningKind::MissingTypeColumn
            && warning.line == Some(3),
    );
    let [endpoint] = &*model.endpoints else {
        panic!("expected one endpoint; got {:?}", model.endpoints);
    };
    assert_matches!(
        &*endpoint.params,
        [param] if param.name == "note" && param.raw_type.is_none() && param.required == Some(false),
    );
}

#[test]
fn test_unrecognized_header_in_parameter_section() {
    let model = parse(indoc::indoc! {"
        ## PUT /items/{id}

        Path Parameters

        | Foo | Bar |
        |-----|-----|
        | id | integer |
    "});

    assert_matches!(
        &*model.warnings,
        [warning] if warning.kind == ParseWarningKind::UnrecognizedTableHeader,
    );
    let [endpoint] = &*model.endpoints else {
        panic!("expected one endpoint; got {:?}", model.endpoints);
    };
    assert_matches!(
        &*endpoint.params,
        [param] if param.name == "id"
            && param.raw_type.as_deref() == Some("integer")
            && param.location == Some(ParameterLocation::Path),
    );
}

#[test]
fn test_orphaned_blocks() {
    let model = parse(indoc::indoc! {"
        # Overview

        | Name | Type |
        |------|------|
        | id | string |

        - `token` (string): An API token
        - 401: Unauthorized

        ## GET /status
    "});

    let kinds = model.warnings.iter().map(|warning| &warning.kind).collect_vec();
    assert_eq!(
        kinds,
        [
            &ParseWarningKind::OrphanedBlock("a table"),
            &ParseWarningKind::OrphanedBlock("a parameter"),
            &ParseWarningKind::OrphanedBlock("a response"),
        ]
    );
    assert_matches!(&*model.endpoints, [endpoint] if endpoint.params.is_empty());
}

#[test]
fn test_fenced_code_is_skipped() {
    let model = parse(indoc::indoc! {"
        ## GET /health

        ```
        ## POST /ignored
        ```

        ## GET /ready

        ```json
        {\"status\": \"ok\"}
    "});

    let paths = model
        .endpoints
        .iter()
        .map(|endpoint| endpoint.path.as_str())
        .collect_vec();
    assert_eq!(paths, ["/health", "/ready"]);
    assert_matches!(
        &*model.warnings,
        [warning] if warning.kind == ParseWarningKind::UnterminatedFence
            && warning.line == Some(9),
    );
}

#[test]
fn test_incomplete_endpoint_labels() {
    let model = parse(indoc::indoc! {"
        Method: POST

        Some prose.

        Path: /orphan
    "});

    assert!(model.endpoints.is_empty());
    let kinds = model.warnings.iter().map(|warning| &warning.kind).collect_vec();
    assert_eq!(
        kinds,
        [
            &ParseWarningKind::IncompleteEndpoint("a method", "path"),
            &ParseWarningKind::IncompleteEndpoint("a path", "method"),
        ]
    );
}

#[test]
fn test_origins_point_at_source_lines() {
    let text = indoc::indoc! {"
        ## GET /a

        - 200: OK
        - 20x: Whatever
        | Status |
        |---|
        | abc |
    "};
    let model = parse(text);

    assert!(model.warnings.is_empty());
    let [endpoint] = &*model.endpoints else {
        panic!("expected one endpoint; got {:?}", model.endpoints);
    };
    let [ok, bad] = &*endpoint.responses else {
        panic!("expected two responses; got {:?}", endpoint.responses);
    };
    assert_eq!(ok.status, "200");
    assert_eq!(bad.status, "abc");
    let span = bad.origin.span.unwrap();
    assert_eq!(&text[span.offset()..span.offset() + span.len()], "| abc |");
}
