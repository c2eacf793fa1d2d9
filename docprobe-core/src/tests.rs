//! Shared test-only helpers.

use std::fmt::{Arguments, Debug, Display};

use indexmap::IndexMap;
use pretty_assertions::Comparison;

use crate::{
    classify::Domain,
    model::{ApiSpec, Bounds, Endpoint, Method, Parameter, ParameterLocation, ResponseSpec},
};

/// Asserts that an expression matches the given pattern.
///
/// The pattern can be optionally followed by a match guard. This works
/// exactly like the unstable `assert_matches!()` macro (rust-lang/rust#82775).
macro_rules! assert_matches {
    ($left:expr, $($pattern:pat_param)|+ $(if $guard:expr)? $(,)?) => {
        match $left {
            $($pattern)|+ $(if $guard)? => {}
            ref left => {
                crate::tests::assert_matches_failed(
                    left,
                    stringify!($($pattern)|+ $(if $guard)?),
                    None,
                );
            }
        }
    };
    ($left:expr, $($pattern:pat_param)|+ $(if $guard:expr)?, $($arg:tt)+) => {
        match $left {
            $($pattern)|+ $(if $guard)? => {}
            ref left => {
                crate::tests::assert_matches_failed(
                    left,
                    stringify!($($pattern)|+ $(if $guard)?),
                    Some(format_args!($($arg)+)),
                );
            }
        }
    };
}

pub(crate) use assert_matches;

#[track_caller]
pub(crate) fn assert_matches_failed(left: impl Debug, right: &str, message: Option<Arguments<'_>>) {
    struct Pattern<'a>(&'a str);
    impl Debug for Pattern<'_> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            Display::fmt(self.0, f)
        }
    }

    let right = Pattern(right);
    let comparison = Comparison::new(&left, &right);
    match message {
        Some(message) => panic!(
            "{}",
            indoc::formatdoc! {"
                assertion `left matches right` failed: {message}

                {comparison}
            "},
        ),
        None => panic!(
            "{}",
            indoc::formatdoc! {"
                assertion `left matches right` failed

                {comparison}
            "},
        ),
    }
}

// MARK: Fixtures

/// An optional parameter without hints.
pub(crate) fn param(name: &str, location: ParameterLocation, domain: Domain) -> Parameter {
    Parameter {
        name: name.to_owned(),
        location,
        domain,
        required: location == ParameterLocation::Path,
        description: String::new(),
        example: None,
        default: None,
        allowed: vec![],
        bounds: None,
    }
}

/// Inclusive bounds on both ends.
pub(crate) fn between(min: f64, max: f64) -> Option<Bounds> {
    Some(Bounds {
        min: Some(min),
        max: Some(max),
    })
}

/// An endpoint that documents a single `200` response.
pub(crate) fn endpoint(method: Method, path: &str, params: Vec<Parameter>) -> Endpoint {
    Endpoint {
        path: path.to_owned(),
        method,
        description: String::new(),
        params,
        responses: IndexMap::from_iter([("200".to_owned(), ResponseSpec::default_success())]),
    }
}

pub(crate) fn spec(endpoints: Vec<Endpoint>) -> ApiSpec {
    ApiSpec {
        title: "Test API".to_owned(),
        description: String::new(),
        base_url: "https://api.example.com".to_owned(),
        version: "1.0.0".to_owned(),
        endpoints,
    }
}
