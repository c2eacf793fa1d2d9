//! Maps declared parameter types to value domains, and derives
//! representative, boundary, and invalid values for each domain.
//!
//! Every test case category draws its values from here, so a parameter's
//! bounds mean the same thing to every category.

use std::fmt::Display;

use serde::Serialize;
use serde_json::{Value, json};
use unicase::UniCase;

use crate::{
    model::{Bounds, Parameter},
    parse::Literal,
};

/// Integers without declared bounds are probed against a 32-bit range.
const IMPLICIT_INT_LIMIT: i64 = i32::MAX as i64;
/// Strings without a length hint are probed against this length.
const IMPLICIT_MAX_LENGTH: usize = 1024;
const VERY_LONG_LENGTH: usize = 10_000;
/// Length bounds above this are too large to build values for, and are
/// probed as if they were absent.
pub const LENGTH_LIMIT: usize = 65_536;
const LARGE_NUMBER: f64 = 1e15;
/// The step used to probe just outside number bounds.
const EPSILON: f64 = 0.01;

/// A semantic value category.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Returns the domain that `value` belongs to.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null | Value::String(_) => Self::String,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Returns whether `value` can stand for a value of this domain.
    ///
    /// Integers are numbers too.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, Self::of(value)) {
            (Self::Number, Self::Integer) => true,
            (domain, of) => domain == of,
        }
    }

    /// Interprets a literal from the source document as a value
    /// in this domain.
    ///
    /// Text that doesn't fit the domain stays a string; typed values
    /// are kept as they are.
    pub fn coerce(self, literal: Literal) -> Value {
        let text = match literal {
            Literal::Json(value) => return value,
            Literal::Text(text) => text,
        };
        let text = unquote(text.trim());
        match self {
            Self::String => Value::String(text.to_owned()),
            Self::Integer => integer(text)
                .map(Value::from)
                .unwrap_or_else(|| Value::String(text.to_owned())),
            Self::Number => match text.parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => text
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or_else(|| Value::String(text.to_owned())),
            },
            Self::Boolean => {
                let word = UniCase::new(text);
                if ["true", "yes", "1"].into_iter().any(|t| UniCase::new(t) == word) {
                    Value::Bool(true)
                } else if ["false", "no", "0"].into_iter().any(|f| UniCase::new(f) == word) {
                    Value::Bool(false)
                } else {
                    Value::String(text.to_owned())
                }
            }
            Self::Array | Self::Object => match serde_json::from_str::<Value>(text) {
                Ok(value) if Self::of(&value) == self => value,
                _ => Value::String(text.to_owned()),
            },
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn unquote(text: &str) -> &str {
    for quote in ['`', '"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

fn integer(text: &str) -> Option<i64> {
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|n| n.fract() == 0.0 && n.abs() < 9e15)
            .map(|n| n as i64)
    })
}

// MARK: Classification

/// Classifies a declared type, like `int`, `String`, or `array of objects`.
///
/// Rules are tried in order: exact synonyms first, then keywords anywhere
/// in the text. Anything unrecognized is a string.
pub fn classify(raw_type: &str) -> Domain {
    let normalized = raw_type
        .trim()
        .trim_matches(|c: char| matches!(c, '`' | '*' | '_' | '?' | '!'))
        .to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.pattern.matches(&normalized))
        .map(|rule| rule.domain)
        .unwrap_or_default()
}

struct Rule {
    pattern: Pattern,
    domain: Domain,
}

enum Pattern {
    /// The whole type is one of these names.
    Exact(&'static [&'static str]),
    /// Any word of the type is one of these names.
    Word(&'static [&'static str]),
    /// The type contains one of these fragments.
    Fragment(&'static [&'static str]),
}

impl Pattern {
    fn matches(&self, text: &str) -> bool {
        match *self {
            Self::Exact(names) => names.contains(&text),
            Self::Word(names) => text
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|word| names.contains(&word)),
            Self::Fragment(fragments) => fragments.iter().any(|f| text.contains(f)),
        }
    }
}

const RULES: &[Rule] = &[
    Rule {
        pattern: Pattern::Exact(&["string", "str", "text", "字符串"]),
        domain: Domain::String,
    },
    Rule {
        pattern: Pattern::Exact(&[
            "int", "integer", "long", "int32", "int64", "uint", "整数", "整型",
        ]),
        domain: Domain::Integer,
    },
    Rule {
        pattern: Pattern::Exact(&[
            "number", "float", "double", "decimal", "numeric", "浮点", "浮点数", "数字",
        ]),
        domain: Domain::Number,
    },
    Rule {
        pattern: Pattern::Exact(&["bool", "boolean", "布尔", "布尔值"]),
        domain: Domain::Boolean,
    },
    Rule {
        pattern: Pattern::Exact(&["array", "list", "数组", "列表"]),
        domain: Domain::Array,
    },
    Rule {
        pattern: Pattern::Exact(&[
            "object", "dict", "map", "json", "hash", "对象", "字典",
        ]),
        domain: Domain::Object,
    },
    // Containers first, so that `array of integers` is an array.
    Rule {
        pattern: Pattern::Word(&["array", "list", "vec", "set", "arr"]),
        domain: Domain::Array,
    },
    Rule {
        pattern: Pattern::Fragment(&["[]", "数组", "列表"]),
        domain: Domain::Array,
    },
    Rule {
        pattern: Pattern::Word(&[
            "object", "dict", "dictionary", "map", "hashmap", "json", "hash", "struct", "record",
        ]),
        domain: Domain::Object,
    },
    Rule {
        pattern: Pattern::Fragment(&["对象", "字典"]),
        domain: Domain::Object,
    },
    Rule {
        pattern: Pattern::Word(&[
            "string", "str", "text", "char", "varchar", "uuid", "date", "datetime", "time",
            "email", "url", "uri",
        ]),
        domain: Domain::String,
    },
    Rule {
        pattern: Pattern::Fragment(&["字符"]),
        domain: Domain::String,
    },
    Rule {
        pattern: Pattern::Word(&["bool", "boolean"]),
        domain: Domain::Boolean,
    },
    Rule {
        pattern: Pattern::Fragment(&["布尔"]),
        domain: Domain::Boolean,
    },
    Rule {
        pattern: Pattern::Word(&[
            "int", "integer", "long", "short", "int8", "int16", "int32", "int64", "uint", "i32",
            "i64", "u32", "u64",
        ]),
        domain: Domain::Integer,
    },
    Rule {
        pattern: Pattern::Fragment(&["整"]),
        domain: Domain::Integer,
    },
    Rule {
        pattern: Pattern::Word(&[
            "number", "float", "double", "decimal", "numeric", "real", "f32", "f64",
        ]),
        domain: Domain::Number,
    },
    Rule {
        pattern: Pattern::Fragment(&["浮点", "数字", "数值"]),
        domain: Domain::Number,
    },
];

// MARK: Values

/// A value that doesn't come from the documentation.
pub fn representative(param: &Parameter) -> Value {
    let documented = param
        .example
        .iter()
        .chain(&param.default)
        .chain(&param.allowed)
        .find(|value| param.domain.accepts(value));
    if let Some(value) = documented {
        return value.clone();
    }
    let bounds = param.bounds.unwrap_or_default();
    match param.domain {
        Domain::String => {
            let (min, max) = length_bounds(bounds);
            Value::String(fit(format!("test_{}", param.name), min.unwrap_or(0), max))
        }
        Domain::Integer => {
            let (min, max) = integer_bounds(bounds);
            let n = match (min, max) {
                (Some(min), _) => min,
                (None, Some(max)) if max < 1 => max,
                _ => 1,
            };
            Value::from(n)
        }
        Domain::Number => {
            let n = match (bounds.min, bounds.max) {
                (Some(min), _) => min,
                (None, Some(max)) if max < 1.0 => max,
                _ => 1.0,
            };
            Value::from(n)
        }
        Domain::Boolean => Value::Bool(true),
        Domain::Array => {
            let (min, max) = length_bounds(bounds);
            let count = 2.max(min.unwrap_or(0)).min(max.unwrap_or(usize::MAX));
            Value::Array(items(count))
        }
        Domain::Object => json!({"key": "value"}),
    }
}

/// Why a boundary value was picked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Probe {
    BelowMin,
    AtMin,
    AboveMin,
    BelowMax,
    AtMax,
    AboveMax,
    Empty,
    SingleCharacter,
    VeryLong,
    Zero,
    NegativeOne,
    Large,
    FirstAllowed,
    LastAllowed,
    NotAllowed,
}

impl Probe {
    /// Edges are exactly at a limit.
    pub fn is_edge(self) -> bool {
        matches!(
            self,
            Self::AtMin | Self::AtMax | Self::Empty | Self::FirstAllowed | Self::LastAllowed
        )
    }
}

impl Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::BelowMin => "just below the minimum",
            Self::AtMin => "the minimum",
            Self::AboveMin => "just above the minimum",
            Self::BelowMax => "just below the maximum",
            Self::AtMax => "the maximum",
            Self::AboveMax => "just above the maximum",
            Self::Empty => "empty",
            Self::SingleCharacter => "a single character",
            Self::VeryLong => "very long",
            Self::Zero => "zero",
            Self::NegativeOne => "negative",
            Self::Large => "very large",
            Self::FirstAllowed => "the first allowed value",
            Self::LastAllowed => "the last allowed value",
            Self::NotAllowed => "not an allowed value",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryValue {
    pub value: Value,
    pub probe: Probe,
    /// Whether the value is inside the parameter's valid range.
    pub within: bool,
}

/// Returns values at and just past the edges of `param`'s valid range,
/// in a fixed order, without duplicates.
///
/// Allowed values take precedence over bounds. Booleans and objects
/// have no boundaries.
pub fn boundary_values(param: &Parameter) -> Vec<BoundaryValue> {
    if !param.allowed.is_empty() {
        return allowed_boundaries(param);
    }
    let bounds = param.bounds.filter(|bounds| !bounds.is_empty());
    let mut values = Vec::new();
    match param.domain {
        Domain::Integer => match bounds {
            Some(bounds) => {
                let (min, max) = integer_bounds(bounds);
                let within = |n: i64| min.is_none_or(|min| n >= min) && max.is_none_or(|max| n <= max);
                let mut probe = |n: i64, probe| push(&mut values, Value::from(n), probe, within(n));
                if let Some(min) = min {
                    probe(min.saturating_sub(1), Probe::BelowMin);
                    probe(min, Probe::AtMin);
                    probe(min.saturating_add(1), Probe::AboveMin);
                }
                if let Some(max) = max {
                    probe(max.saturating_sub(1), Probe::BelowMax);
                    probe(max, Probe::AtMax);
                    probe(max.saturating_add(1), Probe::AboveMax);
                }
            }
            None => {
                push(&mut values, Value::from(0), Probe::Zero, true);
                push(&mut values, Value::from(-1), Probe::NegativeOne, true);
                push(&mut values, Value::from(IMPLICIT_INT_LIMIT + 1), Probe::Large, false);
            }
        },
        Domain::Number => match bounds {
            Some(bounds) => {
                let mut probe = |n: f64, probe| {
                    let n = round(n);
                    push(&mut values, Value::from(n), probe, bounds.contains(n));
                };
                if let Some(min) = bounds.min {
                    probe(min - EPSILON, Probe::BelowMin);
                    probe(min, Probe::AtMin);
                    probe(min + EPSILON, Probe::AboveMin);
                }
                if let Some(max) = bounds.max {
                    probe(max - EPSILON, Probe::BelowMax);
                    probe(max, Probe::AtMax);
                    probe(max + EPSILON, Probe::AboveMax);
                }
            }
            None => {
                push(&mut values, Value::from(0), Probe::Zero, true);
                push(&mut values, Value::from(-1), Probe::NegativeOne, true);
                push(&mut values, Value::from(LARGE_NUMBER), Probe::Large, true);
            }
        },
        Domain::String => {
            let implicit_min = usize::from(param.required);
            let (min, max) = match bounds {
                Some(bounds) => {
                    let (min, max) = length_bounds(bounds);
                    (min.unwrap_or(implicit_min), max)
                }
                None => (implicit_min, Some(IMPLICIT_MAX_LENGTH)),
            };
            let within = |len: usize| len >= min && max.is_none_or(|max| len <= max);
            let mut probe = |len: usize, probe| {
                push(&mut values, Value::String("a".repeat(len)), probe, within(len));
            };
            probe(0, Probe::Empty);
            probe(1, Probe::SingleCharacter);
            match bounds {
                Some(bounds) => {
                    if min > 0 {
                        probe(min - 1, Probe::BelowMin);
                        probe(min, Probe::AtMin);
                    }
                    match max {
                        Some(max) => {
                            probe(max, Probe::AtMax);
                            if let Some(above) = max.checked_add(1) {
                                probe(above, Probe::AboveMax);
                            }
                        }
                        // Declared, but past the limit.
                        None if bounds.max.is_some() => probe(VERY_LONG_LENGTH, Probe::VeryLong),
                        None => {}
                    }
                }
                None => probe(VERY_LONG_LENGTH, Probe::VeryLong),
            }
        }
        Domain::Array => {
            if let Some(bounds) = bounds {
                let (min, max) = length_bounds(bounds);
                let within = |count: usize| {
                    min.is_none_or(|min| count >= min) && max.is_none_or(|max| count <= max)
                };
                let mut probe = |count: usize, probe| {
                    push(&mut values, Value::Array(items(count)), probe, within(count));
                };
                if let Some(min) = min {
                    if min > 0 {
                        probe(min - 1, Probe::BelowMin);
                    }
                    probe(min, Probe::AtMin);
                }
                if let Some(max) = max {
                    probe(max, Probe::AtMax);
                    if let Some(above) = max.checked_add(1) {
                        probe(above, Probe::AboveMax);
                    }
                }
            }
        }
        Domain::Boolean | Domain::Object => {}
    }
    values
}

fn allowed_boundaries(param: &Parameter) -> Vec<BoundaryValue> {
    let mut values = Vec::new();
    if let Some(first) = param.allowed.first() {
        push(&mut values, first.clone(), Probe::FirstAllowed, true);
    }
    if let Some(last) = param.allowed.last() {
        push(&mut values, last.clone(), Probe::LastAllowed, true);
    }
    push(&mut values, disallowed(param), Probe::NotAllowed, false);
    values
}

/// Picks a value of `param`'s domain that isn't one of its allowed values.
fn disallowed(param: &Parameter) -> Value {
    if param.domain == Domain::Integer {
        let largest = param.allowed.iter().filter_map(Value::as_i64).max();
        if let Some(largest) = largest {
            return Value::from(largest.saturating_add(1));
        }
    }
    let mut candidate = String::from("__invalid__");
    while param.allowed.iter().any(|value| value.as_str() == Some(candidate.as_str())) {
        candidate.push('_');
    }
    Value::String(candidate)
}

/// Returns values from domains other than `param`'s, each from a
/// different domain.
pub fn invalid_type_values(param: &Parameter) -> Vec<Value> {
    match param.domain {
        Domain::String => vec![json!(12345), json!(true), json!({"unexpected": "object"})],
        Domain::Integer => vec![json!("abc"), json!(true), json!({"value": 1})],
        Domain::Number => vec![json!("abc"), json!(false), json!([1])],
        Domain::Boolean => vec![json!("not_a_boolean"), json!(2), json!([true])],
        Domain::Array => vec![json!({"not": "an_array"}), json!("not_an_array"), json!(1)],
        Domain::Object => vec![json!("not_an_object"), json!(["not", "an", "object"]), json!(1)],
    }
}

fn push(values: &mut Vec<BoundaryValue>, value: Value, probe: Probe, within: bool) {
    if values.iter().all(|existing| existing.value != value) {
        values.push(BoundaryValue {
            value,
            probe,
            within,
        });
    }
}

/// Rounds away floating-point noise, like `0.30000000000000004`.
fn round(n: f64) -> f64 {
    (n * 1e6).round() / 1e6
}

fn integer_bounds(bounds: Bounds) -> (Option<i64>, Option<i64>) {
    (
        bounds.min.map(|min| min.ceil() as i64),
        bounds.max.map(|max| max.floor() as i64),
    )
}

/// Returns the length bounds that fit within [`LENGTH_LIMIT`].
fn length_bounds(bounds: Bounds) -> (Option<usize>, Option<usize>) {
    let length = |n: f64| Some(n.max(0.0)).filter(|&n| n <= LENGTH_LIMIT as f64);
    (
        bounds.min.and_then(length).map(|min| min.ceil() as usize),
        bounds.max.and_then(length).map(|max| max.floor() as usize),
    )
}

/// Returns whether a length bound of `bounds` is too large to probe.
pub fn exceeds_length_limit(bounds: Bounds) -> bool {
    [bounds.min, bounds.max]
        .into_iter()
        .flatten()
        .any(|n| n > LENGTH_LIMIT as f64)
}

/// Pads or truncates `text` to a length within `min..=max`.
fn fit(text: String, min: usize, max: Option<usize>) -> String {
    let mut text = text;
    let len = text.chars().count();
    if len < min {
        text.extend(std::iter::repeat_n('x', min - len));
    }
    match max {
        Some(max) if text.chars().count() > max => text.chars().take(max).collect(),
        _ => text,
    }
}

fn items(count: usize) -> Vec<Value> {
    (1..=count)
        .map(|n| Value::String(format!("item{n}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::model::ParameterLocation;

    fn param(name: &str, domain: Domain) -> Parameter {
        Parameter {
            name: name.to_owned(),
            location: ParameterLocation::Body,
            domain,
            required: true,
            description: String::new(),
            example: None,
            default: None,
            allowed: vec![],
            bounds: None,
        }
    }

    fn bounded(name: &str, domain: Domain, min: f64, max: f64) -> Parameter {
        Parameter {
            bounds: Some(Bounds {
                min: Some(min),
                max: Some(max),
            }),
            ..param(name, domain)
        }
    }

    fn values(values: &[BoundaryValue]) -> Vec<(Value, bool)> {
        values
            .iter()
            .map(|value| (value.value.clone(), value.within))
            .collect()
    }

    // MARK: Classification

    #[test]
    fn test_exact_synonyms() {
        assert_eq!(classify("int"), Domain::Integer);
        assert_eq!(classify("Integer"), Domain::Integer);
        assert_eq!(classify("bool"), Domain::Boolean);
        assert_eq!(classify("double"), Domain::Number);
        assert_eq!(classify("dict"), Domain::Object);
        assert_eq!(classify("list"), Domain::Array);
        assert_eq!(classify("`String`"), Domain::String);
        assert_eq!(classify("整数"), Domain::Integer);
    }

    #[test]
    fn test_containers_take_precedence() {
        assert_eq!(classify("array of objects"), Domain::Array);
        assert_eq!(classify("int[]"), Domain::Array);
        assert_eq!(classify("List<Integer>"), Domain::Array);
        assert_eq!(classify("map<string, int>"), Domain::Object);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(classify("string (uuid)"), Domain::String);
        assert_eq!(classify("integer (int64)"), Domain::Integer);
        assert_eq!(classify("decimal number"), Domain::Number);
        assert_eq!(classify("字符串类型"), Domain::String);
    }

    #[test]
    fn test_unrecognized_types_are_strings() {
        assert_eq!(classify(""), Domain::String);
        assert_eq!(classify("enum"), Domain::String);
        assert_eq!(classify("a pointer to something"), Domain::String);
    }

    // MARK: Coercion

    #[test]
    fn test_coerce_text() {
        assert_eq!(Domain::Integer.coerce(Literal::Text("42".into())), json!(42));
        assert_eq!(Domain::Integer.coerce(Literal::Text("`7`".into())), json!(7));
        assert_eq!(Domain::Number.coerce(Literal::Text("2.5".into())), json!(2.5));
        assert_eq!(Domain::Boolean.coerce(Literal::Text("Yes".into())), json!(true));
        assert_eq!(
            Domain::Object.coerce(Literal::Text(r#"{"a": 1}"#.into())),
            json!({"a": 1})
        );
        assert_eq!(Domain::String.coerce(Literal::Text("\"quoted\"".into())), json!("quoted"));
    }

    #[test]
    fn test_coerce_keeps_mismatched_text() {
        assert_eq!(Domain::Integer.coerce(Literal::Text("many".into())), json!("many"));
        assert_eq!(Domain::Array.coerce(Literal::Text("{}".into())), json!("{}"));
    }

    #[test]
    fn test_coerce_keeps_typed_values() {
        assert_eq!(Domain::Integer.coerce(Literal::Json(json!("5"))), json!("5"));
    }

    // MARK: Representative values

    #[test]
    fn test_representative_prefers_documented_values() {
        let mut p = param("status", Domain::String);
        p.allowed = vec![json!("open"), json!("closed")];
        assert_eq!(representative(&p), json!("open"));

        p.default = Some(json!("closed"));
        assert_eq!(representative(&p), json!("closed"));

        p.example = Some(json!("pending"));
        assert_eq!(representative(&p), json!("pending"));
    }

    #[test]
    fn test_representative_skips_mistyped_values() {
        let mut p = param("q", Domain::Integer);
        p.example = Some(json!("abc"));
        assert_eq!(representative(&p), json!(1));

        p.allowed = vec![json!("many"), json!(7)];
        assert_eq!(representative(&p), json!(7));

        let mut price = param("price", Domain::Number);
        price.example = Some(json!(5));
        assert_eq!(representative(&price), json!(5));
    }

    #[test]
    fn test_representative_ignores_oversized_lengths() {
        let name = bounded("name", Domain::String, 1e20, 1e20);
        assert_eq!(representative(&name), json!("test_name"));

        let tags = bounded("tags", Domain::Array, 2e9, 3e9);
        assert_eq!(representative(&tags), json!(["item1", "item2"]));
    }

    #[test]
    fn test_representative_respects_bounds() {
        assert_eq!(representative(&bounded("quantity", Domain::Integer, 1.0, 100.0)), json!(1));
        assert_eq!(representative(&bounded("offset", Domain::Integer, -10.0, -5.0)), json!(-10));
        assert_eq!(representative(&param("count", Domain::Integer)), json!(1));
        assert_eq!(representative(&bounded("code", Domain::String, 1.0, 3.0)), json!("tes"));
        assert_eq!(
            representative(&bounded("pin", Domain::String, 12.0, 20.0)),
            json!("test_pinxxxx")
        );
        assert_eq!(
            representative(&bounded("tags", Domain::Array, 0.0, 1.0)),
            json!(["item1"])
        );
    }

    // MARK: Boundaries

    #[test]
    fn test_integer_boundaries() {
        let values = boundary_values(&bounded("quantity", Domain::Integer, 1.0, 100.0));

        assert_eq!(
            self::values(&values),
            [
                (json!(0), false),
                (json!(1), true),
                (json!(2), true),
                (json!(99), true),
                (json!(100), true),
                (json!(101), false),
            ]
        );
    }

    #[test]
    fn test_narrow_integer_boundaries_dont_repeat() {
        let values = boundary_values(&bounded("flag", Domain::Integer, 0.0, 1.0));

        assert_eq!(
            self::values(&values),
            [
                (json!(-1), false),
                (json!(0), true),
                (json!(1), true),
                (json!(2), false),
            ]
        );
    }

    #[test]
    fn test_implicit_integer_boundaries() {
        let values = boundary_values(&param("page", Domain::Integer));

        assert_eq!(
            self::values(&values),
            [
                (json!(0), true),
                (json!(-1), true),
                (json!(2147483648i64), false),
            ]
        );
    }

    #[test]
    fn test_number_boundaries() {
        let values = boundary_values(&bounded("price", Domain::Number, 0.5, 9.5));

        assert_eq!(
            self::values(&values),
            [
                (json!(0.49), false),
                (json!(0.5), true),
                (json!(0.51), true),
                (json!(9.49), true),
                (json!(9.5), true),
                (json!(9.51), false),
            ]
        );
    }

    #[test]
    fn test_string_length_boundaries() {
        let values = boundary_values(&bounded("username", Domain::String, 3.0, 5.0));

        assert_eq!(
            self::values(&values),
            [
                (json!(""), false),
                (json!("a"), false),
                (json!("aa"), false),
                (json!("aaa"), true),
                (json!("aaaaa"), true),
                (json!("aaaaaa"), false),
            ]
        );
    }

    #[test]
    fn test_implicit_string_boundaries() {
        let required = boundary_values(&param("name", Domain::String));
        let optional = boundary_values(&Parameter {
            required: false,
            ..param("name", Domain::String)
        });

        assert_eq!(required.len(), 3);
        assert_eq!((&required[0].value, required[0].within), (&json!(""), false));
        assert_eq!((&optional[0].value, optional[0].within), (&json!(""), true));
        assert!(required[1].within);
        assert_eq!(required[2].probe, Probe::VeryLong);
        assert!(!required[2].within);
    }

    #[test]
    fn test_oversized_string_length_is_probed_as_very_long() {
        let p = Parameter {
            bounds: Some(Bounds {
                min: None,
                max: Some(1e20),
            }),
            ..param("name", Domain::String)
        };

        let values = boundary_values(&p);

        assert_eq!(
            values.iter().map(|v| v.probe).collect::<Vec<_>>(),
            [Probe::Empty, Probe::SingleCharacter, Probe::VeryLong]
        );
        assert!(values.iter().all(|v| v.value.as_str().is_some_and(|s| s.len() <= LENGTH_LIMIT)));
        // The declared maximum is larger, so a very long value is still valid.
        assert!(values[2].within);
    }

    #[test]
    fn test_oversized_length_keeps_the_other_bound() {
        let values = boundary_values(&bounded("name", Domain::String, 2.0, 2e9));

        assert_eq!(
            values.iter().map(|v| (v.probe, v.within)).collect::<Vec<_>>(),
            [
                (Probe::Empty, false),
                (Probe::SingleCharacter, false),
                (Probe::AtMin, true),
                (Probe::VeryLong, true),
            ]
        );
    }

    #[test]
    fn test_oversized_array_length_is_ignored() {
        let values = boundary_values(&bounded("tags", Domain::Array, 1.0, 1e20));

        assert_eq!(
            self::values(&values),
            [(json!([]), false), (json!(["item1"]), true)]
        );
        assert!(boundary_values(&bounded("tags", Domain::Array, 2e9, 3e9)).is_empty());
    }

    #[test]
    fn test_exceeds_length_limit() {
        assert!(!exceeds_length_limit(Bounds {
            min: Some(1.0),
            max: Some(LENGTH_LIMIT as f64),
        }));
        assert!(exceeds_length_limit(Bounds {
            min: None,
            max: Some(1e20),
        }));
        assert!(exceeds_length_limit(Bounds {
            min: Some(2e9),
            max: None,
        }));
    }

    #[test]
    fn test_allowed_values_replace_bounds() {
        let mut p = bounded("order", Domain::String, 1.0, 10.0);
        p.allowed = vec![json!("asc"), json!("desc")];

        assert_eq!(
            self::values(&boundary_values(&p)),
            [
                (json!("asc"), true),
                (json!("desc"), true),
                (json!("__invalid__"), false),
            ]
        );
    }

    #[test]
    fn test_integer_enum_probes_past_largest_value() {
        let mut p = param("level", Domain::Integer);
        p.allowed = vec![json!(1), json!(3), json!(2)];

        let values = boundary_values(&p);

        assert_eq!(values.last().map(|v| &v.value), Some(&json!(4)));
    }

    #[test]
    fn test_unbounded_domains() {
        assert!(boundary_values(&param("active", Domain::Boolean)).is_empty());
        assert!(boundary_values(&param("meta", Domain::Object)).is_empty());
        assert!(boundary_values(&param("tags", Domain::Array)).is_empty());
    }

    // MARK: Invalid types

    #[test]
    fn test_invalid_values_leave_the_domain() {
        for domain in [
            Domain::String,
            Domain::Integer,
            Domain::Number,
            Domain::Boolean,
            Domain::Array,
            Domain::Object,
        ] {
            let values = invalid_type_values(&param("p", domain));
            let mut domains: Vec<_> = values.iter().map(Domain::of).collect();
            assert!(!domains.contains(&domain), "{domain}: {values:?}");
            domains.dedup();
            assert_eq!(domains.len(), values.len(), "{domain}: {values:?}");
        }
    }
}
