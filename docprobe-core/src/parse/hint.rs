//! Grammars for constraints that documentation states in prose:
//! ranges like `1-100` or `between 1 and 100`, one-sided limits like
//! `max 50 characters`, and enumerations like `one of: asc, desc`.

use winnow::{
    Parser,
    ascii::{digit1, space0, space1},
    combinator::{alt, delimited, opt, preceded, separated},
    token::take_while,
};

use crate::model::Bounds;

use super::{Literal, ParameterDraft};

/// Fills in whatever a parameter's description and declared type say
/// about its values, unless the source already said it explicitly.
pub fn apply(draft: &mut ParameterDraft, raw_type: Option<&str>) {
    let description = draft.description.as_str();
    if draft.bounds.is_none() {
        draft.bounds = bounds(description).or_else(|| raw_type.and_then(bounds));
    }
    if draft.allowed.is_empty() {
        draft.allowed = allowed_values(description)
            .into_iter()
            .map(Literal::Text)
            .collect();
    }
    if draft.example.is_none() {
        draft.example = example(description).map(Literal::Text);
    }
    if draft.default.is_none() {
        draft.default = default_value(description).map(Literal::Text);
    }
}

/// Finds numeric or length bounds in `text`.
///
/// The first explicit range wins. Without one, one-sided limits
/// anywhere in the text are combined.
pub fn bounds(text: &str) -> Option<Bounds> {
    let lower = text.to_lowercase();
    let mut min = None;
    let mut max = None;
    for start in clause_starts(&lower) {
        let mut input = &lower[start..];
        if let Ok(bounds) = range.parse_next(&mut input) {
            if ends_cleanly(input) {
                return Some(bounds);
            }
            continue;
        }
        let mut input = &lower[start..];
        match limit.parse_next(&mut input) {
            Ok(Limit::Min(value)) if min.is_none() => min = Some(value),
            Ok(Limit::Max(value)) if max.is_none() => max = Some(value),
            _ => {}
        }
    }
    match (min, max) {
        (None, None) => None,
        (Some(min), Some(max)) if min > max => None,
        (min, max) => Some(Bounds { min, max }),
    }
}

/// Finds an enumeration of allowed values introduced by a keyword,
/// like `one of: asc, desc` or ``allowed values: `a` | `b` ``.
pub fn allowed_values(text: &str) -> Vec<String> {
    const KEYWORDS: &[&str] = &[
        "allowed values",
        "possible values",
        "valid values",
        "one of",
        "enum",
        "options",
        "可选值",
        "取值",
    ];
    let lower = text.to_lowercase();
    if lower.len() != text.len() {
        // Case folding changed byte offsets; only exact keywords can match.
        return find_list(text, text, KEYWORDS);
    }
    find_list(text, &lower, KEYWORDS)
}

/// Finds an example value, like the `42` in `e.g. 42`.
pub fn example(text: &str) -> Option<String> {
    find_item(
        text,
        &["example:", "examples:", "e.g.", "eg.", "for example", "例如", "示例"],
    )
}

/// Finds a default value, like the `asc` in `defaults to asc`.
pub fn default_value(text: &str) -> Option<String> {
    find_item(
        text,
        &[
            "defaults to",
            "default:",
            "default=",
            "default is",
            "default value is",
            "默认值",
            "默认为",
        ],
    )
}

/// Parses a whole cell as a list of values, like `asc, desc` or `a | b`.
pub fn value_list(text: &str) -> Vec<String> {
    let mut input = text.trim();
    match list.parse_next(&mut input) {
        Ok(values) if input.trim().is_empty() || input.starts_with(['.', ';', ')']) => values,
        _ => Vec::new(),
    }
}

fn find_list(text: &str, haystack: &str, keywords: &[&str]) -> Vec<String> {
    for keyword in keywords {
        let Some(index) = haystack.find(keyword) else {
            continue;
        };
        let mut input = &text[index + keyword.len()..];
        let values = preceded((space0, opt(alt((':', '：', '='))), space0), list)
            .parse_next(&mut input)
            .unwrap_or_default();
        if values.len() >= 2 {
            return values;
        }
    }
    Vec::new()
}

fn find_item(text: &str, keywords: &[&str]) -> Option<String> {
    let lower = text.to_lowercase();
    let haystack = if lower.len() == text.len() { &lower } else { text };
    keywords.iter().find_map(|keyword| {
        let index = haystack.find(keyword)?;
        let mut input = &text[index + keyword.len()..];
        preceded((space0, opt(alt((':', '：', '=', ','))), space0), item)
            .parse_next(&mut input)
            .ok()
    })
}

/// Byte offsets where a clause may start: the start of the text,
/// and the start of every word that isn't glued to a number.
fn clause_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
    let mut previous: Option<char> = None;
    text.char_indices().filter_map(move |(index, c)| {
        let starts = match previous {
            None => true,
            Some(p) => {
                !p.is_alphanumeric() && !matches!(p, '-' | '.' | '_' | '/') && !c.is_whitespace()
            }
        };
        previous = Some(c);
        starts.then_some(index)
    })
}

/// Rejects ranges that are really part of a longer token,
/// like the `2024-01` in `2024-01-31`.
fn ends_cleanly(rest: &str) -> bool {
    !rest.starts_with(|c: char| c.is_alphanumeric() || matches!(c, '-' | '/' | ':' | '_'))
}

fn number(input: &mut &str) -> winnow::Result<f64> {
    (opt('-'), digit1, opt(('.', digit1)))
        .take()
        .try_map(str::parse::<f64>)
        .parse_next(input)
}

fn range(input: &mut &str) -> winnow::Result<Bounds> {
    alt((
        (
            "between",
            space1,
            number,
            space1,
            "and",
            space1,
            number,
        )
            .map(|(_, _, min, _, _, _, max)| (min, max)),
        (
            opt(alt(("range", "length"))),
            space0,
            opt(':'),
            space0,
            '[',
            space0,
            number,
            space0,
            ',',
            space0,
            number,
            space0,
            ']',
        )
            .map(|(_, _, _, _, _, _, min, _, _, _, max, _, _)| (min, max)),
        (
            number,
            space0,
            alt(("..=", "..", "-", "~", "–", "—")),
            space0,
            number,
        )
            .map(|(min, _, _, _, max)| (min, max)),
        (number, space1, "to", space1, number).map(|(min, _, _, _, max)| (min, max)),
    ))
    .verify(|&(min, max): &(f64, f64)| min <= max)
    .map(|(min, max)| Bounds {
        min: Some(min),
        max: Some(max),
    })
    .parse_next(input)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Limit {
    Min(f64),
    Max(f64),
}

fn limit(input: &mut &str) -> winnow::Result<Limit> {
    let min = alt((
        "minimum",
        "min",
        "at least",
        "no less than",
        "greater than or equal to",
        ">=",
        "≥",
    ));
    let max = alt((
        "maximum",
        "max",
        "at most",
        "up to",
        "no more than",
        "less than or equal to",
        "<=",
        "≤",
    ));
    alt((
        preceded((min, qualifier), number).map(Limit::Min),
        preceded((max, qualifier), number).map(Limit::Max),
    ))
    .parse_next(input)
}

/// Optional words between a limit keyword and its number,
/// like the ` length of ` in `max length of 50`.
fn qualifier(input: &mut &str) -> winnow::Result<()> {
    (
        space0,
        opt(alt(("length", "len", "value", "size", "items"))),
        space0,
        opt(alt((':', '='))),
        space0,
        opt(("of", space1)),
    )
        .void()
        .parse_next(input)
}

fn list(input: &mut &str) -> winnow::Result<Vec<String>> {
    delimited(
        opt(('[', space0)),
        separated(1.., item, separator),
        opt((space0, ']')),
    )
    .parse_next(input)
}

fn item(input: &mut &str) -> winnow::Result<String> {
    alt((
        delimited('`', take_while(1.., |c| c != '`'), '`'),
        delimited('"', take_while(1.., |c| c != '"'), '"'),
        delimited('\'', take_while(1.., |c| c != '\''), '\''),
        take_while(1.., |c: char| {
            c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
        })
        .map(|word: &str| word.trim_end_matches('.')),
    ))
    .map(str::to_owned)
    .parse_next(input)
}

fn separator(input: &mut &str) -> winnow::Result<()> {
    alt((
        (space0, alt((',', '，', '、')), space0, opt(("or", space1))).void(),
        (space0, alt(('|', '/')), space0).void(),
        (space1, "or", space1).void(),
    ))
    .parse_next(input)
}
