//! Line rules for the Markdown scanner.
//!
//! Each rule looks at one line in isolation, and either recognizes it
//! or passes. Rules are tried in [`RULES`] order, and the first match
//! wins; lines that no rule recognizes are [`LineMatch::Text`].

use unicase::UniCase;
use winnow::{
    Parser,
    ascii::{alpha1, digit1, space0, space1},
    combinator::{alt, delimited, opt},
    token::{take_till, take_while},
};

use crate::model::ParameterLocation;

/// Methods that are recognized as endpoint declarations.
/// Unsupported ones are recognized so that they can be reported.
const METHODS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "TRACE", "CONNECT",
];

/// A line, split into its Markdown block markers and content.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Line<'a> {
    /// The whole line, without surrounding whitespace.
    pub text: &'a str,
    /// The ATX heading level, if the line is a heading.
    pub heading: Option<usize>,
    /// Whether the line is a list item.
    pub bullet: bool,
    /// The line without heading markers or list bullets.
    pub content: &'a str,
}

impl<'a> Line<'a> {
    pub fn new(raw: &'a str) -> Self {
        let text = raw.trim();
        let hashes = text.chars().take_while(|&c| c == '#').count();
        if (1..=6).contains(&hashes) {
            let rest = &text[hashes..];
            if rest.is_empty() || rest.starts_with([' ', '\t']) {
                return Self {
                    text,
                    heading: Some(hashes),
                    bullet: false,
                    content: rest.trim().trim_end_matches('#').trim_end(),
                };
            }
        }
        match bullet(text) {
            Some(content) => Self {
                text,
                heading: None,
                bullet: true,
                content: content.trim(),
            },
            None => Self {
                text,
                heading: None,
                bullet: false,
                content: text,
            },
        }
    }
}

fn bullet(text: &str) -> Option<&str> {
    if let Some(rest) = text.strip_prefix(['-', '*', '+']) {
        return rest.strip_prefix([' ', '\t']);
    }
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        return text[digits..]
            .strip_prefix(['.', ')'])
            .and_then(|rest| rest.strip_prefix([' ', '\t']));
    }
    None
}

/// What a line was recognized as.
#[derive(Clone, Debug, PartialEq)]
pub enum LineMatch<'a> {
    Blank,
    Fence,
    TableSeparator,
    TableRow(Vec<&'a str>),
    Endpoint(EndpointLine<'a>),
    MethodLabel(&'a str),
    PathLabel(&'a str),
    Metadata(MetadataKey, &'a str),
    Section(Section),
    Response(ResponseLine<'a>),
    Parameter(ParameterLine<'a>),
    Heading(usize, &'a str),
    Text(&'a str),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EndpointLine<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// Any text after the path, like a summary.
    pub summary: &'a str,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetadataKey {
    BaseUrl,
    Version,
    ContentType,
    Description,
}

/// A block of an endpoint's documentation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Section {
    /// Parameters, with the location that the heading names, if any.
    Parameters(Option<ParameterLocation>),
    Responses,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResponseLine<'a> {
    pub status: &'a str,
    pub description: &'a str,
}

/// A list item that documents a parameter, like
/// ``- `id` (integer, required): The order ID``.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParameterLine<'a> {
    pub name: &'a str,
    pub raw_type: Option<&'a str>,
    pub required: Option<bool>,
    pub location: Option<ParameterLocation>,
    pub description: &'a str,
}

pub struct Rule {
    pub name: &'static str,
    pub apply: for<'a> fn(&Line<'a>) -> Option<LineMatch<'a>>,
}

pub const RULES: &[Rule] = &[
    Rule {
        name: "blank",
        apply: blank,
    },
    Rule {
        name: "fence",
        apply: fence,
    },
    Rule {
        name: "table separator",
        apply: table_separator,
    },
    Rule {
        name: "table row",
        apply: table_row,
    },
    Rule {
        name: "endpoint",
        apply: endpoint,
    },
    Rule {
        name: "method label",
        apply: method_label,
    },
    Rule {
        name: "path label",
        apply: path_label,
    },
    Rule {
        name: "metadata",
        apply: metadata,
    },
    Rule {
        name: "section",
        apply: section,
    },
    Rule {
        name: "response",
        apply: response,
    },
    Rule {
        name: "parameter",
        apply: parameter,
    },
    Rule {
        name: "heading",
        apply: heading,
    },
];

/// Returns the first rule that recognizes `line`, and what it
/// recognized the line as.
pub fn recognize<'a>(line: &Line<'a>) -> (&'static str, LineMatch<'a>) {
    RULES
        .iter()
        .find_map(|rule| (rule.apply)(line).map(|matched| (rule.name, matched)))
        .unwrap_or(("text", LineMatch::Text(line.content)))
}

// MARK: Rules

fn blank<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    line.text.is_empty().then_some(LineMatch::Blank)
}

pub fn fence<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    (line.text.starts_with("```") || line.text.starts_with("~~~")).then_some(LineMatch::Fence)
}

fn table_separator<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    let cells = cells(line.text)?;
    cells
        .iter()
        .all(|cell| {
            let dashes = cell.trim_matches(':');
            !dashes.is_empty() && dashes.chars().all(|c| c == '-')
        })
        .then_some(LineMatch::TableSeparator)
}

fn table_row<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    cells(line.text).map(LineMatch::TableRow)
}

fn cells(text: &str) -> Option<Vec<&str>> {
    let inner = text.strip_prefix('|')?;
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Some(inner.split('|').map(str::trim).collect())
}

fn endpoint<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    let mut content = strip_emphasis(line.content);
    if let Some((label, value)) = label(content) {
        if is_one_of(
            label,
            &["endpoint", "api", "url", "request", "route", "接口", "请求", "接口地址"],
        ) {
            content = value;
        }
    }
    let mut input = content.trim_start_matches('`');
    let (method, path) = declaration.parse_next(&mut input).ok()?;
    // Verbs in running text are only declarations when they're shouted.
    if line.heading.is_none() && method != method.to_ascii_uppercase() {
        return None;
    }
    let path = match url_path(path) {
        Some(path) => path,
        None if path.starts_with('/') => path,
        None => return None,
    };
    let summary = input
        .trim_start_matches(['`', '*', '_'])
        .trim_start()
        .trim_start_matches(['-', ':', '–', '—', '|'])
        .trim();
    Some(LineMatch::Endpoint(EndpointLine {
        method,
        path,
        summary,
    }))
}

fn method_label<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    let (label, value) = label(line.content)?;
    if !is_one_of(
        label,
        &["method", "http method", "request method", "方法", "请求方式", "请求方法"],
    ) {
        return None;
    }
    let mut input = value.trim_matches('`');
    let method = method_token.parse_next(&mut input).ok()?;
    Some(LineMatch::MethodLabel(method))
}

fn path_label<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    let (label, value) = label(line.content)?;
    if !is_one_of(
        label,
        &[
            "path", "url", "uri", "endpoint", "route", "路径", "地址", "接口地址", "请求地址",
        ],
    ) {
        return None;
    }
    let token = value
        .trim_start_matches('`')
        .split(|c: char| c.is_whitespace() || c == '`')
        .next()?;
    match url_path(token) {
        Some(path) => Some(LineMatch::PathLabel(path)),
        None if token.starts_with('/') => Some(LineMatch::PathLabel(token)),
        None => None,
    }
}

fn metadata<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    const KEYS: &[(&str, MetadataKey)] = &[
        ("base url", MetadataKey::BaseUrl),
        ("baseurl", MetadataKey::BaseUrl),
        ("base path", MetadataKey::BaseUrl),
        ("host", MetadataKey::BaseUrl),
        ("server", MetadataKey::BaseUrl),
        ("基础地址", MetadataKey::BaseUrl),
        ("服务地址", MetadataKey::BaseUrl),
        ("version", MetadataKey::Version),
        ("api version", MetadataKey::Version),
        ("版本", MetadataKey::Version),
        ("content-type", MetadataKey::ContentType),
        ("content type", MetadataKey::ContentType),
        ("media type", MetadataKey::ContentType),
        ("description", MetadataKey::Description),
        ("summary", MetadataKey::Description),
        ("描述", MetadataKey::Description),
        ("说明", MetadataKey::Description),
    ];
    let (label, value) = label(line.content)?;
    if value.is_empty() {
        return None;
    }
    let label = UniCase::new(label);
    KEYS.iter()
        .find(|&&(key, _)| UniCase::new(key) == label)
        .map(|&(_, key)| {
            let value = value.trim_matches(['`', '<', '>']).trim();
            LineMatch::Metadata(key, value)
        })
}

fn section<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    const SECTIONS: &[(&str, Section)] = &[
        ("parameters", Section::Parameters(None)),
        ("params", Section::Parameters(None)),
        ("request parameters", Section::Parameters(None)),
        ("arguments", Section::Parameters(None)),
        ("request", Section::Parameters(None)),
        ("请求参数", Section::Parameters(None)),
        ("参数", Section::Parameters(None)),
        ("path parameters", Section::Parameters(Some(ParameterLocation::Path))),
        ("path params", Section::Parameters(Some(ParameterLocation::Path))),
        ("url parameters", Section::Parameters(Some(ParameterLocation::Path))),
        ("路径参数", Section::Parameters(Some(ParameterLocation::Path))),
        ("query parameters", Section::Parameters(Some(ParameterLocation::Query))),
        ("query params", Section::Parameters(Some(ParameterLocation::Query))),
        ("query string", Section::Parameters(Some(ParameterLocation::Query))),
        ("查询参数", Section::Parameters(Some(ParameterLocation::Query))),
        ("headers", Section::Parameters(Some(ParameterLocation::Header))),
        ("header parameters", Section::Parameters(Some(ParameterLocation::Header))),
        ("request headers", Section::Parameters(Some(ParameterLocation::Header))),
        ("请求头", Section::Parameters(Some(ParameterLocation::Header))),
        ("request body", Section::Parameters(Some(ParameterLocation::Body))),
        ("body", Section::Parameters(Some(ParameterLocation::Body))),
        ("body parameters", Section::Parameters(Some(ParameterLocation::Body))),
        ("form data", Section::Parameters(Some(ParameterLocation::Body))),
        ("payload", Section::Parameters(Some(ParameterLocation::Body))),
        ("请求体", Section::Parameters(Some(ParameterLocation::Body))),
        ("responses", Section::Responses),
        ("response", Section::Responses),
        ("response codes", Section::Responses),
        ("status codes", Section::Responses),
        ("response fields", Section::Responses),
        ("response body", Section::Responses),
        ("response parameters", Section::Responses),
        ("errors", Section::Responses),
        ("返回", Section::Responses),
        ("返回值", Section::Responses),
        ("返回参数", Section::Responses),
        ("响应", Section::Responses),
        ("响应参数", Section::Responses),
    ];
    let title = line
        .content
        .split_once(['(', '（'])
        .map_or(line.content, |(before, _)| before);
    let title = UniCase::new(title_text(title));
    SECTIONS
        .iter()
        .find(|&&(name, _)| UniCase::new(name) == title)
        .map(|&(_, section)| LineMatch::Section(section))
}

fn response<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    let content = line.content;
    let marked = content.starts_with(['`', '*', '_']);
    let mut input = content.trim_start_matches(['`', '*', '_']);
    let status = status_code.parse_next(&mut input).ok()?;
    let rest = input.trim_start_matches(['`', '*', '_']);
    let labelled = rest.trim_start().starts_with([':', '：']);
    if !(line.bullet || line.heading.is_some() || marked || labelled) {
        return None;
    }
    let description = rest
        .trim_start()
        .trim_start_matches([':', '：', '-', '–', '—'])
        .trim()
        .trim_matches(['*', '_'])
        .trim();
    Some(LineMatch::Response(ResponseLine {
        status,
        description,
    }))
}

fn parameter<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    if !line.bullet {
        return None;
    }
    let mut input = line.content;
    let (quoted, name) = alt::<_, _, winnow::error::ContextError, _>((
        delimited('`', take_till(1.., '`'), '`').map(|name| (true, name)),
        delimited("**", take_till(1.., '*'), "**").map(|name| (true, name)),
        take_while(1.., |c: char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '[' | ']'))
            .map(|name| (false, name)),
    ))
    .parse_next(&mut input)
    .ok()?;
    let name = name.trim().trim_matches('`');
    let attributes = opt::<_, _, winnow::error::ContextError, _>(delimited(
        (space0, alt(('(', '（'))),
        take_till(0.., [')', '）']),
        alt((')', '）')),
    ))
    .parse_next(&mut input)
    .ok()
    .flatten();
    if !quoted && attributes.is_none() {
        return None;
    }
    if !input.trim().is_empty() && !input.starts_with([' ', '\t', ':', '：', '-', '–', '—', ',']) {
        return None;
    }
    let description = input
        .trim_start()
        .trim_start_matches([':', '：', '-', '–', '—', ','])
        .trim();

    let mut line = ParameterLine {
        name,
        description,
        ..Default::default()
    };
    for attribute in attributes.into_iter().flat_map(|a| a.split([',', ';', '|', '，'])) {
        let attribute = attribute.trim().trim_matches('`');
        if attribute.is_empty() {
            continue;
        }
        if let Some(required) = required_flag(attribute) {
            line.required = Some(required);
        } else if let Some(location) = location(attribute) {
            line.location = Some(location);
        } else if line.raw_type.is_none() {
            line.raw_type = Some(attribute);
        }
    }
    if line.required.is_none() {
        line.required = required_hint(description);
    }
    Some(LineMatch::Parameter(line))
}

fn heading<'a>(line: &Line<'a>) -> Option<LineMatch<'a>> {
    let level = line.heading?;
    Some(LineMatch::Heading(level, strip_emphasis(line.content)))
}

// MARK: Grammars

fn declaration<'a>(input: &mut &'a str) -> winnow::Result<(&'a str, &'a str)> {
    alt((
        (method_token, space1, opt(('`', space0)), path_token).map(|(method, _, _, path)| (method, path)),
        (path_token, space1, method_token).map(|(path, _, method)| (method, path)),
    ))
    .parse_next(input)
}

fn method_token<'a>(input: &mut &'a str) -> winnow::Result<&'a str> {
    alt((delimited('[', alpha1, ']'), delimited('(', alpha1, ')'), alpha1))
        .verify(|method: &str| METHODS.iter().any(|known| known.eq_ignore_ascii_case(method)))
        .parse_next(input)
}

fn path_token<'a>(input: &mut &'a str) -> winnow::Result<&'a str> {
    take_till(1.., |c: char| c.is_whitespace() || c == '`')
        .verify(|path: &str| {
            path.starts_with('/') || path.starts_with("http://") || path.starts_with("https://")
        })
        .parse_next(input)
}

fn status_code<'a>(input: &mut &'a str) -> winnow::Result<&'a str> {
    digit1
        .verify(|code: &str| code.len() == 3 && code.starts_with(['1', '2', '3', '4', '5']))
        .parse_next(input)
}

// MARK: Helpers

/// Splits a `Label: value` line. Labels are short, and may be
/// wrapped in emphasis, like `**Method:** POST`.
pub fn label(content: &str) -> Option<(&str, &str)> {
    let (label, value) = content.split_once([':', '：'])?;
    let label = label.trim().trim_matches(['*', '_']).trim();
    if label.is_empty() || label.contains('`') || label.split_whitespace().count() > 4 {
        return None;
    }
    let value = value.trim_start_matches(['*', '_']).trim();
    Some((label, value))
}

/// Returns the path of an absolute URL, like the `/v1/orders`
/// in `https://api.example.com/v1/orders`.
fn url_path(token: &str) -> Option<&str> {
    let (_, rest) = token.split_once("://")?;
    let index = rest.find('/')?;
    Some(&rest[index..])
}

fn strip_emphasis(text: &str) -> &str {
    let mut text = text.trim();
    loop {
        let inner = ["**", "__", "*", "_"].iter().find_map(|marker| {
            text.strip_prefix(marker)
                .and_then(|rest| rest.strip_suffix(marker))
                .filter(|inner| !inner.is_empty())
        });
        match inner {
            Some(inner) => text = inner.trim(),
            None => return text,
        }
    }
}

/// Returns the text of a heading-like line, without emphasis
/// or a trailing colon.
fn title_text(content: &str) -> &str {
    let text = strip_emphasis(content.trim().trim_end_matches([':', '：']));
    text.trim_end_matches([':', '：']).trim()
}

fn is_one_of(text: &str, words: &[&str]) -> bool {
    let text = UniCase::new(text);
    words.iter().any(|&word| UniCase::new(word) == text)
}

/// Interprets a "required" cell or attribute.
pub fn required_flag(text: &str) -> Option<bool> {
    let text = strip_emphasis(text);
    if is_one_of(
        text,
        &["required", "yes", "y", "true", "mandatory", "✓", "✔", "x", "是", "必填", "必选", "必须"],
    ) {
        Some(true)
    } else if is_one_of(
        text,
        &["optional", "no", "n", "false", "-", "否", "可选", "非必填", "选填"],
    ) {
        Some(false)
    } else {
        None
    }
}

/// Guesses whether a parameter is required from its description.
pub fn required_hint(description: &str) -> Option<bool> {
    let lower = description.to_lowercase();
    if lower.contains("optional") || lower.contains("not required") || lower.contains("可选") {
        Some(false)
    } else if lower.contains("required") || lower.contains("必填") {
        Some(true)
    } else {
        None
    }
}

/// Interprets a location cell or attribute, like `query` or `in: path`.
pub fn location(text: &str) -> Option<ParameterLocation> {
    let text = text.trim();
    let text = text
        .strip_prefix("in:")
        .or_else(|| text.strip_prefix("in "))
        .unwrap_or(text);
    text.trim().parse().ok()
}
