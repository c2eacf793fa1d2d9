//! The Markdown document parser.
//!
//! Scans the document line by line. Each line is recognized by the
//! first matching rule in [`rules::RULES`], and the scanner folds the
//! recognized lines into endpoint drafts: parameter tables and lists
//! attach to the nearest preceding endpoint declaration, and response
//! blocks attach by status code.

use log::{debug, trace};
use miette::SourceSpan;
use unicase::UniCase;

use crate::model::ParameterLocation;

use super::{
    EndpointDraft, IntermediateModel, Literal, Origin, ParameterDraft, ParseWarningKind,
    ResponseDraft, hint,
};

pub mod rules;

use self::rules::{
    EndpointLine, Line, LineMatch, MetadataKey, ParameterLine, ResponseLine, Section,
};

/// Parses a Markdown document. Never fails; anything that can't be
/// recognized is skipped with a warning.
pub fn parse(text: &str) -> IntermediateModel {
    let mut scanner = Scanner::default();
    let mut offset = 0;
    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let content = raw.trim_end_matches(['\n', '\r']);
        let origin = Origin::new(index + 1, SourceSpan::from((offset, content.len())));
        offset += raw.len();
        scanner.line(content, origin);
    }
    scanner.finish()
}

#[derive(Default)]
struct Scanner {
    model: IntermediateModel,
    endpoint: Option<OpenEndpoint>,
    section: Option<Section>,
    table: Option<Table>,
    pending: Option<Pending>,
    /// Where the open code fence started.
    fence: Option<Origin>,
    /// The last heading that didn't declare anything; it describes
    /// the next endpoint if that endpoint has no summary.
    heading: Option<String>,
    prose: Prose,
}

struct OpenEndpoint {
    draft: EndpointDraft,
    /// The level of the heading that declared this endpoint.
    level: Option<usize>,
    /// A `Content-Type` that applies to all responses.
    content_type: Option<String>,
}

/// A method or path label that's waiting for its counterpart.
enum Pending {
    Method(String, Origin),
    Path(String, Origin),
}

impl Pending {
    fn warn(&self) -> super::ParseWarning {
        match self {
            Self::Method(_, origin) => {
                origin.warn(ParseWarningKind::IncompleteEndpoint("a method", "path"))
            }
            Self::Path(_, origin) => {
                origin.warn(ParseWarningKind::IncompleteEndpoint("a path", "method"))
            }
        }
    }
}

/// Where free text goes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Prose {
    /// The document's description.
    #[default]
    Document,
    /// The open endpoint's description. `started` is set once the
    /// first line of text replaces the summary.
    Endpoint { started: bool },
    /// Nowhere.
    Closed,
}

struct Table {
    kind: TableKind,
    columns: Columns,
    location: Option<ParameterLocation>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TableKind {
    Parameters,
    Responses,
    Skipped,
}

impl Scanner {
    fn line(&mut self, text: &str, origin: Origin) {
        let line = Line::new(text);
        if self.fence.is_some() {
            if rules::fence(&line).is_some() {
                self.fence = None;
            }
            return;
        }

        let (rule, matched) = rules::recognize(&line);
        trace!("line {}: {rule}", origin.line.unwrap_or_default());

        if !matches!(matched, LineMatch::TableRow(_) | LineMatch::TableSeparator) {
            self.table = None;
        }
        if !matches!(
            matched,
            LineMatch::Blank | LineMatch::MethodLabel(_) | LineMatch::PathLabel(_)
        ) {
            if let Some(pending) = self.pending.take() {
                self.model.warnings.push(pending.warn());
            }
        }

        match matched {
            LineMatch::Blank => self.blank(),
            LineMatch::Fence => self.fence = Some(origin),
            LineMatch::TableSeparator => {}
            LineMatch::TableRow(cells) => self.table_row(&cells, origin),
            LineMatch::Endpoint(EndpointLine {
                method,
                path,
                summary,
            }) => {
                let description = match summary {
                    "" => self.heading.take().unwrap_or_default(),
                    summary => summary.to_owned(),
                };
                self.open(method, path, description, line.heading, origin);
            }
            LineMatch::MethodLabel(method) => self.method_label(method, origin),
            LineMatch::PathLabel(path) => self.path_label(path, origin),
            LineMatch::Metadata(key, value) => self.metadata(key, value),
            LineMatch::Section(section) => {
                self.section = Some(section);
                self.prose = Prose::Closed;
            }
            LineMatch::Response(response) => {
                if line.heading.is_some() {
                    self.section = Some(Section::Responses);
                }
                self.response(response, origin);
            }
            LineMatch::Parameter(param) => self.parameter_item(param, origin),
            LineMatch::Heading(level, text) => self.heading(level, text),
            LineMatch::Text(text) => self.text(text),
        }
    }

    fn finish(mut self) -> IntermediateModel {
        if let Some(pending) = self.pending.take() {
            self.model.warnings.push(pending.warn());
        }
        if let Some(origin) = self.fence.take() {
            self.model
                .warnings
                .push(origin.warn(ParseWarningKind::UnterminatedFence));
        }
        self.close();
        debug!(
            "found {} endpoints with {} warnings",
            self.model.endpoints.len(),
            self.model.warnings.len()
        );
        self.model
    }

    // MARK: Endpoints

    fn open(
        &mut self,
        method: &str,
        path: &str,
        description: String,
        level: Option<usize>,
        origin: Origin,
    ) {
        self.close();
        trace!("opened {method} {path}");
        self.endpoint = Some(OpenEndpoint {
            draft: EndpointDraft {
                method: method.to_owned(),
                path: path.to_owned(),
                description,
                params: vec![],
                responses: vec![],
                origin,
            },
            level,
            content_type: None,
        });
        self.section = None;
        self.prose = Prose::Endpoint { started: false };
    }

    fn close(&mut self) {
        let Some(OpenEndpoint {
            mut draft,
            content_type,
            ..
        }) = self.endpoint.take()
        else {
            return;
        };
        if let Some(content_type) = content_type {
            for response in &mut draft.responses {
                response
                    .content_type
                    .get_or_insert_with(|| content_type.clone());
            }
        }
        debug!(
            "found {} {} with {} parameters and {} responses",
            draft.method,
            draft.path,
            draft.params.len(),
            draft.responses.len()
        );
        self.model.endpoints.push(draft);
        self.section = None;
        self.prose = Prose::Closed;
    }

    fn method_label(&mut self, method: &str, origin: Origin) {
        match self.pending.take() {
            Some(Pending::Path(path, path_origin)) => {
                let description = self.heading.take().unwrap_or_default();
                self.open(method, &path, description, None, path_origin);
            }
            previous => {
                if let Some(previous) = previous {
                    self.model.warnings.push(previous.warn());
                }
                self.pending = Some(Pending::Method(method.to_owned(), origin));
            }
        }
    }

    fn path_label(&mut self, path: &str, origin: Origin) {
        match self.pending.take() {
            Some(Pending::Method(method, method_origin)) => {
                let description = self.heading.take().unwrap_or_default();
                self.open(&method, path, description, None, method_origin);
            }
            previous => {
                if let Some(previous) = previous {
                    self.model.warnings.push(previous.warn());
                }
                self.pending = Some(Pending::Path(path.to_owned(), origin));
            }
        }
    }

    fn heading(&mut self, level: usize, text: &str) {
        if let Some(endpoint) = &self.endpoint {
            // Headings at or above the declaring heading's level end the
            // endpoint; deeper ones are sections we don't know.
            if level > endpoint.level.unwrap_or(2) {
                self.section = None;
                self.prose = Prose::Closed;
                return;
            }
            self.close();
        }
        if level == 1 && self.model.title.is_none() && self.model.endpoints.is_empty() {
            self.model.title = Some(text.to_owned());
            self.prose = Prose::Document;
        } else {
            self.heading = Some(text.to_owned());
            self.section = None;
        }
    }

    // MARK: Prose

    fn blank(&mut self) {
        match self.prose {
            Prose::Document if self.model.description.is_some() => self.prose = Prose::Closed,
            Prose::Endpoint { started: true } => self.prose = Prose::Closed,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        match self.prose {
            Prose::Document => append(self.model.description.get_or_insert_default(), text),
            Prose::Endpoint { started } => {
                let Some(endpoint) = &mut self.endpoint else {
                    return;
                };
                if started {
                    append(&mut endpoint.draft.description, text);
                } else {
                    endpoint.draft.description = text.to_owned();
                    self.prose = Prose::Endpoint { started: true };
                }
            }
            Prose::Closed => {}
        }
    }

    fn metadata(&mut self, key: MetadataKey, value: &str) {
        match key {
            MetadataKey::BaseUrl => {
                self.model.base_url.get_or_insert_with(|| value.to_owned());
            }
            MetadataKey::Version => {
                self.model.version.get_or_insert_with(|| value.to_owned());
            }
            MetadataKey::ContentType => {
                let Some(endpoint) = &mut self.endpoint else {
                    return;
                };
                let last = endpoint
                    .draft
                    .responses
                    .last_mut()
                    .filter(|_| self.section == Some(Section::Responses));
                match last {
                    Some(response) => response.content_type = Some(value.to_owned()),
                    None => endpoint.content_type = Some(value.to_owned()),
                }
            }
            MetadataKey::Description => match &mut self.endpoint {
                Some(endpoint) => {
                    endpoint.draft.description = value.to_owned();
                    self.prose = Prose::Endpoint { started: true };
                }
                None => self.model.description = Some(value.to_owned()),
            },
        }
    }

    // MARK: Parameters

    fn parameter_item(&mut self, line: ParameterLine<'_>, origin: Origin) {
        let location = match self.section {
            Some(Section::Parameters(location)) => location,
            // Outside of a parameter section, only typed items count.
            None if line.raw_type.is_some() => None,
            _ => return,
        };
        let Some(endpoint) = &mut self.endpoint else {
            self.model
                .warnings
                .push(origin.warn(ParseWarningKind::OrphanedBlock("a parameter")));
            return;
        };
        let mut draft = ParameterDraft {
            name: line.name.to_owned(),
            location: line.location.or(location),
            raw_type: line.raw_type.map(str::to_owned),
            required: line.required,
            description: line.description.to_owned(),
            origin,
            ..Default::default()
        };
        hint::apply(&mut draft, line.raw_type);
        endpoint.draft.params.push(draft);
    }

    fn table_row(&mut self, cells: &[&str], origin: Origin) {
        let Some(table) = &self.table else {
            self.table = Some(self.table_header(cells, origin));
            return;
        };
        let Some(endpoint) = &mut self.endpoint else {
            return;
        };
        match table.kind {
            TableKind::Parameters => {
                if let Some(param) = table.parameter(cells, origin, &mut self.model.warnings) {
                    endpoint.draft.params.push(param);
                }
            }
            TableKind::Responses => {
                if let Some(response) = table.response(cells, origin, &mut self.model.warnings) {
                    endpoint.draft.responses.push(response);
                }
            }
            TableKind::Skipped => {}
        }
    }

    fn table_header(&mut self, cells: &[&str], origin: Origin) -> Table {
        let columns = Columns::from_header(cells);
        let location = match self.section {
            Some(Section::Parameters(location)) => location,
            _ => None,
        };
        let skipped = Table {
            kind: TableKind::Skipped,
            columns: Columns::default(),
            location,
        };
        if self.endpoint.is_none() {
            self.model
                .warnings
                .push(origin.warn(ParseWarningKind::OrphanedBlock("a table")));
            return skipped;
        }
        self.prose = Prose::Closed;

        let warnings = &mut self.model.warnings;
        let (kind, columns) = match self.section {
            // Field tables in response sections describe response bodies.
            Some(Section::Responses) if columns.status.is_none() => {
                if columns.name.is_none() {
                    warnings.push(origin.warn(ParseWarningKind::UnrecognizedTable));
                }
                return skipped;
            }
            Some(Section::Responses) => (TableKind::Responses, columns),
            _ if columns.name.is_some() => {
                if columns.type_.is_none() {
                    warnings.push(origin.warn(ParseWarningKind::MissingTypeColumn));
                }
                (TableKind::Parameters, columns)
            }
            _ if columns.status.is_some() => (TableKind::Responses, columns),
            Some(Section::Parameters(_)) => {
                warnings.push(origin.warn(ParseWarningKind::UnrecognizedTableHeader));
                (TableKind::Parameters, Columns::positional())
            }
            None => {
                warnings.push(origin.warn(ParseWarningKind::UnrecognizedTable));
                return skipped;
            }
        };
        Table {
            kind,
            columns,
            location,
        }
    }

    // MARK: Responses

    fn response(&mut self, line: ResponseLine<'_>, origin: Origin) {
        let Some(endpoint) = &mut self.endpoint else {
            self.model
                .warnings
                .push(origin.warn(ParseWarningKind::OrphanedBlock("a response")));
            return;
        };
        endpoint.draft.responses.push(ResponseDraft {
            status: line.status.to_owned(),
            description: line.description.to_owned(),
            content_type: None,
            origin,
        });
        self.prose = Prose::Closed;
    }
}

impl Table {
    fn parameter(
        &self,
        cells: &[&str],
        origin: Origin,
        warnings: &mut Vec<super::ParseWarning>,
    ) -> Option<ParameterDraft> {
        let columns = &self.columns;
        let name_index = columns.name?;
        if cells.len() <= name_index {
            warnings.push(origin.warn(ParseWarningKind::MalformedRow(cells.join(" | "))));
            return None;
        }
        let cell = |index: Option<usize>| {
            index
                .and_then(|index| cells.get(index))
                .map(|cell| clean_cell(cell))
                .filter(|cell| !cell.is_empty())
        };
        let raw_type = cell(columns.type_);
        let description = cell(columns.description).unwrap_or_default();
        let mut draft = ParameterDraft {
            name: cell(Some(name_index)).unwrap_or_default().to_owned(),
            location: cell(columns.location)
                .and_then(rules::location)
                .or(self.location),
            raw_type: raw_type.map(str::to_owned),
            required: cell(columns.required)
                .and_then(rules::required_flag)
                .or_else(|| rules::required_hint(description)),
            description: description.to_owned(),
            example: cell(columns.example).map(|text| Literal::Text(text.to_owned())),
            default: cell(columns.default).map(|text| Literal::Text(text.to_owned())),
            allowed: cell(columns.allowed)
                .map(hint::value_list)
                .unwrap_or_default()
                .into_iter()
                .map(Literal::Text)
                .collect(),
            bounds: cell(columns.range).and_then(hint::bounds),
            origin,
        };
        hint::apply(&mut draft, raw_type);
        Some(draft)
    }

    fn response(
        &self,
        cells: &[&str],
        origin: Origin,
        warnings: &mut Vec<super::ParseWarning>,
    ) -> Option<ResponseDraft> {
        let columns = &self.columns;
        let status_index = columns.status?;
        let Some(status) = cells.get(status_index) else {
            warnings.push(origin.warn(ParseWarningKind::MalformedRow(cells.join(" | "))));
            return None;
        };
        let cell = |index: Option<usize>| {
            index
                .and_then(|index| cells.get(index))
                .map(|cell| clean_cell(cell))
                .filter(|cell| !cell.is_empty())
        };
        Some(ResponseDraft {
            status: clean_cell(status)
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_owned(),
            description: cell(columns.description).unwrap_or_default().to_owned(),
            content_type: cell(columns.content_type).map(str::to_owned),
            origin,
        })
    }
}

fn clean_cell(cell: &str) -> &str {
    let cell = cell.trim();
    let cell = cell
        .strip_prefix("**")
        .and_then(|cell| cell.strip_suffix("**"))
        .unwrap_or(cell);
    cell.trim().trim_matches('`').trim()
}

fn append(description: &mut String, text: &str) {
    if !description.is_empty() {
        description.push(' ');
    }
    description.push_str(text.trim());
}

/// Column positions in a table, found by matching header labels.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
struct Columns {
    name: Option<usize>,
    type_: Option<usize>,
    required: Option<usize>,
    description: Option<usize>,
    location: Option<usize>,
    example: Option<usize>,
    default: Option<usize>,
    allowed: Option<usize>,
    range: Option<usize>,
    status: Option<usize>,
    content_type: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[&str]) -> Self {
        let mut columns = Self::default();
        for (index, cell) in cells.iter().enumerate() {
            let label = UniCase::new(clean_cell(cell));
            let Some(slot) = HEADERS
                .iter()
                .find(|(labels, _)| labels.iter().any(|&l| UniCase::new(l) == label))
                .map(|&(_, slot)| slot)
            else {
                continue;
            };
            let column = match slot {
                Column::Name => &mut columns.name,
                Column::Type => &mut columns.type_,
                Column::Required => &mut columns.required,
                Column::Description => &mut columns.description,
                Column::Location => &mut columns.location,
                Column::Example => &mut columns.example,
                Column::Default => &mut columns.default,
                Column::Allowed => &mut columns.allowed,
                Column::Range => &mut columns.range,
                Column::Status => &mut columns.status,
                Column::ContentType => &mut columns.content_type,
            };
            column.get_or_insert(index);
        }
        columns
    }

    /// The conventional `name | type | required | description` layout.
    fn positional() -> Self {
        Self {
            name: Some(0),
            type_: Some(1),
            required: Some(2),
            description: Some(3),
            ..Default::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Column {
    Name,
    Type,
    Required,
    Description,
    Location,
    Example,
    Default,
    Allowed,
    Range,
    Status,
    ContentType,
}

const HEADERS: &[(&[&str], Column)] = &[
    (
        &[
            "name", "parameter", "parameter name", "param", "field", "key", "参数", "参数名",
            "字段", "名称",
        ],
        Column::Name,
    ),
    (&["type", "data type", "类型", "数据类型"], Column::Type),
    (
        &["required", "mandatory", "必填", "是否必填", "必选", "是否必须"],
        Column::Required,
    ),
    (
        &["description", "desc", "details", "notes", "说明", "描述", "备注"],
        Column::Description,
    ),
    (&["in", "location", "position", "位置", "参数位置"], Column::Location),
    (&["example", "sample", "示例", "例子", "示例值"], Column::Example),
    (&["default", "default value", "默认值"], Column::Default),
    (
        &["allowed values", "enum", "values", "options", "可选值"],
        Column::Allowed,
    ),
    (
        &["range", "constraints", "limits", "范围", "取值范围"],
        Column::Range,
    ),
    (
        &["status", "status code", "code", "http status", "http code", "状态码"],
        Column::Status,
    ),
    (&["content type", "content-type", "media type"], Column::ContentType),
];
