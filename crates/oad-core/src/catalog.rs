use indexmap::IndexMap;

/// HTTP verb an operation is declared under. Verbs outside this set are
/// ignored at normalize time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    /// Fixed iteration order for the operations of one path item.
    pub const ALL: [HttpVerb; 4] = [
        HttpVerb::Get,
        HttpVerb::Post,
        HttpVerb::Put,
        HttpVerb::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an argument value lands in the HTTP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    /// One field of a form-url-encoded body.
    FormField,
    /// One flattened property of an object-typed JSON body.
    BodyField,
    /// The whole JSON body, supplied as a single JSON-encoded string.
    BodyRaw,
}

impl ParamLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::FormField => "formField",
            ParamLocation::BodyField => "jsonBody",
            ParamLocation::BodyRaw => "jsonBody",
        }
    }
}

/// Scalar kind advertised to the host for one parameter. Selects which
/// typed input the registry exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamKind {
    Integer,
    Number,
    Boolean,
    #[default]
    String,
    File,
}

impl ParamKind {
    /// Map a declared scalar type name to a kind. Unknown or missing
    /// types fall back to `String`.
    pub fn from_type_str(name: &str) -> Self {
        match name {
            "integer" | "int" | "int32" | "int64" => ParamKind::Integer,
            "number" | "float" | "double" => ParamKind::Number,
            "boolean" | "bool" => ParamKind::Boolean,
            "file" => ParamKind::File,
            _ => ParamKind::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::String => "string",
            ParamKind::File => "file",
        }
    }
}

/// One resolved parameter of an operation.
///
/// `name` is the binding name, unique within the operation after
/// de-duplication. `original_name` is the wire name: the placeholder,
/// query key, header, form field, or JSON property exactly as the
/// document declares it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub original_name: String,
    pub location: ParamLocation,
    pub kind: ParamKind,
    /// Declared example or default, seeding the signature default.
    pub example: Option<serde_json::Value>,
}

/// One (path, verb) pair with its ordered parameter list.
///
/// Parameter order is fixed here and becomes the positional signature
/// contract: the dispatcher receives argument values aligned 1:1 with
/// `parameters`.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Action identifier, unique within the document.
    pub id: String,
    /// Display summary; the URL template stands in when the document
    /// declares none.
    pub summary: String,
    pub method: HttpVerb,
    /// URL template, e.g. `/widgets/{id}`.
    pub path: String,
    pub parameters: Vec<Parameter>,
}

/// Operations declared under one URL template, at most one per verb, in
/// [`HttpVerb::ALL`] order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathItem {
    pub operations: Vec<Operation>,
}

/// A normalized document: resolved base URL plus path items in
/// declaration order. The base URL never ends in `/`, so joining it with
/// a path template never doubles the slash.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub base_url: String,
    pub paths: IndexMap<String, PathItem>,
}

impl Document {
    /// All operations in document order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.paths.values().flat_map(|item| item.operations.iter())
    }

    /// Look an operation up by its action identifier.
    pub fn find_operation(&self, id: &str) -> Option<&Operation> {
        self.operations().find(|op| op.id == id)
    }

    pub fn operation_count(&self) -> usize {
        self.paths.values().map(|item| item.operations.len()).sum()
    }
}
