use indexmap::IndexMap;
use serde::Deserialize;

use crate::catalog::HttpVerb;

/// Top-level OpenAPI 3.x document, reduced to the fields the normalizer
/// reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenApiSpec {
    pub openapi: String,

    pub info: Info,

    #[serde(default)]
    pub servers: Vec<Server>,

    pub paths: IndexMap<String, PathItem>,

    pub components: Option<Components>,
}

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

/// A server entry; only the URL participates in base URL resolution.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Server {
    pub url: String,
    pub description: Option<String>,
}

/// Operations declared under one route, keyed by HTTP verb.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PathItem {
    /// Parameters shared by every operation of this route.
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,

    pub get: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
    pub delete: Option<Operation>,
}

impl PathItem {
    pub fn operation(&self, verb: HttpVerb) -> Option<&Operation> {
        match verb {
            HttpVerb::Get => self.get.as_ref(),
            HttpVerb::Post => self.post.as_ref(),
            HttpVerb::Put => self.put.as_ref(),
            HttpVerb::Delete => self.delete.as_ref(),
        }
    }
}

/// An API operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,

    pub summary: Option<String>,

    pub description: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,

    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBodyOrRef>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

/// An API parameter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default)]
    pub required: bool,

    pub schema: Option<SchemaOrRef>,

    pub example: Option<serde_json::Value>,
}

/// A reference or inline parameter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Parameter(Parameter),
}

/// A request body definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestBody {
    pub content: IndexMap<String, MediaType>,

    #[serde(default)]
    pub required: bool,
}

/// A reference or inline request body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequestBodyOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    RequestBody(RequestBody),
}

/// One media type entry under a request body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaType {
    pub schema: Option<SchemaOrRef>,
}

/// A JSON Schema type keyword value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

/// A reference or inline schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Schema(Box<Schema>),
}

/// A schema object, reduced to scalar typing, object properties, and
/// example values.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    pub format: Option<String>,

    #[serde(default)]
    pub properties: IndexMap<String, SchemaOrRef>,

    #[serde(rename = "default")]
    pub default_value: Option<serde_json::Value>,

    pub example: Option<serde_json::Value>,
}

/// Reusable component definitions.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: IndexMap<String, SchemaOrRef>,

    #[serde(default)]
    pub parameters: IndexMap<String, ParameterOrRef>,

    #[serde(rename = "requestBodies", default)]
    pub request_bodies: IndexMap<String, RequestBodyOrRef>,
}
