use indexmap::IndexMap;
use serde::Deserialize;

use crate::catalog::HttpVerb;

/// Top-level Swagger 2.0 document, reduced to the fields the normalizer
/// reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SwaggerSpec {
    pub swagger: String,

    pub info: Info,

    #[serde(default)]
    pub schemes: Vec<String>,

    pub host: Option<String>,

    #[serde(rename = "basePath")]
    pub base_path: Option<String>,

    pub paths: IndexMap<String, PathItem>,

    #[serde(default)]
    pub definitions: IndexMap<String, Schema>,

    /// Reusable parameters, targets of `#/parameters/...` references.
    #[serde(default)]
    pub parameters: IndexMap<String, Parameter>,
}

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
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
}

/// Parameter location. Swagger 2 models form fields and the request body
/// as parameter locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    FormData,
    Body,
}

/// An API parameter. Non-body parameters declare a scalar `type`; body
/// parameters carry a `schema` instead.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(default)]
    pub required: bool,

    #[serde(rename = "type")]
    pub param_type: Option<String>,

    pub schema: Option<SchemaOrRef>,

    #[serde(rename = "default")]
    pub default_value: Option<serde_json::Value>,
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

/// A schema object (Swagger 2 definitions dialect), reduced to scalar
/// typing, object properties, and example values.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Option<String>,

    pub format: Option<String>,

    #[serde(default)]
    pub properties: IndexMap<String, SchemaOrRef>,

    #[serde(rename = "default")]
    pub default_value: Option<serde_json::Value>,

    pub example: Option<serde_json::Value>,
}
