use indexmap::IndexMap;

use crate::catalog::{
    Document, HttpVerb, Operation, ParamKind, ParamLocation, Parameter, PathItem,
};
use crate::parse::v2::{
    self, ParameterLocation, ParameterOrRef, Schema, SchemaOrRef, SwaggerSpec,
};

use super::{dedup_names, operation_identity, trim_base_url};

pub(super) fn lower(spec: &SwaggerSpec) -> Document {
    let base_url = resolve_base_url(spec);

    let mut paths = IndexMap::new();
    for (path, item) in &spec.paths {
        let mut path_item = PathItem::default();
        for verb in HttpVerb::ALL {
            if let Some(op) = item.operation(verb) {
                path_item
                    .operations
                    .push(lower_operation(spec, verb, path, op, &item.parameters));
            }
        }
        paths.insert(path.clone(), path_item);
    }

    Document { base_url, paths }
}

/// `scheme://host` + `basePath`, with the scheme defaulting to `http`
/// when the document lists none. Without a host the base path stands
/// alone and the host config supplies the authority at call time.
fn resolve_base_url(spec: &SwaggerSpec) -> String {
    let scheme = spec.schemes.first().map(String::as_str).unwrap_or("http");
    let base_path = spec.base_path.as_deref().unwrap_or("");
    match spec.host.as_deref() {
        Some(host) => trim_base_url(&format!("{scheme}://{host}{base_path}")),
        None => trim_base_url(base_path),
    }
}

fn lower_operation(
    spec: &SwaggerSpec,
    method: HttpVerb,
    path: &str,
    op: &v2::Operation,
    shared_params: &[ParameterOrRef],
) -> Operation {
    let (id, summary) =
        operation_identity(op.operation_id.as_deref(), op.summary.as_deref(), method, path);

    let mut parameters = Vec::new();
    let mut body = Vec::new();
    for param in merged_parameters(spec, shared_params, &op.parameters) {
        match param.location {
            ParameterLocation::Body => flatten_body(spec, &param, &mut body),
            ParameterLocation::FormData => {
                parameters.push(scalar_parameter(&param, ParamLocation::FormField));
            }
            ParameterLocation::Path => {
                parameters.push(scalar_parameter(&param, ParamLocation::Path));
            }
            ParameterLocation::Query => {
                parameters.push(scalar_parameter(&param, ParamLocation::Query));
            }
            ParameterLocation::Header => {
                parameters.push(scalar_parameter(&param, ParamLocation::Header));
            }
        }
    }
    // Body-derived parameters always follow the declared ones, keeping
    // the positional signature independent of where the body parameter
    // sat in the declaration.
    parameters.append(&mut body);
    dedup_names(&mut parameters);

    Operation {
        id,
        summary,
        method,
        path: path.to_string(),
        parameters,
    }
}

/// Path-level parameters apply to every operation of the route; an
/// operation-level parameter with the same name and location replaces
/// the shared one in place.
fn merged_parameters(
    spec: &SwaggerSpec,
    shared: &[ParameterOrRef],
    own: &[ParameterOrRef],
) -> Vec<v2::Parameter> {
    let mut merged: Vec<v2::Parameter> = shared
        .iter()
        .filter_map(|p| resolve_parameter(spec, p))
        .collect();
    for param in own.iter().filter_map(|p| resolve_parameter(spec, p)) {
        match merged
            .iter_mut()
            .find(|m| m.name == param.name && m.location == param.location)
        {
            Some(slot) => *slot = param,
            None => merged.push(param),
        }
    }
    merged
}

fn resolve_parameter(spec: &SwaggerSpec, param: &ParameterOrRef) -> Option<v2::Parameter> {
    match param {
        ParameterOrRef::Parameter(p) => Some(p.clone()),
        ParameterOrRef::Ref { ref_path } => {
            let resolved = ref_path
                .strip_prefix("#/parameters/")
                .and_then(|name| spec.parameters.get(name));
            if resolved.is_none() {
                log::warn!("skipping unresolved parameter reference {ref_path}");
            }
            resolved.cloned()
        }
    }
}

fn scalar_parameter(param: &v2::Parameter, location: ParamLocation) -> Parameter {
    Parameter {
        name: param.name.clone(),
        original_name: param.name.clone(),
        location,
        kind: param
            .param_type
            .as_deref()
            .map(ParamKind::from_type_str)
            .unwrap_or_default(),
        example: param.default_value.clone(),
    }
}

/// Expand a `body` parameter. An object schema with named properties
/// flattens into one parameter per property; anything else (no schema,
/// dangling reference, non-object type) becomes one opaque JSON-string
/// parameter carrying the whole body.
fn flatten_body(spec: &SwaggerSpec, param: &v2::Parameter, out: &mut Vec<Parameter>) {
    if let Some(schema) = param.schema.as_ref().and_then(|s| resolve_schema(spec, s)) {
        if schema.schema_type.as_deref() == Some("object") && !schema.properties.is_empty() {
            for (prop_name, prop) in &schema.properties {
                let resolved = resolve_schema(spec, prop);
                out.push(Parameter {
                    name: prop_name.clone(),
                    original_name: prop_name.clone(),
                    location: ParamLocation::BodyField,
                    kind: resolved
                        .and_then(|s| s.schema_type.as_deref())
                        .map(ParamKind::from_type_str)
                        .unwrap_or_default(),
                    example: resolved
                        .and_then(|s| s.example.clone().or_else(|| s.default_value.clone())),
                });
            }
            return;
        }
    }

    out.push(Parameter {
        name: param.name.clone(),
        original_name: param.name.clone(),
        location: ParamLocation::BodyRaw,
        kind: ParamKind::String,
        example: None,
    });
}

fn resolve_schema<'a>(spec: &'a SwaggerSpec, schema: &'a SchemaOrRef) -> Option<&'a Schema> {
    match schema {
        SchemaOrRef::Schema(s) => Some(s.as_ref()),
        SchemaOrRef::Ref { ref_path } => ref_path
            .strip_prefix("#/definitions/")
            .and_then(|name| spec.definitions.get(name)),
    }
}
