use std::collections::HashSet;

use indexmap::IndexMap;

use crate::catalog::{
    Document, HttpVerb, Operation, ParamKind, ParamLocation, Parameter, PathItem,
};
use crate::parse::v3::{
    self, OpenApiSpec, ParameterLocation, ParameterOrRef, RequestBody, RequestBodyOrRef, Schema,
    SchemaOrRef, SchemaType,
};

use super::{dedup_names, operation_identity, trim_base_url};

pub(super) fn lower(spec: &OpenApiSpec) -> Document {
    let base_url = spec
        .servers
        .first()
        .map(|server| trim_base_url(&server.url))
        .unwrap_or_default();

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

fn lower_operation(
    spec: &OpenApiSpec,
    method: HttpVerb,
    path: &str,
    op: &v3::Operation,
    shared_params: &[ParameterOrRef],
) -> Operation {
    let (id, summary) =
        operation_identity(op.operation_id.as_deref(), op.summary.as_deref(), method, path);

    let mut parameters = Vec::new();
    for param in merged_parameters(spec, shared_params, &op.parameters) {
        let location = match param.location {
            ParameterLocation::Path => ParamLocation::Path,
            ParameterLocation::Query => ParamLocation::Query,
            ParameterLocation::Header => ParamLocation::Header,
            ParameterLocation::Cookie => {
                log::debug!("dropping cookie parameter {:?}: no dispatch location", param.name);
                continue;
            }
        };
        let schema = param.schema.as_ref().and_then(|s| resolve_schema(spec, s));
        parameters.push(Parameter {
            name: param.name.clone(),
            original_name: param.name.clone(),
            location,
            kind: schema.map(scalar_kind).unwrap_or_default(),
            example: param.example.clone().or_else(|| {
                schema.and_then(|s| s.example.clone().or_else(|| s.default_value.clone()))
            }),
        });
    }

    let mut body = Vec::new();
    if let Some(rb) = op
        .request_body
        .as_ref()
        .and_then(|b| resolve_request_body(spec, b))
    {
        flatten_body(spec, rb, &mut body);
    }
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
    spec: &OpenApiSpec,
    shared: &[ParameterOrRef],
    own: &[ParameterOrRef],
) -> Vec<v3::Parameter> {
    let mut merged: Vec<v3::Parameter> = shared
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

fn resolve_parameter(spec: &OpenApiSpec, param: &ParameterOrRef) -> Option<v3::Parameter> {
    match param {
        ParameterOrRef::Parameter(p) => Some(p.clone()),
        ParameterOrRef::Ref { ref_path } => {
            let resolved = ref_path
                .strip_prefix("#/components/parameters/")
                .and_then(|name| spec.components.as_ref()?.parameters.get(name))
                .and_then(|entry| match entry {
                    ParameterOrRef::Parameter(p) => Some(p),
                    ParameterOrRef::Ref { .. } => None,
                });
            if resolved.is_none() {
                log::warn!("skipping unresolved parameter reference {ref_path}");
            }
            resolved.cloned()
        }
    }
}

fn resolve_request_body<'a>(
    spec: &'a OpenApiSpec,
    body: &'a RequestBodyOrRef,
) -> Option<&'a RequestBody> {
    match body {
        RequestBodyOrRef::RequestBody(rb) => Some(rb),
        RequestBodyOrRef::Ref { ref_path } => ref_path
            .strip_prefix("#/components/requestBodies/")
            .and_then(|name| spec.components.as_ref()?.request_bodies.get(name))
            .and_then(|entry| match entry {
                RequestBodyOrRef::RequestBody(rb) => Some(rb),
                RequestBodyOrRef::Ref { .. } => None,
            }),
    }
}

/// Expand a JSON request body. An object schema with named properties
/// flattens into one parameter per property; an unresolvable or
/// non-object schema becomes one opaque JSON-string parameter named
/// `body`. A body without `application/json` content contributes no
/// parameters at all.
fn flatten_body(spec: &OpenApiSpec, body: &RequestBody, out: &mut Vec<Parameter>) {
    let Some(media) = body.content.get("application/json") else {
        return;
    };

    if let Some(schema) = media.schema.as_ref().and_then(|s| resolve_schema(spec, s)) {
        if schema.schema_type == Some(SchemaType::Object) && !schema.properties.is_empty() {
            for (prop_name, prop) in &schema.properties {
                let resolved = resolve_schema(spec, prop);
                out.push(Parameter {
                    name: prop_name.clone(),
                    original_name: prop_name.clone(),
                    location: ParamLocation::BodyField,
                    kind: resolved.map(scalar_kind).unwrap_or_default(),
                    example: resolved
                        .and_then(|s| s.example.clone().or_else(|| s.default_value.clone())),
                });
            }
            return;
        }
    }

    out.push(Parameter {
        name: "body".to_string(),
        original_name: "body".to_string(),
        location: ParamLocation::BodyRaw,
        kind: ParamKind::String,
        example: None,
    });
}

/// Scalar kind for a schema; `string` with `format: binary` is a file
/// upload.
fn scalar_kind(schema: &Schema) -> ParamKind {
    match schema.schema_type {
        Some(SchemaType::Integer) => ParamKind::Integer,
        Some(SchemaType::Number) => ParamKind::Number,
        Some(SchemaType::Boolean) => ParamKind::Boolean,
        Some(SchemaType::String) if schema.format.as_deref() == Some("binary") => ParamKind::File,
        _ => ParamKind::String,
    }
}

/// Follow `#/components/schemas/...` references to the underlying
/// schema, bailing out on cycles.
fn resolve_schema<'a>(spec: &'a OpenApiSpec, schema: &'a SchemaOrRef) -> Option<&'a Schema> {
    let mut current = schema;
    let mut visited = HashSet::new();
    loop {
        match current {
            SchemaOrRef::Schema(s) => return Some(s.as_ref()),
            SchemaOrRef::Ref { ref_path } => {
                if !visited.insert(ref_path.as_str()) {
                    return None;
                }
                let name = ref_path.strip_prefix("#/components/schemas/")?;
                current = spec.components.as_ref()?.schemas.get(name)?;
            }
        }
    }
}
