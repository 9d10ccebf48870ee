use indexmap::IndexMap;
use serde_json::Value;

use oad_core::catalog::{HttpVerb, Operation, ParamLocation};

use crate::error::DispatchError;

/// Body selected for one request. At most one variant carries data; form
/// fields win over any JSON body.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedBody {
    None,
    Json(Value),
    Form(String),
}

/// A fully bound request, ready for the HTTP client.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    pub method: HttpVerb,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: PlannedBody,
}

/// Bind positional argument values to an operation's parameters and
/// build the request.
///
/// `values` aligns 1:1 with `operation.parameters`; a length mismatch
/// fails before anything is bound. Internally each value is bound by its
/// unique parameter name, while wire keys (placeholders, query keys,
/// headers, form fields, JSON properties) use the declared
/// `original_name`.
pub fn plan_request(
    operation: &Operation,
    base_url: &str,
    values: &[Value],
) -> Result<RequestPlan, DispatchError> {
    if values.len() != operation.parameters.len() {
        return Err(DispatchError::ArityMismatch {
            operation: operation.id.clone(),
            expected: operation.parameters.len(),
            got: values.len(),
        });
    }

    let bindings: IndexMap<&str, &Value> = operation
        .parameters
        .iter()
        .map(|p| p.name.as_str())
        .zip(values)
        .collect();

    let mut path = operation.path.clone();
    let mut query = String::new();
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut form = String::new();
    let mut fields: Option<serde_json::Map<String, Value>> = None;
    let mut raw_body: Option<Value> = None;

    for param in &operation.parameters {
        let Some(&value) = bindings.get(param.name.as_str()) else {
            continue;
        };
        match param.location {
            ParamLocation::Path => {
                let placeholder = format!("{{{}}}", param.original_name);
                path = path.replace(&placeholder, &urlencoding::encode(&scalar_text(value)));
            }
            ParamLocation::Query => {
                query.push(if query.is_empty() { '?' } else { '&' });
                query.push_str(&param.original_name);
                query.push('=');
                query.push_str(&urlencoding::encode(&scalar_text(value)));
            }
            ParamLocation::Header => {
                headers.push((param.original_name.clone(), scalar_text(value)));
            }
            ParamLocation::FormField => {
                if !form.is_empty() {
                    form.push('&');
                }
                form.push_str(&param.original_name);
                form.push('=');
                form.push_str(&urlencoding::encode(&scalar_text(value)));
            }
            ParamLocation::BodyField => {
                fields
                    .get_or_insert_with(serde_json::Map::new)
                    .insert(param.original_name.clone(), value.clone());
            }
            ParamLocation::BodyRaw => match serde_json::from_str(&scalar_text(value)) {
                Ok(parsed) => raw_body = Some(parsed),
                Err(err) => {
                    log::warn!(
                        "request body for {} is not valid JSON, sending no body: {err}",
                        operation.id
                    );
                }
            },
        }
    }

    let content_type = if form.is_empty() {
        "application/json"
    } else {
        "application/x-www-form-urlencoded"
    };
    push_default_header(&mut headers, "Content-Type", content_type);
    push_default_header(&mut headers, "Accept", "application/json");

    let body = if !form.is_empty() {
        PlannedBody::Form(form)
    } else if let Some(fields) = fields {
        PlannedBody::Json(Value::Object(fields))
    } else if let Some(raw) = raw_body {
        PlannedBody::Json(raw)
    } else {
        PlannedBody::None
    };

    Ok(RequestPlan {
        method: operation.method,
        url: format!("{}{}{}", base_url.trim_end_matches('/'), path, query),
        headers,
        body,
    })
}

/// Declared header parameters win over the defaults.
fn push_default_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    if !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name)) {
        headers.push((name.to_string(), value.to_string()));
    }
}

/// Render one argument value for a textual slot. Strings drop their
/// quotes; anything else is its JSON text.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oad_core::catalog::{ParamKind, Parameter};
    use serde_json::json;

    fn param(name: &str, original: &str, location: ParamLocation) -> Parameter {
        Parameter {
            name: name.to_string(),
            original_name: original.to_string(),
            location,
            kind: ParamKind::String,
            example: None,
        }
    }

    fn operation(path: &str, parameters: Vec<Parameter>) -> Operation {
        Operation {
            id: "testOp".to_string(),
            summary: "Test operation".to_string(),
            method: HttpVerb::Get,
            path: path.to_string(),
            parameters,
        }
    }

    #[test]
    fn test_binds_each_location() {
        let op = operation(
            "/items/{id}",
            vec![
                param("id", "id", ParamLocation::Path),
                param("limit", "limit", ParamLocation::Query),
                param("name", "name", ParamLocation::BodyField),
            ],
        );
        let plan =
            plan_request(&op, "https://api.test", &[json!("42"), json!("10"), json!("Alice")])
                .unwrap();
        assert_eq!(plan.url, "https://api.test/items/42?limit=10");
        assert_eq!(plan.body, PlannedBody::Json(json!({"name": "Alice"})));
        assert_eq!(plan.method, HttpVerb::Get);
    }

    #[test]
    fn test_renamed_body_field_keeps_wire_key() {
        let op = operation(
            "/items",
            vec![
                param("id", "id", ParamLocation::Query),
                param("id_", "id", ParamLocation::BodyField),
            ],
        );
        let plan = plan_request(&op, "https://api.test", &[json!(1), json!(7)]).unwrap();
        assert_eq!(plan.url, "https://api.test/items?id=1");
        // The disambiguated name binds the value; the wire key is the
        // declared property name.
        assert_eq!(plan.body, PlannedBody::Json(json!({"id": 7})));
    }

    #[test]
    fn test_same_wire_name_binds_per_slot() {
        // Query id and header id share a wire name but bind under the
        // distinct names fixed at normalize time.
        let op = operation(
            "/audit",
            vec![
                param("id", "id", ParamLocation::Query),
                param("id_", "id", ParamLocation::Header),
            ],
        );
        let plan = plan_request(&op, "https://api.test", &[json!("qv"), json!("hv")]).unwrap();
        assert_eq!(plan.url, "https://api.test/audit?id=qv");
        assert!(plan.headers.contains(&("id".to_string(), "hv".to_string())));
    }

    #[test]
    fn test_form_fields_win_over_json_body() {
        let op = operation(
            "/submit",
            vec![
                param("caption", "caption", ParamLocation::FormField),
                param("extra", "extra", ParamLocation::BodyField),
            ],
        );
        let plan = plan_request(&op, "https://api.test", &[json!("hi"), json!("x")]).unwrap();
        assert_eq!(plan.body, PlannedBody::Form("caption=hi".to_string()));
        assert!(plan
            .headers
            .contains(&("Content-Type".to_string(), "application/x-www-form-urlencoded".to_string())));
    }

    #[test]
    fn test_opaque_body_passes_parsed_json() {
        let op = operation("/orders", vec![param("payload", "payload", ParamLocation::BodyRaw)]);
        let plan =
            plan_request(&op, "https://api.test", &[json!(r#"{"qty": 2}"#)]).unwrap();
        assert_eq!(plan.body, PlannedBody::Json(json!({"qty": 2})));
    }

    #[test]
    fn test_invalid_opaque_body_is_omitted() {
        let op = operation("/orders", vec![param("payload", "payload", ParamLocation::BodyRaw)]);
        let plan = plan_request(&op, "https://api.test", &[json!("{not json")]).unwrap();
        assert_eq!(plan.body, PlannedBody::None);
    }

    #[test]
    fn test_arity_mismatch_is_fatal() {
        let op = operation("/items/{id}", vec![param("id", "id", ParamLocation::Path)]);
        match plan_request(&op, "https://api.test", &[]) {
            Err(DispatchError::ArityMismatch { expected, got, .. }) => {
                assert_eq!(expected, 1);
                assert_eq!(got, 0);
            }
            other => panic!("expected ArityMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_default_headers() {
        let op = operation("/items", vec![]);
        let plan = plan_request(&op, "https://api.test", &[]).unwrap();
        assert_eq!(
            plan.headers,
            [
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Accept".to_string(), "application/json".to_string()),
            ]
        );
    }

    #[test]
    fn test_declared_header_overrides_default() {
        let op = operation(
            "/items",
            vec![param("Content-Type", "Content-Type", ParamLocation::Header)],
        );
        let plan = plan_request(&op, "https://api.test", &[json!("text/plain")]).unwrap();
        let content_types: Vec<&str> = plan
            .headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(content_types, ["text/plain"]);
    }

    #[test]
    fn test_values_are_percent_encoded() {
        let op = operation(
            "/files/{name}",
            vec![
                param("name", "name", ParamLocation::Path),
                param("tag", "tag", ParamLocation::Query),
            ],
        );
        let plan =
            plan_request(&op, "https://api.test", &[json!("a b"), json!("x&y")]).unwrap();
        assert_eq!(plan.url, "https://api.test/files/a%20b?tag=x%26y");
    }

    #[test]
    fn test_trailing_base_url_slash_is_trimmed() {
        let op = operation("/items", vec![]);
        let plan = plan_request(&op, "https://api.test/", &[]).unwrap();
        assert_eq!(plan.url, "https://api.test/items");
    }

    #[test]
    fn test_non_string_values_render_as_json_text() {
        let op = operation(
            "/items/{id}",
            vec![
                param("id", "id", ParamLocation::Path),
                param("active", "active", ParamLocation::Query),
            ],
        );
        let plan = plan_request(&op, "https://api.test", &[json!(7), json!(true)]).unwrap();
        assert_eq!(plan.url, "https://api.test/items/7?active=true");
    }
}
