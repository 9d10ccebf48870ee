mod v2;
mod v3;

use std::collections::HashSet;

use heck::ToPascalCase;

use crate::catalog::{Document, HttpVerb, Parameter};
use crate::error::SpecError;
use crate::parse::RawSpec;

/// Lower a parsed document into the version-independent catalog.
///
/// Fails when the document declares no operation under any supported
/// verb; every other irregularity (unresolvable references, unknown
/// scalar types) degrades per-parameter instead of failing the load.
pub fn normalize(raw: &RawSpec) -> Result<Document, SpecError> {
    let mut document = match raw {
        RawSpec::V2(spec) => v2::lower(spec),
        RawSpec::V3(spec) => v3::lower(spec),
    };

    if document.operation_count() == 0 {
        return Err(SpecError::Malformed(
            "document declares no operations under GET/POST/PUT/DELETE".to_string(),
        ));
    }

    ensure_unique_ids(&mut document);

    log::debug!(
        "normalized {} operations across {} paths (base URL {:?})",
        document.operation_count(),
        document.paths.len(),
        document.base_url
    );
    Ok(document)
}

/// Suffix `name` with `_` until it collides with nothing in `taken`.
fn unique_name(name: &str, taken: &HashSet<String>) -> String {
    let mut candidate = name.to_string();
    while taken.contains(&candidate) {
        candidate.push('_');
    }
    candidate
}

/// Registries key actions by identifier, so identifiers must be unique
/// across the whole document.
fn ensure_unique_ids(document: &mut Document) {
    let mut taken = HashSet::new();
    for item in document.paths.values_mut() {
        for op in &mut item.operations {
            let unique = unique_name(&op.id, &taken);
            if unique != op.id {
                log::debug!("action id {:?} already taken, using {:?}", op.id, unique);
                op.id = unique;
            }
            taken.insert(op.id.clone());
        }
    }
}

/// Rename any parameter whose name collides with an earlier one in the
/// operation, so every binding name is unique. Duplicates are legal in
/// the source document when locations differ (query `id` plus header
/// `id`), and flattened body fields can collide with anything; binding
/// is by name, so each must end up distinct. The first occurrence keeps
/// its name, later ones are suffixed. Wire names stay untouched: a
/// renamed parameter still writes its declared name into the request.
fn dedup_names(params: &mut [Parameter]) {
    let mut taken: HashSet<String> = HashSet::new();
    for param in params.iter_mut() {
        let unique = unique_name(&param.name, &taken);
        if unique != param.name {
            log::debug!(
                "parameter name {:?} already taken, binding as {:?}",
                param.name,
                unique
            );
            param.name = unique;
        }
        taken.insert(param.name.clone());
    }
}

/// Resolve an operation's identifier and display summary.
///
/// The identifier prefers `operationId`, then a non-empty summary, then a
/// route-derived fallback. The display summary falls back to the URL
/// template itself.
fn operation_identity(
    operation_id: Option<&str>,
    summary: Option<&str>,
    method: HttpVerb,
    path: &str,
) -> (String, String) {
    let summary = summary.map(str::trim).filter(|s| !s.is_empty());
    let id = operation_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| summary.map(str::to_string))
        .unwrap_or_else(|| route_id(method, path));
    (id, summary.unwrap_or(path).to_string())
}

/// Deterministic identifier derived from the verb and route segments,
/// e.g. `GET /widgets/{id}` becomes `getWidgetsById`.
fn route_id(method: HttpVerb, path: &str) -> String {
    let mut id = method.as_str().to_lowercase();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => {
                id.push_str("By");
                id.push_str(&name.to_pascal_case());
            }
            None => id.push_str(&segment.to_pascal_case()),
        }
    }
    id
}

/// Trim the trailing slash so base URL + path template never doubles it.
fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ParamKind, ParamLocation};

    fn param(name: &str, location: ParamLocation) -> Parameter {
        Parameter {
            name: name.to_string(),
            original_name: name.to_string(),
            location,
            kind: ParamKind::String,
            example: None,
        }
    }

    #[test]
    fn test_route_id_plain() {
        assert_eq!(route_id(HttpVerb::Get, "/users"), "getUsers");
    }

    #[test]
    fn test_route_id_with_placeholder() {
        assert_eq!(route_id(HttpVerb::Get, "/widgets/{id}"), "getWidgetsById");
    }

    #[test]
    fn test_route_id_nested() {
        assert_eq!(
            route_id(HttpVerb::Post, "/users/{userId}/messages"),
            "postUsersByUserIdMessages"
        );
    }

    #[test]
    fn test_route_id_root() {
        assert_eq!(route_id(HttpVerb::Delete, "/"), "delete");
    }

    #[test]
    fn test_unique_name_suffixes_until_free() {
        let taken: HashSet<String> = ["id".to_string(), "id_".to_string()].into_iter().collect();
        assert_eq!(unique_name("id", &taken), "id__");
        assert_eq!(unique_name("limit", &taken), "limit");
    }

    #[test]
    fn test_operation_identity_prefers_operation_id() {
        let (id, summary) =
            operation_identity(Some("listPets"), Some("List pets"), HttpVerb::Get, "/pets");
        assert_eq!(id, "listPets");
        assert_eq!(summary, "List pets");
    }

    #[test]
    fn test_operation_identity_falls_back_to_summary() {
        let (id, summary) = operation_identity(None, Some("List pets"), HttpVerb::Get, "/pets");
        assert_eq!(id, "List pets");
        assert_eq!(summary, "List pets");
    }

    #[test]
    fn test_operation_identity_falls_back_to_route() {
        let (id, summary) = operation_identity(None, None, HttpVerb::Get, "/pets");
        assert_eq!(id, "getPets");
        assert_eq!(summary, "/pets");
    }

    #[test]
    fn test_operation_identity_ignores_blank_summary() {
        let (id, _) = operation_identity(None, Some("   "), HttpVerb::Get, "/pets");
        assert_eq!(id, "getPets");
    }

    #[test]
    fn test_dedup_suffixes_later_collisions() {
        let mut params = vec![
            param("id", ParamLocation::Query),
            param("name", ParamLocation::Query),
            param("id", ParamLocation::BodyField),
            param("id", ParamLocation::BodyField),
        ];
        dedup_names(&mut params);
        assert_eq!(params[0].name, "id");
        assert_eq!(params[1].name, "name");
        assert_eq!(params[2].name, "id_");
        assert_eq!(params[3].name, "id__");
        // Wire names survive the rename.
        assert_eq!(params[2].original_name, "id");
        assert_eq!(params[3].original_name, "id");
    }

    #[test]
    fn test_dedup_covers_declared_parameters() {
        let mut params = vec![
            param("id", ParamLocation::Query),
            param("id", ParamLocation::Header),
        ];
        dedup_names(&mut params);
        assert_eq!(params[0].name, "id");
        assert_eq!(params[1].name, "id_");
        // The header still goes out under its declared name.
        assert_eq!(params[1].original_name, "id");
    }
}
