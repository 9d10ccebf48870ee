use serde_json::Value;

use crate::catalog::{Document, Operation, ParamKind};
use crate::{ActionHandle, ActionRegistry};

/// Tokens every action exposes to host scripts for its completion result.
pub const RESULT_TOKENS: [&str; 2] = ["result", "resultStatus"];

/// One registrable action derived from an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRegistration {
    /// Registry key; equals the operation's identifier.
    pub id: String,
    /// `"<VERB> <summary>"`.
    pub display_name: String,
    pub signature: Vec<SignatureParam>,
}

/// One entry of an action's parameter signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParam {
    pub name: String,
    pub kind: ParamKind,
    pub default: Value,
}

/// Compile a document into its action registrations. Pure; the
/// registry side effects live in [`register`].
pub fn compile(document: &Document) -> Vec<ActionRegistration> {
    document.operations().map(compile_operation).collect()
}

/// Compile a single operation.
pub fn compile_operation(op: &Operation) -> ActionRegistration {
    ActionRegistration {
        id: op.id.clone(),
        display_name: format!("{} {}", op.method.as_str(), op.summary),
        signature: op
            .parameters
            .iter()
            .map(|param| SignatureParam {
                name: param.name.clone(),
                kind: param.kind,
                default: param
                    .example
                    .clone()
                    .unwrap_or_else(|| zero_value(param.kind)),
            })
            .collect(),
    }
}

/// The kind's zero value, used when the document declares no example.
fn zero_value(kind: ParamKind) -> Value {
    match kind {
        ParamKind::Integer => Value::from(0),
        ParamKind::Number => Value::from(0.0),
        ParamKind::Boolean => Value::from(false),
        ParamKind::String | ParamKind::File => Value::from(""),
    }
}

/// Replace the registry contents with the document's actions: previous
/// registrations are cleared first, then one action is added per
/// operation, carrying the result tokens and one typed parameter per
/// signature entry.
pub fn register<R: ActionRegistry>(
    registry: &mut R,
    document: &Document,
) -> Vec<ActionRegistration> {
    let registrations = compile(document);

    registry.clear_actions();
    for registration in &registrations {
        let handle = registry.add_action(&registration.display_name, &registration.id);
        handle.add_script_tokens(&RESULT_TOKENS);
        for param in &registration.signature {
            match param.kind {
                ParamKind::Integer => {
                    handle.add_int_parameter(&param.name, param.default.as_i64().unwrap_or(0));
                }
                ParamKind::Number => {
                    handle.add_float_parameter(&param.name, param.default.as_f64().unwrap_or(0.0));
                }
                ParamKind::Boolean => {
                    handle.add_bool_parameter(&param.name, param.default.as_bool().unwrap_or(false));
                }
                ParamKind::File => {
                    handle.add_file_parameter(&param.name, &text_default(&param.default));
                }
                ParamKind::String => {
                    handle.add_string_parameter(&param.name, &text_default(&param.default));
                }
            }
        }
    }

    log::debug!("registered {} actions", registrations.len());
    registrations
}

/// Render a default for a text-valued parameter; non-string examples are
/// carried as their JSON text.
fn text_default(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
