use oad_core::actions::{self, RESULT_TOKENS};
use oad_core::catalog::ParamKind;
use oad_core::{normalize, parse, ActionHandle, ActionRegistry};
use serde_json::json;

const PETSTORE_V2: &str = include_str!("fixtures/petstore-v2.json");
const WIDGETS_V3: &str = include_str!("fixtures/widgets-v3.yaml");
const ORDERS_V3: &str = include_str!("fixtures/orders-v3.yaml");

fn document(input: &str) -> oad_core::catalog::Document {
    let spec = if input.trim_start().starts_with('{') {
        parse::from_json(input).expect("should parse fixture")
    } else {
        parse::from_yaml(input).expect("should parse fixture")
    };
    normalize::normalize(&spec).expect("should normalize fixture")
}

/// Records every registry call for assertions.
#[derive(Debug, Default)]
struct RecordedAction {
    name: String,
    id: String,
    tokens: Vec<String>,
    /// `(kind, name, default)` in call order.
    params: Vec<(String, String, String)>,
}

impl ActionHandle for RecordedAction {
    fn add_script_tokens(&mut self, tokens: &[&str]) {
        self.tokens.extend(tokens.iter().map(|t| t.to_string()));
    }

    fn add_string_parameter(&mut self, name: &str, default: &str) {
        self.params
            .push(("string".into(), name.into(), default.into()));
    }

    fn add_int_parameter(&mut self, name: &str, default: i64) {
        self.params
            .push(("int".into(), name.into(), default.to_string()));
    }

    fn add_float_parameter(&mut self, name: &str, default: f64) {
        self.params
            .push(("float".into(), name.into(), default.to_string()));
    }

    fn add_bool_parameter(&mut self, name: &str, default: bool) {
        self.params
            .push(("bool".into(), name.into(), default.to_string()));
    }

    fn add_file_parameter(&mut self, name: &str, default: &str) {
        self.params
            .push(("file".into(), name.into(), default.into()));
    }
}

#[derive(Debug, Default)]
struct MockRegistry {
    actions: Vec<RecordedAction>,
    clear_calls: usize,
}

impl ActionRegistry for MockRegistry {
    type Handle = RecordedAction;

    fn clear_actions(&mut self) {
        self.clear_calls += 1;
        self.actions.clear();
    }

    fn add_action(&mut self, name: &str, id: &str) -> &mut RecordedAction {
        self.actions.push(RecordedAction {
            name: name.into(),
            id: id.into(),
            ..Default::default()
        });
        self.actions.last_mut().unwrap()
    }
}

#[test]
fn compile_widgets_v3() {
    let registrations = actions::compile(&document(WIDGETS_V3));
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].id, "getWidget");
    assert_eq!(registrations[0].display_name, "GET Fetch one widget");
    assert_eq!(registrations[0].signature.len(), 1);
    assert_eq!(registrations[0].signature[0].name, "id");
    assert_eq!(registrations[0].signature[0].kind, ParamKind::Integer);
    assert_eq!(registrations[0].signature[0].default, json!(0));
}

#[test]
fn compile_display_names() {
    let registrations = actions::compile(&document(PETSTORE_V2));
    let names: Vec<&str> = registrations
        .iter()
        .map(|r| r.display_name.as_str())
        .collect();
    assert_eq!(
        names,
        [
            "GET List all pets",
            "POST Create a pet",
            "GET Get one pet",
            "DELETE /pets/{petId}",
            "POST Upload a photo",
            "POST Place an order"
        ]
    );
}

#[test]
fn compile_defaults_from_declared_examples() {
    let registrations = actions::compile(&document(PETSTORE_V2));
    let list = registrations
        .iter()
        .find(|r| r.id == "listPets")
        .expect("should have listPets");
    assert_eq!(list.signature[0].default, json!(20));
    // No example declared: the kind's zero value stands in.
    assert_eq!(list.signature[1].default, json!(""));
}

#[test]
fn compile_signature_carries_deduplicated_names() {
    let registrations = actions::compile(&document(PETSTORE_V2));
    let create = registrations
        .iter()
        .find(|r| r.id == "Create a pet")
        .expect("should have Create a pet");
    let names: Vec<&str> = create.signature.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["id", "id_", "name", "adopted"]);
}

#[test]
fn register_populates_registry() {
    let mut registry = MockRegistry::default();
    actions::register(&mut registry, &document(WIDGETS_V3));

    assert_eq!(registry.clear_calls, 1);
    assert_eq!(registry.actions.len(), 1);

    let action = &registry.actions[0];
    assert_eq!(action.name, "GET Fetch one widget");
    assert_eq!(action.id, "getWidget");
    assert_eq!(action.tokens, RESULT_TOKENS);
    assert_eq!(
        action.params,
        [("int".to_string(), "id".to_string(), "0".to_string())]
    );
}

#[test]
fn register_replaces_previous_actions() {
    let mut registry = MockRegistry::default();

    actions::register(&mut registry, &document(PETSTORE_V2));
    assert_eq!(registry.actions.len(), 6);

    // A second load clears first: only the new document's actions remain.
    actions::register(&mut registry, &document(WIDGETS_V3));
    assert_eq!(registry.clear_calls, 2);
    assert_eq!(registry.actions.len(), 1);
    assert_eq!(registry.actions[0].id, "getWidget");
}

#[test]
fn register_typed_parameters() {
    let mut registry = MockRegistry::default();
    actions::register(&mut registry, &document(PETSTORE_V2));

    let action = registry
        .actions
        .iter()
        .find(|a| a.id == "uploadPhoto")
        .expect("should have uploadPhoto");
    assert_eq!(
        action.params,
        [
            ("int".to_string(), "petId".to_string(), "0".to_string()),
            ("string".to_string(), "caption".to_string(), String::new()),
            ("file".to_string(), "photo".to_string(), String::new()),
        ]
    );
}

#[test]
fn register_defaults_follow_examples() {
    let mut registry = MockRegistry::default();
    actions::register(&mut registry, &document(ORDERS_V3));

    let action = registry
        .actions
        .iter()
        .find(|a| a.id == "createOrder")
        .expect("should have createOrder");
    assert_eq!(
        action.params,
        [
            ("int".to_string(), "id".to_string(), "99".to_string()),
            ("int".to_string(), "id_".to_string(), "0".to_string()),
            ("string".to_string(), "item".to_string(), "widget".to_string()),
            ("int".to_string(), "quantity".to_string(), "1".to_string()),
            ("file".to_string(), "attachment".to_string(), String::new()),
        ]
    );
}
