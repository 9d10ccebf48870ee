pub mod actions;
pub mod catalog;
pub mod config;
pub mod error;
pub mod normalize;
pub mod parse;

/// One action under construction in the host registry. Obtained from
/// [`ActionRegistry::add_action`]; the compiler attaches the script tokens
/// and the typed parameter signature through it.
pub trait ActionHandle {
    fn add_script_tokens(&mut self, tokens: &[&str]);
    fn add_string_parameter(&mut self, name: &str, default: &str);
    fn add_int_parameter(&mut self, name: &str, default: i64);
    fn add_float_parameter(&mut self, name: &str, default: f64);
    fn add_bool_parameter(&mut self, name: &str, default: bool);
    fn add_file_parameter(&mut self, name: &str, default: &str);
}

/// Trait for host action registries that receive compiled actions. The
/// compiler drives this; implementations live in the host.
pub trait ActionRegistry {
    type Handle: ActionHandle;

    /// Remove every previously registered action.
    fn clear_actions(&mut self);

    /// Begin registering a new action under the given display name and
    /// identifier.
    fn add_action(&mut self, name: &str, id: &str) -> &mut Self::Handle;
}
