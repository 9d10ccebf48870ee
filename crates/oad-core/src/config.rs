use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Host-side settings loaded from `.oad.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OadConfig {
    /// Scheme + authority, e.g. `https://api.example.com`. Used when the
    /// loaded document resolves no base URL of its own.
    pub host: String,

    /// Path prefix appended to `host`.
    pub base_path: String,

    /// Spec document to load when no input path is given.
    pub spec_file: String,
}

impl Default for OadConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            base_path: String::new(),
            spec_file: "swagger.json".to_string(),
        }
    }
}

impl OadConfig {
    /// `host` + `base_path`, with no trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.host, self.base_path)
            .trim_end_matches('/')
            .to_string()
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oad.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OadConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: OadConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oad configuration
# Base URL pieces used when the spec document resolves none of its own.
# host: https://api.example.com
# base_path: /v1

# Spec document loaded when no --input is given.
spec_file: swagger.json
"#
}
