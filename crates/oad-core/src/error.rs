use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported document: {0}")]
    Unsupported(String),

    #[error("malformed document: {0}")]
    Malformed(String),
}
