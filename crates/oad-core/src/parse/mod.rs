pub mod v2;
pub mod v3;

use serde::Deserialize;

use crate::error::SpecError;

/// A structurally parsed document, still version-specific.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSpec {
    V2(v2::SwaggerSpec),
    V3(v3::OpenApiSpec),
}

impl RawSpec {
    pub fn version_label(&self) -> &'static str {
        match self {
            RawSpec::V2(_) => "Swagger 2",
            RawSpec::V3(_) => "OpenAPI 3",
        }
    }
}

/// The version-marker fields, probed before the full structural parse.
///
/// The marker decides which model parses the document: a marked document
/// that fails its own structural parse is malformed and is never retried
/// as the other version. Only a document carrying neither marker falls
/// through try-v3-then-v2, and it is unsupported when both parses fail.
#[derive(Debug, Deserialize)]
struct VersionProbe {
    openapi: Option<serde_json::Value>,
    swagger: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecVersion {
    V2,
    V3,
}

impl VersionProbe {
    fn version(&self) -> Result<Option<SpecVersion>, SpecError> {
        if let Some(marker) = &self.openapi {
            let text = marker_text(marker);
            if !text.starts_with("3.") {
                return Err(SpecError::Unsupported(format!("openapi {text}")));
            }
            log::debug!("detected OpenAPI {text}");
            return Ok(Some(SpecVersion::V3));
        }
        if let Some(marker) = &self.swagger {
            let text = marker_text(marker);
            if !text.starts_with('2') {
                return Err(SpecError::Unsupported(format!("swagger {text}")));
            }
            log::debug!("detected Swagger {text}");
            return Ok(Some(SpecVersion::V2));
        }
        Ok(None)
    }
}

/// Markers are usually strings, but YAML happily yields `3.0` as a
/// number; render either form as text.
fn marker_text(marker: &serde_json::Value) -> String {
    match marker {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a spec from YAML text. JSON is a subset of YAML, so this also
/// accepts JSON input.
pub fn from_yaml(input: &str) -> Result<RawSpec, SpecError> {
    let probe: VersionProbe = serde_yaml_ng::from_str(input)?;
    match probe.version()? {
        Some(SpecVersion::V3) => serde_yaml_ng::from_str(input)
            .map(RawSpec::V3)
            .map_err(|e| SpecError::Malformed(format!("OpenAPI 3: {e}"))),
        Some(SpecVersion::V2) => serde_yaml_ng::from_str(input)
            .map(RawSpec::V2)
            .map_err(|e| SpecError::Malformed(format!("Swagger 2: {e}"))),
        None => match serde_yaml_ng::from_str::<v3::OpenApiSpec>(input) {
            Ok(spec) => Ok(RawSpec::V3(spec)),
            Err(v3_err) => match serde_yaml_ng::from_str::<v2::SwaggerSpec>(input) {
                Ok(spec) => Ok(RawSpec::V2(spec)),
                Err(v2_err) => Err(unsupported_shape(&v3_err, &v2_err)),
            },
        },
    }
}

/// Parse a spec from JSON text.
pub fn from_json(input: &str) -> Result<RawSpec, SpecError> {
    let probe: VersionProbe = serde_json::from_str(input)?;
    match probe.version()? {
        Some(SpecVersion::V3) => serde_json::from_str(input)
            .map(RawSpec::V3)
            .map_err(|e| SpecError::Malformed(format!("OpenAPI 3: {e}"))),
        Some(SpecVersion::V2) => serde_json::from_str(input)
            .map(RawSpec::V2)
            .map_err(|e| SpecError::Malformed(format!("Swagger 2: {e}"))),
        None => match serde_json::from_str::<v3::OpenApiSpec>(input) {
            Ok(spec) => Ok(RawSpec::V3(spec)),
            Err(v3_err) => match serde_json::from_str::<v2::SwaggerSpec>(input) {
                Ok(spec) => Ok(RawSpec::V2(spec)),
                Err(v2_err) => Err(unsupported_shape(&v3_err, &v2_err)),
            },
        },
    }
}

fn unsupported_shape(
    v3_err: &dyn std::fmt::Display,
    v2_err: &dyn std::fmt::Display,
) -> SpecError {
    SpecError::Unsupported(format!(
        "no version marker; not OpenAPI 3 ({v3_err}); not Swagger 2 ({v2_err})"
    ))
}
