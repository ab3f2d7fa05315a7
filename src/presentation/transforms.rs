use std::collections::HashMap;

use crate::models::ClaimTransformSpec;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("unknown transform type: {0}")]
    UnknownType(String),
    #[error("transform {transform} requires param {param}")]
    MissingParam { transform: String, param: String },
    #[error("transform {transform} cannot apply to value {value}")]
    Incompatible { transform: String, value: String },
    #[error("invalid date value {value} for format {format}")]
    InvalidDate { value: String, format: String },
}

type TransformFn = fn(&serde_json::Value, &HashMap<String, String>) -> Result<serde_json::Value, TransformError>;

/// Open registry of claim transforms, keyed by transform-type string.
///
/// Only `date_format{from,to}` is provided out of the box (§4.6 / §9 open
/// question 1); a deployment registers further transforms without touching
/// the extraction pipeline.
pub struct TransformRegistry {
    transforms: HashMap<String, TransformFn>,
}

impl Default for TransformRegistry {
    fn default() -> Self {
        let mut registry = Self {
            transforms: HashMap::new(),
        };
        registry.register("date_format", date_format_transform);
        registry
    }
}

impl TransformRegistry {
    pub fn register(&mut self, name: &str, f: TransformFn) {
        self.transforms.insert(name.to_string(), f);
    }

    pub fn apply(
        &self,
        spec: &ClaimTransformSpec,
        value: &serde_json::Value,
    ) -> Result<serde_json::Value, TransformError> {
        let f = self
            .transforms
            .get(&spec.transform_type)
            .ok_or_else(|| TransformError::UnknownType(spec.transform_type.clone()))?;
        f(value, &spec.params)
    }
}

fn date_format_transform(
    value: &serde_json::Value,
    params: &HashMap<String, String>,
) -> Result<serde_json::Value, TransformError> {
    let transform = "date_format";
    let from = params.get("from").ok_or_else(|| TransformError::MissingParam {
        transform: transform.into(),
        param: "from".into(),
    })?;
    let to = params.get("to").ok_or_else(|| TransformError::MissingParam {
        transform: transform.into(),
        param: "to".into(),
    })?;

    let raw = value.as_str().ok_or_else(|| TransformError::Incompatible {
        transform: transform.into(),
        value: value.to_string(),
    })?;

    let parsed = chrono::NaiveDate::parse_from_str(raw, strftime_pattern(from).as_str())
        .map_err(|_| TransformError::InvalidDate {
            value: raw.to_string(),
            format: from.clone(),
        })?;

    Ok(serde_json::Value::String(
        parsed.format(&strftime_pattern(to)).to_string(),
    ))
}

/// Maps the small set of date-token vocabularies a config author is likely
/// to write (`YYYY-MM-DD`, `DD/MM/YYYY`, ...) onto chrono's strftime syntax.
fn strftime_pattern(token_format: &str) -> String {
    token_format
        .replace("YYYY", "%Y")
        .replace("MM", "%m")
        .replace("DD", "%d")
}
