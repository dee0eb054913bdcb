//! Schema Validation - Untyped Documents In, Typed Documents Out
//!
//! `SchemaValidator` is the seam to the JSON Schema engine. `upgrade` turns a
//! raw document into `Validated::Valid(T)` or `Validated::Invalid(errors)`;
//! only the valid variant carries a typed value.

use jsonschema::error::ValidationErrorKind;
use jsonschema::Draft;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// A schema that could not be compiled. This is a setup failure, not a rule outcome.
#[derive(Debug, Error)]
#[error("Schema compilation error: {0}")]
pub struct SchemaCompileError(pub String);

/// One structural error reported by the schema engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaError {
    /// JSON pointer into the instance, empty for the root.
    pub instance_path: String,
    pub keyword: String,
    pub message: String,
    #[serde(default)]
    pub params: Value,
}

impl SchemaError {
    pub fn additional_property(&self) -> Option<&str> {
        self.params.get("additionalProperty").and_then(Value::as_str)
    }
}

pub trait SchemaValidator {
    /// Empty vector means the document is valid.
    fn validate(&self, document: &Value, schema: &Value) -> Result<Vec<SchemaError>, SchemaCompileError>;
}

/// Draft 2020-12 validator backed by the `jsonschema` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, document: &Value, schema: &Value) -> Result<Vec<SchemaError>, SchemaCompileError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(schema)
            .map_err(|e| SchemaCompileError(e.to_string()))?;

        let mut errors = vec![];
        for err in validator.iter_errors(document) {
            let instance_path = err.instance_path().to_string();
            let schema_path = err.schema_path().to_string();
            let keyword = schema_path
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();

            if let ValidationErrorKind::AdditionalProperties { unexpected } = err.kind() {
                // One error per extra property so each renders on its own.
                for property in unexpected {
                    errors.push(SchemaError {
                        instance_path: instance_path.clone(),
                        keyword: "additionalProperties".to_string(),
                        message: "must NOT have additional properties".to_string(),
                        params: json!({ "additionalProperty": property }),
                    });
                }
                continue;
            }

            errors.push(SchemaError {
                instance_path,
                keyword,
                message: err.to_string(),
                params: Value::Null,
            });
        }
        Ok(errors)
    }
}

/// Tagged outcome of schema-checking an untyped document
#[derive(Debug, Clone)]
pub enum Validated<T> {
    Valid(T),
    Invalid(Vec<SchemaError>),
}

impl<T> Validated<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn errors(&self) -> &[SchemaError] {
        match self {
            Self::Valid(_) => &[],
            Self::Invalid(errors) => errors,
        }
    }

    pub fn into_valid(self) -> Option<T> {
        match self {
            Self::Valid(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }
}

/// Schema-check `document` and, if it passes, deserialize it into `T`.
///
/// A document the schema accepts but the typed model rejects is reported as a
/// root-level schema error rather than a panic or a setup failure.
pub fn upgrade<T: DeserializeOwned>(
    validator: &dyn SchemaValidator,
    document: &Value,
    schema: &Value,
) -> Result<Validated<T>, SchemaCompileError> {
    let errors = validator.validate(document, schema)?;
    if !errors.is_empty() {
        return Ok(Validated::Invalid(errors));
    }

    match serde_json::from_value::<T>(document.clone()) {
        Ok(typed) => Ok(Validated::Valid(typed)),
        Err(e) => Ok(Validated::Invalid(vec![SchemaError {
            instance_path: String::new(),
            keyword: "type".to_string(),
            message: e.to_string(),
            params: Value::Null,
        }])),
    }
}

/// JSON pointer `/a/b/0` to dotted `a.b.0`.
fn dotted(pointer: &str) -> String {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect::<Vec<_>>()
        .join(".")
}

/// Render one error as `<path> <message>`.
pub fn format_schema_error(error: &SchemaError) -> String {
    let path = dotted(&error.instance_path);
    let path = if path.is_empty() { "(root)".to_string() } else { path };

    if error.keyword == "additionalProperties" {
        if let Some(extra) = error.additional_property() {
            return format!("{}.{} is not allowed", path, extra);
        }
    }

    format!("{} {}", path, error.message)
}

pub fn format_schema_errors(errors: &[SchemaError]) -> String {
    errors
        .iter()
        .map(format_schema_error)
        .collect::<Vec<_>>()
        .join("; ")
}
