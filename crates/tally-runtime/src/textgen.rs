//! Text-generation boundary.
//!
//! Back-office screens ask an external model for structured answers (invoice
//! extraction, sales analysis). This module defines the seam: a
//! [`TextGenerator`] receives a [`Prompt`] and an [`OutputShape`] and
//! returns a JSON object. [`ValidatingGenerator`] checks every answer
//! against the requested shape before callers see it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tally_types::ErrorCode;
use thiserror::Error;

/// Input to a generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Standing instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// The request text.
    pub text: String,
}

impl Prompt {
    /// Creates a prompt without system instructions.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            system: None,
            text: text.into(),
        }
    }

    /// Sets system instructions.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// JSON type of one output field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array(Box<FieldType>),
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String, Value::String(_))
            | (Self::Number, Value::Number(_))
            | (Self::Boolean, Value::Bool(_))
            | (Self::Object, Value::Object(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Array(item), Value::Array(items)) => items.iter().all(|v| item.matches(v)),
            _ => false,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::String => "string".into(),
            Self::Number => "number".into(),
            Self::Integer => "integer".into(),
            Self::Boolean => "boolean".into(),
            Self::Object => "object".into(),
            Self::Array(item) => format!("array of {}", item.describe()),
        }
    }
}

/// One named field of an [`OutputShape`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// The object a generator must return: named fields with declared types.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tally_runtime::textgen::{FieldType, OutputShape};
///
/// let shape = OutputShape::new()
///     .field("supplier", FieldType::String)
///     .field("total", FieldType::Number)
///     .optional("notes", FieldType::String);
///
/// assert!(shape.validate(&json!({"supplier": "ACME", "total": 12.5})).is_ok());
/// assert!(shape.validate(&json!({"supplier": "ACME", "total": "12.5"})).is_err());
/// assert!(shape.validate(&json!({"supplier": "ACME"})).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputShape {
    pub fields: Vec<FieldSpec>,
}

impl OutputShape {
    /// Creates an empty shape (accepts any object).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            required: true,
        });
        self
    }

    /// Adds an optional field.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            ty,
            required: false,
        });
        self
    }

    /// Checks that `value` is an object conforming to this shape and
    /// returns it. Extra fields are kept.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] describing the first mismatch.
    pub fn validate<'a>(
        &self,
        value: &'a Value,
    ) -> Result<&'a Map<String, Value>, GenerationError> {
        let object = value
            .as_object()
            .ok_or_else(|| GenerationError::Malformed("output is not a JSON object".into()))?;

        for spec in &self.fields {
            match object.get(&spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(GenerationError::MissingField(spec.name.clone()));
                }
                None | Some(Value::Null) => {}
                Some(v) if !spec.ty.matches(v) => {
                    return Err(GenerationError::ShapeMismatch {
                        field: spec.name.clone(),
                        expected: spec.ty.describe(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(object)
    }
}

/// Text generation failed.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// The backend could not be reached or refused the request.
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// The answer was not a usable JSON object.
    #[error("malformed generator output: {0}")]
    Malformed(String),

    /// A required field is missing.
    #[error("generator output is missing field '{0}'")]
    MissingField(String),

    /// A field has the wrong type.
    #[error("field '{field}' should be {expected}")]
    ShapeMismatch { field: String, expected: String },
}

impl ErrorCode for GenerationError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "GENERATION_UNAVAILABLE",
            Self::Malformed(_) => "GENERATION_MALFORMED",
            Self::MissingField(_) => "GENERATION_MISSING_FIELD",
            Self::ShapeMismatch { .. } => "GENERATION_SHAPE_MISMATCH",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}

/// Produces structured answers to prompts.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a JSON object for `prompt` following `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] on backend failure or unusable output.
    async fn generate(&self, prompt: &Prompt, shape: &OutputShape)
        -> Result<Value, GenerationError>;
}

/// Wraps a generator and rejects answers that do not match the shape.
#[derive(Debug, Clone)]
pub struct ValidatingGenerator<G> {
    inner: G,
}

impl<G: TextGenerator> ValidatingGenerator<G> {
    /// Wraps `inner`.
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for ValidatingGenerator<G> {
    async fn generate(
        &self,
        prompt: &Prompt,
        shape: &OutputShape,
    ) -> Result<Value, GenerationError> {
        let output = self.inner.generate(prompt, shape).await?;
        if let Err(e) = shape.validate(&output) {
            tracing::warn!(error = %e, "generator output rejected");
            return Err(e);
        }
        Ok(output)
    }
}
