//! Tool contract for model-initiated function calls.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Tool execution errors.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

/// Metadata describing a tool to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    /// Tool name (snake_case, stable).
    pub name: String,
    /// Description shown to the model.
    pub description: String,
    /// JSON Schema for the arguments object.
    pub parameters: Value,
}

impl ToolDescriptor {
    /// Create a descriptor with an empty-object parameter schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }
    }

    /// Set the parameter schema.
    #[must_use]
    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }
}

/// A named external function the model may invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Descriptor advertised to the model.
    fn descriptor(&self) -> ToolDescriptor;

    /// Validate arguments before execution.
    ///
    /// Defaults to JSON Schema validation against `descriptor().parameters`.
    fn validate_args(&self, args: &Value) -> Result<(), ToolError> {
        validate_against_schema(&self.descriptor().parameters, args)
    }

    /// Execute with raw JSON arguments, returning the output payload.
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}

/// Validate a JSON value against a JSON Schema.
pub fn validate_against_schema(schema: &Value, args: &Value) -> Result<(), ToolError> {
    let validator = jsonschema::Validator::new(schema)
        .map_err(|e| ToolError::ExecutionFailed(format!("invalid tool schema: {e}")))?;
    if validator.is_valid(args) {
        return Ok(());
    }
    let errors: Vec<String> = validator.iter_errors(args).map(|e| e.to_string()).collect();
    Err(ToolError::InvalidArguments(errors.join("; ")))
}

/// Strongly-typed variant of [`Tool`] with automatic schema generation.
///
/// Implement this when the tool has a fixed argument shape; a blanket impl
/// provides [`Tool`]. Deserialization covers validation, so the schema
/// check is skipped.
#[async_trait]
pub trait TypedTool: Send + Sync {
    /// Argument type: must derive `Deserialize` and `JsonSchema`.
    type Args: for<'de> Deserialize<'de> + JsonSchema + Send;

    /// Tool name (snake_case).
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// Execute with typed arguments.
    async fn execute(&self, args: Self::Args) -> Result<Value, ToolError>;
}

#[async_trait]
impl<T: TypedTool> Tool for T {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description())
            .with_parameters(typed_tool_schema::<T::Args>())
    }

    fn validate_args(&self, _args: &Value) -> Result<(), ToolError> {
        Ok(())
    }

    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let typed: T::Args =
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
        TypedTool::execute(self, typed).await
    }
}

/// Generate a JSON Schema value for a `JsonSchema` type.
///
/// The `$schema` key is stripped; providers don't need it.
pub fn typed_tool_schema<T: JsonSchema>() -> Value {
    let mut v = serde_json::to_value(schemars::schema_for!(T))
        .unwrap_or_else(|_| serde_json::json!({"type": "object", "properties": {}}));
    if let Some(obj) = v.as_object_mut() {
        obj.remove("$schema");
    }
    v
}
