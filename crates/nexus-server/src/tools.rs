//! Tools exposed to the tool-calling endpoint.

use async_trait::async_trait;
use nexus_session::{Tool, ToolDescriptor, ToolError, TypedTool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Named set of tools advertised to the model.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its descriptor name.
    #[must_use]
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.descriptor().name, tool);
        self
    }

    /// Descriptors of all registered tools.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// Whether any tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate and execute a call by tool name.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.validate_args(&args)?;
        tool.execute(args).await
    }
}

/// The registry used by the demo: just the weather tool.
pub fn default_registry() -> ToolRegistry {
    ToolRegistry::new().with_tool(Arc::new(GetWeatherTool))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WeatherArgs {
    /// City or place to report the weather for.
    pub location: String,
}

/// Demo weather lookup.
///
/// Returns simulated conditions derived deterministically from the
/// location, so conversations are reproducible without a weather API.
pub struct GetWeatherTool;

#[async_trait]
impl TypedTool for GetWeatherTool {
    type Args = WeatherArgs;

    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather for a location"
    }

    async fn execute(&self, args: WeatherArgs) -> Result<Value, ToolError> {
        let location = args.location.trim();
        if location.is_empty() {
            return Err(ToolError::InvalidArguments("location is empty".into()));
        }

        let seed = location
            .to_lowercase()
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        const CONDITIONS: [&str; 5] = ["sunny", "partly cloudy", "overcast", "rainy", "windy"];
        let conditions = CONDITIONS[(seed % CONDITIONS.len() as u32) as usize];
        let temperature = 8 + (seed % 21) as i64;

        Ok(json!({
            "location": location,
            "temperature": temperature,
            "unit": "celsius",
            "conditions": conditions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn weather_is_deterministic_per_location() {
        let a = ToolRegistry::new()
            .with_tool(Arc::new(GetWeatherTool))
            .execute("get_weather", json!({"location": "Berlin"}))
            .await
            .unwrap();
        let b = default_registry()
            .execute("get_weather", json!({"location": "Berlin"}))
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a["location"], "Berlin");
        assert_eq!(a["unit"], "celsius");
        assert!(a["temperature"].as_i64().unwrap() >= 8);
    }

    #[tokio::test]
    async fn unknown_tool_is_rejected() {
        let err = default_registry()
            .execute("get_stock_price", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn bad_args_are_rejected() {
        let err = default_registry()
            .execute("get_weather", json!({"location": 7}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn registry_advertises_descriptors() {
        let descriptors = default_registry().descriptors();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "get_weather");
        assert!(descriptors[0].parameters["properties"]
            .get("location")
            .is_some());
    }
}
