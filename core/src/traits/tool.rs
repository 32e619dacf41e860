use crate::db::Database;
use crate::format::Observation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The model-facing declaration of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
}

impl ToolSpec {
    /// Names listed under the schema's `required` key.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.parameters_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// A read-only capability invocable by name.
///
/// Execution is blocking: the loop waits on it before asking the model for
/// the next step. The database handle is injected by the caller and never
/// travels inside `args`.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameters_schema(&self) -> Value;

    fn execute(&self, db: &Database, args: &Map<String, Value>) -> anyhow::Result<Observation>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters_schema: self.parameters_schema(),
        }
    }
}
