use crate::db::Database;
use crate::error::RegistryError;
use crate::format::Observation;
use crate::traits::{Tool, ToolSpec};
use serde_json::{Map, Value};
use tracing::warn;

struct Registration {
    spec: ToolSpec,
    tool: Box<dyn Tool>,
}

/// One table of registrations backs both the advertised specs and the
/// dispatch lookup, so the two views cannot drift apart.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Registration>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), RegistryError> {
        let spec = tool.spec();
        if self.contains(&spec.name) {
            return Err(RegistryError::DuplicateTool(spec.name));
        }
        self.entries.push(Registration { spec, tool });
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.spec.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.spec.name.as_str()).collect()
    }

    pub fn get_specs(&self) -> Vec<ToolSpec> {
        self.entries.iter().map(|e| e.spec.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs a registered capability against `db`.
    ///
    /// Only an unregistered name is an error; anything the capability itself
    /// reports comes back as an [`Observation::Error`].
    pub fn dispatch(
        &self,
        name: &str,
        args: &Map<String, Value>,
        db: &Database,
    ) -> Result<Observation, RegistryError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.spec.name == name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;

        match entry.tool.execute(db, args) {
            Ok(observation) => Ok(observation),
            Err(e) => {
                warn!(tool = name, error = %e, "tool execution failed");
                Ok(Observation::error(format!("Tool error: {}", e)))
            }
        }
    }
}
