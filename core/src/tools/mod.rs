use crate::agent::ToolRegistry;
use crate::error::RegistryError;
use serde_json::{Map, Value};

pub mod describe_table;
pub mod list_tables;
pub mod query_database;

pub use describe_table::DescribeTableTool;
pub use list_tables::ListTablesTool;
pub use query_database::QueryDatabaseTool;

pub fn extract_string_arg(args: &Map<String, Value>, key: &str) -> anyhow::Result<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' parameter", key))
        .map(|s| s.to_string())
}

/// Registers the three read-only SQL capabilities.
pub fn register_sql_tools(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(Box::new(ListTablesTool))?;
    registry.register(Box::new(DescribeTableTool))?;
    registry.register(Box::new(QueryDatabaseTool::new()))?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::db::{Database, seed_library};
    use serde_json::{Map, Value};
    use tempfile::TempDir;

    pub fn library() -> (TempDir, Database) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("library.db");
        seed_library(&path).unwrap();
        let db = Database::open(&path).unwrap();
        (tmp, db)
    }

    pub fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}
