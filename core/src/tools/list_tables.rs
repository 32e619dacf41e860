use crate::db::Database;
use crate::format::Observation;
use crate::traits::Tool;
use serde_json::{Map, Value, json};

pub struct ListTablesTool;

impl Tool for ListTablesTool {
    fn name(&self) -> &str {
        "list_tables"
    }

    fn description(&self) -> &str {
        "Lists all tables in the connected SQLite database."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    fn execute(&self, db: &Database, _args: &Map<String, Value>) -> anyhow::Result<Observation> {
        Ok(Observation::List(db.table_names()?))
    }
}
