use crate::db::Database;
use crate::format::Observation;
use crate::tools::extract_string_arg;
use crate::traits::Tool;
use serde_json::{Map, Value, json};

pub struct DescribeTableTool;

impl Tool for DescribeTableTool {
    fn name(&self) -> &str {
        "describe_table"
    }

    fn description(&self) -> &str {
        "Describes a table's schema and row count."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "The name of the table to describe."
                }
            },
            "required": ["table_name"]
        })
    }

    fn execute(&self, db: &Database, args: &Map<String, Value>) -> anyhow::Result<Observation> {
        let table = extract_string_arg(args, "table_name")?;

        if !db.has_table(&table)? {
            return Ok(Observation::error(format!(
                "Error: Table '{}' not found. Use list_tables() to check available tables.",
                table
            )));
        }

        let columns: Vec<String> = db
            .table_columns(&table)?
            .into_iter()
            .map(|(name, kind)| format!("{} ({})", name, kind))
            .collect();
        let rows = db.row_count(&table)?;

        Ok(Observation::Text(format!(
            "Table '{}' has {} rows. Columns: {}",
            table,
            rows,
            columns.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, library};

    #[test]
    fn describes_known_table() {
        let (_tmp, db) = library();
        let result = DescribeTableTool
            .execute(&db, &args(json!({"table_name": "authors"})))
            .unwrap();
        assert_eq!(
            result,
            Observation::Text(
                "Table 'authors' has 5 rows. Columns: author_id (INTEGER), name (TEXT), country (TEXT)"
                    .into()
            )
        );
    }

    #[test]
    fn unknown_table_is_error_text() {
        let (_tmp, db) = library();
        let result = DescribeTableTool
            .execute(&db, &args(json!({"table_name": "patrons"})))
            .unwrap();
        assert_eq!(
            result,
            Observation::error(
                "Error: Table 'patrons' not found. Use list_tables() to check available tables."
            )
        );
    }

    #[test]
    fn missing_argument_fails() {
        let (_tmp, db) = library();
        assert!(DescribeTableTool.execute(&db, &Map::new()).is_err());
    }
}
