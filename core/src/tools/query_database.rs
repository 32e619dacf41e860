use crate::db::{Database, ROW_LIMIT};
use crate::format::{Cell, Observation};
use crate::tools::extract_string_arg;
use crate::traits::Tool;
use regex::Regex;
use rusqlite::Connection;
use serde_json::{Map, Value, json};
use std::sync::LazyLock;
use tracing::{debug, warn};

pub const SELECT_ONLY: &str = "Error: Only SELECT queries are allowed.";
pub const NO_ROWS: &str = "Query executed successfully but returned no results.";

static LIMIT_CLAUSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\blimit\b").unwrap());

pub struct QueryDatabaseTool {
    row_limit: usize,
}

impl Default for QueryDatabaseTool {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryDatabaseTool {
    pub fn new() -> Self {
        Self {
            row_limit: ROW_LIMIT,
        }
    }

    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = limit.max(1);
        self
    }
}

impl Tool for QueryDatabaseTool {
    fn name(&self) -> &str {
        "query_database"
    }

    fn description(&self) -> &str {
        "Executes a read-only SELECT query (limited to 100 rows)."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The SELECT query to execute."
                }
            },
            "required": ["query"]
        })
    }

    fn execute(&self, db: &Database, args: &Map<String, Value>) -> anyhow::Result<Observation> {
        let query = extract_string_arg(args, "query")?;

        if !is_select(&query) {
            warn!(query = %query, "rejected non-SELECT statement");
            return Ok(Observation::error(SELECT_ONLY));
        }

        let statement = enforce_row_limit(&query, self.row_limit);
        debug!(statement = %statement, "executing query");

        let result = db.with_connection(|conn| run_select(conn, &statement, self.row_limit))?;
        Ok(result.unwrap_or_else(|e| Observation::error(format!("SQL Error: {}", e))))
    }
}

fn is_select(query: &str) -> bool {
    query.trim_start().to_lowercase().starts_with("select")
}

/// Appends `LIMIT n` when the statement carries no limit clause of its own.
pub fn enforce_row_limit(query: &str, limit: usize) -> String {
    let trimmed = query.trim();
    if LIMIT_CLAUSE.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("{} LIMIT {}", trimmed.trim_end_matches(';').trim_end(), limit)
    }
}

fn run_select(conn: &Connection, sql: &str, limit: usize) -> rusqlite::Result<Observation> {
    let mut stmt = conn.prepare(sql)?;
    if !stmt.readonly() {
        return Ok(Observation::error(SELECT_ONLY));
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();

    // A caller-supplied LIMIT may exceed the ceiling; truncate rather than fail.
    while records.len() < limit {
        let Some(row) = rows.next()? else {
            break;
        };
        let record = (0..columns.len())
            .map(|idx| row.get_ref(idx).map(Cell::from))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        records.push(record);
    }

    if records.is_empty() {
        return Ok(Observation::Text(NO_ROWS.to_string()));
    }

    Ok(Observation::Table {
        columns,
        rows: records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{args, library};

    fn query(db: &Database, sql: &str) -> Observation {
        QueryDatabaseTool::new()
            .execute(db, &args(json!({ "query": sql })))
            .unwrap()
    }

    fn row_count(observation: &Observation) -> usize {
        match observation {
            Observation::Table { rows, .. } => rows.len(),
            other => panic!("expected a table, got {:?}", other),
        }
    }

    #[test]
    fn select_returns_table() {
        let (_tmp, db) = library();
        let result = query(&db, "SELECT title, price FROM books WHERE book_id = 3");
        assert_eq!(
            result,
            Observation::Table {
                columns: vec!["title".into(), "price".into()],
                rows: vec![vec![Cell::Text("Kindred".into()), Cell::Real(11.5)]],
            }
        );
    }

    #[test]
    fn caps_rows_without_error() {
        let (_tmp, db) = library();
        // 7 * 7 * 7 = 343 rows before the cap
        let result = query(&db, "SELECT a.book_id FROM books a, books b, books c");
        assert_eq!(row_count(&result), ROW_LIMIT);
    }

    #[test]
    fn caps_rows_above_an_explicit_limit() {
        let (_tmp, db) = library();
        let result = query(&db, "SELECT a.book_id FROM books a, books b, books c LIMIT 300");
        assert_eq!(row_count(&result), ROW_LIMIT);
    }

    #[test]
    fn custom_row_limit() {
        let (_tmp, db) = library();
        let result = QueryDatabaseTool::new()
            .with_row_limit(2)
            .execute(&db, &args(json!({"query": "SELECT * FROM authors"})))
            .unwrap();
        assert_eq!(row_count(&result), 2);
    }

    #[test]
    fn rejects_non_select_and_leaves_data_alone() {
        let (_tmp, db) = library();
        assert_eq!(query(&db, "DELETE FROM books"), Observation::error(SELECT_ONLY));
        assert_eq!(
            query(&db, "  drop table loans"),
            Observation::error(SELECT_ONLY)
        );
        assert_eq!(db.row_count("books").unwrap(), 7);
        assert!(db.has_table("loans").unwrap());
    }

    #[test]
    fn empty_result_is_reported() {
        let (_tmp, db) = library();
        let result = query(&db, "SELECT * FROM books WHERE published_year > 3000");
        assert_eq!(result, Observation::Text(NO_ROWS.into()));
    }

    #[test]
    fn sql_failures_become_error_text() {
        let (_tmp, db) = library();
        let result = query(&db, "SELECT nope FROM books");
        match result {
            Observation::Error(text) => assert!(text.starts_with("SQL Error:"), "{}", text),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn row_limit_injection() {
        assert_eq!(
            enforce_row_limit("SELECT * FROM books;", 100),
            "SELECT * FROM books LIMIT 100"
        );
        assert_eq!(
            enforce_row_limit("select * from books limit 5", 100),
            "select * from books limit 5"
        );
        assert_eq!(
            enforce_row_limit("SELECT limit_x FROM t", 10),
            "SELECT limit_x FROM t LIMIT 10"
        );
    }
}
