pub mod seed;

pub use seed::seed_library;

use crate::error::SetupError;
use anyhow::{Result, anyhow};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;

/// Maximum number of rows a query capability hands back.
pub const ROW_LIMIT: usize = 100;

/// A read-only handle on the SQLite file the tools inspect.
///
/// The connection is opened with `SQLITE_OPEN_READ_ONLY`, so even a statement
/// that slipped past the SELECT check cannot modify the data. One agent owns
/// one handle; the mutex only makes the handle shareable with the tool trait
/// objects, it does not make concurrent runs against it meaningful.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(SetupError::DatabaseMissing(path));
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| SetupError::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` with exclusive access to the connection. Only lock poisoning
    /// is reported through the outer result.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("database connection lock poisoned"))?;
        Ok(f(&conn))
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        self.with_connection(|conn| -> Result<Vec<String>> {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
            )?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(names)
        })?
    }

    pub fn has_table(&self, table: &str) -> Result<bool> {
        self.with_connection(|conn| -> Result<bool> {
            let found = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![table],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })?
    }

    /// Column `(name, declared type)` pairs in declaration order.
    pub fn table_columns(&self, table: &str) -> Result<Vec<(String, String)>> {
        self.with_connection(|conn| -> Result<Vec<(String, String)>> {
            let mut stmt = conn.prepare("SELECT name, type FROM pragma_table_info(?1)")?;
            let columns = stmt
                .query_map(params![table], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(columns)
        })?
    }

    pub fn row_count(&self, table: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        self.with_connection(|conn| -> Result<i64> {
            let count = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(count)
        })?
    }

    /// One `- table (col, col, ...)` line per table, as embedded in the
    /// system instruction.
    pub fn schema_summary(&self) -> Result<String> {
        let mut lines = Vec::new();
        for table in self.table_names()? {
            let columns: Vec<String> = self
                .table_columns(&table)?
                .into_iter()
                .map(|(name, _)| name)
                .collect();
            lines.push(format!("- {} ({})", table, columns.join(", ")));
        }
        Ok(lines.join("\n"))
    }
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::library;
    use tempfile::TempDir;

    #[test]
    fn open_missing_file_is_setup_error() {
        let tmp = TempDir::new().unwrap();
        let err = Database::open(tmp.path().join("nope.db")).err().unwrap();
        assert!(matches!(err, SetupError::DatabaseMissing(_)));
    }

    #[test]
    fn lists_tables_in_creation_order() {
        let (_tmp, db) = library();
        assert_eq!(
            db.table_names().unwrap(),
            vec!["authors", "books", "members", "loans"]
        );
    }

    #[test]
    fn schema_summary_lists_columns() {
        let (_tmp, db) = library();
        let summary = db.schema_summary().unwrap();
        assert!(summary.contains("- authors (author_id, name, country)"));
        assert!(summary.contains("- loans (loan_id, book_id, member_id, loan_date, return_date)"));
        assert_eq!(summary.lines().count(), 4);
    }

    #[test]
    fn table_lookup_and_counts() {
        let (_tmp, db) = library();
        assert!(db.has_table("books").unwrap());
        assert!(!db.has_table("patrons").unwrap());
        assert_eq!(db.row_count("books").unwrap(), 7);
        let columns = db.table_columns("members").unwrap();
        assert_eq!(columns[0], ("member_id".to_string(), "INTEGER".to_string()));
    }

    #[test]
    fn connection_rejects_writes() {
        let (_tmp, db) = library();
        let result = db
            .with_connection(|conn| conn.execute("DELETE FROM books", []))
            .unwrap();
        assert!(result.is_err());
        assert_eq!(db.row_count("books").unwrap(), 7);
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_identifier("books"), "\"books\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
