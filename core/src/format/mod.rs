//! Rendering of tool results into the text block the model reads.

use std::fmt;

pub const NO_RESULT: &str = "No result returned.";

/// A single value inside a tabular result.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(usize),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v:?}"),
            Self::Text(v) => write!(f, "{}", escape_control(v)),
            Self::Blob(len) => write!(f, "<blob {len} bytes>"),
        }
    }
}

/// Keeps every cell on one physical line of the rendered table.
fn escape_control(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c if c.is_control() => escaped.extend(c.escape_unicode()),
            c => escaped.push(c),
        }
    }
    escaped
}

impl From<rusqlite::types::ValueRef<'_>> for Cell {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Integer(v),
            ValueRef::Real(v) => Self::Real(v),
            ValueRef::Text(bytes) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.len()),
        }
    }
}

/// The raw result of one tool dispatch. It is formatted immediately and
/// only the text survives into the conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<Cell>>,
    },
    List(Vec<String>),
    Text(String),
    Error(String),
    Empty,
}

impl Observation {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

pub fn format_observation(observation: &Observation) -> String {
    match observation {
        Observation::Empty => NO_RESULT.to_string(),
        Observation::Table { columns, rows } => format_table(columns, rows),
        Observation::List(items) => items.join("\n"),
        Observation::Text(text) | Observation::Error(text) => text.clone(),
    }
}

fn format_table(columns: &[String], rows: &[Vec<Cell>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (idx, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(idx) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }

    let mut lines = Vec::with_capacity(cells.len() + 2);
    lines.push(format_line(columns, &widths));
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &cells {
        lines.push(format_line(row, &widths));
    }

    lines.join("\n")
}

fn format_line(values: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let pad = width.saturating_sub(value.chars().count());
            format!("{}{}", value, " ".repeat(pad))
        })
        .collect();
    padded.join(" | ").trim_end().to_string()
}
