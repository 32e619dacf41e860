use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use std::path::Path;
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE authors (
    author_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    country TEXT
);

CREATE TABLE books (
    book_id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    author_id INTEGER NOT NULL,
    genre TEXT,
    published_year INTEGER,
    price NUMERIC(10, 2) NOT NULL,
    FOREIGN KEY (author_id) REFERENCES authors (author_id)
);

CREATE TABLE members (
    member_id INTEGER PRIMARY KEY,
    full_name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    city TEXT,
    joined_on TEXT NOT NULL
);

CREATE TABLE loans (
    loan_id INTEGER PRIMARY KEY,
    book_id INTEGER NOT NULL,
    member_id INTEGER NOT NULL,
    loan_date TEXT NOT NULL,
    return_date TEXT,
    FOREIGN KEY (book_id) REFERENCES books (book_id),
    FOREIGN KEY (member_id) REFERENCES members (member_id)
);
";

const AUTHORS: &[(i64, &str, &str)] = &[
    (1, "Haruki Murakami", "Japan"),
    (2, "Octavia E. Butler", "United States"),
    (3, "Chimamanda Ngozi Adichie", "Nigeria"),
    (4, "Neil Gaiman", "United Kingdom"),
    (5, "Isabel Allende", "Chile"),
];

const BOOKS: &[(i64, &str, i64, &str, i64, f64)] = &[
    (1, "Kafka on the Shore", 1, "Magical Realism", 2002, 12.99),
    (2, "Norwegian Wood", 1, "Fiction", 1987, 10.99),
    (3, "Kindred", 2, "Science Fiction", 1979, 11.50),
    (4, "Parable of the Sower", 2, "Science Fiction", 1993, 13.25),
    (5, "Americanah", 3, "Fiction", 2013, 14.75),
    (6, "Neverwhere", 4, "Fantasy", 1996, 9.99),
    (7, "The House of the Spirits", 5, "Magical Realism", 1982, 12.50),
];

const MEMBERS: &[(i64, &str, &str, &str, &str)] = &[
    (1, "Alex Rivera", "alex.rivera@example.com", "New York", "2024-01-15"),
    (2, "Priya Desai", "priya.desai@example.com", "San Francisco", "2024-02-10"),
    (3, "Liam O'Connor", "liam.oconnor@example.com", "Chicago", "2024-03-05"),
    (4, "Sofia Martins", "sofia.martins@example.com", "Austin", "2024-04-18"),
    (5, "Mei Chen", "mei.chen@example.com", "Seattle", "2024-05-09"),
];

const LOANS: &[(i64, i64, i64, &str, Option<&str>)] = &[
    (1, 1, 1, "2024-06-01", Some("2024-06-14")),
    (2, 3, 2, "2024-06-05", Some("2024-06-19")),
    (3, 4, 3, "2024-06-10", None),
    (4, 6, 4, "2024-06-12", Some("2024-06-26")),
    (5, 2, 5, "2024-06-15", None),
    (6, 5, 1, "2024-06-20", None),
];

/// Recreates the demo library database at `path`, replacing any existing file.
pub fn seed_library(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing database {}", path.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to create database {}", path.display()))?;
    conn.execute_batch(SCHEMA)
        .context("Failed to create library schema")?;

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare("INSERT INTO authors VALUES (?1, ?2, ?3)")?;
        for (id, name, country) in AUTHORS {
            stmt.execute(params![id, name, country])?;
        }

        let mut stmt = tx.prepare("INSERT INTO books VALUES (?1, ?2, ?3, ?4, ?5, ?6)")?;
        for (id, title, author_id, genre, year, price) in BOOKS {
            stmt.execute(params![id, title, author_id, genre, year, price])?;
        }

        let mut stmt = tx.prepare("INSERT INTO members VALUES (?1, ?2, ?3, ?4, ?5)")?;
        for (id, name, email, city, joined) in MEMBERS {
            stmt.execute(params![id, name, email, city, joined])?;
        }

        let mut stmt = tx.prepare("INSERT INTO loans VALUES (?1, ?2, ?3, ?4, ?5)")?;
        for (id, book_id, member_id, loaned, returned) in LOANS {
            stmt.execute(params![id, book_id, member_id, loaned, returned])?;
        }
    }
    tx.commit().context("Failed to populate library database")?;

    info!(path = %path.display(), "library database created");
    Ok(())
}
