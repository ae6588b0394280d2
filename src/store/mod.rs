//! The persistent relational store (C1).
//!
//! A single embedded SQLite file. Every caller opens its own connection —
//! producer, workers, and consumer of a [`crate::pipeline::executor::Fan`]
//! each call [`Store::open`] independently rather than sharing one
//! connection across threads.

pub mod aws_keys;
pub mod findings;
pub mod gitlab;
pub mod instances;
pub mod jenkins;
pub mod jenkins_jobs;
pub mod models;
pub mod repositories;
mod schema;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating if needed) the database file at `path`, applying
    /// pragmas for WAL concurrency and running migrations. Cheap and
    /// idempotent — safe to call once per role per run.
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 30000;
        "#,
        )?;
        schema::migrate(&conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("instances.db")).unwrap();
        let mut stmt = store
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();
        for expected in [
            "instances",
            "gitlabs",
            "jenkinses",
            "jenkins_jobs",
            "repositories",
            "findings",
            "jenkins_findings",
            "aws_keys",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {expected}");
        }
    }

    #[test]
    fn open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("instances.db");
        let _a = Store::open(&db_path).unwrap();
        let _b = Store::open(&db_path).unwrap();
    }
}
