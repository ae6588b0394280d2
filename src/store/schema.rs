//! Hand-written schema, applied idempotently at `Store::open` time.
//!
//! There is no ORM doing auto-migration here, so every uniqueness
//! constraint the original entity model implies is spelled out explicitly.

use rusqlite::Connection;

const CURRENT_VERSION: i64 = 1;

pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS instances (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            idx INTEGER NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_instances_name ON instances(name);
        CREATE INDEX IF NOT EXISTS idx_instances_processed ON instances(processed);

        CREATE TABLE IF NOT EXISTS gitlabs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instance_id INTEGER NOT NULL REFERENCES instances(id),
            allow_signup INTEGER NOT NULL DEFAULT 0,
            email TEXT,
            password TEXT,
            api_token TEXT,
            processed INTEGER NOT NULL DEFAULT 0,
            base_url TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_gitlabs_processed ON gitlabs(processed);

        CREATE TABLE IF NOT EXISTS jenkinses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instance_id INTEGER NOT NULL REFERENCES instances(id),
            anonymous_api INTEGER NOT NULL DEFAULT 0,
            base_url TEXT NOT NULL UNIQUE,
            processed INTEGER NOT NULL DEFAULT 0,
            script_access INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_jenkinses_processed ON jenkinses(processed);

        CREATE TABLE IF NOT EXISTS jenkins_jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            jenkins_id INTEGER NOT NULL REFERENCES jenkinses(id),
            name TEXT NOT NULL,
            url TEXT NOT NULL UNIQUE,
            processed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_jenkins_jobs_processed ON jenkins_jobs(processed);

        CREATE TABLE IF NOT EXISTS repositories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            gitlab_id INTEGER NOT NULL REFERENCES gitlabs(id),
            name TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(gitlab_id, name)
        );
        CREATE INDEX IF NOT EXISTS idx_repositories_processed ON repositories(processed);

        CREATE TABLE IF NOT EXISTS findings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            repository_id INTEGER NOT NULL REFERENCES repositories(id),
            secret TEXT NOT NULL,
            commit_sha TEXT NOT NULL,
            start_line INTEGER NOT NULL,
            end_line INTEGER NOT NULL,
            file TEXT NOT NULL,
            url TEXT NOT NULL,
            commit_date TEXT,
            rule TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(repository_id, secret)
        );
        CREATE INDEX IF NOT EXISTS idx_findings_processed ON findings(processed);
        CREATE INDEX IF NOT EXISTS idx_findings_rule ON findings(rule);

        CREATE TABLE IF NOT EXISTS jenkins_findings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            job_id INTEGER NOT NULL REFERENCES jenkins_jobs(id),
            secret TEXT NOT NULL,
            start_line INTEGER NOT NULL,
            end_line INTEGER NOT NULL,
            file TEXT NOT NULL,
            url TEXT NOT NULL,
            rule TEXT NOT NULL,
            processed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_jenkins_findings_processed ON jenkins_findings(processed);
        CREATE INDEX IF NOT EXISTS idx_jenkins_findings_rule ON jenkins_findings(rule);

        CREATE TABLE IF NOT EXISTS aws_keys (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            access_key TEXT NOT NULL UNIQUE,
            secret_key TEXT NOT NULL,
            finding_id INTEGER REFERENCES findings(id),
            jenkins_finding_id INTEGER REFERENCES jenkins_findings(id),
            arn TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_migrations(version) VALUES (?1)",
        [CURRENT_VERSION],
    )?;
    Ok(())
}
