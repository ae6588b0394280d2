use super::models::Repository;
use super::Store;
use crate::error::Result;

impl Store {
    /// Bulk insert-or-ignore inside a single transaction, matching the
    /// original's `db.Transaction(...)`-wrapped per-row OnConflict DoNothing
    /// loop. `repos` is `(gitlab_id, name)` pairs.
    pub fn insert_repositories(&mut self, repos: &[(i64, String)]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO repositories (gitlab_id, name, processed) VALUES (?1, ?2, 0)",
            )?;
            for (gitlab_id, name) in repos {
                stmt.execute(rusqlite::params![gitlab_id, name])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn unprocessed_repositories(&self) -> Result<Vec<Repository>> {
        let mut stmt = self.conn().prepare(
            "SELECT r.id, r.gitlab_id, r.name, r.processed, g.base_url, g.api_token \
             FROM repositories r JOIN gitlabs g ON g.id = r.gitlab_id \
             WHERE r.processed = 0",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Repository {
                    id: row.get(0)?,
                    gitlab_id: row.get(1)?,
                    name: row.get(2)?,
                    processed: row.get::<_, i64>(3)? != 0,
                    gitlab_base_url: row.get(4)?,
                    gitlab_api_token: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn set_repository_processed(&self, id: i64) -> Result<()> {
        self.conn()
            .execute("UPDATE repositories SET processed = 1 WHERE id = ?1", [id])?;
        Ok(())
    }
}
