use super::models::GitLab;
use super::Store;
use crate::error::Result;

impl Store {
    /// Insert-or-ignore on the `base_url` uniqueness constraint, matching
    /// the original's OnConflict-DoNothing semantics.
    pub fn add_gitlab(&self, g: &GitLab) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO gitlabs \
             (instance_id, allow_signup, email, password, api_token, processed, base_url) \
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            rusqlite::params![
                g.instance_id,
                g.allow_signup as i64,
                g.email,
                g.password,
                g.api_token,
                g.base_url
            ],
        )?;
        Ok(())
    }

    pub fn unprocessed_gitlabs(&self) -> Result<Vec<GitLab>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, instance_id, allow_signup, email, password, api_token, processed, base_url \
             FROM gitlabs WHERE processed = 0",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(GitLab {
                    id: row.get(0)?,
                    instance_id: row.get(1)?,
                    allow_signup: row.get::<_, i64>(2)? != 0,
                    email: row.get(3)?,
                    password: row.get(4)?,
                    api_token: row.get(5)?,
                    processed: row.get::<_, i64>(6)? != 0,
                    base_url: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn set_gitlab_processed(&self, id: i64) -> Result<()> {
        self.conn()
            .execute("UPDATE gitlabs SET processed = 1 WHERE id = ?1", [id])?;
        Ok(())
    }
}
