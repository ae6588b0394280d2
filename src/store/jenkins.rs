use super::models::Jenkins;
use super::Store;
use crate::error::Result;

impl Store {
    pub fn add_jenkins(&self, j: &Jenkins) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO jenkinses \
             (instance_id, anonymous_api, base_url, processed, script_access) \
             VALUES (?1, ?2, ?3, 0, ?4)",
            rusqlite::params![
                j.instance_id,
                j.anonymous_api as i64,
                j.base_url,
                j.script_access as i64
            ],
        )?;
        Ok(())
    }

    pub fn unprocessed_jenkins(&self) -> Result<Vec<Jenkins>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, instance_id, anonymous_api, base_url, processed, script_access \
             FROM jenkinses WHERE processed = 0",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Jenkins {
                    id: row.get(0)?,
                    instance_id: row.get(1)?,
                    anonymous_api: row.get::<_, i64>(2)? != 0,
                    base_url: row.get(3)?,
                    processed: row.get::<_, i64>(4)? != 0,
                    script_access: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn set_jenkins_processed(&self, id: i64) -> Result<()> {
        self.conn()
            .execute("UPDATE jenkinses SET processed = 1 WHERE id = ?1", [id])?;
        Ok(())
    }
}
