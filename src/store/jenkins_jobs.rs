use super::models::JenkinsJob;
use super::Store;
use crate::error::Result;

impl Store {
    pub fn add_jenkins_job(&self, job: &JenkinsJob) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO jenkins_jobs (jenkins_id, name, url, processed) \
             VALUES (?1, ?2, ?3, 0)",
            rusqlite::params![job.jenkins_id, job.name, job.url],
        )?;
        Ok(())
    }

    pub fn unprocessed_jenkins_jobs(&self) -> Result<Vec<JenkinsJob>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, jenkins_id, name, url, processed FROM jenkins_jobs WHERE processed = 0",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(JenkinsJob {
                    id: row.get(0)?,
                    jenkins_id: row.get(1)?,
                    name: row.get(2)?,
                    url: row.get(3)?,
                    processed: row.get::<_, i64>(4)? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn set_jenkins_job_processed(&self, id: i64) -> Result<()> {
        self.conn()
            .execute("UPDATE jenkins_jobs SET processed = 1 WHERE id = ?1", [id])?;
        Ok(())
    }
}
