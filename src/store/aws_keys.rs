use super::models::AWSKey;
use super::Store;
use crate::error::Result;

impl Store {
    pub fn add_aws_keys(&mut self, keys: &[AWSKey]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO aws_keys \
                 (access_key, secret_key, finding_id, jenkins_finding_id, arn) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for k in keys {
                stmt.execute(rusqlite::params![
                    k.access_key,
                    k.secret_key,
                    k.finding_id,
                    k.jenkins_finding_id,
                    k.arn,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
