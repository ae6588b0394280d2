use super::models::{Finding, JenkinsFinding};
use super::Store;
use crate::error::Result;

impl Store {
    /// Insert-or-ignore on the `(repository_id, secret)` uniqueness
    /// constraint: the scanner already dedups findings within one run, this
    /// is a second layer against the same secret being logged again across
    /// runs of the same repository.
    pub fn log_findings(&mut self, findings: &[Finding]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO findings \
                 (repository_id, secret, commit_sha, start_line, end_line, file, url, commit_date, rule, processed) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)",
            )?;
            for f in findings {
                stmt.execute(rusqlite::params![
                    f.repository_id,
                    f.secret,
                    f.commit,
                    f.start_line,
                    f.end_line,
                    f.file,
                    f.url,
                    f.commit_date,
                    f.rule,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn save_jenkins_findings(&mut self, findings: &[JenkinsFinding]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO jenkins_findings \
                 (job_id, secret, start_line, end_line, file, url, rule, processed) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
            )?;
            for f in findings {
                stmt.execute(rusqlite::params![
                    f.job_id, f.secret, f.start_line, f.end_line, f.file, f.url, f.rule,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn set_finding_processed(&self, id: i64) -> Result<()> {
        self.conn()
            .execute("UPDATE findings SET processed = 1 WHERE id = ?1", [id])?;
        Ok(())
    }

    pub fn set_jenkins_finding_processed(&self, id: i64) -> Result<()> {
        self.conn().execute(
            "UPDATE jenkins_findings SET processed = 1 WHERE id = ?1",
            [id],
        )?;
        Ok(())
    }

    /// Candidate findings for AWS key validation. The filter preserves the
    /// original's exact exclusion list verbatim: it is tuned to the false
    /// positives the regex-based `aws-access-token` rule produces against
    /// real-world repositories (glTF binary blobs, Jupyter notebook
    /// payloads, generic JSON, one specific noisy dataset file, and
    /// all-`A` placeholder strings), plus a hard cap on how deep into a
    /// file a match is trusted.
    pub fn unprocessed_aws_findings(&self) -> Result<Vec<Finding>> {
        let mut stmt = self.conn().prepare(
            "SELECT f.id, f.repository_id, f.secret, f.commit_sha, f.start_line, f.end_line, \
                    f.file, f.url, f.commit_date, f.rule, f.processed, r.name, g.base_url \
             FROM findings f \
             JOIN repositories r ON r.id = f.repository_id \
             JOIN gitlabs g ON g.id = r.gitlab_id \
             WHERE f.processed = 0 \
               AND f.rule = 'aws-access-token' \
               AND f.file NOT LIKE '%gltf' \
               AND f.file NOT LIKE '%ipynb' \
               AND f.file NOT LIKE '%json' \
               AND f.file NOT LIKE '%UPID_sequences_human.json' \
               AND f.secret NOT LIKE '%AAAAAA%' \
               AND f.start_line < 1000",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Finding {
                    id: row.get(0)?,
                    repository_id: row.get(1)?,
                    secret: row.get(2)?,
                    commit: row.get(3)?,
                    start_line: row.get(4)?,
                    end_line: row.get(5)?,
                    file: row.get(6)?,
                    url: row.get(7)?,
                    commit_date: row.get(8)?,
                    rule: row.get(9)?,
                    processed: row.get::<_, i64>(10)? != 0,
                    repo_name: row.get(11)?,
                    gitlab_base_url: row.get(12)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Same filter, applied to Jenkins build-log findings.
    pub fn unprocessed_jenkins_aws_findings(&self) -> Result<Vec<JenkinsFinding>> {
        let mut stmt = self.conn().prepare(
            "SELECT jf.id, jf.job_id, jf.secret, jf.start_line, jf.end_line, jf.file, jf.url, \
                    jf.rule, jf.processed, jj.url \
             FROM jenkins_findings jf \
             JOIN jenkins_jobs jj ON jj.id = jf.job_id \
             WHERE jf.processed = 0 \
               AND jf.rule = 'aws-access-token' \
               AND jf.file NOT LIKE '%gltf' \
               AND jf.file NOT LIKE '%ipynb' \
               AND jf.file NOT LIKE '%json' \
               AND jf.file NOT LIKE '%UPID_sequences_human.json' \
               AND jf.secret NOT LIKE '%AAAAAA%' \
               AND jf.start_line < 1000",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(JenkinsFinding {
                    id: row.get(0)?,
                    job_id: row.get(1)?,
                    secret: row.get(2)?,
                    start_line: row.get(3)?,
                    end_line: row.get(4)?,
                    file: row.get(5)?,
                    url: row.get(6)?,
                    rule: row.get(7)?,
                    processed: row.get::<_, i64>(8)? != 0,
                    job_url: row.get(9)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
