//! Instance rows: hostnames mined from CT logs, before they're known to be
//! GitLab or Jenkins.

use super::models::{Certificate, Instance};
use super::Store;
use crate::error::Result;

impl Store {
    /// `(min_index, max_index)` of stored instances, or a sentinel midpoint
    /// range when the table is empty — matching the original's
    /// `math.MaxInt64/2` sentinel so the CT follower's catch-up/backfill
    /// arithmetic has a well-defined starting point on a fresh database.
    pub fn index_range(&self) -> Result<(i64, i64)> {
        let sentinel = i64::MAX / 2;
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM instances", [], |r| r.get(0))?;
        if count == 0 {
            return Ok((sentinel, sentinel));
        }
        let min: i64 = self
            .conn()
            .query_row("SELECT MIN(idx) FROM instances", [], |r| r.get(0))?;
        let max: i64 = self
            .conn()
            .query_row("SELECT MAX(idx) FROM instances", [], |r| r.get(0))?;
        Ok((min, max))
    }

    /// Flattens each certificate's subjects into instance rows inside a
    /// single transaction.
    pub fn store_certificates(&mut self, certs: &[Certificate]) -> Result<()> {
        let tx = self.conn_mut().transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO instances (name, idx, processed) VALUES (?1, ?2, 0)",
            )?;
            for cert in certs {
                for subject in &cert.subjects {
                    stmt.execute(rusqlite::params![subject, cert.index])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Candidate instances for the GitLab filter stage. The range predicate
    /// is intentionally the brittle lexicographic trick from the original:
    /// `name` between `'gitlab.'` and `'gitlab/'` picks up any hostname
    /// starting with `gitlab.` (since `.` < any letter < `/` in ASCII),
    /// while excluding `gitlab.git`-prefixed noise. Do not "fix" this into a
    /// `LIKE` pattern — the ordering is load-bearing.
    pub fn unprocessed_instances_for_gitlab(&self) -> Result<Vec<Instance>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, idx, processed FROM instances \
             WHERE processed = 0 AND name BETWEEN 'gitlab.' AND 'gitlab/' \
             AND name NOT LIKE 'gitlab.git%'",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Instance {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    index: row.get(2)?,
                    processed: row.get::<_, i64>(3)? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Candidate instances for the Jenkins filter stage, same brittle
    /// range-predicate trick, preserved as-is.
    pub fn unprocessed_instances_for_jenkins(&self) -> Result<Vec<Instance>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, idx, processed FROM instances \
             WHERE processed = 0 AND name BETWEEN 'jenkins.' AND 'jenkins/'",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Instance {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    index: row.get(2)?,
                    processed: row.get::<_, i64>(3)? != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn set_instance_processed(&self, id: i64) -> Result<()> {
        self.conn()
            .execute("UPDATE instances SET processed = 1 WHERE id = ?1", [id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn open_memory() -> Store {
        Store::open(":memory:").expect("open in-memory store")
    }

    #[test]
    fn index_range_is_a_sentinel_midpoint_when_empty() {
        let store = open_memory();
        let (min, max) = store.index_range().unwrap();
        assert_eq!(min, i64::MAX / 2);
        assert_eq!(max, i64::MAX / 2);
    }

    #[test]
    fn index_range_tracks_min_and_max_after_inserts() {
        let mut store = open_memory();
        store
            .store_certificates(&[
                Certificate {
                    subjects: vec!["a.com".into()],
                    index: 5,
                },
                Certificate {
                    subjects: vec!["b.com".into()],
                    index: 1,
                },
                Certificate {
                    subjects: vec!["c.com".into()],
                    index: 9,
                },
            ])
            .unwrap();
        let (min, max) = store.index_range().unwrap();
        assert_eq!(min, 1);
        assert_eq!(max, 9);
    }

    #[test]
    fn gitlab_predicate_matches_gitlab_dot_hosts_and_excludes_git_prefixed_noise() {
        let mut store = open_memory();
        store
            .store_certificates(&[Certificate {
                subjects: vec![
                    "gitlab.example.test".into(),
                    "gitlab.git-mirror.test".into(),
                    "not-gitlab.example.test".into(),
                    "jenkins.example.test".into(),
                ],
                index: 0,
            }])
            .unwrap();
        let names: Vec<String> = store
            .unprocessed_instances_for_gitlab()
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["gitlab.example.test".to_string()]);
    }

    #[test]
    fn jenkins_predicate_matches_jenkins_dot_hosts_only() {
        let mut store = open_memory();
        store
            .store_certificates(&[Certificate {
                subjects: vec![
                    "jenkins.example.test".into(),
                    "gitlab.example.test".into(),
                ],
                index: 0,
            }])
            .unwrap();
        let names: Vec<String> = store
            .unprocessed_instances_for_jenkins()
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["jenkins.example.test".to_string()]);
    }

    #[test]
    fn set_instance_processed_is_monotonic_and_idempotent() {
        let mut store = open_memory();
        store
            .store_certificates(&[Certificate {
                subjects: vec!["gitlab.example.test".into()],
                index: 0,
            }])
            .unwrap();
        let instance = store.unprocessed_instances_for_gitlab().unwrap().remove(0);

        assert_eq!(store.unprocessed_instances_for_gitlab().unwrap().len(), 1);
        store.set_instance_processed(instance.id).unwrap();
        assert_eq!(store.unprocessed_instances_for_gitlab().unwrap().len(), 0);

        // Calling it again must not error and must not resurrect the row.
        store.set_instance_processed(instance.id).unwrap();
        assert_eq!(store.unprocessed_instances_for_gitlab().unwrap().len(), 0);
    }
}
