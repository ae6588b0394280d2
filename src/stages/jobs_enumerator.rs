//! Enumerates jobs on a confirmed Jenkins controller via `/api/json`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use crate::clients::http::probe_client;
use crate::error::Result;
use crate::pipeline::ProcessStep;
use crate::store::models::{Jenkins, JenkinsJob};
use crate::store::Store;

#[derive(Debug, Deserialize)]
struct JobsApiResponse {
    jobs: Vec<JobsApiResponseJob>,
}

#[derive(Debug, Deserialize)]
struct JobsApiResponseJob {
    name: String,
}

pub struct JobsEnumeratorStep;

#[async_trait]
impl ProcessStep for JobsEnumeratorStep {
    type Input = Jenkins;
    type Output = JenkinsJob;

    fn name(&self) -> &'static str {
        "jobs-enumerator"
    }

    async fn unprocessed_inputs(&self, store: &Store) -> Result<Vec<Jenkins>> {
        store.unprocessed_jenkins()
    }

    async fn process(&self, jenkins: &Jenkins) -> Result<Vec<JenkinsJob>> {
        let client = probe_client(Duration::from_secs(5))?;
        let resp = client
            .get(format!("{}/api/json", jenkins.base_url))
            .send()
            .await?;
        if !resp.status().is_success() {
            info!(jenkins = %jenkins.base_url, status = %resp.status(), "could not list jobs");
            return Ok(Vec::new());
        }
        let body: JobsApiResponse = resp.json().await.unwrap_or(JobsApiResponse { jobs: vec![] });

        Ok(body
            .jobs
            .into_iter()
            .map(|job| JenkinsJob {
                id: 0,
                jenkins_id: jenkins.id,
                url: format!("{}/job/{}", jenkins.base_url, job.name),
                name: job.name,
                processed: false,
            })
            .collect())
    }

    async fn save_result(&self, store: &mut Store, outputs: &[JenkinsJob]) -> Result<()> {
        for job in outputs {
            store.add_jenkins_job(job)?;
        }
        Ok(())
    }

    async fn set_processed(&self, store: &Store, jenkins: &Jenkins) -> Result<()> {
        store.set_jenkins_processed(jenkins.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_one_job_per_entry_with_a_job_url() {
        let server = crate::test_support::spawn(
            "HTTP/1.1 200 OK",
            r#"{"jobs": [{"name": "build"}, {"name": "deploy"}]}"#,
        );
        let jenkins = Jenkins {
            id: 9,
            instance_id: 1,
            anonymous_api: true,
            base_url: server.base_url.clone(),
            processed: false,
            script_access: false,
        };

        let step = JobsEnumeratorStep;
        let jobs = step.process(&jenkins).await.unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "build");
        assert_eq!(jobs[0].url, format!("{}/job/build", server.base_url));
        assert_eq!(jobs[0].jenkins_id, 9);
        assert_eq!(jobs[1].name, "deploy");
    }
}
