//! Jenkins fingerprint probe: does this hostname serve a Jenkins
//! `/api/json`, and can we also write Groovy scripts against it?

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::clients::http::probe_client_no_redirect;
use crate::error::Result;
use crate::pipeline::ProcessStep;
use crate::store::models::{Instance, Jenkins};
use crate::store::Store;

pub struct JenkinsFilterStep;

impl JenkinsFilterStep {
    /// Probes `base_url` for a Jenkins controller. Split out of `process`
    /// so tests can point it at a local stub server instead of always
    /// prepending `https://`.
    async fn probe(&self, base_url: &str, instance_id: i64) -> Result<Vec<Jenkins>> {
        let client = probe_client_no_redirect(Duration::from_secs(5))?;
        let resp = match client.get(format!("{base_url}/api/json")).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(base_url, error = %e, "jenkins probe failed");
                return Ok(Vec::new());
            }
        };
        if !resp.status().is_success() {
            return Ok(Vec::new());
        }
        let is_jenkins = resp.headers().contains_key("x-jenkins");
        let body = resp.text().await.unwrap_or_default();
        if !is_jenkins {
            return Ok(Vec::new());
        }

        let script_access = client
            .get(format!("{base_url}/script"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false);

        Ok(vec![Jenkins {
            id: 0,
            instance_id,
            anonymous_api: body.len() > 2,
            base_url: base_url.to_string(),
            processed: false,
            script_access,
        }])
    }
}

#[async_trait]
impl ProcessStep for JenkinsFilterStep {
    type Input = Instance;
    type Output = Jenkins;

    fn name(&self) -> &'static str {
        "jenkins-filter"
    }

    async fn unprocessed_inputs(&self, store: &Store) -> Result<Vec<Instance>> {
        store.unprocessed_instances_for_jenkins()
    }

    async fn process(&self, instance: &Instance) -> Result<Vec<Jenkins>> {
        self.probe(&format!("https://{}", instance.name), instance.id)
            .await
    }

    async fn save_result(&self, store: &mut Store, outputs: &[Jenkins]) -> Result<()> {
        for j in outputs {
            store.add_jenkins(j)?;
        }
        Ok(())
    }

    async fn set_processed(&self, store: &Store, instance: &Instance) -> Result<()> {
        store.set_instance_processed(instance.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flags_a_jenkins_controller_via_its_header() {
        let server = crate::test_support::spawn_with_header(
            "HTTP/1.1 200 OK",
            "x-jenkins: 2.400",
            "{}",
        );
        let step = JenkinsFilterStep;
        let outputs = step.probe(&server.base_url, 7).await.unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].instance_id, 7);
        assert_eq!(outputs[0].base_url, server.base_url);
    }

    #[tokio::test]
    async fn ignores_a_host_without_the_jenkins_header() {
        let server = crate::test_support::spawn("HTTP/1.1 200 OK", "{}");
        let step = JenkinsFilterStep;
        let outputs = step.probe(&server.base_url, 1).await.unwrap();
        assert!(outputs.is_empty());
    }
}
