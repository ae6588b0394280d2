//! GitLab fingerprint probe: does this hostname serve a GitLab sign-in
//! page?

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::clients::http::probe_client;
use crate::error::Result;
use crate::pipeline::ProcessStep;
use crate::store::models::{GitLab, Instance};
use crate::store::Store;

const MAGIC_URL: &str = "/users/sign_in";
const MAGIC_STRING: &str = "<meta content=\"GitLab\" property=\"og:site_name\">";
const REGISTER_MAGIC_STRING: &str =
    "<a data-qa-selector=\"register_link\" href=\"/users/sign_up\">Register now</a>";

pub struct GitlabFilterStep;

impl GitlabFilterStep {
    /// Probes `base_url` for the GitLab sign-in page. Split out of
    /// `process` so tests can point it at a local stub server instead of
    /// always prepending `https://`.
    async fn probe(&self, base_url: &str, instance_id: i64) -> Result<Vec<GitLab>> {
        let client = probe_client(Duration::from_secs(5))?;
        let url = format!("{base_url}{MAGIC_URL}");
        let resp = match client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(base_url, error = %e, "gitlab probe failed");
                return Ok(Vec::new());
            }
        };
        if !resp.status().is_success() {
            warn!(base_url, status = %resp.status(), "no instance found");
            return Ok(Vec::new());
        }
        let body = resp.text().await.unwrap_or_default();
        if !body.contains(MAGIC_STRING) {
            warn!(base_url, "no magic string");
            return Ok(Vec::new());
        }
        Ok(vec![GitLab {
            id: 0,
            instance_id,
            allow_signup: body.contains(REGISTER_MAGIC_STRING),
            email: None,
            password: None,
            api_token: None,
            processed: false,
            base_url: base_url.to_string(),
        }])
    }
}

#[async_trait]
impl ProcessStep for GitlabFilterStep {
    type Input = Instance;
    type Output = GitLab;

    fn name(&self) -> &'static str {
        "gitlab-filter"
    }

    async fn unprocessed_inputs(&self, store: &Store) -> Result<Vec<Instance>> {
        store.unprocessed_instances_for_gitlab()
    }

    async fn process(&self, instance: &Instance) -> Result<Vec<GitLab>> {
        self.probe(&format!("https://{}", instance.name), instance.id)
            .await
    }

    async fn save_result(&self, store: &mut Store, outputs: &[GitLab]) -> Result<()> {
        for g in outputs {
            store.add_gitlab(g)?;
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
    async fn flags_a_gitlab_sign_in_page_with_registration_open() {
        let body = format!(
            "<html><head>{MAGIC_STRING}</head><body>{REGISTER_MAGIC_STRING}</body></html>"
        );
        let server = crate::test_support::spawn("HTTP/1.1 200 OK", Box::leak(body.into_boxed_str()));

        let step = GitlabFilterStep;
        let outputs = step.probe(&server.base_url, 42).await.unwrap();

        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].base_url, server.base_url);
        assert_eq!(outputs[0].instance_id, 42);
        assert!(outputs[0].allow_signup);
    }

    #[tokio::test]
    async fn ignores_a_host_without_the_magic_string() {
        let server = crate::test_support::spawn("HTTP/1.1 200 OK", "<html>not gitlab</html>");
        let step = GitlabFilterStep;
        let outputs = step.probe(&server.base_url, 1).await.unwrap();
        assert!(outputs.is_empty());
    }
}
