//! Enumerates every repository visible to a GitLab instance's API token via
//! `GET /api/v4/projects`, following GitLab's `X-Next-Page` pagination
//! header until it's empty.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::Result;
use crate::pipeline::ProcessStep;
use crate::store::models::GitLab;
use crate::store::Store;

pub struct NewRepository {
    pub gitlab_id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct Project {
    path_with_namespace: String,
}

pub struct RepoEnumeratorStep;

#[async_trait]
impl ProcessStep for RepoEnumeratorStep {
    type Input = GitLab;
    type Output = NewRepository;

    fn name(&self) -> &'static str {
        "repository-enumerator"
    }

    async fn unprocessed_inputs(&self, store: &Store) -> Result<Vec<GitLab>> {
        store.unprocessed_gitlabs()
    }

    async fn process(&self, gitlab: &GitLab) -> Result<Vec<NewRepository>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        let mut repos = Vec::new();
        let mut page = 1u32;
        loop {
            let mut req = client.get(format!(
                "{}/projects?order_by=name&per_page=100&page={}",
                gitlab.api_url(),
                page
            ));
            if let Some(token) = &gitlab.api_token {
                req = req.header("PRIVATE-TOKEN", token);
            }
            let resp = req.send().await?;
            if !resp.status().is_success() {
                break;
            }
            let next_page = resp
                .headers()
                .get("x-next-page")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u32>().ok());

            let projects: Vec<Project> = resp.json().await.unwrap_or_default();
            for project in projects {
                repos.push(NewRepository {
                    gitlab_id: gitlab.id,
                    name: project.path_with_namespace,
                });
            }

            match next_page {
                Some(p) if p != 0 => page = p,
                _ => break,
            }
        }
        Ok(repos)
    }

    async fn save_result(&self, store: &mut Store, outputs: &[NewRepository]) -> Result<()> {
        let pairs: Vec<(i64, String)> = outputs
            .iter()
            .map(|r| (r.gitlab_id, r.name.clone()))
            .collect();
        store.insert_repositories(&pairs)
    }

    async fn set_processed(&self, store: &Store, gitlab: &GitLab) -> Result<()> {
        store.set_gitlab_processed(gitlab.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collects_projects_from_a_single_unpaginated_response() {
        let server = crate::test_support::spawn(
            "HTTP/1.1 200 OK",
            r#"[{"path_with_namespace": "group/one"}, {"path_with_namespace": "group/two"}]"#,
        );
        let gitlab = GitLab {
            id: 3,
            instance_id: 1,
            allow_signup: false,
            email: None,
            password: None,
            api_token: None,
            processed: false,
            base_url: server.base_url.clone(),
        };

        let step = RepoEnumeratorStep;
        let repos = step.process(&gitlab).await.unwrap();

        assert_eq!(repos.len(), 2);
        assert!(repos.iter().all(|r| r.gitlab_id == 3));
        assert_eq!(repos[0].name, "group/one");
        assert_eq!(repos[1].name, "group/two");
    }
}
