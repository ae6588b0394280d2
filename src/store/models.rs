//! Plain data structs for the store's entities.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: i64,
    pub name: String,
    pub index: i64,
    pub processed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitLab {
    pub id: i64,
    pub instance_id: i64,
    pub allow_signup: bool,
    pub email: Option<String>,
    pub password: Option<String>,
    pub api_token: Option<String>,
    pub processed: bool,
    pub base_url: String,
}

impl GitLab {
    pub fn api_url(&self) -> String {
        format!("{}/api/v4", self.base_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jenkins {
    pub id: i64,
    pub instance_id: i64,
    pub anonymous_api: bool,
    pub base_url: String,
    pub processed: bool,
    pub script_access: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsJob {
    pub id: i64,
    pub jenkins_id: i64,
    pub name: String,
    pub url: String,
    pub processed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: i64,
    pub gitlab_id: i64,
    pub name: String,
    pub processed: bool,
    // joined for convenience in stages that need the owning GitLab instance
    pub gitlab_base_url: String,
    pub gitlab_api_token: Option<String>,
}

impl Repository {
    pub fn clone_url(&self) -> String {
        format!("{}/{}", self.gitlab_base_url, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub id: i64,
    pub repository_id: i64,
    pub secret: String,
    pub commit: String,
    pub start_line: i64,
    pub end_line: i64,
    pub file: String,
    pub url: String,
    pub commit_date: Option<String>,
    pub rule: String,
    pub processed: bool,
    // joined fields for aws_validator, which needs the owning gitlab+repo
    pub repo_name: String,
    pub gitlab_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JenkinsFinding {
    pub id: i64,
    pub job_id: i64,
    pub secret: String,
    pub start_line: i64,
    pub end_line: i64,
    pub file: String,
    pub url: String,
    pub rule: String,
    pub processed: bool,
    pub job_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AWSKey {
    pub access_key: String,
    pub secret_key: String,
    pub finding_id: Option<i64>,
    pub jenkins_finding_id: Option<i64>,
    pub arn: String,
}

/// A certificate transparency leaf, flattened to its deduplicated subjects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub subjects: Vec<String>,
    pub index: i64,
}
