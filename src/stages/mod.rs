pub mod aws_validator;
pub mod git_scanner;
pub mod gitlab_filter;
pub mod jenkins_filter;
pub mod jenkins_scanner;
pub mod jobs_enumerator;
pub mod repo_enumerator;

pub use aws_validator::{GitlabAwsValidatorStep, JenkinsAwsValidatorStep};
pub use git_scanner::GitScannerStep;
pub use gitlab_filter::GitlabFilterStep;
pub use jenkins_filter::JenkinsFilterStep;
pub use jenkins_scanner::JenkinsScannerStep;
pub use jobs_enumerator::JobsEnumeratorStep;
pub use repo_enumerator::RepoEnumeratorStep;
