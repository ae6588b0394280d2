//! End-to-end tests driving the Fan executor and the store together,
//! through the same public `ProcessStep`/`run_process_step` surface every
//! real stage uses.

use async_trait::async_trait;

use scanct::error::{Error, Result};
use scanct::pipeline::{run_process_step, ProcessStep};
use scanct::store::models::{Certificate, GitLab, Instance};
use scanct::store::Store;

/// Mirrors the shape of the real `GitlabFilterStep` but with a fixed
/// in-memory decision instead of an HTTP probe, so this test exercises the
/// executor and the store without any network dependency.
struct FakeGitlabFilterStep;

#[async_trait]
impl ProcessStep for FakeGitlabFilterStep {
    type Input = Instance;
    type Output = GitLab;

    fn name(&self) -> &'static str {
        "fake-gitlab-filter"
    }

    async fn unprocessed_inputs(&self, store: &Store) -> Result<Vec<Instance>> {
        store.unprocessed_instances_for_gitlab()
    }

    async fn process(&self, instance: &Instance) -> Result<Vec<GitLab>> {
        Ok(vec![GitLab {
            id: 0,
            instance_id: instance.id,
            allow_signup: false,
            email: None,
            password: None,
            api_token: None,
            processed: false,
            base_url: format!("https://{}", instance.name),
        }])
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

#[tokio::test]
async fn running_a_stage_twice_with_no_new_inputs_adds_no_new_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("instances.db");

    {
        let mut store = Store::open(&db_path).expect("open store");
        store
            .store_certificates(&[Certificate {
                subjects: vec!["gitlab.example.test".to_string()],
                index: 0,
            }])
            .expect("seed instance");
    }

    run_process_step(FakeGitlabFilterStep, db_path.clone(), 2)
        .await
        .expect("first run");
    let after_first = {
        let store = Store::open(&db_path).expect("reopen store");
        store.unprocessed_gitlabs().expect("query").len()
    };

    run_process_step(FakeGitlabFilterStep, db_path.clone(), 2)
        .await
        .expect("second run");
    let after_second = {
        let store = Store::open(&db_path).expect("reopen store");
        store.unprocessed_gitlabs().expect("query").len()
    };

    assert_eq!(after_first, 1);
    assert_eq!(
        after_second, 1,
        "second run must not create a duplicate GitLab row for an already-processed instance"
    );
}

#[tokio::test]
async fn instance_processed_count_is_non_decreasing_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("instances.db");

    {
        let mut store = Store::open(&db_path).expect("open store");
        store
            .store_certificates(&[Certificate {
                subjects: vec![
                    "gitlab.one.test".to_string(),
                    "gitlab.two.test".to_string(),
                ],
                index: 0,
            }])
            .expect("seed instances");
    }

    let unprocessed_before = {
        let store = Store::open(&db_path).expect("reopen store");
        store.unprocessed_instances_for_gitlab().expect("query").len()
    };
    assert_eq!(unprocessed_before, 2);

    run_process_step(FakeGitlabFilterStep, db_path.clone(), 4)
        .await
        .expect("run");
    let unprocessed_after = {
        let store = Store::open(&db_path).expect("reopen store");
        store.unprocessed_instances_for_gitlab().expect("query").len()
    };
    assert_eq!(unprocessed_after, 0, "every seeded instance must be marked processed");

    // Running again on an already-drained queue must not regress anything.
    run_process_step(FakeGitlabFilterStep, db_path.clone(), 4)
        .await
        .expect("second run");
    let unprocessed_final = {
        let store = Store::open(&db_path).expect("reopen store");
        store.unprocessed_instances_for_gitlab().expect("query").len()
    };
    assert_eq!(unprocessed_final, 0);
}

/// A stage whose `save_result` always fails, used to exercise the fatal
/// abort path: a store error from `save_result`/`set_processed` must stop
/// the stage and must not flip `Processed` for the input that lost its
/// output.
struct FailingSaveStep;

#[async_trait]
impl ProcessStep for FailingSaveStep {
    type Input = Instance;
    type Output = GitLab;

    fn name(&self) -> &'static str {
        "failing-save"
    }

    async fn unprocessed_inputs(&self, store: &Store) -> Result<Vec<Instance>> {
        store.unprocessed_instances_for_gitlab()
    }

    async fn process(&self, instance: &Instance) -> Result<Vec<GitLab>> {
        Ok(vec![GitLab {
            id: 0,
            instance_id: instance.id,
            allow_signup: false,
            email: None,
            password: None,
            api_token: None,
            processed: false,
            base_url: format!("https://{}", instance.name),
        }])
    }

    async fn save_result(&self, _store: &mut Store, _outputs: &[GitLab]) -> Result<()> {
        Err(Error::Other("simulated store failure".to_string()))
    }

    async fn set_processed(&self, store: &Store, instance: &Instance) -> Result<()> {
        store.set_instance_processed(instance.id)
    }
}

#[tokio::test]
async fn a_fatal_save_result_error_aborts_the_stage_and_leaves_processed_unset() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("instances.db");

    {
        let mut store = Store::open(&db_path).expect("open store");
        store
            .store_certificates(&[Certificate {
                subjects: vec!["gitlab.example.test".to_string()],
                index: 0,
            }])
            .expect("seed instance");
    }

    let result = run_process_step(FailingSaveStep, db_path.clone(), 1).await;
    assert!(
        result.is_err(),
        "a save_result failure must propagate out of run_process_step as a fatal error"
    );

    let store = Store::open(&db_path).expect("reopen store");
    assert_eq!(
        store.unprocessed_instances_for_gitlab().unwrap().len(),
        1,
        "the input must not be marked processed when its output failed to save"
    );
    assert_eq!(
        store.unprocessed_gitlabs().unwrap().len(),
        0,
        "no GitLab row should exist since save_result never committed one"
    );
}
