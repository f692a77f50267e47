//! Integration tests for job submission, polling, and output retrieval.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hs_jobs::*;
use serde_json::json;

fn fast_poll() -> PollOptions {
    PollOptions {
        interval: Duration::from_millis(1),
        timeout: Some(Duration::from_secs(5)),
        retry_budget: 3,
    }
}

fn params() -> JobParameters {
    JobParameters::new().with("Date", "2024-05-01")
}

fn poll(
    orchestrator: &JobOrchestrator<ReplayJobService>,
    handle: &mut JobHandle,
    options: &PollOptions,
) -> (JobResult<JobStatus>, Vec<JobStatus>) {
    let mut seen = Vec::new();
    let result = orchestrator.poll_until_terminal(
        handle,
        options,
        &CancelToken::new(),
        &mut |s| seen.push(s),
    );
    (result, seen)
}

#[test]
fn polls_through_running_to_success() {
    let service = Arc::new(ReplayJobService::new().with_statuses([
        RemoteStatus::Executing,
        RemoteStatus::Executing,
        RemoteStatus::Succeeded,
    ]));
    let orchestrator = JobOrchestrator::new(Arc::clone(&service));

    let mut handle = orchestrator.submit(params()).unwrap();
    assert_eq!(handle.status(), JobStatus::Submitted);
    assert_eq!(handle.parameters().get("Date"), Some("2024-05-01"));

    let (result, seen) = poll(&orchestrator, &mut handle, &fast_poll());
    assert_eq!(result.unwrap(), JobStatus::Succeeded);
    assert_eq!(seen, vec![JobStatus::Running, JobStatus::Succeeded]);
    assert_eq!(service.status_checks(), 3);
    assert_eq!(service.submissions(), vec![params()]);
    // Two poll intervals of 1ms separate the three checks.
    assert!(handle.age() >= Duration::from_millis(2));
}

#[test]
fn rejected_submission_is_a_submission_error() {
    let service = Arc::new(ReplayJobService::new().rejecting("Date is malformed"));
    let orchestrator = JobOrchestrator::new(service);
    let err = orchestrator.submit(params()).unwrap_err();
    assert!(matches!(err, JobError::Submission { ref message } if message.contains("malformed")));
}

#[test]
fn remote_failure_is_terminal() {
    let service = Arc::new(
        ReplayJobService::new().with_statuses([RemoteStatus::Executing, RemoteStatus::Failed]),
    );
    let orchestrator = JobOrchestrator::new(service);
    let mut handle = orchestrator.submit(params()).unwrap();
    let (result, seen) = poll(&orchestrator, &mut handle, &fast_poll());
    assert_eq!(result.unwrap(), JobStatus::Failed);
    assert_eq!(seen.last(), Some(&JobStatus::Failed));
}

#[test]
fn transient_status_failures_are_retried() {
    let service = Arc::new(
        ReplayJobService::new()
            .with_statuses([RemoteStatus::Executing])
            .with_status_failure("502")
            .with_status_failure("502")
            .with_statuses([RemoteStatus::Succeeded]),
    );
    let orchestrator = JobOrchestrator::new(service);
    let mut handle = orchestrator.submit(params()).unwrap();
    let (result, _) = poll(&orchestrator, &mut handle, &fast_poll());
    assert_eq!(result.unwrap(), JobStatus::Succeeded);
}

#[test]
fn exhausted_retry_budget_fails_the_job() {
    let service = Arc::new(
        ReplayJobService::new()
            .with_statuses([RemoteStatus::Executing])
            .with_status_failure("down")
            .with_status_failure("down")
            .with_status_failure("down")
            .with_statuses([RemoteStatus::Succeeded]),
    );
    let orchestrator = JobOrchestrator::new(service);
    let mut handle = orchestrator.submit(params()).unwrap();
    let (result, seen) = poll(&orchestrator, &mut handle, &fast_poll());

    assert_eq!(
        result.unwrap_err(),
        JobError::Poll {
            attempts: 3,
            message: "service unreachable: down".to_string()
        }
    );
    assert_eq!(handle.status(), JobStatus::Failed);
    assert_eq!(seen, vec![JobStatus::Running, JobStatus::Failed]);
}

#[test]
fn timeout_stops_polling_and_requests_cancellation() {
    let service = Arc::new(ReplayJobService::new().with_statuses([RemoteStatus::Executing]));
    let orchestrator = JobOrchestrator::new(Arc::clone(&service));
    let mut handle = orchestrator.submit(params()).unwrap();

    let options = PollOptions {
        interval: Duration::from_millis(5),
        timeout: Some(Duration::from_millis(40)),
        retry_budget: 3,
    };
    let started = Instant::now();
    let (result, seen) = poll(&orchestrator, &mut handle, &options);

    assert_eq!(result.unwrap(), JobStatus::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(seen.last(), Some(&JobStatus::TimedOut));
    assert_eq!(service.cancel_requests(), 1);
}

#[test]
fn timeout_without_remote_cancel_still_stops() {
    let service = Arc::new(ReplayJobService::new().without_cancel());
    let orchestrator = JobOrchestrator::new(service);
    let mut handle = orchestrator.submit(params()).unwrap();
    let options = PollOptions {
        interval: Duration::from_millis(2),
        timeout: Some(Duration::from_millis(10)),
        retry_budget: 3,
    };
    let (result, _) = poll(&orchestrator, &mut handle, &options);
    assert_eq!(result.unwrap(), JobStatus::TimedOut);
}

#[test]
fn cancellation_token_stops_polling() {
    let service = Arc::new(ReplayJobService::new().with_statuses([RemoteStatus::Executing]));
    let orchestrator = JobOrchestrator::new(service);
    let mut handle = orchestrator.submit(params()).unwrap();

    let token = CancelToken::new();
    let remote = token.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        remote.cancel();
    });

    let options = PollOptions {
        interval: Duration::from_secs(30),
        timeout: None,
        retry_budget: 3,
    };
    let started = Instant::now();
    let mut seen = Vec::new();
    let status = orchestrator
        .poll_until_terminal(&mut handle, &options, &token, &mut |s| seen.push(s))
        .unwrap();

    assert_eq!(status, JobStatus::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(seen, vec![JobStatus::Running, JobStatus::Cancelled]);
}

#[test]
fn fetches_named_outputs_after_success() {
    let service = Arc::new(
        ReplayJobService::new()
            .with_statuses([RemoteStatus::Succeeded])
            .with_output("Output_JSON", json!("[]"))
            .with_output(
                "Output_Hail_Layer",
                json!({"geometryType": "esriGeometryPolygon", "features": []}),
            ),
    );
    let orchestrator = JobOrchestrator::new(service);
    let mut handle = orchestrator.submit(params()).unwrap();
    poll(&orchestrator, &mut handle, &fast_poll()).0.unwrap();

    let table = orchestrator
        .fetch_artifact(&handle, "Output_JSON", ArtifactKind::Json)
        .unwrap();
    assert_eq!(table, Artifact::Json(json!("[]")));

    let layer = orchestrator
        .fetch_artifact(&handle, "Output_Hail_Layer", ArtifactKind::Geometry)
        .unwrap();
    assert_eq!(layer.kind(), ArtifactKind::Geometry);

    let missing = orchestrator
        .fetch_artifact(&handle, "Output_Other", ArtifactKind::Json)
        .unwrap_err();
    assert_eq!(
        missing,
        JobError::ArtifactNotFound {
            name: "Output_Other".to_string()
        }
    );
}

#[test]
fn mistyped_output_is_a_format_error() {
    let service = Arc::new(
        ReplayJobService::new()
            .with_statuses([RemoteStatus::Succeeded])
            .with_output("Output_Hail_Layer", json!([1, 2, 3])),
    );
    let orchestrator = JobOrchestrator::new(service);
    let mut handle = orchestrator.submit(params()).unwrap();
    poll(&orchestrator, &mut handle, &fast_poll()).0.unwrap();

    let err = orchestrator
        .fetch_artifact(&handle, "Output_Hail_Layer", ArtifactKind::Geometry)
        .unwrap_err();
    assert!(matches!(err, JobError::ArtifactFormat { .. }));
}

#[test]
fn outputs_require_a_succeeded_job() {
    let service = Arc::new(ReplayJobService::new().with_output("Output_JSON", json!([])));
    let orchestrator = JobOrchestrator::new(service);
    let handle = orchestrator.submit(params()).unwrap();
    let err = orchestrator
        .fetch_artifact(&handle, "Output_JSON", ArtifactKind::Json)
        .unwrap_err();
    assert_eq!(
        err,
        JobError::NotComplete {
            status: JobStatus::Submitted
        }
    );
}

#[test]
fn terminal_handle_is_not_polled_again() {
    let service = Arc::new(ReplayJobService::new().with_statuses([RemoteStatus::Succeeded]));
    let orchestrator = JobOrchestrator::new(Arc::clone(&service));
    let mut handle = orchestrator.submit(params()).unwrap();
    poll(&orchestrator, &mut handle, &fast_poll()).0.unwrap();
    let checks = service.status_checks();

    let (result, seen) = poll(&orchestrator, &mut handle, &fast_poll());
    assert_eq!(result.unwrap(), JobStatus::Succeeded);
    assert!(seen.is_empty());
    assert_eq!(service.status_checks(), checks);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn remote_status() -> impl Strategy<Value = RemoteStatus> {
        prop::sample::select(vec![
            RemoteStatus::New,
            RemoteStatus::Submitted,
            RemoteStatus::Waiting,
            RemoteStatus::Executing,
            RemoteStatus::Succeeded,
            RemoteStatus::Failed,
            RemoteStatus::TimedOut,
            RemoteStatus::Cancelling,
            RemoteStatus::Cancelled,
            RemoteStatus::Deleting,
            RemoteStatus::Deleted,
        ])
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn reported_statuses_never_leave_a_terminal_state(
            script in prop::collection::vec(remote_status(), 1..12)
        ) {
            let service = Arc::new(
                ReplayJobService::new()
                    .with_statuses(script)
                    .with_statuses([RemoteStatus::Failed]),
            );
            let orchestrator = JobOrchestrator::new(service);
            let mut handle = orchestrator.submit(params()).unwrap();
            let (result, seen) = poll(&orchestrator, &mut handle, &fast_poll());

            let status = result.unwrap();
            prop_assert!(status.is_terminal());
            prop_assert_eq!(handle.status(), status);
            prop_assert_eq!(seen.last(), Some(&status));
            // Exactly one terminal status is ever reported.
            prop_assert_eq!(seen.iter().filter(|s| s.is_terminal()).count(), 1);
            let mut previous = JobStatus::Submitted;
            for s in &seen {
                prop_assert!(previous.can_transition_to(*s));
                previous = *s;
            }
        }
    }
}
