//! Retry decisions for launch and describe outcomes.
//!
//! Every decision about whether to retry, give up or finish is made here. Error codes are
//! checked first; matching on free-text messages is kept to [`classify_api_error`] only.

use std::fmt;

use ecsl_model::{DescribeResponse, Failure, LaunchResponse, RemoteTask, TaskReference};

use crate::error::ApiError;

/// Structured codes the service uses for request throttling.
const THROTTLING_CODES: &[&str] = &[
    "ThrottlingException",
    "Throttling",
    "TooManyRequestsException",
];

/// Message fragment of the error returned when a cluster has no registered instances.
const NO_CAPACITY_TEXT: &str = "No Container Instances";
const THROTTLING_TEXT: &str = "ThrottlingException";

const RESOURCE_REASON_PREFIX: &str = "RESOURCE:";
const AGENT_REASON: &str = "AGENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NoCapacity,
    Throttled,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// Cluster has no container instances to place onto.
    NoCapacity,
    Throttled,
    /// `RESOURCE:*` placement failure (cpu, memory, ports...).
    ResourceUnavailable,
    /// Container agent on the instance is not ready.
    AgentUnavailable,
    /// No error, no failures and no accepted task.
    EmptyResponse,
}

impl RetryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryReason::NoCapacity => "waiting for container instances",
            RetryReason::Throttled => "request throttled",
            RetryReason::ResourceUnavailable => "waiting for machine resources",
            RetryReason::AgentUnavailable => "waiting for container agent",
            RetryReason::EmptyResponse => "empty launch response",
        }
    }
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchVerdict {
    Accepted(TaskReference),
    Retry(RetryReason),
    Fatal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict {
    /// Stopped and no container exited non-zero.
    Succeeded,
    /// Stopped with at least one failed container.
    Failed(String),
    /// Known to the service but not stopped yet; carries the last status.
    Pending(String),
    /// Call failed or the service reported failures; try again.
    Retry(String),
}

pub fn classify_api_error(err: &ApiError) -> ErrorClass {
    if let Some(code) = err.code()
        && THROTTLING_CODES.contains(&code)
    {
        return ErrorClass::Throttled;
    }

    let message = err.message();
    if message.contains(NO_CAPACITY_TEXT) {
        ErrorClass::NoCapacity
    } else if message.contains(THROTTLING_TEXT) {
        ErrorClass::Throttled
    } else {
        ErrorClass::Fatal
    }
}

/// `None` means the reason is not worth retrying.
pub fn classify_failure_reason(reason: &str) -> Option<RetryReason> {
    if reason.starts_with(RESOURCE_REASON_PREFIX) {
        Some(RetryReason::ResourceUnavailable)
    } else if reason == AGENT_REASON {
        Some(RetryReason::AgentUnavailable)
    } else {
        None
    }
}

/// Classifies a launch outcome by API error, then failure list, then accepted list.
///
/// A failure list is retryable when any of its reasons is; otherwise it is fatal even if some
/// tasks were accepted alongside it.
pub fn classify_launch(outcome: &Result<LaunchResponse, ApiError>) -> LaunchVerdict {
    let response = match outcome {
        Ok(response) => response,
        Err(err) => {
            return match classify_api_error(err) {
                ErrorClass::NoCapacity => LaunchVerdict::Retry(RetryReason::NoCapacity),
                ErrorClass::Throttled => LaunchVerdict::Retry(RetryReason::Throttled),
                ErrorClass::Fatal => LaunchVerdict::Fatal(err.to_string()),
            };
        }
    };

    if !response.failures.is_empty() {
        let retry = response
            .failures
            .iter()
            .find_map(|f| classify_failure_reason(&f.reason));
        return match retry {
            Some(reason) => LaunchVerdict::Retry(reason),
            None => LaunchVerdict::Fatal(format!(
                "launch rejected: {}",
                describe_failures(&response.failures)
            )),
        };
    }

    match response.accepted.first() {
        Some(handle) => LaunchVerdict::Accepted(handle.reference.clone()),
        None => LaunchVerdict::Retry(RetryReason::EmptyResponse),
    }
}

pub fn classify_describe(
    outcome: &Result<DescribeResponse, ApiError>,
    reference: &TaskReference,
) -> PollVerdict {
    let response = match outcome {
        Ok(response) => response,
        Err(err) => return PollVerdict::Retry(err.to_string()),
    };

    if !response.failures.is_empty() {
        return PollVerdict::Retry(format!(
            "describe failures: {}",
            describe_failures(&response.failures)
        ));
    }

    let task = response
        .tasks
        .iter()
        .find(|t| &t.reference == reference)
        .or_else(|| response.tasks.first());

    match task {
        Some(task) if task.is_stopped() => stopped_verdict(task),
        Some(task) => PollVerdict::Pending(task.last_status.clone()),
        None => PollVerdict::Retry("task missing from describe response".to_string()),
    }
}

fn stopped_verdict(task: &RemoteTask) -> PollVerdict {
    let failed: Vec<String> = task
        .failed_containers()
        .map(|c| {
            format!(
                "container {} exited with {} ({})",
                c.name,
                c.exit_code.unwrap_or_default(),
                c.reason.as_deref().unwrap_or("no reason")
            )
        })
        .collect();

    if failed.is_empty() {
        PollVerdict::Succeeded
    } else {
        PollVerdict::Failed(failed.join("; "))
    }
}

fn describe_failures(failures: &[Failure]) -> String {
    failures
        .iter()
        .map(|f| match &f.detail {
            Some(detail) => format!("{} ({})", f.reason, detail),
            None => f.reason.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use ecsl_model::{ContainerState, STOPPED, TaskHandle};

    use super::*;

    fn arn() -> TaskReference {
        TaskReference::new("arn:aws:ecs:task/abc")
    }

    #[test]
    fn api_errors_prefer_structured_codes() {
        let throttled = ApiError::service("ThrottlingException", "Rate exceeded");
        assert_eq!(classify_api_error(&throttled), ErrorClass::Throttled);

        let too_many = ApiError::service("TooManyRequestsException", "slow down");
        assert_eq!(classify_api_error(&too_many), ErrorClass::Throttled);
    }

    #[test]
    fn api_errors_fall_back_to_message_text() {
        let no_capacity = ApiError::service(
            "InvalidParameterException",
            "No Container Instances were found in your cluster.",
        );
        assert_eq!(classify_api_error(&no_capacity), ErrorClass::NoCapacity);

        let uncoded = ApiError::Service {
            code: None,
            message: "ThrottlingException: Rate exceeded".into(),
        };
        assert_eq!(classify_api_error(&uncoded), ErrorClass::Throttled);
    }

    #[test]
    fn other_api_errors_are_fatal() {
        let missing = ApiError::service("ClusterNotFoundException", "Cluster not found.");
        assert_eq!(classify_api_error(&missing), ErrorClass::Fatal);

        let transport = ApiError::Transport("dns error".into());
        assert_eq!(classify_api_error(&transport), ErrorClass::Fatal);
    }

    #[test]
    fn failure_reasons() {
        assert_eq!(
            classify_failure_reason("RESOURCE:MEMORY"),
            Some(RetryReason::ResourceUnavailable)
        );
        assert_eq!(
            classify_failure_reason("RESOURCE:CPU"),
            Some(RetryReason::ResourceUnavailable)
        );
        assert_eq!(classify_failure_reason("AGENT"), Some(RetryReason::AgentUnavailable));
        assert_eq!(classify_failure_reason("AGENT_DISCONNECTED"), None);
        assert_eq!(classify_failure_reason("MISSING"), None);
        assert_eq!(classify_failure_reason(""), None);
    }

    #[test]
    fn launch_outcomes_map_to_one_verdict_each() {
        let cases: Vec<(Result<LaunchResponse, ApiError>, LaunchVerdict)> = vec![
            (
                Err(ApiError::service("ThrottlingException", "Rate exceeded")),
                LaunchVerdict::Retry(RetryReason::Throttled),
            ),
            (
                Err(ApiError::service(
                    "InvalidParameterException",
                    "No Container Instances were found in your cluster.",
                )),
                LaunchVerdict::Retry(RetryReason::NoCapacity),
            ),
            (
                Err(ApiError::service("AccessDeniedException", "denied")),
                LaunchVerdict::Fatal("service error (AccessDeniedException): denied".into()),
            ),
            (
                Err(ApiError::Transport("timeout".into())),
                LaunchVerdict::Fatal("transport error: timeout".into()),
            ),
            (
                Ok(LaunchResponse::rejected(vec![Failure::new("RESOURCE:MEMORY")])),
                LaunchVerdict::Retry(RetryReason::ResourceUnavailable),
            ),
            (
                Ok(LaunchResponse::rejected(vec![Failure::new("AGENT")])),
                LaunchVerdict::Retry(RetryReason::AgentUnavailable),
            ),
            (
                Ok(LaunchResponse::rejected(vec![
                    Failure::new("MISSING").with_detail("no such definition"),
                ])),
                LaunchVerdict::Fatal("launch rejected: MISSING (no such definition)".into()),
            ),
            (Ok(LaunchResponse::default()), LaunchVerdict::Retry(RetryReason::EmptyResponse)),
            (Ok(LaunchResponse::accepted("arn:aws:ecs:task/abc")), LaunchVerdict::Accepted(arn())),
        ];

        for (outcome, expected) in cases {
            assert_eq!(classify_launch(&outcome), expected, "outcome: {outcome:?}");
            // Same input, same answer.
            assert_eq!(classify_launch(&outcome), expected);
        }
    }

    #[test]
    fn any_retryable_reason_makes_the_failure_list_retryable() {
        let outcome = Ok(LaunchResponse::rejected(vec![
            Failure::new("MISSING"),
            Failure::new("RESOURCE:PORTS"),
        ]));
        assert_eq!(
            classify_launch(&outcome),
            LaunchVerdict::Retry(RetryReason::ResourceUnavailable)
        );
    }

    #[test]
    fn failure_list_is_checked_before_accepted_list() {
        let outcome = Ok(LaunchResponse {
            accepted: vec![TaskHandle { reference: arn() }],
            failures: vec![Failure::new("MISSING")],
        });
        assert!(matches!(classify_launch(&outcome), LaunchVerdict::Fatal(_)));
    }

    #[test]
    fn describe_errors_and_failures_are_retried() {
        let err = Err(ApiError::service("AccessDeniedException", "revoked"));
        assert!(matches!(classify_describe(&err, &arn()), PollVerdict::Retry(_)));

        let failures = Ok(DescribeResponse {
            tasks: Vec::new(),
            failures: vec![Failure::new("MISSING")],
        });
        assert!(matches!(classify_describe(&failures, &arn()), PollVerdict::Retry(_)));

        let empty = Ok(DescribeResponse::default());
        assert!(matches!(classify_describe(&empty, &arn()), PollVerdict::Retry(_)));
    }

    #[test]
    fn running_task_is_pending() {
        let outcome = Ok(DescribeResponse::task(RemoteTask::new(arn(), "RUNNING")));
        assert_eq!(
            classify_describe(&outcome, &arn()),
            PollVerdict::Pending("RUNNING".into())
        );
    }

    #[test]
    fn stopped_task_outcome_depends_on_exit_codes() {
        let clean = Ok(DescribeResponse::task(
            RemoteTask::new(arn(), STOPPED)
                .with_container(ContainerState::exited("app", 0))
                .with_container(ContainerState::exited("sidecar", 0)),
        ));
        assert_eq!(classify_describe(&clean, &arn()), PollVerdict::Succeeded);

        let broken = Ok(DescribeResponse::task(
            RemoteTask::new(arn(), STOPPED)
                .with_container(ContainerState::exited("app", 0))
                .with_container(ContainerState::exited("sidecar", 1)),
        ));
        match classify_describe(&broken, &arn()) {
            PollVerdict::Failed(msg) => assert!(msg.contains("sidecar exited with 1")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn describe_prefers_the_matching_reference() {
        let outcome = Ok(DescribeResponse {
            tasks: vec![
                RemoteTask::new(TaskReference::new("other"), "RUNNING"),
                RemoteTask::new(arn(), STOPPED),
            ],
            failures: Vec::new(),
        });
        assert_eq!(classify_describe(&outcome, &arn()), PollVerdict::Succeeded);
    }
}
