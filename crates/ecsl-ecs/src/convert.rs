//! Translation between `aws-sdk-ecs` shapes and the launcher model.

use aws_sdk_ecs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ecs::operation::describe_tasks::DescribeTasksOutput;
use aws_sdk_ecs::operation::run_task::RunTaskOutput;
use aws_sdk_ecs::types;

use ecsl_core::ApiError;
use ecsl_model::{
    ContainerState, DescribeResponse, Failure, LaunchRequest, LaunchResponse, RemoteTask,
    TaskHandle, TaskReference,
};

/// `None` when no container carries an environment, so the request goes out without overrides.
pub(crate) fn task_override(request: &LaunchRequest) -> Option<types::TaskOverride> {
    let containers: Vec<_> = request
        .overrides
        .iter()
        .filter(|o| !o.env.is_empty())
        .map(|o| {
            let env = o
                .env
                .iter()
                .map(|kv| {
                    types::KeyValuePair::builder()
                        .name(kv.key())
                        .value(kv.value())
                        .build()
                })
                .collect::<Vec<_>>();
            types::ContainerOverride::builder()
                .name(&o.name)
                .set_environment(Some(env))
                .build()
        })
        .collect();

    if containers.is_empty() {
        return None;
    }
    Some(
        types::TaskOverride::builder()
            .set_container_overrides(Some(containers))
            .build(),
    )
}

pub(crate) fn launch_count(request: &LaunchRequest) -> i32 {
    i32::try_from(request.count).unwrap_or(i32::MAX)
}

pub(crate) fn launch_response(out: &RunTaskOutput) -> LaunchResponse {
    LaunchResponse {
        accepted: out
            .tasks()
            .iter()
            .filter_map(|t| t.task_arn())
            .map(|arn| TaskHandle {
                reference: TaskReference::new(arn),
            })
            .collect(),
        failures: out.failures().iter().map(failure).collect(),
    }
}

pub(crate) fn describe_response(out: &DescribeTasksOutput) -> DescribeResponse {
    DescribeResponse {
        tasks: out.tasks().iter().filter_map(remote_task).collect(),
        failures: out.failures().iter().map(failure).collect(),
    }
}

fn remote_task(task: &types::Task) -> Option<RemoteTask> {
    let arn = task.task_arn()?;
    let containers = task
        .containers()
        .iter()
        .map(|c| ContainerState {
            name: c.name().unwrap_or_default().to_string(),
            exit_code: c.exit_code(),
            reason: c.reason().map(str::to_string),
        })
        .collect();
    Some(RemoteTask {
        reference: TaskReference::new(arn),
        last_status: task.last_status().unwrap_or_default().to_string(),
        containers,
    })
}

fn failure(f: &types::Failure) -> Failure {
    Failure {
        arn: f.arn().map(str::to_string),
        reason: f.reason().unwrap_or_default().to_string(),
        detail: f.detail().map(str::to_string),
    }
}

/// Service answers keep their error code; everything that never reached the service is transport.
pub(crate) fn api_error<E>(err: SdkError<E>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(ctx) => {
            service_error(ctx.err().code(), ctx.err().message(), &DisplayErrorContext(&err))
        }
        SdkError::ResponseError(_) => {
            service_error(None, None, &DisplayErrorContext(&err))
        }
        _ => ApiError::Transport(DisplayErrorContext(&err).to_string()),
    }
}

fn service_error(
    code: Option<&str>,
    message: Option<&str>,
    context: &dyn std::fmt::Display,
) -> ApiError {
    ApiError::Service {
        code: code.map(str::to_string),
        message: message
            .map(str::to_string)
            .unwrap_or_else(|| context.to_string()),
    }
}
