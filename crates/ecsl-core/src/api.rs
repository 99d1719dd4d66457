use async_trait::async_trait;
use ecsl_model::{DescribeResponse, LaunchRequest, LaunchResponse, TaskReference};

use crate::error::ApiError;

/// Remote cluster task API.
///
/// One instance is shared by every lifecycle of a batch, so implementations must tolerate
/// concurrent calls.
#[async_trait]
pub trait TaskApi: Send + Sync + 'static {
    /// Submit a launch. Per-task rejections come back in [`LaunchResponse::failures`], not as `Err`.
    async fn submit_launch(&self, request: &LaunchRequest) -> Result<LaunchResponse, ApiError>;

    /// Describe a previously accepted task.
    async fn describe(
        &self,
        cluster: &str,
        reference: &TaskReference,
    ) -> Result<DescribeResponse, ApiError>;
}
