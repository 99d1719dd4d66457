use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ecs::Client;
use aws_sdk_ecs::config::Region;
use tracing::{debug, info};

use ecsl_core::{ApiError, TaskApi};
use ecsl_model::{DescribeResponse, LaunchRequest, LaunchResponse, TaskReference};

use crate::auth::CredentialChain;
use crate::config::AwsConfig;
use crate::convert;
use crate::error::EcsError;

/// [`TaskApi`] backed by the ECS `RunTask` and `DescribeTasks` calls.
#[derive(Clone, Debug)]
pub struct EcsTaskApi {
    client: Client,
}

impl EcsTaskApi {
    /// Picks a credential provider through [`CredentialChain::for_config`] and builds a client.
    pub async fn connect(cfg: &AwsConfig) -> Result<Self, EcsError> {
        Self::connect_with(cfg, &CredentialChain::for_config(cfg)).await
    }

    pub async fn connect_with(cfg: &AwsConfig, chain: &CredentialChain) -> Result<Self, EcsError> {
        cfg.validate()?;
        let (provider, source) = chain.resolve().await?;

        // The loader wraps the provider in the SDK identity cache, which refetches on expiry.
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).credentials_provider(provider);
        if let Some(region) = cfg.region() {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk = loader.load().await;

        info!(
            source,
            region = sdk.region().map(|r| r.as_ref()).unwrap_or("unset"),
            "ecs client ready"
        );
        Ok(Self::from_client(Client::new(&sdk)))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskApi for EcsTaskApi {
    async fn submit_launch(&self, request: &LaunchRequest) -> Result<LaunchResponse, ApiError> {
        debug!(
            cluster = %request.cluster,
            task_definition = %request.task_definition,
            "run task"
        );
        let out = self
            .client
            .run_task()
            .cluster(&request.cluster)
            .task_definition(&request.task_definition)
            .count(convert::launch_count(request))
            .set_overrides(convert::task_override(request))
            .send()
            .await
            .map_err(convert::api_error)?;
        Ok(convert::launch_response(&out))
    }

    async fn describe(
        &self,
        cluster: &str,
        reference: &TaskReference,
    ) -> Result<DescribeResponse, ApiError> {
        let out = self
            .client
            .describe_tasks()
            .cluster(cluster)
            .tasks(reference.as_str())
            .send()
            .await
            .map_err(convert::api_error)?;
        Ok(convert::describe_response(&out))
    }
}
