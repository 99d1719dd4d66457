use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::environment::credentials::EnvironmentVariableCredentialsProvider;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_credential_types::Credentials;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use tracing::{debug, info};

use crate::config::AwsConfig;
use crate::error::AuthError;

const STATIC_PROVIDER: &str = "ecsl-static";

/// One place credentials may come from.
///
/// `resolve` hands back the provider itself, not a snapshot: the SDK calls it again whenever the
/// cached credentials expire.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self) -> Result<SharedCredentialsProvider, AuthError>;
}

/// Fetches once from `provider` and accepts it only if that yields unexpired credentials.
pub(crate) async fn verified(
    source_name: &'static str,
    provider: SharedCredentialsProvider,
) -> Result<SharedCredentialsProvider, AuthError> {
    let creds = provider
        .provide_credentials()
        .await
        .map_err(|e| AuthError::Unavailable {
            source_name,
            reason: e.to_string(),
        })?;
    if let Some(expiry) = creds.expiry()
        && expiry <= SystemTime::now()
    {
        return Err(AuthError::Unavailable {
            source_name,
            reason: "credentials already expired".into(),
        });
    }
    Ok(provider)
}

/// Explicit key pair from [`AwsConfig`]. Unavailable when either half is blank.
pub struct StaticSource {
    access_key_id: String,
    secret_access_key: String,
}

impl StaticSource {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn resolve(&self) -> Result<SharedCredentialsProvider, AuthError> {
        if self.access_key_id.trim().is_empty() || self.secret_access_key.trim().is_empty() {
            return Err(AuthError::Unavailable {
                source_name: self.name(),
                reason: "access key id or secret access key is empty".into(),
            });
        }
        Ok(SharedCredentialsProvider::new(Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            None,
            None,
            STATIC_PROVIDER,
        )))
    }
}

/// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` / `AWS_SESSION_TOKEN`.
#[derive(Default)]
pub struct EnvironmentSource;

#[async_trait]
impl CredentialSource for EnvironmentSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    async fn resolve(&self) -> Result<SharedCredentialsProvider, AuthError> {
        let provider = SharedCredentialsProvider::new(EnvironmentVariableCredentialsProvider::new());
        verified(self.name(), provider).await
    }
}

/// Role credentials served by the EC2 instance metadata service, refreshed as they expire.
#[derive(Default)]
pub struct InstanceRoleSource;

#[async_trait]
impl CredentialSource for InstanceRoleSource {
    fn name(&self) -> &'static str {
        "instance-role"
    }

    async fn resolve(&self) -> Result<SharedCredentialsProvider, AuthError> {
        let provider = SharedCredentialsProvider::new(ImdsCredentialsProvider::builder().build());
        verified(self.name(), provider).await
    }
}

/// Ordered list of sources; the first one that yields credentials wins.
pub struct CredentialChain {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialChain {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Static keys, then the environment, then the instance role.
    pub fn for_config(cfg: &AwsConfig) -> Self {
        Self::new()
            .with_source(StaticSource::new(
                cfg.access_key_id.clone(),
                cfg.secret_access_key.clone(),
            ))
            .with_source(EnvironmentSource)
            .with_source(InstanceRoleSource)
    }

    pub fn with_source(mut self, source: impl CredentialSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns the provider and the name of the source that produced it.
    pub async fn resolve(&self) -> Result<(SharedCredentialsProvider, &'static str), AuthError> {
        let mut reasons = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            match source.resolve().await {
                Ok(provider) => {
                    info!(source = source.name(), "aws credentials resolved");
                    return Ok((provider, source.name()));
                }
                Err(e) => {
                    debug!(source = source.name(), error = %e, "credential source skipped");
                    reasons.push(e.to_string());
                }
            }
        }
        Err(AuthError::Exhausted(reasons))
    }
}

impl Default for CredentialChain {
    fn default() -> Self {
        Self::new()
    }
}
