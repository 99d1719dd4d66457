use crate::error::EcsError;

/// Connection settings for [`EcsTaskApi::connect`](crate::EcsTaskApi::connect).
///
/// Empty fields are allowed: an empty key pair skips the static credential source and an empty
/// region defers to the SDK's own region lookup.
#[derive(Clone, Default)]
pub struct AwsConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl AwsConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }

    pub fn with_keys(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = access_key_id.into();
        self.secret_access_key = secret_access_key.into();
        self
    }

    /// A key pair is all or nothing.
    pub fn validate(&self) -> Result<(), EcsError> {
        let has_id = !self.access_key_id.trim().is_empty();
        let has_secret = !self.secret_access_key.trim().is_empty();
        if has_id != has_secret {
            return Err(EcsError::InvalidConfig(
                "access_key_id and secret_access_key must be set together".into(),
            ));
        }
        Ok(())
    }

    pub fn region(&self) -> Option<&str> {
        let region = self.region.trim();
        (!region.is_empty()).then_some(region)
    }
}

// Never print the secret.
impl std::fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("region", &self.region)
            .finish()
    }
}
