//! Amazon ECS backend for the launcher core.
//!
//! [`EcsTaskApi`] implements [`ecsl_core::TaskApi`] on top of `aws-sdk-ecs`. Credentials are
//! resolved once, up front, through a [`CredentialChain`].

mod auth;
pub use auth::{
    CredentialChain, CredentialSource, EnvironmentSource, InstanceRoleSource, StaticSource,
};

mod client;
pub use client::EcsTaskApi;

mod config;
pub use config::AwsConfig;

mod convert;

mod error;
pub use error::{AuthError, EcsError};
