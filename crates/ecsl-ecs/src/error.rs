use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("credential source {source_name} unavailable: {reason}")]
    Unavailable {
        source_name: &'static str,
        reason: String,
    },
    #[error("no credential source succeeded: {}", .0.join("; "))]
    Exhausted(Vec<String>),
}

#[derive(Debug, Error)]
pub enum EcsError {
    #[error("invalid aws config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
}
