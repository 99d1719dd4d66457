use thiserror::Error;

/// Error returned by a [`TaskApi`](crate::TaskApi) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never got a service answer (connect, dispatch, timeout).
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with an error.
    #[error("service error ({}): {message}", .code.as_deref().unwrap_or("unknown"))]
    Service {
        /// Structured error code when the service exposes one (e.g. `ThrottlingException`).
        code: Option<String>,
        message: String,
    },
}

impl ApiError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Service {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Service { code, .. } => code.as_deref(),
            ApiError::Transport(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Service { message, .. } => message,
            ApiError::Transport(message) => message,
        }
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid launcher config: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_display_includes_code() {
        let err = ApiError::service("ThrottlingException", "Rate exceeded");
        assert_eq!(err.to_string(), "service error (ThrottlingException): Rate exceeded");

        let err = ApiError::Service {
            code: None,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "service error (unknown): boom");
    }

    #[test]
    fn transport_error_has_no_code() {
        let err = ApiError::Transport("connection reset".into());
        assert_eq!(err.code(), None);
        assert_eq!(err.message(), "connection reset");
    }
}
