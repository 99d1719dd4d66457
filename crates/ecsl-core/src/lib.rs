//! Batch launcher core.
//!
//! A [`Launcher`] runs one [`TaskLifecycle`] per [`LaunchRequest`](ecsl_model::LaunchRequest):
//! submit with fixed-backoff retries, poll until the remote task stops, then report. The remote
//! API is reached only through [`TaskApi`], and time only through [`Sleeper`].

pub mod api;
pub use api::TaskApi;

pub mod barrier;
pub use barrier::{CompletionSignal, Countdown};

pub mod board;
pub use board::TaskBoard;

pub mod classify;

pub mod config;
pub use config::LauncherConfig;

pub mod error;
pub use error::{ApiError, CoreError};

pub mod launcher;
pub use launcher::Launcher;

pub mod lifecycle;
pub use lifecycle::TaskLifecycle;

pub mod sleeper;
pub use sleeper::{Sleeper, TokioSleeper};
