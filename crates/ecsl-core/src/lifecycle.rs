use std::{sync::Arc, time::Duration};

use ecsl_model::{LaunchRequest, TaskId, TaskRecord, TaskReference, TaskStatus, TransitionError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    api::TaskApi,
    barrier::CompletionSignal,
    board::TaskBoard,
    classify::{LaunchVerdict, PollVerdict, classify_describe, classify_launch},
    config::LauncherConfig,
    sleeper::Sleeper,
};

/// How a lifecycle ended.
#[derive(Debug)]
struct Exit {
    status: TaskStatus,
    error: Option<String>,
}

impl Exit {
    fn succeeded() -> Self {
        Self {
            status: TaskStatus::Succeeded,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            status: TaskStatus::Failed,
            error: Some(error),
        }
    }

    fn cancelled() -> Self {
        Self {
            status: TaskStatus::Cancelled,
            error: None,
        }
    }
}

impl From<TransitionError> for Exit {
    fn from(e: TransitionError) -> Self {
        Exit::failed(format!("internal state error: {e}"))
    }
}

/// Full life of one launch request: submit until accepted, then describe until stopped.
///
/// The record is owned here and only copied out (to the [`TaskBoard`] and as the return value of
/// [`TaskLifecycle::start`]).
pub struct TaskLifecycle {
    id: TaskId,
    request: Arc<LaunchRequest>,
    label: String,
    config: LauncherConfig,
    record: TaskRecord,
    board: Option<TaskBoard>,
}

impl TaskLifecycle {
    pub fn new(id: TaskId, request: Arc<LaunchRequest>, config: LauncherConfig) -> Self {
        let label = request.label();
        Self {
            id,
            request,
            label,
            config,
            record: TaskRecord::new(),
            board: None,
        }
    }

    /// Mirror every transition to `board`.
    pub fn with_board(mut self, board: TaskBoard) -> Self {
        self.board = Some(board);
        self
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn record(&self) -> &TaskRecord {
        &self.record
    }

    /// Runs to a terminal status and fires `signal` exactly once.
    ///
    /// Never fails: launch errors, container failures, cancellation and deadline expiry all end
    /// up in the returned record.
    pub async fn start(
        mut self,
        api: &dyn TaskApi,
        sleeper: &dyn Sleeper,
        cancel: &CancellationToken,
        signal: CompletionSignal,
    ) -> TaskRecord {
        let exit = match self.config.deadline {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.drive(api, sleeper, cancel)).await {
                    Ok(exit) => exit,
                    Err(_) => Exit {
                        status: TaskStatus::TimedOut,
                        error: Some(format!("no terminal status within {deadline:?}")),
                    },
                }
            }
            None => self.drive(api, sleeper, cancel).await,
        };

        self.conclude(exit);
        signal.fire();
        self.record
    }

    async fn drive(
        &mut self,
        api: &dyn TaskApi,
        sleeper: &dyn Sleeper,
        cancel: &CancellationToken,
    ) -> Exit {
        if let Err(e) = self.request.validate() {
            error!(error = %e, "invalid launch request: {}", self.label);
            return Exit::failed(format!("invalid launch request: {e}"));
        }

        let reference = match self.launch(api, sleeper, cancel).await {
            Ok(reference) => reference,
            Err(exit) => return exit,
        };

        match self.poll(api, sleeper, cancel, &reference).await {
            Ok(exit) | Err(exit) => exit,
        }
    }

    async fn launch(
        &mut self,
        api: &dyn TaskApi,
        sleeper: &dyn Sleeper,
        cancel: &CancellationToken,
    ) -> Result<TaskReference, Exit> {
        loop {
            if cancel.is_cancelled() {
                return Err(Exit::cancelled());
            }
            self.record.begin_launch()?;
            self.publish();
            debug!(attempt = self.record.launch_attempts, "submitting launch");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Exit::cancelled()),
                res = api.submit_launch(&self.request) => res,
            };

            match classify_launch(&outcome) {
                LaunchVerdict::Accepted(reference) => {
                    self.record.mark_launched(reference.clone())?;
                    self.publish();
                    info!(
                        reference = %reference,
                        attempts = self.record.launch_attempts,
                        "task started: {}",
                        self.label
                    );
                    return Ok(reference);
                }
                LaunchVerdict::Retry(reason) => {
                    warn!(
                        attempt = self.record.launch_attempts,
                        backoff = ?self.config.launch_backoff,
                        "{reason}: {}",
                        self.label
                    );
                    self.pause(sleeper, self.config.launch_backoff, cancel).await?;
                }
                LaunchVerdict::Fatal(msg) => {
                    error!(attempt = self.record.launch_attempts, error = %msg, "launch failed: {}", self.label);
                    return Err(Exit::failed(msg));
                }
            }
        }
    }

    async fn poll(
        &mut self,
        api: &dyn TaskApi,
        sleeper: &dyn Sleeper,
        cancel: &CancellationToken,
        reference: &TaskReference,
    ) -> Result<Exit, Exit> {
        let mut consecutive_errors: u32 = 0;

        loop {
            self.record.begin_poll()?;
            self.publish();

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Exit::cancelled()),
                res = api.describe(&self.request.cluster, reference) => res,
            };

            match classify_describe(&outcome, reference) {
                PollVerdict::Succeeded => {
                    info!(reference = %reference, polls = self.record.polls, "task finished: {}", self.label);
                    return Ok(Exit::succeeded());
                }
                PollVerdict::Failed(msg) => {
                    error!(reference = %reference, error = %msg, "task failed: {}", self.label);
                    return Ok(Exit::failed(msg));
                }
                PollVerdict::Pending(remote_status) => {
                    consecutive_errors = 0;
                    info!(reference = %reference, status = %remote_status, "task status: {}", self.label);
                }
                PollVerdict::Retry(msg) => {
                    consecutive_errors += 1;
                    warn!(reference = %reference, error = %msg, consecutive_errors, "describe failed: {}", self.label);

                    if let Some(max) = self.config.max_poll_errors
                        && consecutive_errors >= max
                    {
                        return Ok(Exit::failed(format!(
                            "gave up after {consecutive_errors} consecutive describe errors: {msg}"
                        )));
                    }
                }
            }

            self.pause(sleeper, self.config.poll_interval, cancel).await?;
        }
    }

    async fn pause(
        &self,
        sleeper: &dyn Sleeper,
        duration: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), Exit> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Exit::cancelled()),
            _ = sleeper.sleep(duration) => Ok(()),
        }
    }

    fn conclude(&mut self, exit: Exit) {
        if let Err(e) = self.record.finish(exit.status, exit.error) {
            // Only reachable if a terminal status was already recorded; keep the first one.
            warn!(error = %e, "ignoring second terminal transition");
        }
        if self.record.status == TaskStatus::Cancelled {
            info!("task cancelled: {}", self.label);
        } else if self.record.status == TaskStatus::TimedOut {
            warn!(error = ?self.record.last_error, "task timed out: {}", self.label);
        }
        self.publish();
    }

    fn publish(&self) {
        if let Some(board) = &self.board {
            board.publish(&self.id, &self.record);
        }
    }
}
