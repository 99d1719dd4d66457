use std::sync::Arc;

use ecsl_model::{LaunchRequest, TaskId, TaskReport, TaskStatus};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, instrument};

use crate::{
    api::TaskApi,
    barrier::{CompletionSignal, Countdown},
    board::TaskBoard,
    config::LauncherConfig,
    error::CoreError,
    lifecycle::TaskLifecycle,
    sleeper::{Sleeper, TokioSleeper},
};

/// A lifecycle together with the signal it must fire.
struct Unit {
    lifecycle: TaskLifecycle,
    signal: CompletionSignal,
}

/// Runs batches of launch requests and waits for all of them.
pub struct Launcher {
    api: Arc<dyn TaskApi>,
    sleeper: Arc<dyn Sleeper>,
    config: LauncherConfig,
}

impl Launcher {
    pub fn new(api: Arc<dyn TaskApi>, config: LauncherConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            api,
            sleeper: Arc::new(TokioSleeper),
            config,
        })
    }

    /// Replace the clock used for backoff waits.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    /// Launches every request and blocks until each one is terminal.
    ///
    /// Individual failures never abort the batch; inspect the returned reports (in request
    /// order) for per-task outcomes.
    pub async fn run(&self, requests: Vec<LaunchRequest>) -> Vec<TaskReport> {
        self.run_with_cancel(requests, CancellationToken::new()).await
    }

    /// Like [`Launcher::run`], stopping every lifecycle as `Cancelled` once `cancel` fires.
    ///
    /// Still waits for all lifecycles to acknowledge the cancellation.
    pub async fn run_with_cancel(
        &self,
        requests: Vec<LaunchRequest>,
        cancel: CancellationToken,
    ) -> Vec<TaskReport> {
        self.run_observed(requests, TaskBoard::new(), cancel).await
    }

    /// Like [`Launcher::run_with_cancel`], publishing progress to `board` while running.
    ///
    /// `board` may be reused across batches; the returned reports cover this call's requests only.
    #[instrument(level = "info", skip_all, fields(tasks = requests.len()))]
    pub async fn run_observed(
        &self,
        requests: Vec<LaunchRequest>,
        board: TaskBoard,
        cancel: CancellationToken,
    ) -> Vec<TaskReport> {
        let countdown = Countdown::new();
        let mut ids = Vec::with_capacity(requests.len());

        let units: Vec<Unit> = requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let id = TaskId::generate();
                let lifecycle = TaskLifecycle::new(id.clone(), Arc::new(request), self.config.clone())
                    .with_board(board.clone());
                board.register(id.clone(), index, lifecycle.label().to_string());
                ids.push(id);
                Unit {
                    lifecycle,
                    signal: countdown.register(),
                }
            })
            .collect();

        info!(
            tasks = units.len(),
            workers = ?self.config.max_concurrency,
            "launching batch"
        );

        match self.config.max_concurrency {
            None => {
                for unit in units {
                    self.spawn_unit(unit, cancel.clone());
                }
            }
            Some(workers) => self.spawn_pool(units, workers, cancel.clone()),
        }

        countdown.wait().await;

        // The board may be shared with other batches; report only the ids registered here.
        let reports = finalize(ids.iter().filter_map(|id| board.get(id)).collect());
        log_summary(&reports);
        reports
    }

    fn spawn_unit(&self, unit: Unit, cancel: CancellationToken) {
        let api = Arc::clone(&self.api);
        let sleeper = Arc::clone(&self.sleeper);

        tokio::spawn(async move {
            run_unit(unit, api.as_ref(), sleeper.as_ref(), &cancel).await;
        });
    }

    /// Fixed set of `workers` fed through a bounded queue.
    fn spawn_pool(&self, units: Vec<Unit>, workers: usize, cancel: CancellationToken) {
        let (tx, rx) = mpsc::channel::<Unit>(workers);
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..workers {
            let rx = Arc::clone(&rx);
            let api = Arc::clone(&self.api);
            let sleeper = Arc::clone(&self.sleeper);
            let cancel = cancel.clone();

            tokio::spawn(
                async move {
                    loop {
                        let next = rx.lock().await.recv().await;
                        let Some(unit) = next else { break };
                        run_unit(unit, api.as_ref(), sleeper.as_ref(), &cancel).await;
                    }
                }
                .instrument(info_span!("worker", worker)),
            );
        }

        tokio::spawn(async move {
            for unit in units {
                // A send only fails once every worker is gone; the dropped unit still fires
                // its signal and is reported as aborted.
                if tx.send(unit).await.is_err() {
                    break;
                }
            }
        });
    }
}

async fn run_unit(unit: Unit, api: &dyn TaskApi, sleeper: &dyn Sleeper, cancel: &CancellationToken) {
    let Unit { lifecycle, signal } = unit;
    let span = info_span!("task", id = %lifecycle.id(), label = %lifecycle.label());

    lifecycle
        .start(api, sleeper, cancel, signal)
        .instrument(span)
        .await;
}

/// Marks lifecycles that vanished without a terminal status (panic, dropped unit) as failed.
fn finalize(mut reports: Vec<TaskReport>) -> Vec<TaskReport> {
    for report in reports.iter_mut().filter(|r| !r.record.is_terminal()) {
        error!(
            id = %report.id,
            status = %report.record.status,
            "lifecycle ended without a terminal status: {}",
            report.label
        );
        report.record.status = TaskStatus::Failed;
        report.record.last_error = Some("lifecycle aborted before reaching a terminal status".into());
    }
    reports
}

fn log_summary(reports: &[TaskReport]) {
    let count = |status: TaskStatus| reports.iter().filter(|r| r.record.status == status).count();

    info!(
        total = reports.len(),
        succeeded = count(TaskStatus::Succeeded),
        failed = count(TaskStatus::Failed),
        cancelled = count(TaskStatus::Cancelled),
        timed_out = count(TaskStatus::TimedOut),
        "batch complete"
    );
}
