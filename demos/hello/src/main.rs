use std::{env, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ecsl_core::{Launcher, LauncherConfig, TaskBoard};
use ecsl_ecs::{AwsConfig, EcsTaskApi};
use ecsl_model::{LaunchRequest, TaskEnv, TaskStatus};
use ecsl_observe::{LoggerConfig, LoggerFormat, LoggerLevel, init_logger};

fn var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// One request per index, each carrying `index=<i>` in the container environment.
fn build_requests(cluster: &str, definition: &str, container: &str, n: usize) -> Vec<LaunchRequest> {
    (0..n)
        .map(|i| {
            LaunchRequest::new(cluster, definition)
                .with_override(container, TaskEnv::new().with("index", i.to_string()))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) Logger
    let cfg = LoggerConfig {
        level: LoggerLevel::new(var("ECSL_LOG_LEVEL", "info"))?,
        format: var("ECSL_LOG_FORMAT", "text").parse::<LoggerFormat>()?,
        ..Default::default()
    };
    init_logger(&cfg)?;

    // 2) ECS client
    let aws = AwsConfig::new(var("ECSL_REGION", ""))
        .with_keys(var("ECSL_ACCESS_KEY_ID", ""), var("ECSL_SECRET_ACCESS_KEY", ""));
    let api = EcsTaskApi::connect(&aws).await?;

    // 3) Launcher
    let launcher = Launcher::new(Arc::new(api), LauncherConfig::default())?;
    let count: usize = var("ECSL_COUNT", "10").parse()?;
    let requests = build_requests(
        &var("ECSL_CLUSTER", "cluster-name"),
        &var("ECSL_TASK_DEFINITION", "task-name"),
        &var("ECSL_CONTAINER", "container-name"),
        count,
    );

    // 4) Ctrl+C cancels every lifecycle still running
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling batch");
            on_signal.cancel();
        }
    });

    // 5) Periodic progress from the shared board
    let board = TaskBoard::new();
    let progress = {
        let board = board.clone();
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(30));
            loop {
                tick.tick().await;
                info!(
                    done = board.count_terminal(),
                    total = board.len(),
                    "batch progress"
                );
            }
        })
    };

    let reports = launcher.run_observed(requests, board, cancel).await;
    progress.abort();

    for report in &reports {
        info!(
            index = report.index,
            label = %report.label,
            status = %report.record.status,
            error = report.record.last_error.as_deref().unwrap_or(""),
            "task finished"
        );
    }
    if env::var("ECSL_REPORT_JSON").is_ok() {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    let failed = reports
        .iter()
        .filter(|r| r.record.status != TaskStatus::Succeeded)
        .count();
    if failed > 0 {
        return Err(format!("{failed} of {} tasks did not succeed", reports.len()).into());
    }
    info!("all tasks succeeded");
    Ok(())
}
