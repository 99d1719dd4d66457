#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use ecsl_core::{ApiError, Sleeper, TaskApi};
use ecsl_model::{
    ContainerState, DescribeResponse, Failure, LaunchRequest, LaunchResponse, RemoteTask, STOPPED,
    TaskEnv, TaskReference,
};

/// Scripted responses for one request; the last entry of each queue repeats.
#[derive(Clone, Default)]
pub struct Plan {
    launches: VecDeque<Result<LaunchResponse, ApiError>>,
    describes: VecDeque<Result<DescribeResponse, ApiError>>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launch(mut self, outcome: Result<LaunchResponse, ApiError>) -> Self {
        self.launches.push_back(outcome);
        self
    }

    pub fn empty_launch(self) -> Self {
        self.launch(Ok(LaunchResponse::default()))
    }

    pub fn rejected(self, reason: &str) -> Self {
        self.launch(Ok(LaunchResponse::rejected(vec![Failure::new(reason)])))
    }

    pub fn fatal(self) -> Self {
        self.launch(Err(ApiError::service(
            "ClusterNotFoundException",
            "Cluster not found.",
        )))
    }

    /// `label` must match the label of the request this plan is registered for.
    pub fn accept(self, label: &str) -> Self {
        self.launch(Ok(LaunchResponse::accepted(reference(label).as_str())))
    }

    pub fn status(mut self, label: &str, status: &str, times: usize) -> Self {
        for _ in 0..times {
            self.describes.push_back(Ok(DescribeResponse::task(RemoteTask::new(
                reference(label),
                status,
            ))));
        }
        self
    }

    pub fn describe_error(mut self) -> Self {
        self.describes
            .push_back(Err(ApiError::Transport("connection reset".into())));
        self
    }

    pub fn stopped(mut self, label: &str, exit_code: i32) -> Self {
        self.describes.push_back(Ok(DescribeResponse::task(
            RemoteTask::new(reference(label), STOPPED)
                .with_container(ContainerState::exited("worker", exit_code)),
        )));
        self
    }
}

pub fn reference(label: &str) -> TaskReference {
    TaskReference::new(format!("arn:aws:ecs:task/{label}"))
}

pub fn request(index: usize) -> LaunchRequest {
    LaunchRequest::new("cluster-name", "task-name")
        .with_override("worker", TaskEnv::new().with("index", index.to_string()))
}

pub fn label(index: usize) -> String {
    format!("index:{index}")
}

fn next<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// Fake remote API keyed by request label.
pub struct FakeApi {
    plans: Mutex<HashMap<String, Plan>>,
    call_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    in_flight_describes: AtomicUsize,
    max_in_flight_describes: AtomicUsize,
    launch_calls: AtomicUsize,
    describe_calls: AtomicUsize,
    stopped: Mutex<HashSet<String>>,
}

impl FakeApi {
    pub fn new(call_delay: Duration) -> Self {
        Self {
            plans: Mutex::new(HashMap::new()),
            call_delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            in_flight_describes: AtomicUsize::new(0),
            max_in_flight_describes: AtomicUsize::new(0),
            launch_calls: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
            stopped: Mutex::new(HashSet::new()),
        }
    }

    pub fn plan(self, label: impl Into<String>, plan: Plan) -> Self {
        self.plans.lock().unwrap().insert(label.into(), plan);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight_describes(&self) -> usize {
        self.max_in_flight_describes.load(Ordering::SeqCst)
    }

    pub fn launch_calls(&self) -> usize {
        self.launch_calls.load(Ordering::SeqCst)
    }

    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    /// Labels whose remote task has been reported `STOPPED`.
    pub fn stopped(&self) -> HashSet<String> {
        self.stopped.lock().unwrap().clone()
    }

    async fn enter(&self, counter: &AtomicUsize, max: &AtomicUsize) {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        if !self.call_delay.is_zero() {
            tokio::time::sleep(self.call_delay).await;
        }
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn submit_launch(&self, request: &LaunchRequest) -> Result<LaunchResponse, ApiError> {
        self.launch_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(&self.in_flight, &self.max_in_flight).await;

        let outcome = {
            let mut plans = self.plans.lock().unwrap();
            plans
                .get_mut(&request.label())
                .and_then(|p| next(&mut p.launches))
                .unwrap_or_else(|| Err(ApiError::service("Unscripted", request.label())))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    async fn describe(
        &self,
        _cluster: &str,
        task: &TaskReference,
    ) -> Result<DescribeResponse, ApiError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        self.enter(&self.in_flight, &self.max_in_flight).await;
        self.enter(&self.in_flight_describes, &self.max_in_flight_describes)
            .await;

        let label = task
            .as_str()
            .trim_start_matches("arn:aws:ecs:task/")
            .to_string();
        let outcome = {
            let mut plans = self.plans.lock().unwrap();
            plans
                .get_mut(&label)
                .and_then(|p| next(&mut p.describes))
                .unwrap_or_else(|| Err(ApiError::Transport(format!("unscripted {label}"))))
        };

        if let Ok(resp) = &outcome
            && resp.tasks.iter().any(|t| t.is_stopped())
        {
            self.stopped.lock().unwrap().insert(label);
        }

        self.in_flight_describes.fetch_sub(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

/// Sleeper that returns immediately and remembers each requested delay.
#[derive(Default)]
pub struct RecordingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}
