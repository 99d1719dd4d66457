//! Data model shared by the launcher core and its API backends.
//!
//! Nothing in this crate performs I/O. Requests are built by the caller, records are owned by a
//! single lifecycle, and the remote shapes mirror what a cluster task API returns.

mod kv;
pub use kv::KeyValue;

mod task_env;
pub use task_env::TaskEnv;

mod request;
pub use request::{ContainerOverride, LaunchRequest, RequestError};

mod task_id;
pub use task_id::{TaskId, TaskReference};

mod task_status;
pub use task_status::TaskStatus;

mod record;
pub use record::{TaskRecord, TransitionError};

mod remote;
pub use remote::{
    ContainerState, DescribeResponse, Failure, LaunchResponse, RemoteTask, STOPPED, TaskHandle,
};

mod report;
pub use report::TaskReport;
