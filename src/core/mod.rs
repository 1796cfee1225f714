//! Coordination pool: worker registry, task queue, dispatch policy, bounded
//! retry/failover, health gating, metrics, and isolation reporting, wired
//! together behind a single public facade.

pub mod admission;
pub mod audit;
pub mod dispatcher;
pub mod error;
pub mod facade;
pub mod failure;
pub mod health;
pub mod isolation;
pub mod metrics;
pub mod queue;
pub mod registry;
pub mod types;
pub mod worker_runtime;

pub use admission::AdmissionController;
pub use audit::{build_audit_event, AuditEvent, AuditSink, InMemoryAuditSink};
pub use error::{AppResult, SchedulerError};
pub use facade::CoordinationFacade;
pub use failure::{FailureHandler, FailureOutcome};
pub use health::{AlwaysAvailableProbe, DiscoveryProbe, HealthProbe, StaticProbe};
pub use isolation::{check_isolation, IsolationReport};
pub use metrics::{MetricsAggregator, MetricsSnapshot};
pub use queue::TaskQueue;
pub use registry::WorkerRegistry;
pub use types::{
    HealthState, Task, TaskStatus, TaskType, TaskTypeHistory, Worker, WorkerState,
    DEFAULT_POOL_SIZE, MAX_ATTEMPTS, MAX_POOL_SIZE, MAX_QUEUE_DEPTH,
};
pub use worker_runtime::{NullWorkerRuntime, WorkerRuntime};
