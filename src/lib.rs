//! # Coordination Pool
//!
//! A bounded, in-memory scheduler for a small fleet of long-lived agent
//! workers. It owns worker lifecycle, task admission, dispatch policy
//! (preferred worker, then history-based affinity, then any idle fallback),
//! bounded retry with failover, health-gated admission for tasks that depend
//! on an external discovery/migration service, and a pairwise isolation
//! report confirming no two live workers share mutable context.
//!
//! ## What this crate does not do
//!
//! Actual task execution (LLM calls, tool invocations) happens outside this
//! crate, behind the [`core::WorkerRuntime`] trait: the pool delivers a task
//! to a worker and is told the outcome later through
//! [`core::CoordinationFacade::complete_task`] or
//! [`core::CoordinationFacade::fail_worker`]. Likewise the discovery/migration
//! service's health is read through [`core::DiscoveryProbe`], never queried
//! directly.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use coordination_pool::config::CoordinationConfig;
//! use coordination_pool::builders::build_facade;
//! use coordination_pool::core::{AlwaysAvailableProbe, NullWorkerRuntime};
//! use coordination_pool::util::{SystemClock, UuidGen};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = CoordinationConfig::default();
//! let pool = build_facade(
//!     &cfg,
//!     Arc::new(SystemClock),
//!     Arc::new(UuidGen),
//!     Arc::new(NullWorkerRuntime),
//!     Arc::new(AlwaysAvailableProbe),
//!     None,
//! )?;
//!
//! let task_id = pool.submit_task("research", serde_json::json!({"query": "x"}), None).await?;
//! println!("{:?}", pool.task_status(task_id).await);
//! # Ok(())
//! # }
//! ```

#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Worker registry, task queue, dispatch policy, failure handling, health
/// gating, metrics, isolation reporting, and the public facade.
pub mod core;
/// Pool sizing and admission configuration.
pub mod config;
/// Builders to construct a facade from configuration.
pub mod builders;
/// Shared utilities: clock, id generation, telemetry setup.
pub mod util;
