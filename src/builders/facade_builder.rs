//! Assembles a `CoordinationFacade` from a `CoordinationConfig` plus the
//! external collaborators a deployment supplies (clock, id generator, worker
//! runtime, discovery probe, optional audit sink).

use std::sync::Arc;

use crate::config::CoordinationConfig;
use crate::core::{CoordinationFacade, SchedulerError};
use crate::core::audit::AuditSink;
use crate::core::health::DiscoveryProbe;
use crate::core::worker_runtime::WorkerRuntime;
use crate::util::{Clock, IdGen};

/// Validate `cfg` and spawn a ready-to-use coordination pool.
///
/// # Errors
/// Returns `SchedulerError::PoolFull` if the configured `pool_size` exceeds
/// `max_pool_size` (config-level validation is the caller's responsibility
/// via `CoordinationConfig::validate`, but this guards the same invariant at
/// the point the registry is actually built).
pub fn build_facade(
    cfg: &CoordinationConfig,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn IdGen>,
    worker_runtime: Arc<dyn WorkerRuntime>,
    discovery_probe: Arc<dyn DiscoveryProbe>,
    audit: Option<Box<dyn AuditSink>>,
) -> Result<CoordinationFacade, SchedulerError> {
    CoordinationFacade::initialize_pool(
        cfg.pool_size,
        cfg.max_pool_size,
        cfg.max_queue_depth,
        cfg.strict_admission,
        clock,
        id_gen,
        worker_runtime,
        discovery_probe,
        audit,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::health::AlwaysAvailableProbe;
    use crate::core::worker_runtime::NullWorkerRuntime;
    use crate::util::{SystemClock, UuidGen};

    #[test]
    fn builds_a_facade_from_default_config() {
        let cfg = CoordinationConfig::default();
        let facade = build_facade(
            &cfg,
            Arc::new(SystemClock),
            Arc::new(UuidGen),
            Arc::new(NullWorkerRuntime),
            Arc::new(AlwaysAvailableProbe),
            None,
        );
        assert!(facade.is_ok());
    }

    #[test]
    fn rejects_pool_size_above_configured_cap() {
        let cfg = CoordinationConfig { pool_size: 5, max_pool_size: 4, ..CoordinationConfig::default() };
        let facade = build_facade(
            &cfg,
            Arc::new(SystemClock),
            Arc::new(UuidGen),
            Arc::new(NullWorkerRuntime),
            Arc::new(AlwaysAvailableProbe),
            None,
        );
        assert!(matches!(facade, Err(SchedulerError::PoolFull(_))));
    }
}
