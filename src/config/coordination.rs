//! Coordination pool sizing and admission configuration.

use serde::{Deserialize, Serialize};

use crate::core::types::{DEFAULT_POOL_SIZE, MAX_POOL_SIZE, MAX_QUEUE_DEPTH};

/// Configuration consumed by `initialize_pool`. All bounds are clamped to the
/// pool's hard caps by `WorkerRegistry`/`TaskQueue` regardless of what is
/// configured here; `validate` exists to reject nonsensical input early with
/// a readable message, the way `PoolConfig::validate` did for the original
/// parking-lot pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoordinationConfig {
    /// Number of workers to spawn at `initialize_pool` time.
    pub pool_size: usize,
    /// Hard cap on live workers (defaults to the pool-wide `MAX_POOL_SIZE`).
    pub max_pool_size: usize,
    /// Hard cap on pending tasks (defaults to `MAX_QUEUE_DEPTH`).
    pub max_queue_depth: usize,
    /// When `true`, gated task types are rejected outright (rather than
    /// queued and held back) while the discovery dependency is unavailable.
    pub strict_admission: bool,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            max_pool_size: MAX_POOL_SIZE,
            max_queue_depth: MAX_QUEUE_DEPTH,
            strict_admission: false,
        }
    }
}

impl CoordinationConfig {
    /// Validate configured values against the pool's hard caps.
    ///
    /// # Errors
    /// Returns a message naming the out-of-range field.
    pub fn validate(&self) -> Result<(), String> {
        if self.pool_size == 0 {
            return Err("pool_size must be greater than 0".into());
        }
        if self.max_pool_size == 0 || self.max_pool_size > MAX_POOL_SIZE {
            return Err(format!("max_pool_size must be in 1..={MAX_POOL_SIZE}"));
        }
        if self.pool_size > self.max_pool_size {
            return Err("pool_size must not exceed max_pool_size".into());
        }
        if self.max_queue_depth == 0 || self.max_queue_depth > MAX_QUEUE_DEPTH {
            return Err(format!("max_queue_depth must be in 1..={MAX_QUEUE_DEPTH}"));
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate it.
    ///
    /// # Errors
    /// Returns a message on parse failure or a failed `validate`.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        CoordinationConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_pool_size_above_max_pool_size() {
        let cfg = CoordinationConfig { pool_size: 5, max_pool_size: 4, ..CoordinationConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_queue_depth_above_hard_cap() {
        let cfg = CoordinationConfig { max_queue_depth: MAX_QUEUE_DEPTH + 1, ..CoordinationConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn from_json_str_parses_and_validates() {
        let json = r#"{"pool_size": 2, "max_pool_size": 8, "max_queue_depth": 50, "strict_admission": true}"#;
        let cfg = CoordinationConfig::from_json_str(json).unwrap();
        assert_eq!(cfg.pool_size, 2);
        assert!(cfg.strict_admission);
    }
}
