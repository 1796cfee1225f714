//! Opaque identifier generation for workers, tasks, and resources.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque worker identifier. The core makes no assumption about layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(Uuid);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque task identifier. The core makes no assumption about layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque resource identifier, used for the three isolation fingerprint
/// fields (`context_id`, `tool_session_id`, `memory_handle_id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(Uuid);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generator for opaque unique identifiers. The core depends only on this
/// trait, never directly on `Uuid`, so a deployment can swap in its own
/// scheme (e.g. ULIDs, sequence-backed ids) without touching the scheduler.
pub trait IdGen: Send + Sync {
    /// Generate a new unique worker id.
    fn next_worker_id(&self) -> WorkerId;
    /// Generate a new unique task id.
    fn next_task_id(&self) -> TaskId;
    /// Generate a new unique resource id (used for isolation fingerprints).
    fn next_resource_id(&self) -> ResourceId;
}

/// Production id generator backed by UUIDv4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGen;

impl IdGen for UuidGen {
    fn next_worker_id(&self) -> WorkerId {
        WorkerId(Uuid::new_v4())
    }

    fn next_task_id(&self) -> TaskId {
        TaskId(Uuid::new_v4())
    }

    fn next_resource_id(&self) -> ResourceId {
        ResourceId(Uuid::new_v4())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let gen = UuidGen;
        let a = gen.next_worker_id();
        let b = gen.next_worker_id();
        assert_ne!(a, b);
    }

    #[test]
    fn ids_display_as_uuid_string() {
        let gen = UuidGen;
        let id = gen.next_task_id();
        assert_eq!(id.to_string().len(), 36);
    }
}
