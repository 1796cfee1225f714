//! Shared utilities: clock, id generation, and telemetry setup.

pub mod clock;
pub mod ids;
pub mod telemetry;

pub use clock::{Clock, FakeClock, SystemClock};
pub use ids::{IdGen, ResourceId, TaskId, UuidGen, WorkerId};
pub use telemetry::init_tracing;
