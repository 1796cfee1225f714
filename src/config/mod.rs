//! Configuration models for the coordination pool.

pub mod coordination;

pub use coordination::CoordinationConfig;
