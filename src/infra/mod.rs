//! Infrastructure adapters and runtime bootstrap.

pub mod blob;
pub mod error;
pub mod telemetry;
