//! Builders to construct scheduler components from configuration.

pub mod scheduler_builder;

pub use scheduler_builder::{build_bridge_options, build_scheduler, build_worker_pool};
