//! Infrastructure adapters for pending-task storage.

pub mod queue;

pub use queue::PriorityQueue;
