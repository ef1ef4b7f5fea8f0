//! Pending-task queue backends.

pub mod memory;

pub use memory::PriorityQueue;
