//! Runtime adapters: explicit handles to the execution context a caller is in.

pub mod loop_context;

pub use loop_context::LoopContext;
