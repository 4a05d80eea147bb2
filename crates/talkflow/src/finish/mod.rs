//! Completion handling for finished flows.
//!
//! - [`FinishHandler`]: per-flow completion callback and stack resume
//! - [`FinishContext`]: session metadata handed to the callback

mod context;
pub(crate) mod handler;

pub use context::FinishContext;
pub use handler::FinishHandler;
