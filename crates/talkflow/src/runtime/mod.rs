//! Service assembly: configuration, flow registration and per-session
//! locking.
//!
//! - [`FlowServiceBuilder`]: registers flows with their finish handlers
//! - [`FlowServiceConfig`]: theme, skip keyword and session TTL
//!
//! # Example
//!
//! ```ignore
//! use talkflow::{FlowService, FlowServiceConfig, MemorySessionStore};
//!
//! let service = FlowService::builder(MemorySessionStore::new(), FlowServiceConfig::default())
//!     .register(SignupHandler)
//!     .register(TeamHandler)
//!     .build()?;
//! ```

mod config;
pub(crate) mod lock;
pub(crate) mod registry;

pub use config::FlowServiceConfig;
pub use registry::FlowServiceBuilder;
