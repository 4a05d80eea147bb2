//! Multi-step chat conversations as typed flows.
//!
//! Talkflow turns a record type into a conversation that collects it one
//! field at a time:
//!
//! - **Typed records**: a flow is a `serde` struct; `#[derive(FlowRecord)]`
//!   exposes its shape so definitions are checked against it at registration
//! - **Widgets**: each field is rendered and interpreted by a [`Widget`]
//!   (text entry, buttons, pickers, media)
//! - **Conditional fields**: visibility predicates with declared dependencies
//! - **Transforms**: cancel, back, progress, summary and stacking layered over
//!   every flow
//! - **Sub-flows**: a finished flow can suspend itself on a stack, run a child
//!   flow, and resume once the child completes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          FlowService<S>                                 │
//! │                                                                         │
//! │   1. Resolve the session key (launch, message routing, callback hash)   │
//! │   2. Lock the key                                                       │
//! │   3. Load session state (TTL-aware)                                     │
//! │   4. Engine: intercepts → widget → validators → next visible field      │
//! │   5. Persist, or delete and run finish / resume                         │
//! │   6. Release the lock, then start any pending sub-flow                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use talkflow::{
//!     Field, FinishContext, FinishHandler, FinishOutcome, Flow, FlowRecord, FlowService,
//!     FlowServiceConfig, MemorySessionStore, Transform, When,
//!     widget::{Inline, TextInput},
//! };
//!
//! #[derive(FlowRecord, Serialize, Deserialize)]
//! struct Signup {
//!     name: String,
//!     plan: String,
//!     promo_code: Option<String>,
//! }
//!
//! impl Flow for Signup {
//!     const NAME: &'static str = "signup";
//!
//!     fn fields() -> Vec<Field> {
//!         vec![
//!             Field::new("name").widget(TextInput::new("Your name?")),
//!             Field::new("plan").widget(Inline::new("Plan?").option("free", "Free").option("pro", "Pro")),
//!             Field::new("promo_code")
//!                 .widget(TextInput::new("Promo code?"))
//!                 .visible_when(When::equals("plan", "pro")),
//!         ]
//!     }
//!
//!     fn transforms() -> Vec<Transform> {
//!         vec![Transform::cancel(), Transform::back(), Transform::Progress]
//!     }
//! }
//!
//! struct SignupHandler;
//!
//! #[async_trait]
//! impl FinishHandler for SignupHandler {
//!     type Flow = Signup;
//!     type Error = std::convert::Infallible;
//!
//!     async fn finish(&self, record: Signup, _ctx: &FinishContext) -> Result<FinishOutcome, Self::Error> {
//!         Ok(FinishOutcome::message(format!("Welcome, {}!", record.name)))
//!     }
//! }
//!
//! let service = FlowService::builder(MemorySessionStore::new(), FlowServiceConfig::default())
//!     .register(SignupHandler)
//!     .build()?;
//!
//! let turn = service.start::<Signup>("42").await?;
//! ```
//!
//! # Design Documentation
//!
//! See `DESIGN.md` for architectural decisions.

// Allow the crate to reference itself as `talkflow` for macro-generated code
extern crate self as talkflow;

mod engine;
mod error;
mod field;
pub mod finish;
mod flow;
mod record;
pub mod runtime;
mod service;
mod session;
pub mod store;
mod transform;
pub mod validation;
pub mod visualization;
pub mod widget;

pub use engine::{Delivery, Redirect, Reply, Turn, TurnStatus};
pub use error::{Error, Result};
pub use field::{BoxError, Field, FlowDefinition, OptionsProvider, When, flow_hash};
pub use finish::{FinishContext, FinishHandler};
pub use flow::{FinishOutcome, Flow, LaunchMode, SessionKey, ShowMode, UserId, Values};
pub use nonempty::NonEmpty;
pub use record::{FlowRecord, RecordField, ValueKind};
pub use runtime::{FlowServiceBuilder, FlowServiceConfig};
pub use service::FlowService;
pub use session::{Answer, Phase, SessionState};
pub use store::{FlowStackStorage, MemoryFlowStack, MemorySessionStore, SessionStore, StackFrame};
pub use transform::{Transform, TransformSet};
pub use validation::Validator;
pub use visualization::{FieldOutline, FlowOutline, SessionInfo};
pub use widget::{Keyboard, MessageContent, Options, Widget, WidgetContext, WidgetResult};

// Re-export derive macros
pub use talkflow_macros::FlowRecord;
