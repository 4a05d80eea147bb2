//! Storage abstraction for session state and the flow stack.
//!
//! Both are pluggable. The in-memory implementations in [`memory`] are the
//! defaults; a persistent backend only has to make each call atomic per key.

mod memory;

use std::future::Future;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub use memory::{MemoryFlowStack, MemorySessionStore};

use crate::error::Result;
use crate::flow::{SessionKey, UserId, Values};
use crate::session::SessionState;

/// Storage backend for session state.
///
/// The service serializes events per [`SessionKey`], so implementations
/// never see concurrent writes for the same key.
pub trait SessionStore: Send + Sync + Clone + 'static {
    fn get(&self, key: &SessionKey) -> impl Future<Output = Result<Option<SessionState>>> + Send;

    fn set(&self, key: &SessionKey, state: SessionState) -> impl Future<Output = Result<()>> + Send;

    fn delete(&self, key: &SessionKey) -> impl Future<Output = Result<()>> + Send;

    /// All sessions of one user, in any order. Used to route plain messages
    /// to the most recently active flow.
    fn sessions_for(&self, user: &UserId)
    -> impl Future<Output = Result<Vec<SessionState>>> + Send;
}

/// A suspended parent flow.
///
/// The parent has already finished once: the frame keeps its collected
/// values so it can be resumed without prompting anything again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackFrame {
    /// Parent flow name.
    pub parent: String,
    /// The sub-flow the parent launched. Only its completion resumes the parent.
    pub child: String,
    /// The parent's collected values at the moment it finished.
    pub values: Values,
    /// The parent's sub-flow outcome text.
    pub text: String,
    /// Session the parent finished in, handed back on resume.
    pub session_id: Uuid,
    /// The parent's launch context.
    #[serde(default)]
    pub context: Values,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub pushed_at: OffsetDateTime,
}

impl StackFrame {
    pub fn new(
        parent: impl Into<String>,
        child: impl Into<String>,
        values: Values,
        text: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            parent: parent.into(),
            child: child.into(),
            values,
            text: text.into(),
            session_id: Uuid::nil(),
            context: Values::new(),
            started_at: now,
            pushed_at: now,
        }
    }

    /// Record which session the parent ran in.
    pub fn with_origin(mut self, session_id: Uuid, context: Values, started_at: OffsetDateTime) -> Self {
        self.session_id = session_id;
        self.context = context;
        self.started_at = started_at;
        self
    }
}

/// Stack of suspended parent flows, keyed by user.
///
/// `push` and `pop` must be atomic per user: parent and child sessions are
/// different session keys and may touch the same stack.
#[async_trait]
pub trait FlowStackStorage: Send + Sync {
    async fn push(&self, user: &UserId, frame: StackFrame) -> Result<()>;

    /// Remove and return the most recent frame if it was pushed for `child`.
    ///
    /// `None` means the finishing flow had no parent. A top frame waiting on
    /// another child stays where it is.
    async fn pop(&self, user: &UserId, child: &str) -> Result<Option<StackFrame>>;

    /// Number of frames currently stacked for `user`.
    async fn depth(&self, user: &UserId) -> Result<usize>;
}
