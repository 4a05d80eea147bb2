//! Completion context.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::flow::{UserId, Values};

/// Context provided to [`FinishHandler`](super::FinishHandler) calls.
///
/// # Example
///
/// ```ignore
/// async fn finish(&self, record: Signup, ctx: &FinishContext) -> Result<FinishOutcome, DbError> {
///     self.db.insert_user(ctx.user.as_str(), &record).await?;
///     Ok(FinishOutcome::message(format!("Welcome, {}!", record.name)))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FinishContext {
    /// The session that collected the record.
    pub session_id: Uuid,
    pub flow: &'static str,
    pub user: UserId,
    /// Launch context the session was started with.
    pub context: Values,
    pub started_at: OffsetDateTime,
    /// Set on [`resume`](super::FinishHandler::resume): the sub-flow that
    /// just completed.
    pub resumed_from: Option<String>,
}

impl FinishContext {
    pub fn new(
        session_id: Uuid,
        flow: &'static str,
        user: UserId,
        context: Values,
        started_at: OffsetDateTime,
    ) -> Self {
        Self {
            session_id,
            flow,
            user,
            context,
            started_at,
            resumed_from: None,
        }
    }

    pub(crate) fn resumed(mut self, child: impl Into<String>) -> Self {
        self.resumed_from = Some(child.into());
        self
    }

    pub fn is_resume(&self) -> bool {
        self.resumed_from.is_some()
    }
}
