//! Finish handler trait.

use async_trait::async_trait;

use super::context::FinishContext;
use crate::flow::{Flow, FinishOutcome};

/// Completion callback for one flow.
///
/// Receives the fully collected record. Hidden and skipped fields arrive as
/// `None`.
///
/// # Results
///
/// | Result | Meaning |
/// |--------|---------|
/// | `Ok(outcome)` | Reply, and optionally redirect or start a sub-flow |
/// | `Err(_)` | Rendered to the user as `Error: {err}`; the session is gone and nothing is retried |
///
/// # Example
///
/// ```ignore
/// struct SignupHandler {
///     db: Database,
/// }
///
/// #[async_trait]
/// impl FinishHandler for SignupHandler {
///     type Flow = Signup;
///     type Error = DbError;
///
///     async fn finish(&self, record: Signup, ctx: &FinishContext) -> Result<FinishOutcome, DbError> {
///         self.db.save(ctx.user.as_str(), &record).await?;
///         Ok(FinishOutcome::sub_flow("Account created. Now pick a team.", "team"))
///     }
/// }
/// ```
#[async_trait]
pub trait FinishHandler: Send + Sync + 'static {
    /// The flow this handler completes.
    type Flow: Flow;

    /// Domain error. Its `Display` text is shown to the user.
    type Error: std::fmt::Display + Send + 'static;

    async fn finish(
        &self,
        record: Self::Flow,
        ctx: &FinishContext,
    ) -> Result<FinishOutcome, Self::Error>;

    /// Called once when a sub-flow started by this flow's outcome
    /// completes. `record` is the record this flow finished with.
    async fn resume(
        &self,
        _record: Self::Flow,
        _ctx: &FinishContext,
    ) -> Result<FinishOutcome, Self::Error> {
        Ok(FinishOutcome::message(format!(
            "Returned to /{}.",
            <Self::Flow as Flow>::NAME
        )))
    }
}
