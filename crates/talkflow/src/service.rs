//! Flow service entrypoint.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::engine::{
    Delivery, Engine, Input, Redirect, Reply, Step, Turn, TurnStatus, collected_values,
};
use crate::error::{Error, Result};
use crate::field::FlowDefinition;
use crate::finish::FinishContext;
use crate::flow::{FinishOutcome, Flow, LaunchMode, SessionKey, UserId, Values};
use crate::runtime::FlowServiceConfig;
use crate::runtime::FlowServiceBuilder;
use crate::runtime::lock::SessionLocks;
use crate::runtime::registry::{FlowEntry, FlowRegistry};
use crate::session::SessionState;
use crate::store::{FlowStackStorage, MemorySessionStore, SessionStore, StackFrame};
use crate::visualization::{FlowOutline, SessionInfo};
use crate::widget::{CallbackData, MessageContent, fill};

/// A child flow to start once the parent's session lock is released.
struct PendingStart {
    user: UserId,
    flow: String,
    context: Values,
}

/// A finished turn plus an optional child start.
struct Handled {
    turn: Turn,
    start: Option<PendingStart>,
}

impl Handled {
    fn done(turn: Turn) -> Self {
        Self { turn, start: None }
    }
}

/// App-facing flow service.
///
/// This is the single entrypoint for transport adapters: launch commands,
/// free-form messages and button callbacks all go through it, and every
/// call returns the [`Turn`] to render.
///
/// Events for the same (user, flow) key are serialized; different keys run
/// concurrently. The service is cheap to clone.
///
/// # Example
///
/// ```ignore
/// let service = FlowService::builder(MemorySessionStore::new(), FlowServiceConfig::default())
///     .register(SignupHandler)
///     .build()?;
///
/// let turn = service.start::<Signup>(user_id).await?;
/// let turn = service.message(user_id, &MessageContent::text("Ada")).await?;
/// let turn = service.callback(user_id, &callback_data).await?;
/// ```
#[derive(Clone)]
pub struct FlowService<S: SessionStore = MemorySessionStore> {
    store: S,
    stack: Arc<dyn FlowStackStorage>,
    registry: Arc<FlowRegistry>,
    locks: Arc<SessionLocks>,
    config: FlowServiceConfig,
}

impl<S: SessionStore> FlowService<S> {
    /// Create a new service builder.
    pub fn builder(store: S, config: FlowServiceConfig) -> FlowServiceBuilder<S> {
        FlowServiceBuilder::new(store, config)
    }

    pub(crate) fn new(
        store: S,
        stack: Arc<dyn FlowStackStorage>,
        registry: Arc<FlowRegistry>,
        locks: Arc<SessionLocks>,
        config: FlowServiceConfig,
    ) -> Self {
        Self {
            store,
            stack,
            registry,
            locks,
            config,
        }
    }

    /// Launch a typed flow by its command.
    pub async fn start<F: Flow>(&self, user: impl Into<UserId>) -> Result<Turn> {
        self.launch(user, F::NAME, &format!("/{}", F::NAME), Values::new())
            .await
    }

    /// Launch a flow by name.
    ///
    /// `text` is the triggering message, used as field input under the
    /// standard launch mode when a session is already active. `context`
    /// fills prefilled fields.
    pub async fn launch(
        &self,
        user: impl Into<UserId>,
        flow: &str,
        text: &str,
        context: Values,
    ) -> Result<Turn> {
        let user = user.into();
        let Some((name, entry)) = self.registry.get(flow) else {
            return Err(Error::UnknownFlow(flow.to_string()));
        };
        let key = SessionKey::new(user.clone(), name);

        let handled = {
            let _guard = self.locks.lock(&key).await;
            match self.load(&key).await? {
                None => self.begin(name, entry, user, context).await?,
                Some(mut session) => {
                    let def = entry.definition();
                    let mode = def.launch_mode();
                    debug!(flow = name, user = %user, ?mode, "launch while active");
                    match mode {
                        LaunchMode::Standard => {
                            let content = MessageContent::text(text);
                            let step = self
                                .engine(def)
                                .handle(&mut session, Input::Message(&content))
                                .await?;
                            self.settle(name, entry, session, step).await?
                        }
                        LaunchMode::Reset => {
                            self.store.delete(&key).await?;
                            self.begin(name, entry, user, context).await?
                        }
                        LaunchMode::Exclusive => {
                            let notice =
                                fill(&self.config.theme.action.already_running, &[&name]);
                            Handled::done(Turn::active(vec![Reply::send(notice)]))
                        }
                        LaunchMode::SingleTop => {
                            let reply = self.engine(def).rerender(&mut session)?;
                            session.touch();
                            self.store.set(&key, session).await?;
                            Handled::done(Turn::active(vec![reply]))
                        }
                    }
                }
            }
        };

        self.follow_up(handled).await
    }

    /// Route a free-form message to the user's most recently active
    /// session.
    pub async fn message(&self, user: impl Into<UserId>, content: &MessageContent) -> Result<Turn> {
        let user = user.into();
        let now = OffsetDateTime::now_utc();
        let target = self
            .store
            .sessions_for(&user)
            .await?
            .into_iter()
            .filter(|s| !self.is_expired(s, now))
            .filter(|s| self.registry.get(&s.flow).is_some())
            .max_by_key(|s| s.updated_at);
        let Some(target) = target else {
            return Ok(Turn::no_session());
        };
        let Some((name, entry)) = self.registry.get(&target.flow) else {
            return Ok(Turn::no_session());
        };
        let key = SessionKey::new(user, name);

        let handled = {
            let _guard = self.locks.lock(&key).await;
            // Re-read under the lock: a queued cancel may have removed it.
            let Some(mut session) = self.load(&key).await? else {
                return Ok(Turn::no_session());
            };
            let step = self
                .engine(entry.definition())
                .handle(&mut session, Input::Message(content))
                .await?;
            self.settle(name, entry, session, step).await?
        };

        self.follow_up(handled).await
    }

    /// Handle raw button callback data.
    ///
    /// Malformed data and buttons of flows that are no longer registered
    /// are ignored.
    pub async fn callback(&self, user: impl Into<UserId>, raw: &str) -> Result<Turn> {
        let user = user.into();
        let Some(data) = CallbackData::decode(raw) else {
            debug!(user = %user, "malformed callback data ignored");
            return Ok(Turn::ignored());
        };
        let Some((name, entry)) = self.registry.by_hash(&data.flow) else {
            warn!(user = %user, hash = %data.flow, "stale callback ignored");
            return Ok(Turn::ignored());
        };
        let key = SessionKey::new(user, name);

        let handled = {
            let _guard = self.locks.lock(&key).await;
            let Some(mut session) = self.load(&key).await? else {
                return Ok(Turn::no_session());
            };
            let step = self
                .engine(entry.definition())
                .handle(&mut session, Input::Callback(&data.value))
                .await?;
            self.settle(name, entry, session, step).await?
        };

        self.follow_up(handled).await
    }

    /// Static outline of a registered flow.
    pub fn describe(&self, flow: &str) -> Result<FlowOutline> {
        let (_, entry) = self
            .registry
            .get(flow)
            .ok_or_else(|| Error::UnknownFlow(flow.to_string()))?;
        Ok(FlowOutline::from_definition(entry.definition()))
    }

    /// Snapshot of an active session, if there is one.
    pub async fn inspect(&self, key: &SessionKey) -> Result<Option<SessionInfo>> {
        let Some((_, entry)) = self.registry.get(&key.flow) else {
            return Err(Error::UnknownFlow(key.flow.clone()));
        };
        let _guard = self.locks.lock(key).await;
        let Some(session) = self.load(key).await? else {
            return Ok(None);
        };
        let def = entry.definition();

        let status = if session.is_reviewing() { "reviewing" } else { "filling" };
        let mut info = SessionInfo::new(status)
            .with_timestamps(session.started_at, session.updated_at);
        for answer in &session.answers {
            info = info.with_answer(answer.field.clone(), answer.summary.clone());
        }
        if let Some((idx, field)) = session
            .current
            .and_then(|idx| def.field(idx).map(|f| (idx, f)))
        {
            let (pos, total) = self.engine(def).progress(&session, idx);
            info = info.with_current(field.name()).with_progress(pos, total);
        }
        Ok(Some(info))
    }

    /// Number of frames stacked for `user`.
    pub async fn stack_depth(&self, user: &UserId) -> Result<usize> {
        self.stack.depth(user).await
    }

    /// Returns the number of registered flows.
    pub fn flow_count(&self) -> usize {
        self.registry.len()
    }

    /// Registered flow names, sorted.
    pub fn flow_names(&self) -> Vec<&'static str> {
        self.registry.names()
    }

    /// Returns the service configuration.
    pub fn config(&self) -> &FlowServiceConfig {
        &self.config
    }

    fn engine<'a>(&'a self, def: &'a FlowDefinition) -> Engine<'a> {
        Engine::new(def, &self.config, OffsetDateTime::now_utc().date())
    }

    fn is_expired(&self, session: &SessionState, now: OffsetDateTime) -> bool {
        self.config
            .session_ttl
            .is_some_and(|ttl| session.is_expired(ttl, now))
    }

    /// Load a session, deleting it if it has outlived the TTL.
    async fn load(&self, key: &SessionKey) -> Result<Option<SessionState>> {
        let Some(session) = self.store.get(key).await? else {
            return Ok(None);
        };
        if self.is_expired(&session, OffsetDateTime::now_utc()) {
            debug!(flow = %key.flow, user = %key.user, "session expired");
            self.store.delete(key).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn begin(
        &self,
        name: &'static str,
        entry: &dyn FlowEntry,
        user: UserId,
        context: Values,
    ) -> Result<Handled> {
        let mut session = SessionState::new(name, user, context);
        info!(
            flow = name,
            user = %session.user,
            session_id = %session.session_id,
            "session started"
        );
        let step = self
            .engine(entry.definition())
            .start(&mut session)
            .await?;
        self.settle(name, entry, session, step).await
    }

    /// Persist or tear down the session according to the engine's step.
    async fn settle(
        &self,
        name: &'static str,
        entry: &dyn FlowEntry,
        mut session: SessionState,
        step: Step,
    ) -> Result<Handled> {
        match step {
            Step::Ignored => Ok(Handled::done(Turn::ignored())),
            Step::Continue(replies) => {
                session.touch();
                self.store.set(&session.key(), session).await?;
                Ok(Handled::done(Turn::active(replies)))
            }
            Step::Cancelled(replies) => {
                self.store.delete(&session.key()).await?;
                info!(
                    flow = name,
                    user = %session.user,
                    session_id = %session.session_id,
                    transition = "cancel",
                    "session cancelled"
                );
                Ok(Handled::done(Turn::new(replies, TurnStatus::Cancelled)))
            }
            Step::Complete(replies) => self.complete(name, entry, session, replies).await,
        }
    }

    async fn complete(
        &self,
        name: &'static str,
        entry: &dyn FlowEntry,
        session: SessionState,
        mut replies: Vec<Reply>,
    ) -> Result<Handled> {
        let values = collected_values(entry.definition(), &session);
        let ctx = FinishContext::new(
            session.session_id,
            name,
            session.user.clone(),
            session.context.clone(),
            session.started_at,
        );
        // A record that fails to decode leaves the stored session in place.
        let finished = entry.finish(values.clone(), &ctx).await?;
        self.store.delete(&session.key()).await?;
        info!(
            flow = name,
            user = %session.user,
            session_id = %session.session_id,
            answers = session.answers.len(),
            transition = "complete",
            "session completed"
        );

        match finished {
            Ok(outcome) => self.unwind(name, entry, values, ctx, outcome, replies).await,
            Err(message) => {
                warn!(flow = name, user = %ctx.user, error = %message, "finish failed");
                replies.push(Reply::send(format!("Error: {message}")));
                Ok(Handled::done(Turn::new(replies, TurnStatus::Failed)))
            }
        }
    }

    /// Apply a completion outcome, resuming stacked parents for as long as
    /// plain outcomes keep coming.
    async fn unwind(
        &self,
        name: &'static str,
        entry: &dyn FlowEntry,
        values: Values,
        ctx: FinishContext,
        outcome: FinishOutcome,
        mut replies: Vec<Reply>,
    ) -> Result<Handled> {
        let mut current = name;
        let mut current_entry = entry;
        let mut current_values = values;
        let mut ctx = ctx;
        let mut outcome = outcome;

        loop {
            match outcome {
                FinishOutcome::Message { text } => replies.push(Reply::send(text)),
                FinishOutcome::WithKeyboard { text, keyboard } => replies.push(Reply {
                    text,
                    keyboard: Some(keyboard),
                    delivery: Delivery::Send,
                }),
                FinishOutcome::Redirect {
                    text,
                    command,
                    context,
                } => {
                    replies.push(Reply::send(text));
                    info!(flow = current, user = %ctx.user, command = %command, "redirect");
                    return Ok(Handled::done(redirected(replies, command, context)));
                }
                FinishOutcome::SubFlow {
                    text,
                    flow,
                    context,
                } => {
                    replies.push(Reply::send(text.clone()));
                    let registered = self.registry.get(&flow).is_some();
                    if registered && current_entry.definition().transforms().stacking() {
                        let frame = StackFrame::new(current, flow.as_str(), current_values, text)
                            .with_origin(
                                ctx.session_id,
                                ctx.context,
                                ctx.started_at,
                            );
                        self.stack.push(&ctx.user, frame).await?;
                        info!(parent = current, child = %flow, user = %ctx.user, "stack push");
                        return Ok(Handled {
                            turn: Turn::new(replies, TurnStatus::Completed),
                            start: Some(PendingStart {
                                user: ctx.user,
                                flow,
                                context,
                            }),
                        });
                    }
                    if !registered {
                        warn!(flow = current, child = %flow, "sub-flow target not registered");
                    }
                    return Ok(Handled::done(redirected(replies, flow, context)));
                }
            }

            let Some(frame) = self.stack.pop(&ctx.user, current).await? else {
                return Ok(Handled::done(Turn::new(replies, TurnStatus::Completed)));
            };
            let Some((parent, parent_entry)) = self.registry.get(&frame.parent) else {
                warn!(parent = %frame.parent, user = %ctx.user, "stacked parent flow not registered");
                return Ok(Handled::done(Turn::new(replies, TurnStatus::Completed)));
            };
            info!(parent, child = current, user = %ctx.user, "stack pop");

            let resume_ctx = FinishContext::new(
                frame.session_id,
                parent,
                ctx.user.clone(),
                frame.context,
                frame.started_at,
            )
            .resumed(current);
            outcome = match parent_entry.resume(frame.values.clone(), &resume_ctx).await? {
                Ok(outcome) => outcome,
                Err(message) => {
                    warn!(flow = parent, user = %resume_ctx.user, error = %message, "resume failed");
                    replies.push(Reply::send(format!("Error: {message}")));
                    return Ok(Handled::done(Turn::new(replies, TurnStatus::Failed)));
                }
            };
            current = parent;
            current_entry = parent_entry;
            current_values = frame.values;
            ctx = resume_ctx;
        }
    }

    /// Start pending child flows, each under its own session lock.
    async fn follow_up(&self, handled: Handled) -> Result<Turn> {
        let mut turn = handled.turn;
        let mut pending = handled.start;

        while let Some(start) = pending.take() {
            let Some((name, entry)) = self.registry.get(&start.flow) else {
                break;
            };
            let key = SessionKey::new(start.user.clone(), name);
            let next = {
                let _guard = self.locks.lock(&key).await;
                self.store.delete(&key).await?;
                self.begin(name, entry, start.user, start.context).await?
            };
            turn.replies.extend(next.turn.replies);
            turn.status = next.turn.status;
            turn.redirect = next.turn.redirect;
            pending = next.start;
        }

        Ok(turn)
    }
}

fn redirected(replies: Vec<Reply>, command: String, context: Values) -> Turn {
    let mut turn = Turn::new(replies, TurnStatus::Completed);
    turn.redirect = Some(Redirect { command, context });
    turn
}
