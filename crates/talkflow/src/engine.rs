//! The per-session state machine.
//!
//! [`Engine`] advances one [`SessionState`] by one event. It knows nothing
//! about storage, locking or completion callbacks: it mutates the session
//! and reports a [`Step`], and the service decides what to persist.
//!
//! # Event path
//!
//! ```text
//! event ─▶ cancel trigger? ─▶ back trigger? ─▶ reviewing? ─▶ options failed?
//!       ─▶ skip keyword? ─▶ widget ─▶ Advance ─▶ validators ─▶ commit ─▶ next visible field
//!                                   ├▶ Stay    ─▶ keep state, re-render
//!                                   ├▶ Reject  ─▶ re-render with message
//!                                   └▶ NoOp
//! ```

use serde_json::Value;
use time::Date;
use tracing::{debug, warn};

use crate::error::Result;
use crate::field::{Field, FlowDefinition};
use crate::flow::{ShowMode, Values};
use crate::runtime::FlowServiceConfig;
use crate::session::{Phase, SessionState};
use crate::validation::validate;
use crate::widget::helpers::display_value;
use crate::widget::{
    CallbackData, InlineBuilder, Keyboard, MessageContent, Rendered, WidgetContext, WidgetResult,
    fill,
};

const SUMMARY_OK: &str = "_summary:ok";
const SUMMARY_RESTART: &str = "_summary:restart";

/// How the transport should present a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Send a new message.
    Send,
    /// Edit the previous prompt in place.
    Edit,
    /// Delete the previous prompt, then send.
    DeleteAndSend,
}

/// One message to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub delivery: Delivery,
}

impl Reply {
    pub fn send(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
            delivery: Delivery::Send,
        }
    }
}

/// Where a session stands after a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The session is waiting for more input.
    Active,
    /// The flow finished and its session is gone.
    Completed,
    /// `finish` or `resume` returned a domain error. The session is gone.
    Failed,
    /// The user cancelled. The session is gone.
    Cancelled,
    /// No session exists for the event.
    NoSession,
    /// The event was ignored: a no-op widget result, or a stale or
    /// malformed callback.
    Ignored,
}

/// A hand-off to another command, produced by a redirect outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub command: String,
    pub context: Values,
}

/// Everything one event produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub replies: Vec<Reply>,
    pub status: TurnStatus,
    pub redirect: Option<Redirect>,
}

impl Turn {
    pub fn new(replies: Vec<Reply>, status: TurnStatus) -> Self {
        Self {
            replies,
            status,
            redirect: None,
        }
    }

    pub fn active(replies: Vec<Reply>) -> Self {
        Self::new(replies, TurnStatus::Active)
    }

    pub fn ignored() -> Self {
        Self::new(Vec::new(), TurnStatus::Ignored)
    }

    pub fn no_session() -> Self {
        Self::new(Vec::new(), TurnStatus::NoSession)
    }

    /// Reply texts in order.
    pub fn texts(&self) -> Vec<&str> {
        self.replies.iter().map(|r| r.text.as_str()).collect()
    }

    /// The last reply, usually the prompt now awaiting input.
    pub fn last(&self) -> Option<&Reply> {
        self.replies.last()
    }
}

/// User input routed to a session.
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Message(&'a MessageContent),
    /// Callback value with the flow stamp already removed.
    Callback(&'a str),
}

impl Input<'_> {
    fn text(&self) -> Option<&str> {
        match self {
            Input::Message(content) => content.as_text().map(str::trim),
            Input::Callback(_) => None,
        }
    }

    fn is_callback(&self) -> bool {
        matches!(self, Input::Callback(_))
    }
}

/// What the engine did with an event.
#[derive(Debug)]
pub(crate) enum Step {
    /// The session changed and must be persisted.
    Continue(Vec<Reply>),
    /// Nothing changed.
    Ignored,
    /// Every visible field is answered (and confirmed, with a summary).
    Complete(Vec<Reply>),
    Cancelled(Vec<Reply>),
}

/// Values for predicates, widgets and the record: prefilled context
/// values followed by answers.
pub(crate) fn collected_values(def: &FlowDefinition, session: &SessionState) -> Values {
    let mut values = Values::new();
    for field in def.fields().iter().filter(|f| f.is_prefilled()) {
        if let Some(value) = session.context.get(field.name()) {
            values.insert(field.name().to_string(), value.clone());
        }
    }
    for answer in &session.answers {
        values.insert(answer.field.clone(), answer.value.clone());
    }
    values
}

/// `█░` bar followed by `pos/total`.
pub(crate) fn progress_bar(pos: usize, total: usize) -> String {
    let bar_len = total.min(10);
    let filled = if total > 0 {
        ((pos as f64 / total as f64) * bar_len as f64).round() as usize
    } else {
        0
    };
    let filled = filled.min(bar_len);
    format!(
        "{}{} {pos}/{total}\n\n",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(bar_len - filled)
    )
}

pub(crate) struct Engine<'a> {
    def: &'a FlowDefinition,
    config: &'a FlowServiceConfig,
    today: Date,
}

impl<'a> Engine<'a> {
    pub(crate) fn new(def: &'a FlowDefinition, config: &'a FlowServiceConfig, today: Date) -> Self {
        Self { def, config, today }
    }

    /// Move a fresh session to its first visible field.
    pub(crate) async fn start(&self, session: &mut SessionState) -> Result<Step> {
        self.forward(session, 0, Vec::new()).await
    }

    /// Re-send the current prompt without changing anything but the
    /// delivery counter.
    pub(crate) fn rerender(&self, session: &mut SessionState) -> Result<Reply> {
        self.prompt(session, Some(Delivery::Send), None)
    }

    pub(crate) async fn handle(&self, session: &mut SessionState, input: Input<'_>) -> Result<Step> {
        let transforms = self.def.transforms();
        if let Some(text) = input.text() {
            if transforms.cancel_trigger() == Some(text) {
                debug!(flow = self.def.name(), user = %session.user, transition = "cancel", "intercepted");
                return Ok(Step::Cancelled(vec![Reply::send(
                    self.config.theme.action.cancel.clone(),
                )]));
            }
            if transforms.back_trigger() == Some(text) {
                return self.back(session);
            }
        }

        if session.is_reviewing() {
            return self.review_input(session, input).await;
        }

        let Some(idx) = session.current else {
            return Ok(Step::Ignored);
        };
        let Some(field) = self.def.field(idx) else {
            return Ok(Step::Ignored);
        };

        if session.options_failed {
            return self.retry_options(session, idx).await;
        }

        if field.is_optional() && input.text() == Some(self.config.skip_keyword.as_str()) {
            debug!(flow = self.def.name(), field = field.name(), "skipped");
            session.commit(
                field.name(),
                Value::Null,
                self.config.theme.display.skipped.clone(),
                false,
            );
            return self.forward(session, idx + 1, Vec::new()).await;
        }

        let Some(widget) = field.widget_ref() else {
            return Ok(Step::Ignored);
        };
        let values = collected_values(self.def, session);
        let result = {
            let ctx = self.widget_context(session, field, &values);
            match input {
                Input::Message(content) => widget.handle_message(content, &ctx),
                Input::Callback(data) => widget.handle_callback(data, &ctx),
            }
        };
        debug!(
            flow = self.def.name(),
            user = %session.user,
            field = field.name(),
            result = ?result,
            "widget result"
        );

        let rerender = input.is_callback().then_some(Delivery::Edit);
        match result {
            WidgetResult::NoOp => Ok(Step::Ignored),
            WidgetResult::Stay { state } => {
                session.widget_state = Some(state);
                Ok(Step::Continue(vec![self.prompt(session, rerender, None)?]))
            }
            WidgetResult::Reject { message } => Ok(Step::Continue(vec![self.prompt(
                session,
                rerender,
                Some(&message),
            )?])),
            WidgetResult::Advance { value, summary } => {
                if let Err(msg) = validate(field.validators(), &value, &self.config.theme) {
                    let message = fill(&self.config.theme.errors.invalid_input, &[&msg]);
                    debug!(flow = self.def.name(), field = field.name(), %message, "validation failed");
                    return Ok(Step::Continue(vec![self.prompt(
                        session,
                        rerender,
                        Some(&message),
                    )?]));
                }
                let mut replies = Vec::new();
                if input.is_callback() {
                    replies.push(Reply {
                        text: format!("{}\n\n{summary}", widget.prompt()),
                        keyboard: None,
                        delivery: Delivery::Edit,
                    });
                }
                session.commit(field.name(), value, summary, false);
                self.forward(session, idx + 1, replies).await
            }
        }
    }

    /// Find the next visible field at or after `start`, load its options,
    /// and prompt it. Completes or enters review when none is left.
    async fn forward(
        &self,
        session: &mut SessionState,
        start: usize,
        mut replies: Vec<Reply>,
    ) -> Result<Step> {
        let mut start = start;
        loop {
            let values = collected_values(self.def, session);
            let Some(idx) = self.def.next_visible(start, &values) else {
                session.current = None;
                session.leave_field();
                if self.def.transforms().summary() {
                    session.phase = Phase::Reviewing;
                    debug!(flow = self.def.name(), transition = "review", "all fields answered");
                    replies.push(self.prompt(session, None, None)?);
                    return Ok(Step::Continue(replies));
                }
                debug!(flow = self.def.name(), transition = "complete", "all fields answered");
                return Ok(Step::Complete(replies));
            };

            session.current = Some(idx);
            let Some(field) = self.def.field(idx) else {
                return Ok(Step::Complete(replies));
            };
            debug!(flow = self.def.name(), field = field.name(), "next field");

            if !self.load_options(session, field, &values).await {
                start = idx + 1;
                continue;
            }
            replies.push(self.prompt(session, None, None)?);
            return Ok(Step::Continue(replies));
        }
    }

    /// Load dynamic options for the field just entered.
    ///
    /// Returns `false` when the field was auto-skipped because an optional
    /// field got no options.
    async fn load_options(&self, session: &mut SessionState, field: &Field, values: &Values) -> bool {
        let Some(provider) = field.provider() else {
            return true;
        };
        match provider.load(&session.user, values).await {
            Ok(options) if options.is_empty() && field.is_optional() => {
                debug!(flow = self.def.name(), field = field.name(), "no options, auto-skipped");
                session.commit(
                    field.name(),
                    Value::Null,
                    self.config.theme.display.skipped.clone(),
                    true,
                );
                false
            }
            Ok(options) => {
                session.options.insert(field.name().to_string(), options);
                session.options_failed = false;
                true
            }
            Err(err) => {
                warn!(
                    flow = self.def.name(),
                    user = %session.user,
                    field = field.name(),
                    error = %err,
                    "failed to load options"
                );
                session.options_failed = true;
                true
            }
        }
    }

    /// Any event on a field whose options failed to load retries the load.
    async fn retry_options(&self, session: &mut SessionState, idx: usize) -> Result<Step> {
        let Some(field) = self.def.field(idx) else {
            return Ok(Step::Ignored);
        };
        let values = collected_values(self.def, session);
        if self.load_options(session, field, &values).await {
            Ok(Step::Continue(vec![self.prompt(session, None, None)?]))
        } else {
            self.forward(session, idx + 1, Vec::new()).await
        }
    }

    fn back(&self, session: &mut SessionState) -> Result<Step> {
        let Some(answer) = session.pop_answer() else {
            return Ok(Step::Continue(vec![self.prompt(session, None, None)?]));
        };
        let Some(idx) = self.def.index_of(&answer.field) else {
            return Ok(Step::Ignored);
        };
        debug!(
            flow = self.def.name(),
            user = %session.user,
            field = %answer.field,
            transition = "back",
            "returned to field"
        );
        session.phase = Phase::Filling;
        session.current = Some(idx);
        session.leave_field();
        session.prior = (!answer.value.is_null()).then_some(answer.value);
        Ok(Step::Continue(vec![self.prompt(session, None, None)?]))
    }

    async fn review_input(&self, session: &mut SessionState, input: Input<'_>) -> Result<Step> {
        match input {
            Input::Callback(SUMMARY_OK) => {
                session.phase = Phase::Filling;
                debug!(flow = self.def.name(), transition = "confirm", "summary confirmed");
                Ok(Step::Complete(Vec::new()))
            }
            Input::Callback(SUMMARY_RESTART) => {
                debug!(flow = self.def.name(), transition = "restart", "summary declined");
                session.reset();
                self.forward(session, 0, Vec::new()).await
            }
            Input::Callback(_) => Ok(Step::Ignored),
            Input::Message(_) => {
                let message = self.config.theme.errors.use_buttons.clone();
                Ok(Step::Continue(vec![self.prompt(session, None, Some(&message))?]))
            }
        }
    }

    /// Render whatever the session is waiting on.
    fn prompt(
        &self,
        session: &mut SessionState,
        delivery: Option<Delivery>,
        error: Option<&str>,
    ) -> Result<Reply> {
        let (rendered, progress) = if session.is_reviewing() {
            (self.render_review(session), None)
        } else {
            match session.current.and_then(|idx| self.def.field(idx).map(|f| (idx, f))) {
                Some((idx, field)) => {
                    let progress = self
                        .def
                        .transforms()
                        .progress()
                        .then(|| self.progress_prefix(session, idx));
                    (self.render_field(session, field), progress)
                }
                None => (Rendered::text(String::new()), None),
            }
        };

        let mut text = rendered.text;
        if let Some(error) = error {
            text = format!("{text}\n\n{error}");
        }
        if let Some(prefix) = progress {
            text = format!("{prefix}{text}");
        }

        let keyboard = match rendered.keyboard {
            Some(mut kb) => {
                let hash = self.def.hash();
                kb.map_callbacks(|local| CallbackData::new(hash, local).encode())?;
                Some(kb)
            }
            None => None,
        };

        let mut delivery = delivery.unwrap_or_else(|| self.delivery(session.prompts_sent));
        if delivery == Delivery::Edit && keyboard.as_ref().is_some_and(|kb| !kb.is_inline()) {
            delivery = Delivery::Send;
        }
        session.prompts_sent += 1;

        Ok(Reply {
            text,
            keyboard,
            delivery,
        })
    }

    fn delivery(&self, prompts_sent: u32) -> Delivery {
        if prompts_sent == 0 {
            return Delivery::Send;
        }
        match self.def.show_mode() {
            ShowMode::Send => Delivery::Send,
            ShowMode::Edit => Delivery::Edit,
            ShowMode::DeleteAndSend => Delivery::DeleteAndSend,
        }
    }

    fn render_field(&self, session: &SessionState, field: &Field) -> Rendered {
        let Some(widget) = field.widget_ref() else {
            return Rendered::text(String::new());
        };
        if session.options_failed {
            return Rendered::text(format!(
                "{}\n\n{}",
                widget.prompt(),
                self.config.theme.display.options_failed
            ));
        }
        let values = collected_values(self.def, session);
        let ctx = self.widget_context(session, field, &values);
        widget.render(&ctx)
    }

    fn render_review(&self, session: &SessionState) -> Rendered {
        let theme = &self.config.theme;
        let values = collected_values(self.def, session);
        let lines: Vec<String> = self
            .def
            .fields()
            .iter()
            .filter_map(|field| {
                let value = values.get(field.name()).filter(|v| !v.is_null())?;
                Some(format!("  {}: {}", field.display_label(), display_value(value)))
            })
            .collect();
        let text = if lines.is_empty() {
            theme.display.no_data.clone()
        } else {
            format!("{}\n\n{}", theme.display.review_header, lines.join("\n"))
        };
        let keyboard = InlineBuilder::new()
            .button(theme.action.done.clone(), SUMMARY_OK)
            .button(theme.action.restart.clone(), SUMMARY_RESTART)
            .build();
        Rendered::with_keyboard(text, keyboard)
    }

    /// Position of `idx` among the fields visible for the current answers.
    fn progress_prefix(&self, session: &SessionState, idx: usize) -> String {
        let (pos, total) = self.progress(session, idx);
        progress_bar(pos, total)
    }

    pub(crate) fn progress(&self, session: &SessionState, idx: usize) -> (usize, usize) {
        let values = collected_values(self.def, session);
        let visible = self.def.visible_prompted(&values);
        let pos = visible.iter().position(|&i| i == idx).map_or(0, |p| p + 1);
        (pos, visible.len())
    }

    fn widget_context<'s>(
        &'s self,
        session: &'s SessionState,
        field: &'s Field,
        values: &'s Values,
    ) -> WidgetContext<'s> {
        WidgetContext {
            field: field.name(),
            kind: field.value_kind(),
            optional: field.is_optional(),
            state: session.widget_state.as_ref(),
            prior: session.prior.as_ref(),
            values,
            options: session.options.get(field.name()),
            validators: field.validators(),
            theme: &self.config.theme,
            today: self.today,
        }
    }
}
