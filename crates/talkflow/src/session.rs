//! Per-(user, flow) session state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::flow::{SessionKey, UserId, Values};
use crate::widget::Options;

/// One committed answer, in the order fields were actually prompted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub field: String,
    /// `null` when the field was skipped.
    pub value: Value,
    pub summary: String,
    /// Skipped by the engine (empty options on an optional field), not by
    /// the user. Back navigation steps over these.
    #[serde(default)]
    pub auto_skipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Filling,
    /// Every field is answered and the review step is showing.
    Reviewing,
}

/// Mutable state of one active session.
///
/// Serializable so any [`SessionStore`](crate::store::SessionStore) backend
/// can hold it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: Uuid,
    pub flow: String,
    pub user: UserId,
    pub answers: Vec<Answer>,
    /// Declared index of the field awaiting input.
    pub current: Option<usize>,
    /// Transient widget state from the last `Stay`.
    pub widget_state: Option<Value>,
    /// Value the current field held before the user went back to it.
    pub prior: Option<Value>,
    /// Loaded dynamic options per field.
    #[serde(default)]
    pub options: BTreeMap<String, Options>,
    /// Loading options for the current field failed.
    #[serde(default)]
    pub options_failed: bool,
    /// Launch context, source of prefilled values.
    #[serde(default)]
    pub context: Values,
    #[serde(default)]
    pub phase: Phase,
    /// Prompts delivered so far. Drives show-mode delivery.
    #[serde(default)]
    pub prompts_sent: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SessionState {
    pub fn new(flow: impl Into<String>, user: UserId, context: Values) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            session_id: Uuid::now_v7(),
            flow: flow.into(),
            user,
            answers: Vec::new(),
            current: None,
            widget_state: None,
            prior: None,
            options: BTreeMap::new(),
            options_failed: false,
            context,
            phase: Phase::Filling,
            prompts_sent: 0,
            started_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.user.clone(), self.flow.clone())
    }

    pub fn is_reviewing(&self) -> bool {
        self.phase == Phase::Reviewing
    }

    pub fn answer(&self, field: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.field == field)
    }

    /// Record a committed value and leave the field.
    pub(crate) fn commit(&mut self, field: &str, value: Value, summary: String, auto_skipped: bool) {
        self.answers.push(Answer {
            field: field.to_string(),
            value,
            summary,
            auto_skipped,
        });
        self.leave_field();
    }

    /// Drop transient per-field data.
    pub(crate) fn leave_field(&mut self) {
        self.widget_state = None;
        self.prior = None;
        self.options_failed = false;
    }

    /// Pop the last user-answered entry along with any auto-skipped
    /// entries recorded after it.
    pub(crate) fn pop_answer(&mut self) -> Option<Answer> {
        while self.answers.last().is_some_and(|a| a.auto_skipped) {
            self.answers.pop();
        }
        self.answers.pop()
    }

    /// Forget every answer and start over with the same context.
    pub(crate) fn reset(&mut self) {
        self.answers.clear();
        self.options.clear();
        self.current = None;
        self.phase = Phase::Filling;
        self.leave_field();
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }

    /// Whether the session has been idle longer than `ttl`.
    pub fn is_expired(&self, ttl: std::time::Duration, now: OffsetDateTime) -> bool {
        now - self.updated_at > ttl
    }
}
