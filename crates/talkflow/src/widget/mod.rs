//! Widget contract and the built-in widget set.
//!
//! A widget renders the prompt for one field and interprets one user
//! response into a [`WidgetResult`]. Widgets are stateless templates: all
//! per-session data arrives through [`WidgetContext`], and transient state
//! (a counter's value before Done) travels back to the engine in
//! [`WidgetResult::Stay`].
//!
//! # Result algebra
//!
//! | Result | Engine reaction |
//! |--------|-----------------|
//! | `Advance { value, summary }` | Validate, commit, move to the next visible field |
//! | `Stay { state }` | Keep the field, replace transient state, re-render |
//! | `Reject { message }` | Keep the field, re-render with the message |
//! | `NoOp` | Nothing |
//!
//! Input of the wrong modality (text sent to a button-only widget, a
//! callback sent to a photo input) is always a `Reject` with a message
//! naming the expected input.

mod calendar;
mod choice;
mod collect;
mod dynamic;
mod either;
pub(crate) mod helpers;
mod keyboard;
mod media;
mod stepper;
mod text;
mod theme;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

pub use calendar::{DatePicker, RecurrencePicker, TimePicker, TimeSlotPicker};
pub use choice::{Case, Confirm, Inline, Multiselect, Radio, ScrollingInline, SummaryReview, Toggle};
pub use collect::{ListBuilder, MediaGroupInput, MediaKind};
pub use dynamic::{DynamicInline, DynamicMultiselect, DynamicRadio};
pub use either::Either;
pub use keyboard::{Button, ButtonAction, CallbackData, InlineBuilder, Keyboard};
pub use media::{ContactInput, DocumentInput, LocationInput, PhotoInput, VideoInput, VoiceInput};
pub use stepper::{Counter, PinInput, Rating, Slider};
pub use text::{NumberInput, TextInput};
pub use theme::{
    ActionStrings, DisplayStrings, ErrorStrings, NavStrings, SelectionStrings, Theme, fill,
};

use crate::flow::Values;
use crate::record::ValueKind;
use crate::validation::Validator;

/// Ordered choice set: key to display label.
pub type Options = IndexMap<String, String>;

/// Build [`Options`] from `(key, label)` pairs.
pub fn options<K, L>(pairs: impl IntoIterator<Item = (K, L)>) -> Options
where
    K: Into<String>,
    L: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, l)| (k.into(), l.into()))
        .collect()
}

/// Free-form input extracted from a chat message by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: String },
    Photo { file_id: String },
    Document { file_id: String },
    Video { file_id: String },
    Voice { file_id: String },
    Location { latitude: f64, longitude: f64 },
    Contact { phone_number: String },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { text } => Some(text),
            _ => None,
        }
    }

    /// The media file id for photo, document, video and voice messages.
    pub fn file_id(&self) -> Option<&str> {
        match self {
            MessageContent::Photo { file_id }
            | MessageContent::Document { file_id }
            | MessageContent::Video { file_id }
            | MessageContent::Voice { file_id } => Some(file_id),
            _ => None,
        }
    }
}

/// Prompt text plus an optional control layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Rendered {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

/// Outcome of interpreting one user response.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetResult {
    /// Commit `value` and move on. `summary` is echoed to the user.
    Advance { value: Value, summary: String },
    /// Re-render the same field with new transient state.
    Stay { state: Value },
    /// Re-render the same field with an error.
    Reject { message: String },
    /// Ignore the input.
    NoOp,
}

impl WidgetResult {
    pub fn advance(value: impl Into<Value>, summary: impl Into<String>) -> Self {
        WidgetResult::Advance {
            value: value.into(),
            summary: summary.into(),
        }
    }

    pub fn stay(state: impl Into<Value>) -> Self {
        WidgetResult::Stay {
            state: state.into(),
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        WidgetResult::Reject {
            message: message.into(),
        }
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, WidgetResult::Reject { .. })
    }
}

/// Everything a widget may read while rendering or handling input.
#[derive(Debug, Clone, Copy)]
pub struct WidgetContext<'a> {
    pub field: &'a str,
    pub kind: ValueKind,
    pub optional: bool,
    /// Transient state from the last `Stay`.
    pub state: Option<&'a Value>,
    /// The value committed before the user navigated back to this field.
    pub prior: Option<&'a Value>,
    /// Values collected for earlier fields.
    pub values: &'a Values,
    /// Dynamically loaded choices, for widgets that use them.
    pub options: Option<&'a Options>,
    pub validators: &'a [Validator],
    pub theme: &'a Theme,
    /// Calendar anchor for date widgets.
    pub today: Date,
}

impl<'a> WidgetContext<'a> {
    /// Transient state if present, otherwise the prior committed value.
    pub fn current(&self) -> Option<&'a Value> {
        self.state.or(self.prior)
    }

    pub fn current_i64(&self) -> Option<i64> {
        self.current().and_then(Value::as_i64)
    }

    pub fn current_bool(&self) -> Option<bool> {
        self.current().and_then(Value::as_bool)
    }

    pub fn current_str(&self) -> Option<&'a str> {
        self.current().and_then(Value::as_str)
    }

    /// Current value as a list of strings. Non-list values yield nothing.
    pub fn current_list(&self) -> Vec<String> {
        self.current()
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_owned))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Decode structured transient state, ignoring anything else.
    pub fn state_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.state.and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Loaded dynamic options, if any were returned.
    pub fn dynamic_options(&self) -> Option<&'a Options> {
        self.options.filter(|opts| !opts.is_empty())
    }

    /// Value collected for an earlier field.
    pub fn value_of(&self, field: &str) -> Option<&'a Value> {
        self.values.get(field).filter(|v| !v.is_null())
    }
}

/// The render/interpret unit bound to one field.
///
/// Implementations must be pure: `render` is called on every re-render,
/// including after a rejection, and must produce the same output for the
/// same context.
pub trait Widget: Send + Sync + 'static {
    /// Short stable name used in flow outlines and logs.
    fn kind(&self) -> &'static str;

    /// The bare prompt, echoed together with the summary when a button
    /// press commits an answer.
    fn prompt(&self) -> &str;

    /// Whether the widget expects button presses rather than messages.
    fn needs_callback(&self) -> bool;

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered;

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult;

    fn handle_message(&self, content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult;

    /// Earlier fields this widget reads from [`WidgetContext::values`].
    fn depends_on(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Whether choices come from the field's options provider.
    fn uses_dynamic_options(&self) -> bool {
        false
    }
}
