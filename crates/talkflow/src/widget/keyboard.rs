//! Transport-neutral control layouts.
//!
//! Widgets describe buttons with short local actions (`"counter:inc"`).
//! The engine stamps every callback with the owning flow before the layout
//! leaves the crate, see [`CallbackData`].

use serde::{Deserialize, Serialize};

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ButtonAction {
    /// Inline button carrying callback data.
    Callback(String),
    /// Reply-keyboard button asking the client to share the user's contact.
    RequestContact,
    /// Reply-keyboard button asking the client to share a location.
    RequestLocation,
}

/// A single button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub text: String,
    pub action: ButtonAction,
}

impl Button {
    /// Inline button with callback data.
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::Callback(data.into()),
        }
    }

    /// Reply button requesting the user's contact.
    pub fn request_contact(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::RequestContact,
        }
    }

    /// Reply button requesting a location.
    pub fn request_location(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: ButtonAction::RequestLocation,
        }
    }

    /// The callback data, if this is an inline button.
    pub fn callback_data(&self) -> Option<&str> {
        match &self.action {
            ButtonAction::Callback(data) => Some(data),
            _ => None,
        }
    }
}

/// A button layout attached to a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Keyboard {
    /// Buttons attached to the message itself.
    Inline { rows: Vec<Vec<Button>> },
    /// Buttons replacing the client's input keyboard.
    Reply {
        rows: Vec<Vec<Button>>,
        one_time: bool,
        resize: bool,
    },
}

impl Keyboard {
    /// Whether the layout can be attached to an edited message.
    pub fn is_inline(&self) -> bool {
        matches!(self, Keyboard::Inline { .. })
    }

    /// All rows, regardless of kind.
    pub fn rows(&self) -> &[Vec<Button>] {
        match self {
            Keyboard::Inline { rows } | Keyboard::Reply { rows, .. } => rows,
        }
    }

    /// Iterate every button in row order.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.rows().iter().flatten()
    }

    /// Rewrite every callback payload in place.
    pub(crate) fn map_callbacks<F>(&mut self, mut f: F) -> crate::Result<()>
    where
        F: FnMut(&str) -> crate::Result<String>,
    {
        let rows = match self {
            Keyboard::Inline { rows } | Keyboard::Reply { rows, .. } => rows,
        };
        for button in rows.iter_mut().flatten() {
            if let ButtonAction::Callback(data) = &mut button.action {
                *data = f(data)?;
            }
        }
        Ok(())
    }
}

/// Row-oriented builder for inline layouts.
#[derive(Debug, Default)]
pub struct InlineBuilder {
    rows: Vec<Vec<Button>>,
    current: Vec<Button>,
}

impl InlineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a button to the current row.
    pub fn add(mut self, button: Button) -> Self {
        self.current.push(button);
        self
    }

    /// Append a callback button to the current row.
    pub fn button(self, text: impl Into<String>, data: impl Into<String>) -> Self {
        self.add(Button::callback(text, data))
    }

    /// Close the current row. Empty rows are dropped.
    pub fn row(mut self) -> Self {
        if !self.current.is_empty() {
            self.rows.push(std::mem::take(&mut self.current));
        }
        self
    }

    /// Lay out `items` as `(text, data)` pairs, `columns` per row.
    ///
    /// Closes the current row first and any partial trailing row after.
    pub fn grid<I, T, D>(mut self, items: I, columns: usize) -> Self
    where
        I: IntoIterator<Item = (T, D)>,
        T: Into<String>,
        D: Into<String>,
    {
        self = self.row();
        let columns = columns.max(1);
        for (text, data) in items {
            self.current.push(Button::callback(text, data));
            if self.current.len() >= columns {
                self = self.row();
            }
        }
        self.row()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.current.is_empty()
    }

    pub fn build(self) -> Keyboard {
        let this = self.row();
        Keyboard::Inline { rows: this.rows }
    }
}

/// Wire format of every callback a flow emits.
///
/// `flow` is the first eight hex characters of the SHA-256 of the flow
/// name, which keeps payloads short and lets stale buttons from other
/// flows be ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackData {
    pub flow: String,
    pub value: String,
}

impl CallbackData {
    pub fn new(flow: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            flow: flow.into(),
            value: value.into(),
        }
    }

    /// Encode as the JSON string carried by a button.
    pub fn encode(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a raw payload. Returns `None` for anything that is not ours.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}
