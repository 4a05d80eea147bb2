//! Flow trait and the types shared by every flow.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::field::Field;
use crate::record::FlowRecord;
use crate::transform::Transform;
use crate::widget::Keyboard;

/// Values collected so far, keyed by field name.
///
/// A skipped or auto-skipped field is present with `null`.
pub type Values = serde_json::Map<String, Value>;

/// A multi-step field-collection conversation.
///
/// The implementing type is the record the flow collects. Field order in
/// [`fields`](Flow::fields) is prompt order.
///
/// # Example
///
/// ```ignore
/// #[derive(FlowRecord, Serialize, Deserialize)]
/// struct Signup {
///     name: String,
///     plan: String,
///     promo_code: Option<String>,
/// }
///
/// impl Flow for Signup {
///     const NAME: &'static str = "signup";
///
///     fn fields() -> Vec<Field> {
///         vec![
///             Field::new("name").widget(TextInput::new("Your name?")),
///             Field::new("plan").widget(Inline::new("Plan?").option("free", "Free").option("pro", "Pro")),
///             Field::new("promo_code")
///                 .widget(TextInput::new("Promo code?"))
///                 .visible_when(When::equals("plan", "pro")),
///         ]
///     }
///
///     fn transforms() -> Vec<Transform> {
///         vec![Transform::cancel(), Transform::back(), Transform::Progress]
///     }
/// }
/// ```
pub trait Flow: FlowRecord + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Flow name. Doubles as the launch command and the callback hash input,
    /// so it must be stable across deployments.
    const NAME: &'static str;

    /// Field descriptors in prompt order.
    fn fields() -> Vec<Field>;

    /// Cross-cutting behaviors applied to this flow.
    fn transforms() -> Vec<Transform> {
        Vec::new()
    }

    /// How successive prompts are presented, unless a transform overrides it.
    fn show_mode() -> ShowMode {
        ShowMode::Send
    }

    /// How a launch is handled while a session is already active, unless a
    /// transform overrides it.
    fn launch_mode() -> LaunchMode {
        LaunchMode::Standard
    }
}

/// Presentation policy for successive prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowMode {
    /// Every prompt is a new message.
    #[default]
    Send,
    /// Prompts after the first edit the previous one in place.
    Edit,
    /// Prompts after the first replace the previous one.
    DeleteAndSend,
}

/// Re-entry policy when a flow is launched while its session is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    /// Treat the launch text as input for the current field.
    #[default]
    Standard,
    /// Discard the session and start over.
    Reset,
    /// Refuse with an "already running" notice.
    Exclusive,
    /// Re-render the current field unchanged.
    SingleTop,
}

/// What happens after a flow completes.
///
/// # Example
///
/// ```ignore
/// Ok(FinishOutcome::message("Saved!"))
/// Ok(FinishOutcome::then("Created!", "tasks").with_context("project_id", 42))
/// Ok(FinishOutcome::sub_flow("Project created, now invite people.", "invite"))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FinishOutcome {
    /// Plain text reply.
    Message { text: String },
    /// Text reply with a custom control layout.
    WithKeyboard { text: String, keyboard: Keyboard },
    /// Text reply, then hand the user to another command.
    Redirect {
        text: String,
        command: String,
        context: Values,
    },
    /// Text reply, suspend this flow and start `flow`. Needs
    /// [`Transform::Stacking`], otherwise it degrades to a redirect.
    SubFlow {
        text: String,
        flow: String,
        context: Values,
    },
}

impl FinishOutcome {
    pub fn message(text: impl Into<String>) -> Self {
        FinishOutcome::Message { text: text.into() }
    }

    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        FinishOutcome::WithKeyboard {
            text: text.into(),
            keyboard,
        }
    }

    pub fn then(text: impl Into<String>, command: impl Into<String>) -> Self {
        FinishOutcome::Redirect {
            text: text.into(),
            command: command.into(),
            context: Values::new(),
        }
    }

    pub fn sub_flow(text: impl Into<String>, flow: impl Into<String>) -> Self {
        FinishOutcome::SubFlow {
            text: text.into(),
            flow: flow.into(),
            context: Values::new(),
        }
    }

    /// Attach a context value to a redirect or sub-flow. Other outcomes
    /// carry no context and are returned unchanged.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let FinishOutcome::Redirect { context, .. } | FinishOutcome::SubFlow { context, .. } =
            &mut self
        {
            context.insert(key.into(), value.into());
        }
        self
    }

    /// The reply text.
    pub fn text(&self) -> &str {
        match self {
            FinishOutcome::Message { text }
            | FinishOutcome::WithKeyboard { text, .. }
            | FinishOutcome::Redirect { text, .. }
            | FinishOutcome::SubFlow { text, .. } => text,
        }
    }
}

/// A chat user identifier.
///
/// # Example
///
/// ```
/// use talkflow::UserId;
///
/// let user = UserId::new("42");
/// assert_eq!(user.as_str(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Identity of one session: a user inside one flow.
///
/// ```
/// use talkflow::SessionKey;
///
/// let key = SessionKey::new("42", "signup");
/// assert_eq!(key.to_string(), "42:signup");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub user: UserId,
    pub flow: String,
}

impl SessionKey {
    pub fn new(user: impl Into<UserId>, flow: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            flow: flow.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.user, self.flow)
    }
}
