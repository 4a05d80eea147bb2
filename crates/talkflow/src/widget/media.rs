//! Inputs that accept a single non-text message.

use super::{
    Button, Keyboard, MessageContent, Rendered, Theme, Widget, WidgetContext, WidgetResult,
};

macro_rules! file_input {
    ($(#[$doc:meta])* $name:ident, $kind:literal, $variant:ident, $summary:literal, $error:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            prompt: String,
        }

        impl $name {
            pub fn new(prompt: impl Into<String>) -> Self {
                Self {
                    prompt: prompt.into(),
                }
            }
        }

        impl Widget for $name {
            fn kind(&self) -> &'static str {
                $kind
            }

            fn prompt(&self) -> &str {
                &self.prompt
            }

            fn needs_callback(&self) -> bool {
                false
            }

            fn render(&self, _ctx: &WidgetContext<'_>) -> Rendered {
                Rendered::text(self.prompt.clone())
            }

            fn handle_callback(&self, _data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
                WidgetResult::reject(ctx.theme.errors.$error.clone())
            }

            fn handle_message(
                &self,
                content: &MessageContent,
                ctx: &WidgetContext<'_>,
            ) -> WidgetResult {
                match content {
                    MessageContent::$variant { file_id } => {
                        WidgetResult::advance(file_id.as_str(), $summary)
                    }
                    _ => WidgetResult::reject(ctx.theme.errors.$error.clone()),
                }
            }
        }
    };
}

file_input!(
    /// Accept a photo. The committed value is its file id.
    PhotoInput, "photo", Photo, "Photo uploaded", send_photo
);
file_input!(
    /// Accept a document. The committed value is its file id.
    DocumentInput, "document", Document, "Document uploaded", send_document
);
file_input!(
    /// Accept a video. The committed value is its file id.
    VideoInput, "video", Video, "Video uploaded", send_video
);
file_input!(
    /// Accept a voice message. The committed value is its file id.
    VoiceInput, "voice", Voice, "Voice message recorded", send_voice
);

/// Accept a shared location as `[latitude, longitude]`.
#[derive(Debug, Clone)]
pub struct LocationInput {
    prompt: String,
}

impl LocationInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Widget for LocationInput {
    fn kind(&self) -> &'static str {
        "location"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        false
    }

    fn render(&self, _ctx: &WidgetContext<'_>) -> Rendered {
        Rendered::text(self.prompt.clone())
    }

    fn handle_callback(&self, _data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        WidgetResult::reject(ctx.theme.errors.send_location.clone())
    }

    fn handle_message(&self, content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        match *content {
            MessageContent::Location {
                latitude,
                longitude,
            } => WidgetResult::advance(
                vec![latitude, longitude],
                format!("Location: {latitude:.4}, {longitude:.4}"),
            ),
            _ => WidgetResult::reject(ctx.theme.errors.send_location.clone()),
        }
    }
}

/// Ask the client to share the user's phone number.
///
/// Renders a one-time reply keyboard with a single request-contact button.
#[derive(Debug, Clone)]
pub struct ContactInput {
    prompt: String,
    button_text: String,
}

impl ContactInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            button_text: "\u{1f4f1} Share Contact".into(),
        }
    }

    pub fn button_text(mut self, text: impl Into<String>) -> Self {
        self.button_text = text.into();
        self
    }

    fn reject(theme: &Theme) -> WidgetResult {
        WidgetResult::reject(theme.errors.send_contact.clone())
    }
}

impl Widget for ContactInput {
    fn kind(&self) -> &'static str {
        "contact"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        false
    }

    fn render(&self, _ctx: &WidgetContext<'_>) -> Rendered {
        let kb = Keyboard::Reply {
            rows: vec![vec![Button::request_contact(self.button_text.clone())]],
            one_time: true,
            resize: true,
        };
        Rendered::with_keyboard(self.prompt.clone(), kb)
    }

    fn handle_callback(&self, _data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        Self::reject(ctx.theme)
    }

    fn handle_message(&self, content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        match content {
            MessageContent::Contact { phone_number } => {
                WidgetResult::advance(phone_number.as_str(), format!("Phone: {phone_number}"))
            }
            _ => Self::reject(ctx.theme),
        }
    }
}
