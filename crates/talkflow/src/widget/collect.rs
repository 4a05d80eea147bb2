//! Widgets that accumulate several messages into one list answer.

use serde::{Deserialize, Serialize};

use super::{
    InlineBuilder, Keyboard, MessageContent, Rendered, Widget, WidgetContext, WidgetResult, fill,
};
use crate::validation::validate_text;

fn list_keyboard(ctx: &WidgetContext<'_>, done: Option<(String, &str)>, undo: &str) -> Keyboard {
    let mut kb = InlineBuilder::new();
    if let Some((label, data)) = done {
        kb = kb.button(label, data);
    }
    kb.button(ctx.theme.action.remove_last.clone(), undo).build()
}

fn pop_last(mut items: Vec<String>) -> WidgetResult {
    items.pop();
    WidgetResult::stay(items)
}

/// Variable-length text list. Each message adds one item.
///
/// Validators run on every item as it is added, so Done only ever commits
/// items that already passed.
#[derive(Debug, Clone)]
pub struct ListBuilder {
    prompt: String,
    min: usize,
    max: usize,
}

impl ListBuilder {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            min: 0,
            max: 100,
        }
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    /// Maximum items. Zero means unlimited.
    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }
}

impl Widget for ListBuilder {
    fn kind(&self) -> &'static str {
        "list"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let items = ctx.current_list();
        if items.is_empty() {
            return Rendered::text(self.prompt.clone());
        }
        let mut lines = vec![self.prompt.clone(), String::new()];
        lines.extend(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| format!("  {}. {item}", i + 1)),
        );
        lines.push(format!(
            "\nSend a message to add ({}/{}):",
            items.len(),
            self.max
        ));
        let done = (items.len() >= self.min)
            .then(|| (format!("Done ({} items)", items.len()), "lb:done"));
        Rendered::with_keyboard(lines.join("\n"), list_keyboard(ctx, done, "lb:undo"))
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let items = ctx.current_list();
        match data {
            "lb:done" => {
                if items.len() < self.min {
                    return WidgetResult::reject(fill(&ctx.theme.errors.min_required, &[&self.min]));
                }
                let mut preview = items
                    .iter()
                    .take(3)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if items.len() > 3 {
                    preview.push_str("...");
                }
                let summary = format!("{} items: {preview}", items.len());
                WidgetResult::advance(items, summary)
            }
            "lb:undo" => pop_last(items),
            _ => WidgetResult::NoOp,
        }
    }

    fn handle_message(&self, content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        let Some(text) = content.as_text() else {
            return WidgetResult::reject(ctx.theme.errors.send_text.clone());
        };
        let mut items = ctx.current_list();
        if self.max > 0 && items.len() >= self.max {
            return WidgetResult::reject(fill(&ctx.theme.errors.max_reached, &[&self.max]));
        }
        if let Err(msg) = validate_text(ctx.validators, text, ctx.theme) {
            return WidgetResult::reject(fill(&ctx.theme.errors.invalid_input, &[&msg]));
        }
        items.push(text.to_string());
        WidgetResult::stay(items)
    }
}

/// Which media messages a [`MediaGroupInput`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Photo,
    Document,
    Video,
    Any,
}

impl MediaKind {
    fn accepts<'a>(&self, content: &'a MessageContent) -> Option<&'a str> {
        match (self, content) {
            (MediaKind::Photo | MediaKind::Any, MessageContent::Photo { file_id })
            | (MediaKind::Document | MediaKind::Any, MessageContent::Document { file_id })
            | (MediaKind::Video | MediaKind::Any, MessageContent::Video { file_id }) => {
                Some(file_id.as_str())
            }
            _ => None,
        }
    }
}

/// Collect several media files one message at a time.
///
/// The committed value is the list of file ids.
#[derive(Debug, Clone)]
pub struct MediaGroupInput {
    prompt: String,
    min: usize,
    max: usize,
    accept: MediaKind,
}

impl MediaGroupInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            min: 1,
            max: 10,
            accept: MediaKind::Photo,
        }
    }

    pub fn min(mut self, min: usize) -> Self {
        self.min = min;
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = max;
        self
    }

    pub fn accept(mut self, kind: MediaKind) -> Self {
        self.accept = kind;
        self
    }
}

impl Widget for MediaGroupInput {
    fn kind(&self) -> &'static str {
        "media_group"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let items = ctx.current_list();
        let count = items.len();
        if count == 0 {
            return Rendered::text(self.prompt.clone());
        }
        let text = format!(
            "{}\n\n\u{1f4ce} {count}/{} files added",
            self.prompt, self.max
        );
        let done = (count >= self.min)
            .then(|| (format!("{} ({count})", ctx.theme.action.done), "mg:done"));
        Rendered::with_keyboard(text, list_keyboard(ctx, done, "mg:undo"))
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let items = ctx.current_list();
        match data {
            "mg:done" => {
                if items.len() < self.min {
                    return WidgetResult::reject(fill(&ctx.theme.errors.min_required, &[&self.min]));
                }
                let summary = format!("{} files", items.len());
                WidgetResult::advance(items, summary)
            }
            "mg:undo" => pop_last(items),
            _ => WidgetResult::NoOp,
        }
    }

    fn handle_message(&self, content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        let mut items = ctx.current_list();
        if self.max > 0 && items.len() >= self.max {
            return WidgetResult::reject(fill(&ctx.theme.errors.max_reached, &[&self.max]));
        }
        match self.accept.accepts(content) {
            Some(file_id) => {
                items.push(file_id.to_string());
                WidgetResult::stay(items)
            }
            None => WidgetResult::reject(ctx.theme.errors.send_media.clone()),
        }
    }
}
