//! Typed text entry.

use serde_json::Value;

use super::{
    InlineBuilder, MessageContent, Rendered, Widget, WidgetContext, WidgetResult, fill,
};
use crate::record::ValueKind;
use crate::validation::display_number;

/// Collect a text message, coerced to the field's value kind.
///
/// Integer and float fields parse the text as a number; bool fields accept
/// `yes`, `true`, `1` and `y` (case-insensitive) as true.
#[derive(Debug, Clone)]
pub struct TextInput {
    prompt: String,
}

impl TextInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

impl Widget for TextInput {
    fn kind(&self) -> &'static str {
        "text"
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
        WidgetResult::reject(ctx.theme.errors.send_text.clone())
    }

    fn handle_message(&self, content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        let Some(text) = content.as_text() else {
            return WidgetResult::reject(ctx.theme.errors.send_text.clone());
        };
        let value = match ctx.kind {
            ValueKind::Integer => match text.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => return WidgetResult::reject(ctx.theme.errors.send_number.clone()),
            },
            ValueKind::Float => match text.trim().parse::<f64>() {
                Ok(n) => Value::from(n),
                Err(_) => return WidgetResult::reject(ctx.theme.errors.send_number.clone()),
            },
            ValueKind::Bool => Value::Bool(matches!(
                text.trim().to_lowercase().as_str(),
                "yes" | "true" | "1" | "y"
            )),
            _ => Value::String(text.to_string()),
        };
        WidgetResult::advance(value, text)
    }
}

/// Number entry with optional quick-select buttons.
///
/// Typed numbers are parsed according to the field kind and checked
/// against `[min, max]`. Shortcut buttons commit their value directly.
#[derive(Debug, Clone)]
pub struct NumberInput {
    prompt: String,
    min: f64,
    max: f64,
    shortcuts: Vec<f64>,
}

impl NumberInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            min: 0.0,
            max: 999_999.0,
            shortcuts: Vec::new(),
        }
    }

    pub fn min(mut self, min: impl Into<f64>) -> Self {
        self.min = min.into();
        self
    }

    pub fn max(mut self, max: impl Into<f64>) -> Self {
        self.max = max.into();
        self
    }

    pub fn shortcuts<I, N>(mut self, shortcuts: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<f64>,
    {
        self.shortcuts = shortcuts.into_iter().map(Into::into).collect();
        self
    }

    fn parse(&self, raw: &str, kind: ValueKind) -> Option<Value> {
        let raw = raw.trim();
        if kind == ValueKind::Integer {
            raw.parse::<i64>().ok().map(Value::from)
        } else {
            raw.parse::<f64>().ok().map(number_value)
        }
    }
}

/// Whole floats become integers so `5` round-trips as `5`, not `5.0`.
fn number_value(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

impl Widget for NumberInput {
    fn kind(&self) -> &'static str {
        "number"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        !self.shortcuts.is_empty()
    }

    fn render(&self, _ctx: &WidgetContext<'_>) -> Rendered {
        if self.shortcuts.is_empty() {
            return Rendered::text(self.prompt.clone());
        }
        let items = self.shortcuts.iter().map(|v| {
            let label = display_number(*v);
            (label.clone(), format!("num:{label}"))
        });
        Rendered::with_keyboard(
            format!("{}\n\nQuick select or type a number:", self.prompt),
            InlineBuilder::new().grid(items, 4).build(),
        )
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let Some(raw) = data.strip_prefix("num:") else {
            return WidgetResult::NoOp;
        };
        match self.parse(raw, ctx.kind) {
            Some(value) => {
                let summary = value.to_string();
                WidgetResult::advance(value, summary)
            }
            None => WidgetResult::NoOp,
        }
    }

    fn handle_message(&self, content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        let Some(text) = content.as_text() else {
            return WidgetResult::reject(ctx.theme.errors.send_number.clone());
        };
        let Some(value) = self.parse(text, ctx.kind) else {
            return WidgetResult::reject(ctx.theme.errors.send_number.clone());
        };
        let n = value.as_f64().unwrap_or(f64::NAN);
        if !(n >= self.min && n <= self.max) {
            return WidgetResult::reject(fill(
                &ctx.theme.errors.range_error,
                &[&display_number(self.min), &display_number(self.max)],
            ));
        }
        let summary = value.to_string();
        WidgetResult::advance(value, summary)
    }
}
