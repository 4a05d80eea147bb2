//! Selection widgets whose choices come from the field's options provider.
//!
//! The engine loads options before the first render and caches them in the
//! session. Until they arrive, or when the provider returns nothing, these
//! widgets show a "no options" notice and reject input.

use super::helpers::{
    checked_keyboard, handle_checked, handle_radio, no_options_reject, no_options_text,
    option_keyboard, parse_selected, radio_keyboard, reject_text,
};
use super::{MessageContent, Rendered, Widget, WidgetContext, WidgetResult};

fn reject_message(ctx: &WidgetContext<'_>) -> WidgetResult {
    if ctx.dynamic_options().is_none() {
        no_options_reject(ctx)
    } else {
        reject_text(ctx)
    }
}

/// [`Inline`](super::Inline) over loaded options.
#[derive(Debug, Clone)]
pub struct DynamicInline {
    prompt: String,
    columns: usize,
}

impl DynamicInline {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            columns: 1,
        }
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }
}

impl Widget for DynamicInline {
    fn kind(&self) -> &'static str {
        "dynamic_inline"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        match ctx.dynamic_options() {
            Some(opts) => {
                Rendered::with_keyboard(self.prompt.clone(), option_keyboard(opts, self.columns))
            }
            None => Rendered::text(no_options_text(ctx, &self.prompt)),
        }
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        match ctx.dynamic_options().and_then(|opts| opts.get(data)) {
            Some(label) => WidgetResult::advance(data, format!("Selected: {label}")),
            None => WidgetResult::NoOp,
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_message(ctx)
    }

    fn uses_dynamic_options(&self) -> bool {
        true
    }
}

/// [`Radio`](super::Radio) over loaded options.
#[derive(Debug, Clone)]
pub struct DynamicRadio {
    prompt: String,
    columns: usize,
}

impl DynamicRadio {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            columns: 1,
        }
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }
}

impl Widget for DynamicRadio {
    fn kind(&self) -> &'static str {
        "dynamic_radio"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let Some(opts) = ctx.dynamic_options() else {
            return Rendered::text(no_options_text(ctx, &self.prompt));
        };
        let selected = ctx.current_str().unwrap_or("");
        Rendered::with_keyboard(
            self.prompt.clone(),
            radio_keyboard(ctx, opts, selected, self.columns, "dr"),
        )
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let Some(opts) = ctx.dynamic_options() else {
            return WidgetResult::NoOp;
        };
        handle_radio(data, opts, ctx.current_str().unwrap_or(""), ctx, "dr")
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_message(ctx)
    }

    fn uses_dynamic_options(&self) -> bool {
        true
    }
}

/// [`Multiselect`](super::Multiselect) over loaded options.
#[derive(Debug, Clone)]
pub struct DynamicMultiselect {
    prompt: String,
    columns: usize,
    min_selected: usize,
    max_selected: usize,
}

impl DynamicMultiselect {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            columns: 1,
            min_selected: 0,
            max_selected: 0,
        }
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn min_selected(mut self, n: usize) -> Self {
        self.min_selected = n;
        self
    }

    pub fn max_selected(mut self, n: usize) -> Self {
        self.max_selected = n;
        self
    }
}

impl Widget for DynamicMultiselect {
    fn kind(&self) -> &'static str {
        "dynamic_multiselect"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let Some(opts) = ctx.dynamic_options() else {
            return Rendered::text(no_options_text(ctx, &self.prompt));
        };
        let selected = parse_selected(ctx);
        Rendered::with_keyboard(
            self.prompt.clone(),
            checked_keyboard(ctx, opts, &selected, self.columns, "dms"),
        )
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let Some(opts) = ctx.dynamic_options() else {
            return WidgetResult::NoOp;
        };
        handle_checked(
            data,
            opts,
            &parse_selected(ctx),
            ctx,
            "dms",
            self.min_selected,
            self.max_selected,
        )
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_message(ctx)
    }

    fn uses_dynamic_options(&self) -> bool {
        true
    }
}
