//! Button-driven selection widgets over a static option set.

use std::collections::BTreeMap;

use super::helpers::{
    checked_keyboard, display_value, handle_checked, handle_radio, option_keyboard,
    parse_selected, radio_keyboard, reject_text, title_case,
};
use super::{
    InlineBuilder, MessageContent, Options, Rendered, Widget, WidgetContext, WidgetResult, fill,
};

/// Single selection from inline buttons. Tapping a button commits.
#[derive(Debug, Clone)]
pub struct Inline {
    prompt: String,
    options: Options,
    columns: usize,
}

impl Inline {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: Options::new(),
            columns: 1,
        }
    }

    pub fn option(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.insert(key.into(), label.into());
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }
}

impl Widget for Inline {
    fn kind(&self) -> &'static str {
        "inline"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, _ctx: &WidgetContext<'_>) -> Rendered {
        Rendered::with_keyboard(
            self.prompt.clone(),
            option_keyboard(&self.options, self.columns),
        )
    }

    fn handle_callback(&self, data: &str, _ctx: &WidgetContext<'_>) -> WidgetResult {
        match self.options.get(data) {
            Some(label) => WidgetResult::advance(data, format!("Selected: {label}")),
            None => WidgetResult::NoOp,
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}

/// Yes/No buttons producing a bool.
#[derive(Debug, Clone)]
pub struct Confirm {
    prompt: String,
    yes_label: Option<String>,
    no_label: Option<String>,
}

impl Confirm {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            yes_label: None,
            no_label: None,
        }
    }

    pub fn labels(mut self, yes: impl Into<String>, no: impl Into<String>) -> Self {
        self.yes_label = Some(yes.into());
        self.no_label = Some(no.into());
        self
    }

    fn yes<'a>(&'a self, ctx: &WidgetContext<'a>) -> &'a str {
        self.yes_label.as_deref().unwrap_or(&ctx.theme.action.yes)
    }

    fn no<'a>(&'a self, ctx: &WidgetContext<'a>) -> &'a str {
        self.no_label.as_deref().unwrap_or(&ctx.theme.action.no)
    }
}

impl Widget for Confirm {
    fn kind(&self) -> &'static str {
        "confirm"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let kb = InlineBuilder::new()
            .button(self.yes(ctx), "yes")
            .button(self.no(ctx), "no")
            .build();
        Rendered::with_keyboard(self.prompt.clone(), kb)
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        match data {
            "yes" => WidgetResult::advance(true, format!("Selected: {}", self.yes(ctx))),
            "no" => WidgetResult::advance(false, format!("Selected: {}", self.no(ctx))),
            _ => WidgetResult::NoOp,
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        WidgetResult::reject(ctx.theme.errors.use_buttons.clone())
    }
}

/// One button showing the current on/off state. Tapping flips and commits.
#[derive(Debug, Clone)]
pub struct Toggle {
    prompt: String,
    on: String,
    off: String,
}

impl Toggle {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            on: "On".into(),
            off: "Off".into(),
        }
    }

    pub fn labels(mut self, on: impl Into<String>, off: impl Into<String>) -> Self {
        self.on = on.into();
        self.off = off.into();
        self
    }

    fn label(&self, value: bool) -> &str {
        if value { &self.on } else { &self.off }
    }
}

impl Widget for Toggle {
    fn kind(&self) -> &'static str {
        "toggle"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let current = ctx.current_bool().unwrap_or(false);
        let sel = &ctx.theme.selection;
        let icon = if current { &sel.toggle_on } else { &sel.toggle_off };
        let kb = InlineBuilder::new()
            .button(format!("{icon} {}", self.label(current)), "toggle")
            .build();
        Rendered::with_keyboard(self.prompt.clone(), kb)
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        if data != "toggle" {
            return WidgetResult::NoOp;
        }
        let flipped = !ctx.current_bool().unwrap_or(false);
        WidgetResult::advance(flipped, self.label(flipped))
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        WidgetResult::reject(ctx.theme.errors.use_button.clone())
    }
}

/// Single selection with visible state, committed by Done.
#[derive(Debug, Clone)]
pub struct Radio {
    prompt: String,
    options: Options,
    columns: usize,
}

impl Radio {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: Options::new(),
            columns: 1,
        }
    }

    pub fn option(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.insert(key.into(), label.into());
        self
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }
}

impl Widget for Radio {
    fn kind(&self) -> &'static str {
        "radio"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let selected = ctx.current_str().unwrap_or("");
        Rendered::with_keyboard(
            self.prompt.clone(),
            radio_keyboard(ctx, &self.options, selected, self.columns, "radio"),
        )
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let selected = ctx.current_str().unwrap_or("");
        handle_radio(data, &self.options, selected, ctx, "radio")
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}

/// Checkbox selection committed by Done.
///
/// The committed value is the sorted, comma-joined set of keys.
#[derive(Debug, Clone)]
pub struct Multiselect {
    prompt: String,
    options: Options,
    columns: usize,
    min_selected: usize,
    max_selected: usize,
}

impl Multiselect {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: Options::new(),
            columns: 1,
            min_selected: 0,
            max_selected: 0,
        }
    }

    pub fn option(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.insert(key.into(), label.into());
        self
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    /// Minimum selections required by Done.
    pub fn min_selected(mut self, n: usize) -> Self {
        self.min_selected = n;
        self
    }

    /// Maximum selections. Zero means unlimited.
    pub fn max_selected(mut self, n: usize) -> Self {
        self.max_selected = n;
        self
    }
}

impl Widget for Multiselect {
    fn kind(&self) -> &'static str {
        "multiselect"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let selected = parse_selected(ctx);
        Rendered::with_keyboard(
            self.prompt.clone(),
            checked_keyboard(ctx, &self.options, &selected, self.columns, "ms"),
        )
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let selected = parse_selected(ctx);
        handle_checked(
            data,
            &self.options,
            &selected,
            ctx,
            "ms",
            self.min_selected,
            self.max_selected,
        )
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}

/// Paginated single selection for large option sets.
#[derive(Debug, Clone)]
pub struct ScrollingInline {
    prompt: String,
    options: Options,
    columns: usize,
    page_size: usize,
}

impl ScrollingInline {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: Options::new(),
            columns: 1,
            page_size: 6,
        }
    }

    pub fn option(mut self, key: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.insert(key.into(), label.into());
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn total_pages(&self) -> usize {
        self.options.len().div_ceil(self.page_size).max(1)
    }

    fn page(&self, ctx: &WidgetContext<'_>) -> usize {
        let page = ctx
            .state
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as usize;
        page.min(self.total_pages() - 1)
    }
}

impl Widget for ScrollingInline {
    fn kind(&self) -> &'static str {
        "scrolling_inline"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let page = self.page(ctx);
        let total_pages = self.total_pages();
        let items = self
            .options
            .iter()
            .skip(page * self.page_size)
            .take(self.page_size)
            .map(|(k, l)| (l.as_str(), k.as_str()));
        let mut kb = InlineBuilder::new().grid(items, self.columns);
        if total_pages > 1 {
            let nav = &ctx.theme.nav;
            if page > 0 {
                kb = kb.button(nav.prev.clone(), "si:prev");
            }
            kb = kb.button(
                fill(&ctx.theme.display.page_format, &[&(page + 1), &total_pages]),
                "si:noop",
            );
            if page + 1 < total_pages {
                kb = kb.button(nav.next.clone(), "si:next");
            }
        }
        Rendered::with_keyboard(self.prompt.clone(), kb.build())
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let page = self.page(ctx);
        match data {
            "si:prev" => WidgetResult::stay(page.saturating_sub(1) as u64),
            "si:next" => WidgetResult::stay((page + 1).min(self.total_pages() - 1) as u64),
            "si:noop" => WidgetResult::NoOp,
            key => match self.options.get(key) {
                Some(label) => WidgetResult::advance(key, format!("Selected: {label}")),
                None => WidgetResult::NoOp,
            },
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}

/// Show a message chosen by an earlier field's value, acknowledged with OK.
///
/// The committed value is the shown text.
#[derive(Debug, Clone)]
pub struct Case {
    selector: String,
    variants: BTreeMap<String, String>,
}

impl Case {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            variants: BTreeMap::new(),
        }
    }

    pub fn variant(mut self, value: impl Into<String>, text: impl Into<String>) -> Self {
        self.variants.insert(value.into(), text.into());
        self
    }

    fn resolve(&self, ctx: &WidgetContext<'_>) -> String {
        ctx.value_of(&self.selector)
            .map(display_value)
            .and_then(|key| self.variants.get(&key).cloned())
            .unwrap_or_default()
    }

    fn commit(&self, ctx: &WidgetContext<'_>) -> WidgetResult {
        let text = self.resolve(ctx);
        let summary = if text.is_empty() {
            "(none)".to_string()
        } else {
            text.clone()
        };
        WidgetResult::advance(text, summary)
    }
}

impl Widget for Case {
    fn kind(&self) -> &'static str {
        "case"
    }

    fn prompt(&self) -> &str {
        ""
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let text = self.resolve(ctx);
        let text = if text.is_empty() {
            "(no variant matched)".to_string()
        } else {
            text
        };
        let kb = InlineBuilder::new()
            .button(ctx.theme.action.ok.clone(), "case:ok")
            .build();
        Rendered::with_keyboard(text, kb)
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        if data == "case:ok" {
            self.commit(ctx)
        } else {
            WidgetResult::NoOp
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        self.commit(ctx)
    }

    fn depends_on(&self) -> Vec<&str> {
        vec![self.selector.as_str()]
    }
}

/// Inline review of every earlier answer, confirmed with Done.
#[derive(Debug, Clone, Default)]
pub struct SummaryReview {
    labels: BTreeMap<String, String>,
}

impl SummaryReview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field.into(), label.into());
        self
    }
}

impl Widget for SummaryReview {
    fn kind(&self) -> &'static str {
        "summary_review"
    }

    fn prompt(&self) -> &str {
        ""
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let lines: Vec<String> = ctx
            .values
            .iter()
            .filter(|(name, value)| !value.is_null() && name.as_str() != ctx.field)
            .map(|(name, value)| {
                let label = self
                    .labels
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| title_case(name));
                format!("  {label}: {}", display_value(value))
            })
            .collect();
        let text = if lines.is_empty() {
            ctx.theme.display.no_data.clone()
        } else {
            format!("{}\n\n{}", ctx.theme.display.review_header, lines.join("\n"))
        };
        let kb = InlineBuilder::new()
            .button(ctx.theme.action.done.clone(), "sr:ok")
            .build();
        Rendered::with_keyboard(text, kb)
    }

    fn handle_callback(&self, data: &str, _ctx: &WidgetContext<'_>) -> WidgetResult {
        if data == "sr:ok" {
            WidgetResult::advance(true, "Confirmed")
        } else {
            WidgetResult::NoOp
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}
