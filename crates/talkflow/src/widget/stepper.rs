//! Numeric widgets driven by button presses with transient state.

use super::helpers::reject_text;
use super::{InlineBuilder, MessageContent, Rendered, Widget, WidgetContext, WidgetResult};

/// Increment/decrement stepper committed by Done.
///
/// Every press is a `Stay` carrying the new value, clamped to `[min, max]`.
#[derive(Debug, Clone)]
pub struct Counter {
    prompt: String,
    min: i64,
    max: i64,
    step: i64,
    default: i64,
}

impl Counter {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            min: 0,
            max: 999_999,
            step: 1,
            default: 0,
        }
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = min;
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = max;
        self
    }

    pub fn step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    pub fn default_value(mut self, default: i64) -> Self {
        self.default = default;
        self
    }

    fn current(&self, ctx: &WidgetContext<'_>) -> i64 {
        ctx.current_i64().unwrap_or(self.default)
    }
}

impl Widget for Counter {
    fn kind(&self) -> &'static str {
        "counter"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let action = &ctx.theme.action;
        let kb = InlineBuilder::new()
            .button(action.decrement.clone(), "counter:dec")
            .button(self.current(ctx).to_string(), "counter:noop")
            .button(action.increment.clone(), "counter:inc")
            .row()
            .button(action.done.clone(), "counter:done")
            .build();
        Rendered::with_keyboard(self.prompt.clone(), kb)
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let current = self.current(ctx);
        match data {
            "counter:inc" => WidgetResult::stay(current.saturating_add(self.step).min(self.max)),
            "counter:dec" => WidgetResult::stay(current.saturating_sub(self.step).max(self.min)),
            "counter:done" => WidgetResult::advance(current, format!("Value: {current}")),
            _ => WidgetResult::NoOp,
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}

/// Star rating: tap a star count to preview, then confirm.
#[derive(Debug, Clone)]
pub struct Rating {
    prompt: String,
    max_stars: i64,
    filled: String,
    empty: String,
}

impl Rating {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_stars: 5,
            filled: "\u{2605}".into(),
            empty: "\u{2606}".into(),
        }
    }

    pub fn max_stars(mut self, max_stars: i64) -> Self {
        self.max_stars = max_stars.max(1);
        self
    }

    pub fn glyphs(mut self, filled: impl Into<String>, empty: impl Into<String>) -> Self {
        self.filled = filled.into();
        self.empty = empty.into();
        self
    }

    fn stars(&self, n: i64) -> String {
        let n = n.clamp(0, self.max_stars) as usize;
        format!(
            "{}{}",
            self.filled.repeat(n),
            self.empty.repeat(self.max_stars as usize - n)
        )
    }
}

impl Widget for Rating {
    fn kind(&self) -> &'static str {
        "rating"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let current = ctx.current_i64().unwrap_or(0);
        let text = if current > 0 {
            format!("{}\n\n{}", self.prompt, self.stars(current))
        } else {
            self.prompt.clone()
        };
        let mut kb = InlineBuilder::new();
        for i in 1..=self.max_stars {
            let label = if i <= current {
                self.filled.clone()
            } else {
                i.to_string()
            };
            kb = kb.button(label, format!("rate:{i}"));
        }
        kb = kb.row();
        if current > 0 {
            kb = kb.button(
                format!("Confirm {}", self.filled.repeat(current as usize)),
                "rate:done",
            );
        }
        Rendered::with_keyboard(text, kb.build())
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let current = ctx.current_i64().unwrap_or(0);
        if data == "rate:done" {
            if current <= 0 {
                return WidgetResult::reject(ctx.theme.errors.select_rating.clone());
            }
            return WidgetResult::advance(
                current,
                format!(
                    "{} ({current}/{})",
                    self.filled.repeat(current as usize),
                    self.max_stars
                ),
            );
        }
        match data.strip_prefix("rate:").and_then(|n| n.parse::<i64>().ok()) {
            Some(n) if (1..=self.max_stars).contains(&n) => WidgetResult::stay(n),
            _ => WidgetResult::NoOp,
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}

/// Range slider with a text progress bar, fine and coarse steps, and
/// optional preset shortcuts.
#[derive(Debug, Clone)]
pub struct Slider {
    prompt: String,
    min: i64,
    max: i64,
    step: i64,
    big_step: i64,
    default: i64,
    presets: Vec<i64>,
    bar_width: usize,
    filled: String,
    empty: String,
}

impl Slider {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            min: 0,
            max: 100,
            step: 1,
            big_step: 10,
            default: 0,
            presets: Vec::new(),
            bar_width: 10,
            filled: "\u{2588}".into(),
            empty: "\u{2591}".into(),
        }
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    pub fn big_step(mut self, big_step: i64) -> Self {
        self.big_step = big_step;
        self
    }

    pub fn default_value(mut self, default: i64) -> Self {
        self.default = default;
        self
    }

    pub fn presets(mut self, presets: impl IntoIterator<Item = i64>) -> Self {
        self.presets = presets.into_iter().collect();
        self
    }

    pub fn bar_width(mut self, bar_width: usize) -> Self {
        self.bar_width = bar_width;
        self
    }

    fn current(&self, ctx: &WidgetContext<'_>) -> i64 {
        ctx.current_i64().unwrap_or(self.default)
    }

    fn clamp(&self, value: i64) -> i64 {
        value.max(self.min).min(self.max)
    }

    fn bar(&self, value: i64) -> String {
        let ratio = if self.max == self.min {
            1.0
        } else {
            (value - self.min) as f64 / (self.max - self.min) as f64
        };
        let filled = ((ratio * self.bar_width as f64).round() as usize).min(self.bar_width);
        format!(
            "{}{}",
            self.filled.repeat(filled),
            self.empty.repeat(self.bar_width - filled)
        )
    }
}

impl Widget for Slider {
    fn kind(&self) -> &'static str {
        "slider"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let current = self.current(ctx);
        let text = format!("{}\n\n{} {current}", self.prompt, self.bar(current));
        let nav = &ctx.theme.nav;
        let action = &ctx.theme.action;
        let kb = InlineBuilder::new()
            .button(nav.prev.clone(), "sl:left")
            .button(format!("{}{}", action.decrement, self.big_step), "sl:dec")
            .button(current.to_string(), "sl:noop")
            .button(format!("{}{}", action.increment, self.big_step), "sl:inc")
            .button(nav.next.clone(), "sl:right")
            .grid(
                self.presets.iter().map(|p| (p.to_string(), format!("sl:p:{p}"))),
                self.presets.len().max(1),
            )
            .button(action.done.clone(), "sl:done")
            .build();
        Rendered::with_keyboard(text, kb)
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let current = self.current(ctx);
        match data {
            "sl:left" => WidgetResult::stay(self.clamp(current - self.step)),
            "sl:right" => WidgetResult::stay(self.clamp(current + self.step)),
            "sl:dec" => WidgetResult::stay(self.clamp(current - self.big_step)),
            "sl:inc" => WidgetResult::stay(self.clamp(current + self.big_step)),
            "sl:done" => {
                WidgetResult::advance(current, format!("{} {current}", self.bar(current)))
            }
            other => match other.strip_prefix("sl:p:").and_then(|p| p.parse::<i64>().ok()) {
                Some(p) => WidgetResult::stay(self.clamp(p)),
                None => WidgetResult::NoOp,
            },
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}

/// Digit-by-digit code entry on a numpad.
#[derive(Debug, Clone)]
pub struct PinInput {
    prompt: String,
    length: usize,
    mask: String,
    empty_dot: String,
    secret: bool,
}

impl PinInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            length: 4,
            mask: "\u{25cf}".into(),
            empty_dot: "\u{25cb}".into(),
            secret: true,
        }
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = length.max(1);
        self
    }

    /// Show entered digits instead of masking them.
    pub fn visible(mut self) -> Self {
        self.secret = false;
        self
    }

    fn display(&self, digits: &str) -> String {
        let mut chars = digits.chars();
        (0..self.length)
            .map(|_| match chars.next() {
                Some(_) if self.secret => self.mask.clone(),
                Some(d) => d.to_string(),
                None => self.empty_dot.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Widget for PinInput {
    fn kind(&self) -> &'static str {
        "pin"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let digits = ctx.current_str().unwrap_or("");
        let text = format!("{}\n\n{}", self.prompt, self.display(digits));
        let pad = (1..=9).map(|d| (d.to_string(), format!("pin:{d}")));
        let kb = InlineBuilder::new()
            .grid(pad, 3)
            .button("\u{232b}", "pin:del")
            .button("0", "pin:0")
            .button(ctx.theme.action.done.clone(), "pin:ok")
            .build();
        Rendered::with_keyboard(text, kb)
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let digits = ctx.current_str().unwrap_or("");
        match data {
            "pin:del" => {
                let mut chars = digits.chars();
                if chars.next_back().is_some() {
                    WidgetResult::stay(chars.as_str())
                } else {
                    WidgetResult::NoOp
                }
            }
            "pin:ok" => {
                let len = digits.chars().count();
                if len < self.length {
                    return WidgetResult::reject(ctx.theme.errors.enter_pin.clone());
                }
                let summary = if self.secret {
                    self.mask.repeat(self.length)
                } else {
                    digits.to_string()
                };
                WidgetResult::advance(digits, summary)
            }
            other => match other.strip_prefix("pin:") {
                Some(d)
                    if d.len() == 1
                        && d.chars().all(|c| c.is_ascii_digit())
                        && digits.chars().count() < self.length =>
                {
                    WidgetResult::stay(format!("{digits}{d}"))
                }
                _ => WidgetResult::NoOp,
            },
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}
