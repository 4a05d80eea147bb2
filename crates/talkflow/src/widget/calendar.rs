//! Date and time pickers.
//!
//! Multi-view pickers keep their navigation position in `Stay` state as a
//! small serde struct, so a half-finished pick survives a session reload.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, Month};

use super::helpers::{no_options_reject, no_options_text, reject_text};
use super::{InlineBuilder, MessageContent, Rendered, Widget, WidgetContext, WidgetResult};

const WEEKDAY_HEADER: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];
const WEEKDAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

fn parse_iso(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

fn format_iso(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Format with a user-supplied description, falling back to ISO.
fn format_with(date: Date, description: &str) -> String {
    time::format_description::parse(description)
        .ok()
        .and_then(|items| date.format(&items).ok())
        .unwrap_or_else(|| format_iso(date))
}

fn days_in_month(year: i32, month: Month) -> u8 {
    (28..=31)
        .rev()
        .find(|&d| Date::from_calendar_date(year, month, d).is_ok())
        .unwrap_or(28)
}

fn hour_grid(prefix: &str, hours: std::ops::RangeInclusive<u8>) -> InlineBuilder {
    InlineBuilder::new().grid(
        hours.map(|h| (format!("{h:02}"), format!("{prefix}:h:{h}"))),
        6,
    )
}

fn minute_grid(prefix: &str, step: u8) -> InlineBuilder {
    InlineBuilder::new().grid(
        (0..60u8)
            .step_by(step.max(1) as usize)
            .map(|m| (format!(":{m:02}"), format!("{prefix}:m:{m}"))),
        4,
    )
}

// ============================================================================
// DatePicker
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DateView {
    Day,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct DatePickerState {
    year: i32,
    month: u8,
    view: DateView,
}

impl DatePickerState {
    fn month(&self) -> Month {
        Month::try_from(self.month).unwrap_or(Month::January)
    }
}

/// Calendar month grid with a month selector and year navigation.
///
/// The committed value is the ISO date string.
#[derive(Debug, Clone)]
pub struct DatePicker {
    prompt: String,
    min_date: Option<Date>,
    max_date: Option<Date>,
}

impl DatePicker {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            min_date: None,
            max_date: None,
        }
    }

    /// Days before `date` render disabled.
    pub fn min_date(mut self, date: Date) -> Self {
        self.min_date = Some(date);
        self
    }

    /// Days after `date` render disabled.
    pub fn max_date(mut self, date: Date) -> Self {
        self.max_date = Some(date);
        self
    }

    fn state(&self, ctx: &WidgetContext<'_>) -> DatePickerState {
        ctx.state_as().unwrap_or(DatePickerState {
            year: ctx.today.year(),
            month: ctx.today.month() as u8,
            view: DateView::Day,
        })
    }

    fn enabled(&self, date: Date) -> bool {
        self.min_date.is_none_or(|min| date >= min) && self.max_date.is_none_or(|max| date <= max)
    }

    fn day_view(&self, ctx: &WidgetContext<'_>, st: DatePickerState) -> InlineBuilder {
        let nav = &ctx.theme.nav;
        let month = st.month();
        let kb = InlineBuilder::new()
            .button(nav.prev.clone(), "dp:pm")
            .button(format!("{month} {}", st.year), "dp:mv")
            .button(nav.next.clone(), "dp:nm")
            .grid(WEEKDAY_HEADER.map(|d| (d, "dp:noop")), 7);

        let Ok(first) = Date::from_calendar_date(st.year, month, 1) else {
            return kb;
        };
        let lead = first.weekday().number_days_from_monday() as usize;
        let mut cells: Vec<(String, String)> = vec![(" ".into(), "dp:noop".into()); lead];
        for day in 1..=days_in_month(st.year, month) {
            let Ok(date) = Date::from_calendar_date(st.year, month, day) else {
                continue;
            };
            if self.enabled(date) {
                cells.push((day.to_string(), format!("dp:d:{}", format_iso(date))));
            } else {
                cells.push((ctx.theme.display.disabled_date.clone(), "dp:noop".into()));
            }
        }
        while cells.len() % 7 != 0 {
            cells.push((" ".into(), "dp:noop".into()));
        }
        kb.grid(cells, 7)
    }

    fn month_view(&self, ctx: &WidgetContext<'_>, st: DatePickerState) -> InlineBuilder {
        let nav = &ctx.theme.nav;
        let months = (1..=12u8).filter_map(|m| {
            let name = Month::try_from(m).ok()?.to_string();
            Some((name.chars().take(3).collect::<String>(), format!("dp:m:{m}")))
        });
        InlineBuilder::new()
            .button(nav.prev.clone(), "dp:py")
            .button(st.year.to_string(), "dp:noop")
            .button(nav.next.clone(), "dp:ny")
            .grid(months, 3)
    }
}

impl Widget for DatePicker {
    fn kind(&self) -> &'static str {
        "date"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let st = self.state(ctx);
        let kb = match st.view {
            DateView::Day => self.day_view(ctx, st),
            DateView::Month => self.month_view(ctx, st),
        };
        Rendered::with_keyboard(self.prompt.clone(), kb.build())
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let st = self.state(ctx);
        let stay = |year: i32, month: u8, view: DateView| {
            let next = DatePickerState { year, month, view };
            serde_json::to_value(next).map_or(WidgetResult::NoOp, WidgetResult::stay)
        };
        match data {
            "dp:pm" if st.month <= 1 => stay(st.year - 1, 12, DateView::Day),
            "dp:pm" => stay(st.year, st.month - 1, DateView::Day),
            "dp:nm" if st.month >= 12 => stay(st.year + 1, 1, DateView::Day),
            "dp:nm" => stay(st.year, st.month + 1, DateView::Day),
            "dp:py" => stay(st.year - 1, st.month, DateView::Month),
            "dp:ny" => stay(st.year + 1, st.month, DateView::Month),
            "dp:mv" => stay(st.year, st.month, DateView::Month),
            other => {
                if let Some(m) = other.strip_prefix("dp:m:").and_then(|m| m.parse::<u8>().ok()) {
                    if (1..=12).contains(&m) {
                        return stay(st.year, m, DateView::Day);
                    }
                    return WidgetResult::NoOp;
                }
                match other.strip_prefix("dp:d:").and_then(parse_iso) {
                    Some(date) if self.enabled(date) => WidgetResult::advance(
                        format_iso(date),
                        format_with(date, &ctx.theme.display.date_format),
                    ),
                    _ => WidgetResult::NoOp,
                }
            }
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        WidgetResult::reject(ctx.theme.errors.use_calendar.clone())
    }
}

// ============================================================================
// TimePicker
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TimeView {
    #[default]
    Hour,
    Minute,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct TimePickerState {
    view: TimeView,
    hour: u8,
}

/// Hour grid, then minute grid. The committed value is `"HH:MM"`.
#[derive(Debug, Clone)]
pub struct TimePicker {
    prompt: String,
    min_hour: u8,
    max_hour: u8,
    step_minutes: u8,
}

impl TimePicker {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            min_hour: 0,
            max_hour: 23,
            step_minutes: 15,
        }
    }

    pub fn hours(mut self, min: u8, max: u8) -> Self {
        self.min_hour = min.min(23);
        self.max_hour = max.clamp(self.min_hour, 23);
        self
    }

    pub fn step_minutes(mut self, step: u8) -> Self {
        self.step_minutes = step.clamp(1, 60);
        self
    }
}

impl Widget for TimePicker {
    fn kind(&self) -> &'static str {
        "time"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let st: TimePickerState = ctx.state_as().unwrap_or_default();
        match st.view {
            TimeView::Hour => Rendered::with_keyboard(
                format!("{}\n\nSelect hour:", self.prompt),
                hour_grid("tp", self.min_hour..=self.max_hour).build(),
            ),
            TimeView::Minute => Rendered::with_keyboard(
                format!(
                    "{}\n\n{:02}:__ \u{2014} select minutes:",
                    self.prompt, st.hour
                ),
                minute_grid("tp", self.step_minutes)
                    .button(ctx.theme.nav.back_arrow.clone(), "tp:back")
                    .build(),
            ),
        }
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        if data == "tp:back" {
            return serde_json::to_value(TimePickerState::default())
                .map_or(WidgetResult::NoOp, WidgetResult::stay);
        }
        if let Some(h) = data.strip_prefix("tp:h:").and_then(|h| h.parse::<u8>().ok()) {
            if !(self.min_hour..=self.max_hour).contains(&h) {
                return WidgetResult::NoOp;
            }
            let next = TimePickerState {
                view: TimeView::Minute,
                hour: h,
            };
            return serde_json::to_value(next).map_or(WidgetResult::NoOp, WidgetResult::stay);
        }
        if let Some(m) = data.strip_prefix("tp:m:").and_then(|m| m.parse::<u8>().ok()) {
            let st: TimePickerState = ctx.state_as().unwrap_or_default();
            if st.view != TimeView::Minute || m >= 60 {
                return WidgetResult::NoOp;
            }
            let hhmm = format!("{:02}:{m:02}", st.hour);
            return WidgetResult::advance(hhmm.clone(), hhmm);
        }
        WidgetResult::NoOp
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        WidgetResult::reject(ctx.theme.errors.use_time_picker.clone())
    }
}

// ============================================================================
// RecurrencePicker
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RecurrenceView {
    #[default]
    Days,
    Hour,
    Minute,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RecurrenceState {
    view: RecurrenceView,
    /// Sorted weekday indices, Monday = 0.
    days: Vec<u8>,
    hour: u8,
}

impl RecurrenceState {
    fn day_summary(&self) -> String {
        self.days
            .iter()
            .filter_map(|&d| WEEKDAY_NAMES.get(d as usize).copied())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn into_stay(self) -> WidgetResult {
        serde_json::to_value(self).map_or(WidgetResult::NoOp, WidgetResult::stay)
    }
}

/// Weekday set plus a time of day, picked in three steps.
///
/// The committed value looks like `"0,2,4@10:30"`.
#[derive(Debug, Clone)]
pub struct RecurrencePicker {
    prompt: String,
    min_hour: u8,
    max_hour: u8,
    step_minutes: u8,
}

impl RecurrencePicker {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            min_hour: 0,
            max_hour: 23,
            step_minutes: 15,
        }
    }

    pub fn hours(mut self, min: u8, max: u8) -> Self {
        self.min_hour = min.min(23);
        self.max_hour = max.clamp(self.min_hour, 23);
        self
    }

    pub fn step_minutes(mut self, step: u8) -> Self {
        self.step_minutes = step.clamp(1, 60);
        self
    }
}

impl Widget for RecurrencePicker {
    fn kind(&self) -> &'static str {
        "recurrence"
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn needs_callback(&self) -> bool {
        true
    }

    fn render(&self, ctx: &WidgetContext<'_>) -> Rendered {
        let st: RecurrenceState = ctx.state_as().unwrap_or_default();
        let nav = &ctx.theme.nav;
        match st.view {
            RecurrenceView::Days => {
                let sel = &ctx.theme.selection;
                let mut kb = InlineBuilder::new();
                for (i, day) in WEEKDAY_NAMES.iter().enumerate() {
                    let icon = if st.days.contains(&(i as u8)) {
                        &sel.checked
                    } else {
                        &sel.unchecked
                    };
                    kb = kb.button(format!("{icon} {day}"), format!("rc:d:{i}"));
                }
                kb = kb.row();
                if !st.days.is_empty() {
                    kb = kb.button(format!("{} Next", nav.next), "rc:next");
                }
                Rendered::with_keyboard(format!("{}\n\nSelect days:", self.prompt), kb.build())
            }
            RecurrenceView::Hour => Rendered::with_keyboard(
                format!("{}\n\n{}\nSelect hour:", self.prompt, st.day_summary()),
                hour_grid("rc", self.min_hour..=self.max_hour)
                    .button(nav.back_arrow.clone(), "rc:back:days")
                    .build(),
            ),
            RecurrenceView::Minute => Rendered::with_keyboard(
                format!(
                    "{}\n\n{} at {:02}:__",
                    self.prompt,
                    st.day_summary(),
                    st.hour
                ),
                minute_grid("rc", self.step_minutes)
                    .button(nav.back_arrow.clone(), "rc:back:hour")
                    .build(),
            ),
        }
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        let mut st: RecurrenceState = ctx.state_as().unwrap_or_default();
        match data {
            "rc:next" => {
                if st.days.is_empty() {
                    return WidgetResult::reject(ctx.theme.errors.select_days.clone());
                }
                st.view = RecurrenceView::Hour;
                st.into_stay()
            }
            "rc:back:days" => {
                st.view = RecurrenceView::Days;
                st.into_stay()
            }
            "rc:back:hour" => {
                st.view = RecurrenceView::Hour;
                st.into_stay()
            }
            other => {
                if let Some(d) = other.strip_prefix("rc:d:").and_then(|d| d.parse::<u8>().ok()) {
                    if d >= 7 {
                        return WidgetResult::NoOp;
                    }
                    match st.days.binary_search(&d) {
                        Ok(pos) => {
                            st.days.remove(pos);
                        }
                        Err(pos) => st.days.insert(pos, d),
                    }
                    return st.into_stay();
                }
                if let Some(h) = other.strip_prefix("rc:h:").and_then(|h| h.parse::<u8>().ok()) {
                    st.view = RecurrenceView::Minute;
                    st.hour = h.min(23);
                    return st.into_stay();
                }
                match other.strip_prefix("rc:m:").and_then(|m| m.parse::<u8>().ok()) {
                    Some(m) if m < 60 && !st.days.is_empty() => {
                        let days = st
                            .days
                            .iter()
                            .map(u8::to_string)
                            .collect::<Vec<_>>()
                            .join(",");
                        WidgetResult::advance(
                            format!("{days}@{:02}:{m:02}", st.hour),
                            format!("{} at {:02}:{m:02}", st.day_summary(), st.hour),
                        )
                    }
                    _ => WidgetResult::NoOp,
                }
            }
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        reject_text(ctx)
    }
}

// ============================================================================
// TimeSlotPicker
// ============================================================================

/// Pick one slot from loaded options keyed like `2024-01-15T10:00`.
///
/// Slots are grouped under a header per date, in the order the provider
/// returned them.
#[derive(Debug, Clone)]
pub struct TimeSlotPicker {
    prompt: String,
    columns: usize,
    header_format: String,
}

impl TimeSlotPicker {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            columns: 3,
            header_format: "[weekday repr:short] [month repr:short] [day]".into(),
        }
    }

    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    pub fn header_format(mut self, description: impl Into<String>) -> Self {
        self.header_format = description.into();
        self
    }
}

impl Widget for TimeSlotPicker {
    fn kind(&self) -> &'static str {
        "time_slot"
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
        let mut groups: IndexMap<&str, Vec<(&str, &str)>> = IndexMap::new();
        for (key, label) in opts {
            let date_part = key.split_once('T').map_or("", |(d, _)| d);
            groups
                .entry(date_part)
                .or_default()
                .push((label.as_str(), key.as_str()));
        }
        let mut kb = InlineBuilder::new();
        for (date_part, slots) in groups {
            if !date_part.is_empty() {
                let header = parse_iso(date_part)
                    .map_or_else(|| date_part.to_string(), |d| format_with(d, &self.header_format));
                kb = kb
                    .row()
                    .button(format!("\u{2014} {header} \u{2014}"), "ts:noop");
            }
            kb = kb.grid(
                slots
                    .into_iter()
                    .map(|(label, key)| (label.to_string(), format!("ts:{key}"))),
                self.columns,
            );
        }
        Rendered::with_keyboard(self.prompt.clone(), kb.build())
    }

    fn handle_callback(&self, data: &str, ctx: &WidgetContext<'_>) -> WidgetResult {
        if data == "ts:noop" {
            return WidgetResult::NoOp;
        }
        let Some(key) = data.strip_prefix("ts:") else {
            return WidgetResult::NoOp;
        };
        match ctx.dynamic_options().and_then(|opts| opts.get(key)) {
            Some(label) => WidgetResult::advance(key, format!("Selected: {label}")),
            None => WidgetResult::NoOp,
        }
    }

    fn handle_message(&self, _content: &MessageContent, ctx: &WidgetContext<'_>) -> WidgetResult {
        if ctx.dynamic_options().is_none() {
            return no_options_reject(ctx);
        }
        reject_text(ctx)
    }

    fn uses_dynamic_options(&self) -> bool {
        true
    }
}
