//! Shared building blocks for selection widgets.

use std::collections::BTreeSet;

use super::{InlineBuilder, Keyboard, Options, WidgetContext, WidgetResult, fill};

pub(crate) fn reject_text(ctx: &WidgetContext<'_>) -> WidgetResult {
    WidgetResult::reject(ctx.theme.errors.use_buttons.clone())
}

pub(crate) fn no_options_reject(ctx: &WidgetContext<'_>) -> WidgetResult {
    if ctx.optional {
        WidgetResult::reject("No options available. Send /skip to skip.")
    } else {
        WidgetResult::reject("No options available.")
    }
}

pub(crate) fn no_options_text(ctx: &WidgetContext<'_>, prompt: &str) -> String {
    let hint = if ctx.optional {
        " Send /skip to continue."
    } else {
        ""
    };
    format!("{prompt}\n\n{}{hint}", ctx.theme.display.no_options)
}

/// Plain option grid, one callback per key.
pub(crate) fn option_keyboard(options: &Options, columns: usize) -> Keyboard {
    InlineBuilder::new()
        .grid(options.iter().map(|(k, l)| (l.as_str(), k.as_str())), columns)
        .build()
}

/// Radio grid with selection icons and a Done button.
pub(crate) fn radio_keyboard(
    ctx: &WidgetContext<'_>,
    options: &Options,
    selected: &str,
    columns: usize,
    prefix: &str,
) -> Keyboard {
    let sel = &ctx.theme.selection;
    let items = options.iter().map(|(key, label)| {
        let icon = if key == selected {
            &sel.radio_on
        } else {
            &sel.radio_off
        };
        (format!("{icon} {label}"), format!("{prefix}:{key}"))
    });
    InlineBuilder::new()
        .grid(items, columns)
        .button(ctx.theme.action.done.clone(), format!("{prefix}:done"))
        .build()
}

/// Checkbox grid with a Done button.
pub(crate) fn checked_keyboard(
    ctx: &WidgetContext<'_>,
    options: &Options,
    selected: &BTreeSet<String>,
    columns: usize,
    prefix: &str,
) -> Keyboard {
    let sel = &ctx.theme.selection;
    let items = options.iter().map(|(key, label)| {
        let icon = if selected.contains(key) {
            &sel.checked
        } else {
            &sel.unchecked
        };
        (format!("{icon} {label}"), format!("{prefix}:{key}"))
    });
    InlineBuilder::new()
        .grid(items, columns)
        .button(ctx.theme.action.done.clone(), format!("{prefix}:done"))
        .build()
}

/// `{prefix}:{key}` stays on the key, `{prefix}:done` commits it.
pub(crate) fn handle_radio(
    data: &str,
    options: &Options,
    selected: &str,
    ctx: &WidgetContext<'_>,
    prefix: &str,
) -> WidgetResult {
    let Some(rest) = data
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix(':'))
    else {
        return WidgetResult::NoOp;
    };
    if rest == "done" {
        return match options.get(selected) {
            Some(label) => WidgetResult::advance(selected, format!("Selected: {label}")),
            None => WidgetResult::reject(ctx.theme.errors.select_option.clone()),
        };
    }
    if options.contains_key(rest) {
        WidgetResult::stay(rest)
    } else {
        WidgetResult::NoOp
    }
}

/// Toggle `{prefix}:{key}` membership, `{prefix}:done` commits the
/// sorted comma-joined selection. A zero `max` means unlimited.
pub(crate) fn handle_checked(
    data: &str,
    options: &Options,
    selected: &BTreeSet<String>,
    ctx: &WidgetContext<'_>,
    prefix: &str,
    min: usize,
    max: usize,
) -> WidgetResult {
    let Some(rest) = data
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix(':'))
    else {
        return WidgetResult::NoOp;
    };
    if rest == "done" {
        if min > 0 && selected.len() < min {
            return WidgetResult::reject(fill(&ctx.theme.errors.min_select, &[&min]));
        }
        let labels: Vec<&str> = selected
            .iter()
            .map(|k| options.get(k).map_or(k.as_str(), String::as_str))
            .collect();
        let summary = if labels.is_empty() {
            "(none)".to_string()
        } else {
            labels.join(", ")
        };
        return WidgetResult::advance(join_selected(selected), format!("Selected: {summary}"));
    }
    if !options.contains_key(rest) {
        return WidgetResult::NoOp;
    }
    let mut toggled = selected.clone();
    if !toggled.remove(rest) {
        if max > 0 && toggled.len() >= max {
            return WidgetResult::reject(fill(&ctx.theme.errors.max_items, &[&max]));
        }
        toggled.insert(rest.to_string());
    }
    WidgetResult::stay(join_selected(&toggled))
}

/// Parse a comma-joined selection from the current value.
pub(crate) fn parse_selected(ctx: &WidgetContext<'_>) -> BTreeSet<String> {
    ctx.current_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').map(str::to_owned).collect())
        .unwrap_or_default()
}

pub(crate) fn join_selected(selected: &BTreeSet<String>) -> String {
    selected.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

/// `"some_field"` to `"Some Field"`.
pub(crate) fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Display a collected value the way review screens show it.
pub(crate) fn display_value(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
