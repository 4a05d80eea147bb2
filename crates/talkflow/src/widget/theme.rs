//! User-visible strings, grouped by concern.
//!
//! Every piece of text a built-in widget or the engine produces comes from
//! a [`Theme`], so a bot can be localized or restyled without touching
//! widget code. Templates use `{}` placeholders filled left to right by
//! [`fill`].

/// Navigation glyphs and labels.
#[derive(Debug, Clone)]
pub struct NavStrings {
    pub prev: String,
    pub next: String,
    pub prev_label: String,
    pub next_label: String,
    pub back: String,
    pub back_arrow: String,
}

/// Selection state icons.
#[derive(Debug, Clone)]
pub struct SelectionStrings {
    pub checked: String,
    pub unchecked: String,
    pub radio_on: String,
    pub radio_off: String,
    pub toggle_on: String,
    pub toggle_off: String,
}

/// Button labels and engine notices.
#[derive(Debug, Clone)]
pub struct ActionStrings {
    pub done: String,
    pub ok: String,
    pub yes: String,
    pub no: String,
    /// Sent when a session is cancelled.
    pub cancel: String,
    pub remove_last: String,
    pub decrement: String,
    pub increment: String,
    /// Summary step button that discards the answers and starts over.
    pub restart: String,
    /// Template: flow name. Sent when a launch hits an exclusive session.
    pub already_running: String,
}

/// Display formatting.
#[derive(Debug, Clone)]
pub struct DisplayStrings {
    pub none_value: String,
    pub no_options: String,
    pub disabled_date: String,
    /// `time` format description used for picked dates.
    pub date_format: String,
    /// Template: current page, page count.
    pub page_format: String,
    pub review_header: String,
    pub no_data: String,
    /// Appended to a prompt whose options could not be loaded.
    pub options_failed: String,
    /// Summary echoed for a field skipped with the skip keyword.
    pub skipped: String,
}

/// Rejection messages.
#[derive(Debug, Clone)]
pub struct ErrorStrings {
    pub use_buttons: String,
    pub use_button: String,
    pub send_text: String,
    pub send_photo: String,
    pub send_document: String,
    pub send_location: String,
    pub send_video: String,
    pub send_voice: String,
    pub send_contact: String,
    pub send_number: String,
    pub use_calendar: String,
    pub use_time_picker: String,
    pub enter_pin: String,
    pub send_media: String,
    pub select_days: String,
    pub select_option: String,
    pub select_rating: String,
    pub too_short: String,
    pub too_long: String,
    pub invalid_format: String,
    pub out_of_range: String,
    pub max_items: String,
    pub min_select: String,
    pub range_error: String,
    pub max_reached: String,
    pub min_required: String,
    /// Template: validator message. Wraps every validator rejection.
    pub invalid_input: String,
}

/// The complete string table.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub nav: NavStrings,
    pub selection: SelectionStrings,
    pub action: ActionStrings,
    pub display: DisplayStrings,
    pub errors: ErrorStrings,
}

impl Default for NavStrings {
    fn default() -> Self {
        Self {
            prev: "\u{25c0}".into(),
            next: "\u{25b6}".into(),
            prev_label: "\u{25c0}\u{fe0f} Prev".into(),
            next_label: "Next \u{25b6}\u{fe0f}".into(),
            back: "Back".into(),
            back_arrow: "\u{25c0} Back".into(),
        }
    }
}

impl Default for SelectionStrings {
    fn default() -> Self {
        Self {
            checked: "\u{2705}".into(),
            unchecked: "\u{2b1c}".into(),
            radio_on: "\u{1f518}".into(),
            radio_off: "\u{26aa}".into(),
            toggle_on: "\u{1f7e2}".into(),
            toggle_off: "\u{1f534}".into(),
        }
    }
}

impl Default for ActionStrings {
    fn default() -> Self {
        Self {
            done: "Done \u{2713}".into(),
            ok: "OK".into(),
            yes: "Yes".into(),
            no: "No".into(),
            cancel: "Cancelled.".into(),
            remove_last: "Remove last".into(),
            decrement: "\u{2212}".into(),
            increment: "+".into(),
            restart: "Start over".into(),
            already_running: "Already in /{}. Send /cancel to abort.".into(),
        }
    }
}

impl Default for DisplayStrings {
    fn default() -> Self {
        Self {
            none_value: "(not set)".into(),
            no_options: "(no options available)".into(),
            disabled_date: "\u{00b7}".into(),
            date_format: "[month repr:short] [day], [year]".into(),
            page_format: "{}/{}".into(),
            review_header: "Review your answers:".into(),
            no_data: "(no data)".into(),
            options_failed: "Could not load options. Send any message to retry.".into(),
            skipped: "(skipped)".into(),
        }
    }
}

impl Default for ErrorStrings {
    fn default() -> Self {
        Self {
            use_buttons: "Please use the buttons above.".into(),
            use_button: "Please use the button above.".into(),
            send_text: "Please send a text message.".into(),
            send_photo: "Please send a photo.".into(),
            send_document: "Please send a document.".into(),
            send_location: "Please share a location.".into(),
            send_video: "Please send a video.".into(),
            send_voice: "Please send a voice message.".into(),
            send_contact: "Please use the Share Contact button.".into(),
            send_number: "Please enter a number.".into(),
            use_calendar: "Please use the calendar buttons above.".into(),
            use_time_picker: "Please use the time picker buttons above.".into(),
            enter_pin: "Please enter all digits first.".into(),
            send_media: "Please send a photo, document, or video.".into(),
            select_days: "Please select at least one day.".into(),
            select_option: "Please select an option first.".into(),
            select_rating: "Please select a rating first.".into(),
            too_short: "Too short (min {} chars)".into(),
            too_long: "Too long (max {} chars)".into(),
            invalid_format: "Invalid format (expected {})".into(),
            out_of_range: "Out of range ({} to {})".into(),
            max_items: "Max {} items".into(),
            min_select: "Select at least {}".into(),
            range_error: "Must be between {} and {}.".into(),
            max_reached: "Maximum {} items reached. Press Done.".into(),
            min_required: "Please add at least {} items.".into(),
            invalid_input: "Invalid: {}. Try again:".into(),
        }
    }
}

/// Substitute each `{}` in `template` with the next argument.
///
/// Placeholders beyond the supplied arguments are left untouched.
///
/// ```
/// use talkflow::widget::fill;
///
/// assert_eq!(fill("Must be between {} and {}.", &[&1, &10]), "Must be between 1 and 10.");
/// ```
pub fn fill(template: &str, args: &[&dyn std::fmt::Display]) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut args = args.iter();
    let mut rest = template;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(&arg.to_string()),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}
