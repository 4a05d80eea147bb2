//! Value constraints checked before an answer is committed.
//!
//! Validators run only on values a widget is about to commit with
//! `Advance`, never on transient `Stay` state. Text checks apply to string
//! answers and to every string element of list answers.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::widget::{Theme, fill};

type CustomCheck = dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync;

/// A single declared constraint.
#[derive(Clone)]
pub enum Validator {
    /// Minimum length in characters.
    MinLen(usize),
    /// Maximum length in characters.
    MaxLen(usize),
    /// The text must match the pattern starting at its first character.
    Pattern { source: String, regex: Regex },
    /// Inclusive numeric bounds.
    Range { min: f64, max: f64 },
    /// Application check returning the rejection message.
    Custom(Arc<CustomCheck>),
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::MinLen(n) => f.debug_tuple("MinLen").field(n).finish(),
            Validator::MaxLen(n) => f.debug_tuple("MaxLen").field(n).finish(),
            Validator::Pattern { source, .. } => f.debug_tuple("Pattern").field(source).finish(),
            Validator::Range { min, max } => f
                .debug_struct("Range")
                .field("min", min)
                .field("max", max)
                .finish(),
            Validator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Validator {
    pub fn min_len(n: usize) -> Self {
        Validator::MinLen(n)
    }

    pub fn max_len(n: usize) -> Self {
        Validator::MaxLen(n)
    }

    /// Compile a pattern validator.
    ///
    /// Fails with [`Error::InvalidPattern`] so a bad pattern surfaces while
    /// the flow is being defined.
    pub fn pattern(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let regex = Regex::new(&source).map_err(|e| Error::InvalidPattern {
            pattern: source.clone(),
            source: e,
        })?;
        Ok(Validator::Pattern { source, regex })
    }

    pub fn range(min: impl Into<f64>, max: impl Into<f64>) -> Self {
        Validator::Range {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        Validator::Custom(Arc::new(check))
    }

    /// Check one value, returning the themed rejection message on failure.
    pub fn check(&self, value: &Value, theme: &Theme) -> std::result::Result<(), String> {
        match (self, value) {
            (Validator::Custom(check), _) => (**check)(value),
            (_, Value::Null) => Ok(()),
            (_, Value::String(text)) => self.check_text(text, theme),
            (_, Value::Array(items)) => items.iter().try_for_each(|item| match item {
                Value::String(text) => self.check_text(text, theme),
                Value::Number(_) => self.check(item, theme),
                _ => Ok(()),
            }),
            (Validator::Range { min, max }, Value::Number(n)) => {
                let v = n.as_f64().unwrap_or(f64::NAN);
                if v >= *min && v <= *max {
                    Ok(())
                } else {
                    Err(fill(
                        &theme.errors.out_of_range,
                        &[&display_number(*min), &display_number(*max)],
                    ))
                }
            }
            _ => Ok(()),
        }
    }

    /// Text rules. Range parses the text as a number.
    pub(crate) fn check_text(&self, text: &str, theme: &Theme) -> std::result::Result<(), String> {
        match self {
            Validator::MinLen(n) if text.chars().count() < *n => {
                Err(fill(&theme.errors.too_short, &[n]))
            }
            Validator::MaxLen(n) if text.chars().count() > *n => {
                Err(fill(&theme.errors.too_long, &[n]))
            }
            Validator::Pattern { source, regex } => {
                if regex.find(text).is_some_and(|m| m.start() == 0) {
                    Ok(())
                } else {
                    Err(fill(&theme.errors.invalid_format, &[source]))
                }
            }
            Validator::Range { .. } => match text.trim().parse::<f64>() {
                Ok(v) => self.check(&Value::from(v), theme),
                Err(_) => Err(theme.errors.send_number.clone()),
            },
            Validator::Custom(check) => (**check)(&Value::String(text.to_owned())),
            _ => Ok(()),
        }
    }
}

/// Run validators in declaration order, stopping at the first failure.
pub fn validate(
    validators: &[Validator],
    value: &Value,
    theme: &Theme,
) -> std::result::Result<(), String> {
    validators.iter().try_for_each(|v| v.check(value, theme))
}

/// Run the text rules of each validator against a single piece of text.
pub fn validate_text(
    validators: &[Validator],
    text: &str,
    theme: &Theme,
) -> std::result::Result<(), String> {
    validators.iter().try_for_each(|v| v.check_text(text, theme))
}

/// Render a bound without a trailing `.0` for whole numbers.
pub(crate) fn display_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}
