//! Cross-cutting behaviors layered over the engine.
//!
//! Transforms are not nested wrappers. Each one enables a fixed hook on the
//! engine's event path:
//!
//! | Transform | Hook |
//! |-----------|------|
//! | `Cancel` | pre-dispatch intercept of its trigger text |
//! | `Back` | pre-dispatch intercept of its trigger text |
//! | `Progress` | post-render prefix on field prompts |
//! | `Summary` | synthetic review step before completion |
//! | `ShowMode` / `LaunchMode` | policy override at build time |
//! | `Stacking` | completion path for sub-flow outcomes |
//!
//! Because intercepts only fire on their own trigger, application order
//! cannot change behavior as long as triggers are disjoint. That is
//! checked by [`TransformSet::compose`].

use tracing::debug;

use crate::error::{Error, Result};
use crate::flow::{LaunchMode, ShowMode};

/// One cross-cutting behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Abort the session when the user sends `trigger`.
    Cancel { trigger: String },
    /// Return to the previous answered field when the user sends `trigger`.
    Back { trigger: String },
    /// Prefix every field prompt with a progress bar.
    Progress,
    /// Ask for confirmation of all answers before completing.
    Summary,
    ShowMode(ShowMode),
    LaunchMode(LaunchMode),
    /// Allow `FinishOutcome::SubFlow` to suspend this flow.
    Stacking,
}

impl Transform {
    /// Cancel on `/cancel`.
    pub fn cancel() -> Self {
        Transform::Cancel {
            trigger: "/cancel".into(),
        }
    }

    /// Back on `/back`.
    pub fn back() -> Self {
        Transform::Back {
            trigger: "/back".into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::Cancel { .. } => "cancel",
            Transform::Back { .. } => "back",
            Transform::Progress => "progress",
            Transform::Summary => "summary",
            Transform::ShowMode(_) => "show_mode",
            Transform::LaunchMode(_) => "launch_mode",
            Transform::Stacking => "stacking",
        }
    }

    /// The text signal this transform intercepts, if any.
    pub fn trigger(&self) -> Option<&str> {
        match self {
            Transform::Cancel { trigger } | Transform::Back { trigger } => Some(trigger),
            _ => None,
        }
    }
}

/// The composed, order-independent set of transforms for one flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformSet {
    cancel: Option<String>,
    back: Option<String>,
    progress: bool,
    summary: bool,
    show_mode: Option<ShowMode>,
    launch_mode: Option<LaunchMode>,
    stacking: bool,
}

impl TransformSet {
    /// Compose transforms, rejecting duplicates and shared triggers.
    pub fn compose(flow: &'static str, transforms: impl IntoIterator<Item = Transform>) -> Result<Self> {
        let mut set = TransformSet::default();
        let mut applied: Vec<&'static str> = Vec::new();
        let mut triggers: Vec<(String, &'static str)> = Vec::new();

        for transform in transforms {
            let name = transform.name();
            if applied.contains(&name) {
                return Err(Error::DuplicateTransform {
                    flow,
                    transform: name,
                });
            }
            applied.push(name);

            if let Some(trigger) = transform.trigger() {
                if let Some((_, first)) = triggers.iter().find(|(t, _)| t == trigger) {
                    return Err(Error::ConflictingTrigger {
                        flow,
                        trigger: trigger.to_string(),
                        first: *first,
                        second: name,
                    });
                }
                triggers.push((trigger.to_string(), name));
            }

            match transform {
                Transform::Cancel { trigger } => set.cancel = Some(trigger),
                Transform::Back { trigger } => set.back = Some(trigger),
                Transform::Progress => set.progress = true,
                Transform::Summary => set.summary = true,
                Transform::ShowMode(mode) => set.show_mode = Some(mode),
                Transform::LaunchMode(mode) => set.launch_mode = Some(mode),
                Transform::Stacking => set.stacking = true,
            }
        }

        debug!(flow, transforms = ?applied, "transforms composed");
        Ok(set)
    }

    pub fn cancel_trigger(&self) -> Option<&str> {
        self.cancel.as_deref()
    }

    pub fn back_trigger(&self) -> Option<&str> {
        self.back.as_deref()
    }

    pub fn progress(&self) -> bool {
        self.progress
    }

    pub fn summary(&self) -> bool {
        self.summary
    }

    pub fn show_mode(&self) -> Option<ShowMode> {
        self.show_mode
    }

    pub fn launch_mode(&self) -> Option<LaunchMode> {
        self.launch_mode
    }

    pub fn stacking(&self) -> bool {
        self.stacking
    }

    /// Names of the enabled transforms in a fixed order.
    pub fn names(&self) -> Vec<&'static str> {
        [
            ("cancel", self.cancel.is_some()),
            ("back", self.back.is_some()),
            ("progress", self.progress),
            ("summary", self.summary),
            ("show_mode", self.show_mode.is_some()),
            ("launch_mode", self.launch_mode.is_some()),
            ("stacking", self.stacking),
        ]
        .into_iter()
        .filter_map(|(name, on)| on.then_some(name))
        .collect()
    }

    /// Every intercepted trigger with the transform that owns it.
    pub fn triggers(&self) -> Vec<(&str, &'static str)> {
        let mut out = Vec::new();
        if let Some(t) = &self.cancel {
            out.push((t.as_str(), "cancel"));
        }
        if let Some(t) = &self.back {
            out.push((t.as_str(), "back"));
        }
        out
    }
}
