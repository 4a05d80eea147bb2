//! Flow and session introspection.
//!
//! [`FlowOutline`] is the static shape of a registered flow: its fields in
//! prompt order with their visibility dependencies, and its policies.
//! [`SessionInfo`] is a snapshot of one active session. Both are meant for
//! debugging, admin commands and monitoring dashboards.
//!
//! # Example
//!
//! ```ignore
//! let outline = service.describe("signup")?;
//! println!("{outline}");
//! println!("{}", outline.to_mermaid());
//!
//! if let Some(info) = service.inspect(&SessionKey::new(user, "signup")).await? {
//!     println!("{} at {:?}", info.status, info.current);
//! }
//! ```

use std::fmt;

use time::OffsetDateTime;

use crate::field::FlowDefinition;
use crate::flow::{LaunchMode, ShowMode};

/// Static description of a registered flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOutline {
    pub flow: String,
    /// Callback prefix stamped on the flow's buttons.
    pub hash: String,
    pub show_mode: ShowMode,
    pub launch_mode: LaunchMode,
    /// Enabled transforms.
    pub transforms: Vec<&'static str>,
    pub fields: Vec<FieldOutline>,
}

/// One field of a [`FlowOutline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutline {
    pub name: String,
    pub label: String,
    /// Widget kind; `None` for prefilled fields without a widget.
    pub widget: Option<&'static str>,
    pub optional: bool,
    pub prefilled: bool,
    /// Earlier fields this field's visibility or widget reads.
    pub depends_on: Vec<String>,
    /// Choices come from an options provider.
    pub dynamic_options: bool,
}

impl FlowOutline {
    pub(crate) fn from_definition(def: &FlowDefinition) -> Self {
        let fields = def
            .fields()
            .iter()
            .map(|field| FieldOutline {
                name: field.name().to_string(),
                label: field.display_label(),
                widget: field.widget_ref().map(|w| w.kind()),
                optional: field.is_optional(),
                prefilled: field.is_prefilled(),
                depends_on: field.dependencies(),
                dynamic_options: field.provider().is_some(),
            })
            .collect();

        Self {
            flow: def.name().to_string(),
            hash: def.hash().to_string(),
            show_mode: def.show_mode(),
            launch_mode: def.launch_mode(),
            transforms: def.transforms().names(),
            fields,
        }
    }

    /// Fields that are always prompted: not prefilled and without a
    /// visibility condition.
    pub fn unconditional(&self) -> impl Iterator<Item = &FieldOutline> {
        self.fields
            .iter()
            .filter(|f| !f.prefilled && f.depends_on.is_empty())
    }

    /// Generate a Mermaid flowchart of the prompt sequence.
    ///
    /// Fields are chained in declaration order. Dashed edges mark
    /// dependencies.
    ///
    /// # Example Output
    ///
    /// ```text
    /// flowchart TD
    ///     start([/signup]) --> name
    ///     name --> plan
    ///     plan --> promo_code
    ///     plan -.-> promo_code
    ///     promo_code --> finish([finish])
    /// ```
    pub fn to_mermaid(&self) -> String {
        let mut lines = vec!["flowchart TD".to_string()];
        let mut previous = format!("start([/{}])", self.flow);
        for field in &self.fields {
            lines.push(format!("    {previous} --> {}", field.name));
            for dep in &field.depends_on {
                lines.push(format!("    {dep} -.-> {}", field.name));
            }
            previous = field.name.clone();
        }
        lines.push(format!("    {previous} --> finish([finish])"));
        lines.join("\n")
    }
}

impl fmt::Display for FlowOutline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "/{} [{}]", self.flow, self.hash)?;
        if !self.transforms.is_empty() {
            writeln!(f, "  transforms: {}", self.transforms.join(", "))?;
        }
        for (i, field) in self.fields.iter().enumerate() {
            write!(
                f,
                "  {}. {} ({})",
                i + 1,
                field.name,
                field.widget.unwrap_or("prefilled")
            )?;
            if field.optional {
                f.write_str(" optional")?;
            }
            if field.dynamic_options {
                f.write_str(" dynamic")?;
            }
            if !field.depends_on.is_empty() {
                write!(f, " when {}", field.depends_on.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Snapshot of one active session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// `filling` or `reviewing`.
    pub status: String,
    /// Field awaiting input, if any.
    pub current: Option<String>,
    /// Committed answers as `(field, summary)` in commit order.
    pub answered: Vec<(String, String)>,
    /// Position of the current field among visible fields, and their count.
    pub progress: Option<(usize, usize)>,
    pub started_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

impl SessionInfo {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            current: None,
            answered: Vec::new(),
            progress: None,
            started_at: None,
            updated_at: None,
        }
    }

    pub fn with_current(mut self, field: impl Into<String>) -> Self {
        self.current = Some(field.into());
        self
    }

    pub fn with_answer(mut self, field: impl Into<String>, summary: impl Into<String>) -> Self {
        self.answered.push((field.into(), summary.into()));
        self
    }

    pub fn with_progress(mut self, position: usize, total: usize) -> Self {
        self.progress = Some((position, total));
        self
    }

    pub fn with_timestamps(mut self, started_at: OffsetDateTime, updated_at: OffsetDateTime) -> Self {
        self.started_at = Some(started_at);
        self.updated_at = Some(updated_at);
        self
    }

    pub fn is_reviewing(&self) -> bool {
        self.status == "reviewing"
    }
}
