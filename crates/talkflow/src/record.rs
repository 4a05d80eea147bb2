//! Record shape metadata emitted by `#[derive(FlowRecord)]`.

use serde::{Deserialize, Serialize};

/// Broad value category of a record member.
///
/// Drives text coercion ([`TextInput`](crate::widget::TextInput) parses an
/// integer member's answer as a number) and the definition checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Integer,
    Float,
    Bool,
    List,
    #[default]
    Any,
}

impl ValueKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float)
    }
}

/// One member of a flow record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordField {
    pub name: &'static str,
    /// The member is `Option<_>` and tolerates absence.
    pub optional: bool,
    pub kind: ValueKind,
}

/// Static description of the record a flow collects.
///
/// Derive it rather than implementing by hand:
///
/// ```ignore
/// #[derive(FlowRecord, Serialize, Deserialize)]
/// struct Signup {
///     name: String,
///     age: i64,
///     promo_code: Option<String>,
/// }
/// ```
pub trait FlowRecord {
    /// Members in declaration order.
    fn record_fields() -> &'static [RecordField];

    /// Look up a member by name.
    fn record_field(name: &str) -> Option<&'static RecordField> {
        Self::record_fields().iter().find(|f| f.name == name)
    }
}
