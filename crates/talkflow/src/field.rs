//! Field descriptors and the checked flow definition built from them.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use nonempty::NonEmpty;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Error, Result};
use crate::flow::{Flow, LaunchMode, ShowMode, UserId, Values};
use crate::record::ValueKind;
use crate::transform::TransformSet;
use crate::validation::Validator;
use crate::widget::{Options, Widget};

/// Boxed error returned by options providers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Predicate = dyn Fn(&Values) -> bool + Send + Sync;

/// Visibility predicate over earlier answers.
///
/// Dependencies are declared up front. The predicate only ever sees the
/// values of those fields, and each one must be declared before the field
/// it guards.
#[derive(Clone)]
pub struct When {
    deps: Vec<String>,
    predicate: Arc<Predicate>,
}

impl When {
    /// Visible when `field` holds exactly `value`.
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        let key = field.clone();
        Self {
            deps: vec![field],
            predicate: Arc::new(move |values| values.get(&key) == Some(&value)),
        }
    }

    /// Visible when `field` was answered with something other than null.
    pub fn present(field: impl Into<String>) -> Self {
        let field = field.into();
        let key = field.clone();
        Self {
            deps: vec![field],
            predicate: Arc::new(move |values| values.get(&key).is_some_and(|v| !v.is_null())),
        }
    }

    /// Arbitrary predicate over the listed fields.
    pub fn custom<I, S, F>(deps: I, predicate: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Values) -> bool + Send + Sync + 'static,
    {
        Self {
            deps: deps.into_iter().map(Into::into).collect(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    /// Evaluate against the declared dependencies only.
    pub fn eval(&self, values: &Values) -> bool {
        let scoped: Values = self
            .deps
            .iter()
            .filter_map(|dep| values.get(dep).map(|v| (dep.clone(), v.clone())))
            .collect();
        (self.predicate)(&scoped)
    }
}

impl fmt::Debug for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("When").field("deps", &self.deps).finish()
    }
}

/// Loads the choices for a field whose widget uses dynamic options.
///
/// Called once per visit to the field, with the values collected so far.
/// Static [`Options`] implement it directly.
#[async_trait]
pub trait OptionsProvider: Send + Sync + 'static {
    async fn load(&self, user: &UserId, values: &Values) -> std::result::Result<Options, BoxError>;
}

#[async_trait]
impl OptionsProvider for Options {
    async fn load(&self, _user: &UserId, _values: &Values) -> std::result::Result<Options, BoxError> {
        Ok(self.clone())
    }
}

/// One field of a flow.
///
/// # Example
///
/// ```ignore
/// Field::new("promo_code")
///     .widget(TextInput::new("Promo code?"))
///     .validate(Validator::max_len(12))
///     .visible_when(When::equals("plan", "pro"))
///     .optional()
/// ```
pub struct Field {
    name: String,
    label: Option<String>,
    widget: Option<Box<dyn Widget>>,
    validators: Vec<Validator>,
    when: Option<When>,
    optional: bool,
    prefilled: bool,
    kind: Option<ValueKind>,
    options: Option<Arc<dyn OptionsProvider>>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            widget: None,
            validators: Vec::new(),
            when: None,
            optional: false,
            prefilled: false,
            kind: None,
            options: None,
        }
    }

    pub fn widget(mut self, widget: impl Widget) -> Self {
        self.widget = Some(Box::new(widget));
        self
    }

    /// Display label. Defaults to the title-cased name.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Allow skipping with the skip keyword, which stores absence.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value comes from the launch context and is never prompted.
    pub fn prefilled(mut self) -> Self {
        self.prefilled = true;
        self
    }

    pub fn visible_when(mut self, when: When) -> Self {
        self.when = Some(when);
        self
    }

    pub fn validate(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Override the value kind inferred from the record.
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn options(mut self, provider: impl OptionsProvider) -> Self {
        self.options = Some(Arc::new(provider));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| title_case(&self.name))
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn is_prefilled(&self) -> bool {
        self.prefilled
    }

    pub fn value_kind(&self) -> ValueKind {
        self.kind.unwrap_or_default()
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn condition(&self) -> Option<&When> {
        self.when.as_ref()
    }

    pub(crate) fn widget_ref(&self) -> Option<&dyn Widget> {
        self.widget.as_deref()
    }

    pub(crate) fn provider(&self) -> Option<&Arc<dyn OptionsProvider>> {
        self.options.as_ref()
    }

    pub fn is_visible(&self, values: &Values) -> bool {
        self.when.as_ref().is_none_or(|w| w.eval(values))
    }

    /// Fields this one reads: predicate dependencies plus widget dependencies.
    pub fn dependencies(&self) -> Vec<String> {
        let mut deps: Vec<String> = self
            .when
            .as_ref()
            .map(|w| w.deps.clone())
            .unwrap_or_default();
        if let Some(widget) = &self.widget {
            for dep in widget.depends_on() {
                if !deps.iter().any(|d| d == dep) {
                    deps.push(dep.to_string());
                }
            }
        }
        deps
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("widget", &self.widget.as_ref().map(|w| w.kind()))
            .field("optional", &self.optional)
            .field("prefilled", &self.prefilled)
            .field("when", &self.when)
            .finish_non_exhaustive()
    }
}

fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// First eight hex characters of the SHA-256 of a flow name.
///
/// ```
/// assert_eq!(talkflow::flow_hash("signup").len(), 8);
/// ```
pub fn flow_hash(name: &str) -> String {
    Sha256::digest(name.as_bytes())
        .iter()
        .take(4)
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// A flow's fields and policies, checked once at registration.
#[derive(Debug)]
pub struct FlowDefinition {
    name: &'static str,
    hash: String,
    fields: NonEmpty<Field>,
    transforms: TransformSet,
    show_mode: ShowMode,
    launch_mode: LaunchMode,
}

impl FlowDefinition {
    /// Build and check the definition of `F`.
    ///
    /// Rejects duplicate names, dependencies on fields not declared
    /// earlier, prompted fields without a widget, descriptors that do not
    /// match the record, absent-able fields the record cannot hold as
    /// `None`, and conflicting transforms.
    pub fn build<F: Flow>() -> Result<Self> {
        let flow = F::NAME;
        let fields = NonEmpty::from_vec(F::fields()).ok_or(Error::EmptyFlow(flow))?;

        let mut declared: HashSet<String> = HashSet::new();
        for field in fields.iter() {
            if declared.contains(&field.name) {
                return Err(Error::DuplicateField {
                    flow,
                    field: field.name.clone(),
                });
            }
            for dep in field.dependencies() {
                if !declared.contains(&dep) {
                    return Err(Error::ForwardReference {
                        flow,
                        field: field.name.clone(),
                        depends_on: dep,
                    });
                }
            }
            if field.widget.is_none() && !field.prefilled {
                return Err(Error::MissingWidget {
                    flow,
                    field: field.name.clone(),
                });
            }
            let member = F::record_field(&field.name).ok_or_else(|| Error::UnknownRecordField {
                flow,
                field: field.name.clone(),
            })?;
            let may_be_absent = field.when.is_some() || field.optional || field.prefilled;
            if may_be_absent && !member.optional {
                return Err(Error::NotOptional {
                    flow,
                    field: field.name.clone(),
                });
            }
            declared.insert(field.name.clone());
        }

        if let Some(member) = F::record_fields()
            .iter()
            .find(|m| !declared.contains(m.name))
        {
            return Err(Error::UndeclaredRecordField {
                flow,
                field: member.name.to_string(),
            });
        }

        let fields = fields.map(|mut field| {
            if field.kind.is_none() {
                field.kind = F::record_field(&field.name).map(|m| m.kind);
            }
            field
        });

        let transforms = TransformSet::compose(flow, F::transforms())?;
        let show_mode = transforms.show_mode().unwrap_or_else(F::show_mode);
        let launch_mode = transforms.launch_mode().unwrap_or_else(F::launch_mode);

        debug!(flow, fields = fields.len(), "flow definition built");

        Ok(Self {
            name: flow,
            hash: flow_hash(flow),
            fields,
            transforms,
            show_mode,
            launch_mode,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Callback prefix, see [`flow_hash`].
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn fields(&self) -> &NonEmpty<Field> {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn transforms(&self) -> &TransformSet {
        &self.transforms
    }

    pub fn show_mode(&self) -> ShowMode {
        self.show_mode
    }

    pub fn launch_mode(&self) -> LaunchMode {
        self.launch_mode
    }

    /// First visible prompted field at or after `start`.
    pub fn next_visible(&self, start: usize, values: &Values) -> Option<usize> {
        self.fields
            .iter()
            .enumerate()
            .skip(start)
            .find(|(_, f)| !f.prefilled && f.is_visible(values))
            .map(|(idx, _)| idx)
    }

    /// Indices of every prompted field visible against `values`.
    pub fn visible_prompted(&self, values: &Values) -> Vec<usize> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.prefilled && f.is_visible(values))
            .map(|(idx, _)| idx)
            .collect()
    }
}
