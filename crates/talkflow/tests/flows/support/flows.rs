//! Fixture flows exercising the engine, transforms and stacking.

use std::collections::HashMap;
use std::convert::Infallible;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use talkflow::widget::{Confirm, Counter, DynamicInline, Inline, TextInput, options};
use talkflow::{
    BoxError, Field, FinishContext, FinishHandler, FinishOutcome, Flow, FlowRecord, LaunchMode,
    Options, OptionsProvider, ShowMode, Transform, UserId, Validator, ValueKind, Values, When,
};

/// Records every value a handler received.
pub type Recorder<T> = Arc<Mutex<Vec<T>>>;

pub fn recorded<T: Clone>(recorder: &Recorder<T>) -> Vec<T> {
    recorder.lock().map(|r| r.clone()).unwrap_or_default()
}

fn remember<T>(recorder: &Recorder<T>, value: T) {
    if let Ok(mut r) = recorder.lock() {
        r.push(value);
    }
}

// =============================================================================
// Signup: conditional field, counter, validators
// =============================================================================

#[derive(Debug, Clone, PartialEq, FlowRecord, Serialize, Deserialize)]
pub struct Signup {
    pub name: String,
    pub age: i64,
    pub plan: String,
    pub promo_code: Option<String>,
    pub newsletter: bool,
}

impl Flow for Signup {
    const NAME: &'static str = "signup";

    fn fields() -> Vec<Field> {
        vec![
            Field::new("name")
                .widget(TextInput::new("What's your name?"))
                .validate(Validator::min_len(2)),
            Field::new("age").widget(
                Counter::new("How old are you?")
                    .min(1)
                    .max(120)
                    .default_value(30),
            ),
            Field::new("plan").widget(
                Inline::new("Pick a plan:")
                    .option("free", "Free")
                    .option("pro", "Pro"),
            ),
            Field::new("promo_code")
                .widget(TextInput::new("Promo code?"))
                .visible_when(When::equals("plan", "pro"))
                .validate(Validator::max_len(8)),
            Field::new("newsletter").widget(Confirm::new("Subscribe to the newsletter?")),
        ]
    }

    fn transforms() -> Vec<Transform> {
        vec![Transform::cancel(), Transform::back(), Transform::Progress]
    }
}

#[derive(Default)]
pub struct SignupHandler {
    pub finished: Recorder<Signup>,
}

#[async_trait]
impl FinishHandler for SignupHandler {
    type Flow = Signup;
    type Error = Infallible;

    async fn finish(&self, record: Signup, _ctx: &FinishContext) -> Result<FinishOutcome, Infallible> {
        let reply = format!("Welcome, {}!", record.name);
        remember(&self.finished, record);
        Ok(FinishOutcome::message(reply))
    }
}

// =============================================================================
// Feedback: optional field, summary, edit show mode
// =============================================================================

#[derive(Debug, Clone, PartialEq, FlowRecord, Serialize, Deserialize)]
pub struct Feedback {
    pub topic: String,
    pub comment: Option<String>,
}

impl Flow for Feedback {
    const NAME: &'static str = "feedback";

    fn fields() -> Vec<Field> {
        vec![
            Field::new("topic").widget(
                Inline::new("What is it about?").options(options([("bug", "Bug report"), ("idea", "Idea")])),
            ),
            Field::new("comment")
                .widget(TextInput::new("Anything else to add?"))
                .optional(),
        ]
    }

    fn transforms() -> Vec<Transform> {
        vec![
            Transform::cancel(),
            Transform::back(),
            Transform::Summary,
            Transform::ShowMode(ShowMode::Edit),
        ]
    }
}

#[derive(Default)]
pub struct FeedbackHandler {
    pub finished: Recorder<Feedback>,
}

#[async_trait]
impl FinishHandler for FeedbackHandler {
    type Flow = Feedback;
    type Error = Infallible;

    async fn finish(&self, record: Feedback, _ctx: &FinishContext) -> Result<FinishOutcome, Infallible> {
        remember(&self.finished, record);
        Ok(FinishOutcome::message("Thanks for the feedback!"))
    }
}

// =============================================================================
// Notes: one flow per launch mode
// =============================================================================

macro_rules! note_flow {
    ($ty:ident, $name:literal, $mode:expr) => {
        #[derive(Debug, Clone, PartialEq, FlowRecord, Serialize, Deserialize)]
        pub struct $ty {
            pub title: String,
            pub body: String,
        }

        impl Flow for $ty {
            const NAME: &'static str = $name;

            fn fields() -> Vec<Field> {
                vec![
                    Field::new("title").widget(TextInput::new("Title?")),
                    Field::new("body").widget(TextInput::new("Body?")),
                ]
            }

            fn transforms() -> Vec<Transform> {
                vec![Transform::cancel(), Transform::LaunchMode($mode)]
            }
        }
    };
}

note_flow!(Note, "note", LaunchMode::Standard);
note_flow!(ResetNote, "reset_note", LaunchMode::Reset);
note_flow!(ExclusiveNote, "exclusive_note", LaunchMode::Exclusive);
note_flow!(SingleTopNote, "single_top_note", LaunchMode::SingleTop);

/// Replies `Saved /{flow}.` for any flow.
pub struct Saved<F>(PhantomData<fn() -> F>);

impl<F> Saved<F> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<F: Flow> FinishHandler for Saved<F> {
    type Flow = F;
    type Error = Infallible;

    async fn finish(&self, _record: F, _ctx: &FinishContext) -> Result<FinishOutcome, Infallible> {
        Ok(FinishOutcome::message(format!("Saved /{}.", F::NAME)))
    }
}

// =============================================================================
// Assign: dynamic options
// =============================================================================

static PROVIDER_CALLS: LazyLock<Mutex<HashMap<String, usize>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Team directory keyed off the user id:
/// `nobody-*` has no teams, `flaky-*` fails on the first load.
pub struct TeamDirectory;

#[async_trait]
impl OptionsProvider for TeamDirectory {
    async fn load(&self, user: &UserId, _values: &Values) -> Result<Options, BoxError> {
        let calls = {
            let mut calls = PROVIDER_CALLS.lock().map_err(|e| e.to_string())?;
            let n = calls.entry(user.to_string()).or_default();
            *n += 1;
            *n
        };
        if user.as_str().starts_with("nobody") {
            return Ok(Options::new());
        }
        if user.as_str().starts_with("flaky") && calls == 1 {
            return Err("directory offline".into());
        }
        Ok(options([("core", "Core"), ("infra", "Infra")]))
    }
}

#[derive(Debug, Clone, PartialEq, FlowRecord, Serialize, Deserialize)]
pub struct Assign {
    pub team: Option<String>,
    pub note: String,
}

impl Flow for Assign {
    const NAME: &'static str = "assign";

    fn fields() -> Vec<Field> {
        vec![
            Field::new("team")
                .widget(DynamicInline::new("Which team?"))
                .options(TeamDirectory)
                .optional(),
            Field::new("note").widget(TextInput::new("Any note?")),
        ]
    }
}

#[derive(Default)]
pub struct AssignHandler {
    pub finished: Recorder<Assign>,
}

#[async_trait]
impl FinishHandler for AssignHandler {
    type Flow = Assign;
    type Error = Infallible;

    async fn finish(&self, record: Assign, _ctx: &FinishContext) -> Result<FinishOutcome, Infallible> {
        remember(&self.finished, record);
        Ok(FinishOutcome::message("Assigned."))
    }
}

// =============================================================================
// Project / Invite: stacking
// =============================================================================

#[derive(Debug, Clone, PartialEq, FlowRecord, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
}

impl Flow for Project {
    const NAME: &'static str = "project";

    fn fields() -> Vec<Field> {
        vec![Field::new("name").widget(TextInput::new("What's the project called?"))]
    }

    fn transforms() -> Vec<Transform> {
        vec![Transform::cancel(), Transform::Stacking]
    }
}

#[derive(Default)]
pub struct ProjectHandler {
    pub resumes: Arc<AtomicUsize>,
    pub resumed_from: Recorder<String>,
}

#[async_trait]
impl FinishHandler for ProjectHandler {
    type Flow = Project;
    type Error = Infallible;

    async fn finish(&self, record: Project, _ctx: &FinishContext) -> Result<FinishOutcome, Infallible> {
        Ok(FinishOutcome::sub_flow(
            format!("Project {} created. Now invite someone.", record.name),
            "invite",
        )
        .with_context("project", record.name))
    }

    async fn resume(&self, record: Project, ctx: &FinishContext) -> Result<FinishOutcome, Infallible> {
        self.resumes.fetch_add(1, Ordering::SeqCst);
        if let Some(child) = &ctx.resumed_from {
            remember(&self.resumed_from, child.clone());
        }
        Ok(FinishOutcome::message(format!(
            "Back in {}: setup complete.",
            record.name
        )))
    }
}

#[derive(Debug, Clone, PartialEq, FlowRecord, Serialize, Deserialize)]
pub struct Invite {
    pub project: Option<String>,
    pub email: String,
}

impl Flow for Invite {
    const NAME: &'static str = "invite";

    fn fields() -> Vec<Field> {
        vec![
            Field::new("project").prefilled(),
            Field::new("email").widget(TextInput::new("Who should we invite?")),
        ]
    }

    fn transforms() -> Vec<Transform> {
        vec![Transform::cancel()]
    }
}

pub struct InviteHandler;

#[async_trait]
impl FinishHandler for InviteHandler {
    type Flow = Invite;
    type Error = Infallible;

    async fn finish(&self, record: Invite, _ctx: &FinishContext) -> Result<FinishOutcome, Infallible> {
        Ok(FinishOutcome::message(format!(
            "Invited {} to {}.",
            record.email,
            record.project.as_deref().unwrap_or("nothing")
        )))
    }
}

/// An `invite` whose `finish` always fails.
pub struct FailingInviteHandler;

#[async_trait]
impl FinishHandler for FailingInviteHandler {
    type Flow = Invite;
    type Error = String;

    async fn finish(&self, _record: Invite, _ctx: &FinishContext) -> Result<FinishOutcome, String> {
        Err("mail server down".to_string())
    }
}

// =============================================================================
// Report: sub-flow without stacking / Broken: finish error
// =============================================================================

#[derive(Debug, Clone, PartialEq, FlowRecord, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
}

impl Flow for Report {
    const NAME: &'static str = "report";

    fn fields() -> Vec<Field> {
        vec![Field::new("title").widget(TextInput::new("Report title?"))]
    }
}

pub struct ReportHandler;

#[async_trait]
impl FinishHandler for ReportHandler {
    type Flow = Report;
    type Error = Infallible;

    async fn finish(&self, record: Report, _ctx: &FinishContext) -> Result<FinishOutcome, Infallible> {
        Ok(FinishOutcome::sub_flow("Report filed.", "invite").with_context("project", record.title))
    }
}

#[derive(Debug, Clone, PartialEq, FlowRecord, Serialize, Deserialize)]
pub struct Broken {
    pub reason: String,
}

impl Flow for Broken {
    const NAME: &'static str = "broken";

    fn fields() -> Vec<Field> {
        vec![Field::new("reason").widget(TextInput::new("Why?"))]
    }
}

pub struct BrokenHandler;

#[async_trait]
impl FinishHandler for BrokenHandler {
    type Flow = Broken;
    type Error = String;

    async fn finish(&self, _record: Broken, _ctx: &FinishContext) -> Result<FinishOutcome, String> {
        Err("database unavailable".to_string())
    }
}

/// `count` is collected as text but the record wants an integer.
#[derive(Debug, Clone, PartialEq, FlowRecord, Serialize, Deserialize)]
pub struct Tally {
    pub count: i64,
}

impl Flow for Tally {
    const NAME: &'static str = "tally";

    fn fields() -> Vec<Field> {
        vec![
            Field::new("count")
                .widget(TextInput::new("How many?"))
                .kind(ValueKind::Text),
        ]
    }
}

// =============================================================================
// Definition errors
// =============================================================================

/// `early` depends on `late`, which is declared after it.
#[derive(Debug, Clone, FlowRecord, Serialize, Deserialize)]
pub struct Backwards {
    pub early: Option<String>,
    pub late: String,
}

impl Flow for Backwards {
    const NAME: &'static str = "backwards";

    fn fields() -> Vec<Field> {
        vec![
            Field::new("early")
                .widget(TextInput::new("Early?"))
                .visible_when(When::present("late")),
            Field::new("late").widget(TextInput::new("Late?")),
        ]
    }
}
