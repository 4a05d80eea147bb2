use std::io;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use talkflow::widget::CallbackData;
use talkflow::{
    Flow, FlowService, FlowServiceConfig, MemorySessionStore, MessageContent, SessionInfo,
    SessionKey, Turn, UserId, Values,
};

use super::flows::{
    Assign, AssignHandler, BrokenHandler, ExclusiveNote, Feedback, FeedbackHandler, InviteHandler,
    Note, ProjectHandler, Recorder, ReportHandler, ResetNote, Saved, Signup, SignupHandler,
    SingleTopNote,
};

/// Initialize tracing for tests. Safe to call multiple times.
///
/// The `try_init()` call is idempotent: subsequent calls are no-ops if
/// already initialized.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("talkflow=debug")
        .with_test_writer()
        .try_init();
}

/// Formatted log output captured for the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's events into the buffer until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter("talkflow=debug")
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if let Ok(mut buf) = self.0.lock() {
            buf.extend_from_slice(data);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A service with every fixture flow registered, plus handles on what the
/// handlers observed.
pub struct Fixture {
    pub service: FlowService,
    pub signups: Recorder<Signup>,
    pub feedback: Recorder<Feedback>,
    pub assignments: Recorder<Assign>,
    pub resumes: Arc<AtomicUsize>,
    pub resumed_from: Recorder<String>,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        Self::with_config(FlowServiceConfig::default())
    }

    pub fn with_config(config: FlowServiceConfig) -> Result<Self> {
        init_test_tracing();

        let signup = SignupHandler::default();
        let feedback = FeedbackHandler::default();
        let assign = AssignHandler::default();
        let project = ProjectHandler::default();

        let signups = Arc::clone(&signup.finished);
        let feedback_seen = Arc::clone(&feedback.finished);
        let assignments = Arc::clone(&assign.finished);
        let resumes = Arc::clone(&project.resumes);
        let resumed_from = Arc::clone(&project.resumed_from);

        let service = FlowService::builder(MemorySessionStore::new(), config)
            .register(signup)
            .register(feedback)
            .register(assign)
            .register(project)
            .register(InviteHandler)
            .register(ReportHandler)
            .register(BrokenHandler)
            .register(Saved::<Note>::new())
            .register(Saved::<ResetNote>::new())
            .register(Saved::<ExclusiveNote>::new())
            .register(Saved::<SingleTopNote>::new())
            .build()?;

        Ok(Self {
            service,
            signups,
            feedback: feedback_seen,
            assignments,
            resumes,
            resumed_from,
        })
    }

    pub fn chat(&self, user: &str) -> Chat {
        Chat::new(&self.service, user)
    }
}

/// Drives one user's side of a conversation.
///
/// Keeps the last turn so buttons can be pressed by their local value
/// the way a user taps what is on screen.
pub struct Chat {
    service: FlowService,
    pub user: UserId,
    last: Option<Turn>,
}

impl Chat {
    pub fn new(service: &FlowService, user: &str) -> Self {
        Self {
            service: service.clone(),
            user: UserId::new(user),
            last: None,
        }
    }

    pub async fn start<F: Flow>(&mut self) -> Result<Turn> {
        let turn = self.service.start::<F>(self.user.clone()).await?;
        Ok(self.keep(turn))
    }

    /// Launch by name with `/{flow}` as the triggering text.
    pub async fn launch(&mut self, flow: &str) -> Result<Turn> {
        self.launch_with(flow, Values::new()).await
    }

    pub async fn launch_with(&mut self, flow: &str, context: Values) -> Result<Turn> {
        let turn = self
            .service
            .launch(self.user.clone(), flow, &format!("/{flow}"), context)
            .await?;
        Ok(self.keep(turn))
    }

    pub async fn say(&mut self, text: &str) -> Result<Turn> {
        let turn = self
            .service
            .message(self.user.clone(), &MessageContent::text(text))
            .await?;
        Ok(self.keep(turn))
    }

    pub async fn send(&mut self, content: MessageContent) -> Result<Turn> {
        let turn = self.service.message(self.user.clone(), &content).await?;
        Ok(self.keep(turn))
    }

    /// Press the button carrying `value` in the last turn.
    pub async fn press(&mut self, value: &str) -> Result<Turn> {
        let raw = self.callback_for(value)?;
        self.press_raw(&raw).await
    }

    pub async fn press_raw(&mut self, raw: &str) -> Result<Turn> {
        let turn = self.service.callback(self.user.clone(), raw).await?;
        Ok(self.keep(turn))
    }

    /// Raw callback data of the button carrying `value` in the last turn.
    pub fn callback_for(&self, value: &str) -> Result<String> {
        let turn = self.last.as_ref().ok_or_else(|| anyhow!("no turn yet"))?;
        turn.replies
            .iter()
            .rev()
            .filter_map(|reply| reply.keyboard.as_ref())
            .flat_map(|kb| kb.buttons())
            .filter_map(|button| button.callback_data())
            .find(|raw| CallbackData::decode(raw).is_some_and(|data| data.value == value))
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("no button `{value}` in the last turn: {:?}", turn.texts()))
    }

    pub async fn inspect<F: Flow>(&self) -> Result<Option<SessionInfo>> {
        Ok(self
            .service
            .inspect(&SessionKey::new(self.user.clone(), F::NAME))
            .await?)
    }

    /// Text of the last reply of the last turn.
    pub fn last_text(&self) -> &str {
        self.last
            .as_ref()
            .and_then(|turn| turn.last())
            .map(|reply| reply.text.as_str())
            .unwrap_or_default()
    }

    fn keep(&mut self, turn: Turn) -> Turn {
        self.last = Some(turn.clone());
        turn
    }
}

/// Build a context map from `(key, value)` pairs.
pub fn context<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> Values {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
