//! Scripted fakes for the external services.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::domain::TopicTag;
use crate::engine::{ContentModerator, TextGenerator, TopicClassifier};
use crate::error::ServiceError;

/// What a fake answers once its delay has elapsed.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
    /// Never resolves unless cancelled.
    Never,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

/// Records every call a fake receives, including the policy-derived
/// arguments that came with it.
#[derive(Clone, Default)]
pub struct Recorder {
    inputs: Arc<Mutex<Vec<String>>>,
    tokens: Arc<Mutex<Vec<CancellationToken>>>,
    age_hints: Arc<Mutex<Vec<u8>>>,
    disallowed: Arc<Mutex<Vec<BTreeSet<TopicTag>>>>,
    rubrics: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn record(&self, input: &str, cancel: &CancellationToken) {
        self.inputs.lock().unwrap().push(input.to_string());
        self.tokens.lock().unwrap().push(cancel.clone());
    }

    pub fn calls(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }

    /// Age hints seen by a generator, one per call.
    pub fn age_hints(&self) -> Vec<u8> {
        self.age_hints.lock().unwrap().clone()
    }

    /// Disallowed sets seen by a classifier, one per call.
    pub fn disallowed_sets(&self) -> Vec<BTreeSet<TopicTag>> {
        self.disallowed.lock().unwrap().clone()
    }

    /// Rubrics seen by a moderator, one per call.
    pub fn rubrics(&self) -> Vec<String> {
        self.rubrics.lock().unwrap().clone()
    }

    /// Whether the token handed to the most recent call has been cancelled.
    pub fn was_cancelled(&self) -> bool {
        self.tokens
            .lock()
            .unwrap()
            .last()
            .map(|token| token.is_cancelled())
            .unwrap_or(false)
    }
}

#[derive(Clone)]
struct Script {
    delay: Duration,
    reply: Reply,
}

impl Script {
    async fn play(&self, cancel: &CancellationToken) -> Result<String, ServiceError> {
        let reply = async {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.reply {
                Reply::Text(text) => Ok(text.clone()),
                Reply::Fail => Err(ServiceError::Api {
                    status: 503,
                    body: "upstream unavailable".to_string(),
                }),
                Reply::Never => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(ServiceError::Cancelled),
            result = reply => result,
        }
    }
}

pub struct FakeGenerator {
    script: Script,
    recorder: Recorder,
}

impl FakeGenerator {
    pub fn new(delay_ms: u64, reply: Reply) -> (Self, Recorder) {
        let recorder = Recorder::default();
        let fake = Self {
            script: Script {
                delay: Duration::from_millis(delay_ms),
                reply,
            },
            recorder: recorder.clone(),
        };
        (fake, recorder)
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(
        &self,
        prompt: &str,
        age_hint: u8,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        self.recorder.record(prompt, cancel);
        self.recorder.age_hints.lock().unwrap().push(age_hint);
        self.script.play(cancel).await
    }
}

pub struct FakeClassifier {
    script: Script,
    recorder: Recorder,
}

impl FakeClassifier {
    pub fn new(delay_ms: u64, reply: Reply) -> (Self, Recorder) {
        let recorder = Recorder::default();
        let fake = Self {
            script: Script {
                delay: Duration::from_millis(delay_ms),
                reply,
            },
            recorder: recorder.clone(),
        };
        (fake, recorder)
    }
}

#[async_trait]
impl TopicClassifier for FakeClassifier {
    async fn classify(
        &self,
        prompt: &str,
        disallowed: &BTreeSet<TopicTag>,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        self.recorder.record(prompt, cancel);
        self.recorder.disallowed.lock().unwrap().push(disallowed.clone());
        self.script.play(cancel).await
    }
}

pub struct FakeModerator {
    script: Script,
    recorder: Recorder,
}

impl FakeModerator {
    pub fn new(delay_ms: u64, reply: Reply) -> (Self, Recorder) {
        let recorder = Recorder::default();
        let fake = Self {
            script: Script {
                delay: Duration::from_millis(delay_ms),
                reply,
            },
            recorder: recorder.clone(),
        };
        (fake, recorder)
    }
}

#[async_trait]
impl ContentModerator for FakeModerator {
    async fn score(
        &self,
        content: &str,
        rubric: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        self.recorder.record(content, cancel);
        self.recorder.rubrics.lock().unwrap().push(rubric.to_string());
        self.script.play(cancel).await
    }
}

/// Tracing layer that keeps every event as a `field=value` line.
#[derive(Clone, Default)]
pub struct EventLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Lines carrying `message`.
    pub fn with_message(&self, message: &str) -> Vec<String> {
        let needle = format!("message={message}");
        self.lines()
            .into_iter()
            .filter(|line| line.contains(&needle))
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for EventLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut line = FieldLine::default();
        event.record(&mut line);
        self.lines.lock().unwrap().push(line.0);
    }
}

#[derive(Default)]
struct FieldLine(String);

impl Visit for FieldLine {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        let _ = write!(self.0, "{}={:?}", field.name(), value);
    }
}
