//! Chat session controller
//!
//! Owns the transcript, the input field and the single in-flight request.
//! A submission moves the session from `Idle` to `Sending`; the reply (or
//! failure) moves it back. While `Sending`, further submissions are refused.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{Answer, AskClient};
use crate::error::AskError;
use crate::input::InputField;
use crate::state::{LoadingIndicator, Message, Phase, Transcript};

/// Shown in place of any failure detail
pub const ERROR_TEXT: &str = "⚠️ Error connecting to server. Please try again.";

pub const DEFAULT_LOADING_TEXT: &str = "🏏 Fetching IPL data...";

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub loading_text: String,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            loading_text: DEFAULT_LOADING_TEXT.to_string(),
        }
    }
}

/// Result of asking the controller to submit the current input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Input was empty or whitespace; nothing happened
    Ignored,
    /// A request is already in flight; nothing happened
    Busy,
    /// The question was appended and the request started
    Sent,
}

type ReplyTask = JoinHandle<Result<Answer, AskError>>;

pub struct ChatController {
    client: AskClient,
    settings: ControllerSettings,
    transcript: Transcript,
    input: InputField,
    input_focused: bool,
    phase: Phase,
    loading: Option<LoadingIndicator>,
    in_flight: Option<ReplyTask>,
    revision: u64,
}

impl ChatController {
    pub fn new(client: AskClient, settings: ControllerSettings) -> Self {
        Self {
            client,
            settings,
            transcript: Transcript::new(),
            input: InputField::new(),
            input_focused: true,
            phase: Phase::Idle,
            loading: None,
            in_flight: None,
            revision: 0,
        }
    }

    pub fn client(&self) -> &AskClient {
        &self.client
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn input(&self) -> &InputField {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputField {
        &mut self.input
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_sending(&self) -> bool {
        self.phase == Phase::Sending
    }

    /// Whether the send affordance should accept clicks
    pub fn send_enabled(&self) -> bool {
        !self.is_sending()
    }

    pub fn loading(&self) -> Option<&LoadingIndicator> {
        self.loading.as_ref()
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused
    }

    pub fn focus_input(&mut self, focused: bool) {
        self.input_focused = focused;
    }

    /// Bumped whenever the transcript or loading indicator changes
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Submit the current input as a question.
    ///
    /// Must be called from within a tokio runtime; the request runs on a
    /// spawned task and is collected with [`next_reply`](Self::next_reply).
    pub fn submit(&mut self) -> Submission {
        if self.is_sending() {
            debug!("submission refused, request already in flight");
            return Submission::Busy;
        }
        if self.input.is_blank() {
            return Submission::Ignored;
        }

        let question = self.input.take_trimmed();
        self.append(Message::user(question.clone()));
        self.phase = Phase::Sending;
        self.loading = Some(LoadingIndicator {
            text: self.settings.loading_text.clone(),
        });
        self.revision += 1;

        debug!(
            endpoint = %self.client.endpoint(),
            timeout = ?self.client.timeout(),
            chars = question.chars().count(),
            "sending question"
        );
        let client = self.client.clone();
        self.in_flight = Some(tokio::spawn(async move { client.ask(&question).await }));

        Submission::Sent
    }

    /// Wait for the in-flight request. Never resolves while idle, so it can
    /// sit in a `select!` next to the terminal event stream. Cancel-safe:
    /// dropping the future leaves the request running.
    pub async fn next_reply(&mut self) -> Result<Answer, AskError> {
        let Some(handle) = self.in_flight.as_mut() else {
            return std::future::pending().await;
        };

        let result = handle.await;
        self.in_flight = None;

        match result {
            Ok(outcome) => outcome,
            Err(e) => Err(AskError::Task(e)),
        }
    }

    /// Render the outcome of the in-flight request and return to idle
    pub fn finish(&mut self, outcome: Result<Answer, AskError>) {
        if !self.is_sending() {
            debug!("reply arrived with no submission pending, ignoring");
            return;
        }

        self.loading = None;

        match outcome {
            Ok(answer) => {
                info!(
                    fallback = answer.fallback,
                    chars = answer.text.chars().count(),
                    "answer received"
                );
                self.append(Message::bot(answer.text));
            }
            Err(err) => {
                warn!(error = %err, "question failed");
                self.append(Message::error(ERROR_TEXT));
            }
        }

        self.phase = Phase::Idle;
        self.input_focused = true;
    }

    /// Wait for the in-flight request, if any, and render its outcome
    pub async fn settle(&mut self) {
        if !self.is_sending() {
            return;
        }
        let outcome = self.next_reply().await;
        self.finish(outcome);
    }

    fn append(&mut self, message: Message) {
        self.transcript.push(message);
        self.revision += 1;
    }
}

impl Drop for ChatController {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
