//! Shared test utilities

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use voice_qa::controller::Session;
use voice_qa::{Answer, Controls, Dispatcher, Display, Prompt, Synthesizer, Transcriber, Utterance};

/// One observable side effect, in the order it happened
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start(Session),
    Ask(String),
    Render { question: String, answer: String },
    Speak(String),
    Controls(Controls),
    Notice(String),
}

/// Ordered log shared by all fakes of one test
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<Call>>>);

impl Trace {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    /// Recognition activations started so far, oldest first
    pub fn sessions(&self) -> Vec<Session> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Start(session) => Some(session),
                _ => None,
            })
            .collect()
    }

    /// Wait until `pred` matches some recorded call
    pub async fn wait_for(&self, pred: impl Fn(&Call) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.calls().iter().any(&pred) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for call");
    }
}

/// Transcriber that only records activations
pub struct FakeTranscriber(pub Trace);

impl Transcriber for FakeTranscriber {
    fn start(&mut self, session: Session) {
        self.0.push(Call::Start(session));
    }
}

/// Synthesizer that records what it would say
pub struct FakeSynthesizer(pub Trace);

impl Synthesizer for FakeSynthesizer {
    fn speak(&mut self, utterance: &Utterance) {
        self.0.push(Call::Speak(utterance.text.clone()));
    }
}

/// Display that records renders and control updates
pub struct FakeDisplay(pub Trace);

impl Display for FakeDisplay {
    fn render(&mut self, question: &str, answer: &str) {
        self.0.push(Call::Render {
            question: question.to_string(),
            answer: answer.to_string(),
        });
    }

    fn set_controls(&mut self, controls: &Controls) {
        self.0.push(Call::Controls(*controls));
    }

    fn notice(&mut self, message: &str) {
        self.0.push(Call::Notice(message.to_string()));
    }
}

/// Dispatcher that answers from a fixed script
pub struct FakeDispatcher {
    pub trace: Trace,
    pub answer: Answer,
}

#[async_trait]
impl Dispatcher for FakeDispatcher {
    async fn ask(&self, prompt: &Prompt) -> Answer {
        self.trace.push(Call::Ask(prompt.as_str().to_string()));
        self.answer.clone()
    }
}

/// Request bodies received by a mock answer server
pub type Received = Arc<Mutex<Vec<String>>>;

/// Serve a canned answer at `/api/gemini` on a random local port
///
/// Returns the server's base URL and the bodies it receives.
pub async fn spawn_answer_server(status: u16, body: &'static str) -> (String, Received) {
    use axum::{Router, http::StatusCode, routing::post};

    let received = Received::default();
    let log = received.clone();
    let status = StatusCode::from_u16(status).unwrap();

    let app = Router::new().route(
        "/api/gemini",
        post(move |request: String| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push(request);
                (status, body)
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), received)
}
