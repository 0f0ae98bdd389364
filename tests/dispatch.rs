//! Answer service integration tests

mod common;

use common::{Call, FakeDisplay, FakeSynthesizer, FakeTranscriber, Trace, spawn_answer_server};
use tokio::sync::mpsc;
use voice_qa::{Answer, Controller, Dispatcher, FALLBACK_ANSWER, HttpDispatcher, Prompt};

async fn ask_through_controller(base_url: &str, text: &str) -> (Option<Answer>, Trace) {
    let trace = Trace::default();
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut controller = Controller::new(
        FakeTranscriber(trace.clone()),
        FakeSynthesizer(trace.clone()),
        HttpDispatcher::from_base_url(base_url).unwrap(),
        FakeDisplay(trace.clone()),
        tx,
        true,
    );
    trace.clear();

    let answer = controller.ask(text).await;
    (answer, trace)
}

#[tokio::test]
async fn test_answer_shown_and_spoken() {
    let (base_url, received) = spawn_answer_server(200, r#"{"text":"4"}"#).await;

    let (answer, trace) = ask_through_controller(&base_url, "What is 2+2?").await;

    assert_eq!(answer, Some(Answer::Reply("4".to_string())));

    let bodies = received.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(body, serde_json::json!({ "prompt": "What is 2+2?" }));

    let calls = trace.calls();
    assert!(calls.contains(&Call::Render {
        question: "What is 2+2?".to_string(),
        answer: "4".to_string(),
    }));
    assert!(calls.contains(&Call::Speak("4".to_string())));
}

#[tokio::test]
async fn test_server_error_falls_back() {
    let (base_url, received) = spawn_answer_server(500, "boom").await;

    let (answer, trace) = ask_through_controller(&base_url, "anything").await;

    assert_eq!(answer, Some(Answer::Fallback));
    assert_eq!(received.lock().unwrap().len(), 1);

    let calls = trace.calls();
    assert!(calls.contains(&Call::Render {
        question: "anything".to_string(),
        answer: FALLBACK_ANSWER.to_string(),
    }));
    assert!(calls.contains(&Call::Speak(FALLBACK_ANSWER.to_string())));
    match calls.last() {
        Some(Call::Controls(controls)) => assert!(controls.text_enabled && controls.voice_enabled),
        other => panic!("unexpected last call: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_reply_falls_back() {
    let (base_url, _received) = spawn_answer_server(200, "not json").await;
    let dispatcher = HttpDispatcher::from_base_url(&base_url).unwrap();

    let answer = dispatcher.ask(&Prompt::parse("hi").unwrap()).await;

    assert_eq!(answer, Answer::Fallback);
}

#[tokio::test]
async fn test_missing_text_field_is_empty_answer() {
    let (base_url, _received) = spawn_answer_server(200, r#"{"other":"field"}"#).await;
    let dispatcher = HttpDispatcher::from_base_url(&base_url).unwrap();

    let answer = dispatcher.ask(&Prompt::parse("hi").unwrap()).await;

    assert_eq!(answer, Answer::Reply(String::new()));
}

#[tokio::test]
async fn test_non_object_reply_is_empty_answer() {
    let (base_url, _received) = spawn_answer_server(200, r#""just a string""#).await;
    let dispatcher = HttpDispatcher::from_base_url(&base_url).unwrap();

    let answer = dispatcher.ask(&Prompt::parse("hi").unwrap()).await;

    assert_eq!(answer, Answer::Reply(String::new()));
}

#[tokio::test]
async fn test_unreachable_service_falls_back() {
    // Grab a free port, then close it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dispatcher = HttpDispatcher::from_base_url(&format!("http://{addr}")).unwrap();
    let answer = dispatcher.ask(&Prompt::parse("hi").unwrap()).await;

    assert_eq!(answer, Answer::Fallback);
}

#[tokio::test]
async fn test_prompt_sent_trimmed() {
    let (base_url, received) = spawn_answer_server(200, r#"{"text":"ok"}"#).await;

    let (answer, _trace) = ask_through_controller(&base_url, "   spaced out   ").await;

    assert_eq!(answer, Some(Answer::Reply("ok".to_string())));
    let body: serde_json::Value =
        serde_json::from_str(&received.lock().unwrap()[0]).unwrap();
    assert_eq!(body["prompt"], "spaced out");
}
