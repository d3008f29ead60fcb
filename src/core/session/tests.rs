use super::*;
use crate::core::message::TranscriptRole;

fn test_session() -> StreamSession {
    StreamSession::new(Endpoint::new("http://localhost:8000"))
}

fn send(session: &mut StreamSession, text: &str) -> u64 {
    session.send(text).expect("stream params").stream_id
}

fn last_content(session: &StreamSession) -> &str {
    &session.transcript().last().expect("last message").content
}

#[test]
fn send_appends_user_message_and_placeholder() {
    let mut session = test_session();
    let params = session.send("Hi").expect("params");

    assert_eq!(session.state(), SessionState::Sending);
    assert_eq!(
        session.snapshot(),
        &[Message::user("Hi"), Message::assistant("")]
    );
    assert_eq!(params.request.message, "Hi");
    assert!(params.request.history.is_empty());
    assert_eq!(params.base_url, "http://localhost:8000");
    assert!(!params.cancel_token.is_cancelled());
}

#[test]
fn blank_input_is_ignored() {
    let mut session = test_session();
    for text in ["", "   ", "\n\t "] {
        assert!(session.send(text).is_none());
    }
    assert!(session.transcript().is_empty());
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.current_stream_id(), 0);
}

#[test]
fn hello_scenario_streams_into_placeholder() {
    let mut session = test_session();
    let id = send(&mut session, "Hi");

    assert_eq!(session.apply(id, StreamMessage::Token("Hel".into())), None);
    assert_eq!(session.apply(id, StreamMessage::Token("lo".into())), None);
    assert_eq!(session.state(), SessionState::Sending);
    assert_eq!(
        session.apply(id, StreamMessage::End),
        Some(StreamOutcome::Completed)
    );

    assert_eq!(
        session.snapshot(),
        &[Message::user("Hi"), Message::assistant("Hello")]
    );
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn tokens_concatenate_in_arrival_order() {
    let fragments = ["a", "", "b c", "\n", "ü", "🙂", "d"];
    for len in 0..=fragments.len() {
        let mut session = test_session();
        let id = send(&mut session, "go");
        for fragment in &fragments[..len] {
            session.apply(id, StreamMessage::Token((*fragment).into()));
        }
        session.apply(id, StreamMessage::End);

        assert_eq!(last_content(&session), fragments[..len].concat());
        assert_eq!(session.state(), SessionState::Idle);
    }
}

#[test]
fn server_error_replaces_reply() {
    let mut session = test_session();
    let id = send(&mut session, "Bad");
    session.apply(id, StreamMessage::Token("partial".into()));

    let outcome = session.apply(id, StreamMessage::Error("quota exceeded".into()));

    assert_eq!(
        outcome,
        Some(StreamOutcome::ServerError("quota exceeded".into()))
    );
    assert_eq!(last_content(&session), "Error: quota exceeded");
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn transport_failure_shows_connection_error() {
    let mut session = test_session();
    let id = send(&mut session, "Hi");

    let outcome = session.apply(id, StreamMessage::TransportFailed("reset".into()));

    assert_eq!(outcome, Some(StreamOutcome::ConnectionLost("reset".into())));
    assert_eq!(last_content(&session), "Sorry, a connection error occurred.");
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn open_failure_returns_to_idle_with_connection_error() {
    let mut session = test_session();
    let id = send(&mut session, "Hi");

    let outcome = session.apply(id, StreamMessage::OpenFailed("refused".into()));

    assert_eq!(outcome, Some(StreamOutcome::OpenFailed("refused".into())));
    assert_eq!(last_content(&session), CONNECTION_ERROR_TEXT);
    assert!(!session.is_sending());
}

#[test]
fn first_terminal_message_wins() {
    let terminals = [
        StreamMessage::End,
        StreamMessage::Error("X".into()),
        StreamMessage::TransportFailed("drop".into()),
        StreamMessage::OpenFailed("refused".into()),
    ];

    for first in &terminals {
        let mut session = test_session();
        let id = send(&mut session, "Hi");
        session.apply(id, StreamMessage::Token("ok".into()));

        let mut outcomes = Vec::new();
        outcomes.extend(session.apply(id, first.clone()));
        let after_first = last_content(&session).to_string();
        for later in terminals.iter().chain([&StreamMessage::Token("late".into())]) {
            outcomes.extend(session.apply(id, later.clone()));
        }

        assert_eq!(outcomes.len(), 1, "first terminal {first:?}");
        assert_eq!(last_content(&session), after_first);
        assert_eq!(session.state(), SessionState::Idle);
    }
}

#[test]
fn history_excludes_new_pair() {
    let mut session = test_session();
    let first = send(&mut session, "Hi");
    session.apply(first, StreamMessage::Token("Hello".into()));
    session.apply(first, StreamMessage::End);

    let params = session.send("How are you?").expect("params");

    let roles: Vec<_> = params.request.history.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![TranscriptRole::User, TranscriptRole::Assistant]);
    assert_eq!(params.request.history[1].content, "Hello");
    assert_eq!(session.transcript().len(), 4);
}

#[test]
fn failed_reply_is_sent_as_history() {
    let mut session = test_session();
    let first = send(&mut session, "Bad");
    session.apply(first, StreamMessage::Error("quota exceeded".into()));

    let params = session.send("again").expect("params");
    assert_eq!(
        params.request.history[1].content,
        "Error: quota exceeded"
    );
}

#[test]
fn stale_stream_messages_are_ignored() {
    let mut session = test_session();
    let first = send(&mut session, "one");
    session.apply(first, StreamMessage::End);
    let second = send(&mut session, "two");
    assert_ne!(first, second);

    assert_eq!(session.apply(first, StreamMessage::Token("stale".into())), None);
    assert_eq!(session.apply(first, StreamMessage::Error("stale".into())), None);

    assert_eq!(last_content(&session), "");
    assert!(session.is_sending());
    assert_eq!(
        session.apply(second, StreamMessage::End),
        Some(StreamOutcome::Completed)
    );
}

#[test]
fn messages_before_any_send_are_dropped() {
    let mut session = test_session();
    assert_eq!(session.apply(0, StreamMessage::Token("x".into())), None);
    assert_eq!(session.apply(0, StreamMessage::End), None);
    assert!(session.transcript().is_empty());
}

#[test]
fn shutdown_cancels_in_flight_stream() {
    let mut session = test_session();
    let params = session.send("Hi").expect("params");
    session.shutdown();
    assert!(params.cancel_token.is_cancelled());
}

#[test]
fn completed_stream_releases_cancel_token() {
    let mut session = test_session();
    let params = session.send("Hi").expect("params");
    session.apply(params.stream_id, StreamMessage::End);
    session.shutdown();
    assert!(!params.cancel_token.is_cancelled());
}
