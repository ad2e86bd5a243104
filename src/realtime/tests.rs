use serde_json::json;

use crate::db::types::{SessionStatus, UserRole};
use crate::realtime::protocol::{
    AuthenticatedUser, ProctorAction, ServerMessage, INVALID_FORMAT, NOT_AUTHENTICATED,
    PROCESSING_FAILED, UNKNOWN_TYPE,
};
use crate::repositories::sessions::StatusUpdate;
use crate::test_support::{channel_harness, TestClient};

fn paused_notice() -> ServerMessage {
    ServerMessage::SessionPaused { message: "Your exam has been paused by the proctor".into() }
}

#[tokio::test]
async fn authenticate_registers_one_entry_and_echoes_role() {
    let harness = channel_harness();
    harness.store.add_user("s1", UserRole::Student);
    let mut client = TestClient::connect();
    let token = harness.keys.issue("s1", None).unwrap();

    client.send(&harness, json!({"type": "authenticate", "token": token})).await;
    client.send(&harness, json!({"type": "authenticate", "token": token})).await;

    let expected = ServerMessage::Authenticated {
        client_id: format!("s1-{}", client.handle.id()),
        user: AuthenticatedUser { id: "s1".into(), role: UserRole::Student },
    };
    assert_eq!(client.drain(), vec![expected.clone(), expected]);
    assert_eq!(harness.channel.registry().len().await, 1);
    let entry = harness.channel.registry().get(client.handle.id()).await.unwrap();
    assert_eq!(entry.user_id, "s1");
    assert_eq!(entry.role, UserRole::Student);
}

#[tokio::test]
async fn unresolvable_identity_gets_auth_error_and_no_entry() {
    let harness = channel_harness();
    let mut bad_token = TestClient::connect();
    bad_token.send(&harness, json!({"type": "authenticate", "token": "garbage"})).await;
    assert_eq!(bad_token.next(), Some(ServerMessage::auth_error("Invalid token")));

    let mut unknown_user = TestClient::connect();
    let token = harness.keys.issue("ghost", None).unwrap();
    unknown_user.send(&harness, json!({"type": "authenticate", "token": token})).await;
    assert_eq!(unknown_user.next(), Some(ServerMessage::auth_error("User not found")));

    assert_eq!(harness.channel.registry().len().await, 0);
}

#[tokio::test]
async fn storage_failure_during_authentication_is_an_auth_error() {
    let harness = channel_harness();
    harness.store.add_user("s1", UserRole::Student);
    harness.store.set_failing(true);
    let mut client = TestClient::connect();
    let token = harness.keys.issue("s1", None).unwrap();

    client.send(&harness, json!({"type": "authenticate", "token": token})).await;

    assert_eq!(client.next(), Some(ServerMessage::auth_error("Authentication failed")));
    assert_eq!(harness.channel.registry().len().await, 0);
}

#[tokio::test]
async fn join_requires_authentication() {
    let harness = channel_harness();
    let mut anonymous = TestClient::connect();
    anonymous.send(&harness, json!({"type": "join_session", "sessionId": "sess-1"})).await;
    assert_eq!(anonymous.next(), Some(ServerMessage::error(NOT_AUTHENTICATED)));

    let mut student = harness.login("s1", UserRole::Student).await;
    student.send(&harness, json!({"type": "join_session", "sessionId": "sess-1"})).await;
    assert_eq!(student.next(), Some(ServerMessage::SessionJoined { session_id: "sess-1".into() }));
}

// Known gap: joining does not check that the session exists or belongs to
// the student.
#[tokio::test]
async fn join_accepts_sessions_that_do_not_exist() {
    let harness = channel_harness();
    let mut student = harness.login("s1", UserRole::Student).await;

    student.send(&harness, json!({"type": "join_session", "sessionId": "nowhere"})).await;

    assert_eq!(student.next(), Some(ServerMessage::SessionJoined { session_id: "nowhere".into() }));
}

#[tokio::test]
async fn malformed_and_unknown_frames_get_errors_and_keep_the_connection() {
    let harness = channel_harness();
    let mut client = harness.login("s1", UserRole::Student).await;

    harness.channel.handle_text(&client.handle, "{not json").await;
    client.send(&harness, json!({"sessionId": "sess-1"})).await;
    client.send(&harness, json!({"type": "join_session", "sessionId": 7})).await;
    client.send(&harness, json!({"type": "raise_hand"})).await;

    assert_eq!(
        client.drain(),
        vec![
            ServerMessage::error(INVALID_FORMAT),
            ServerMessage::error(INVALID_FORMAT),
            ServerMessage::error(INVALID_FORMAT),
            ServerMessage::error(UNKNOWN_TYPE),
        ]
    );
    assert!(harness.channel.registry().get(client.handle.id()).await.is_some());
}

#[tokio::test]
async fn pause_with_joined_student_delivers_exactly_one_notice() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let mut student = harness.login("s1", UserRole::Student).await;
    let mut bystander = harness.login("s2", UserRole::Student).await;
    let mut proctor = harness.login("p1", UserRole::Proctor).await;
    student.send(&harness, json!({"type": "join_session", "sessionId": "sess-1"})).await;
    bystander.send(&harness, json!({"type": "join_session", "sessionId": "sess-2"})).await;
    student.drain();
    bystander.drain();

    proctor
        .send(
            &harness,
            json!({"type": "proctor_action", "action": "pause_session", "targetSessionId": "sess-1"}),
        )
        .await;

    assert_eq!(harness.store.session("sess-1").unwrap().status, SessionStatus::Paused);
    assert_eq!(student.drain(), vec![paused_notice()]);
    assert!(bystander.drain().is_empty());
    assert!(proctor.drain().is_empty());
}

#[tokio::test]
async fn pause_without_student_persists_and_delivers_nothing() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);

    let outcome =
        harness.channel.apply_proctor_action(ProctorAction::PauseSession, "sess-1").await.unwrap();

    assert_eq!(outcome.update, StatusUpdate::Applied);
    assert_eq!(outcome.delivered, 0);
    assert_eq!(harness.store.session("sess-1").unwrap().status, SessionStatus::Paused);
}

#[tokio::test]
async fn resume_and_terminate_send_their_notices() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Paused);
    let mut student = harness.login("s1", UserRole::Student).await;
    let instructor = harness.login("i1", UserRole::Instructor).await;
    student.send(&harness, json!({"type": "join_session", "sessionId": "sess-1"})).await;
    student.drain();

    for action in ["resume_session", "terminate_session"] {
        instructor
            .send(
                &harness,
                json!({"type": "proctor_action", "action": action, "targetSessionId": "sess-1",
                       "data": {"reason": "check"}}),
            )
            .await;
    }

    assert_eq!(
        student.drain(),
        vec![
            ServerMessage::SessionResumed { message: "Your exam has been resumed".into() },
            ServerMessage::SessionTerminated { message: "Your exam has been terminated".into() },
        ]
    );
    assert_eq!(harness.store.session("sess-1").unwrap().status, SessionStatus::Terminated);
}

#[tokio::test]
async fn terminal_sessions_refuse_proctor_actions() {
    let harness = channel_harness();
    harness.store.add_session("done", SessionStatus::Completed);
    let mut student = harness.login("s1", UserRole::Student).await;
    let mut proctor = harness.login("p1", UserRole::Proctor).await;
    student.send(&harness, json!({"type": "join_session", "sessionId": "done"})).await;
    student.drain();

    proctor
        .send(
            &harness,
            json!({"type": "proctor_action", "action": "resume_session", "targetSessionId": "done"}),
        )
        .await;
    proctor
        .send(
            &harness,
            json!({"type": "proctor_action", "action": "pause_session", "targetSessionId": "missing"}),
        )
        .await;

    assert_eq!(harness.store.session("done").unwrap().status, SessionStatus::Completed);
    assert!(student.drain().is_empty());
    assert_eq!(
        proctor.drain(),
        vec![
            ServerMessage::error("Session is already completed"),
            ServerMessage::error("Session not found"),
        ]
    );
}

#[tokio::test]
async fn proctor_actions_from_students_are_ignored() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let mut student = harness.login("s1", UserRole::Student).await;
    let mut admin = harness.login("a1", UserRole::Admin).await;

    for client in [&student, &admin] {
        client
            .send(
                &harness,
                json!({"type": "proctor_action", "action": "terminate_session",
                       "targetSessionId": "sess-1"}),
            )
            .await;
    }

    assert_eq!(harness.store.session("sess-1").unwrap().status, SessionStatus::Active);
    assert!(student.drain().is_empty());
    assert!(admin.drain().is_empty());
}

#[tokio::test]
async fn student_activity_is_logged_and_relayed_to_staff_only() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let mut student = harness.login("s1", UserRole::Student).await;
    let mut other_student = harness.login("s2", UserRole::Student).await;
    let mut proctor = harness.login("p1", UserRole::Proctor).await;
    let mut instructor = harness.login("i1", UserRole::Instructor).await;
    let mut admin = harness.login("a1", UserRole::Admin).await;

    student
        .send(
            &harness,
            json!({"type": "student_activity", "sessionId": "sess-1",
                   "activity": {"type": "tab_switch", "data": {"count": 3}}}),
        )
        .await;

    let log = harness.store.session("sess-1").unwrap().flagged;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].kind, "tab_switch");
    assert_eq!(log[0].data, json!({"count": 3}));
    assert_eq!(log[0].student_id, "s1");
    assert!(log[0].timestamp.ends_with('Z'));

    for staff in [&mut proctor, &mut instructor] {
        let relayed = staff.drain();
        assert_eq!(relayed.len(), 1);
        let ServerMessage::StudentActivity { session_id, student_id, activity } = &relayed[0]
        else {
            panic!("unexpected relay: {relayed:?}");
        };
        assert_eq!(session_id.as_deref(), Some("sess-1"));
        assert_eq!(student_id, "s1");
        assert_eq!(activity.kind, "tab_switch");
    }
    assert!(student.drain().is_empty());
    assert!(other_student.drain().is_empty());
    assert!(admin.drain().is_empty());
}

#[tokio::test]
async fn student_activity_falls_back_to_joined_session() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let mut student = harness.login("s1", UserRole::Student).await;
    student.send(&harness, json!({"type": "join_session", "sessionId": "sess-1"})).await;
    student.drain();

    student
        .send(&harness, json!({"type": "student_activity", "activity": {"type": "devtools"}}))
        .await;

    assert_eq!(harness.store.session("sess-1").unwrap().flagged.len(), 1);
}

#[tokio::test]
async fn student_activity_from_proctor_is_dropped() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let mut proctor = harness.login("p1", UserRole::Proctor).await;
    let mut watcher = harness.login("p2", UserRole::Proctor).await;

    proctor
        .send(
            &harness,
            json!({"type": "student_activity", "sessionId": "sess-1",
                   "activity": {"type": "tab_switch"}}),
        )
        .await;

    assert!(harness.store.session("sess-1").unwrap().flagged.is_empty());
    assert!(proctor.drain().is_empty());
    assert!(watcher.drain().is_empty());
}

#[tokio::test]
async fn unauthenticated_role_gated_messages_are_silent() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let mut anonymous = TestClient::connect();

    anonymous
        .send(&harness, json!({"type": "time_update", "sessionId": "sess-1", "timeRemaining": 5}))
        .await;
    anonymous
        .send(
            &harness,
            json!({"type": "student_activity", "sessionId": "sess-1", "activity": {"type": "x"}}),
        )
        .await;

    assert!(anonymous.drain().is_empty());
    let session = harness.store.session("sess-1").unwrap();
    assert_eq!(session.time_remaining, Some(3600));
    assert!(session.flagged.is_empty());
}

#[tokio::test]
async fn time_update_persists_without_reply_and_clamps_negatives() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let mut student = harness.login("s1", UserRole::Student).await;
    let proctor = harness.login("p1", UserRole::Proctor).await;

    student
        .send(&harness, json!({"type": "time_update", "sessionId": "sess-1", "timeRemaining": 1200}))
        .await;
    assert_eq!(harness.store.session("sess-1").unwrap().time_remaining, Some(1200));

    proctor
        .send(&harness, json!({"type": "time_update", "sessionId": "sess-1", "timeRemaining": 1}))
        .await;
    assert_eq!(harness.store.session("sess-1").unwrap().time_remaining, Some(1200));

    student
        .send(&harness, json!({"type": "time_update", "sessionId": "sess-1", "timeRemaining": -30}))
        .await;
    assert_eq!(harness.store.session("sess-1").unwrap().time_remaining, Some(0));
    assert!(student.drain().is_empty());
}

#[tokio::test]
async fn storage_errors_are_reported_per_message() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let mut student = harness.login("s1", UserRole::Student).await;

    harness.store.set_failing(true);
    student
        .send(&harness, json!({"type": "time_update", "sessionId": "sess-1", "timeRemaining": 10}))
        .await;
    harness.store.set_failing(false);
    student.send(&harness, json!({"type": "join_session", "sessionId": "sess-1"})).await;

    assert_eq!(
        student.drain(),
        vec![
            ServerMessage::error(PROCESSING_FAILED),
            ServerMessage::SessionJoined { session_id: "sess-1".into() },
        ]
    );
}

#[tokio::test]
async fn closed_connection_is_not_notified() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let mut student = harness.login("s1", UserRole::Student).await;
    student.send(&harness, json!({"type": "join_session", "sessionId": "sess-1"})).await;
    student.drain();

    harness.channel.disconnect(student.handle.id()).await;
    let outcome =
        harness.channel.apply_proctor_action(ProctorAction::PauseSession, "sess-1").await.unwrap();

    assert_eq!(harness.channel.registry().len().await, 0);
    assert_eq!(outcome.delivered, 0);
    assert_eq!(harness.store.session("sess-1").unwrap().status, SessionStatus::Paused);
    assert!(student.drain().is_empty());
}

#[tokio::test]
async fn status_round_trip_and_terminal_guard() {
    use crate::realtime::store::SessionStore;

    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);
    let store = harness.store.as_ref();

    for next in [SessionStatus::Paused, SessionStatus::Active, SessionStatus::Completed] {
        assert_eq!(store.update_session_status("sess-1", next).await.unwrap(), StatusUpdate::Applied);
        assert_eq!(store.session("sess-1").unwrap().status, next);
    }

    for action in
        [ProctorAction::PauseSession, ProctorAction::ResumeSession, ProctorAction::TerminateSession]
    {
        let outcome = harness.channel.apply_proctor_action(action, "sess-1").await.unwrap();
        assert_eq!(outcome.update, StatusUpdate::Rejected(SessionStatus::Completed));
    }

    harness.store.add_session("sess-2", SessionStatus::Paused);
    harness.channel.apply_proctor_action(ProctorAction::TerminateSession, "sess-2").await.unwrap();
    let outcome =
        harness.channel.apply_proctor_action(ProctorAction::ResumeSession, "sess-2").await.unwrap();
    assert_eq!(outcome.update, StatusUpdate::Rejected(SessionStatus::Terminated));
}

#[tokio::test]
async fn proctor_pauses_joined_student_end_to_end() {
    let harness = channel_harness();
    harness.store.add_session("sess-1", SessionStatus::Active);

    let mut student = harness.login("s1", UserRole::Student).await;
    student.send(&harness, json!({"type": "join_session", "sessionId": "sess-1"})).await;
    assert_eq!(student.next(), Some(ServerMessage::SessionJoined { session_id: "sess-1".into() }));

    let proctor = harness.login("p1", UserRole::Proctor).await;
    proctor
        .send(
            &harness,
            json!({"type": "proctor_action", "action": "pause_session", "targetSessionId": "sess-1"}),
        )
        .await;

    assert_eq!(harness.store.session("sess-1").unwrap().status, SessionStatus::Paused);
    let frame = serde_json::to_value(student.next().expect("notice")).unwrap();
    assert_eq!(
        frame,
        json!({"type": "session_paused", "message": "Your exam has been paused by the proctor"})
    );
}

#[tokio::test]
async fn shutdown_is_observable_by_socket_tasks() {
    let harness = channel_harness();
    let mut signal = harness.channel.subscribe_shutdown();
    assert!(!*signal.borrow());

    harness.channel.shutdown();

    signal.changed().await.unwrap();
    assert!(*signal.borrow());
}
