//! Behaviour of the room/user/membership ensure operations against a
//! scripted chat server.

use std::sync::Arc;

use rocketchat_tab::chat::client::{connection_error, invalid_json};
use rocketchat_tab::chat::{ChatRoomOrchestrator, ChatTransport};
use rocketchat_tab::errors::{ChatErrorKind, ErrorPayload};
use serde_json::json;

use super::stub_transport::{
    bundle, chat_config, not_found_room, not_found_user, StubTransport, BASE_URL,
};

const COURSE: &str = "course-v1:IT_IS+ICT_01+2022_SUMMER";

fn orchestrator(stub: &Arc<StubTransport>, username: &str, is_staff: bool) -> ChatRoomOrchestrator {
    let transport: Arc<dyn ChatTransport> = stub.clone();
    ChatRoomOrchestrator::from_value(
        &bundle(COURSE, username, is_staff, true),
        &chat_config(),
        transport,
    )
    .expect("valid launch bundle")
}

// ── Construction ─────────────────────────────────────────────

#[test]
fn room_name_is_derived_from_course_key() {
    let stub = StubTransport::new();
    let chat = orchestrator(&stub, "student", false);
    assert_eq!(chat.room_name(), "edx-IT_IS-ICT_01-2022_SUMMER");
    assert_eq!(chat.course_key(), COURSE);
}

#[test]
fn username_is_lower_cased() {
    let stub = StubTransport::new();
    let chat = orchestrator(&stub, "Fi_Last", false);
    assert_eq!(chat.user().username, "fi_last");
}

#[test]
fn unenrolled_user_is_refused_without_network_calls() {
    let stub = StubTransport::new();
    let transport: Arc<dyn ChatTransport> = stub.clone();

    let err = ChatRoomOrchestrator::from_value(
        &bundle(COURSE, "Visitor", false, false),
        &chat_config(),
        transport,
    )
    .err()
    .expect("enrollment is required");

    assert_eq!(err.kind(), ChatErrorKind::InvalidInput);
    assert_eq!(
        err.message(),
        "Enrollment in course 'course-v1:IT_IS+ICT_01+2022_SUMMER' is required to access the group chat."
    );
    assert_eq!(
        err.payload(),
        &ErrorPayload::Json(json!({
            "ValidationError": "User Visitor is not enrolled in the course."
        }))
    );
    assert!(stub.calls().is_empty());
}

#[test]
fn course_key_without_segments_is_refused_without_network_calls() {
    let stub = StubTransport::new();
    let transport: Arc<dyn ChatTransport> = stub.clone();

    let err = ChatRoomOrchestrator::from_value(
        &bundle("no-colon-here", "student", false, true),
        &chat_config(),
        transport,
    )
    .err()
    .expect("course key must have two segments");

    assert_eq!(err.kind(), ChatErrorKind::InvalidInput);
    assert_eq!(err.message(), "Error parsing course data.");
    assert!(stub.calls().is_empty());
}

#[test]
fn room_url_needs_no_network() {
    let stub = StubTransport::new();
    let chat = orchestrator(&stub, "student", false);
    assert_eq!(
        chat.room_url(),
        format!("{BASE_URL}/group/edx-IT_IS-ICT_01-2022_SUMMER")
    );
    assert!(stub.calls().is_empty());
}

// ── ensure_room ──────────────────────────────────────────────

#[tokio::test]
async fn missing_room_is_created_once() {
    let stub = StubTransport::new();
    stub.respond("GET", "groups.info", not_found_room())
        .respond(
            "GET",
            "groups.info",
            json!({"success": true, "group": {"_id": "R1"}}),
        )
        .respond(
            "POST",
            "groups.create",
            json!({"success": true, "group": {"_id": "R1", "name": "edx-IT_IS-ICT_01-2022_SUMMER"}}),
        );
    let chat = orchestrator(&stub, "student", false);

    let first = chat.ensure_room().await.expect("room created");
    assert_eq!(first.id(), Some("R1"));
    assert_eq!(first.raw()["group"]["name"], "edx-IT_IS-ICT_01-2022_SUMMER");

    let second = chat.ensure_room().await.expect("room found");
    assert_eq!(second.id(), Some("R1"));

    let creates = stub.calls_to("groups.create");
    assert_eq!(creates.len(), 1);
    assert_eq!(
        creates[0].body,
        Some(json!({"name": "edx-IT_IS-ICT_01-2022_SUMMER"}))
    );
}

#[tokio::test]
async fn existing_room_is_never_created() {
    let stub = StubTransport::new();
    stub.respond(
        "GET",
        "groups.info",
        json!({"success": true, "group": {"_id": "R9"}}),
    );
    let chat = orchestrator(&stub, "student", false);

    let room = chat.ensure_room().await.expect("room found");

    assert_eq!(room.id(), Some("R9"));
    assert!(stub.calls_to("groups.create").is_empty());
    assert_eq!(
        stub.calls_to("groups.info")[0].url,
        format!("{BASE_URL}/api/v1/groups.info?roomName=edx-IT_IS-ICT_01-2022_SUMMER")
    );
}

#[tokio::test]
async fn unreachable_server_does_not_trigger_room_creation() {
    let stub = StubTransport::new();
    stub.respond("GET", "groups.info", connection_error("connection refused"));
    let chat = orchestrator(&stub, "student", false);

    let err = chat.ensure_room().await.err().expect("connectivity failure");

    assert_eq!(err.kind(), ChatErrorKind::Connectivity);
    assert_eq!(err.message(), "An error occurred connecting to the server");
    assert!(stub.calls_to("groups.create").is_empty());
}

#[tokio::test]
async fn rejected_room_creation_forwards_remote_message() {
    let stub = StubTransport::new();
    stub.respond("GET", "groups.info", not_found_room()).respond(
        "POST",
        "groups.create",
        json!({"success": false, "error": "A room with that name already exists [error-duplicate-channel-name]"}),
    );
    let chat = orchestrator(&stub, "student", false);

    let err = chat.ensure_room().await.err().expect("creation rejected");

    assert_eq!(err.kind(), ChatErrorKind::Rejected);
    assert_eq!(
        err.message(),
        "A room with that name already exists [error-duplicate-channel-name]"
    );
}

// ── ensure_user ──────────────────────────────────────────────

#[tokio::test]
async fn missing_user_is_created_with_lower_cased_username() {
    let stub = StubTransport::new();
    stub.respond("GET", "users.info", not_found_user()).respond(
        "POST",
        "users.create",
        json!({"success": true, "user": {"_id": "U1", "username": "fi_last"}}),
    );
    let chat = orchestrator(&stub, "Fi_Last", false);

    let user = chat.ensure_user().await.expect("user created");
    assert_eq!(user.id(), Some("U1"));

    let lookup = &stub.calls_to("users.info")[0];
    assert_eq!(
        lookup.url,
        format!("{BASE_URL}/api/v1/users.info?username=fi_last")
    );

    let create = stub.calls_to("users.create");
    assert_eq!(create.len(), 1);
    let body = create[0].body.clone().expect("post body");
    assert_eq!(body["username"], "fi_last");
    assert_eq!(body["email"], "fi_last@example.org");
    assert_eq!(body["name"], "Fi Last");
    assert_eq!(body["active"], true);
    assert_eq!(body["verified"], true);
    assert_eq!(body["requirePasswordChange"], false);
    assert_eq!(body["sendWelcomeEmail"], false);

    let password = body["password"].as_str().expect("password string");
    assert_eq!(password.len(), 32);
    assert!(password.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn every_created_user_gets_a_fresh_password() {
    let stub = StubTransport::new();
    stub.respond(
        "POST",
        "users.create",
        json!({"success": true, "user": {"_id": "U1"}}),
    );
    let chat = orchestrator(&stub, "student", false);

    chat.create_user().await.expect("first create");
    chat.create_user().await.expect("second create");

    let passwords: Vec<_> = stub
        .calls_to("users.create")
        .into_iter()
        .map(|call| call.body.expect("body")["password"].clone())
        .collect();
    assert_eq!(passwords.len(), 2);
    assert_ne!(passwords[0], passwords[1]);
}

#[tokio::test]
async fn existing_user_is_never_created() {
    let stub = StubTransport::new();
    stub.respond(
        "GET",
        "users.info",
        json!({"success": true, "user": {"_id": "U7"}}),
    );
    let chat = orchestrator(&stub, "student", false);

    let user = chat.ensure_user().await.expect("user found");

    assert_eq!(user.id(), Some("U7"));
    assert!(stub.calls_to("users.create").is_empty());
}

// ── add_user_to_room ─────────────────────────────────────────

#[tokio::test]
async fn learners_are_only_invited() {
    let stub = StubTransport::new();
    stub.respond("POST", "groups.invite", json!({"success": true}));
    let chat = orchestrator(&stub, "student", false);

    chat.add_user_to_room("R1", "U1").await.expect("invited");

    let invites = stub.calls_to("groups.invite");
    assert_eq!(invites.len(), 1);
    assert_eq!(invites[0].body, Some(json!({"roomId": "R1", "userId": "U1"})));
    assert!(stub.calls_to("groups.addOwner").is_empty());
}

#[tokio::test]
async fn staff_are_made_owners() {
    let stub = StubTransport::new();
    stub.respond("POST", "groups.invite", json!({"success": true}))
        .respond("POST", "groups.addOwner", json!({"success": true}));
    let chat = orchestrator(&stub, "instructor", true);

    chat.add_user_to_room("R1", "U1").await.expect("invited");

    let grants = stub.calls_to("groups.addOwner");
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].body, Some(json!({"roomId": "R1", "userId": "U1"})));
}

#[tokio::test]
async fn failed_owner_grant_does_not_fail_the_invite() {
    let stub = StubTransport::new();
    stub.respond(
        "POST",
        "groups.invite",
        json!({"success": true, "group": {"_id": "R1"}}),
    )
    .respond(
        "POST",
        "groups.addOwner",
        json!({
            "success": false,
            "error": "User is already an owner [error-user-already-owner]",
            "errorType": "error-user-already-owner",
            "details": {"method": "addRoomOwner"},
        }),
    );
    let chat = orchestrator(&stub, "instructor", true);

    let membership = chat.add_user_to_room("R1", "U1").await.expect("invite result");

    assert_eq!(membership.raw(), &json!({"success": true, "group": {"_id": "R1"}}));
}

#[tokio::test]
async fn unreachable_owner_grant_is_ignored_too() {
    let stub = StubTransport::new();
    stub.respond("POST", "groups.invite", json!({"success": true}))
        .respond("POST", "groups.addOwner", connection_error("timed out"));
    let chat = orchestrator(&stub, "instructor", true);

    assert!(chat.add_user_to_room("R1", "U1").await.is_ok());
}

#[tokio::test]
async fn rejected_invite_is_an_error() {
    let stub = StubTransport::new();
    stub.respond(
        "POST",
        "groups.invite",
        json!({"success": false, "error": "error-not-allowed"}),
    );
    let chat = orchestrator(&stub, "instructor", true);

    let err = chat.add_user_to_room("R1", "U1").await.err().expect("invite rejected");

    assert_eq!(err.kind(), ChatErrorKind::Rejected);
    assert_eq!(err.message(), "error-not-allowed");
    assert!(stub.calls_to("groups.addOwner").is_empty());
}

// ── Unified failure shape ────────────────────────────────────

#[tokio::test]
async fn every_failure_keeps_its_payload_verbatim() {
    let failures = [
        (connection_error("dns error"), ChatErrorKind::Connectivity),
        (
            invalid_json(&format!("{BASE_URL}/api/v1/users.info?username=student")),
            ChatErrorKind::Connectivity,
        ),
        (
            json!({"success": false, "error": "Unauthorized", "errorType": "error-unauthorized"}),
            ChatErrorKind::Rejected,
        ),
        (json!({"unexpected": "shape"}), ChatErrorKind::Unrecognized),
    ];

    for (payload, kind) in failures {
        let stub = StubTransport::new();
        stub.respond("POST", "users.create", payload.clone());
        let chat = orchestrator(&stub, "student", false);

        let err = chat.create_user().await.err().expect("create fails");

        assert_eq!(err.kind(), kind, "payload {payload}");
        assert!(!err.message().is_empty());
        assert_eq!(err.payload(), &ErrorPayload::Json(payload.clone()));
        assert!(err.to_string().ends_with(&format!("\nError data: {payload}")));
    }
}

#[tokio::test]
async fn unknown_shape_uses_default_message() {
    let stub = StubTransport::new();
    stub.respond("GET", "users.info", json!({"ok": 1}));
    let chat = orchestrator(&stub, "student", false);

    let err = chat.ensure_user().await.err().expect("unrecognized");

    assert_eq!(err.kind(), ChatErrorKind::Unrecognized);
    assert_eq!(
        err.message(),
        "There was a unexpected error with the chat server."
    );
    assert!(stub.calls_to("users.create").is_empty());
}
