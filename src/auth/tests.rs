use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;

use crate::auth::models::{NewUser, UserUpdate};
use crate::auth::{AuthError, IdentityClient};
use crate::core::transport::Transport;
use crate::credentials::token::TokenManager;
use crate::credentials::{Credentials, EmulatorHosts};

fn test_transport() -> Transport {
    let credentials = Credentials {
        project_id: "test-project".to_string(),
        storage_bucket: "test-project.appspot.com".to_string(),
        key: None,
        emulator: EmulatorHosts {
            firestore: None,
            auth: Some("127.0.0.1:1".to_string()),
        },
    };
    Transport::new(Arc::new(TokenManager::new(&credentials)))
}

fn test_client(server: &MockServer) -> IdentityClient {
    IdentityClient::new_with_url(test_transport(), "test-project", server.url("/v1"))
}

#[tokio::test]
async fn session_token_lookup_resolves_the_caller() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:lookup")
            .header("authorization", "Bearer owner")
            .json_body(json!({
                "targetProjectId": "test-project",
                "idToken": "session-abc"
            }));
        then.status(200).json_body(json!({
            "users": [{
                "localId": "uid-1",
                "email": "jkowalski@example.com",
                "displayName": "J. Kowalski",
                "createdAt": "1700000000000"
            }]
        }));
    });

    let user = test_client(&server)
        .lookup_by_session_token("session-abc")
        .await
        .unwrap();

    assert_eq!(user.local_id, "uid-1");
    assert_eq!(user.email.as_deref(), Some("jkowalski@example.com"));
    assert_eq!(user.created_at.unwrap().timestamp_millis(), 1_700_000_000_000);
    mock.assert();
}

#[tokio::test]
async fn rejected_session_token_is_unauthorized() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/accounts:lookup");
        then.status(400).json_body(json!({
            "error": { "code": 400, "message": "INVALID_ID_TOKEN", "status": "INVALID_ARGUMENT" }
        }));
    });

    let err = test_client(&server)
        .lookup_by_session_token("garbage")
        .await
        .unwrap_err();

    match err {
        AuthError::Unauthorized(message) => assert!(message.contains("INVALID_ID_TOKEN")),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

#[tokio::test]
async fn unknown_session_token_with_empty_user_list_is_unauthorized() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/accounts:lookup");
        then.status(200).json_body(json!({ "users": [] }));
    });

    let err = test_client(&server)
        .lookup_by_session_token("orphaned")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized(_)));
}

#[tokio::test]
async fn lookup_by_local_id_maps_missing_user() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:lookup")
            .json_body(json!({
                "targetProjectId": "test-project",
                "localId": ["uid-9"]
            }));
        then.status(200).json_body(json!({}));
    });

    let err = test_client(&server)
        .lookup_by_local_id("uid-9")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound));
}

#[tokio::test]
async fn list_all_users_walks_every_page() {
    let server = MockServer::start();

    let page1 = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:query")
            .json_body(json!({ "targetProjectId": "test-project" }));
        then.status(200).json_body(json!({
            "userInfo": [{ "localId": "u1" }, { "localId": "u2" }],
            "nextPageToken": "page-2"
        }));
    });
    let page2 = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:query")
            .json_body(json!({ "targetProjectId": "test-project", "pageToken": "page-2" }));
        then.status(200).json_body(json!({
            "userInfo": [{ "localId": "u3" }],
            "nextPageToken": "page-3"
        }));
    });
    let page3 = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:query")
            .json_body(json!({ "targetProjectId": "test-project", "pageToken": "page-3" }));
        then.status(200).json_body(json!({
            "userInfo": [{ "localId": "u4" }]
        }));
    });

    let users = test_client(&server).list_all_users().await.unwrap();

    let ids: Vec<&str> = users.iter().map(|u| u.local_id.as_str()).collect();
    assert_eq!(ids, ["u1", "u2", "u3", "u4"]);
    page1.assert();
    page2.assert();
    page3.assert();
}

#[tokio::test]
async fn create_user_returns_the_assigned_local_id() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:signUp")
            .json_body(json!({
                "targetProjectId": "test-project",
                "email": "new@example.com",
                "password": "s3cret!",
                "displayName": "New Officer"
            }));
        then.status(200).json_body(json!({
            "localId": "uid-new",
            "email": "new@example.com"
        }));
    });

    let local_id = test_client(&server)
        .create_user(NewUser {
            email: "new@example.com".to_string(),
            password: "s3cret!".to_string(),
            display_name: Some("New Officer".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(local_id, "uid-new");
    mock.assert();
}

#[tokio::test]
async fn update_user_sends_only_supplied_fields() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:update")
            // Exact body: no password or email key may appear.
            .json_body(json!({
                "targetProjectId": "test-project",
                "localId": "uid-1",
                "displayName": "Renamed"
            }));
        then.status(200).json_body(json!({ "localId": "uid-1" }));
    });

    test_client(&server)
        .update_user(UserUpdate {
            local_id: "uid-1".to_string(),
            display_name: Some("Renamed".to_string()),
            ..UserUpdate::default()
        })
        .await
        .unwrap();
    mock.assert();
}

#[tokio::test]
async fn delete_user_posts_the_local_id() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/accounts:delete")
            .json_body(json!({
                "targetProjectId": "test-project",
                "localId": "uid-1"
            }));
        then.status(200).json_body(json!({}));
    });

    test_client(&server).delete_user("uid-1").await.unwrap();
    mock.assert();
}
