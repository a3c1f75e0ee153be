//! API integration tests.
//!
//! Drive the full router against a migrated in-memory database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
use votebox_api::{AppState, app};
use votebox_common::config::AuthConfig;
use votebox_core::TokenService;
use votebox_db::test_utils::TestDatabase;

struct TestApp {
    router: Router,
    _db: TestDatabase,
}

impl TestApp {
    async fn new() -> Self {
        let db = TestDatabase::new().await.unwrap();
        let tokens = TokenService::new(&AuthConfig {
            jwt_secret: "integration-secret".to_string(),
            token_ttl_hours: 24,
        })
        .unwrap();
        let router = app(AppState::new(db.connection(), tokens));
        Self { router, _db: db }
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn signup(&self, username: &str) -> String {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "correct horse",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_poll(&self, token: &str, title: &str, options: &[&str]) -> Value {
        let (status, body) = self
            .request(
                "POST",
                "/api/polls",
                Some(token),
                Some(json!({ "title": title, "options": options })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn option_id(poll: &Value, index: usize) -> i64 {
    poll["options"][index]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_signup_login_me() {
    let app = TestApp::new().await;
    let token = app.signup("alice").await;

    let (status, me) = app.request("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");
    assert_eq!(me["email"], "alice@example.com");
    assert!(me.get("password_hash").is_none());

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], me["id"]);

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = TestApp::new().await;
    app.signup("alice").await;

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "another one",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_requires_bearer_token() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/api/polls", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let (status, _) = app
        .request("GET", "/api/polls", Some("forged.token.value"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_poll_lifecycle_and_vote_change() {
    let app = TestApp::new().await;
    let owner = app.signup("owner").await;
    let voter = app.signup("voter").await;

    let poll = app.create_poll(&owner, "Lunch?", &["Pizza", "Sushi"]).await;
    assert_eq!(poll["description"], "");
    assert!(poll.get("user_voted_option_id").is_none());
    assert_eq!(poll["poll_edited_after_vote"], false);
    let id = poll["id"].as_i64().unwrap();
    let (pizza, sushi) = (option_id(&poll, 0), option_id(&poll, 1));

    let (status, view) = app
        .request(
            "POST",
            &format!("/api/polls/{id}/vote"),
            Some(&voter),
            Some(json!({ "option_id": pizza })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["user_voted_option_id"], pizza);
    assert_eq!(view["options"][0]["vote_count"], 1);

    let (_, count) = app
        .request("GET", "/api/notifications/unread-count", Some(&owner), None)
        .await;
    assert_eq!(count, json!({ "count": 0 }));

    let (status, view) = app
        .request(
            "POST",
            &format!("/api/polls/{id}/vote"),
            Some(&voter),
            Some(json!({ "option_id": sushi })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["options"][0]["vote_count"], 0);
    assert_eq!(view["options"][1]["vote_count"], 1);

    let (status, inbox) = app
        .request("GET", "/api/notifications", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox.as_array().unwrap().len(), 1);
    assert_eq!(
        inbox[0]["message"],
        r#"voter changed their vote on "Lunch?" from "Pizza" to "Sushi""#
    );
    assert_eq!(inbox[0]["type"], "vote_changed");
    assert_eq!(inbox[0]["poll_id"], id);
    assert_eq!(inbox[0]["read"], false);

    let notification_id = inbox[0]["id"].as_i64().unwrap();
    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/notifications/{notification_id}/read"),
            Some(&voter),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/notifications/{notification_id}/read"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, _) = app
        .request("PUT", "/api/notifications/read-all", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, voters) = app
        .request("GET", &format!("/api/options/{sushi}/voters"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(voters[0]["username"], "voter");

    let (status, view) = app
        .request("DELETE", &format!("/api/polls/{id}/vote"), Some(&voter), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(view.get("user_voted_option_id").is_none());

    let (status, body) = app
        .request("DELETE", &format!("/api/polls/{id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = app
        .request("GET", &format!("/api/polls/{id}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_flags_earlier_votes() {
    let app = TestApp::new().await;
    let owner = app.signup("owner").await;
    let voter = app.signup("voter").await;
    let poll = app.create_poll(&owner, "Lunch?", &["Pizza", "Sushi"]).await;
    let id = poll["id"].as_i64().unwrap();

    app.request(
        "POST",
        &format!("/api/polls/{id}/vote"),
        Some(&voter),
        Some(json!({ "option_id": option_id(&poll, 0) })),
    )
    .await;

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/polls/{id}"),
            Some(&owner),
            Some(json!({
                "title": "Dinner?",
                "description": "Plans changed",
                "options": [
                    { "id": option_id(&poll, 0), "text": "Pizza" },
                    { "id": option_id(&poll, 1), "text": "Sushi" },
                ],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, seen) = app
        .request("GET", &format!("/api/polls/{id}"), Some(&voter), None)
        .await;
    assert_eq!(seen["title"], "Dinner?");
    assert_eq!(seen["description"], "Plans changed");
    assert_eq!(seen["poll_edited_after_vote"], true);
}

#[tokio::test]
async fn test_non_owner_edit_is_forbidden() {
    let app = TestApp::new().await;
    let owner = app.signup("owner").await;
    let other = app.signup("other").await;
    let poll = app.create_poll(&owner, "Lunch?", &["Pizza", "Sushi"]).await;
    let id = poll["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            "PUT",
            &format!("/api/polls/{id}"),
            Some(&other),
            Some(json!({
                "title": "Mine now",
                "options": [{ "text": "X" }, { "text": "Y" }],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "You can only edit your own polls" }));

    let (status, _) = app
        .request(
            "PUT",
            &format!("/api/polls/{id}"),
            Some(&other),
            Some(json!({ "title": "", "options": [{ "text": "X" }] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request("DELETE", &format!("/api/polls/{id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, unchanged) = app
        .request("GET", &format!("/api/polls/{id}"), Some(&owner), None)
        .await;
    assert_eq!(unchanged, poll);
}

#[tokio::test]
async fn test_bad_requests() {
    let app = TestApp::new().await;
    let token = app.signup("alice").await;
    let poll = app.create_poll(&token, "Lunch?", &["Pizza", "Sushi"]).await;
    let id = poll["id"].as_i64().unwrap();

    let (status, body) = app
        .request(
            "POST",
            "/api/polls",
            Some(&token),
            Some(json!({ "title": "Only one", "options": ["A"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app
        .request("GET", "/api/polls/not-a-number", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app
        .request(
            "POST",
            &format!("/api/polls/{id}/vote"),
            Some(&token),
            Some(json!({ "choice": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app
        .request(
            "POST",
            &format!("/api/polls/{id}/vote"),
            Some(&token),
            Some(json!({ "option_id": 987_654 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid option for this poll" }));

    let (status, _) = app
        .request(
            "POST",
            "/api/polls/987654/vote",
            Some(&token),
            Some(json!({ "option_id": option_id(&poll, 0) })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_option_has_no_voters() {
    let app = TestApp::new().await;
    let token = app.signup("alice").await;

    let (status, voters) = app
        .request("GET", "/api/options/987654/voters", Some(&token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(voters, json!([]));
}

#[tokio::test]
async fn test_list_polls_newest_first() {
    let app = TestApp::new().await;
    let token = app.signup("alice").await;
    let first = app.create_poll(&token, "First", &["A", "B"]).await;
    let second = app.create_poll(&token, "Second", &["C", "D"]).await;

    let (status, list) = app.request("GET", "/api/polls", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = list.as_array().unwrap().iter().map(|p| p["id"].clone()).collect();
    assert_eq!(ids, [second["id"].clone(), first["id"].clone()]);
}
