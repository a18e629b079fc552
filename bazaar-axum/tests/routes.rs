//! Router tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bazaar::{BazaarBuilder, ManualClock};
use serde_json::{Value, json};
use tower::ServiceExt;

const PASSWORD: &str = "Secr3t!pw";

async fn app() -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let bazaar = BazaarBuilder::new()
        .with_sqlite("sqlite::memory:")
        .await
        .expect("Failed to connect to SQLite")
        .with_clock(clock.clone())
        .apply_migrations(true)
        .build()
        .await
        .expect("Failed to build Bazaar");

    (bazaar_axum::routes(Arc::new(bazaar)), clock)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, _, body) = send_raw(app, method, uri, body).await;
    (status, body)
}

async fn send_raw(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, header::HeaderMap, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, headers, json)
}

async fn create_user(app: &Router, name: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/users",
        Some(json!({
            "name": name,
            "email": email,
            "password": PASSWORD,
            "password_confirm": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["user"].clone()
}

fn login_body(email: &str, password: &str) -> Option<Value> {
    Some(json!({ "email": email, "password": password }))
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_login_success() {
    let (app, _) = app().await;
    let user = create_user(&app, "Alice", "alice@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        login_body("alice@example.com", PASSWORD),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user["id"]);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["name"], "Alice");
}

#[tokio::test]
async fn test_login_lockout_sets_retry_after() {
    let (app, clock) = app().await;
    create_user(&app, "Alice", "alice@example.com").await;

    for _ in 0..5 {
        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            login_body("alice@example.com", "Wrong1!pw"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], 401);
    }

    let (status, headers, body) = send_raw(
        &app,
        "POST",
        "/auth/login",
        login_body("alice@example.com", PASSWORD),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 403);

    let retry_after: u64 = headers
        .get(header::RETRY_AFTER)
        .expect("Retry-After header")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=1800).contains(&retry_after));

    clock.advance(chrono::Duration::minutes(30));
    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        login_body("alice@example.com", PASSWORD),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_unknown_email_is_unauthorized() {
    let (app, _) = app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        login_body("nobody@example.com", PASSWORD),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_missing_fields_is_bad_request() {
    let (app, _) = app().await;
    let (status, body) = send(&app, "POST", "/auth/login", login_body("", "")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_user_crud() {
    let (app, _) = app().await;
    let user = create_user(&app, "Alice", "alice@example.com").await;
    let id = user["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "alice@example.com");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/users/{id}"),
        Some(json!({ "name": "Alice Smith", "email": "alice.smith@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Alice Smith");

    let (status, body) = send(&app, "DELETE", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, body) = send(&app, "GET", &format!("/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let (app, _) = app().await;
    create_user(&app, "Alice", "alice@example.com").await;

    let (status, body) = send(
        &app,
        "POST",
        "/users",
        Some(json!({
            "name": "Other Alice",
            "email": "alice@example.com",
            "password": PASSWORD,
            "password_confirm": PASSWORD,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 409);
}

#[tokio::test]
async fn test_invalid_user_is_bad_request() {
    let (app, _) = app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/users",
        Some(json!({
            "name": "Alice",
            "email": "not-an-email",
            "password": PASSWORD,
            "password_confirm": PASSWORD,
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_users_paging_and_sorting() {
    let (app, _) = app().await;
    for name in ["Carol", "Alice", "Bob"] {
        create_user(&app, name, &format!("{}@example.com", name.to_lowercase())).await;
    }

    let (status, body) = send(&app, "GET", "/users?page_size=2&sort=name:desc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["has_next_page"], true);
    assert_eq!(body["data"][0]["name"], "Carol");
    assert_eq!(body["data"][1]["name"], "Bob");

    let (status, body) = send(&app, "GET", "/users?search=name:ali", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["email"], "alice@example.com");

    let (status, _) = send(&app, "GET", "/users?sort=age", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/users?page_size=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_password() {
    let (app, _) = app().await;
    let user = create_user(&app, "Alice", "alice@example.com").await;
    let id = user["id"].as_str().unwrap().to_string();
    let uri = format!("/users/{id}/change-password");

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(json!({
            "password_old": "Wrong1!pw",
            "password_new": "N3w!secret",
            "password_confirm": "N3w!secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(json!({
            "password_old": PASSWORD,
            "password_new": "N3w!secret",
            "password_confirm": "Other1!pw",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(json!({
            "password_old": PASSWORD,
            "password_new": "N3w!secret",
            "password_confirm": "N3w!secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        login_body("alice@example.com", "N3w!secret"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_change_password_refused_while_locked() {
    let (app, _) = app().await;
    let user = create_user(&app, "Alice", "alice@example.com").await;
    let uri = format!("/users/{}/change-password", user["id"].as_str().unwrap());

    for _ in 0..5 {
        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            login_body("alice@example.com", "Wrong1!pw"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, headers, _) = send_raw(
        &app,
        "POST",
        &uri,
        Some(json!({
            "password_old": PASSWORD,
            "password_new": "N3w!secret",
            "password_confirm": "N3w!secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(headers.contains_key(header::RETRY_AFTER));

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        login_body("alice@example.com", "N3w!secret"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_purchase_crud() {
    let (app, _) = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/purchases",
        Some(json!({
            "product": "Coffee beans",
            "description": "1kg bag",
            "price": 18.5,
            "quantity": 2.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["purchase"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/purchases", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purchases"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/purchases/{id}"),
        Some(json!({ "price": 20.0, "quantity": 3.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purchase"]["price"], 20.0);
    assert_eq!(body["purchase"]["product"], "Coffee beans");

    let (status, _) = send(&app, "DELETE", &format!("/purchases/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/purchases/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/purchases/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_purchase_is_bad_request() {
    let (app, _) = app().await;
    let (status, _) = send(
        &app,
        "POST",
        "/purchases",
        Some(json!({
            "product": "",
            "description": "nothing",
            "price": 1.0,
            "quantity": 1.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/purchases",
        Some(json!({
            "product": "Tea",
            "description": "green",
            "price": -1.0,
            "quantity": 1.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
