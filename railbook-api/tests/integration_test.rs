use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use railbook_api::{
    app,
    metrics::Metrics,
    seed::demo_trains,
    state::{AppState, AuthConfig},
};
use railbook_core::{Allocator, InMemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "integration-secret";

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::with_trains(demo_trains()));
        let state = AppState::new(
            store.clone(),
            store.clone(),
            Arc::new(Allocator::seeded(7)),
            AuthConfig {
                secret: SECRET.to_string(),
                audience: None,
            },
            Arc::new(Metrics::new().unwrap()),
        );
        Self {
            router: app(state),
            store,
        }
    }

    async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    async fn train_id(&self, number: &str) -> String {
        let (_, body) = self.send(Method::GET, "/v1/trains", None, None).await;
        body["trains"]
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["train_number"] == number)
            .map(|t| t["id"].as_str().unwrap().to_string())
            .unwrap()
    }
}

fn token_for(user_id: Uuid, email: &str) -> String {
    let claims = json!({
        "sub": user_id,
        "email": email,
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn booking_body(train_id: &str, name: &str) -> Value {
    json!({
        "train_id": train_id,
        "journey_date": "2025-03-14",
        "passenger": { "name": name, "age": 34, "email": "asha@example.com" }
    })
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_echoes_query() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::GET, "/v1/trains?from=delhi&to=MUMBAI&date=2025-03-14", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from"], "delhi");
    assert_eq!(body["date"], "2025-03-14");
    let trains = body["trains"].as_array().unwrap();
    assert_eq!(trains.len(), 1);
    assert_eq!(trains[0]["train_number"], "12951");
}

#[tokio::test]
async fn test_unknown_train_is_404() {
    let app = TestApp::new();
    let (status, body) = app
        .send(Method::GET, &format!("/v1/trains/{}", Uuid::new_v4()), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_session_prefills_email() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let token = token_for(user, "asha@example.com");

    let (status, body) = app.send(Method::GET, "/v1/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], user.to_string());
    assert_eq!(body["passenger"]["email"], "asha@example.com");
    assert_eq!(body["passenger"]["name"], "");
}

#[tokio::test]
async fn test_anonymous_and_bad_tokens_are_401() {
    let app = TestApp::new();
    let train_id = app.train_id("12951").await;

    let (status, body) = app
        .send(Method::POST, "/v1/bookings", None, Some(booking_body(&train_id, "Asha Verma")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Sign in required");

    let (status, _) = app.send(Method::GET, "/v1/bookings", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_book_list_cancel_flow() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let token = token_for(user, "asha@example.com");
    let train_id = app.train_id("12951").await;

    let (status, booking) = app
        .send(Method::POST, "/v1/bookings", Some(&token), Some(booking_body(&train_id, "  Asha Verma ")))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booking["passenger_name"], "Asha Verma");
    assert_eq!(booking["total_amount"], "3045.00");
    assert_eq!(booking["booking_status"], "confirmed");
    assert!(booking["booking_reference"].as_str().unwrap().starts_with("RB"));

    let (status, listing) = app.send(Method::GET, "/v1/bookings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let listing = listing.as_array().unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["train"]["train_name"], "Mumbai Rajdhani Express");

    // another user sees nothing and cannot cancel it
    let other = token_for(Uuid::new_v4(), "ravi@example.com");
    let (_, theirs) = app.send(Method::GET, "/v1/bookings", Some(&other), None).await;
    assert!(theirs.as_array().unwrap().is_empty());
    let id = booking["id"].as_str().unwrap();
    app.send(Method::DELETE, &format!("/v1/bookings/{}", id), Some(&other), None)
        .await;
    let (_, still) = app.send(Method::GET, "/v1/bookings", Some(&token), None).await;
    assert_eq!(still.as_array().unwrap().len(), 1);

    let (status, remaining) = app
        .send(Method::DELETE, &format!("/v1/bookings/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(remaining.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_passenger_is_400_and_nothing_stored() {
    let app = TestApp::new();
    let token = token_for(Uuid::new_v4(), "asha@example.com");
    let train_id = app.train_id("12951").await;

    let (status, body) = app
        .send(Method::POST, "/v1/bookings", Some(&token), Some(booking_body(&train_id, "A")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name must be at least 2 characters");

    let (_, listing) = app.send(Method::GET, "/v1/bookings", Some(&token), None).await;
    assert!(listing.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sold_out_checked_before_validation() {
    let app = TestApp::new();
    let token = token_for(Uuid::new_v4(), "asha@example.com");
    let train_id = app.train_id("12953").await;

    let (status, body) = app
        .send(Method::POST, &format!("/v1/trains/{}/select", train_id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "No seats available");

    let (status, _) = app
        .send(Method::POST, "/v1/bookings", Some(&token), Some(booking_body(&train_id, "A")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_store_outage_messages() {
    let app = TestApp::new();
    let token = token_for(Uuid::new_v4(), "asha@example.com");
    let train_id = app.train_id("12951").await;
    app.store.set_offline(true);

    let (status, body) = app.send(Method::GET, "/v1/bookings", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal Server Error");

    let (status, body) = app
        .send(Method::POST, "/v1/bookings", Some(&token), Some(booking_body(&train_id, "Asha Verma")))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "data store unavailable");
}

#[tokio::test]
async fn test_metrics_exposed() {
    let app = TestApp::new();
    app.send(Method::GET, "/v1/trains?from=Delhi", None, None).await;

    let (status, body) = app.send(Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("railbook_train_searches_total 1"));
}

#[tokio::test]
async fn test_cancel_counter_only_counts_removals() {
    let app = TestApp::new();
    let token = token_for(Uuid::new_v4(), "asha@example.com");
    let train_id = app.train_id("12951").await;

    let (status, _) = app
        .send(Method::DELETE, &format!("/v1/bookings/{}", Uuid::new_v4()), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.send(Method::GET, "/metrics", None, None).await;
    assert!(body.as_str().unwrap().contains("railbook_bookings_cancelled_total 0"));

    let (_, booking) = app
        .send(Method::POST, "/v1/bookings", Some(&token), Some(booking_body(&train_id, "Asha Verma")))
        .await;
    let id = booking["id"].as_str().unwrap();
    app.send(Method::DELETE, &format!("/v1/bookings/{}", id), Some(&token), None)
        .await;

    let (_, body) = app.send(Method::GET, "/metrics", None, None).await;
    assert!(body.as_str().unwrap().contains("railbook_bookings_cancelled_total 1"));
}
