//! Shared harness for API integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use mediguard_api::{AppState, build_router};
use mediguard_auth::db::memory_pool;
use mediguard_auth::test_utils::test_service;
use mediguard_auth::{LocalUserStore, UserStore};
use mediguard_care::{Care, CareOptions, LogDispatcher};
use serde_json::{Value, json};
use tower::ServiceExt;

pub async fn test_app() -> Router {
    let pool = memory_pool().await.unwrap();
    let store = LocalUserStore::new(pool.clone()).await.unwrap();
    let credentials = Arc::new(test_service(store.clone()));
    let users: Arc<dyn UserStore> = Arc::new(store);
    let care = Care::new(pool, users, Arc::new(LogDispatcher), CareOptions::default())
        .await
        .unwrap();

    build_router(AppState::new(credentials, care))
}

pub fn signup_body(user_id: &str) -> Value {
    json!({
        "user_id": user_id,
        "password": "Secret1!",
        "display_name": format!("{} display", user_id),
        "guardian_contact": "guardian@example.com",
        "birth_date": "19450815",
        "lunar_birth": false,
        "sex": "female",
        "is_elderly": true
    })
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
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

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, response_json(response).await)
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(json!({}))
}

/// Register `user_id` and return a login token
pub async fn signup_and_login(app: &Router, user_id: &str) -> String {
    let (status, _) = send(
        app,
        Method::POST,
        "/api/users/signup",
        None,
        Some(signup_body(user_id)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({ "user_id": user_id, "password": "Secret1!" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}
