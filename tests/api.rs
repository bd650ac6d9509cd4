use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use std::net::SocketAddr;
use tempfile::TempDir;
use tower::ServiceExt;

use portfolio_api::config::{parse_config, Config};
use portfolio_api::seed::{seed_database, SeedData};
use portfolio_api::server::{build_router, AppState};
use portfolio_api::{db, migrate};

const USERNAME: &str = "admin";
const PASSWORD: &str = "password123";

fn test_config(tmp: &TempDir, rate_limit: &str) -> Config {
    let content = format!(
        r#"[db]
path = "{}/data/portfolio.sqlite"

[server]
bind = "127.0.0.1:0"

[auth]
username = "{}"
password = "{}"

[rate_limit]
{}
"#,
        tmp.path().display(),
        USERNAME,
        PASSWORD,
        rate_limit
    );
    parse_config(&content).unwrap()
}

async fn setup_with(seeded: bool, writes_per_minute: u32) -> (TempDir, Router) {
    setup_rate_limited(
        seeded,
        &format!(
            "writes_per_minute = {}\nrequests_per_minute = 0\nrequests_per_second = 0",
            writes_per_minute
        ),
    )
    .await
}

async fn setup_rate_limited(seeded: bool, rate_limit: &str) -> (TempDir, Router) {
    let tmp = TempDir::new().unwrap();
    let cfg = test_config(&tmp, rate_limit);

    let pool = db::connect(&cfg).await.unwrap();
    migrate::apply_schema(&pool).await.unwrap();

    if seeded {
        let mut conn = pool.acquire().await.unwrap();
        seed_database(&mut conn, &SeedData::sample()).await.unwrap();
    }

    let state = AppState::new(pool, &cfg).unwrap();
    (tmp, build_router(state))
}

/// Seeded database, write limiter disabled.
async fn setup() -> (TempDir, Router) {
    setup_with(true, 0).await
}

fn basic_auth(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: &str,
    auth: Option<String>,
) -> Response {
    send_json_from(app, None, method, uri, body, auth).await
}

async fn send_json_from(
    app: &Router,
    peer: Option<&str>,
    method: &str,
    uri: &str,
    body: &str,
    auth: Option<String>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    if let Some(peer) = peer {
        let addr: SocketAddr = peer.parse().unwrap();
        builder = builder.extension(ConnectInfo(addr));
    }
    app.clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn item_titles(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap().to_string())
        .collect()
}

// ============ /health ============

#[tokio::test]
async fn test_health_check() {
    let (_tmp, app) = setup().await;

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({"status": "healthy"}));
}

// ============ /profile ============

#[tokio::test]
async fn test_get_profile_aggregates_everything() {
    let (_tmp, app) = setup().await;

    let response = get(&app, "/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;

    assert_eq!(data["name"], "Gaurav Kalyankar");
    assert_eq!(data["email"], "gauravkalyankar844@gmail.com");
    assert_eq!(data["skills"].as_array().unwrap().len(), 9);
    assert_eq!(data["skills"][0], "Python");
    assert_eq!(data["links"]["github"], "https://github.com/gauravkalyankare");
    assert_eq!(data["work_experience"].as_array().unwrap().len(), 2);

    let projects = data["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0]["title"], "E-commerce Analytics Dashboard");
    assert_eq!(projects[0]["links"]["live"], "https://ecom-dash.alexdoe.com");
    assert_eq!(
        projects[0]["skills"],
        serde_json::json!(["React", "Node.js", "MongoDB"])
    );
}

#[tokio::test]
async fn test_get_profile_not_found_on_empty_database() {
    let (_tmp, app) = setup_with(false, 0).await;

    let response = get(&app, "/profile").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Profile not found");
}

#[tokio::test]
async fn test_update_profile_unauthorized() {
    let (_tmp, app) = setup().await;

    let response = send_json(&app, "PUT", "/profile", r#"{"name": "New Name"}"#, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));

    // Nothing changed
    let data = body_json(get(&app, "/profile").await).await;
    assert_eq!(data["name"], "Gaurav Kalyankar");
}

#[tokio::test]
async fn test_update_profile_wrong_password() {
    let (_tmp, app) = setup().await;

    let response = send_json(
        &app,
        "PUT",
        "/profile",
        r#"{"name": "New Name"}"#,
        Some(basic_auth(USERNAME, "wrong")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile_authorized() {
    let (_tmp, app) = setup().await;

    let response = send_json(
        &app,
        "PUT",
        "/profile",
        r#"{"name": "Gaurav K."}"#,
        Some(basic_auth(USERNAME, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;
    assert_eq!(data["status"], "success");
    assert_eq!(data["message"], "Profile name updated to Gaurav K.");

    let profile = body_json(get(&app, "/profile").await).await;
    assert_eq!(profile["name"], "Gaurav K.");
    // Fields not supplied are left alone
    assert_eq!(profile["email"], "gauravkalyankar844@gmail.com");
}

#[tokio::test]
async fn test_update_profile_changes_supplied_fields_only() {
    let (_tmp, app) = setup().await;

    let response = send_json(
        &app,
        "PUT",
        "/profile",
        r#"{"name": "N", "email": "e@x"}"#,
        Some(basic_auth(USERNAME, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile = body_json(get(&app, "/profile").await).await;
    assert_eq!(profile["name"], "N");
    assert_eq!(profile["email"], "e@x");
    assert_eq!(profile["education"], "B.Tech in Information Technology");
}

#[tokio::test]
async fn test_update_profile_rejects_blank_optional_field() {
    let (_tmp, app) = setup().await;

    let response = send_json(
        &app,
        "PUT",
        "/profile",
        r#"{"name": "N", "education": "  "}"#,
        Some(basic_auth(USERNAME, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("education"));

    let profile = body_json(get(&app, "/profile").await).await;
    assert_eq!(profile["name"], "Gaurav Kalyankar");
    assert_eq!(profile["education"], "B.Tech in Information Technology");
}

#[tokio::test]
async fn test_update_profile_requires_name() {
    let (_tmp, app) = setup().await;

    let response = send_json(
        &app,
        "PUT",
        "/profile",
        r#"{"email": "new@example.com"}"#,
        Some(basic_auth(USERNAME, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .contains("name"));
}

#[tokio::test]
async fn test_update_profile_without_row_is_not_found() {
    let (_tmp, app) = setup_with(false, 0).await;

    let response = send_json(
        &app,
        "PUT",
        "/profile",
        r#"{"name": "Nobody"}"#,
        Some(basic_auth(USERNAME, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_replace_profile() {
    let (_tmp, app) = setup().await;

    let response = send_json(
        &app,
        "POST",
        "/profile",
        r#"{"name": "X", "email": "x@example.com", "education": "PhD"}"#,
        Some(basic_auth(USERNAME, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"status": "success", "message": "Profile created"})
    );

    let profile = body_json(get(&app, "/profile").await).await;
    assert_eq!(profile["name"], "X");
    assert_eq!(profile["email"], "x@example.com");
    assert_eq!(profile["education"], "PhD");
    // Related collections are untouched by a profile replace
    assert_eq!(profile["projects"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_replace_profile_on_empty_database() {
    let (_tmp, app) = setup_with(false, 0).await;

    let response = send_json(
        &app,
        "POST",
        "/profile",
        r#"{"name": "X", "email": "x@example.com", "education": "BSc"}"#,
        Some(basic_auth(USERNAME, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(&app, "/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    let profile = body_json(response).await;
    assert_eq!(profile["name"], "X");
    assert_eq!(profile["skills"], serde_json::json!([]));
    assert_eq!(profile["work_experience"], serde_json::json!([]));
}

#[tokio::test]
async fn test_replace_profile_missing_fields() {
    let (_tmp, app) = setup().await;

    let response = send_json(
        &app,
        "POST",
        "/profile",
        r#"{"name": "X", "education": "  "}"#,
        Some(basic_auth(USERNAME, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await["error"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(error.contains("email"));
    assert!(error.contains("education"));
    assert!(!error.contains("name"));
}

#[tokio::test]
async fn test_replace_profile_requires_auth() {
    let (_tmp, app) = setup().await;

    let response = send_json(
        &app,
        "POST",
        "/profile",
        r#"{"name": "X", "email": "x@example.com", "education": "PhD"}"#,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let (_tmp, app) = setup().await;

    let response = send_json(
        &app,
        "PUT",
        "/profile",
        "{not json",
        Some(basic_auth(USERNAME, PASSWORD)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_write_rate_limit() {
    let (_tmp, app) = setup_with(true, 2).await;
    let auth = basic_auth(USERNAME, PASSWORD);

    for name in ["A", "B"] {
        let body = format!(r#"{{"name": "{}"}}"#, name);
        let response = send_json(&app, "PUT", "/profile", &body, Some(auth.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send_json(&app, "PUT", "/profile", r#"{"name": "C"}"#, Some(auth)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    // Reads do not draw from the write quota
    let response = get(&app, "/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "B");
}

#[tokio::test]
async fn test_write_rate_limit_is_per_client() {
    let (_tmp, app) = setup_with(true, 1).await;
    let auth = basic_auth(USERNAME, PASSWORD);
    let body = r#"{"name": "A"}"#;

    let first = "10.0.0.1:5000";
    let second = "10.0.0.2:5000";

    let response =
        send_json_from(&app, Some(first), "PUT", "/profile", body, Some(auth.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response =
        send_json_from(&app, Some(first), "PUT", "/profile", body, Some(auth.clone())).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response =
        send_json_from(&app, Some(second), "PUT", "/profile", body, Some(auth)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_default_request_limit_applies_to_every_route() {
    let (_tmp, app) = setup_rate_limited(
        true,
        "writes_per_minute = 0\nrequests_per_minute = 200\nrequests_per_second = 2",
    )
    .await;

    assert_eq!(get(&app, "/health").await.status(), StatusCode::OK);
    assert_eq!(get(&app, "/skills/top").await.status(), StatusCode::OK);

    let response = get(&app, "/profile").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert!(body_json(response).await["error"].is_string());
}

// ============ /projects ============

#[tokio::test]
async fn test_get_projects_paginated() {
    let (_tmp, app) = setup().await;

    let response = get(&app, "/projects?page=1&per_page=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;
    assert_eq!(data["page"], 1);
    assert_eq!(data["per_page"], 1);
    assert_eq!(data["total_pages"], 2);
    assert_eq!(data["total_items"], 2);
    assert_eq!(item_titles(&data), vec!["E-commerce Analytics Dashboard"]);

    let data = body_json(get(&app, "/projects?page=2&per_page=1").await).await;
    assert_eq!(item_titles(&data), vec!["Flask API for IoT Devices"]);
}

#[tokio::test]
async fn test_get_projects_out_of_range_page_is_empty() {
    let (_tmp, app) = setup().await;

    let response = get(&app, "/projects?page=3&per_page=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;
    assert_eq!(data["items"].as_array().unwrap().len(), 0);
    assert_eq!(data["total_pages"], 2);
}

#[tokio::test]
async fn test_get_projects_defaults() {
    let (_tmp, app) = setup().await;

    let data = body_json(get(&app, "/projects").await).await;
    assert_eq!(data["page"], 1);
    assert_eq!(data["per_page"], 5);
    assert_eq!(data["total_pages"], 1);
    assert_eq!(data["items"].as_array().unwrap().len(), 2);
    assert_eq!(
        data["items"][1]["skills"],
        serde_json::json!(["Python", "Flask", "PostgreSQL", "Docker", "AWS"])
    );
}

#[tokio::test]
async fn test_get_projects_invalid_params() {
    let (_tmp, app) = setup().await;

    assert_eq!(
        get(&app, "/projects?page=0").await.status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        get(&app, "/projects?per_page=0").await.status(),
        StatusCode::BAD_REQUEST
    );
    let response = get(&app, "/projects?page=abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_filter_projects_by_skill() {
    let (_tmp, app) = setup().await;

    let data = body_json(get(&app, "/projects?skill=react").await).await;
    assert_eq!(data["total_items"], 1);
    assert_eq!(item_titles(&data), vec!["E-commerce Analytics Dashboard"]);

    let data = body_json(get(&app, "/projects?skill=FLASK").await).await;
    assert_eq!(item_titles(&data), vec!["Flask API for IoT Devices"]);

    let data = body_json(get(&app, "/projects?skill=cobol").await).await;
    assert_eq!(data["total_items"], 0);
    assert_eq!(data["total_pages"], 0);
}

#[tokio::test]
async fn test_filter_projects_no_duplicates() {
    let (_tmp, app) = setup().await;

    // "o" matches Node.js and MongoDB on the first project and Python,
    // PostgreSQL and Docker on the second.
    let data = body_json(get(&app, "/projects?skill=o").await).await;
    assert_eq!(data["total_items"], 2);
    assert_eq!(
        item_titles(&data),
        vec!["E-commerce Analytics Dashboard", "Flask API for IoT Devices"]
    );
}

#[tokio::test]
async fn test_filter_projects_wildcards_are_literal() {
    let (_tmp, app) = setup().await;

    let data = body_json(get(&app, "/projects?skill=%25").await).await;
    assert_eq!(data["total_items"], 0);
}

// ============ /skills/top ============

#[tokio::test]
async fn test_top_skills() {
    let (_tmp, app) = setup().await;

    let response = get(&app, "/skills/top").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!(["Python", "JavaScript", "React", "Node.js", "Flask"])
    );
}

// ============ /search ============

#[tokio::test]
async fn test_search_requires_query() {
    let (_tmp, app) = setup().await;

    let response = get(&app, "/search").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Query parameter 'q' is required"
    );

    let response = get(&app, "/search?q=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_malformed_query_is_json_error() {
    let (_tmp, app) = setup().await;

    let response = get(&app, "/search?q=a&q=b").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn test_search_matches_project_title() {
    let (_tmp, app) = setup().await;

    let response = get(&app, "/search?q=dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;

    let projects = data["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["title"], "E-commerce Analytics Dashboard");
    assert_eq!(data["work_experience"], serde_json::json!([]));
}

#[tokio::test]
async fn test_search_matches_work_role() {
    let (_tmp, app) = setup().await;

    let data = body_json(get(&app, "/search?q=Full-Stack").await).await;
    assert_eq!(data["projects"], serde_json::json!([]));
    let work = data["work_experience"].as_array().unwrap();
    assert_eq!(work.len(), 1);
    assert_eq!(work[0]["company"], "Web Crafters LLC");
}

#[tokio::test]
async fn test_search_collections_are_independent() {
    let (_tmp, app) = setup().await;

    let data = body_json(get(&app, "/search?q=cloud").await).await;
    assert_eq!(data["projects"].as_array().unwrap().len(), 0);
    assert_eq!(data["work_experience"].as_array().unwrap().len(), 1);

    let data = body_json(get(&app, "/search?q=docker").await).await;
    assert_eq!(data["projects"].as_array().unwrap().len(), 1);
    assert_eq!(data["work_experience"].as_array().unwrap().len(), 0);
}
