//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers); adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/puzzle", post(http::http_post_puzzle))
        .route("/api/v1/categories", get(http::http_get_categories))
        .route(
            "/api/v1/leaderboard",
            get(http::http_get_leaderboard).post(http::http_post_leaderboard),
        )
        .route("/api/v1/leaderboard/best", get(http::http_get_player_best))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::streak::MemoryLocalStore;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(Arc::new(AppState::offline(Arc::new(MemoryLocalStore::new()))))
    }

    async fn call(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_backends() {
        let (status, v) = call(app(), get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(v["ok"], true);
        assert_eq!(v["imageProvider"], false);
        assert_eq!(v["store"], "memory");
    }

    #[tokio::test]
    async fn puzzle_without_provider_is_unavailable() {
        let (status, v) = call(app(), post_json("/api/v1/puzzle", r#"{"category":"Nope","difficulty":"easy"}"#)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(v["error"].is_string());
        assert!(v["details"].is_string());
    }

    #[tokio::test]
    async fn puzzle_for_a_future_date_is_a_bad_request() {
        let tomorrow = chrono::Utc::now().date_naive() + chrono::Days::new(2);
        let body = format!(r#"{{"category":null,"difficulty":null,"date":"{tomorrow}"}}"#);
        let (status, v) = call(app(), post_json("/api/v1/puzzle", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(v["error"], "Invalid date");
    }

    #[tokio::test]
    async fn categories_follow_difficulty() {
        let (_, easy) = call(app(), get("/api/v1/categories?difficulty=easy")).await;
        let (_, regular) = call(app(), get("/api/v1/categories")).await;
        assert_eq!(easy["difficulty"], "easy");
        assert_eq!(regular["difficulty"], "regular");
        assert_eq!(easy["random"], "Surprise Me!");
        let easy_list = easy["categories"].as_array().unwrap();
        assert!(easy_list.contains(&Value::from("Animals & Nature")));
        assert!(!easy_list.contains(&Value::from("Food & Drinks")));
        assert!(easy_list.contains(&Value::from("Famous People")));
        let regular_list = regular["categories"].as_array().unwrap();
        assert!(regular_list.contains(&Value::from("Food & Drinks")));
        assert!(regular_list.contains(&Value::from("Everyday Objects")));
        assert!(!regular_list.contains(&Value::from("Famous People")));
    }

    #[tokio::test]
    async fn leaderboard_round_trip() {
        let app = app();
        for (name, streak) in [("ann", 3), ("bob", 8), ("cy", 5)] {
            let body = format!(r#"{{"name":"{name}","streak":{streak}}}"#);
            let (status, _) = call(app.clone(), post_json("/api/v1/leaderboard", &body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, v) = call(app.clone(), get("/api/v1/leaderboard?limit=2")).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = v["entries"].as_array().unwrap().iter().map(|e| e["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["bob", "cy"]);

        let (_, v) = call(app.clone(), get("/api/v1/leaderboard?limit=2&offset=2")).await;
        let names: Vec<&str> = v["entries"].as_array().unwrap().iter().map(|e| e["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["ann"]);

        let (_, v) = call(app.clone(), get("/api/v1/leaderboard/best?name=cy")).await;
        assert_eq!(v["best"], 5);
        let (_, v) = call(app.clone(), get("/api/v1/leaderboard/best?name=zed")).await;
        assert!(v["best"].is_null());

        let (status, _) = call(app.clone(), post_json("/api/v1/leaderboard", r#"{"name":"  ","streak":2}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(app, post_json("/api/v1/leaderboard", r#"{"name":"dee","streak":0}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
