use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use rollcall::config::Config;
use rollcall::db::conversations::Conversation;
use rollcall::service::chat::FALLBACK_TEXT;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

async fn app_with(cfg: Config) -> Router {
    let state = rollcall::CampusState::from_config(&cfg)
        .await
        .expect("failed to build state");
    rollcall::campus_router(state)
}

/// Serve `upstream` on an ephemeral port and point the LLM config at it.
async fn with_upstream(upstream: Router) -> Config {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock upstream");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, upstream).await;
    });

    let mut cfg = Config::default();
    cfg.llm.base_url = Url::parse(&format!("http://{addr}/v1/")).expect("bad mock url");
    cfg.llm.api_key = Some("sk-test".to_string());
    cfg.llm.retry_max_times = 0;
    cfg
}

fn chat_request(session_id: &str, query: &str) -> Request<Body> {
    let body = json!({
        "messages": [{ "role": "user", "content": query }],
        "userType": "student",
        "userName": "Alice Johnson",
        "sessionId": session_id
    });
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

async fn body_text(resp: Response) -> String {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(body.to_vec()).expect("response body was not utf-8")
}

async fn history(app: &Router, session_id: &str) -> Vec<Conversation> {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/assistant/history/{session_id}"))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    serde_json::from_str(&body_text(resp).await).expect("history was not json")
}

#[tokio::test]
async fn chat_route_returns_413_for_oversized_body() {
    let mut cfg = Config::default();
    cfg.basic.body_limit = 1024;
    let app = app_with(cfg).await;

    let oversized = "a".repeat(4 * 1024);
    let resp = app
        .clone()
        .oneshot(chat_request("session_big", &oversized))
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = serde_json::from_str(&body_text(resp).await).expect("error was not json");
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(body["error"]["message"], "request body too large");
}

#[tokio::test]
async fn missing_api_key_serves_the_fallback() {
    let app = app_with(Config::default()).await;

    let resp = app
        .clone()
        .oneshot(chat_request("session_nokey", "How do I mark attendance?"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    assert_eq!(body_text(resp).await, FALLBACK_TEXT);

    let log = history(&app, "session_nokey").await;
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].content, "How do I mark attendance?");
    assert_eq!(log[1].model_used, "fallback");
}

#[tokio::test]
async fn upstream_failure_serves_the_fallback() {
    let upstream = Router::new().route(
        "/v1/chat/completions",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let app = app_with(with_upstream(upstream).await).await;

    let resp = app
        .clone()
        .oneshot(chat_request("session_500", "I forgot my password"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, FALLBACK_TEXT);
}

#[tokio::test]
async fn model_answer_is_streamed_and_logged() {
    let upstream = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            let frames = [
                r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
                r#"{"choices":[{"delta":{"content":"Click "}}]}"#,
                r#"{"choices":[{"delta":{"content":"Mark Present."}}]}"#,
                "[DONE]",
            ];
            let body: String = frames.iter().map(|f| format!("data: {f}\n\n")).collect();
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }),
    );
    let app = app_with(with_upstream(upstream).await).await;

    let resp = app
        .clone()
        .oneshot(chat_request("session_stream", "How do I mark attendance?"))
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "Click Mark Present.");

    let log = history(&app, "session_stream").await;
    assert_eq!(log.len(), 2);
    assert_eq!(log[1].content, "Click Mark Present.");
    assert_eq!(log[1].model_used, "gpt-4o");
    assert_eq!(log[1].tokens_used, Some(19));
}

async fn knowledge_ids(app: &Router, query: &str) -> Vec<i64> {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/assistant/knowledge?{query}"))
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let entries: Value = serde_json::from_str(&body_text(resp).await).expect("not json");
    entries
        .as_array()
        .expect("not an array")
        .iter()
        .filter_map(|e| e["id"].as_i64())
        .collect()
}

#[tokio::test]
async fn knowledge_route_filters_by_audience() {
    let app = app_with(Config::default()).await;
    assert_eq!(
        knowledge_ids(&app, "q=mark%20attendance&userType=teacher").await,
        [3, 6]
    );
    assert!(
        knowledge_ids(&app, "q=mark%20attendance&userType=guest")
            .await
            .is_empty()
    );
    assert!(knowledge_ids(&app, "q=mark%20attendance").await.is_empty());
    assert_eq!(knowledge_ids(&app, "q=forgot%20password").await, [2]);
    assert_eq!(knowledge_ids(&app, "q=&userType=teacher").await, [6, 3, 2]);
}

#[tokio::test]
async fn unreadable_chat_bodies_get_the_fallback() {
    let app = app_with(Config::default()).await;
    let bodies = [
        r#"{"userType":"student"}"#.to_string(),
        json!({
            "messages": [{ "role": "user", "content": "hello" }],
            "userType": "admin"
        })
        .to_string(),
        "not json".to_string(),
    ];

    for body in bodies {
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .expect("failed to build request"),
            )
            .await
            .expect("request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, FALLBACK_TEXT);
    }
}

#[tokio::test]
async fn feedback_rating_is_validated() {
    let app = app_with(Config::default()).await;
    let feedback = |rating: u8| {
        Request::builder()
            .method("POST")
            .uri("/api/assistant/feedback")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "sessionId": "session_001", "rating": rating }).to_string(),
            ))
            .expect("failed to build request")
    };

    let resp = app.clone().oneshot(feedback(5)).await.expect("request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let resp = app.clone().oneshot(feedback(9)).await.expect("request failed");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
