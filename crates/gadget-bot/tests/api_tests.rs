//! Integration tests for the bot's HTTP surface.

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    Router,
};
use gadget_bot::{
    api::{create_router, AppState, REQUEST_ID_HEADER},
    plugins::{register_all, PluginContext},
};
use gadget_core::{
    handler_fn, ChannelMessageEvent, ChannelMessageRoute, CommandInvocation, CommandRoute,
    Dispatcher, MentionEvent, MentionRoute, Registry, Route,
};
use secrecy::SecretString;
use serde_json::json;
use slack_client::{
    SlackClient, SlackEventDecoder, SlackSignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use user_store::{MemoryStore, UserStore};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SIGNING_SECRET: &str = "test-signing-secret";

fn verifier() -> SlackSignatureVerifier {
    SlackSignatureVerifier::new(
        SecretString::new(SIGNING_SECRET.into()),
        Duration::from_secs(300),
    )
}

fn create_test_app(server: &MockServer, store: MemoryStore) -> Router {
    create_counting_app(server, store, Arc::new(AtomicUsize::new(0)))
}

/// Router with the built-in plugins plus a deployers-only mention route,
/// channel-message route and `/deploy` command. `shipped` counts runs of
/// the channel-message handler.
fn create_counting_app(
    server: &MockServer,
    store: MemoryStore,
    shipped: Arc<AtomicUsize>,
) -> Router {
    let slack = SlackClient::new(SecretString::new("xoxb-test".into()), server.uri()).unwrap();
    let store: Arc<dyn UserStore> = Arc::new(store);

    let mut registry = Registry::new();
    register_all(
        &mut registry,
        &PluginContext::new(Arc::new(slack), store.clone()),
    )
    .unwrap();

    registry
        .add_mention_route(MentionRoute::new(
            Route::new("deploy")
                .with_pattern(r"(?i)^deploy (\w+)$")
                .with_permissions(["deployers"]),
            handler_fn(|_request: gadget_core::Request<MentionEvent>| async {
                anyhow::Ok(())
            }),
        ))
        .unwrap();
    registry
        .add_channel_message_route(ChannelMessageRoute::new(
            Route::new("ship")
                .with_pattern(r"(?i)^ship it!?$")
                .with_permissions(["deployers"]),
            handler_fn(move |_request: gadget_core::Request<ChannelMessageEvent>| {
                let shipped = Arc::clone(&shipped);
                async move {
                    shipped.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            }),
        ))
        .unwrap();
    registry
        .add_command_route(
            CommandRoute::new(
                Route::new("deploy.command").with_permissions(["deployers"]),
                "/deploy",
                handler_fn(|_request: gadget_core::Request<CommandInvocation>| async {
                    anyhow::Ok(())
                }),
            )
            .with_immediate_response("Deploying..."),
        )
        .unwrap();

    let dispatcher = Dispatcher::new(
        Arc::new(registry),
        store,
        Arc::new(verifier()),
        Arc::new(SlackEventDecoder::new()),
    );

    create_router(AppState::new(dispatcher))
}

fn signed_request(uri: &str, body: &str) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = verifier().sign(&timestamp, body.as_bytes()).unwrap();

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(TIMESTAMP_HEADER, timestamp)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn callback(event: serde_json::Value) -> String {
    json!({
        "type": "event_callback",
        "team_id": "T1",
        "event": event,
        "authorizations": [{ "user_id": "UBOT", "is_bot": true }]
    })
    .to_string()
}

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Wait until the mock server has seen `count` requests.
async fn wait_for_requests(server: &MockServer, count: usize) {
    for _ in 0..200 {
        if server.received_requests().await.unwrap_or_default().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {} outbound requests", count);
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, MemoryStore::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();

    assert_eq!(json["status"], "ok");
    assert_eq!(json["routes"], 11);
}

#[tokio::test]
async fn test_url_verification_challenge() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, MemoryStore::new());
    let body = json!({
        "token": "Jhj5dZrVaK7ZwHHjRyZWjbDl",
        "challenge": "abc123",
        "type": "url_verification"
    })
    .to_string();

    let response = app.oneshot(signed_request("/events", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(body_string(response).await, "abc123");
}

#[tokio::test]
async fn test_invalid_signature_rejected() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, MemoryStore::new());
    let body = json!({ "type": "url_verification", "challenge": "abc123" }).to_string();

    let request = Request::builder()
        .method("POST")
        .uri("/events")
        .header(TIMESTAMP_HEADER, chrono::Utc::now().timestamp().to_string())
        .header(SIGNATURE_HEADER, "v0=0000")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn test_unsigned_command_rejected() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, MemoryStore::new());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/commands")
                .body(Body::from("command=%2Fdeploy&user_id=U1"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unparseable_event() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, MemoryStore::new());

    let response = app
        .oneshot(signed_request("/events", "not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_malformed_command() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, MemoryStore::new());

    let response = app
        .oneshot(signed_request("/commands", "text=hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_command() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    let app = create_test_app(&server, store.clone());

    let response = app
        .oneshot(signed_request(
            "/commands",
            "command=%2Fnope&user_id=U1&channel_id=C1&text=",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(
        json,
        json!({ "response_type": "ephemeral", "text": "Unknown command." })
    );
    assert!(store.find_user("U1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_permitted_command_acknowledged() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    store.add_member("deployers", "U1").await.unwrap();
    let app = create_test_app(&server, store);

    let response = app
        .oneshot(signed_request(
            "/commands",
            "command=%2Fdeploy&user_id=U1&channel_id=C1&text=production",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(
        json,
        json!({ "response_type": "ephemeral", "text": "Deploying..." })
    );
}

#[tokio::test]
async fn test_denied_command() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, MemoryStore::new());

    let response = app
        .oneshot(signed_request(
            "/commands",
            "command=%2Fdeploy&user_id=U1&channel_id=C1&text=production",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(
        json,
        json!({ "response_type": "ephemeral", "text": "Permission denied." })
    );
}

#[tokio::test]
async fn test_denied_mention_runs_denied_route() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/reactions.add"))
        .and(body_json(json!({
            "channel": "C1", "timestamp": "1.0", "name": "astonished"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(body_json(json!({
            "channel": "C1",
            "text": "I'm sorry, <@U1>, but you're not allowed to do that."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "channel": "C1", "ts": "1.1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(&server, MemoryStore::new());
    let body = callback(json!({
        "type": "app_mention",
        "user": "U1",
        "text": "<@UBOT> deploy production",
        "ts": "1.0",
        "channel": "C1"
    }));

    let response = app.oneshot(signed_request("/events", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.is_empty());
    wait_for_requests(&server, 2).await;
}

#[tokio::test]
async fn test_unmatched_mention_runs_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(body_json(json!({
            "channel": "C1",
            "text": "Hi there! I see you sent me a message, <@U1>, but I'm not sure what to do with that."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "channel": "C1", "ts": "1.1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = create_test_app(&server, MemoryStore::new());
    let body = callback(json!({
        "type": "app_mention",
        "user": "U1",
        "text": "<@UBOT> sing me a song",
        "ts": "1.0",
        "channel": "C1"
    }));

    let response = app.oneshot(signed_request("/events", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    wait_for_requests(&server, 1).await;
}

#[tokio::test]
async fn test_unmatched_channel_message_not_found() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, MemoryStore::new());
    let body = callback(json!({
        "type": "message",
        "user": "U1",
        "text": "lunch anyone?",
        "ts": "1.0",
        "channel": "C1"
    }));

    let response = app.oneshot(signed_request("/events", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_own_message_ignored() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, MemoryStore::new());
    let body = callback(json!({
        "type": "message",
        "user": "UBOT",
        "text": "I'm sorry, <@U1>, but you're not allowed to do that.",
        "ts": "1.1",
        "channel": "C1"
    }));

    let response = app.oneshot(signed_request("/events", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_denied_channel_message_skips_handler() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/reactions.add"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(body_json(json!({
            "channel": "C1",
            "text": "I'm sorry, <@U1>, but you're not allowed to do that."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true, "channel": "C1", "ts": "1.1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let shipped = Arc::new(AtomicUsize::new(0));
    let app = create_counting_app(&server, MemoryStore::new(), Arc::clone(&shipped));
    let body = callback(json!({
        "type": "message",
        "user": "U1",
        "text": "ship it",
        "ts": "1.0",
        "channel": "C1"
    }));

    let response = app.oneshot(signed_request("/events", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    wait_for_requests(&server, 2).await;
    assert_eq!(shipped.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_permitted_channel_message_runs_handler() {
    let server = MockServer::start().await;
    let store = MemoryStore::new();
    store.add_member("deployers", "U1").await.unwrap();

    let shipped = Arc::new(AtomicUsize::new(0));
    let app = create_counting_app(&server, store, Arc::clone(&shipped));
    let body = callback(json!({
        "type": "message",
        "user": "U1",
        "text": "ship it!",
        "ts": "1.0",
        "channel": "C1"
    }));

    let response = app.oneshot(signed_request("/events", &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    for _ in 0..200 {
        if shipped.load(Ordering::SeqCst) == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("channel message handler never ran");
}
