use serde_json::json;
use supportdesk::api::ApiClient;
use supportdesk::config::Config;
use supportdesk::runtime::ChatRuntime;
use supportdesk::state::{ConversationManager, Phase, Turn, FALLBACK_MESSAGE};
use supportdesk::types::Credential;
use supportdesk::ChatError;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer, credential: Option<Credential>) -> Config {
    Config {
        api_url: server.uri(),
        credential,
        tenant_id: None,
    }
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

fn runtime_for(config: &Config) -> ChatRuntime {
    let client = ApiClient::new(config).expect("client");
    ChatRuntime::new(ConversationManager::new(client))
}

#[tokio::test]
async fn test_streamed_answer_lands_in_assistant_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer jwt-token"))
        .and(body_json(json!({ "message": "Hi" })))
        .respond_with(sse("data: Hel\n\ndata: lo\n\ndata: [DONE]\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server, Some(Credential::Bearer("jwt-token".to_string())));
    let mut runtime = runtime_for(&config);

    assert!(runtime.submit("Hi"));
    runtime.wait_idle().await;

    assert_eq!(
        runtime.state().turns(),
        &[Turn::user("Hi"), Turn::assistant("Hello")]
    );
    assert!(!runtime.state().is_loading());
    assert_eq!(runtime.state().error_banner(), None);
}

#[tokio::test]
async fn test_server_error_before_stream_shows_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let mut runtime = runtime_for(&config(&server, None));
    runtime.submit("Hi");
    runtime.wait_idle().await;

    assert_eq!(runtime.state().turns()[1].text, FALLBACK_MESSAGE);
    assert_eq!(runtime.state().error_banner(), Some("overloaded"));
    assert_eq!(runtime.state().phase(), Phase::Idle);
}

#[tokio::test]
async fn test_json_envelopes_and_tenant_and_api_key_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("x-api-key", "tenant-key"))
        .and(body_json(json!({ "message": "Where is my order?", "tenant_id": "acme" })))
        .respond_with(sse(
            "data: {\"data\": \"It ships \"}\r\n\r\ndata: {\"data\": \"today.\"}\r\n\r\n",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        api_url: server.uri(),
        credential: Some(Credential::ApiKey("tenant-key".to_string())),
        tenant_id: Some("acme".to_string()),
    };
    let mut runtime = runtime_for(&config);
    runtime.submit("  Where is my order?  ");
    runtime.wait_idle().await;

    assert_eq!(
        runtime.state().turns()[1],
        Turn::assistant("It ships today.")
    );
}

#[tokio::test]
async fn test_missing_credential_sends_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(sse("data: ok\n\n"))
        .mount(&server)
        .await;

    let client = ApiClient::new(&config(&server, None)).unwrap();
    let mut stream = client.create_stream("Hi").await.unwrap();
    while futures::StreamExt::next(&mut stream).await.is_some() {}

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
    assert!(!requests[0].headers.contains_key("x-api-key"));
}

#[tokio::test]
async fn test_rejection_detail_is_unwrapped_from_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({ "detail": "tenant_id does not match credentials" })),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&config(&server, None)).unwrap();
    let error = match client.create_stream("Hi").await {
        Ok(_) => panic!("expected rejection"),
        Err(error) => error,
    };

    assert!(matches!(error, ChatError::RequestRejected { .. }));
    assert_eq!(error.to_string(), "tenant_id does not match credentials");
}

#[tokio::test]
async fn test_non_streaming_completion_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completion"))
        .and(body_json(json!({ "message": "Hi" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "Hello" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&config(&server, None)).unwrap();
    assert_eq!(client.complete("Hi").await.unwrap(), "Hello");
}

#[tokio::test]
async fn test_completion_with_unexpected_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completion"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = ApiClient::new(&config(&server, None)).unwrap();
    let error = client.complete("Hi").await.unwrap_err();
    assert!(matches!(error, ChatError::InvalidResponse { .. }));
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "ok", "service": "customer-support-ai" })),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&config(&server, None)).unwrap();
    let health = client.health().await.unwrap();
    assert!(health.is_ok());
    assert_eq!(health.service.as_deref(), Some("customer-support-ai"));
}
