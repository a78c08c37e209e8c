use holochat_async::test_support::EnvGuard;
use holochat_async::types::{GenerationParams, MessageParam};
use holochat_async::{ChatError, ChatSession, Client, Credential, HolochatConfig, TransportError};
use serial_test::serial;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_session(server: &MockServer) -> ChatSession {
    let config = HolochatConfig::new()
        .with_api_base(server.uri())
        .with_credential(Credential::new("sk-test").unwrap());
    ChatSession::with_client(Client::with_config(config))
}

fn sse(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream")
}

#[tokio::test]
async fn streams_every_data_payload_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-3.5-turbo",
            "stream": true,
            "max_tokens": 1000,
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(sse("data: one\n\ndata: two\n\ndata: [DONE]\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let session = test_session(&server);
    let mut seen = Vec::new();
    let summary = session
        .ask(|data| seen.push(data.to_string()), &[MessageParam::user("hi")])
        .await
        .unwrap();

    assert_eq!(seen, vec!["one", "two", "[DONE]"]);
    assert_eq!(summary.units, 3);
    assert!(!summary.is_cancelled());
}

#[tokio::test]
async fn sends_configured_generation_params() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "max_tokens": 64
        })))
        .respond_with(sse("data: ok\n\n"))
        .expect(1)
        .mount(&server)
        .await;

    let params = GenerationParams {
        model: "gpt-4o-mini".into(),
        max_tokens: 64,
        ..GenerationParams::default()
    };
    let session = test_session(&server).with_params(params).unwrap();

    let mut seen = Vec::new();
    session
        .ask(|data| seen.push(data.to_string()), &[MessageParam::user("hi")])
        .await
        .unwrap();
    assert_eq!(seen, vec!["ok"]);
}

#[tokio::test]
async fn empty_payloads_and_comments_are_skipped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse(": keep-alive\n\ndata:\n\nretry: 3000\n\ndata: x\n\n"))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let mut seen = Vec::new();
    let summary = session
        .ask(|data| seen.push(data.to_string()), &[MessageParam::user("hi")])
        .await
        .unwrap();

    assert_eq!(seen, vec!["x"]);
    // empty data and the retry hint still count as decoded units
    assert_eq!(summary.units, 3);
}

#[tokio::test]
async fn non_success_status_is_a_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let mut calls = 0;
    let err = session
        .ask(|_| calls += 1, &[MessageParam::user("hi")])
        .await
        .unwrap_err();

    assert_eq!(calls, 0);
    assert_eq!(err.status_code(), Some(401));
    match err {
        ChatError::Transport(TransportError::Api(obj)) => {
            assert_eq!(obj.message, "Incorrect API key provided");
            assert_eq!(obj.code.as_deref(), Some("invalid_api_key"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_utf8_body_is_a_decode_error() {
    let server = MockServer::start().await;

    let mut body = b"data: ok\n\ndata: ".to_vec();
    body.extend_from_slice(&[0xff, 0xfe]);
    body.extend_from_slice(b"\n\n");

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let err = session
        .ask(|_| {}, &[MessageParam::user("hi")])
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Decode(e) if e.offset == 16));
}

#[tokio::test]
async fn cancelled_token_delivers_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse("data: one\n\n"))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let token = CancellationToken::new();
    token.cancel();

    let mut calls = 0;
    let summary = session
        .ask_with_cancel(|_| calls += 1, &[MessageParam::user("hi")], token)
        .await
        .unwrap();

    assert!(summary.is_cancelled());
    assert_eq!(calls, 0);
}

#[tokio::test]
async fn each_call_starts_from_fresh_decoder_state() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse("event: delta\nid: 1\ndata: first\n\n"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse("data: second\n\n"))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let history = [MessageParam::user("hi")];

    let mut first = Vec::new();
    session
        .ask(|data| first.push(data.to_string()), &history)
        .await
        .unwrap();
    let mut second = Vec::new();
    let summary = session
        .ask(|data| second.push(data.to_string()), &history)
        .await
        .unwrap();

    assert_eq!(first, vec!["first"]);
    assert_eq!(second, vec!["second"]);
    assert_eq!(summary.units, 1);
}

#[tokio::test]
async fn body_ending_mid_block_emits_nothing_and_does_not_leak() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse("data: first\ndata: dangling"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse("data: second\n\n"))
        .mount(&server)
        .await;

    let session = test_session(&server);
    let history = [MessageParam::user("hi")];

    // no blank line anywhere, so however the body is fragmented no block completes
    let mut first = Vec::new();
    let summary = session
        .ask(|data| first.push(data.to_string()), &history)
        .await
        .unwrap();
    assert!(first.is_empty());
    assert_eq!(summary.units, 0);

    let mut second = Vec::new();
    session
        .ask(|data| second.push(data.to_string()), &history)
        .await
        .unwrap();
    assert_eq!(second, vec!["second"]);
}

#[tokio::test]
#[serial(env)]
async fn missing_credential_fails_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(sse("data: x\n\n"))
        .expect(0)
        .mount(&server)
        .await;

    let _env = EnvGuard::isolated();
    let config = HolochatConfig::new().with_api_base(server.uri());
    let session = ChatSession::with_client(Client::with_config(config));

    let err = session
        .ask(|_| {}, &[MessageParam::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Config(_)));
}

#[tokio::test]
async fn empty_history_is_rejected() {
    let server = MockServer::start().await;
    let session = test_session(&server);

    let err = session.ask(|_| {}, &[]).await.unwrap_err();
    assert!(matches!(err, ChatError::Config(_)));
}
