use std::time::Duration;

use agora_llm::{
  ChatCall, ChatTransport, Completion, CompletionRequest, Error, Gateway,
  LlmConfig, ModelTable, ModelTier, OpenRouterTransport,
};
use serde_json::json;
use wiremock::{
  Mock, MockServer, ResponseTemplate,
  matchers::{body_partial_json, header, method, path},
};

fn call(model: &str) -> ChatCall {
  ChatCall {
    model:         model.into(),
    system_prompt: Some("You are terse.".into()),
    prompt:        "Say hi".into(),
    max_tokens:    64,
    temperature:   0.5,
  }
}

fn transport(server: &MockServer) -> OpenRouterTransport {
  OpenRouterTransport::new("sk-test", &server.uri(), Duration::from_secs(5))
    .unwrap()
}

#[tokio::test]
async fn sends_messages_and_returns_first_choice() {
  let server = MockServer::start().await;

  Mock::given(method("POST"))
    .and(path("/chat/completions"))
    .and(header("authorization", "Bearer sk-test"))
    .and(body_partial_json(json!({
      "model": "acme/small",
      "max_tokens": 64,
      "messages": [
        { "role": "system", "content": "You are terse." },
        { "role": "user", "content": "Say hi" }
      ]
    })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "choices": [{ "message": { "content": "hi" }, "finish_reason": "stop" }]
    })))
    .expect(1)
    .mount(&server)
    .await;

  let text = transport(&server).chat(&call("acme/small")).await.unwrap();
  assert_eq!(text, "hi");
}

#[tokio::test]
async fn error_status_surfaces_provider_message() {
  let server = MockServer::start().await;

  Mock::given(method("POST"))
    .and(path("/chat/completions"))
    .respond_with(ResponseTemplate::new(503).set_body_json(json!({
      "error": { "message": "upstream overloaded" }
    })))
    .mount(&server)
    .await;

  let err = transport(&server).chat(&call("acme/small")).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Provider { status: 503, ref message } if message == "upstream overloaded"
  ));
}

#[tokio::test]
async fn missing_content_is_empty_response() {
  let server = MockServer::start().await;

  Mock::given(method("POST"))
    .and(path("/chat/completions"))
    .respond_with(
      ResponseTemplate::new(200)
        .set_body_json(json!({ "choices": [{ "message": { "content": "" } }] })),
    )
    .mount(&server)
    .await;

  let err = transport(&server).chat(&call("acme/small")).await.unwrap_err();
  assert!(matches!(err, Error::EmptyResponse));
}

#[tokio::test]
async fn gateway_falls_back_to_cheap_model_over_http() {
  let server = MockServer::start().await;
  let models = ModelTable {
    free:     "acme/free".into(),
    cheap:    "acme/cheap".into(),
    balanced: "acme/balanced".into(),
    quality:  "acme/quality".into(),
  };

  Mock::given(method("POST"))
    .and(path("/chat/completions"))
    .and(body_partial_json(json!({ "model": "acme/quality" })))
    .respond_with(ResponseTemplate::new(500))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("POST"))
    .and(path("/chat/completions"))
    .and(body_partial_json(json!({ "model": "acme/cheap" })))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "choices": [{ "message": { "content": "{\"ok\": true}" } }]
    })))
    .expect(1)
    .mount(&server)
    .await;

  let config = LlmConfig {
    api_key: "sk-test".into(),
    base_url: server.uri(),
    models,
    ..LlmConfig::default()
  };
  let gateway = Gateway::from_config(&config).unwrap();

  let value: serde_json::Value = gateway
    .complete_json(CompletionRequest::new("check").tier(ModelTier::Quality))
    .await
    .unwrap();
  assert_eq!(value["ok"], true);
}

#[test]
fn empty_api_key_is_a_config_error() {
  let err = OpenRouterTransport::new("", "http://localhost", Duration::from_secs(1))
    .unwrap_err();
  assert!(matches!(err, Error::Config(_)));
}
