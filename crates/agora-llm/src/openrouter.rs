//! OpenAI-compatible chat-completions transport (OpenRouter by default).

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  gateway::{ChatCall, ChatTransport},
};

/// HTTP transport for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenRouterTransport {
  client:   reqwest::Client,
  base_url: String,
}

impl OpenRouterTransport {
  pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
    if api_key.trim().is_empty() {
      return Err(Error::Config("llm api key is empty".into()));
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
      .map_err(|_| Error::Config("invalid api key format".into()))?;
    headers.insert(AUTHORIZATION, auth);

    let client = reqwest::Client::builder()
      .timeout(timeout)
      .default_headers(headers)
      .build()
      .map_err(|e| Error::Config(format!("failed to build http client: {e}")))?;

    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_owned(),
    })
  }

  fn chat_url(&self) -> String { format!("{}/chat/completions", self.base_url) }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ApiRequest<'a> {
  model:       &'a str,
  messages:    Vec<ApiMessage<'a>>,
  temperature: f32,
  max_tokens:  u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
  choices: Option<Vec<ApiChoice>>,
  error:   Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiChoice {
  message: Option<ApiChoiceMessage>,
}

#[derive(Deserialize)]
struct ApiChoiceMessage {
  content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
  message: Option<String>,
}

impl ChatTransport for OpenRouterTransport {
  async fn chat<'a>(&'a self, call: &'a ChatCall) -> Result<String> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &call.system_prompt {
      messages.push(ApiMessage { role: "system", content: system });
    }
    messages.push(ApiMessage { role: "user", content: &call.prompt });

    let body = ApiRequest {
      model: &call.model,
      messages,
      temperature: call.temperature,
      max_tokens: call.max_tokens,
    };

    let response = self.client.post(self.chat_url()).json(&body).send().await?;
    let status = response.status();
    let text = response.text().await?;
    let parsed = serde_json::from_str::<ApiResponse>(&text).ok();

    if !status.is_success() {
      let message = parsed
        .and_then(|p| p.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
      return Err(Error::Provider { status: status.as_u16(), message });
    }

    let Some(parsed) = parsed else {
      return Err(Error::Provider {
        status:  status.as_u16(),
        message: "response body is not a chat completion".into(),
      });
    };
    if let Some(error) = parsed.error {
      return Err(Error::Provider {
        status:  status.as_u16(),
        message: error.message.unwrap_or_default(),
      });
    }

    parsed
      .choices
      .and_then(|c| c.into_iter().next())
      .and_then(|c| c.message)
      .and_then(|m| m.content)
      .filter(|c| !c.trim().is_empty())
      .ok_or(Error::EmptyResponse)
  }
}
