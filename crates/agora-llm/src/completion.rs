//! The [`Completion`] trait and JSON-completion helpers.

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::{Error, Result, request::CompletionRequest};

/// Appended to every JSON completion prompt.
pub const JSON_INSTRUCTION: &str = "Respond ONLY with valid JSON. Do not wrap \
   it in Markdown code fences and do not add any commentary before or after it.";

/// Text produced by a completion, with the model that actually produced it
/// (which differs from the requested one after a tier fallback).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
  pub text:  String,
  pub model: String,
}

/// Anything that can turn a prompt into text.
pub trait Completion: Send + Sync {
  fn complete(
    &self,
    request: CompletionRequest,
  ) -> impl Future<Output = Result<Completed>> + Send + '_;

  /// Total attempts [`Completion::complete_json`] makes before giving up.
  fn json_attempts(&self) -> u32 { 1 }

  /// Complete `request` and deserialise the answer as `T`.
  ///
  /// The prompt gets [`JSON_INSTRUCTION`] appended and the answer has code
  /// fences stripped before parsing. Unparseable text and schema mismatches
  /// are both [`Error::InvalidJson`]; they are retried until
  /// [`Completion::json_attempts`] is exhausted. Upstream failures are not
  /// retried here.
  fn complete_json<T>(
    &self,
    request: CompletionRequest,
  ) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: DeserializeOwned + Send + 'static,
  {
    async move {
      let mut request = request;
      request.prompt = format!("{}\n\n{JSON_INSTRUCTION}", request.prompt);
      let attempts = self.json_attempts().max(1);

      let mut attempt = 1;
      loop {
        let completed = self.complete(request.clone()).await?;
        match parse_json::<T>(&completed.text) {
          Ok(value) => return Ok(value),
          Err(e) => {
            tracing::warn!(
              attempt,
              attempts,
              model = %completed.model,
              raw = %completed.text,
              error = %e,
              "completion was not the expected JSON"
            );
            if attempt >= attempts {
              return Err(e);
            }
            attempt += 1;
          }
        }
      }
    }
  }
}

/// Remove a surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fences(raw: &str) -> &str {
  let trimmed = raw.trim();
  let Some(rest) = trimmed.strip_prefix("```") else {
    return trimmed;
  };
  // Drop the info string (e.g. `json`) on the opening fence line.
  let body = match rest.find('\n') {
    Some(i) => &rest[i + 1..],
    None => rest,
  };
  body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse a completion as `T`, tolerating code fences and leading or trailing
/// prose around a single JSON object or array.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
  let body = strip_code_fences(raw);
  let first_error = match serde_json::from_str::<T>(body) {
    Ok(value) => return Ok(value),
    Err(e) => e,
  };

  if let Some(value) = outer_json_slice(body)
    .and_then(|slice| serde_json::from_str::<T>(slice).ok())
  {
    return Ok(value);
  }

  Err(Error::InvalidJson {
    raw:     raw.to_owned(),
    message: first_error.to_string(),
  })
}

/// The span from the first `{`/`[` to the matching last `}`/`]`.
fn outer_json_slice(body: &str) -> Option<&str> {
  let start = body.find(['{', '['])?;
  let close = if body[start..].starts_with('{') { '}' } else { ']' };
  let end = body.rfind(close)?;
  (end > start).then(|| &body[start..=end])
}

#[cfg(test)]
mod tests {
  use serde::Deserialize;

  use super::*;

  #[derive(Debug, Deserialize, PartialEq)]
  struct Topic {
    title: String,
  }

  #[test]
  fn strips_fences_with_language_tag() {
    let raw = "```json\n{\"title\": \"X\"}\n```";
    assert_eq!(strip_code_fences(raw), "{\"title\": \"X\"}");
  }

  #[test]
  fn unfenced_text_is_only_trimmed() {
    assert_eq!(strip_code_fences("  [1, 2]\n"), "[1, 2]");
  }

  #[test]
  fn parses_object_surrounded_by_prose() {
    let raw = "Sure! Here you go:\n{\"title\": \"Rates\"}\nHope that helps.";
    let topic: Topic = parse_json(raw).unwrap();
    assert_eq!(topic.title, "Rates");
  }

  #[test]
  fn schema_mismatch_is_invalid_json() {
    let err = parse_json::<Topic>("{\"name\": \"nope\"}").unwrap_err();
    assert!(matches!(err, Error::InvalidJson { ref raw, .. } if raw.contains("nope")));
  }

  #[test]
  fn plain_text_is_invalid_json() {
    let err = parse_json::<Topic>("I cannot comply.").unwrap_err();
    assert!(matches!(err, Error::InvalidJson { .. }));
  }
}
