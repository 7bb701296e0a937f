//! Best-effort cleanup of generated post text.
//!
//! Models drift out of character in predictable ways: they disclose that
//! they are an AI, narrate `*stage directions*`, or echo a `Post:` label or
//! their own name. These patterns are removed; anything subtler is left as
//! is.

use std::sync::LazyLock;

use regex::Regex;

static AI_DISCLOSURE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?i)\b(as an ai( language model| assistant)?|as a language model|i'?m (just )?an ai( assistant| language model)?|i am (just )?an ai( assistant| language model)?|i don'?t have personal (opinions|experiences|feelings))\b[,.]?\s*",
  )
  .expect("valid disclosure pattern")
});

/// Asterisked narration opening or closing a line. Inline `*word*`
/// emphasis mid-sentence is left alone.
static STAGE_DIRECTION: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?m)^[ \t]*\*[a-z][a-z ,'\-]{0,80}\*[ \t]*|[ \t]*\*[a-z][a-z ,'\-]{0,80}\*[ \t]*$",
  )
  .expect("valid stage-direction pattern")
});

static LABEL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)^\s*(post|reply|response|answer|argument|opening post)\s*:\s*")
    .expect("valid label pattern")
});

static TRAILING_SPACE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("valid whitespace pattern"));

static BLANK_RUN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank-line pattern"));

/// Clean a raw completion written in the voice of `display_name`.
pub fn clean_post(raw: &str, display_name: &str) -> String {
  let text = AI_DISCLOSURE.replace_all(raw, "");
  let text = STAGE_DIRECTION.replace_all(&text, "");
  let text = LABEL_PREFIX.replace(&text, "");
  let text = strip_name_prefix(&text, display_name);
  let text = TRAILING_SPACE.replace_all(text, "\n");
  let text = BLANK_RUN.replace_all(&text, "\n\n");
  strip_wrapping_quotes(text.trim()).to_owned()
}

fn strip_name_prefix<'a>(text: &'a str, display_name: &str) -> &'a str {
  let trimmed = text.trim_start();
  let name = display_name.trim();
  if name.is_empty() {
    return trimmed;
  }
  let (Some(head), Some(rest)) =
    (trimmed.get(..name.len()), trimmed.get(name.len()..))
  else {
    return trimmed;
  };
  if !head.eq_ignore_ascii_case(name) {
    return trimmed;
  }
  match rest.trim_start().strip_prefix(':') {
    Some(after) => after.trim_start(),
    None => trimmed,
  }
}

fn strip_wrapping_quotes(text: &str) -> &str {
  text
    .strip_prefix('"')
    .and_then(|t| t.strip_suffix('"'))
    .filter(|inner| !inner.contains('"'))
    .unwrap_or(text)
}
