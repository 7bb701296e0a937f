//! URL slugs for threads and debates.

/// Longest slug base kept before the salt is appended.
pub const MAX_BASE_LEN: usize = 60;

/// Lowercase ASCII slug: alphanumerics kept, every other run of characters
/// collapsed into a single `-`. Never empty.
pub fn slugify(title: &str) -> String {
  let mut slug = String::with_capacity(title.len());
  let mut pending_dash = false;

  for c in title.chars() {
    if c.is_ascii_alphanumeric() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c.to_ascii_lowercase());
    } else {
      pending_dash = true;
    }
    if slug.len() >= MAX_BASE_LEN {
      break;
    }
  }

  let trimmed = slug.trim_end_matches('-');
  if trimmed.is_empty() {
    String::from("untitled")
  } else {
    trimmed.to_owned()
  }
}

/// `slugify(title)` followed by `-{salt}`, so equal titles still get unique
/// slugs.
pub fn salted_slug(title: &str, salt: &str) -> String {
  format!("{}-{salt}", slugify(title))
}
