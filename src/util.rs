//! Small utility helpers used across modules.

use rand::{distributions::Alphanumeric, Rng};
use reqwest::Url;

/// Canonical form of an answer or a guess.
///
/// Lowercases, drops every character that is not a word character
/// (Unicode alphanumeric or `_`) or whitespace, and collapses whitespace runs to a
/// single space with no leading/trailing space. Idempotent; stored answers
/// and live guesses go through this same function.
pub fn normalize(text: &str) -> String {
  let kept: String = text
    .to_lowercase()
    .chars()
    .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
    .collect();
  kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cache-busting pair stamped on both image URLs of one puzzle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheBuster {
  pub timestamp_ms: i64,
  pub nonce: String,
}

impl CacheBuster {
  pub fn fresh<R: Rng + ?Sized>(rng: &mut R) -> Self {
    let nonce = rng
      .sample_iter(&Alphanumeric)
      .take(6)
      .map(|b| (b as char).to_ascii_lowercase())
      .collect();
    Self { timestamp_ms: chrono::Utc::now().timestamp_millis(), nonce }
  }
}

/// Re-parameterize a provider image URL to a target width and stamp it with
/// the cache-busting pair. Existing `w`/`t`/`r` params are replaced; all
/// others are kept in order.
pub fn sized_image_url(base: &str, width: u32, buster: &CacheBuster) -> Result<String, String> {
  let mut url = Url::parse(base).map_err(|e| format!("bad image URL {base:?}: {e}"))?;
  let kept: Vec<(String, String)> = url
    .query_pairs()
    .filter(|(k, _)| !matches!(k.as_ref(), "w" | "t" | "r"))
    .map(|(k, v)| (k.into_owned(), v.into_owned()))
    .collect();
  url
    .query_pairs_mut()
    .clear()
    .extend_pairs(kept)
    .append_pair("w", &width.to_string())
    .append_pair("t", &buster.timestamp_ms.to_string())
    .append_pair("r", &buster.nonce);
  Ok(url.to_string())
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut end = max;
  while !s.is_char_boundary(end) {
    end -= 1;
  }
  format!("{}… ({} bytes total)", &s[..end], s.len())
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::StdRng, SeedableRng};

  #[test]
  fn normalize_strips_case_punctuation_and_spacing() {
    assert_eq!(normalize("  Dog! "), "dog");
    assert_eq!(normalize("Bananas!"), "bananas");
    assert_eq!(normalize("ice   CREAM"), "ice cream");
    assert_eq!(normalize("french-fries"), "frenchfries");
    assert_eq!(normalize("\tcup of\n coffee?"), "cup of coffee");
    assert_eq!(normalize("!!!"), "");
    assert_eq!(normalize("snake_case"), "snake_case");
  }

  #[test]
  fn normalize_keeps_accented_letters() {
    assert_eq!(normalize("Café!"), "café");
    assert_eq!(normalize("CRÈME brûlée"), "crème brûlée");
  }

  #[test]
  fn normalize_is_idempotent() {
    let samples = [
      "", " ", "Dog", "  Hello,   World!! ", "ÉCLAIR au café", "İstanbul", "a - b",
      "tab\tand\nnewline", "MiXeD_123 ¿qué?", "emoji 🐶 dog", "ß straße",
    ];
    for s in samples {
      let once = normalize(s);
      assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
    }
  }

  #[test]
  fn sized_url_replaces_width_and_stamps_token() {
    let buster = CacheBuster { timestamp_ms: 42, nonce: "abc123".into() };
    let out = sized_image_url(
      "https://images.unsplash.com/photo-1?ixid=xyz&w=1080&fm=jpg",
      800,
      &buster,
    )
    .unwrap();
    let url = Url::parse(&out).unwrap();
    let pairs: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
    assert_eq!(
      pairs,
      vec![
        ("ixid".into(), "xyz".into()),
        ("fm".into(), "jpg".into()),
        ("w".into(), "800".into()),
        ("t".into(), "42".into()),
        ("r".into(), "abc123".into()),
      ]
    );
  }

  #[test]
  fn sized_url_rejects_garbage() {
    let buster = CacheBuster { timestamp_ms: 1, nonce: "x".into() };
    assert!(sized_image_url("not a url", 800, &buster).is_err());
  }

  #[test]
  fn fresh_buster_tokens_differ() {
    let mut rng = StdRng::seed_from_u64(7);
    let a = CacheBuster::fresh(&mut rng);
    let b = CacheBuster::fresh(&mut rng);
    assert_eq!(a.nonce.len(), 6);
    assert_ne!(a.nonce, b.nonce);
  }

  #[test]
  fn trunc_respects_char_boundaries() {
    assert_eq!(trunc_for_log("short", 10), "short");
    let t = trunc_for_log("ééééé", 3);
    assert!(t.starts_with('é'));
    assert!(t.ends_with("(10 bytes total)"));
  }
}
