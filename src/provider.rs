//! Image-search provider seam and the Unsplash client behind it.
//!
//! We only call `GET /photos/random` with a free-text query and a square
//! orientation hint, and read back the handful of fields a puzzle needs.
//!
//! NOTE: We never log the access key; response bodies are truncated in logs.

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::domain::Photo;
use crate::error::ProviderError;
use crate::util::trunc_for_log;

/// Source of photos for a search term. Implementations must return a payload
/// with a usable `regular_url` or fail the attempt.
#[trait_variant::make(ImageProvider: Send)]
pub trait LocalImageProvider {
  async fn random_photo(&self, query: &str) -> Result<Photo, ProviderError>;
}

pub const ORIENTATION: &str = "squarish";

#[derive(Clone)]
pub struct UnsplashClient {
  pub client: reqwest::Client,
  pub access_key: String,
  pub base_url: String,
}

impl UnsplashClient {
  /// Construct the client if we find UNSPLASH_ACCESS_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let access_key = std::env::var("UNSPLASH_ACCESS_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("UNSPLASH_BASE_URL").unwrap_or_else(|_| "https://api.unsplash.com".into());
    match Self::new(access_key, base_url) {
      Ok(c) => Some(c),
      Err(e) => {
        error!(target: "whatsit_backend", error = %e, "Failed to build HTTP client for Unsplash");
        None
      }
    }
  }

  pub fn new(access_key: String, base_url: String) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()?;
    Ok(Self { client, access_key, base_url })
  }
}

impl ImageProvider for UnsplashClient {
  #[instrument(level = "info", skip(self), fields(%query, orientation = ORIENTATION))]
  async fn random_photo(&self, query: &str) -> Result<Photo, ProviderError> {
    let url = format!("{}/photos/random", self.base_url.trim_end_matches('/'));
    let start = Instant::now();
    let res = self
      .client
      .get(&url)
      .query(&[("query", query), ("orientation", ORIENTATION)])
      .header(USER_AGENT, "whatsit-backend/0.1")
      .header(AUTHORIZATION, format!("Client-ID {}", self.access_key))
      .send()
      .await?;

    let status = res.status();
    let body = res.text().await?;
    let elapsed = start.elapsed();

    if !status.is_success() {
      let message = extract_unsplash_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      error!(?elapsed, status = status.as_u16(), %message, "Unsplash request failed");
      return Err(ProviderError::Status { status: status.as_u16(), message });
    }

    info!(?elapsed, bytes = body.len(), "Unsplash photo received");
    photo_from_body(&body)
  }
}

// --- Payload DTOs ---

#[derive(Deserialize)]
struct RandomPhoto {
  urls: PhotoUrls,
  #[serde(default)]
  description: Option<String>,
  #[serde(default)]
  alt_description: Option<String>,
  #[serde(default)]
  tags: Vec<PhotoTag>,
  user: PhotoUser,
}
#[derive(Deserialize)]
struct PhotoUrls {
  regular: String,
}
#[derive(Deserialize)]
struct PhotoTag {
  #[serde(default)]
  title: Option<String>,
}
#[derive(Deserialize)]
struct PhotoUser {
  #[serde(default)]
  name: Option<String>,
  links: UserLinks,
}
#[derive(Deserialize)]
struct UserLinks {
  #[serde(default)]
  html: Option<String>,
}

/// Flatten a `/photos/random` response body. Missing `urls.regular` or
/// `user.links`, or a blank image URL, is a malformed payload.
pub fn photo_from_body(body: &str) -> Result<Photo, ProviderError> {
  let raw: RandomPhoto = serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;
  if raw.urls.regular.trim().is_empty() {
    return Err(ProviderError::Malformed("urls.regular is empty".into()));
  }
  let description = raw
    .description
    .filter(|d| !d.trim().is_empty())
    .or(raw.alt_description)
    .unwrap_or_default();
  Ok(Photo {
    regular_url: raw.urls.regular,
    description,
    tags: raw.tags.into_iter().filter_map(|t| t.title).collect(),
    photographer: raw.user.name.unwrap_or_default(),
    photographer_url: raw.user.links.html.unwrap_or_default(),
  })
}

/// Try to extract a clean error message from an Unsplash error body
/// (`{"errors": ["..."]}`).
fn extract_unsplash_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    errors: Vec<String>,
  }
  serde_json::from_str::<EWrap>(body)
    .ok()
    .filter(|w| !w.errors.is_empty())
    .map(|w| w.errors.join("; "))
}
