//! Durable store: one appended row per generated puzzle, plus leaderboard
//! entries keyed by player name and calendar date.
//!
//! Two backends:
//!   - `MemoryStore`: process-local, used when SUPABASE_URL is unset and in tests
//!   - `SupabaseStore`: PostgREST tables `images` and `leaderboard`

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::domain::{LeaderboardEntry, PuzzleRecord};
use crate::error::PersistenceError;
use crate::util::trunc_for_log;

/// Append-only sink for generated puzzles.
#[trait_variant::make(PuzzleStore: Send)]
pub trait LocalPuzzleStore {
  async fn insert_puzzle(&self, record: &PuzzleRecord) -> Result<(), PersistenceError>;
}

#[trait_variant::make(LeaderboardStore: Send)]
pub trait LocalLeaderboardStore {
  async fn submit_entry(&self, entry: &LeaderboardEntry) -> Result<(), PersistenceError>;

  /// Highest streaks first, optionally restricted to one calendar date.
  /// `offset` skips that many ranked rows, for paging.
  async fn top_entries(
    &self,
    limit: usize,
    offset: usize,
    date: Option<NaiveDate>,
  ) -> Result<Vec<LeaderboardEntry>, PersistenceError>;

  async fn best_streak_for(&self, name: &str) -> Result<Option<u32>, PersistenceError>;
}

pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemoryStore {
  puzzles: Arc<RwLock<Vec<PuzzleRecord>>>,
  leaderboard: Arc<RwLock<Vec<LeaderboardEntry>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub async fn puzzle_rows(&self) -> Vec<PuzzleRecord> {
    self.puzzles.read().await.clone()
  }
}

impl PuzzleStore for MemoryStore {
  #[instrument(level = "debug", skip(self, record), fields(answer = %record.correct_answer))]
  async fn insert_puzzle(&self, record: &PuzzleRecord) -> Result<(), PersistenceError> {
    self.puzzles.write().await.push(record.clone());
    Ok(())
  }
}

impl LeaderboardStore for MemoryStore {
  #[instrument(level = "debug", skip(self, entry), fields(name = %entry.name, streak = entry.streak))]
  async fn submit_entry(&self, entry: &LeaderboardEntry) -> Result<(), PersistenceError> {
    self.leaderboard.write().await.push(entry.clone());
    Ok(())
  }

  async fn top_entries(
    &self,
    limit: usize,
    offset: usize,
    date: Option<NaiveDate>,
  ) -> Result<Vec<LeaderboardEntry>, PersistenceError> {
    let mut rows: Vec<LeaderboardEntry> = self
      .leaderboard
      .read()
      .await
      .iter()
      .filter(|e| date.map_or(true, |d| e.date == d))
      .cloned()
      .collect();
    // Stable sort keeps earlier submissions ahead on ties.
    rows.sort_by(|a, b| b.streak.cmp(&a.streak));
    Ok(rows.into_iter().skip(offset).take(limit).collect())
  }

  async fn best_streak_for(&self, name: &str) -> Result<Option<u32>, PersistenceError> {
    Ok(
      self
        .leaderboard
        .read()
        .await
        .iter()
        .filter(|e| e.name == name)
        .map(|e| e.streak)
        .max(),
    )
  }
}

// ---------------------------------------------------------------------------
// Supabase (PostgREST)
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SupabaseStore {
  pub client: reqwest::Client,
  pub base_url: String,
  pub service_key: String,
}

impl SupabaseStore {
  /// Construct the store if SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY are set.
  pub fn from_env() -> Option<Self> {
    let base_url = std::env::var("SUPABASE_URL").ok().filter(|s| !s.trim().is_empty())?;
    let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY").ok().filter(|s| !s.trim().is_empty())?;
    match Self::new(base_url, service_key) {
      Ok(s) => Some(s),
      Err(e) => {
        error!(target: "whatsit_backend", error = %e, "Failed to build HTTP client for Supabase");
        None
      }
    }
  }

  pub fn new(base_url: String, service_key: String) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(20)).build()?;
    Ok(Self { client, base_url, service_key })
  }

  fn table_url(&self, table: &str) -> String {
    format!("{}/rest/v1/{}", self.base_url.trim_end_matches('/'), table)
  }

  fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req
      .header(USER_AGENT, "whatsit-backend/0.1")
      .header("apikey", &self.service_key)
      .header(AUTHORIZATION, format!("Bearer {}", self.service_key))
  }

  async fn insert_row<T: serde::Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<(), PersistenceError> {
    let res = self
      .authed(self.client.post(self.table_url(table)))
      .header(CONTENT_TYPE, "application/json")
      .header("Prefer", "return=minimal")
      .json(row)
      .send()
      .await?;
    check_status(res).await.map(|_| ())
  }

  async fn select_leaderboard(&self, query: &[(&str, String)]) -> Result<Vec<LeaderboardEntry>, PersistenceError> {
    let res = self
      .authed(self.client.get(self.table_url("leaderboard")))
      .query(&[("select", "name,streak,date")])
      .query(query)
      .send()
      .await?;
    let res = check_status(res).await?;
    Ok(res.json::<Vec<LeaderboardEntry>>().await?)
  }
}

/// PostgREST filters for one ranked leaderboard page.
fn top_entries_query(limit: usize, offset: usize, date: Option<NaiveDate>) -> Vec<(&'static str, String)> {
  let mut query = vec![
    ("order", "streak.desc".to_string()),
    ("limit", limit.to_string()),
    ("offset", offset.to_string()),
  ];
  if let Some(d) = date {
    query.push(("date", format!("eq.{d}")));
  }
  query
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, PersistenceError> {
  if res.status().is_success() {
    return Ok(res);
  }
  let status = res.status().as_u16();
  let body = res.text().await.unwrap_or_default();
  let message = extract_postgrest_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
  Err(PersistenceError::Status { status, message })
}

/// PostgREST errors look like `{"code": "...", "message": "..."}`.
fn extract_postgrest_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  serde_json::from_str::<EObj>(body).ok().map(|e| e.message)
}

impl PuzzleStore for SupabaseStore {
  #[instrument(level = "info", skip(self, record), fields(answer = %record.correct_answer, category = %record.category))]
  async fn insert_puzzle(&self, record: &PuzzleRecord) -> Result<(), PersistenceError> {
    self.insert_row("images", record).await
  }
}

impl LeaderboardStore for SupabaseStore {
  #[instrument(level = "info", skip(self, entry), fields(name = %entry.name, streak = entry.streak))]
  async fn submit_entry(&self, entry: &LeaderboardEntry) -> Result<(), PersistenceError> {
    self.insert_row("leaderboard", entry).await
  }

  #[instrument(level = "info", skip(self))]
  async fn top_entries(
    &self,
    limit: usize,
    offset: usize,
    date: Option<NaiveDate>,
  ) -> Result<Vec<LeaderboardEntry>, PersistenceError> {
    self.select_leaderboard(&top_entries_query(limit, offset, date)).await
  }

  #[instrument(level = "info", skip(self))]
  async fn best_streak_for(&self, name: &str) -> Result<Option<u32>, PersistenceError> {
    let query = [
      ("name", format!("eq.{name}")),
      ("order", "streak.desc".to_string()),
      ("limit", "1".to_string()),
    ];
    Ok(self.select_leaderboard(&query).await?.first().map(|e| e.streak))
  }
}

// ---------------------------------------------------------------------------
// Runtime selection
// ---------------------------------------------------------------------------

/// The store the server actually runs against.
#[derive(Clone)]
pub enum PuzzleDb {
  Memory(MemoryStore),
  Supabase(SupabaseStore),
}

impl PuzzleDb {
  pub fn from_env() -> Self {
    match SupabaseStore::from_env() {
      Some(s) => {
        info!(target: "whatsit_backend", base_url = %s.base_url, "Supabase store enabled.");
        PuzzleDb::Supabase(s)
      }
      None => {
        info!(target: "whatsit_backend", "Supabase store disabled (no SUPABASE_URL/SUPABASE_SERVICE_ROLE_KEY). Using in-memory store.");
        PuzzleDb::Memory(MemoryStore::new())
      }
    }
  }

  pub fn backend_name(&self) -> &'static str {
    match self {
      PuzzleDb::Memory(_) => "memory",
      PuzzleDb::Supabase(_) => "supabase",
    }
  }
}

impl PuzzleStore for PuzzleDb {
  async fn insert_puzzle(&self, record: &PuzzleRecord) -> Result<(), PersistenceError> {
    match self {
      PuzzleDb::Memory(s) => PuzzleStore::insert_puzzle(s, record).await,
      PuzzleDb::Supabase(s) => PuzzleStore::insert_puzzle(s, record).await,
    }
  }
}

impl LeaderboardStore for PuzzleDb {
  async fn submit_entry(&self, entry: &LeaderboardEntry) -> Result<(), PersistenceError> {
    match self {
      PuzzleDb::Memory(s) => LeaderboardStore::submit_entry(s, entry).await,
      PuzzleDb::Supabase(s) => LeaderboardStore::submit_entry(s, entry).await,
    }
  }

  async fn top_entries(
    &self,
    limit: usize,
    offset: usize,
    date: Option<NaiveDate>,
  ) -> Result<Vec<LeaderboardEntry>, PersistenceError> {
    match self {
      PuzzleDb::Memory(s) => LeaderboardStore::top_entries(s, limit, offset, date).await,
      PuzzleDb::Supabase(s) => LeaderboardStore::top_entries(s, limit, offset, date).await,
    }
  }

  async fn best_streak_for(&self, name: &str) -> Result<Option<u32>, PersistenceError> {
    match self {
      PuzzleDb::Memory(s) => LeaderboardStore::best_streak_for(s, name).await,
      PuzzleDb::Supabase(s) => LeaderboardStore::best_streak_for(s, name).await,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(name: &str, streak: u32, date: &str) -> LeaderboardEntry {
    LeaderboardEntry { name: name.into(), streak, date: date.parse().unwrap() }
  }

  #[tokio::test]
  async fn memory_store_appends_puzzle_rows() {
    let db = PuzzleDb::Memory(MemoryStore::new());
    let rec = PuzzleRecord {
      zoomed_image_url: "z".into(),
      full_image_url: "f".into(),
      correct_answer: "dog".into(),
      acceptable_answers: r#"["dog"]"#.into(),
      hint: "h".into(),
      category: "Animals & Nature".into(),
      photographer: "p".into(),
      photographer_url: "u".into(),
    };
    PuzzleStore::insert_puzzle(&db, &rec).await.unwrap();
    PuzzleStore::insert_puzzle(&db, &rec).await.unwrap();
    let PuzzleDb::Memory(mem) = &db else { unreachable!() };
    assert_eq!(mem.puzzle_rows().await.len(), 2);
  }

  #[tokio::test]
  async fn leaderboard_orders_filters_and_limits() {
    let store = MemoryStore::new();
    for e in [
      entry("ann", 3, "2026-10-01"),
      entry("bob", 7, "2026-10-01"),
      entry("cy", 5, "2026-10-02"),
      entry("ann", 9, "2026-10-02"),
    ] {
      LeaderboardStore::submit_entry(&store, &e).await.unwrap();
    }

    let top = LeaderboardStore::top_entries(&store, 2, 0, None).await.unwrap();
    assert_eq!(top.iter().map(|e| e.streak).collect::<Vec<_>>(), vec![9, 7]);

    let next = LeaderboardStore::top_entries(&store, 2, 2, None).await.unwrap();
    assert_eq!(next.iter().map(|e| e.streak).collect::<Vec<_>>(), vec![5, 3]);
    assert!(LeaderboardStore::top_entries(&store, 2, 4, None).await.unwrap().is_empty());

    let day = LeaderboardStore::top_entries(&store, 10, 0, Some("2026-10-01".parse().unwrap())).await.unwrap();
    assert_eq!(day.iter().map(|e| e.name.as_str()).collect::<Vec<_>>(), vec!["bob", "ann"]);

    assert_eq!(LeaderboardStore::best_streak_for(&store, "ann").await.unwrap(), Some(9));
    assert_eq!(LeaderboardStore::best_streak_for(&store, "zed").await.unwrap(), None);
  }

  #[test]
  fn supabase_page_query_carries_range_and_date() {
    let q = top_entries_query(10, 20, Some("2026-10-16".parse().unwrap()));
    assert_eq!(
      q,
      vec![
        ("order", "streak.desc".to_string()),
        ("limit", "10".to_string()),
        ("offset", "20".to_string()),
        ("date", "eq.2026-10-16".to_string()),
      ]
    );
    assert_eq!(top_entries_query(5, 0, None).len(), 3);
  }

  #[test]
  fn supabase_store_builds_table_urls() {
    let store = SupabaseStore::new("https://db.example.co/".into(), "key".into()).unwrap();
    assert_eq!(store.table_url("leaderboard"), "https://db.example.co/rest/v1/leaderboard");
  }

  #[test]
  fn postgrest_errors_are_extracted() {
    assert_eq!(
      extract_postgrest_error(r#"{"code":"42P01","message":"relation \"images\" does not exist"}"#).as_deref(),
      Some("relation \"images\" does not exist")
    );
    assert_eq!(extract_postgrest_error("gateway timeout"), None);
  }

  #[test]
  fn leaderboard_entries_round_trip_postgrest_rows() {
    let rows: Vec<LeaderboardEntry> =
      serde_json::from_str(r#"[{"name":"ann","streak":4,"date":"2026-10-16"}]"#).unwrap();
    assert_eq!(rows[0], entry("ann", 4, "2026-10-16"));
  }
}
