//! Error taxonomy for generation, persistence and play.
//!
//! Provider and persistence failures only ever surface wrapped in
//! `GenerationError::Exhausted`; the generator retries them first.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Difficulty;
use crate::session::Status;

#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("image provider request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("image provider HTTP {status}: {message}")]
  Status { status: u16, message: String },

  #[error("malformed image provider payload: {0}")]
  Malformed(String),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
  #[error("durable store request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("durable store HTTP {status}: {message}")]
  Status { status: u16, message: String },

  #[error("could not encode puzzle record: {0}")]
  Serialize(#[from] serde_json::Error),
}

/// Why a single generation attempt was abandoned.
#[derive(Debug, Error)]
pub enum AttemptError {
  #[error(transparent)]
  Provider(#[from] ProviderError),

  #[error(transparent)]
  Persistence(#[from] PersistenceError),
}

#[derive(Debug, Error)]
pub enum GenerationError {
  #[error("failed to generate puzzle after {attempts} attempts: {last}")]
  Exhausted {
    attempts: usize,
    #[source]
    last: AttemptError,
  },

  #[error("no search terms configured for {0} mode")]
  NoTerms(Difficulty),

  #[error("you can't play puzzles from the future ({0})")]
  FutureDate(NaiveDate),

  #[error("image provider is not configured (UNSPLASH_ACCESS_KEY unset)")]
  Disabled,
}

/// A guess or hint requested against a session that cannot take it.
/// Rejections never change session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidGuessState {
  #[error("no puzzle in progress")]
  NoSession,

  #[error("puzzle already finished ({0:?})")]
  Finished(Status),

  #[error("hint already used")]
  HintAlreadyUsed,

  #[error("a hint cannot spend the last guess")]
  HintWouldEndGame,
}

#[derive(Debug, Error)]
pub enum LocalStoreError {
  #[error("local state IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("local state is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("local state file could not be replaced: {0}")]
  Persist(#[from] tempfile::PersistError),
}

/// Why a pending streak could not be put on the leaderboard.
#[derive(Debug, Error)]
pub enum ClaimError {
  #[error("player name is empty")]
  EmptyName,

  #[error("no finished streak is waiting to be claimed")]
  NothingPending,

  #[error(transparent)]
  Local(#[from] LocalStoreError),

  #[error("leaderboard submission failed: {0}")]
  Leaderboard(#[from] PersistenceError),
}
