//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! generator and the leaderboard store.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument, warn};

use crate::domain::{CategoryRequest, Difficulty, LeaderboardEntry};
use crate::error::GenerationError;
use crate::logic::MAX_NAME_CHARS;
use crate::protocol::*;
use crate::state::AppState;
use crate::store::{LeaderboardStore, DEFAULT_LEADERBOARD_LIMIT};

pub const RANDOM_CATEGORY_LABEL: &str = "Surprise Me!";
const MAX_LEADERBOARD_LIMIT: usize = 100;

fn error_out(status: StatusCode, error: impl Into<String>, details: impl Into<String>) -> Response {
  (status, Json(ErrorOut { error: error.into(), details: details.into() })).into_response()
}

/// Status code and `{error, details}` body for a failed generation request.
pub fn generation_error_response(e: &GenerationError) -> Response {
  match e {
    GenerationError::Exhausted { attempts, last } => error_out(
      StatusCode::INTERNAL_SERVER_ERROR,
      format!("Failed to generate puzzle after {attempts} attempts"),
      last.to_string(),
    ),
    GenerationError::NoTerms(_) => error_out(StatusCode::INTERNAL_SERVER_ERROR, "No search terms configured", e.to_string()),
    GenerationError::FutureDate(_) => error_out(StatusCode::BAD_REQUEST, "Invalid date", e.to_string()),
    GenerationError::Disabled => error_out(StatusCode::SERVICE_UNAVAILABLE, "Image provider unavailable", e.to_string()),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    image_provider: state.generator.is_some(),
    store: state.db.backend_name(),
  })
}

#[instrument(level = "info", skip(state, body), fields(category = ?body.category, difficulty = ?body.difficulty, date = ?body.date))]
pub async fn http_post_puzzle(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PuzzleRequest>,
) -> Response {
  let difficulty = Difficulty::from_request(body.difficulty.as_deref());
  let category = CategoryRequest::parse(body.category.as_deref());
  let today = state.today();
  if let Some(date) = body.date.filter(|d| *d > today) {
    return generation_error_response(&GenerationError::FutureDate(date));
  }

  let Some(generator) = state.generator.as_ref() else {
    warn!(target: "puzzle", "Puzzle requested but no image provider is configured");
    return generation_error_response(&GenerationError::Disabled);
  };

  let result = match body.date {
    Some(date) => generator.generate_daily(date, today, difficulty).await,
    None => generator.generate(&category, difficulty).await,
  };

  match result {
    Ok(puzzle) => {
      info!(target: "puzzle", id = %puzzle.id, category = %puzzle.category, %difficulty, "HTTP puzzle served");
      Json(puzzle).into_response()
    }
    Err(e) => {
      error!(target: "puzzle", error = %e, "HTTP puzzle generation failed");
      generation_error_response(&e)
    }
  }
}

#[instrument(level = "info", skip(state), fields(difficulty = ?q.difficulty))]
pub async fn http_get_categories(
  State(state): State<Arc<AppState>>,
  Query(q): Query<CategoriesQuery>,
) -> impl IntoResponse {
  let difficulty = Difficulty::from_request(q.difficulty.as_deref());
  Json(CategoriesOut {
    difficulty,
    categories: state.config.categories(difficulty),
    random: RANDOM_CATEGORY_LABEL,
  })
}

#[instrument(level = "info", skip(state), fields(date = ?q.date, limit = ?q.limit, offset = ?q.offset))]
pub async fn http_get_leaderboard(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LeaderboardQuery>,
) -> Response {
  let limit = q.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT).clamp(1, MAX_LEADERBOARD_LIMIT);
  match state.db.top_entries(limit, q.offset.unwrap_or(0), q.date).await {
    Ok(entries) => Json(LeaderboardOut { entries }).into_response(),
    Err(e) => {
      error!(target: "whatsit_backend", error = %e, "Leaderboard read failed");
      error_out(StatusCode::BAD_GATEWAY, "Leaderboard unavailable", e.to_string())
    }
  }
}

#[instrument(level = "info", skip(state), fields(name = %q.name))]
pub async fn http_get_player_best(
  State(state): State<Arc<AppState>>,
  Query(q): Query<PlayerBestQuery>,
) -> Response {
  let name = q.name.trim().to_string();
  match state.db.best_streak_for(&name).await {
    Ok(best) => Json(PlayerBestOut { name, best }).into_response(),
    Err(e) => {
      error!(target: "whatsit_backend", error = %e, "Leaderboard read failed");
      error_out(StatusCode::BAD_GATEWAY, "Leaderboard unavailable", e.to_string())
    }
  }
}

#[instrument(level = "info", skip(state, body), fields(name = %body.name, streak = body.streak))]
pub async fn http_post_leaderboard(
  State(state): State<Arc<AppState>>,
  Json(body): Json<LeaderboardIn>,
) -> Response {
  let name: String = body.name.trim().chars().take(MAX_NAME_CHARS).collect();
  if name.is_empty() {
    return error_out(StatusCode::BAD_REQUEST, "Invalid entry", "name must not be empty");
  }
  if body.streak == 0 {
    return error_out(StatusCode::BAD_REQUEST, "Invalid entry", "streak must be at least 1");
  }

  let entry = LeaderboardEntry { name, streak: body.streak, date: state.today() };
  match state.db.submit_entry(&entry).await {
    Ok(()) => {
      info!(target: "whatsit_backend", name = %entry.name, streak = entry.streak, "Leaderboard entry saved");
      (StatusCode::CREATED, Json(entry)).into_response()
    }
    Err(e) => {
      error!(target: "whatsit_backend", error = %e, "Leaderboard write failed");
      error_out(StatusCode::BAD_GATEWAY, "Leaderboard unavailable", e.to_string())
    }
  }
}
