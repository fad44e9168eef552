//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Category, Difficulty, LeaderboardEntry};
use crate::logic::{GuessReport, PuzzleOrigin};
use crate::session::{GuessOutcome, PuzzleSession, Reveal, Status};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    NewPuzzle {
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        difficulty: Option<String>,
    },
    DailyPuzzle {
        date: NaiveDate,
        #[serde(default)]
        difficulty: Option<String>,
    },
    /// Update the pending guess input without submitting it.
    Draft {
        text: String,
    },
    /// Submit `text`, or the pending input when `text` is absent.
    Guess {
        #[serde(default)]
        text: Option<String>,
    },
    Hint,
    ClaimStreak {
        name: String,
    },
    Stats,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Puzzle {
        origin: &'static str,
        session: SessionView,
    },
    GuessResult {
        correct: bool,
        #[serde(rename = "gameOver")]
        game_over: bool,
        /// Only revealed once the round is over.
        answer: Option<String>,
        streak: u32,
        #[serde(rename = "bestStreak")]
        best_streak: u32,
        #[serde(rename = "newBest")]
        new_best: bool,
        perfect: bool,
        session: SessionView,
    },
    Hint {
        text: String,
        session: SessionView,
    },
    Session {
        session: SessionView,
    },
    Rejected {
        reason: String,
    },
    Streak(StreakOut),
    LeaderboardSaved {
        entry: LeaderboardEntry,
    },
    Error {
        message: String,
    },
}

/// What a player may see of the current round. The answer and the answer set
/// stay server-side until the round is over.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub category: Category,
    pub difficulty: Difficulty,
    pub image_url: String,
    pub photographer: String,
    pub photographer_url: String,
    pub status: Status,
    pub guesses_remaining: u8,
    pub hint_used: bool,
    pub can_use_hint: bool,
    pub hint: Option<String>,
    pub reveal: Reveal,
    pub draft: String,
}

pub fn session_view(s: &PuzzleSession) -> SessionView {
    let p = s.puzzle();
    SessionView {
        id: p.id.clone(),
        category: p.category,
        difficulty: p.difficulty,
        image_url: s.image_url().to_string(),
        photographer: p.photographer.clone(),
        photographer_url: p.photographer_url.clone(),
        status: s.status(),
        guesses_remaining: s.guesses_remaining(),
        hint_used: s.hint_used(),
        can_use_hint: s.can_use_hint(),
        hint: s.visible_hint().map(str::to_string),
        reveal: s.reveal(),
        draft: s.draft().to_string(),
    }
}

pub fn puzzle_message(origin: PuzzleOrigin, s: &PuzzleSession) -> ServerWsMessage {
    ServerWsMessage::Puzzle { origin: origin.as_str(), session: session_view(s) }
}

pub fn guess_message(r: &GuessReport, s: &PuzzleSession) -> ServerWsMessage {
    let game_over = r.outcome.is_terminal();
    ServerWsMessage::GuessResult {
        correct: r.outcome == GuessOutcome::Correct,
        game_over,
        answer: game_over.then(|| s.puzzle().answer.clone()),
        streak: r.streak,
        best_streak: r.best_streak,
        new_best: r.new_best,
        perfect: r.perfect,
        session: session_view(s),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakOut {
    pub current: u32,
    pub best: u32,
    pub pending: Option<u32>,
}

//
// HTTP request/response DTOs
//

/// Body of `POST /api/v1/puzzle`.
#[derive(Debug, Default, Deserialize)]
pub struct PuzzleRequest {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesQuery {
    pub difficulty: Option<String>,
}
#[derive(Debug, Serialize)]
pub struct CategoriesOut {
    pub difficulty: Difficulty,
    pub categories: Vec<Category>,
    /// Label of the "pick one for me" choice.
    pub random: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub date: Option<NaiveDate>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}
#[derive(Debug, Deserialize)]
pub struct LeaderboardIn {
    pub name: String,
    pub streak: u32,
}
#[derive(Debug, Serialize)]
pub struct LeaderboardOut {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerBestQuery {
    pub name: String,
}
#[derive(Debug, Serialize)]
pub struct PlayerBestOut {
    pub name: String,
    pub best: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
    pub ok: bool,
    pub image_provider: bool,
    pub store: &'static str,
}
