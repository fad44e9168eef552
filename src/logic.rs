//! Per-player game driver shared by the WebSocket handler.
//!
//! A `PlayerGame` owns at most one live `PuzzleSession` and the player's
//! `StreakTracker`. It turns session transitions into streak updates and
//! degrades any generation failure to the built-in fallback puzzle.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::domain::{CategoryRequest, Difficulty, LeaderboardEntry, Puzzle};
use crate::error::{ClaimError, GenerationError, InvalidGuessState};
use crate::generator::PuzzleGenerator;
use crate::provider::ImageProvider;
use crate::seeds::fallback_puzzle;
use crate::session::{GuessOutcome, PuzzleSession};
use crate::store::{LeaderboardStore, PuzzleStore};
use crate::streak::{LocalStore, StreakTracker};

pub const MAX_NAME_CHARS: usize = 32;

/// Where the current puzzle came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PuzzleOrigin {
  Generated,
  Fallback,
}

impl PuzzleOrigin {
  pub fn as_str(self) -> &'static str {
    match self {
      PuzzleOrigin::Generated => "generated",
      PuzzleOrigin::Fallback => "fallback",
    }
  }
}

/// Everything the client needs after a guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GuessReport {
  pub outcome: GuessOutcome,
  pub streak: u32,
  pub best_streak: u32,
  pub new_best: bool,
  pub perfect: bool,
}

pub struct PlayerGame {
  session: Option<PuzzleSession>,
  streak: StreakTracker,
}

impl PlayerGame {
  pub fn new(local: Arc<dyn LocalStore>) -> Self {
    Self { session: None, streak: StreakTracker::load(local) }
  }

  pub fn session(&self) -> Option<&PuzzleSession> {
    self.session.as_ref()
  }

  pub fn streak(&self) -> &StreakTracker {
    &self.streak
  }

  /// Replace the current session with a fresh one for `puzzle`.
  pub fn start(&mut self, puzzle: Puzzle) -> &PuzzleSession {
    self.session.insert(PuzzleSession::new(puzzle))
  }

  fn start_or_fallback(&mut self, generated: Result<Puzzle, GenerationError>) -> PuzzleOrigin {
    match generated {
      Ok(p) => {
        self.start(p);
        PuzzleOrigin::Generated
      }
      Err(e) => {
        warn!(target: "session", error = %e, "Puzzle generation failed; serving fallback puzzle");
        self.start(fallback_puzzle());
        PuzzleOrigin::Fallback
      }
    }
  }

  /// Start a new round. With no generator configured, or on any generation
  /// error, the fallback puzzle is served instead.
  #[instrument(level = "info", skip(self, generator), fields(?category, %difficulty))]
  pub async fn request_puzzle<P, S>(
    &mut self,
    generator: Option<&PuzzleGenerator<P, S>>,
    category: &CategoryRequest,
    difficulty: Difficulty,
  ) -> PuzzleOrigin
  where
    P: ImageProvider + Sync,
    S: PuzzleStore + Sync,
  {
    let generated = match generator {
      Some(g) => g.generate(category, difficulty).await,
      None => Err(GenerationError::Disabled),
    };
    self.start_or_fallback(generated)
  }

  /// Start the puzzle for a calendar date. Future dates are refused and leave
  /// the current session untouched; other failures fall back.
  #[instrument(level = "info", skip(self, generator), fields(%date, %today, %difficulty))]
  pub async fn request_daily<P, S>(
    &mut self,
    generator: Option<&PuzzleGenerator<P, S>>,
    date: NaiveDate,
    today: NaiveDate,
    difficulty: Difficulty,
  ) -> Result<PuzzleOrigin, GenerationError>
  where
    P: ImageProvider + Sync,
    S: PuzzleStore + Sync,
  {
    if date > today {
      return Err(GenerationError::FutureDate(date));
    }
    let generated = match generator {
      Some(g) => g.generate_daily(date, today, difficulty).await,
      None => Err(GenerationError::Disabled),
    };
    Ok(self.start_or_fallback(generated))
  }

  #[instrument(level = "info", skip(self, text), fields(text_len = text.len()))]
  pub fn submit_guess(&mut self, text: &str) -> Result<GuessReport, InvalidGuessState> {
    self.apply_guess(|s| s.submit_guess(text))
  }

  /// Update the pending guess input of the current round.
  pub fn set_draft(&mut self, text: String) -> Result<&PuzzleSession, InvalidGuessState> {
    let session = self.session.as_mut().ok_or(InvalidGuessState::NoSession)?;
    session.set_draft(text);
    Ok(session)
  }

  /// Submit whatever is in the pending guess input.
  #[instrument(level = "info", skip(self))]
  pub fn submit_draft(&mut self) -> Result<GuessReport, InvalidGuessState> {
    self.apply_guess(PuzzleSession::submit_draft)
  }

  fn apply_guess(
    &mut self,
    guess: impl FnOnce(&mut PuzzleSession) -> Result<GuessOutcome, InvalidGuessState>,
  ) -> Result<GuessReport, InvalidGuessState> {
    let session = self.session.as_mut().ok_or(InvalidGuessState::NoSession)?;
    let outcome = guess(session)?;
    let perfect = session.perfect_solve();

    let mut new_best = false;
    match outcome {
      GuessOutcome::Correct => {
        let streak = self.streak.record_win();
        info!(target: "session", streak, perfect, "Puzzle solved");
      }
      GuessOutcome::OutOfGuesses => {
        let ended = self.streak.current();
        match self.streak.record_loss() {
          Ok(end) => new_best = end.new_best,
          Err(e) => warn!(target: "session", ended, error = %e, "Could not persist streak; it was still reset"),
        }
        info!(target: "session", ended, new_best, "Puzzle lost");
      }
      GuessOutcome::Wrong { remaining } => {
        info!(target: "session", remaining, "Wrong guess");
      }
    }

    Ok(GuessReport {
      outcome,
      streak: self.streak.current(),
      best_streak: self.streak.best(),
      new_best,
      perfect,
    })
  }

  pub fn use_hint(&mut self) -> Result<String, InvalidGuessState> {
    let session = self.session.as_mut().ok_or(InvalidGuessState::NoSession)?;
    session.use_hint().map(str::to_string)
  }

  /// Put the pending streak on the leaderboard under `name`. The pending
  /// value is only cleared once the store has accepted the entry.
  #[instrument(level = "info", skip(self, store), fields(%name, %today))]
  pub async fn claim_streak<L: LeaderboardStore + Sync>(
    &mut self,
    store: &L,
    name: &str,
    today: NaiveDate,
  ) -> Result<LeaderboardEntry, ClaimError> {
    let name: String = name.trim().chars().take(MAX_NAME_CHARS).collect();
    if name.is_empty() {
      return Err(ClaimError::EmptyName);
    }
    let streak = self.streak.pending()?.ok_or(ClaimError::NothingPending)?;
    let entry = LeaderboardEntry { name, streak, date: today };
    store.submit_entry(&entry).await?;
    self.streak.claim_pending()?;
    info!(target: "session", name = %entry.name, streak, "Streak saved to leaderboard");
    Ok(entry)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::GameConfig;
  use crate::domain::Category;
  use crate::generator::testing::ScriptedProvider;
  use crate::session::Status;
  use crate::store::MemoryStore;
  use crate::streak::{MemoryLocalStore, BEST_STREAK_KEY, PENDING_STREAK_KEY};
  use rand::{rngs::StdRng, SeedableRng};

  type Gen = PuzzleGenerator<ScriptedProvider, MemoryStore>;

  fn today() -> NaiveDate {
    "2026-10-16".parse().unwrap()
  }

  fn dog_puzzle() -> Puzzle {
    Puzzle {
      id: "dog-1".into(),
      category: Category::AnimalsAndNature,
      answer: "dog".into(),
      acceptable_answers: ["dog", "puppy", "doggy", "pup"].iter().map(|s| s.to_string()).collect(),
      hint: "A popular pet in many homes".into(),
      image_url: "https://img/zoomed".into(),
      full_image_url: "https://img/full".into(),
      photographer: "p".into(),
      photographer_url: "u".into(),
      difficulty: Difficulty::Regular,
    }
  }

  fn game() -> (PlayerGame, Arc<dyn LocalStore>) {
    let local: Arc<dyn LocalStore> = Arc::new(MemoryLocalStore::new());
    (PlayerGame::new(local.clone()), local)
  }

  fn generator(provider: ScriptedProvider) -> Gen {
    PuzzleGenerator::with_rng(provider, Arc::new(MemoryStore::new()), Arc::new(GameConfig::default()), StdRng::seed_from_u64(3))
  }

  #[tokio::test]
  async fn without_generator_the_banana_fallback_is_served_and_winnable() {
    let (mut g, _) = game();
    let origin = g.request_puzzle(None::<&Gen>, &CategoryRequest::Absent, Difficulty::Regular).await;
    assert_eq!(origin, PuzzleOrigin::Fallback);
    assert_eq!(g.session().unwrap().puzzle().answer, "banana");

    let r = g.submit_guess("Bananas!").unwrap();
    assert_eq!(r.outcome, GuessOutcome::Correct);
    assert_eq!(r.streak, 1);
    assert!(r.perfect);
  }

  #[tokio::test]
  async fn exhausted_generation_falls_back() {
    let (mut g, _) = game();
    let gen = generator(ScriptedProvider::failing(5));
    let origin = g.request_puzzle(Some(&gen), &CategoryRequest::Absent, Difficulty::Easy).await;
    assert_eq!(origin, PuzzleOrigin::Fallback);
    assert_eq!(g.session().unwrap().puzzle().id, fallback_puzzle().id);
  }

  #[tokio::test]
  async fn generated_puzzle_replaces_previous_session() {
    let (mut g, _) = game();
    g.start(dog_puzzle());
    g.submit_guess("cat").unwrap();

    let gen = generator(ScriptedProvider::default());
    let origin = g.request_puzzle(Some(&gen), &CategoryRequest::Random, Difficulty::Regular).await;
    assert_eq!(origin, PuzzleOrigin::Generated);
    let s = g.session().unwrap();
    assert_ne!(s.puzzle().id, "dog-1");
    assert_eq!(s.guesses_remaining(), 3);
  }

  #[test]
  fn losing_resets_streak_and_updates_best_conditionally() {
    let local: Arc<dyn LocalStore> = Arc::new(MemoryLocalStore::new());
    local.set(BEST_STREAK_KEY, "1").unwrap();
    let mut g = PlayerGame::new(local.clone());

    for _ in 0..2 {
      g.start(dog_puzzle());
      g.submit_guess("dog").unwrap();
    }
    assert_eq!(g.streak().current(), 2);

    g.start(dog_puzzle());
    assert_eq!(g.submit_guess("cat").unwrap().outcome, GuessOutcome::Wrong { remaining: 2 });
    assert_eq!(g.submit_guess("car").unwrap().outcome, GuessOutcome::Wrong { remaining: 1 });
    let r = g.submit_guess("cow").unwrap();
    assert_eq!(r.outcome, GuessOutcome::OutOfGuesses);
    assert_eq!(r.streak, 0);
    assert!(r.new_best);
    assert_eq!(r.best_streak, 2);
    assert_eq!(g.session().unwrap().status(), Status::Lost);
    assert_eq!(local.get(BEST_STREAK_KEY).unwrap().as_deref(), Some("2"));
    assert_eq!(local.get(PENDING_STREAK_KEY).unwrap().as_deref(), Some("2"));
  }

  #[test]
  fn actions_without_a_session_are_rejected() {
    let (mut g, _) = game();
    assert_eq!(g.submit_guess("dog"), Err(InvalidGuessState::NoSession));
    assert_eq!(g.use_hint(), Err(InvalidGuessState::NoSession));
  }

  #[test]
  fn draft_is_submitted_and_cleared() {
    let (mut g, _) = game();
    assert_eq!(g.set_draft("dog".into()).err(), Some(InvalidGuessState::NoSession));
    g.start(dog_puzzle());
    assert_eq!(g.set_draft("Puppy!".into()).unwrap().draft(), "Puppy!");
    let r = g.submit_draft().unwrap();
    assert_eq!(r.outcome, GuessOutcome::Correct);
    assert_eq!(r.streak, 1);
    assert_eq!(g.session().unwrap().draft(), "");
  }

  #[test]
  fn hint_is_forwarded_to_the_session() {
    let (mut g, _) = game();
    g.start(dog_puzzle());
    assert_eq!(g.use_hint().unwrap(), "A popular pet in many homes");
    assert_eq!(g.use_hint(), Err(InvalidGuessState::HintAlreadyUsed));
    assert_eq!(g.session().unwrap().guesses_remaining(), 2);
  }

  #[tokio::test]
  async fn future_daily_is_refused_without_touching_the_session() {
    let (mut g, _) = game();
    g.start(dog_puzzle());
    let gen = generator(ScriptedProvider::default());
    let err = g
      .request_daily(Some(&gen), "2026-10-17".parse().unwrap(), today(), Difficulty::Regular)
      .await
      .unwrap_err();
    assert!(matches!(err, GenerationError::FutureDate(_)));
    assert_eq!(g.session().unwrap().puzzle().id, "dog-1");
  }

  #[tokio::test]
  async fn past_daily_is_generated() {
    let (mut g, _) = game();
    let gen = generator(ScriptedProvider::default());
    let date: NaiveDate = "2026-09-30".parse().unwrap();
    let origin = g.request_daily(Some(&gen), date, today(), Difficulty::Easy).await.unwrap();
    assert_eq!(origin, PuzzleOrigin::Generated);
    let (_, term) = gen.daily_term(date, Difficulty::Easy).unwrap();
    assert_eq!(g.session().unwrap().puzzle().answer, term);
  }

  #[tokio::test]
  async fn claiming_a_streak_writes_the_leaderboard_once() {
    let (mut g, local) = game();
    let board = MemoryStore::new();

    assert!(matches!(g.claim_streak(&board, "ann", today()).await, Err(ClaimError::NothingPending)));

    g.start(dog_puzzle());
    g.submit_guess("dog").unwrap();
    g.start(dog_puzzle());
    for guess in ["a", "b", "c"] {
      g.submit_guess(guess).unwrap();
    }

    assert!(matches!(g.claim_streak(&board, "   ", today()).await, Err(ClaimError::EmptyName)));
    let entry = g.claim_streak(&board, "  Ann ", today()).await.unwrap();
    assert_eq!(entry, LeaderboardEntry { name: "Ann".into(), streak: 1, date: today() });
    assert_eq!(local.get(PENDING_STREAK_KEY).unwrap(), None);
    assert!(matches!(g.claim_streak(&board, "Ann", today()).await, Err(ClaimError::NothingPending)));
    assert_eq!(board.top_entries(10, 0, None).await.unwrap(), vec![entry]);
  }
}
