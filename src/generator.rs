//! Puzzle generation: category → term → provider photo → answers + hint →
//! persisted record, retried as a whole up to `MAX_ATTEMPTS` times.
//!
//! Attempts run strictly one after another. A failed attempt writes nothing,
//! so every returned puzzle corresponds to exactly one stored row.

use std::sync::{Arc, Mutex};

use chrono::{Datelike, NaiveDate};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::answers::build_acceptable_answers;
use crate::config::GameConfig;
use crate::domain::{Category, CategoryRequest, Difficulty, Puzzle, PuzzleRecord};
use crate::error::{AttemptError, GenerationError, PersistenceError, ProviderError};
use crate::hints::select_hint;
use crate::provider::ImageProvider;
use crate::seeds::default_category;
use crate::store::PuzzleStore;
use crate::util::{sized_image_url, CacheBuster};

pub const MAX_ATTEMPTS: usize = 5;
pub const ZOOMED_WIDTH: u32 = 800;
pub const FULL_WIDTH: u32 = 1200;

/// Where each attempt's search term comes from.
enum TermSource {
  /// Fresh uniform pick from the category on every attempt.
  Random(Category),
  /// Same term on every attempt (daily puzzles).
  Fixed(Category, String),
}

pub struct PuzzleGenerator<P, S> {
  provider: P,
  store: Arc<S>,
  config: Arc<GameConfig>,
  rng: Mutex<StdRng>,
}

impl<P, S> PuzzleGenerator<P, S>
where
  P: ImageProvider + Sync,
  S: PuzzleStore + Sync,
{
  pub fn new(provider: P, store: Arc<S>, config: Arc<GameConfig>) -> Self {
    Self::with_rng(provider, store, config, StdRng::from_entropy())
  }

  /// Deterministic construction for tests and replays.
  pub fn with_rng(provider: P, store: Arc<S>, config: Arc<GameConfig>, rng: StdRng) -> Self {
    Self { provider, store, config, rng: Mutex::new(rng) }
  }

  // The guard never outlives this call, so it is never held across an await.
  fn lock_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut guard = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut guard)
  }

  /// Map a request onto a playable category for this mode. Unknown or absent
  /// categories become the mode default; the random sentinel draws from the
  /// mode's real categories only.
  pub fn resolve_category(&self, request: &CategoryRequest, difficulty: Difficulty) -> Result<Category, GenerationError> {
    let table = self.config.terms(difficulty);
    let default = default_category(difficulty);
    let fallback = || {
      if table.contains_key(&default) {
        Some(default)
      } else {
        table.keys().next().copied()
      }
    };

    let resolved = match request {
      CategoryRequest::Named(c) if table.contains_key(c) => Some(*c),
      CategoryRequest::Random => {
        let pool: Vec<Category> = table.keys().copied().collect();
        self.lock_rng(|rng| pool.choose(rng).copied())
      }
      CategoryRequest::Absent => fallback(),
      CategoryRequest::Named(c) => {
        let chosen = fallback();
        info!(target: "puzzle", category = %c, %difficulty, substitute = ?chosen, "Category has no terms in this mode; using default");
        chosen
      }
      CategoryRequest::Unknown(label) => {
        let chosen = fallback();
        info!(target: "puzzle", %label, %difficulty, substitute = ?chosen, "Unknown category; using default");
        chosen
      }
    };
    resolved.ok_or(GenerationError::NoTerms(difficulty))
  }

  fn pick_term(&self, source: &TermSource, difficulty: Difficulty) -> Result<(Category, String), GenerationError> {
    match source {
      TermSource::Fixed(c, term) => Ok((*c, term.clone())),
      TermSource::Random(c) => {
        let terms = self.config.terms(difficulty).get(c).ok_or(GenerationError::NoTerms(difficulty))?;
        let term = self
          .lock_rng(|rng| terms.choose(rng).cloned())
          .ok_or(GenerationError::NoTerms(difficulty))?;
        Ok((*c, term))
      }
    }
  }

  /// Generate and persist one puzzle.
  #[instrument(level = "info", skip(self), fields(%difficulty))]
  pub async fn generate(&self, category: &CategoryRequest, difficulty: Difficulty) -> Result<Puzzle, GenerationError> {
    let resolved = self.resolve_category(category, difficulty)?;
    self.run_attempts(TermSource::Random(resolved), difficulty).await
  }

  /// Puzzle of the day: category and term are fixed by the date so every
  /// player searches the same subject; the photo itself still varies.
  #[instrument(level = "info", skip(self), fields(%date, %difficulty))]
  pub async fn generate_daily(&self, date: NaiveDate, today: NaiveDate, difficulty: Difficulty) -> Result<Puzzle, GenerationError> {
    if date > today {
      return Err(GenerationError::FutureDate(date));
    }
    let (category, term) = self.daily_term(date, difficulty)?;
    self.run_attempts(TermSource::Fixed(category, term), difficulty).await
  }

  /// The (category, term) pair assigned to a calendar date.
  pub fn daily_term(&self, date: NaiveDate, difficulty: Difficulty) -> Result<(Category, String), GenerationError> {
    let seed = date.year() as u64 * 10_000 + date.month() as u64 * 100 + date.day() as u64;
    let salt = if difficulty.is_easy() { 1 } else { 0 };
    let mut day_rng = StdRng::seed_from_u64((seed << 1) | salt);
    let table = self.config.terms(difficulty);
    let categories: Vec<&Category> = table.keys().collect();
    let category = **categories.choose(&mut day_rng).ok_or(GenerationError::NoTerms(difficulty))?;
    let term = table[&category]
      .choose(&mut day_rng)
      .cloned()
      .ok_or(GenerationError::NoTerms(difficulty))?;
    Ok((category, term))
  }

  async fn run_attempts(&self, source: TermSource, difficulty: Difficulty) -> Result<Puzzle, GenerationError> {
    let mut last: Option<AttemptError> = None;
    for attempt in 1..=MAX_ATTEMPTS {
      let (category, term) = self.pick_term(&source, difficulty)?;
      info!(target: "puzzle", attempt, max = MAX_ATTEMPTS, %category, %term, %difficulty, "Generating puzzle");
      match self.attempt(category, &term, difficulty).await {
        Ok(puzzle) => {
          info!(target: "puzzle", attempt, id = %puzzle.id, %category, answers = puzzle.acceptable_answers.len(), "Puzzle generated and saved");
          return Ok(puzzle);
        }
        Err(e) => {
          warn!(target: "puzzle", attempt, max = MAX_ATTEMPTS, %term, error = %e, "Generation attempt failed");
          last = Some(e);
        }
      }
    }
    let last = last.unwrap_or_else(|| AttemptError::Provider(ProviderError::Malformed("no attempt was made".into())));
    error!(target: "puzzle", attempts = MAX_ATTEMPTS, error = %last, "Giving up on puzzle generation");
    Err(GenerationError::Exhausted { attempts: MAX_ATTEMPTS, last })
  }

  async fn attempt(&self, category: Category, term: &str, difficulty: Difficulty) -> Result<Puzzle, AttemptError> {
    let photo = self.provider.random_photo(term).await?;

    let (buster, hint) = self.lock_rng(|rng| {
      let buster = CacheBuster::fresh(rng);
      let hint = select_hint(category, term, difficulty.is_easy(), &self.config.hints, rng);
      (buster, hint)
    });
    let image_url = sized_image_url(&photo.regular_url, ZOOMED_WIDTH, &buster).map_err(ProviderError::Malformed)?;
    let full_image_url = sized_image_url(&photo.regular_url, FULL_WIDTH, &buster).map_err(ProviderError::Malformed)?;

    let acceptable_answers =
      build_acceptable_answers(term, &photo.description, &photo.tags, difficulty, &self.config.synonyms);

    let puzzle = Puzzle {
      id: Uuid::new_v4().to_string(),
      category,
      answer: term.to_string(),
      acceptable_answers,
      hint,
      image_url,
      full_image_url,
      photographer: photo.photographer,
      photographer_url: photo.photographer_url,
      difficulty,
    };

    let record = PuzzleRecord::from_puzzle(&puzzle).map_err(PersistenceError::from)?;
    self.store.insert_puzzle(&record).await?;
    Ok(puzzle)
  }
}
