//! Play-through state for one puzzle.
//!
//! `playing` is the only state that accepts guesses or hints; `won` and `lost`
//! are terminal. A session is replaced wholesale when the next puzzle is
//! requested, so a guess can never land on a stale puzzle.

use serde::Serialize;

use crate::domain::Puzzle;
use crate::error::InvalidGuessState;
use crate::util::normalize;

pub const MAX_GUESSES: u8 = 3;
/// Zoom applied to the cropped image per step of reveal level.
pub const ZOOM_STEP: f32 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
  Playing,
  Won,
  Lost,
}

/// What a single accepted guess did to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuessOutcome {
  Correct,
  Wrong { remaining: u8 },
  OutOfGuesses,
}

impl GuessOutcome {
  pub fn is_terminal(self) -> bool {
    !matches!(self, GuessOutcome::Wrong { .. })
  }
}

/// Presentation-only reveal state, derived from guesses remaining.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reveal {
  /// 0 while untouched, +1 per spent guess; `MAX_GUESSES` once the game ends.
  pub level: u8,
  /// Magnification of the cropped image; 1.0 when showing the full photo.
  pub zoom: f32,
  pub full_image: bool,
}

#[derive(Clone, Debug)]
pub struct PuzzleSession {
  puzzle: Puzzle,
  guesses_remaining: u8,
  hint_used: bool,
  status: Status,
  draft: String,
}

impl PuzzleSession {
  pub fn new(puzzle: Puzzle) -> Self {
    Self {
      puzzle,
      guesses_remaining: MAX_GUESSES,
      hint_used: false,
      status: Status::Playing,
      draft: String::new(),
    }
  }

  pub fn puzzle(&self) -> &Puzzle {
    &self.puzzle
  }
  pub fn guesses_remaining(&self) -> u8 {
    self.guesses_remaining
  }
  pub fn hint_used(&self) -> bool {
    self.hint_used
  }
  pub fn status(&self) -> Status {
    self.status
  }
  pub fn draft(&self) -> &str {
    &self.draft
  }
  pub fn is_finished(&self) -> bool {
    self.status != Status::Playing
  }

  /// Update the pending guess input without submitting it.
  pub fn set_draft(&mut self, text: impl Into<String>) {
    self.draft = text.into();
  }

  /// Submit whatever is in the draft input.
  pub fn submit_draft(&mut self) -> Result<GuessOutcome, InvalidGuessState> {
    let text = std::mem::take(&mut self.draft);
    self.submit_guess(&text)
  }

  /// Check a guess against the acceptable answers. A match wins without
  /// spending a guess; a miss spends one and the last miss loses. The draft
  /// input is cleared whatever the result.
  pub fn submit_guess(&mut self, text: &str) -> Result<GuessOutcome, InvalidGuessState> {
    self.draft.clear();
    if self.is_finished() {
      return Err(InvalidGuessState::Finished(self.status));
    }

    let guess = normalize(text);
    if self.puzzle.acceptable_answers.contains(&guess) {
      self.status = Status::Won;
      return Ok(GuessOutcome::Correct);
    }

    self.guesses_remaining = self.guesses_remaining.saturating_sub(1);
    if self.guesses_remaining == 0 {
      self.status = Status::Lost;
      Ok(GuessOutcome::OutOfGuesses)
    } else {
      Ok(GuessOutcome::Wrong { remaining: self.guesses_remaining })
    }
  }

  /// Spend one guess to reveal the hint. Refused once used, and refused when
  /// only one guess is left so a hint can never end the game by itself.
  pub fn use_hint(&mut self) -> Result<&str, InvalidGuessState> {
    if self.is_finished() {
      return Err(InvalidGuessState::Finished(self.status));
    }
    if self.hint_used {
      return Err(InvalidGuessState::HintAlreadyUsed);
    }
    if self.guesses_remaining <= 1 {
      return Err(InvalidGuessState::HintWouldEndGame);
    }
    self.hint_used = true;
    self.guesses_remaining -= 1;
    Ok(&self.puzzle.hint)
  }

  /// The hint text, only once it has been paid for.
  pub fn visible_hint(&self) -> Option<&str> {
    self.hint_used.then_some(self.puzzle.hint.as_str())
  }

  pub fn can_use_hint(&self) -> bool {
    !self.is_finished() && !self.hint_used && self.guesses_remaining > 1
  }

  pub fn reveal(&self) -> Reveal {
    if self.is_finished() {
      return Reveal { level: MAX_GUESSES, zoom: 1.0, full_image: true };
    }
    let level = MAX_GUESSES - self.guesses_remaining;
    let zoom = 1.0 + f32::from(level) * ZOOM_STEP;
    Reveal { level, zoom, full_image: false }
  }

  /// Image the player should currently see.
  pub fn image_url(&self) -> &str {
    if self.is_finished() {
      &self.puzzle.full_image_url
    } else {
      &self.puzzle.image_url
    }
  }

  /// Won on the first guess without a hint. Celebration only, never scored.
  pub fn perfect_solve(&self) -> bool {
    self.status == Status::Won && !self.hint_used && self.guesses_remaining == MAX_GUESSES
  }
}
