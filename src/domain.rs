//! Domain models used by the backend: categories, difficulty, the generated puzzle,
//! the durable record written per generation, and leaderboard entries.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fixed set of puzzle categories. The display label is the wire form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
  #[serde(rename = "Animals & Nature")]
  AnimalsAndNature,
  #[serde(rename = "Movies & TV Shows")]
  MoviesAndTv,
  #[serde(rename = "Places & Landmarks")]
  PlacesAndLandmarks,
  #[serde(rename = "Famous People")]
  FamousPeople,
  #[serde(rename = "Food & Drinks")]
  FoodAndDrinks,
  #[serde(rename = "Everyday Objects")]
  EverydayObjects,
}

impl Category {
  pub const ALL: [Category; 6] = [
    Category::AnimalsAndNature,
    Category::MoviesAndTv,
    Category::PlacesAndLandmarks,
    Category::FamousPeople,
    Category::FoodAndDrinks,
    Category::EverydayObjects,
  ];

  pub fn label(self) -> &'static str {
    match self {
      Category::AnimalsAndNature => "Animals & Nature",
      Category::MoviesAndTv => "Movies & TV Shows",
      Category::PlacesAndLandmarks => "Places & Landmarks",
      Category::FamousPeople => "Famous People",
      Category::FoodAndDrinks => "Food & Drinks",
      Category::EverydayObjects => "Everyday Objects",
    }
  }

  /// Exact label match, case-insensitive.
  pub fn from_label(label: &str) -> Option<Category> {
    let wanted = label.trim();
    Category::ALL
      .into_iter()
      .find(|c| c.label().eq_ignore_ascii_case(wanted))
  }
}

impl std::fmt::Display for Category {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// What the client asked for. Anything that is neither a known label nor the
/// random sentinel is `Unknown` and resolves to the mode's default category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryRequest {
  Absent,
  Random,
  Named(Category),
  Unknown(String),
}

impl CategoryRequest {
  pub fn parse(raw: Option<&str>) -> Self {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
      return CategoryRequest::Absent;
    };
    if raw.eq_ignore_ascii_case("random") || raw.eq_ignore_ascii_case("surprise me!") {
      return CategoryRequest::Random;
    }
    match Category::from_label(raw) {
      Some(c) => CategoryRequest::Named(c),
      None => CategoryRequest::Unknown(raw.to_string()),
    }
  }
}

/// Controls which term table and hint style are used.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  #[default]
  Regular,
}

impl Difficulty {
  /// Only the literal "easy" selects easy mode; anything else plays regular.
  pub fn from_request(raw: Option<&str>) -> Self {
    match raw {
      Some(s) if s.trim().eq_ignore_ascii_case("easy") => Difficulty::Easy,
      _ => Difficulty::Regular,
    }
  }

  pub fn is_easy(self) -> bool {
    matches!(self, Difficulty::Easy)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Regular => "regular",
    }
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One generated guessing round. Never mutated after generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
  pub id: String,
  pub category: Category,
  pub answer: String,
  pub acceptable_answers: BTreeSet<String>,
  pub hint: String,
  pub image_url: String,
  pub full_image_url: String,
  pub photographer: String,
  pub photographer_url: String,
  pub difficulty: Difficulty,
}

/// Photo metadata returned by the image provider, already flattened.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Photo {
  pub regular_url: String,
  pub description: String,
  pub tags: Vec<String>,
  pub photographer: String,
  pub photographer_url: String,
}

/// Row appended to the `images` table for every successful generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzleRecord {
  pub zoomed_image_url: String,
  pub full_image_url: String,
  pub correct_answer: String,
  /// JSON-encoded array of acceptable answers.
  pub acceptable_answers: String,
  pub hint: String,
  pub category: String,
  pub photographer: String,
  pub photographer_url: String,
}

impl PuzzleRecord {
  pub fn from_puzzle(p: &Puzzle) -> Result<Self, serde_json::Error> {
    Ok(Self {
      zoomed_image_url: p.image_url.clone(),
      full_image_url: p.full_image_url.clone(),
      correct_answer: p.answer.clone(),
      acceptable_answers: serde_json::to_string(&p.acceptable_answers)?,
      hint: p.hint.clone(),
      category: p.category.label().to_string(),
      photographer: p.photographer.clone(),
      photographer_url: p.photographer_url.clone(),
    })
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
  pub name: String,
  pub streak: u32,
  pub date: NaiveDate,
}
