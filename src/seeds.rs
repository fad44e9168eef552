//! Seed data: built-in term tables, synonym table, hint templates, and the one
//! static fallback puzzle served when generation is unavailable.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{Category, Difficulty, Puzzle};

/// Hint shown in easy mode regardless of category.
pub const EASY_HINT: &str = "Look at the whole picture. What do you see?";

/// Category used when an easy-mode request names nothing usable.
pub const DEFAULT_EASY_CATEGORY: Category = Category::AnimalsAndNature;
/// Category used when a regular-mode request names nothing usable.
pub const DEFAULT_REGULAR_CATEGORY: Category = Category::EverydayObjects;
/// Hint list used for categories without templates of their own.
pub const DEFAULT_HINT_CATEGORY: Category = Category::EverydayObjects;

pub fn default_category(difficulty: Difficulty) -> Category {
  match difficulty {
    Difficulty::Easy => DEFAULT_EASY_CATEGORY,
    Difficulty::Regular => DEFAULT_REGULAR_CATEGORY,
  }
}

fn table(rows: &[(Category, &[&str])]) -> BTreeMap<Category, Vec<String>> {
  rows
    .iter()
    .map(|(c, terms)| (*c, terms.iter().map(|t| t.to_string()).collect()))
    .collect()
}

/// Super simple, everyday subjects that are immediately recognizable.
pub fn easy_terms() -> BTreeMap<Category, Vec<String>> {
  table(&[
    (
      Category::AnimalsAndNature,
      &["monkey", "elephant", "giraffe", "lion", "tiger", "zebra", "penguin", "panda", "koala", "kangaroo"],
    ),
    (
      Category::MoviesAndTv,
      &[
        "popcorn", "movie theater", "television", "camera", "microphone",
        "headphones", "remote control", "screen", "speaker", "projector",
      ],
    ),
    (
      Category::PlacesAndLandmarks,
      &["beach", "mountain", "castle", "bridge", "tower", "waterfall", "desert", "forest", "island", "lake"],
    ),
    (
      Category::FamousPeople,
      &["singer", "actor", "athlete", "musician", "dancer", "artist", "chef", "teacher", "doctor", "firefighter"],
    ),
  ])
}

/// More varied and challenging subjects.
pub fn regular_terms() -> BTreeMap<Category, Vec<String>> {
  table(&[
    (
      Category::AnimalsAndNature,
      &[
        "dog", "cat", "bird", "horse", "fish", "elephant", "giraffe", "lion",
        "tiger", "penguin", "panda", "koala", "monkey", "zebra", "bear",
      ],
    ),
    (
      Category::FoodAndDrinks,
      &[
        "pizza", "hamburger", "ice cream", "coffee", "cake", "donut", "cookie", "sandwich",
        "apple", "banana", "orange", "french fries", "sushi", "chocolate", "pasta",
      ],
    ),
    (
      Category::EverydayObjects,
      &[
        "chair", "table", "bed", "lamp", "phone", "computer", "tv", "car",
        "bicycle", "book", "pen", "cup", "bottle", "glasses", "watch",
      ],
    ),
    (
      Category::PlacesAndLandmarks,
      &[
        "beach", "mountain", "park", "house", "building", "bridge", "road", "garden",
        "pool", "playground", "school", "store", "restaurant", "stadium", "mall",
      ],
    ),
  ])
}

/// Curated, category-agnostic alternate names keyed by canonical term.
pub fn synonyms() -> BTreeMap<String, Vec<String>> {
  let rows: &[(&str, &[&str])] = &[
    ("dog", &["puppy", "doggy", "pup"]),
    ("cat", &["kitty", "kitten"]),
    ("bird", &["birdie"]),
    ("hamburger", &["burger"]),
    ("television", &["tv"]),
    ("automobile", &["car"]),
    ("telephone", &["phone"]),
    ("bicycle", &["bike"]),
    ("computer", &["laptop", "pc"]),
    ("coffee", &["coffee cup", "cup of coffee"]),
    ("mountain", &["mountains", "hill"]),
    ("building", &["tower", "skyscraper"]),
    ("monkey", &["ape", "primate", "chimp", "chimpanzee"]),
    ("elephant", &["elephants"]),
    ("giraffe", &["giraffes"]),
    ("lion", &["lions", "big cat"]),
    ("tiger", &["tigers", "big cat"]),
    ("penguin", &["penguins"]),
    ("panda", &["pandas", "bear"]),
    ("koala", &["koalas", "bear"]),
    ("beach", &["seashore", "seaside", "coast"]),
    ("castle", &["palace", "fortress"]),
    ("bridge", &["bridges", "overpass"]),
    ("tower", &["towers", "skyscraper"]),
    ("waterfall", &["falls", "cascade"]),
    ("forest", &["woods", "woodland"]),
    ("island", &["isle", "islet"]),
    ("lake", &["pond", "lagoon"]),
  ];
  rows
    .iter()
    .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
    .collect()
}

/// Regular-mode hint templates per category.
pub fn hint_templates() -> BTreeMap<Category, Vec<String>> {
  table(&[
    (
      Category::AnimalsAndNature,
      &[
        "A common animal that many people love",
        "You might see this creature every day",
        "A popular pet in many homes",
        "This animal is known worldwide",
      ],
    ),
    (
      Category::FoodAndDrinks,
      &[
        "A popular food that most people enjoy",
        "You might eat this for a meal or snack",
        "A common dish found in many places",
        "This is a favorite food for many people",
      ],
    ),
    (
      Category::EverydayObjects,
      &[
        "You probably use this every day",
        "Found in most homes",
        "A common item you see regularly",
        "This helps people in their daily life",
      ],
    ),
    (
      Category::PlacesAndLandmarks,
      &[
        "A place you might visit often",
        "You can find this in most cities",
        "Many people go here regularly",
        "A common location in our daily lives",
      ],
    ),
  ])
}

/// The single built-in puzzle played when generation fails.
pub fn fallback_puzzle() -> Puzzle {
  Puzzle {
    id: "fallback-banana".into(),
    category: Category::FoodAndDrinks,
    answer: "banana".into(),
    acceptable_answers: BTreeSet::from(["banana".to_string(), "bananas".to_string()]),
    hint: "You peel it before you eat it.".into(),
    image_url: "https://images.pexels.com/photos/208450/pexels-photo-208450.jpeg".into(),
    full_image_url: "https://images.pexels.com/photos/208450/pexels-photo-208450.jpeg".into(),
    photographer: "Pixabay".into(),
    photographer_url: "https://www.pexels.com/photo/banana-fruit-208450/".into(),
    difficulty: Difficulty::Easy,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::normalize;

  #[test]
  fn default_categories_have_terms() {
    assert!(!easy_terms()[&default_category(Difficulty::Easy)].is_empty());
    assert!(!regular_terms()[&default_category(Difficulty::Regular)].is_empty());
    assert!(!hint_templates()[&DEFAULT_HINT_CATEGORY].is_empty());
  }

  #[test]
  fn fallback_answer_is_acceptable() {
    let p = fallback_puzzle();
    assert!(p.acceptable_answers.contains(&normalize(&p.answer)));
  }
}
