//! Loading puzzle configuration (term tables, synonyms, hint templates) from TOML.
//!
//! Every table has a built-in default (see `seeds`). A TOML file named by
//! PUZZLE_CONFIG_PATH can replace per-category term/hint lists and extend the
//! synonym table:
//!
//! ```toml
//! [easy_terms]
//! "Animals & Nature" = ["otter", "owl"]
//!
//! [synonyms]
//! otter = ["otters", "sea otter"]
//!
//! [hints]
//! "Famous People" = ["Someone you might recognise"]
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::{Category, Difficulty};
use crate::seeds;
use crate::util::normalize;

/// Raw TOML schema. Category keys are display labels.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct PuzzleConfigFile {
  #[serde(default)]
  pub easy_terms: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  pub regular_terms: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  pub synonyms: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  pub hints: BTreeMap<String, Vec<String>>,
}

/// Resolved tables used by the generator. Categories with no terms are absent,
/// and synonym keys/values are stored in normalized form.
#[derive(Clone, Debug)]
pub struct GameConfig {
  pub easy_terms: BTreeMap<Category, Vec<String>>,
  pub regular_terms: BTreeMap<Category, Vec<String>>,
  pub synonyms: BTreeMap<String, BTreeSet<String>>,
  pub hints: BTreeMap<Category, Vec<String>>,
}

impl Default for GameConfig {
  fn default() -> Self {
    let mut cfg = Self {
      easy_terms: BTreeMap::new(),
      regular_terms: BTreeMap::new(),
      synonyms: BTreeMap::new(),
      hints: BTreeMap::new(),
    };
    for (c, terms) in seeds::easy_terms() {
      set_terms(&mut cfg.easy_terms, c, terms);
    }
    for (c, terms) in seeds::regular_terms() {
      set_terms(&mut cfg.regular_terms, c, terms);
    }
    for (term, alts) in seeds::synonyms() {
      cfg.add_synonyms(&term, alts);
    }
    for (c, hints) in seeds::hint_templates() {
      set_hints(&mut cfg.hints, c, hints);
    }
    cfg
  }
}

impl GameConfig {
  /// Built-in tables with the file's entries layered on top.
  pub fn with_overrides(file: PuzzleConfigFile) -> Self {
    let mut cfg = Self::default();
    for (label, terms) in file.easy_terms {
      match Category::from_label(&label) {
        Some(c) => set_terms(&mut cfg.easy_terms, c, terms),
        None => warn!(target: "whatsit_backend", %label, "Unknown category in [easy_terms]; skipped"),
      }
    }
    for (label, terms) in file.regular_terms {
      match Category::from_label(&label) {
        Some(c) => set_terms(&mut cfg.regular_terms, c, terms),
        None => warn!(target: "whatsit_backend", %label, "Unknown category in [regular_terms]; skipped"),
      }
    }
    for (term, alts) in file.synonyms {
      cfg.add_synonyms(&term, alts);
    }
    for (label, hints) in file.hints {
      match Category::from_label(&label) {
        Some(c) => set_hints(&mut cfg.hints, c, hints),
        None => warn!(target: "whatsit_backend", %label, "Unknown category in [hints]; skipped"),
      }
    }
    cfg
  }

  pub fn terms(&self, difficulty: Difficulty) -> &BTreeMap<Category, Vec<String>> {
    match difficulty {
      Difficulty::Easy => &self.easy_terms,
      Difficulty::Regular => &self.regular_terms,
    }
  }

  /// Categories playable in the given mode, in stable order.
  pub fn categories(&self, difficulty: Difficulty) -> Vec<Category> {
    self.terms(difficulty).keys().copied().collect()
  }

  fn add_synonyms(&mut self, term: &str, alts: Vec<String>) {
    let key = normalize(term);
    if key.is_empty() {
      return;
    }
    let entry = self.synonyms.entry(key).or_default();
    entry.extend(alts.iter().map(|a| normalize(a)).filter(|a| !a.is_empty()));
  }
}

fn set_terms(map: &mut BTreeMap<Category, Vec<String>>, c: Category, terms: Vec<String>) {
  let terms: Vec<String> = terms
    .into_iter()
    .map(|t| t.trim().to_lowercase())
    .filter(|t| !t.is_empty())
    .collect();
  if terms.is_empty() {
    map.remove(&c);
  } else {
    map.insert(c, terms);
  }
}

fn set_hints(map: &mut BTreeMap<Category, Vec<String>>, c: Category, hints: Vec<String>) {
  let hints: Vec<String> = hints
    .into_iter()
    .map(|h| h.trim().to_string())
    .filter(|h| !h.is_empty())
    .collect();
  if hints.is_empty() {
    map.remove(&c);
  } else {
    map.insert(c, hints);
  }
}

/// Parse a TOML document into the resolved configuration.
pub fn parse_game_config(text: &str) -> Result<GameConfig, toml::de::Error> {
  let file = toml::from_str::<PuzzleConfigFile>(text)?;
  Ok(GameConfig::with_overrides(file))
}

/// Load from PUZZLE_CONFIG_PATH. Missing variable, IO or parse errors all
/// fall back to the built-in tables (errors are logged).
pub fn load_game_config_from_env() -> GameConfig {
  let Ok(path) = std::env::var("PUZZLE_CONFIG_PATH") else {
    return GameConfig::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_game_config(&s) {
      Ok(cfg) => {
        info!(target: "whatsit_backend", %path, "Loaded puzzle config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "whatsit_backend", %path, error = %e, "Failed to parse TOML config; using built-in tables");
        GameConfig::default()
      }
    },
    Err(e) => {
      error!(target: "whatsit_backend", %path, error = %e, "Failed to read TOML config file; using built-in tables");
      GameConfig::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_cover_both_modes() {
    let cfg = GameConfig::default();
    assert_eq!(cfg.categories(Difficulty::Easy).len(), 4);
    assert!(cfg.terms(Difficulty::Regular).contains_key(&Category::FoodAndDrinks));
    assert!(!cfg.terms(Difficulty::Easy).contains_key(&Category::FoodAndDrinks));
    assert!(cfg.synonyms["dog"].contains("puppy"));
  }

  #[test]
  fn toml_overrides_replace_lists_and_extend_synonyms() {
    let cfg = parse_game_config(
      r#"
        [easy_terms]
        "Animals & Nature" = ["Otter", "  owl "]
        "Not A Category" = ["x"]

        [regular_terms]
        "Food & Drinks" = []

        [synonyms]
        dog = ["Hound!"]
        otter = ["otters"]

        [hints]
        "Famous People" = ["Someone you might recognise"]
      "#,
    )
    .unwrap();

    assert_eq!(cfg.easy_terms[&Category::AnimalsAndNature], vec!["otter", "owl"]);
    assert!(!cfg.regular_terms.contains_key(&Category::FoodAndDrinks));
    assert!(cfg.synonyms["dog"].contains("hound"));
    assert!(cfg.synonyms["dog"].contains("puppy"));
    assert_eq!(cfg.synonyms["otter"].len(), 1);
    assert_eq!(cfg.hints[&Category::FamousPeople].len(), 1);
  }

  #[test]
  fn bad_toml_is_an_error() {
    assert!(parse_game_config("easy_terms = 3").is_err());
  }
}
