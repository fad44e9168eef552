//! Hint selection: one fixed hint for easy mode, a random category template
//! otherwise.

use std::collections::BTreeMap;

use rand::{seq::SliceRandom, Rng};

use crate::domain::Category;
use crate::seeds::{DEFAULT_HINT_CATEGORY, EASY_HINT};

/// Pick the hint for a puzzle. Flavor text only; not reproducible across calls
/// unless the caller's RNG is seeded.
pub fn select_hint<R: Rng + ?Sized>(
  category: Category,
  _term: &str,
  is_easy_mode: bool,
  templates: &BTreeMap<Category, Vec<String>>,
  rng: &mut R,
) -> String {
  if is_easy_mode {
    return EASY_HINT.to_string();
  }
  templates
    .get(&category)
    .or_else(|| templates.get(&DEFAULT_HINT_CATEGORY))
    .and_then(|list| list.choose(rng))
    .cloned()
    .unwrap_or_else(|| EASY_HINT.to_string())
}
