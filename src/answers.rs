//! Acceptable-answer sets: the canonical term, its curated synonyms, and any
//! provider-supplied wording that matches one of those.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use crate::domain::Difficulty;
use crate::util::normalize;

/// Build the normalized answer set for `term`.
///
/// Description words and tags are only admitted when they normalize to the
/// term itself or a known synonym, so unrelated provider metadata never widens
/// the set. The result always contains `normalize(term)`.
#[instrument(level = "debug", skip(synonyms, description, tags), fields(%term, %difficulty, tags = tags.len()))]
pub fn build_acceptable_answers(
  term: &str,
  description: &str,
  tags: &[String],
  difficulty: Difficulty,
  synonyms: &BTreeMap<String, BTreeSet<String>>,
) -> BTreeSet<String> {
  let canonical = normalize(term);
  let known = synonyms.get(&canonical);

  let mut answers = BTreeSet::new();
  answers.insert(canonical.clone());
  if let Some(alts) = known {
    answers.extend(alts.iter().cloned());
  }

  let candidates = description
    .split_whitespace()
    .map(normalize)
    .chain(tags.iter().map(|t| normalize(t)));
  for word in candidates {
    if word == canonical || known.is_some_and(|alts| alts.contains(&word)) {
      answers.insert(word);
    }
  }

  debug!(target: "puzzle", %canonical, count = answers.len(), "acceptable answers built");
  answers
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::GameConfig;

  fn table() -> BTreeMap<String, BTreeSet<String>> {
    GameConfig::default().synonyms
  }

  #[test]
  fn seeds_with_term_and_synonyms() {
    let got = build_acceptable_answers("dog", "", &[], Difficulty::Regular, &table());
    let want: BTreeSet<String> = ["dog", "puppy", "doggy", "pup"].iter().map(|s| s.to_string()).collect();
    assert_eq!(got, want);
  }

  #[test]
  fn unknown_term_yields_single_element() {
    let got = build_acceptable_answers("Kangaroo", "A kangaroo in the outback", &["animal".into()], Difficulty::Easy, &table());
    assert_eq!(got, BTreeSet::from(["kangaroo".to_string()]));
  }

  #[test]
  fn provider_metadata_cannot_add_unrelated_words() {
    let tags = vec!["Big Cat".to_string(), "savanna".to_string(), "LION".to_string()];
    let got = build_acceptable_answers("lion", "A lion resting, near other lions.", &tags, Difficulty::Regular, &table());
    assert!(got.contains("lion"));
    assert!(got.contains("lions"));
    assert!(got.contains("big cat"));
    assert!(!got.contains("savanna"));
    assert!(!got.contains("resting"));
  }

  #[test]
  fn multi_word_terms_are_normalized() {
    let got = build_acceptable_answers("Ice Cream", "", &["ice cream".into()], Difficulty::Regular, &table());
    assert_eq!(got, BTreeSet::from(["ice cream".to_string()]));
  }

  #[test]
  fn every_member_is_a_normalizer_fixed_point() {
    let cfg = GameConfig::default();
    for terms in cfg.regular_terms.values().chain(cfg.easy_terms.values()) {
      for term in terms {
        let set = build_acceptable_answers(term, "Some Description!", &["Tag".into()], Difficulty::Regular, &cfg.synonyms);
        assert!(set.contains(&normalize(term)), "missing canonical for {term}");
        for a in &set {
          assert_eq!(&normalize(a), a);
        }
      }
    }
  }
}
