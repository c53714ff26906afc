//! Similarity scoring between a local entity's keywords and a standard topic.
//!
//! The layout only ever calls [`SimilarityOracle::score`]; how the number is
//! produced is up to the implementation. Any `Fn(&[String], &str) -> u32`
//! closure is an oracle too, which is what tests mostly use.

use crate::util::ids::stable_u64;

pub const MAX_SCORE: u32 = 100;

pub trait SimilarityOracle: Send + Sync {
    /// Score in `0..=100`. Larger values are clamped by the caller.
    fn score(&self, keywords: &[String], topic: &str) -> u32;
}

impl<F> SimilarityOracle for F
where
    F: Fn(&[String], &str) -> u32 + Send + Sync,
{
    fn score(&self, keywords: &[String], topic: &str) -> u32 {
        self(keywords, topic)
    }
}

/// Substring keyword matcher.
///
/// Every keyword found in the topic (case-insensitive) adds `match_score`.
/// With `jitter > 0` a pseudo-random bonus in `0..jitter` is added, derived
/// from a stable hash of `(seed, keywords, topic)` so the same inputs always
/// score the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordOracle {
    pub match_score: u32,
    pub jitter: u32,
    pub seed: u64,
}

impl Default for KeywordOracle {
    fn default() -> Self {
        Self {
            match_score: 40,
            jitter: 0,
            seed: 0,
        }
    }
}

impl KeywordOracle {
    pub fn with_jitter(jitter: u32, seed: u64) -> Self {
        Self {
            jitter,
            seed,
            ..Self::default()
        }
    }
}

impl SimilarityOracle for KeywordOracle {
    fn score(&self, keywords: &[String], topic: &str) -> u32 {
        let text = topic.to_lowercase();
        let hits = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty() && text.contains(k.as_str()))
            .count() as u32;

        let mut score = hits.saturating_mul(self.match_score);
        if self.jitter > 0 {
            let noise = stable_u64(&(self.seed, keywords, topic)) % u64::from(self.jitter);
            score = score.saturating_add(noise as u32);
        }
        score.min(MAX_SCORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn counts_substring_hits() {
        let oracle = KeywordOracle::default();
        assert_eq!(oracle.score(&kw(&["waste", "b3"]), "Waste management"), 40);
        assert_eq!(oracle.score(&kw(&["energi", "energy"]), "Energy"), 40);
        assert_eq!(oracle.score(&kw(&["limbah"]), "Emissions"), 0);
    }

    #[test]
    fn score_is_capped() {
        let oracle = KeywordOracle::default();
        let words = kw(&["a", "e", "i", "o"]);
        assert_eq!(oracle.score(&words, "aeio"), 100);
    }

    #[test]
    fn jitter_is_reproducible_and_bounded() {
        let oracle = KeywordOracle::with_jitter(30, 9);
        let words = kw(&["safety"]);
        let first = oracle.score(&words, "Occupational Health & Safety");
        for _ in 0..5 {
            assert_eq!(oracle.score(&words, "Occupational Health & Safety"), first);
        }
        assert!((40..70).contains(&first));
    }

    #[test]
    fn closures_are_oracles() {
        let fixed = |_: &[String], _: &str| 77u32;
        let oracle: &dyn SimilarityOracle = &fixed;
        assert_eq!(oracle.score(&[], "anything"), 77);
    }
}
