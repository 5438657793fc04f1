//! Word-level sentiment lexicon.
//!
//! Each entry carries a polarity in `[-1, 1]` and a subjectivity in `[0, 1]`.
//! Alongside the words we keep the two modifier classes the scorer needs:
//! intensifiers (scale the next hit) and negations (flip nearby hits).

use std::collections::{HashMap, HashSet};

/// Scores attached to one lexicon word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LexiconEntry {
    pub polarity: f64,
    pub subjectivity: f64,
}

/// General-purpose opinion words plus crypto-market slang.
const WORDS: &[(&str, f64, f64)] = &[
    // general
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("nice", 0.6, 1.0),
    ("excellent", 1.0, 1.0),
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("fantastic", 0.4, 0.9),
    ("incredible", 0.9, 0.9),
    ("wonderful", 1.0, 1.0),
    ("beautiful", 0.85, 1.0),
    ("happy", 0.8, 1.0),
    ("glad", 0.5, 1.0),
    ("love", 0.5, 0.6),
    ("like", 0.1, 0.2),
    ("win", 0.8, 0.4),
    ("winning", 0.5, 0.75),
    ("success", 0.3, 0.0),
    ("successful", 0.75, 0.95),
    ("strong", 0.433, 0.733),
    ("stronger", 0.4, 0.6),
    ("safe", 0.5, 0.5),
    ("secure", 0.4, 0.6),
    ("easy", 0.433, 0.833),
    ("interesting", 0.5, 0.5),
    ("exciting", 0.3, 0.8),
    ("positive", 0.227, 0.545),
    ("new", 0.136, 0.455),
    ("high", 0.16, 0.54),
    ("higher", 0.25, 0.5),
    ("huge", 0.4, 0.9),
    ("free", 0.4, 0.8),
    ("smart", 0.214, 0.643),
    ("cool", 0.35, 0.65),
    ("hope", 0.0, 0.0),
    ("bad", -0.7, 0.667),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("terrible", -1.0, 1.0),
    ("horrible", -1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("poor", -0.4, 0.6),
    ("sad", -0.5, 1.0),
    ("hate", -0.8, 0.9),
    ("angry", -0.5, 1.0),
    ("afraid", -0.6, 0.9),
    ("scary", -0.5, 1.0),
    ("stupid", -0.8, 1.0),
    ("wrong", -0.5, 0.9),
    ("weak", -0.375, 0.625),
    ("low", 0.0, 0.3),
    ("lower", 0.0, 0.3),
    ("negative", -0.3, 0.4),
    ("risky", -0.4, 0.7),
    ("dangerous", -0.6, 0.9),
    ("down", -0.155, 0.289),
    ("fear", -0.3, 0.6),
    ("panic", -0.5, 0.7),
    ("lost", -0.2, 0.2),
    ("fail", -0.5, 0.3),
    ("failed", -0.5, 0.3),
    ("dead", -0.2, 0.4),
    ("boring", -1.0, 1.0),
    ("crazy", -0.6, 0.9),
    ("insane", -0.4, 0.9),
    // crypto market
    ("moon", 0.6, 0.7),
    ("mooning", 0.7, 0.8),
    ("bullish", 0.6, 0.6),
    ("bull", 0.3, 0.5),
    ("pump", 0.3, 0.5),
    ("pumping", 0.4, 0.6),
    ("rally", 0.5, 0.5),
    ("surge", 0.4, 0.4),
    ("soaring", 0.6, 0.6),
    ("breakout", 0.4, 0.5),
    ("hodl", 0.3, 0.4),
    ("ath", 0.5, 0.5),
    ("lambo", 0.5, 0.8),
    ("gains", 0.4, 0.3),
    ("profit", 0.4, 0.3),
    ("profits", 0.4, 0.3),
    ("adoption", 0.3, 0.3),
    ("undervalued", 0.4, 0.6),
    ("bearish", -0.6, 0.6),
    ("bear", -0.3, 0.5),
    ("dump", -0.4, 0.5),
    ("dumping", -0.5, 0.6),
    ("crash", -0.6, 0.7),
    ("crashing", -0.6, 0.7),
    ("crashed", -0.6, 0.6),
    ("dip", -0.2, 0.4),
    ("bubble", -0.3, 0.6),
    ("scam", -0.8, 0.9),
    ("fraud", -0.8, 0.8),
    ("ponzi", -0.8, 0.9),
    ("fud", -0.4, 0.6),
    ("rekt", -0.7, 0.8),
    ("hack", -0.6, 0.5),
    ("hacked", -0.7, 0.5),
    ("loss", -0.4, 0.3),
    ("losses", -0.4, 0.3),
    ("overvalued", -0.4, 0.6),
    ("worthless", -0.8, 0.9),
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("so", 1.3),
    ("too", 1.3),
    ("super", 1.4),
    ("highly", 1.3),
    ("totally", 1.3),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("absolutely", 1.5),
    ("quite", 1.1),
    ("somewhat", 0.7),
    ("slightly", 0.5),
    ("barely", 0.4),
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "nothing", "nobody", "none", "neither", "nor", "cannot", "dont", "doesnt",
    "didnt", "isnt", "wasnt", "arent", "cant", "wont",
];

#[derive(Debug, Clone)]
pub struct Lexicon {
    words: HashMap<String, LexiconEntry>,
    intensifiers: HashMap<String, f64>,
    negations: HashSet<String>,
}

impl Lexicon {
    /// Built-in word list.
    pub fn builtin() -> Self {
        Self::from_entries(WORDS.iter().map(|&(word, polarity, subjectivity)| {
            (
                word.to_string(),
                LexiconEntry {
                    polarity,
                    subjectivity,
                },
            )
        }))
    }

    /// Custom word list; intensifiers and negations stay built in.
    ///
    /// Scores are clamped into their valid ranges. Words are matched lowercase.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, LexiconEntry)>) -> Self {
        let words = entries
            .into_iter()
            .map(|(word, entry)| {
                (
                    word.trim().to_lowercase(),
                    LexiconEntry {
                        polarity: entry.polarity.clamp(-1.0, 1.0),
                        subjectivity: entry.subjectivity.clamp(0.0, 1.0),
                    },
                )
            })
            .collect();

        Self {
            words,
            intensifiers: INTENSIFIERS.iter().map(|&(w, f)| (w.to_string(), f)).collect(),
            negations: NEGATIONS.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn entry(&self, word: &str) -> Option<LexiconEntry> {
        self.words.get(word).copied()
    }

    pub fn intensity(&self, word: &str) -> Option<f64> {
        self.intensifiers.get(word).copied()
    }

    /// `not`, `never`, ... and any contraction ending in `n't`.
    pub fn is_negation(&self, word: &str) -> bool {
        self.negations.contains(word) || word.ends_with("n't")
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_scores_are_in_range() {
        for &(word, polarity, subjectivity) in WORDS {
            assert!((-1.0..=1.0).contains(&polarity), "{word}");
            assert!((0.0..=1.0).contains(&subjectivity), "{word}");
        }
        assert_eq!(Lexicon::builtin().len(), WORDS.len(), "duplicate words in lexicon");
    }

    #[test]
    fn custom_entries_are_lowercased_and_clamped() {
        let lex = Lexicon::from_entries([(
            " Rocket ".to_string(),
            LexiconEntry {
                polarity: 3.0,
                subjectivity: -1.0,
            },
        )]);
        let entry = lex.entry("rocket").unwrap();
        assert_eq!(entry.polarity, 1.0);
        assert_eq!(entry.subjectivity, 0.0);
        assert!(lex.entry("good").is_none());
        assert!(lex.intensity("very").is_some());
    }

    #[test]
    fn contractions_count_as_negation() {
        let lex = Lexicon::builtin();
        assert!(lex.is_negation("don't"));
        assert!(lex.is_negation("not"));
        assert!(!lex.is_negation("note"));
    }
}
