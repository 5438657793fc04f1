//! Lexicon-based sentiment scoring.
//!
//! - word list + modifiers (`lexicon`)
//! - text -> (subjectivity, polarity, label) (`scorer`)

pub mod lexicon;
pub mod scorer;

pub use lexicon::{Lexicon, LexiconEntry};
pub use scorer::{LexiconScorer, PostScore, Scores, SentimentModel};
