//! Text preprocessing ahead of sentiment scoring.

pub mod clean;

pub use clean::clean;
