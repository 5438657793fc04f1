//! `crypto-sentiment` library crate.
//!
//! The binary (`cs`) is a thin wrapper around this library so that:
//!
//! - every pipeline stage is testable without spawning processes
//! - stages can be reused on their own (cleaner, scorer, aggregator)
//! - the raw -> cleaned -> daily flow stays easy to follow

pub mod analysis;
pub mod app;
pub mod cli;
pub mod collect;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod sentiment;
pub mod text;
