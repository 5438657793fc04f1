//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run selectors (`Coin`, `Duration`, `SamplingMode`) and `PipelineConfig`
//! - the three table shapes (`Post`, `CleanedPost`, `DailyAggregate`)
//! - the `Sentiment` bucket and `DateWindow`

pub mod types;

pub use types::*;
