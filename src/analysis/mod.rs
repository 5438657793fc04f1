//! Table transformations between pipeline stages.
//!
//! - raw posts -> cleaned posts (`normalize`)
//! - cleaned posts -> daily sentiment rows (`daily`)
//! - date joins with external series (`join`)
//! - correlation matrix (`correlation`)

pub mod correlation;
pub mod daily;
pub mod join;
pub mod normalize;

pub use correlation::{CorrelationMatrix, correlation_matrix};
pub use daily::{SentimentTotals, aggregate_daily};
pub use join::{DatedSeries, JoinedFrame, daily_series, join_series};
pub use normalize::normalize_posts;
