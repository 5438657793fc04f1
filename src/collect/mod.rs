//! Post collection.
//!
//! The pipeline never talks to a search provider directly. It depends on the
//! `PostSource` capability ("posts matching Q inside window R, at most N"),
//! and a collection plan turns (coin, duration) into the list of queries to run.
//!
//! Plans:
//! - snapshot: one window `[2021-03-14, 2021-03-31)`, no limit
//! - extended: one window per month, January 2018 through December 2021,
//!   at most 5000 posts each. By default each month contributes only its first
//!   day (`SamplingMode::FirstDayOfMonth`); `WholeMonth` must be asked for.

use chrono::{Months, NaiveDate};
use tracing::info;

use crate::domain::{Coin, DateWindow, Duration, Post, SamplingMode};
use crate::error::AppError;
use crate::io::ingest::read_raw_posts;

pub const EXTENDED_FIRST_YEAR: i32 = 2018;
pub const EXTENDED_LAST_YEAR: i32 = 2021;
pub const EXTENDED_LIMIT: usize = 5000;

/// One search request.
#[derive(Debug, Clone, PartialEq)]
pub struct PostQuery {
    pub search: String,
    pub window: DateWindow,
    pub limit: Option<usize>,
}

/// Anything that can answer a `PostQuery`.
pub trait PostSource {
    fn fetch(&mut self, query: &PostQuery) -> Result<Vec<Post>, AppError>;
}

/// The snapshot window.
pub fn snapshot_window() -> Option<DateWindow> {
    DateWindow::new(
        NaiveDate::from_ymd_opt(2021, 3, 14)?,
        NaiveDate::from_ymd_opt(2021, 3, 31)?,
    )
}

/// Month windows of the extended range, oldest first.
pub fn extended_windows(sampling: SamplingMode) -> Vec<DateWindow> {
    (EXTENDED_FIRST_YEAR..=EXTENDED_LAST_YEAR)
        .flat_map(|year| (1..=12).map(move |month| (year, month)))
        .filter_map(|(year, month)| {
            let since = NaiveDate::from_ymd_opt(year, month, 1)?;
            let until = match sampling {
                SamplingMode::FirstDayOfMonth => since.succ_opt()?,
                SamplingMode::WholeMonth => since.checked_add_months(Months::new(1))?,
            };
            DateWindow::new(since, until)
        })
        .collect()
}

/// Queries to run for one (coin, duration) dataset.
pub fn collection_plan(coin: Coin, duration: Duration, sampling: SamplingMode) -> Vec<PostQuery> {
    let query = |window, limit| PostQuery {
        search: coin.tag().to_string(),
        window,
        limit,
    };

    match duration {
        Duration::Snapshot => snapshot_window().map(|w| query(w, None)).into_iter().collect(),
        Duration::Extended => extended_windows(sampling)
            .into_iter()
            .map(|w| query(w, Some(EXTENDED_LIMIT)))
            .collect(),
    }
}

/// Run every query of a plan in order and concatenate the results.
pub fn collect_posts<S>(source: &mut S, plan: &[PostQuery]) -> Result<Vec<Post>, AppError>
where
    S: PostSource + ?Sized,
{
    let mut posts = Vec::new();
    for query in plan {
        let batch = source.fetch(query)?;
        info!(
            search = %query.search,
            window = %query.window,
            posts = batch.len(),
            "collected window"
        );
        posts.extend(batch);
    }
    Ok(posts)
}

/// Case-insensitive search-term match, as search providers do.
fn matches_search(post: &Post, search: &str) -> bool {
    post.text.to_lowercase().contains(&search.to_lowercase())
}

fn answer(posts: &[Post], query: &PostQuery) -> Vec<Post> {
    posts
        .iter()
        .filter(|p| query.window.contains(p.date()) && matches_search(p, &query.search))
        .take(query.limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// Answers queries from a local raw-post CSV dump.
#[derive(Debug, Clone)]
pub struct ArchivePostSource {
    posts: Vec<Post>,
}

impl ArchivePostSource {
    pub fn from_csv(path: &std::path::Path) -> Result<Self, AppError> {
        Ok(Self {
            posts: read_raw_posts(path)?,
        })
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl PostSource for ArchivePostSource {
    fn fetch(&mut self, query: &PostQuery) -> Result<Vec<Post>, AppError> {
        Ok(answer(&self.posts, query))
    }
}

/// Fixed in-memory posts; remembers every query it was asked.
#[derive(Debug, Clone, Default)]
pub struct MemoryPostSource {
    posts: Vec<Post>,
    pub queries: Vec<PostQuery>,
}

impl MemoryPostSource {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            queries: Vec::new(),
        }
    }
}

impl PostSource for MemoryPostSource {
    fn fetch(&mut self, query: &PostQuery) -> Result<Vec<Post>, AppError> {
        self.queries.push(query.clone());
        Ok(answer(&self.posts, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(y: i32, m: u32, d: u32, text: &str) -> Post {
        Post {
            id: None,
            timestamp: NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(9, 0, 0).unwrap(),
            text: text.to_string(),
            language: Some("en".to_string()),
        }
    }

    #[test]
    fn snapshot_plan_is_one_unlimited_window() {
        let plan = collection_plan(Coin::Bitcoin, Duration::Snapshot, SamplingMode::default());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].search, "#Bitcoin");
        assert_eq!(plan[0].limit, None);
        assert_eq!(plan[0].window.days(), 17);
    }

    #[test]
    fn extended_plan_samples_first_day_of_each_month_by_default() {
        let plan = collection_plan(Coin::Cardano, Duration::Extended, SamplingMode::default());
        assert_eq!(plan.len(), 48);
        assert!(plan.iter().all(|q| q.window.days() == 1 && q.limit == Some(EXTENDED_LIMIT)));
        assert_eq!(plan[0].window.since, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
        assert_eq!(plan[47].window.until, NaiveDate::from_ymd_opt(2021, 12, 2).unwrap());
    }

    #[test]
    fn whole_month_sampling_is_contiguous() {
        let windows = extended_windows(SamplingMode::WholeMonth);
        assert_eq!(windows.len(), 48);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].until, pair[1].since);
        }
        // February 2020 is a leap month.
        let feb = windows.iter().find(|w| w.month_label() == "2020-02").unwrap();
        assert_eq!(feb.days(), 29);
    }

    #[test]
    fn sources_filter_by_window_tag_and_limit() {
        let mut source = MemoryPostSource::new(vec![
            post(2021, 3, 14, "#bitcoin one"),
            post(2021, 3, 15, "#Bitcoin two"),
            post(2021, 3, 15, "#Cardano only"),
            post(2021, 3, 31, "#Bitcoin after window"),
        ]);

        let plan = collection_plan(Coin::Bitcoin, Duration::Snapshot, SamplingMode::default());
        let posts = collect_posts(&mut source, &plan).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(source.queries, plan);

        let limited = PostQuery {
            limit: Some(1),
            ..plan[0].clone()
        };
        assert_eq!(source.fetch(&limited).unwrap().len(), 1);
    }

    #[test]
    fn extended_collection_only_sees_sampled_days() {
        let mut source = MemoryPostSource::new(vec![
            post(2019, 6, 1, "#Cardano sampled"),
            post(2019, 6, 2, "#Cardano not sampled"),
        ]);
        let plan = collection_plan(Coin::Cardano, Duration::Extended, SamplingMode::FirstDayOfMonth);
        let posts = collect_posts(&mut source, &plan).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(source.queries.len(), 48);
    }
}
