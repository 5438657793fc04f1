//! Post filter & normalizer: raw posts -> cleaned, scored posts.

use tracing::debug;

use crate::domain::{CleanedPost, Coin, Post};
use crate::sentiment::SentimentModel;
use crate::text::clean;

/// Clean and score every post written in `language`, in arrival order.
///
/// Posts in other languages (or with no language) are dropped. Text that is
/// empty after cleaning is still scored and kept.
pub fn normalize_posts<M>(posts: Vec<Post>, coin: Coin, language: &str, model: &M) -> Vec<CleanedPost>
where
    M: SentimentModel + ?Sized,
{
    let total = posts.len();

    let cleaned: Vec<CleanedPost> = posts
        .into_iter()
        .filter(|post| post.language.as_deref() == Some(language))
        .map(|post| {
            let clean_text = clean(&post.text, coin);
            let score = model.score(&clean_text);
            CleanedPost {
                date: post.date(),
                clean_text,
                subjectivity: score.subjectivity,
                polarity: score.polarity,
                sentiment: score.sentiment,
            }
        })
        .collect();

    debug!(total, kept = cleaned.len(), language, "normalized posts");
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::domain::Sentiment;
    use crate::sentiment::{LexiconScorer, Scores};

    fn post(date: &str, text: &str, lang: Option<&str>) -> Post {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        Post {
            id: None,
            timestamp: date.and_hms_opt(12, 0, 0).unwrap(),
            text: text.to_string(),
            language: lang.map(str::to_string),
        }
    }

    #[test]
    fn keeps_only_english_rows() {
        let posts = vec![
            post("2021-03-14", "#Bitcoin to the moon!", Some("en")),
            post("2021-03-14", "#Bitcoin crashing, bad day", Some("en")),
            post("2021-03-14", "prix inconnu", Some("fr")),
            post("2021-03-15", "no language", None),
        ];

        let cleaned = normalize_posts(posts, Coin::Bitcoin, "en", &LexiconScorer::default());
        assert_eq!(cleaned.len(), 2);

        assert_eq!(cleaned[0].clean_text, "Bitcoin to the moon!");
        assert_eq!(cleaned[0].sentiment, Sentiment::Positive);
        assert_eq!(cleaned[1].clean_text, "Bitcoin crashing, bad day");
        assert_eq!(cleaned[1].sentiment, Sentiment::Negative);
        assert!(cleaned.iter().all(|p| p.date == NaiveDate::from_ymd_opt(2021, 3, 14).unwrap()));
    }

    #[test]
    fn empty_after_cleaning_is_kept_as_neutral() {
        let posts = vec![post("2021-03-20", "@alice https://x.co/y #crypto", Some("en"))];
        let cleaned = normalize_posts(posts, Coin::Bitcoin, "en", &LexiconScorer::default());
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].clean_text, "");
        assert_eq!(cleaned[0].polarity, 0.0);
        assert_eq!(cleaned[0].subjectivity, 0.0);
        assert_eq!(cleaned[0].sentiment, Sentiment::Neutral);
    }

    struct Fixed(f64);

    impl SentimentModel for Fixed {
        fn assess(&self, _text: &str) -> Scores {
            Scores {
                subjectivity: 0.5,
                polarity: self.0,
            }
        }
    }

    #[test]
    fn any_model_gets_sign_based_labels() {
        let posts = vec![post("2021-03-14", "whatever", Some("en"))];
        let cleaned = normalize_posts(posts.clone(), Coin::Cardano, "en", &Fixed(-0.1));
        assert_eq!(cleaned[0].sentiment, Sentiment::Negative);
        let cleaned = normalize_posts(posts, Coin::Cardano, "en", &Fixed(0.0));
        assert_eq!(cleaned[0].sentiment, Sentiment::Neutral);
    }
}
