//! Post text cleaning.
//!
//! Rules, applied in order:
//! 1. the coin's own hashtag (`#Bitcoin`, `#bitcoin`) becomes the plain word
//! 2. every other `#tag` token is removed entirely
//! 3. every `@mention` token is removed entirely
//! 4. newline characters are removed
//! 5. any token starting with `https` is removed up to the next whitespace
//!
//! Removing a newline can glue a bare `#` or `@` onto the next word, so the
//! rules are re-applied until the text stops changing. Every pass that changes
//! the text makes it strictly shorter, which bounds the loop.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::Coin;

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#[A-Za-z0-9]+").expect("hashtag pattern"));
static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[A-Za-z0-9]+").expect("mention pattern"));
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"https\S+").expect("link pattern"));

/// Clean raw post text for scoring.
pub fn clean(raw: &str, coin: Coin) -> String {
    let mut current = clean_once(raw, coin);
    loop {
        let next = clean_once(&current, coin);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(text: &str, coin: Coin) -> String {
    let mut out = text.to_string();
    for word in coin.tag_words() {
        out = out.replace(&format!("#{word}"), word);
    }

    let out = HASHTAG.replace_all(&out, "");
    let out = MENTION.replace_all(&out, "");
    let out: String = out.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
    let out = LINK.replace_all(&out, "");

    out.trim().to_string()
}
