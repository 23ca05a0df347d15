//! Filter pipeline that turns raw search results into "valid" and "delayed" posts.
//!
//! Stages run in a fixed order: [`sanitize`], [`filter_old`], [`filter_retweets`],
//! then [`keep_delayed`] over the surviving posts. No stage reorders its input.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use tracing::{debug, warn};

use crate::post::Post;

/// Words that mark a post as talking about a delay. Compared against lowercased tokens.
pub const DELAY_KEYWORDS: [&str; 4] = ["late", "delayed", "delay", "delays"];

pub const RECENCY_WINDOW_SECS: i64 = 30 * 60;

const CREATED_AT_FORMAT: &str = "%a, %d %b %Y %H:%M:%S";

static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
pub enum TimestampError {
    #[error("timestamp {0:?} has no zone offset token")]
    MissingOffset(String),

    #[error("timestamp {raw:?} is malformed: {source}")]
    Invalid {
        raw: String,
        source: chrono::ParseError,
    },
}

/// Posts that survived sanitize, age and retweet filtering, plus the delayed subset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub valid: Vec<Post>,
    pub delayed: Vec<Post>,
}

/// Split text into word-character runs.
pub fn tokenize(text: &str) -> Vec<&str> {
    WORD_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Lowercase every post's text in place.
pub fn sanitize(posts: &mut [Post]) {
    for post in posts.iter_mut() {
        post.text = post.text.to_lowercase();
    }
}

/// Parse `"Tue, 15 May 2012 18:05:44 +0000"` as UTC. The trailing zone token is discarded.
pub fn parse_created_at(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    let (stamp, _offset) = raw
        .trim()
        .rsplit_once(' ')
        .ok_or_else(|| TimestampError::MissingOffset(raw.to_string()))?;

    NaiveDateTime::parse_from_str(stamp, CREATED_AT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| TimestampError::Invalid {
            raw: raw.to_string(),
            source,
        })
}

/// Format a UTC instant the way the search endpoint does.
pub fn format_created_at(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S +0000").to_string()
}

/// Whether `post` was created no more than `window_secs` before `now`.
///
/// A timestamp ahead of `now` yields a negative age and counts as recent.
pub fn is_recent(
    post: &Post,
    now: DateTime<Utc>,
    window_secs: i64,
) -> Result<bool, TimestampError> {
    let created = parse_created_at(&post.created_at)?;
    let age_secs = (now - created).num_seconds();
    Ok(age_secs <= window_secs)
}

/// Keep posts created within `window_secs` of `now`. Posts with unparseable timestamps are dropped.
pub fn filter_old(posts: Vec<Post>, now: DateTime<Utc>, window_secs: i64) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|post| match is_recent(post, now, window_secs) {
            Ok(recent) => recent,
            Err(e) => {
                warn!(error = %e, "dropping post with bad created_at");
                false
            }
        })
        .collect()
}

/// First word token is `rt`. Text without any word token is not a retweet.
pub fn is_retweet(text: &str) -> bool {
    tokenize(text)
        .first()
        .is_some_and(|first| first.eq_ignore_ascii_case("rt"))
}

pub fn filter_retweets(posts: Vec<Post>) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|post| !is_retweet(&post.text))
        .collect()
}

pub fn mentions_delay(text: &str) -> bool {
    tokenize(text)
        .into_iter()
        .any(|token| DELAY_KEYWORDS.contains(&token))
}

/// Subset of `posts` mentioning a delay keyword, in input order.
pub fn keep_delayed(posts: &[Post]) -> Vec<Post> {
    posts
        .iter()
        .filter(|post| mentions_delay(&post.text))
        .cloned()
        .collect()
}

/// Run every stage over one batch of search results.
pub fn run_pipeline(mut posts: Vec<Post>, now: DateTime<Utc>, window_secs: i64) -> FilterOutcome {
    let fetched = posts.len();
    sanitize(&mut posts);
    let recent = filter_old(posts, now, window_secs);
    let recent_count = recent.len();
    let valid = filter_retweets(recent);
    let delayed = keep_delayed(&valid);

    debug!(
        fetched,
        recent = recent_count,
        valid = valid.len(),
        delayed = delayed.len(),
        "filtered search results"
    );

    FilterOutcome { valid, delayed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 5, 15, 18, 30, 0).unwrap()
    }

    fn post_at(text: &str, at: DateTime<Utc>) -> Post {
        Post::new(text, format_created_at(at))
    }

    fn texts(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_sanitize_lowercases() {
        let mut posts = vec![Post::new("FOO", ""), Post::new("BaR", "")];
        sanitize(&mut posts);
        assert_eq!(texts(&posts), vec!["foo", "bar"]);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let mut once = vec![
            Post::new("Caltrain DELAYED at Palo Alto", ""),
            Post::new("RT ok", ""),
        ];
        sanitize(&mut once);
        let mut twice = once.clone();
        sanitize(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_parse_created_at() {
        let parsed = parse_created_at("Tue, 15 May 2012 18:05:44 +0000").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2012, 5, 15, 18, 5, 44).unwrap());
    }

    #[test]
    fn test_parse_created_at_ignores_offset_token() {
        let parsed = parse_created_at("Tue, 15 May 2012 18:05:44 -0700").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2012, 5, 15, 18, 5, 44).unwrap());
    }

    #[test]
    fn test_parse_created_at_rejects_garbage() {
        assert!(matches!(
            parse_created_at("yesterday"),
            Err(TimestampError::MissingOffset(_))
        ));
        assert!(matches!(
            parse_created_at("2012-05-15 18:05:44 +0000"),
            Err(TimestampError::Invalid { .. })
        ));
    }

    #[test]
    fn test_format_created_at_parses_back() {
        let at = now();
        assert_eq!(format_created_at(at), "Tue, 15 May 2012 18:30:00 +0000");
        assert_eq!(parse_created_at(&format_created_at(at)).unwrap(), at);
    }

    #[test]
    fn test_filter_old_window_is_inclusive() {
        let posts = vec![
            post_at("edge", now() - Duration::seconds(RECENCY_WINDOW_SECS)),
            post_at("stale", now() - Duration::seconds(RECENCY_WINDOW_SECS + 1)),
            post_at("fresh", now() - Duration::seconds(60)),
            post_at("yesterday", now() - Duration::days(1)),
        ];
        let kept = filter_old(posts, now(), RECENCY_WINDOW_SECS);
        assert_eq!(texts(&kept), vec!["edge", "fresh"]);
    }

    #[test]
    fn test_filter_old_keeps_future_posts() {
        let posts = vec![post_at("from the future", now() + Duration::hours(3))];
        let kept = filter_old(posts, now(), RECENCY_WINDOW_SECS);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_filter_old_skips_malformed_timestamps() {
        let posts = vec![
            Post::new("broken", "not a date"),
            post_at("ok", now()),
            Post::new("wrong layout", "2012-05-15T18:30:00Z +0000"),
        ];
        let kept = filter_old(posts, now(), RECENCY_WINDOW_SECS);
        assert_eq!(texts(&kept), vec!["ok"]);
    }

    #[test]
    fn test_tokenize_splits_on_non_word_chars() {
        assert_eq!(
            tokenize("@caltrain #delayed, again!! 10min"),
            vec!["caltrain", "delayed", "again", "10min"]
        );
        assert!(tokenize("?!... ").is_empty());
    }

    #[test]
    fn test_filter_retweets() {
        let posts = vec![Post::new("rt foo", ""), Post::new("bar", "")];
        assert_eq!(texts(&filter_retweets(posts)), vec!["bar"]);
    }

    #[test]
    fn test_filter_retweets_only_checks_first_token() {
        let posts = vec![
            Post::new("RT @someone: delays", ""),
            Post::new("not an rt at all", ""),
            Post::new("\"rt\" quoted first", ""),
            Post::new("rtx is fine", ""),
        ];
        assert_eq!(
            texts(&filter_retweets(posts)),
            vec!["not an rt at all", "rtx is fine"]
        );
    }

    #[test]
    fn test_empty_tokenization_is_not_retweet_nor_delayed() {
        let posts = vec![Post::new("", ""), Post::new("!!!", "")];
        let kept = filter_retweets(posts);
        assert_eq!(kept.len(), 2);
        assert!(keep_delayed(&kept).is_empty());
    }

    #[test]
    fn test_keep_delayed_tweets() {
        let posts = vec![Post::new("foo delay", ""), Post::new("bar", "")];
        assert_eq!(texts(&keep_delayed(&posts)), vec!["foo delay"]);
    }

    #[test]
    fn test_keep_delayed_matches_whole_tokens_only() {
        let posts = vec![
            Post::new("running late.", ""),
            Post::new("delays, delays", ""),
            Post::new("lateness is not a keyword", ""),
            Post::new("undelayed", ""),
            Post::new("train #delayed", ""),
        ];
        assert_eq!(
            texts(&keep_delayed(&posts)),
            vec!["running late.", "delays, delays", "train #delayed"]
        );
    }

    #[test]
    fn test_keep_delayed_needs_sanitized_text() {
        let mut posts = vec![Post::new("DELAYED", "")];
        assert!(keep_delayed(&posts).is_empty());
        sanitize(&mut posts);
        assert_eq!(keep_delayed(&posts).len(), 1);
    }

    #[test]
    fn test_pipeline_scenario_keeps_both_and_flags_delay() {
        let posts = vec![post_at("FOO delay", now()), post_at("bar", now())];
        let outcome = run_pipeline(posts, now(), RECENCY_WINDOW_SECS);
        assert_eq!(texts(&outcome.valid), vec!["foo delay", "bar"]);
        assert_eq!(texts(&outcome.delayed), vec!["foo delay"]);
    }

    #[test]
    fn test_pipeline_drops_retweeted_delay() {
        let posts = vec![post_at("rt delay now", now())];
        let outcome = run_pipeline(posts, now(), RECENCY_WINDOW_SECS);
        assert!(outcome.valid.is_empty());
        assert!(outcome.delayed.is_empty());
    }

    #[test]
    fn test_pipeline_preserves_order() {
        let posts = vec![
            post_at("One delay", now()),
            post_at("RT two delay", now()),
            post_at("three", now() - Duration::hours(2)),
            post_at("four LATE", now()),
            post_at("five", now()),
        ];
        let outcome = run_pipeline(posts, now(), RECENCY_WINDOW_SECS);
        assert_eq!(texts(&outcome.valid), vec!["one delay", "four late", "five"]);
        assert_eq!(texts(&outcome.delayed), vec!["one delay", "four late"]);
    }
}
