//! Text tokenizer for indexing and queries
//!
//! Pipeline: scan `(#word)|(word)` over ASCII word characters → lowercase
//!           → remove stopwords → deduplicate keeping first occurrence
//!
//! Tokens are part of the storage contract: posting keys embed them
//! verbatim (`inverted:<token>`, `hashtag:<token>`), so this module must
//! stay stable. Non-ASCII letters are never part of a token.

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;

/// Stopwords dropped from both documents and queries.
const STOPWORDS: &[&str] = &["the", "and", "of", "in", "to", "for", "on", "with", "a", "an"];

/// Hashtag tokens keep this leading marker.
pub const HASHTAG_PREFIX: char = '#';

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(#[A-Za-z0-9_]+)|([A-Za-z0-9_]+)").expect("token regex is valid"));

/// Check if a token is a stopword.
#[inline]
fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Whether a token is a hashtag (`#` followed by word characters).
#[inline]
pub fn is_hashtag(token: &str) -> bool {
    token.len() > 1 && token.starts_with(HASHTAG_PREFIX)
}

/// The token without its hashtag marker.
#[inline]
pub fn bare(token: &str) -> &str {
    token.strip_prefix(HASHTAG_PREFIX).unwrap_or(token)
}

/// Tokenize text into unique, lowercase terms in first-occurrence order.
///
/// # Example
///
/// ```
/// use agora_search::tokenizer::tokenize;
///
/// let tokens = tokenize("The Jazz night, #LiveMusic and jazz!");
/// assert_eq!(tokens, vec!["jazz", "night", "#livemusic"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = FxHashSet::default();
    TOKEN_RE
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
        .filter(|t| !is_stopword(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Hashtag tokens of `text`, in first-occurrence order.
pub fn hashtags(text: &str) -> Vec<String> {
    tokenize(text).into_iter().filter(|t| is_hashtag(t)).collect()
}
