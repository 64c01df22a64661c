//! Query planning
//!
//! A raw query string becomes one of three plans:
//!
//! - `Empty`: nothing survived tokenization; the answer is `[]`
//! - `And`: every token must match, ordered by recency
//! - `Boosted`: the query mentions `#`; ids are ranked by weighted term
//!   hits with hashtag matches weighing more than plain ones
//!
//! Routing looks at the raw text, not at the tokens, so a stray `#` with
//! no word after it still selects the boosted path.

use crate::tokenizer::{is_hashtag, tokenize, HASHTAG_PREFIX};
use agora_core::{Error, Result};

/// Upper bound on distinct tokens in one query. Each token costs a
/// posting-list read.
pub const MAX_QUERY_TOKENS: usize = 64;

/// How a query will be answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPlan {
    /// No searchable tokens
    Empty,
    /// Intersection of every token's posting list
    And {
        /// Query tokens, first-occurrence order
        tokens: Vec<String>,
    },
    /// Weighted union, hashtags boosted
    Boosted {
        /// Query tokens, first-occurrence order
        tokens: Vec<String>,
    },
}

impl QueryPlan {
    /// Plan a raw query.
    ///
    /// Fails with `InvalidQuery` when the query has more than
    /// [`MAX_QUERY_TOKENS`] distinct tokens.
    ///
    /// ```
    /// use agora_search::planner::QueryPlan;
    ///
    /// assert_eq!(QueryPlan::parse("the of").unwrap(), QueryPlan::Empty);
    /// assert!(matches!(QueryPlan::parse("jazz").unwrap(), QueryPlan::And { .. }));
    /// assert!(matches!(QueryPlan::parse("#jazz").unwrap(), QueryPlan::Boosted { .. }));
    /// ```
    pub fn parse(query: &str) -> Result<QueryPlan> {
        let tokens = tokenize(query);
        if tokens.len() > MAX_QUERY_TOKENS {
            return Err(Error::InvalidQuery(format!(
                "{} distinct terms, at most {} allowed",
                tokens.len(),
                MAX_QUERY_TOKENS
            )));
        }
        if tokens.is_empty() {
            return Ok(QueryPlan::Empty);
        }
        if query.contains(HASHTAG_PREFIX) {
            Ok(QueryPlan::Boosted { tokens })
        } else {
            Ok(QueryPlan::And { tokens })
        }
    }

    /// Query tokens; empty for `Empty`
    pub fn tokens(&self) -> &[String] {
        match self {
            QueryPlan::Empty => &[],
            QueryPlan::And { tokens } | QueryPlan::Boosted { tokens } => tokens,
        }
    }

    /// Hashtag tokens of the query
    pub fn hashtags(&self) -> impl Iterator<Item = &str> {
        self.tokens()
            .iter()
            .map(String::as_str)
            .filter(|t| is_hashtag(t))
    }

    /// Whether the plan can only produce an empty result
    pub fn is_empty(&self) -> bool {
        matches!(self, QueryPlan::Empty)
    }

    /// Plan name, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            QueryPlan::Empty => "empty",
            QueryPlan::And { .. } => "and",
            QueryPlan::Boosted { .. } => "boosted",
        }
    }
}
