//! Combined filter + fuzzy search over an index.
//!
//! A query is `filters | fuzzy`. Text left of the first `|` is a filter
//! expression (see [`crate::filters`]); text right of it is matched against
//! previews with nucleo. Without a `|`, the whole query is fuzzy.

use anyhow::{Context, Result};
use nucleo::pattern::{CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use serde::Serialize;

use crate::filters::{apply_filters, parse_filter};
use crate::models::Message;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SearchHit<'a> {
    #[serde(flatten)]
    pub message: &'a Message,
    /// Fuzzy score; `None` when the query had no fuzzy part.
    pub score: Option<u32>,
}

/// Splits a query into its filter part (if any) and its fuzzy part.
pub fn split_query(query: &str) -> (Option<&str>, &str) {
    match query.split_once('|') {
        Some((filter, fuzzy)) => {
            let filter = filter.trim();
            ((!filter.is_empty()).then_some(filter), fuzzy.trim())
        }
        None => (None, query.trim()),
    }
}

/// Runs `query` over `entries`.
///
/// Hits are ranked by fuzzy score, ties in document order. An empty fuzzy
/// part returns every filtered entry in document order.
pub fn search_index<'a>(entries: &'a [Message], query: &str) -> Result<Vec<SearchHit<'a>>> {
    let (filter, fuzzy) = split_query(query);

    let candidates: Vec<&Message> = match filter {
        Some(filter) => {
            let expr = parse_filter(filter).with_context(|| format!("Invalid filter '{}'", filter))?;
            apply_filters(entries, &expr)
        }
        None => entries.iter().collect(),
    };

    if fuzzy.is_empty() {
        return Ok(candidates.into_iter().map(|message| SearchHit { message, score: None }).collect());
    }

    let pattern = Pattern::parse(fuzzy, CaseMatching::Smart, Normalization::Smart);
    let mut matcher = Matcher::new(Config::DEFAULT);
    let mut buf = Vec::new();

    let mut hits: Vec<SearchHit<'a>> = candidates
        .into_iter()
        .filter_map(|message| {
            let haystack = Utf32Str::new(&message.preview, &mut buf);
            pattern.score(haystack, &mut matcher).map(|score| SearchHit { message, score: Some(score) })
        })
        .collect();
    // Stable sort keeps document order among equal scores.
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(hits)
}
