//! Article search: query parsing and relevance ranking.
//!
//! The repository narrows the candidates with a LIKE prefilter when every
//! term is ASCII; ranking happens here with Unicode case folding.

use std::cmp::Reverse;

use crate::{
    error::{ApiError, FieldErrors},
    models::{Article, SearchHit},
};

pub const MAX_QUERY_LEN: usize = 200;

const TITLE_WEIGHT: i64 = 3;
const CATEGORY_WEIGHT: i64 = 2;
const AUTHOR_WEIGHT: i64 = 2;
const BODY_WEIGHT: i64 = 1;

/// Splits a raw query into lowercase terms. A blank query yields no terms.
pub fn parse_terms(raw: &str) -> Result<Vec<String>, ApiError> {
    let query = raw.trim();
    if query.chars().count() > MAX_QUERY_LEN {
        return Err(FieldErrors::single(
            "q",
            format!("query must be at most {MAX_QUERY_LEN} characters"),
        ));
    }

    let mut terms: Vec<String> = Vec::new();
    for term in query.split_whitespace().map(str::to_lowercase) {
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    Ok(terms)
}

/// Sum over terms of the weight of every field the term occurs in.
pub fn relevance(article: &Article, terms: &[String]) -> i64 {
    let title = article.title.to_lowercase();
    let body = article.body.to_lowercase();
    let author = article.author_label.to_lowercase();
    let category = article
        .category_name
        .as_deref()
        .map(str::to_lowercase)
        .unwrap_or_default();

    terms
        .iter()
        .map(|term| {
            let mut score = 0;
            if title.contains(term.as_str()) {
                score += TITLE_WEIGHT;
            }
            if !category.is_empty() && category.contains(term.as_str()) {
                score += CATEGORY_WEIGHT;
            }
            if author.contains(term.as_str()) {
                score += AUTHOR_WEIGHT;
            }
            if body.contains(term.as_str()) {
                score += BODY_WEIGHT;
            }
            score
        })
        .sum()
}

/// Scores `candidates`, drops the non-matching ones and orders the rest by
/// relevance, newest first among equals.
pub fn rank(candidates: Vec<Article>, terms: &[String]) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .map(|article| {
            let relevance = relevance(&article, terms);
            SearchHit { article, relevance }
        })
        .filter(|hit| hit.relevance > 0)
        .collect();

    hits.sort_by_key(|hit| (Reverse(hit.relevance), Reverse(hit.article.created_at)));
    hits
}

