//! Boolean, phrase and ranked query evaluation over postings lists.

use crate::collection::Collection;
use crate::config::RankingConfig;
use crate::postings::{PostingsEntry, PostingsList, ScoredDoc};
use crate::query::Query;
use crate::scoring;
use crate::Position;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    Intersection,
    Phrase,
    Ranked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankingType {
    TfIdf,
    PageRank,
    Combination,
}

/// Read-only state shared by every query against one collection.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub collection: &'a Collection,
    pub config: &'a RankingConfig,
}

impl<'a> SearchContext<'a> {
    pub fn new(collection: &'a Collection, config: &'a RankingConfig) -> Self { Self { collection, config } }

    /// Collection size used for idf.
    pub fn num_docs(&self) -> u32 { self.config.num_docs.unwrap_or(self.collection.num_docs) }
}

#[derive(Debug, Clone)]
pub enum SearchResult {
    /// Boolean matches; phrase matches carry the phrase end positions.
    Matches(PostingsList),
    /// Documents in descending score order.
    Ranked(Vec<ScoredDoc>),
}

impl SearchResult {
    pub fn len(&self) -> usize {
        match self {
            SearchResult::Matches(pl) => pl.len(),
            SearchResult::Ranked(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn doc_ids(&self) -> Vec<crate::DocId> {
        match self {
            SearchResult::Matches(pl) => pl.doc_ids().collect(),
            SearchResult::Ranked(v) => v.iter().map(|d| d.doc_id).collect(),
        }
    }

    pub fn ranked(&self) -> Option<&[ScoredDoc]> {
        match self {
            SearchResult::Ranked(v) => Some(v),
            SearchResult::Matches(_) => None,
        }
    }
}

/// Merge-intersects two doc-id sorted lists. Entries keep the left list's positions.
pub fn intersect(left: &PostingsList, right: &PostingsList) -> PostingsList {
    let mut result = PostingsList::new();
    let (l, r) = (left.entries(), right.entries());
    let (mut i, mut j) = (0, 0);
    while i < l.len() && j < r.len() {
        match l[i].doc_id.cmp(&r[j].doc_id) {
            Ordering::Equal => {
                result.push_entry(l[i].clone());
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    result
}

/// Phrase step: keeps documents where some right position is exactly `k`
/// past a left position. The output carries those right positions, so the
/// result can be chained into the next phrase term.
pub fn positional_intersect(left: &PostingsList, right: &PostingsList, k: Position) -> PostingsList {
    let mut answer = PostingsList::new();
    let (l, r) = (left.entries(), right.entries());
    let (mut i, mut j) = (0, 0);
    while i < l.len() && j < r.len() {
        match l[i].doc_id.cmp(&r[j].doc_id) {
            Ordering::Equal => {
                let ends = adjacent_positions(&l[i].positions, &r[j].positions, k);
                if !ends.is_empty() {
                    answer.push_entry(PostingsEntry { doc_id: l[i].doc_id, positions: ends });
                }
                i += 1;
                j += 1;
            }
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
        }
    }
    answer
}

/// Right positions that sit exactly `k` after some left position.
///
/// Both inputs ascend, so the right cursor never moves back: positions more
/// than `k` behind the current left position can never match again.
fn adjacent_positions(left: &[Position], right: &[Position], k: Position) -> Vec<Position> {
    let mut ends = Vec::new();
    let mut j = 0;
    for &lp in left {
        let Some(target) = lp.checked_add(k) else { break };
        while j < right.len() && right[j] < target {
            j += 1;
        }
        if j == right.len() {
            break;
        }
        if right[j] == target {
            ends.push(target);
        }
    }
    ends
}

/// Evaluates an intersection or phrase query. `lookup` resolves a term to
/// its postings. `None` means no match.
pub fn evaluate_boolean<'a, F>(terms: &[String], query_type: QueryType, k: Position, lookup: F) -> Option<PostingsList>
where
    F: Fn(&str) -> Option<&'a PostingsList>,
{
    let mut ordered: Vec<&str> = terms.iter().map(String::as_str).collect();
    if query_type == QueryType::Intersection {
        // Smallest list first so the running result only shrinks.
        ordered.sort_by_key(|t| lookup(t).map_or(0, PostingsList::len));
    }
    tracing::debug!(?query_type, terms = ?ordered, "planned boolean query");

    let (first, rest) = ordered.split_first()?;
    let mut result = lookup(first)?.clone();
    for term in rest {
        if result.is_empty() {
            break;
        }
        let next = lookup(term)?;
        result = match query_type {
            QueryType::Phrase => positional_intersect(&result, next, k),
            _ => intersect(&result, next),
        };
    }
    (!result.is_empty()).then_some(result)
}

/// Dispatches a query against a term lookup. Shared by the word index.
pub fn search_with<'a, F>(query: &Query, query_type: QueryType, ranking: RankingType, ctx: &SearchContext<'_>, lookup: F) -> Option<SearchResult>
where
    F: Fn(&str) -> Option<&'a PostingsList>,
{
    if query.is_empty() {
        return None;
    }
    match query_type {
        QueryType::Intersection | QueryType::Phrase => {
            evaluate_boolean(query.terms(), query_type, ctx.config.phrase_distance, lookup).map(SearchResult::Matches)
        }
        QueryType::Ranked => {
            let found = query.iter().filter_map(|(t, w)| lookup(t).map(|pl| (pl, w)));
            let ranked = scoring::rank(found, query.len(), ranking, ctx);
            (!ranked.is_empty()).then_some(SearchResult::Ranked(ranked))
        }
    }
}
