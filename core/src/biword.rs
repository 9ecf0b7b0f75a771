use crate::index::Index;
use crate::postings::PostingsList;
use crate::query::Query;
use crate::scoring;
use crate::search::{QueryType, RankingType, SearchContext, SearchResult};
use crate::{DocId, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index over consecutive term pairs within a document.
///
/// A pair's position is the position of its second term. Dictionary keys
/// are the two terms joined by a single space.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BiwordIndex {
    index: HashMap<String, HashMap<String, PostingsList>>,
    #[serde(skip)]
    previous: Option<(DocId, String)>,
}

impl BiwordIndex {
    pub fn new() -> Self { Self::default() }

    pub fn pair(&self, first: &str, second: &str) -> Option<&PostingsList> {
        self.index.get(first).and_then(|m| m.get(second))
    }

    pub fn len(&self) -> usize { self.index.values().map(HashMap::len).sum() }

    pub fn is_empty(&self) -> bool { self.index.is_empty() }
}

impl Index for BiwordIndex {
    fn insert(&mut self, term: &str, doc_id: DocId, position: Position) {
        if term.is_empty() {
            tracing::warn!(doc_id, position, "empty token");
            return;
        }
        let previous = match self.previous.take() {
            Some((prev_doc, prev_term)) if prev_doc == doc_id => prev_term,
            _ => {
                // First token of a new document only opens a pair.
                self.previous = Some((doc_id, term.to_string()));
                return;
            }
        };
        self.index
            .entry(previous)
            .or_default()
            .entry(term.to_string())
            .or_default()
            .add(doc_id, position);
        self.previous = Some((doc_id, term.to_string()));
    }

    fn postings(&self, term: &str) -> Option<&PostingsList> {
        let mut words = term.split_whitespace();
        let (first, second) = (words.next()?, words.next()?);
        if words.next().is_some() {
            return None;
        }
        self.pair(first, second)
    }

    fn dictionary(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(
            self.index
                .iter()
                .flat_map(|(first, seconds)| seconds.keys().map(move |second| format!("{first} {second}"))),
        )
    }

    fn search(&self, query: &Query, query_type: QueryType, ranking: RankingType, ctx: &SearchContext<'_>) -> Option<SearchResult> {
        if query_type != QueryType::Ranked {
            tracing::warn!(?query_type, "biword index only supports ranked queries");
            return None;
        }
        if query.len() < 2 {
            return None;
        }
        let pairs = query.len() - 1;
        let terms = query.terms();
        let weights = query.weights();
        let found = (1..terms.len()).filter_map(|i| {
            let pl = self.pair(&terms[i - 1], &terms[i])?;
            // A pair carries the mean of its two term weights.
            Some((pl, (weights[i - 1] + weights[i]) / 2.0))
        });
        let ranked = scoring::rank(found, pairs, ranking, ctx);
        (!ranked.is_empty()).then_some(SearchResult::Ranked(ranked))
    }

    fn cleanup(&mut self) { self.previous = None; }
}
