//! Ranked scoring: tf-idf cosine, link authority, and their blend.
//!
//! Scores are built per query in a [`ScoreAccumulator`] so the stored
//! postings stay untouched while several queries run at once.

use crate::postings::{PostingsList, ScoredDoc};
use crate::search::{RankingType, SearchContext};
use crate::DocId;
use std::collections::HashMap;

/// Per-query scores in first-seen document order.
#[derive(Debug, Default)]
pub struct ScoreAccumulator {
    docs: Vec<ScoredDoc>,
    slot: HashMap<DocId, usize>,
}

impl ScoreAccumulator {
    pub fn new() -> Self { Self::default() }

    /// Adds `score` to the document's running total.
    pub fn add(&mut self, doc_id: DocId, score: f64) {
        match self.slot.get(&doc_id) {
            Some(&i) => self.docs[i].score += score,
            None => {
                self.slot.insert(doc_id, self.docs.len());
                self.docs.push(ScoredDoc { doc_id, score });
            }
        }
    }

    pub fn get(&self, doc_id: DocId) -> Option<f64> { self.slot.get(&doc_id).map(|&i| self.docs[i].score) }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    /// Sorts by descending score; equal scores keep first-seen order.
    pub fn into_ranked(self) -> Vec<ScoredDoc> {
        let mut docs = self.docs;
        docs.sort_by(ScoredDoc::by_score_desc);
        docs
    }
}

/// Scores documents for the given `(postings, query weight)` pairs.
///
/// `query_len` is the divisor for query-side weights: the number of query
/// terms, or biwords for the biword index.
pub fn rank<'a, I>(terms: I, query_len: usize, ranking: RankingType, ctx: &SearchContext<'_>) -> Vec<ScoredDoc>
where
    I: IntoIterator<Item = (&'a PostingsList, f64)>,
{
    let terms: Vec<(&PostingsList, f64)> = terms.into_iter().collect();
    let acc = match ranking {
        RankingType::TfIdf => cosine_scores(&terms, query_len, ctx),
        RankingType::PageRank => authority_scores(&terms, ctx),
        RankingType::Combination => {
            let cosine = cosine_scores(&terms, query_len, ctx);
            let alpha = ctx.config.blend_alpha;
            let mut blended = ScoreAccumulator::new();
            for d in cosine.docs {
                let authority = ctx.collection.authority(d.doc_id).unwrap_or(0.0);
                blended.add(d.doc_id, alpha * d.score + (1.0 - alpha) * authority);
            }
            blended
        }
    };
    acc.into_ranked()
}

fn cosine_scores(terms: &[(&PostingsList, f64)], query_len: usize, ctx: &SearchContext<'_>) -> ScoreAccumulator {
    let n = ctx.num_docs();
    let query_len = query_len.max(1) as f64;
    let mut acc = ScoreAccumulator::new();
    for &(postings, weight) in terms {
        let idf = postings.idf(n);
        if idf < ctx.config.idf_threshold {
            tracing::debug!(df = postings.len(), idf, "skipping low-idf term");
            continue;
        }
        // Query tf is 1; repeated query terms are scored once per occurrence.
        let query_weight = weight * idf / query_len;
        for entry in postings {
            let length = match ctx.collection.length(entry.doc_id) {
                Some(l) if l > 0 => l as f64,
                _ => entry.tf() as f64,
            };
            let doc_weight = entry.tf() as f64 * idf / length;
            acc.add(entry.doc_id, query_weight * doc_weight);
        }
    }
    acc
}

fn authority_scores(terms: &[(&PostingsList, f64)], ctx: &SearchContext<'_>) -> ScoreAccumulator {
    let mut acc = ScoreAccumulator::new();
    for &(postings, _) in terms {
        for doc_id in postings.doc_ids() {
            if acc.get(doc_id).is_none() {
                acc.add(doc_id, ctx.collection.authority(doc_id).unwrap_or(0.0));
            }
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use crate::config::RankingConfig;

    fn list(docs: &[(DocId, &[u32])]) -> PostingsList {
        let mut pl = PostingsList::new();
        for (d, positions) in docs {
            for &p in *positions {
                pl.add(*d, p);
            }
        }
        pl
    }

    fn collection() -> Collection {
        let mut c = Collection::new();
        for (d, len) in [(0, 10), (1, 5), (2, 20), (3, 8)] {
            c.add_document(d, format!("doc{d}"), len);
        }
        c.authority.insert(0, 0.1);
        c.authority.insert(1, 0.6);
        c.authority.insert(2, 0.3);
        c
    }

    #[test]
    fn accumulator_sums_repeated_documents() {
        let mut acc = ScoreAccumulator::new();
        acc.add(3, 0.5);
        acc.add(1, 0.25);
        acc.add(3, 0.5);
        assert_eq!(acc.len(), 2);
        assert_eq!(acc.get(3), Some(1.0));
        let ranked = acc.into_ranked();
        assert_eq!(ranked[0].doc_id, 3);
    }

    #[test]
    fn tfidf_matches_hand_computation() {
        let c = collection();
        let cfg = RankingConfig::default();
        let ctx = SearchContext::new(&c, &cfg);
        let a = list(&[(0, &[1, 4]), (1, &[0])]);
        let b = list(&[(1, &[3])]);
        let ranked = rank([(&a, 1.0), (&b, 1.0)], 2, RankingType::TfIdf, &ctx);

        let idf_a = (4.0f64 / 2.0).ln();
        let idf_b = (4.0f64 / 1.0).ln();
        let d0 = (idf_a / 2.0) * (2.0 * idf_a / 10.0);
        let d1 = (idf_a / 2.0) * (idf_a / 5.0) + (idf_b / 2.0) * (idf_b / 5.0);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].doc_id, 1);
        assert!((ranked[0].score - d1).abs() < 1e-12);
        assert!((ranked[1].score - d0).abs() < 1e-12);
    }

    #[test]
    fn idf_threshold_drops_common_terms() {
        let c = collection();
        let cfg = RankingConfig { idf_threshold: 1.0, ..RankingConfig::default() };
        let ctx = SearchContext::new(&c, &cfg);
        let common = list(&[(0, &[0]), (1, &[0]), (2, &[0])]);
        let rare = list(&[(3, &[0])]);
        let ranked = rank([(&common, 1.0), (&rare, 1.0)], 2, RankingType::TfIdf, &ctx);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].doc_id, 3);
    }

    #[test]
    fn pagerank_mode_ignores_term_frequency() {
        let c = collection();
        let cfg = RankingConfig::default();
        let ctx = SearchContext::new(&c, &cfg);
        let a = list(&[(0, &[0, 1, 2, 3]), (2, &[0])]);
        let b = list(&[(1, &[0]), (2, &[5]), (3, &[1])]);
        let ranked = rank([(&a, 1.0), (&b, 1.0)], 2, RankingType::PageRank, &ctx);
        let ids: Vec<DocId> = ranked.iter().map(|d| d.doc_id).collect();
        assert_eq!(ids, vec![1, 2, 0, 3]);
        assert_eq!(ranked[1].score, 0.3);
        assert_eq!(ranked[3].score, 0.0);
    }

    #[test]
    fn combination_blends_with_alpha() {
        let c = collection();
        let cfg = RankingConfig { blend_alpha: 0.25, ..RankingConfig::default() };
        let ctx = SearchContext::new(&c, &cfg);
        let a = list(&[(0, &[0]), (1, &[0])]);
        let cosine = rank([(&a, 1.0)], 1, RankingType::TfIdf, &ctx);
        let blended = rank([(&a, 1.0)], 1, RankingType::Combination, &ctx);
        for d in &blended {
            let cos = cosine.iter().find(|x| x.doc_id == d.doc_id).unwrap().score;
            let auth = c.authority(d.doc_id).unwrap();
            assert!((d.score - (0.25 * cos + 0.75 * auth)).abs() < 1e-12);
        }
        assert_eq!(blended[0].doc_id, 1);
    }

    #[test]
    fn ranking_is_deterministic() {
        let c = collection();
        let cfg = RankingConfig::default();
        let ctx = SearchContext::new(&c, &cfg);
        let a = list(&[(0, &[0]), (1, &[0]), (2, &[0]), (3, &[0])]);
        let first = rank([(&a, 1.0)], 1, RankingType::PageRank, &ctx);
        let second = rank([(&a, 1.0)], 1, RankingType::PageRank, &ctx);
        assert_eq!(first, second);
    }
}
