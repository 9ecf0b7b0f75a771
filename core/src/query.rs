use crate::postings::ScoredDoc;
use crate::DocId;
use anyhow::{bail, Result};
use std::collections::{BTreeMap, HashMap};

/// Weight of the original query in relevance feedback.
pub const FEEDBACK_ALPHA: f64 = 1.0;
/// Weight of the averaged relevant documents in relevance feedback.
pub const FEEDBACK_BETA: f64 = 0.8;

/// Term frequencies of indexed documents, needed to expand a query from feedback.
pub trait DocumentVectors {
    fn term_frequencies(&self, doc_id: DocId) -> Option<&HashMap<String, u32>>;
}

/// Terms with index-aligned weights.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    terms: Vec<String>,
    weights: Vec<f64>,
}

impl Query {
    pub fn new() -> Self { Self::default() }

    /// Splits on whitespace; every term gets weight 1.
    pub fn parse(text: &str) -> Self { Self::from_terms(text.split_whitespace()) }

    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        let weights = vec![1.0; terms.len()];
        Self { terms, weights }
    }

    pub fn with_weights(terms: Vec<String>, weights: Vec<f64>) -> Result<Self> {
        if terms.len() != weights.len() {
            bail!("query has {} terms but {} weights", terms.len(), weights.len());
        }
        Ok(Self { terms, weights })
    }

    pub fn push(&mut self, term: impl Into<String>, weight: f64) {
        self.terms.push(term.into());
        self.weights.push(weight);
    }

    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn terms(&self) -> &[String] { &self.terms }

    pub fn weights(&self) -> &[f64] { &self.weights }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.terms.iter().map(String::as_str).zip(self.weights.iter().copied())
    }

    pub fn weight_of(&self, term: &str) -> Option<f64> {
        let mut found = None;
        for (t, w) in self.iter() {
            if t == term {
                *found.get_or_insert(0.0) += w;
            }
        }
        found
    }

    /// Rewrites the query from user feedback on a ranked result list.
    ///
    /// `relevant[i]` marks `results[i]`; marks past the end of `results` and
    /// documents without a term vector are ignored. The new terms come out
    /// sorted alphabetically.
    pub fn relevance_feedback<V: DocumentVectors + ?Sized>(&mut self, results: &[ScoredDoc], relevant: &[bool], vectors: &V) {
        let weight_sum: f64 = self.weights.iter().sum();
        let mut query_vec: BTreeMap<String, f64> = BTreeMap::new();
        for (t, w) in self.iter() {
            *query_vec.entry(t.to_string()).or_insert(0.0) += w;
        }
        if weight_sum != 0.0 {
            for w in query_vec.values_mut() {
                *w /= weight_sum;
            }
        }

        let mut doc_sum: BTreeMap<String, f64> = BTreeMap::new();
        let mut num_relevant = 0usize;
        for (hit, _) in results.iter().zip(relevant).filter(|(_, r)| **r) {
            let Some(tfs) = vectors.term_frequencies(hit.doc_id) else {
                tracing::warn!(doc_id = hit.doc_id, "no term vector for relevant document");
                continue;
            };
            let tf_sum: u32 = tfs.values().sum();
            if tf_sum == 0 {
                continue;
            }
            num_relevant += 1;
            for (term, &tf) in tfs {
                *doc_sum.entry(term.clone()).or_insert(0.0) += tf as f64 / tf_sum as f64;
            }
        }

        let mut merged: BTreeMap<String, f64> = query_vec.into_iter().map(|(t, w)| (t, w * FEEDBACK_ALPHA)).collect();
        if num_relevant > 0 {
            for (term, sum) in doc_sum {
                *merged.entry(term).or_insert(0.0) += FEEDBACK_BETA * sum / num_relevant as f64;
            }
        }
        tracing::debug!(relevant = num_relevant, terms = merged.len(), "expanded query from feedback");

        let (terms, weights) = merged.into_iter().unzip();
        self.terms = terms;
        self.weights = weights;
    }
}
