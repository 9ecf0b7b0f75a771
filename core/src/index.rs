use crate::biword::BiwordIndex;
use crate::postings::PostingsList;
use crate::query::{DocumentVectors, Query};
use crate::search::{self, QueryType, RankingType, SearchContext, SearchResult};
use crate::{DocId, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Operations every index variant supports.
///
/// Building takes `&mut self` and querying `&self`, so a built index can be
/// shared between reader threads but never queried mid-insert.
pub trait Index: Send + Sync {
    /// Records one token occurrence. Documents are expected in ascending
    /// doc id order with ascending positions.
    fn insert(&mut self, term: &str, doc_id: DocId, position: Position);

    /// Postings for a dictionary key, or `None` if it was never indexed.
    fn postings(&self, term: &str) -> Option<&PostingsList>;

    /// Every dictionary key, in no particular order.
    fn dictionary(&self) -> Box<dyn Iterator<Item = String> + '_>;

    fn search(&self, query: &Query, query_type: QueryType, ranking: RankingType, ctx: &SearchContext<'_>) -> Option<SearchResult>;

    /// Drops state only needed while building or for feedback. Safe to call twice.
    fn cleanup(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    Words,
    Biwords,
}

/// Word-level inverted index.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HashedIndex {
    index: HashMap<String, PostingsList>,
    /// Term frequencies per document, kept for relevance feedback.
    doc_vectors: HashMap<DocId, HashMap<String, u32>>,
    #[serde(default)]
    track_doc_vectors: bool,
}

impl HashedIndex {
    pub fn new() -> Self { Self::default() }

    /// An index that also keeps per-document term frequencies for relevance feedback.
    pub fn with_doc_vectors() -> Self { Self { track_doc_vectors: true, ..Self::default() } }

    pub fn len(&self) -> usize { self.index.len() }

    pub fn is_empty(&self) -> bool { self.index.is_empty() }
}

impl Index for HashedIndex {
    fn insert(&mut self, term: &str, doc_id: DocId, position: Position) {
        if term.is_empty() {
            tracing::warn!(doc_id, position, "empty token");
            return;
        }
        self.index.entry(term.to_string()).or_default().add(doc_id, position);
        if self.track_doc_vectors {
            *self.doc_vectors.entry(doc_id).or_default().entry(term.to_string()).or_insert(0) += 1;
        }
    }

    fn postings(&self, term: &str) -> Option<&PostingsList> { self.index.get(term) }

    fn dictionary(&self) -> Box<dyn Iterator<Item = String> + '_> { Box::new(self.index.keys().cloned()) }

    fn search(&self, query: &Query, query_type: QueryType, ranking: RankingType, ctx: &SearchContext<'_>) -> Option<SearchResult> {
        search::search_with(query, query_type, ranking, ctx, |t| self.index.get(t))
    }

    fn cleanup(&mut self) {
        self.doc_vectors.clear();
        self.doc_vectors.shrink_to_fit();
        self.track_doc_vectors = false;
    }
}

impl DocumentVectors for HashedIndex {
    fn term_frequencies(&self, doc_id: DocId) -> Option<&HashMap<String, u32>> { self.doc_vectors.get(&doc_id) }
}

/// A built index of either kind, as written to disk.
#[derive(Debug, Serialize, Deserialize)]
pub enum IndexSnapshot {
    Words(HashedIndex),
    Biwords(BiwordIndex),
}

impl IndexSnapshot {
    pub fn new(kind: IndexKind) -> Self {
        match kind {
            IndexKind::Words => IndexSnapshot::Words(HashedIndex::with_doc_vectors()),
            IndexKind::Biwords => IndexSnapshot::Biwords(BiwordIndex::new()),
        }
    }

    pub fn kind(&self) -> IndexKind {
        match self {
            IndexSnapshot::Words(_) => IndexKind::Words,
            IndexSnapshot::Biwords(_) => IndexKind::Biwords,
        }
    }

    pub fn as_index(&self) -> &dyn Index {
        match self {
            IndexSnapshot::Words(i) => i,
            IndexSnapshot::Biwords(i) => i,
        }
    }

    pub fn as_index_mut(&mut self) -> &mut dyn Index {
        match self {
            IndexSnapshot::Words(i) => i,
            IndexSnapshot::Biwords(i) => i,
        }
    }

    /// Term vectors for feedback; only the word index keeps them.
    pub fn document_vectors(&self) -> Option<&dyn DocumentVectors> {
        match self {
            IndexSnapshot::Words(i) => Some(i as &dyn DocumentVectors),
            IndexSnapshot::Biwords(_) => None,
        }
    }
}
