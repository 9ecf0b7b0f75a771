use crate::{DocId, Position};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// One document's occurrences of a term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingsEntry {
    pub doc_id: DocId,
    /// Token offsets within the document, strictly increasing.
    pub positions: Vec<Position>,
}

impl PostingsEntry {
    pub fn new(doc_id: DocId, position: Position) -> Self {
        Self { doc_id, positions: vec![position] }
    }

    pub fn tf(&self) -> usize { self.positions.len() }

    fn add_position(&mut self, position: Position) {
        match self.positions.last() {
            Some(&last) if position > last => self.positions.push(position),
            _ => {
                if let Err(at) = self.positions.binary_search(&position) {
                    self.positions.insert(at, position);
                }
            }
        }
    }
}

/// A document and its score for a single ranked query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f64,
}

impl ScoredDoc {
    /// Descending by score.
    pub fn by_score_desc(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
        b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
    }
}

/// Postings for a term, sorted strictly ascending by doc id.
///
/// `doc_ids` mirrors the entries for O(1) membership tests; every mutation
/// goes through methods that keep the two in step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingsList {
    entries: Vec<PostingsEntry>,
    doc_ids: HashSet<DocId>,
}

impl PostingsList {
    pub fn new() -> Self { Self::default() }

    /// Builds a list of single-position entries from doc ids in any order.
    pub fn from_doc_ids<I: IntoIterator<Item = DocId>>(ids: I) -> Self {
        let mut list = Self::new();
        for id in ids {
            list.add(id, 0);
        }
        list
    }

    /// Records `position` for `doc_id`.
    ///
    /// Documents normally arrive in ascending order and hit the tail fast
    /// path; an older doc id falls back to a binary search so the ordering
    /// holds for any input.
    pub fn add(&mut self, doc_id: DocId, position: Position) {
        if let Some(last) = self.entries.last_mut() {
            if last.doc_id == doc_id {
                last.add_position(position);
                return;
            }
            if last.doc_id > doc_id {
                match self.entries.binary_search_by_key(&doc_id, |e| e.doc_id) {
                    Ok(i) => self.entries[i].add_position(position),
                    Err(i) => {
                        self.entries.insert(i, PostingsEntry::new(doc_id, position));
                        self.doc_ids.insert(doc_id);
                    }
                }
                return;
            }
        }
        self.entries.push(PostingsEntry::new(doc_id, position));
        self.doc_ids.insert(doc_id);
    }

    /// Appends a whole entry. Callers producing merge output guarantee
    /// ascending doc ids; anything else is folded in through `add`.
    pub(crate) fn push_entry(&mut self, entry: PostingsEntry) {
        let in_order = self.entries.last().map_or(true, |l| l.doc_id < entry.doc_id);
        if in_order && !entry.positions.is_empty() {
            self.doc_ids.insert(entry.doc_id);
            self.entries.push(entry);
        } else {
            for p in entry.positions {
                self.add(entry.doc_id, p);
            }
        }
    }

    pub fn contains(&self, doc_id: DocId) -> bool { self.doc_ids.contains(&doc_id) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, i: usize) -> Option<&PostingsEntry> { self.entries.get(i) }

    pub fn entry(&self, doc_id: DocId) -> Option<&PostingsEntry> {
        if !self.contains(doc_id) {
            return None;
        }
        self.entries
            .binary_search_by_key(&doc_id, |e| e.doc_id)
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn entries(&self) -> &[PostingsEntry] { &self.entries }

    pub fn iter(&self) -> std::slice::Iter<'_, PostingsEntry> { self.entries.iter() }

    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ { self.entries.iter().map(|e| e.doc_id) }

    /// `ln(N / df)` with df taken from the list length. Empty lists get 0.
    pub fn idf(&self, num_docs: u32) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        (num_docs as f64 / self.entries.len() as f64).ln()
    }
}

impl<'a> IntoIterator for &'a PostingsList {
    type Item = &'a PostingsEntry;
    type IntoIter = std::slice::Iter<'a, PostingsEntry>;
    fn into_iter(self) -> Self::IntoIter { self.entries.iter() }
}
