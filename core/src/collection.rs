use crate::graph::LinkGraph;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-document tables supplied by whoever loads the documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub num_docs: u32,
    /// Number of tokens in each document, used for length normalization.
    pub lengths: HashMap<DocId, u32>,
    /// Title of each document; also the key that joins documents to link-graph nodes.
    pub names: HashMap<DocId, String>,
    #[serde(default)]
    pub authority: HashMap<DocId, f64>,
}

impl Collection {
    pub fn new() -> Self { Self::default() }

    /// Registers a document. Re-adding a doc id overwrites its entry.
    pub fn add_document(&mut self, doc_id: DocId, name: impl Into<String>, length: u32) {
        if self.names.insert(doc_id, name.into()).is_none() {
            self.num_docs += 1;
        }
        self.lengths.insert(doc_id, length);
    }

    pub fn length(&self, doc_id: DocId) -> Option<u32> { self.lengths.get(&doc_id).copied() }

    pub fn name(&self, doc_id: DocId) -> Option<&str> { self.names.get(&doc_id).map(String::as_str) }

    pub fn authority(&self, doc_id: DocId) -> Option<f64> { self.authority.get(&doc_id).copied() }

    /// Copies node scores onto documents whose title matches a graph node.
    /// Returns how many documents received a score.
    pub fn attach_authority(&mut self, graph: &LinkGraph, scores: &[f64]) -> usize {
        self.authority.clear();
        for (&doc_id, name) in &self.names {
            let Some(node) = graph.id(name) else { continue };
            if let Some(&s) = scores.get(node as usize) {
                self.authority.insert(doc_id, s);
            }
        }
        tracing::info!(matched = self.authority.len(), docs = self.names.len(), "attached authority scores");
        self.authority.len()
    }
}
