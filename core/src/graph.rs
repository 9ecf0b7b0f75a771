//! Directed link graph read from a link file.
//!
//! Each line is `title;target1,target2,...`. Titles get dense node ids in
//! the order they are first seen, whether as a source or as a target; a
//! node that never shows up as a source with targets is a sink.

use crate::NodeId;
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    doc_number: HashMap<String, NodeId>,
    doc_name: Vec<String>,
    /// Distinct successors per node; empty exactly for sinks.
    links: Vec<Vec<NodeId>>,
    num_sinks: usize,
    truncated: bool,
}

impl LinkGraph {
    /// Opens and parses a link file. A missing or unreadable file is an error;
    /// bad lines inside it are not.
    pub fn from_path<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("opening link file {}", path.display()))?;
        Self::from_reader(BufReader::new(f), capacity)
            .with_context(|| format!("reading link file {}", path.display()))
    }

    /// Only I/O errors fail the parse; lines that are not UTF-8 are skipped.
    pub fn from_reader<R: BufRead>(reader: R, capacity: usize) -> Result<Self> {
        let mut builder = Builder::new(capacity);
        for (lineno, raw) in reader.split(b'\n').enumerate() {
            let raw = raw?;
            let Ok(line) = std::str::from_utf8(&raw) else {
                tracing::warn!(lineno = lineno + 1, "skipping link line that is not valid UTF-8");
                continue;
            };
            if !builder.push_line(lineno + 1, line) {
                break;
            }
        }
        Ok(builder.finish())
    }

    /// Parses link lines held in memory.
    pub fn parse_str(text: &str, capacity: usize) -> Self {
        let mut builder = Builder::new(capacity);
        for (lineno, line) in text.lines().enumerate() {
            if !builder.push_line(lineno + 1, line) {
                break;
            }
        }
        builder.finish()
    }

    pub fn len(&self) -> usize { self.doc_name.len() }

    pub fn is_empty(&self) -> bool { self.doc_name.is_empty() }

    pub fn id(&self, title: &str) -> Option<NodeId> { self.doc_number.get(title).copied() }

    pub fn name(&self, node: NodeId) -> Option<&str> { self.doc_name.get(node as usize).map(String::as_str) }

    pub fn outlinks(&self, node: NodeId) -> usize { self.links.get(node as usize).map_or(0, Vec::len) }

    /// Successors of `node`, or `None` for sinks and unknown nodes.
    pub fn successors(&self, node: NodeId) -> Option<&[NodeId]> {
        match self.links.get(node as usize) {
            Some(s) if !s.is_empty() => Some(s.as_slice()),
            _ => None,
        }
    }

    pub fn is_sink(&self, node: NodeId) -> bool { self.outlinks(node) == 0 }

    pub fn num_sinks(&self) -> usize { self.num_sinks }

    pub fn num_links(&self) -> usize { self.links.iter().map(Vec::len).sum() }

    /// True when parsing stopped because the node table filled up.
    pub fn truncated(&self) -> bool { self.truncated }

    pub fn has_link(&self, from: NodeId, to: NodeId) -> bool {
        self.successors(from).is_some_and(|s| s.contains(&to))
    }
}

struct Builder {
    graph: LinkGraph,
    seen_edges: Vec<HashSet<NodeId>>,
    capacity: usize,
}

impl Builder {
    fn new(capacity: usize) -> Self {
        Self { graph: LinkGraph::default(), seen_edges: Vec::new(), capacity }
    }

    fn full(&self) -> bool { self.graph.doc_name.len() >= self.capacity }

    fn node(&mut self, title: &str) -> Option<NodeId> {
        if let Some(&id) = self.graph.doc_number.get(title) {
            return Some(id);
        }
        if self.full() {
            return None;
        }
        let id = self.graph.doc_name.len() as NodeId;
        self.graph.doc_number.insert(title.to_string(), id);
        self.graph.doc_name.push(title.to_string());
        self.graph.links.push(Vec::new());
        self.seen_edges.push(HashSet::new());
        Some(id)
    }

    /// Returns false once the node table is full.
    fn push_line(&mut self, lineno: usize, line: &str) -> bool {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            return true;
        }
        let Some((title, targets)) = line.split_once(';') else {
            tracing::warn!(lineno, "skipping link line without ';'");
            return true;
        };
        let Some(from) = self.node(title) else {
            self.graph.truncated = true;
            return false;
        };
        for target in targets.split(',').filter(|t| !t.is_empty()) {
            let Some(to) = self.node(target) else {
                self.graph.truncated = true;
                return false;
            };
            if self.seen_edges[from as usize].insert(to) {
                self.graph.links[from as usize].push(to);
            }
        }
        true
    }

    fn finish(mut self) -> LinkGraph {
        self.graph.num_sinks = self.graph.links.iter().filter(|s| s.is_empty()).count();
        if self.graph.truncated {
            tracing::warn!(capacity = self.capacity, "stopped reading links since the document table is full");
        }
        tracing::info!(
            nodes = self.graph.len(),
            links = self.graph.num_links(),
            sinks = self.graph.num_sinks,
            "link graph loaded"
        );
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_ids_in_first_seen_order() {
        let g = LinkGraph::parse_str("10;20,30\n30;10\n", 100);
        assert_eq!(g.len(), 3);
        assert_eq!(g.id("10"), Some(0));
        assert_eq!(g.id("20"), Some(1));
        assert_eq!(g.id("30"), Some(2));
        assert_eq!(g.name(1), Some("20"));
        assert_eq!(g.id("40"), None);
    }

    #[test]
    fn undecodable_line_is_skipped() {
        let g = LinkGraph::from_reader(std::io::Cursor::new(&b"a;b\nc\xff;d\r\nb;a\r\n"[..]), 100).unwrap();
        assert_eq!(g.len(), 2);
        assert!(g.has_link(g.id("a").unwrap(), g.id("b").unwrap()));
        assert!(g.has_link(g.id("b").unwrap(), g.id("a").unwrap()));
        assert_eq!(g.id("d"), None);
    }

    #[test]
    fn repeated_edges_count_once() {
        let g = LinkGraph::parse_str("a;b,b,c\na;c\n", 100);
        let a = g.id("a").unwrap();
        assert_eq!(g.outlinks(a), 2);
        assert_eq!(g.successors(a).unwrap().len(), 2);
    }

    #[test]
    fn sinks_have_no_successor_set() {
        let g = LinkGraph::parse_str("a;b\nc;\n", 100);
        assert_eq!(g.num_sinks(), 2);
        for title in ["b", "c"] {
            let id = g.id(title).unwrap();
            assert!(g.is_sink(id));
            assert!(g.successors(id).is_none());
        }
        assert!(!g.is_sink(g.id("a").unwrap()));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let g = LinkGraph::parse_str("a;b\nno separator here\n,,\nb;a\n", 100);
        assert_eq!(g.len(), 2);
        assert!(g.has_link(0, 1));
        assert!(g.has_link(1, 0));
    }

    #[test]
    fn empty_target_tokens_are_ignored() {
        let g = LinkGraph::parse_str("a;,b,,c,\n", 100);
        assert_eq!(g.outlinks(0), 2);
    }

    #[test]
    fn capacity_exhaustion_keeps_partial_graph() {
        let g = LinkGraph::parse_str("a;b,c,d\ne;a\n", 3);
        assert!(g.truncated());
        assert_eq!(g.len(), 3);
        assert_eq!(g.outlinks(0), 2);
        assert_eq!(g.id("e"), None);
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(LinkGraph::from_path("/definitely/not/here/links.txt", 10).is_err());
    }
}
