pub mod biword;
pub mod collection;
pub mod config;
pub mod graph;
pub mod index;
pub mod pagerank;
pub mod persist;
pub mod postings;
pub mod query;
pub mod scoring;
pub mod search;
pub mod tokenizer;

pub type DocId = u32;
pub type Position = u32;
pub type NodeId = u32;

pub use biword::BiwordIndex;
pub use collection::Collection;
pub use config::{Config, OracleConfig, RankingConfig, WalkConfig};
pub use graph::LinkGraph;
pub use index::{HashedIndex, Index, IndexKind, IndexSnapshot};
pub use postings::{PostingsEntry, PostingsList, ScoredDoc};
pub use query::{DocumentVectors, Query};
pub use search::{QueryType, RankingType, SearchContext, SearchResult};
