use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ir_core::config::{self, Config, MAX_NUMBER_OF_DOCS};
use ir_core::pagerank::{MonteCarlo, WalkStrategy};
use ir_core::persist::{load_all, read_scores, save_collection, save_index, save_meta, IndexPaths, MetaFile};
use ir_core::tokenizer::Tokenizer;
use ir_core::{
    Collection, DocId, IndexKind, IndexSnapshot, LinkGraph, Position, Query, QueryType, RankingType, ScoredDoc,
    SearchContext, SearchResult,
};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a positional index and run boolean, phrase and ranked queries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every file under a directory; sorted paths get ascending doc ids
    Build {
        /// Input directory
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Index consecutive word pairs instead of single words
        #[arg(long, default_value_t = false)]
        biword: bool,
        /// Drop common English stopwords before indexing
        #[arg(long, default_value_t = false)]
        remove_stopwords: bool,
        /// Index surface forms instead of stems
        #[arg(long, default_value_t = false)]
        no_stem: bool,
        /// Skip the per-document term vectors used by relevance feedback
        #[arg(long, default_value_t = false)]
        no_feedback: bool,
    },
    /// Query a built index
    Search(SearchArgs),
}

#[derive(clap::Args)]
struct SearchArgs {
    /// Index directory
    #[arg(long, default_value = "./index")]
    index: String,
    /// Free-text query
    #[arg(long)]
    query: String,
    #[arg(long, value_enum, default_value_t = Mode::Ranked)]
    mode: Mode,
    #[arg(long, value_enum, default_value_t = Ranking::Tfidf)]
    ranking: Ranking,
    /// Link file providing authority scores for pagerank/combination ranking
    #[arg(long)]
    links: Option<String>,
    /// Precomputed scores aligned with the link file's node order
    #[arg(long)]
    scores: Option<String>,
    /// Random walks used when no score file is given
    #[arg(long, default_value_t = 200_000)]
    walks: usize,
    /// Number of results to print
    #[arg(long, default_value_t = 10)]
    top: usize,
    /// Comma-separated 1-based result ranks marked relevant; reruns the expanded query
    #[arg(long)]
    feedback: Option<String>,
    /// JSON config file
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    idf_threshold: Option<f64>,
    #[arg(long)]
    alpha: Option<f64>,
    /// Override the collection size used for idf
    #[arg(long)]
    num_docs: Option<u32>,
    /// Position gap between consecutive phrase terms
    #[arg(long)]
    distance: Option<Position>,
    /// Print results as JSON lines
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Intersection,
    Phrase,
    Ranked,
}

#[derive(Clone, Copy, ValueEnum)]
enum Ranking {
    Tfidf,
    Pagerank,
    Combination,
}

impl From<Mode> for QueryType {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Intersection => QueryType::Intersection,
            Mode::Phrase => QueryType::Phrase,
            Mode::Ranked => QueryType::Ranked,
        }
    }
}

impl From<Ranking> for RankingType {
    fn from(r: Ranking) -> Self {
        match r {
            Ranking::Tfidf => RankingType::TfIdf,
            Ranking::Pagerank => RankingType::PageRank,
            Ranking::Combination => RankingType::Combination,
        }
    }
}

#[derive(Serialize)]
struct Hit<'a> {
    rank: usize,
    doc_id: DocId,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    positions: Option<&'a [Position]>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, biword, remove_stopwords, no_stem, no_feedback } => {
            let tokenizer = Tokenizer { stem: !no_stem, remove_stopwords };
            let kind = if biword { IndexKind::Biwords } else { IndexKind::Words };
            build_index(&input, &output, kind, tokenizer, !no_feedback)
        }
        Commands::Search(args) => search(args),
    }
}

fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

fn build_index(input: &str, output: &str, kind: IndexKind, tokenizer: Tokenizer, feedback: bool) -> Result<()> {
    let input_path = Path::new(input);
    if !input_path.is_dir() {
        bail!("input {input} is not a directory");
    }
    let out_paths = IndexPaths::new(output);

    let mut snapshot = IndexSnapshot::new(kind);
    let mut collection = Collection::new();
    let mut next_doc_id: DocId = 0;

    for file in collect_files(input_path) {
        let text = match fs::read_to_string(&file) {
            Ok(t) => t,
            Err(err) => {
                tracing::warn!(path = %file.display(), %err, "skipping unreadable document");
                continue;
            }
        };
        let doc_id = next_doc_id;
        next_doc_id += 1;
        let tokens = tokenizer.tokenize(&text);
        let index = snapshot.as_index_mut();
        for (term, pos) in &tokens {
            index.insert(term, doc_id, *pos);
        }
        let name = file.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
        collection.add_document(doc_id, name, tokens.len() as u32);
    }

    if !feedback || kind == IndexKind::Biwords {
        snapshot.as_index_mut().cleanup();
    }
    let num_terms = snapshot.as_index().dictionary().count();
    tracing::info!(num_docs = collection.num_docs, num_terms, ?kind, "ingested documents");

    save_index(&out_paths, &snapshot)?;
    save_collection(&out_paths, &collection)?;
    let meta = MetaFile {
        num_docs: collection.num_docs,
        num_terms,
        kind,
        stem: tokenizer.stem,
        remove_stopwords: tokenizer.remove_stopwords,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: 1,
    };
    save_meta(&out_paths, &meta)?;

    tracing::info!(output, "index build complete");
    Ok(())
}

fn load_config(args: &SearchArgs) -> Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => config::load(path)?,
        None => Config::default(),
    };
    if let Some(t) = args.idf_threshold {
        cfg.ranking.idf_threshold = t;
    }
    if let Some(a) = args.alpha {
        cfg.ranking.blend_alpha = a;
    }
    if args.num_docs.is_some() {
        cfg.ranking.num_docs = args.num_docs;
    }
    if let Some(k) = args.distance {
        if k == 0 {
            bail!("--distance must be at least 1");
        }
        cfg.ranking.phrase_distance = k;
    }
    Ok(cfg)
}

/// Loads authority scores from a score file, or estimates them when the file
/// is missing or unusable.
fn authority_scores(graph: &LinkGraph, args: &SearchArgs, cfg: &Config) -> Vec<f64> {
    if let Some(path) = &args.scores {
        match read_scores(path, graph.len()) {
            Ok(scores) => return scores,
            Err(err) => tracing::warn!(%err, "falling back to Monte-Carlo estimate"),
        }
    }
    MonteCarlo::new(graph, cfg.walk.clone()).estimate(WalkStrategy::CompletePathRandomStart { walks: args.walks, horizon: 100 })
}

fn search(args: SearchArgs) -> Result<()> {
    let cfg = load_config(&args)?;
    let paths = IndexPaths::new(&args.index);
    let (snapshot, mut collection, meta) = load_all(&paths).with_context(|| format!("loading index {}", args.index))?;

    if let Some(links) = &args.links {
        let graph = LinkGraph::from_path(links, MAX_NUMBER_OF_DOCS)?;
        let scores = authority_scores(&graph, &args, &cfg);
        collection.attach_authority(&graph, &scores);
    }

    let ranking = RankingType::from(args.ranking);
    if lacks_authority(ranking, &collection) {
        tracing::warn!(?ranking, "no authority scores attached; pass --links to rank by link authority");
    }

    let tokenizer = Tokenizer { stem: meta.stem, remove_stopwords: meta.remove_stopwords };
    let mut query = Query::from_terms(tokenizer.terms(&args.query));
    let query_type = QueryType::from(args.mode);
    let ctx = SearchContext::new(&collection, &cfg.ranking);
    let index = snapshot.as_index();

    let result = index.search(&query, query_type, ranking, &ctx);
    print_result(result.as_ref(), &collection, &args);

    let Some(marks) = &args.feedback else { return Ok(()) };
    let Some(ranked) = result.as_ref().and_then(SearchResult::ranked) else {
        bail!("relevance feedback needs ranked results");
    };
    let Some(vectors) = snapshot.document_vectors() else {
        bail!("this index was built without term vectors");
    };
    let relevant = parse_marks(marks, ranked.len().min(args.top))?;
    query.relevance_feedback(ranked, &relevant, vectors);
    tracing::info!(terms = query.len(), "rerunning expanded query");
    let expanded = index.search(&query, QueryType::Ranked, ranking, &ctx);
    print_result(expanded.as_ref(), &collection, &args);
    Ok(())
}

/// Authority-based rankings are meaningless when every document scores 0.
fn lacks_authority(ranking: RankingType, collection: &Collection) -> bool {
    matches!(ranking, RankingType::PageRank | RankingType::Combination) && collection.authority.is_empty()
}

fn parse_marks(marks: &str, shown: usize) -> Result<Vec<bool>> {
    let mut relevant = vec![false; shown];
    for part in marks.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let rank: usize = part.parse().with_context(|| format!("bad feedback rank {part:?}"))?;
        if rank == 0 || rank > shown {
            bail!("feedback rank {rank} is outside the {shown} shown results");
        }
        relevant[rank - 1] = true;
    }
    Ok(relevant)
}

fn print_result(result: Option<&SearchResult>, collection: &Collection, args: &SearchArgs) {
    let Some(result) = result else {
        println!("no match");
        return;
    };
    let hits: Vec<Hit> = match result {
        SearchResult::Ranked(docs) => docs
            .iter()
            .take(args.top)
            .enumerate()
            .map(|(i, &ScoredDoc { doc_id, score })| Hit {
                rank: i + 1,
                doc_id,
                name: collection.name(doc_id).unwrap_or("?"),
                score: Some(score),
                positions: None,
            })
            .collect(),
        SearchResult::Matches(list) => list
            .iter()
            .take(args.top)
            .enumerate()
            .map(|(i, e)| Hit {
                rank: i + 1,
                doc_id: e.doc_id,
                name: collection.name(e.doc_id).unwrap_or("?"),
                score: None,
                positions: Some(&e.positions),
            })
            .collect(),
    };
    println!("{} matching documents", result.len());
    for hit in hits {
        if args.json {
            match serde_json::to_string(&hit) {
                Ok(line) => println!("{line}"),
                Err(err) => tracing::warn!(%err, "could not encode hit"),
            }
        } else if let Some(score) = hit.score {
            println!("{:>3}. {} {:.6}", hit.rank, hit.name, score);
        } else {
            println!("{:>3}. {}", hit.rank, hit.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_marks_are_one_based() {
        assert_eq!(parse_marks("1, 3", 4).unwrap(), vec![true, false, true, false]);
        assert!(parse_marks("0", 4).is_err());
        assert!(parse_marks("5", 4).is_err());
        assert!(parse_marks("x", 4).is_err());
    }

    #[test]
    fn authority_rankings_need_scores() {
        let mut collection = Collection::new();
        collection.add_document(0, "a", 3);
        assert!(lacks_authority(RankingType::PageRank, &collection));
        assert!(lacks_authority(RankingType::Combination, &collection));
        assert!(!lacks_authority(RankingType::TfIdf, &collection));

        let graph = LinkGraph::parse_str("a;b\n", 10);
        collection.attach_authority(&graph, &[0.6, 0.4]);
        assert!(!lacks_authority(RankingType::PageRank, &collection));
    }

    #[test]
    fn distance_flag_sets_phrase_gap() {
        let cli = Cli::parse_from(["indexer", "search", "--query", "new york", "--distance", "2"]);
        let Commands::Search(args) = cli.command else { panic!("expected search") };
        assert_eq!(load_config(&args).unwrap().ranking.phrase_distance, 2);

        let cli = Cli::parse_from(["indexer", "search", "--query", "q", "--distance", "0"]);
        let Commands::Search(args) = cli.command else { panic!("expected search") };
        assert!(load_config(&args).is_err());
    }
}
