use ir_core::pagerank::{ExactSolver, MonteCarlo, WalkStrategy};
use ir_core::tokenizer::Tokenizer;
use ir_core::{
    Collection, DocId, HashedIndex, Index, LinkGraph, OracleConfig, Query, QueryType, RankingConfig, RankingType,
    SearchContext, WalkConfig,
};
use std::sync::Arc;
use std::thread;

const DOCS: &[(&str, &str)] = &[
    ("0", "Zombie attacks are rising in the city. Zombie defense is a growing field."),
    ("1", "The city council discussed traffic and parking."),
    ("2", "A field guide to zombie attack survival in the countryside."),
    ("3", "Parking attacks: how meters attack your wallet."),
];

const LINKS: &str = "0;2\n1;0\n2;0\n3;0,1\n";

fn build() -> (HashedIndex, Collection) {
    let tokenizer = Tokenizer::default();
    let mut index = HashedIndex::with_doc_vectors();
    let mut collection = Collection::new();
    for (doc_id, (name, text)) in DOCS.iter().enumerate() {
        let tokens = tokenizer.tokenize(text);
        for (term, pos) in &tokens {
            index.insert(term, doc_id as DocId, *pos);
        }
        collection.add_document(doc_id as DocId, *name, tokens.len() as u32);
    }
    (index, collection)
}

fn query(text: &str) -> Query { Query::from_terms(Tokenizer::default().terms(text)) }

#[test]
fn boolean_and_phrase_queries() {
    let (index, collection) = build();
    let cfg = RankingConfig::default();
    let ctx = SearchContext::new(&collection, &cfg);

    let hits = index.search(&query("zombie attack"), QueryType::Intersection, RankingType::TfIdf, &ctx).unwrap();
    assert_eq!(hits.doc_ids(), vec![0, 2]);

    let phrase = index.search(&query("zombie attack"), QueryType::Phrase, RankingType::TfIdf, &ctx).unwrap();
    assert_eq!(phrase.doc_ids(), vec![0, 2]);

    assert!(index.search(&query("attack zombie"), QueryType::Phrase, RankingType::TfIdf, &ctx).is_none());
    assert!(index.search(&query("unicorn"), QueryType::Intersection, RankingType::TfIdf, &ctx).is_none());
}

#[test]
fn authority_reorders_ranked_results() {
    let (index, mut collection) = build();
    let graph = LinkGraph::parse_str(LINKS, 100);
    let exact = ExactSolver::new(&graph, OracleConfig::default()).solve().unwrap();
    assert_eq!(collection.attach_authority(&graph, &exact.scores), 4);

    let cfg = RankingConfig::default();
    let ctx = SearchContext::new(&collection, &cfg);
    let q = query("city parking");

    let by_content = index.search(&q, QueryType::Ranked, RankingType::TfIdf, &ctx).unwrap();
    assert_eq!(by_content.doc_ids()[0], 1);

    // Doc 0 is the most linked-to page in the graph.
    let by_authority = index.search(&q, QueryType::Ranked, RankingType::PageRank, &ctx).unwrap();
    assert_eq!(by_authority.doc_ids()[0], 0);

    let blended = index.search(&q, QueryType::Ranked, RankingType::Combination, &ctx).unwrap();
    let mut a = by_content.doc_ids();
    let mut b = blended.doc_ids();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[test]
fn feedback_pulls_in_terms_from_relevant_documents() {
    let (index, collection) = build();
    let cfg = RankingConfig::default();
    let ctx = SearchContext::new(&collection, &cfg);
    let mut q = query("zombie");
    let results = index.search(&q, QueryType::Ranked, RankingType::TfIdf, &ctx).unwrap();
    let ranked = results.ranked().unwrap().to_vec();
    let marks: Vec<bool> = ranked.iter().map(|d| d.doc_id == 2).collect();

    q.relevance_feedback(&ranked, &marks, &index);
    assert!(q.weight_of("surviv").is_some() || q.weight_of("survival").is_some());
    assert!(q.weight_of("zombi").unwrap_or(0.0) + q.weight_of("zombie").unwrap_or(0.0) > 1.0);

    let expanded = index.search(&q, QueryType::Ranked, RankingType::TfIdf, &ctx).unwrap();
    assert_eq!(expanded.doc_ids()[0], 2);
}

#[test]
fn concurrent_readers_see_the_same_ranking() {
    let (index, collection) = build();
    let shared = Arc::new((index, collection, RankingConfig::default()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let (index, collection, cfg) = &*shared;
                let ctx = SearchContext::new(collection, cfg);
                index.search(&query("attack field city"), QueryType::Ranked, RankingType::TfIdf, &ctx).unwrap().doc_ids()
            })
        })
        .collect();
    let results: Vec<Vec<DocId>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn estimated_authority_agrees_with_exact_top_document() {
    let graph = LinkGraph::parse_str(LINKS, 100);
    let exact = ExactSolver::new(&graph, OracleConfig::default()).solve().unwrap();
    let approx = MonteCarlo::new(&graph, WalkConfig::default()).estimate(WalkStrategy::EndpointCyclicStart { per_node: 20_000 });
    let best = |s: &[f64]| ir_core::pagerank::top_k(s, 1)[0].0;
    assert_eq!(best(&exact.scores), best(&approx));
}
