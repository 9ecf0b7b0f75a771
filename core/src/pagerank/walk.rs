use crate::config::WalkConfig;
use crate::graph::LinkGraph;
use crate::NodeId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// How walks are started, how long they run and what they record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStrategy {
    /// `walks` walks from random nodes; only the endpoint counts.
    EndpointRandomStart { walks: usize },
    /// Every node starts `per_node` walks; only the endpoint counts.
    EndpointCyclicStart { per_node: usize },
    /// Every node starts `per_node` walks of `horizon` steps; every visit
    /// counts. Sinks jump to a random node.
    CompletePath { per_node: usize, horizon: usize },
    /// As `CompletePath`, but a walk stops on reaching a sink.
    CompletePathDangling { per_node: usize, horizon: usize },
    /// `walks` random-start walks of `horizon` steps that stop at sinks.
    CompletePathRandomStart { walks: usize, horizon: usize },
}

#[derive(Debug, Clone, Copy)]
enum Record {
    Endpoint,
    Path { horizon: usize, stop_at_sinks: bool },
}

/// Random-surfer estimator over a link graph.
///
/// Walks are cut into fixed-size chunks; each chunk runs on its own rayon
/// task with an RNG derived from the seed and the chunk number, so results
/// depend on the seed only.
pub struct MonteCarlo<'g> {
    graph: &'g LinkGraph,
    config: WalkConfig,
}

impl<'g> MonteCarlo<'g> {
    pub fn new(graph: &'g LinkGraph, config: WalkConfig) -> Self { Self { graph, config } }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Probability distribution over nodes, indexed by node id.
    pub fn estimate(&self, strategy: WalkStrategy) -> Vec<f64> {
        let n = self.graph.len();
        if n == 0 {
            return Vec::new();
        }
        let (counts, divisor) = match strategy {
            WalkStrategy::EndpointRandomStart { walks } => {
                let c = self.run(walks, Start::Random, Record::Endpoint);
                (c, walks as f64)
            }
            WalkStrategy::EndpointCyclicStart { per_node } => {
                let c = self.run(n * per_node, Start::Cyclic(per_node), Record::Endpoint);
                (c, (n * per_node) as f64)
            }
            WalkStrategy::CompletePath { per_node, horizon } => {
                let record = Record::Path { horizon, stop_at_sinks: false };
                let c = self.run(n * per_node, Start::Cyclic(per_node), record);
                (c, (n * per_node * horizon) as f64)
            }
            WalkStrategy::CompletePathDangling { per_node, horizon } => {
                let record = Record::Path { horizon, stop_at_sinks: true };
                let c = self.run(n * per_node, Start::Cyclic(per_node), record);
                let total = c.iter().sum::<u64>() as f64;
                (c, total)
            }
            WalkStrategy::CompletePathRandomStart { walks, horizon } => {
                let record = Record::Path { horizon, stop_at_sinks: true };
                let c = self.run(walks, Start::Random, record);
                let total = c.iter().sum::<u64>() as f64;
                (c, total)
            }
        };
        tracing::info!(?strategy, nodes = n, "walks finished");
        if divisor == 0.0 {
            return vec![0.0; n];
        }
        counts.into_iter().map(|c| c as f64 / divisor).collect()
    }

    fn run(&self, total: usize, start: Start, record: Record) -> Vec<u64> {
        let n = self.graph.len();
        let chunk = self.config.chunk_size.max(1);
        let chunks = total.div_ceil(chunk);
        (0..chunks)
            .into_par_iter()
            .map(|c| {
                let mut rng = StdRng::seed_from_u64(chunk_seed(self.config.seed, c));
                let mut counts = vec![0u64; n];
                for w in c * chunk..((c + 1) * chunk).min(total) {
                    let page = match start {
                        Start::Random => self.random_page(&mut rng),
                        Start::Cyclic(per_node) => (w / per_node) as NodeId,
                    };
                    match record {
                        Record::Endpoint => counts[self.endpoint(page, &mut rng) as usize] += 1,
                        Record::Path { horizon, stop_at_sinks } => {
                            self.complete(page, horizon, stop_at_sinks, &mut rng, &mut counts)
                        }
                    }
                }
                counts
            })
            .reduce(
                || vec![0u64; n],
                |mut acc, part| {
                    for (a, p) in acc.iter_mut().zip(part) {
                        *a += p;
                    }
                    acc
                },
            )
    }

    /// Follows links until the surfer gets bored; a sink ends the walk on a
    /// random node.
    fn endpoint(&self, mut page: NodeId, rng: &mut StdRng) -> NodeId {
        for _ in 0..self.config.max_steps {
            if rng.random::<f64>() < self.config.bored {
                return page;
            }
            match self.graph.successors(page) {
                None => return self.random_page(rng),
                Some(next) => page = next[rng.random_range(0..next.len())],
            }
        }
        page
    }

    /// Counts every node visited in a walk of at most `horizon` steps.
    ///
    /// With `stop_at_sinks`, a sink ends the walk before the boredom draw, so
    /// it never teleports out.
    fn complete(&self, mut page: NodeId, horizon: usize, stop_at_sinks: bool, rng: &mut StdRng, counts: &mut [u64]) {
        for step in 1..=horizon {
            counts[page as usize] += 1;
            if step == horizon {
                break;
            }
            let next = self.graph.successors(page);
            if stop_at_sinks && next.is_none() {
                break;
            }
            page = match next {
                Some(next) if rng.random::<f64>() >= self.config.bored => next[rng.random_range(0..next.len())],
                _ => self.random_page(rng),
            };
        }
    }

    fn random_page(&self, rng: &mut StdRng) -> NodeId { rng.random_range(0..self.graph.len()) as NodeId }
}

#[derive(Debug, Clone, Copy)]
enum Start {
    Random,
    /// Walk `w` starts on node `w / per_node`.
    Cyclic(usize),
}

fn chunk_seed(seed: u64, chunk: usize) -> u64 { seed ^ (chunk as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15) }

#[cfg(test)]
mod tests {
    use super::*;

    fn no_boredom() -> WalkConfig { WalkConfig { bored: 0.0, ..WalkConfig::default() } }

    fn assert_distribution(p: &[f64]) {
        let sum: f64 = p.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
        assert!(p.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn dangling_walks_halt_on_sinks() {
        let graph = LinkGraph::parse_str("a;s\n", 10);
        let mc = MonteCarlo::new(&graph, no_boredom());
        let p = mc.estimate(WalkStrategy::CompletePathDangling { per_node: 1, horizon: 10 });
        assert!((p[0] - 1.0 / 3.0).abs() < 1e-12);
        assert!((p[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn sinks_halt_before_boredom() {
        let graph = LinkGraph::parse_str("a;\nb;\n", 10);
        let always_bored = WalkConfig { bored: 1.0, ..WalkConfig::default() };
        let p = MonteCarlo::new(&graph, always_bored).estimate(WalkStrategy::CompletePathDangling { per_node: 1000, horizon: 10 });
        assert_eq!(p, vec![0.5, 0.5]);
    }

    #[test]
    fn complete_path_keeps_walking_past_sinks() {
        let graph = LinkGraph::parse_str("a;s\n", 10);
        let mc = MonteCarlo::new(&graph, no_boredom());
        let p = mc.estimate(WalkStrategy::CompletePath { per_node: 50, horizon: 20 });
        assert_distribution(&p);
        assert!(p[0] > 0.1);
    }

    #[test]
    fn every_strategy_yields_a_distribution() {
        let graph = LinkGraph::parse_str("a;b,c\nb;c\nc;a\nd;\n", 10);
        let mc = MonteCarlo::new(&graph, WalkConfig::default());
        for strategy in [
            WalkStrategy::EndpointRandomStart { walks: 5000 },
            WalkStrategy::EndpointCyclicStart { per_node: 500 },
            WalkStrategy::CompletePath { per_node: 100, horizon: 30 },
            WalkStrategy::CompletePathDangling { per_node: 100, horizon: 30 },
            WalkStrategy::CompletePathRandomStart { walks: 2000, horizon: 30 },
        ] {
            let p = mc.estimate(strategy);
            assert_eq!(p.len(), 4);
            assert_distribution(&p);
        }
    }

    #[test]
    fn same_seed_same_estimate() {
        let graph = LinkGraph::parse_str("a;b\nb;c\nc;a,b\n", 10);
        let config = WalkConfig { chunk_size: 64, ..WalkConfig::default() };
        let a = MonteCarlo::new(&graph, config.clone()).estimate(WalkStrategy::EndpointRandomStart { walks: 1000 });
        let b = MonteCarlo::new(&graph, config.clone()).estimate(WalkStrategy::EndpointRandomStart { walks: 1000 });
        assert_eq!(a, b);
        let c = MonteCarlo::new(&graph, config).with_seed(99).estimate(WalkStrategy::EndpointRandomStart { walks: 1000 });
        assert_ne!(a, c);
    }

    #[test]
    fn empty_graph_gives_empty_estimate() {
        let graph = LinkGraph::default();
        let mc = MonteCarlo::new(&graph, WalkConfig::default());
        assert!(mc.estimate(WalkStrategy::EndpointRandomStart { walks: 10 }).is_empty());
    }
}
