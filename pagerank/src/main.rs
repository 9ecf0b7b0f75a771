use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ir_core::config::{self, Config, MAX_NUMBER_OF_DOCS};
use ir_core::pagerank::{convergence_study, top_k, top_k_squared_error, ExactSolver, MonteCarlo, WalkStrategy};
use ir_core::persist::{read_scores, write_scores};
use ir_core::LinkGraph;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::Path;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "pagerank")]
#[command(about = "Estimate link authority by random walks, or solve it exactly on small graphs", long_about = None)]
struct Cli {
    /// Link file: `from;to,to,...` per line
    #[arg(long)]
    links: String,
    #[arg(long, value_enum, default_value_t = Method::EndpointRandom)]
    method: Method,
    /// Walks for the random-start methods
    #[arg(long, default_value_t = 100_000)]
    walks: usize,
    /// Walks started from every node for the cyclic methods
    #[arg(long, default_value_t = 10)]
    per_node: usize,
    /// Steps per walk for the complete-path methods
    #[arg(long, default_value_t = 100)]
    horizon: usize,
    #[arg(long)]
    seed: Option<u64>,
    /// Solve by power iteration instead of walking
    #[arg(long, default_value_t = false)]
    exact: bool,
    /// Stored exact scores to compare the estimate against
    #[arg(long)]
    oracle: Option<String>,
    /// Write the scores, one per line in node order
    #[arg(long)]
    write: Option<String>,
    #[arg(long, default_value_t = 30)]
    top: usize,
    /// Report top-k error while doubling the walk budget
    #[arg(long, default_value_t = false)]
    study: bool,
    /// JSON config file
    #[arg(long)]
    config: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Method {
    EndpointRandom,
    EndpointCyclic,
    CompletePath,
    CompletePathDangling,
    CompletePathRandom,
}

impl Method {
    /// `budget` replaces the walk count (or per-node count) so the study can scale it.
    fn strategy(self, cli: &Cli, budget: Option<usize>) -> WalkStrategy {
        let walks = budget.unwrap_or(cli.walks);
        let per_node = budget.unwrap_or(cli.per_node);
        let horizon = cli.horizon;
        match self {
            Method::EndpointRandom => WalkStrategy::EndpointRandomStart { walks },
            Method::EndpointCyclic => WalkStrategy::EndpointCyclicStart { per_node },
            Method::CompletePath => WalkStrategy::CompletePath { per_node, horizon },
            Method::CompletePathDangling => WalkStrategy::CompletePathDangling { per_node, horizon },
            Method::CompletePathRandom => WalkStrategy::CompletePathRandomStart { walks, horizon },
        }
    }

    fn per_node(self) -> bool {
        matches!(self, Method::EndpointCyclic | Method::CompletePath | Method::CompletePathDangling)
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load(path)?,
        None => Config::default(),
    };

    let graph = LinkGraph::from_path(&cli.links, MAX_NUMBER_OF_DOCS)?;
    if graph.is_empty() {
        anyhow::bail!("{} holds no links", cli.links);
    }

    let started = Instant::now();
    let scores = if cli.exact {
        let solution = ExactSolver::new(&graph, cfg.oracle.clone()).solve()?;
        tracing::info!(iterations = solution.iterations, delta = solution.delta, "power iteration finished");
        solution.scores
    } else {
        estimator(&graph, &cfg, cli.seed).estimate(cli.method.strategy(&cli, None))
    };
    tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "scores ready");

    print_top(&graph, &scores, cli.top);

    if let Some(path) = &cli.write {
        write_scores(path, &scores)?;
        tracing::info!(path = %path, "scores written");
    }

    if !cli.exact {
        if let Some(oracle) = load_oracle(cli.oracle.as_deref(), graph.len())? {
            let err = top_k_squared_error(&oracle, &scores, cli.top);
            println!("top-{} squared error against oracle: {err:.3e}", cli.top);
            if cli.study {
                run_study(&cli, &graph, &cfg, &oracle);
            }
        } else if cli.study {
            tracing::info!("no oracle file; solving exactly for the study");
            let oracle = ExactSolver::new(&graph, cfg.oracle.clone()).solve()?.scores;
            run_study(&cli, &graph, &cfg, &oracle);
        }
    }
    Ok(())
}

fn estimator<'g>(graph: &'g LinkGraph, cfg: &Config, seed: Option<u64>) -> MonteCarlo<'g> {
    let mc = MonteCarlo::new(graph, cfg.walk.clone());
    match seed {
        Some(seed) => mc.with_seed(seed),
        None => mc,
    }
}

/// Absent oracle files are skipped; unreadable or short ones are errors.
fn load_oracle(path: Option<&str>, n: usize) -> Result<Option<Vec<f64>>> {
    let Some(path) = path else { return Ok(None) };
    if !Path::new(path).exists() {
        tracing::warn!(path, "oracle file not found; skipping comparison");
        return Ok(None);
    }
    read_scores(path, n).with_context(|| format!("reading oracle {path}")).map(Some)
}

fn study_sizes(start: usize, steps: usize) -> Vec<usize> {
    (0..steps).map(|i| start.max(1) << i).collect()
}

fn run_study(cli: &Cli, graph: &LinkGraph, cfg: &Config, oracle: &[f64]) {
    let start = if cli.method.per_node() { 1 } else { 1_000 };
    let mc = estimator(graph, cfg, cli.seed);
    let points = convergence_study(oracle, &study_sizes(start, 10), cli.top, |size| {
        mc.estimate(cli.method.strategy(cli, Some(size)))
    });
    println!("{:>10} {:>12} {:>12}", "walks", "error", "change");
    for p in points {
        println!("{:>10} {:>12.3e} {:>12.3e}", p.size, p.error, p.change);
    }
}

fn print_top(graph: &LinkGraph, scores: &[f64], k: usize) {
    for (rank, (node, score)) in top_k(scores, k).into_iter().enumerate() {
        println!("{:>3}: {:<30} {:.5}", rank + 1, graph.name(node).unwrap_or("?"), score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn study_sizes_double() {
        assert_eq!(study_sizes(1_000, 4), vec![1_000, 2_000, 4_000, 8_000]);
        assert_eq!(study_sizes(0, 2), vec![1, 2]);
    }

    #[test]
    fn missing_oracle_is_skipped() {
        assert!(load_oracle(Some("/nonexistent/oracle.txt"), 3).unwrap().is_none());
        assert!(load_oracle(None, 3).unwrap().is_none());
    }
}
