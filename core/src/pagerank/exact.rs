use crate::config::OracleConfig;
use crate::graph::LinkGraph;
use anyhow::{bail, Result};
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct Convergence {
    pub scores: Vec<f64>,
    pub iterations: usize,
    /// L2 distance between the last two iterates.
    pub delta: f64,
}

/// Power iteration on the dense Google matrix.
///
/// Memory is `n * n` floats, so this is only for checking the Monte-Carlo
/// estimators on small graphs.
pub struct ExactSolver<'g> {
    graph: &'g LinkGraph,
    config: OracleConfig,
}

impl<'g> ExactSolver<'g> {
    pub fn new(graph: &'g LinkGraph, config: OracleConfig) -> Self { Self { graph, config } }

    /// Row-major `G[i][j] = (1 - bored) * P(i -> j) + bored / n`, where a
    /// sink spreads its mass evenly over every node.
    pub fn transition_matrix(&self) -> Vec<f64> {
        let n = self.graph.len();
        let bored = self.config.bored;
        let jump = bored / n as f64;
        let mut g = vec![0.0; n * n];
        g.par_chunks_mut(n.max(1)).enumerate().for_each(|(i, row)| match self.graph.successors(i as u32) {
            None => row.fill((1.0 - bored) / n as f64 + jump),
            Some(next) => {
                row.fill(jump);
                let p = (1.0 - bored) / next.len() as f64;
                for &j in next {
                    row[j as usize] += p;
                }
            }
        });
        g
    }

    pub fn solve(&self) -> Result<Convergence> {
        let n = self.graph.len();
        if n > self.config.max_nodes {
            bail!("graph has {n} nodes; the exact solver is limited to {}", self.config.max_nodes);
        }
        if n == 0 {
            return Ok(Convergence { scores: Vec::new(), iterations: 0, delta: 0.0 });
        }
        let g = self.transition_matrix();

        let mut x = vec![0.0; n];
        let mut next = vec![0.0; n];
        next[0] = 1.0;
        let mut delta = diff_norm(&x, &next);
        let mut iterations = 0;
        while iterations < self.config.max_iterations && delta > self.config.epsilon {
            std::mem::swap(&mut x, &mut next);
            next.par_iter_mut().enumerate().for_each(|(i, xi)| {
                *xi = (0..n).map(|j| g[j * n + i] * x[j]).sum();
            });
            delta = diff_norm(&x, &next);
            iterations += 1;
            tracing::debug!(iterations, delta, "power iteration");
        }
        tracing::info!(nodes = n, iterations, delta, "exact pagerank converged");
        Ok(Convergence { scores: next, iterations, delta })
    }
}

fn diff_norm(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}
