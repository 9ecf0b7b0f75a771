//! Link authority: Monte-Carlo estimates of PageRank and an exact solver
//! used to check them on small graphs.

mod exact;
mod walk;

pub use exact::{Convergence, ExactSolver};
pub use walk::{MonteCarlo, WalkStrategy};

use crate::NodeId;
use std::cmp::Ordering;

/// The `k` highest-scoring nodes, best first. Ties keep node order.
pub fn top_k(scores: &[f64], k: usize) -> Vec<(NodeId, f64)> {
    let mut ranked: Vec<(NodeId, f64)> = scores.iter().enumerate().map(|(i, &s)| (i as NodeId, s)).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked.truncate(k);
    ranked
}

/// Sum of squared differences between `approx` and `exact` over the top `k`
/// nodes of `exact`.
pub fn top_k_squared_error(exact: &[f64], approx: &[f64], k: usize) -> f64 {
    top_k(exact, k)
        .into_iter()
        .map(|(node, s)| {
            let a = approx.get(node as usize).copied().unwrap_or(0.0);
            (s - a).powi(2)
        })
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudyPoint {
    pub size: usize,
    pub error: f64,
    /// Absolute change in error from the previous size.
    pub change: f64,
}

/// Runs `estimate` for each size and measures it against `exact`.
pub fn convergence_study<F>(exact: &[f64], sizes: &[usize], k: usize, mut estimate: F) -> Vec<StudyPoint>
where
    F: FnMut(usize) -> Vec<f64>,
{
    let mut last = 0.0;
    sizes
        .iter()
        .map(|&size| {
            let error = top_k_squared_error(exact, &estimate(size), k);
            let point = StudyPoint { size, error, change: (last - error).abs() };
            tracing::info!(size, error, change = point.change, "convergence step");
            last = error;
            point
        })
        .collect()
}
