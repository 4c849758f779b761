//! Behavioral persona clustering
//!
//! Projects each transaction to (amount, day-of-week), min-max normalizes
//! both dimensions, and runs fixed-K k-means to group spending behavior.
//! The seed is fixed by default so results are reproducible; it is a
//! documented, overridable parameter, not an implementation accident.

use chrono::Datelike;
use std::collections::HashMap;
use tracing::debug;

use crate::models::{ClusterSummary, Persona, TimeFocus, Transaction};

/// Clustering parameters
#[derive(Debug, Clone, Copy)]
pub struct PersonaConfig {
    /// Number of clusters
    pub k: usize,
    /// Seed for centroid initialization; fixed for reproducibility
    pub seed: u64,
    /// Lloyd iteration cap
    pub max_iterations: usize,
    /// Histories smaller than this produce no persona
    pub min_transactions: usize,
    /// Mean amount above this labels a cluster "High-Value"
    pub high_value_threshold: f64,
    /// Mean day-of-week (1-7) at or above this labels a cluster "Weekend"
    pub weekend_boundary: f64,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            k: 3,
            seed: 42,
            max_iterations: 100,
            min_transactions: 30,
            high_value_threshold: 1000.0,
            weekend_boundary: 5.5,
        }
    }
}

/// xorshift64: small deterministic generator for picking the first centroid
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_index(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

/// Groups transactions into behavioral clusters with readable summaries
#[derive(Debug, Clone, Default)]
pub struct PersonaClusterer {
    config: PersonaConfig,
}

impl PersonaClusterer {
    pub fn new() -> Self {
        Self {
            config: PersonaConfig::default(),
        }
    }

    pub fn with_config(config: PersonaConfig) -> Self {
        Self { config }
    }

    /// Cluster the given transactions into a persona.
    ///
    /// Returns `None` (soft failure) when there are fewer than
    /// `min_transactions`. Empty clusters are dropped, never reported, so
    /// the summaries' transaction counts always sum to the input count.
    pub fn generate(&self, transactions: &[Transaction]) -> Option<Persona> {
        if transactions.len() < self.config.min_transactions {
            debug!(
                count = transactions.len(),
                minimum = self.config.min_transactions,
                "Not enough history for a persona"
            );
            return None;
        }

        let points: Vec<[f64; 2]> = transactions
            .iter()
            .map(|t| [t.amount, t.date.weekday().number_from_monday() as f64])
            .collect();
        let normalized = normalize(&points);
        let assignments = k_means(
            &normalized,
            self.config.k,
            self.config.seed,
            self.config.max_iterations,
        );

        let mut clusters = Vec::new();
        for cluster_id in 0..self.config.k {
            let members: Vec<&Transaction> = transactions
                .iter()
                .zip(assignments.iter())
                .filter(|(_, &a)| a == cluster_id)
                .map(|(t, _)| t)
                .collect();
            if members.is_empty() {
                continue;
            }
            clusters.push(self.summarize(&members));
        }

        Some(Persona {
            title: "Your Financial Persona".to_string(),
            clusters,
        })
    }

    fn summarize(&self, members: &[&Transaction]) -> ClusterSummary {
        let count = members.len();
        let avg_amount = members.iter().map(|t| t.amount).sum::<f64>() / count as f64;
        let avg_day = members
            .iter()
            .map(|t| t.date.weekday().number_from_monday() as f64)
            .sum::<f64>()
            / count as f64;

        let time_focus = if avg_day >= self.config.weekend_boundary {
            TimeFocus::Weekend
        } else {
            TimeFocus::Weekday
        };
        let value = if avg_amount > self.config.high_value_threshold {
            "High-Value"
        } else {
            "Low-Value"
        };

        ClusterSummary {
            label: format!("{} {} Spending", value, time_focus),
            transaction_count: count,
            avg_amount,
            time_focus,
            top_categories: top_categories(members, 2),
        }
    }
}

/// Top categories by transaction count; ties keep first-encountered order
fn top_categories(members: &[&Transaction], limit: usize) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for t in members {
        if !counts.contains_key(t.category.as_str()) {
            order.push(t.category.clone());
        }
        *counts.entry(t.category.as_str()).or_insert(0) += 1;
    }
    // Stable sort keeps first-encounter order for equal counts
    order.sort_by_key(|c| std::cmp::Reverse(counts[c.as_str()]));
    order.truncate(limit);
    order
}

/// Min-max normalize each dimension to [0, 1]
fn normalize(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut mins = [f64::INFINITY; 2];
    let mut maxs = [f64::NEG_INFINITY; 2];
    for p in points {
        for d in 0..2 {
            mins[d] = mins[d].min(p[d]);
            maxs[d] = maxs[d].max(p[d]);
        }
    }
    points
        .iter()
        .map(|p| {
            let mut out = [0.0; 2];
            for d in 0..2 {
                let range = maxs[d] - mins[d];
                out[d] = if range > 0.0 {
                    (p[d] - mins[d]) / range
                } else {
                    0.0
                };
            }
            out
        })
        .collect()
}

fn distance2(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Lloyd's k-means with seeded farthest-point initialization.
///
/// The first centroid is drawn from the seeded generator; each subsequent
/// one is the point farthest from all chosen centroids (ties to the lowest
/// index), which keeps well-separated groups from sharing a centroid.
/// Assignment ties break toward the lower centroid index; a centroid that
/// loses all members keeps its position and its cluster ends up empty.
fn k_means(points: &[[f64; 2]], k: usize, seed: u64, max_iterations: usize) -> Vec<usize> {
    let mut rng = XorShift64::new(seed);
    let k = k.min(points.len());

    let mut centroids: Vec<[f64; 2]> = Vec::with_capacity(k);
    centroids.push(points[rng.next_index(points.len())]);
    while centroids.len() < k {
        let mut farthest = 0;
        let mut farthest_d = -1.0;
        for (i, p) in points.iter().enumerate() {
            let nearest = centroids
                .iter()
                .map(|c| distance2(*p, *c))
                .fold(f64::INFINITY, f64::min);
            if nearest > farthest_d {
                farthest_d = nearest;
                farthest = i;
            }
        }
        centroids.push(points[farthest]);
    }

    let mut assignments = vec![0usize; points.len()];
    for _ in 0..max_iterations {
        // Assignment step
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let mut best = 0;
            let mut best_d = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = distance2(*p, *centroid);
                if d < best_d {
                    best_d = d;
                    best = c;
                }
            }
            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        // Update step
        let mut sums = vec![[0.0f64; 2]; centroids.len()];
        let mut counts = vec![0usize; centroids.len()];
        for (i, p) in points.iter().enumerate() {
            let c = assignments[i];
            sums[c][0] += p[0];
            sums[c][1] += p[1];
            counts[c] += 1;
        }
        for c in 0..centroids.len() {
            if counts[c] > 0 {
                centroids[c] = [sums[c][0] / counts[c] as f64, sums[c][1] / counts[c] as f64];
            }
        }
    }

    assignments
}
