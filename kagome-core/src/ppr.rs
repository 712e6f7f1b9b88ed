//! Personalized-PageRank visitation probabilities.
//!
//! Builds a row-stochastic transition table from outward-edge frequency and
//! iterates `ranks ← (1-alpha)·ranks·M + alpha·I` a fixed number of steps.
//! The result is dense (N×N) but each multiplication walks the sparse
//! per-entity transition lists, so a step costs O(N · E) rather than O(N³).
//! Rows are independent, so the `parallel` feature computes them with rayon.

use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::{catalog::Catalog, graph::GraphStore};

/// Dense per-seed visitation probabilities.
///
/// Row `i` holds, for every entity `j`, the probability of being at `j` after
/// a teleporting random walk restarted at entity `i`. Entity indices come
/// from the [`Catalog`] the table was computed with.
#[derive(Clone, Debug, PartialEq)]
pub struct VisitationTable {
    ranks: Vec<f64>,
    n: usize,
}

impl VisitationTable {
    /// Number of entities covered by the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the table covers no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Visitation probabilities for one seed entity.
    #[must_use]
    pub fn row(&self, seed: usize) -> &[f64] {
        &self.ranks[seed * self.n..(seed + 1) * self.n]
    }
}

/// Sparse row-stochastic transition lists derived from outward edges.
fn transition_lists(store: &GraphStore, catalog: &Catalog) -> Vec<Vec<(usize, f64)>> {
    let n = catalog.entity_count();
    let mut out_counts: Vec<Vec<(usize, usize)>> = vec![Vec::new(); n];
    let mut out_totals = vec![0_usize; n];

    for edge in store.edges() {
        let (Some(source), Some(target)) = (
            catalog.entity_id(&edge.source),
            catalog.entity_id(&edge.target),
        ) else {
            continue;
        };
        out_totals[source] += 1;
        match out_counts[source].iter_mut().find(|(t, _)| *t == target) {
            Some((_, count)) => *count += 1,
            None => out_counts[source].push((target, 1)),
        }
    }

    out_counts
        .into_iter()
        .zip(&out_totals)
        .map(|(counts, &total)| {
            // Entities with no outward edges keep an all-zero row.
            if total == 0 {
                return Vec::new();
            }
            counts
                .into_iter()
                .map(|(target, count)| (target, count as f64 / total as f64))
                .collect()
        })
        .collect()
}

fn step_row(row: &[f64], seed: usize, transitions: &[Vec<(usize, f64)>], alpha: f64) -> Vec<f64> {
    let mut next = vec![0.0_f64; row.len()];
    for (k, &mass) in row.iter().enumerate() {
        if mass == 0.0 {
            continue;
        }
        for &(target, probability) in &transitions[k] {
            next[target] += mass * probability;
        }
    }
    for value in &mut next {
        *value *= 1.0 - alpha;
    }
    next[seed] += alpha;
    next
}

/// Computes per-seed visitation probabilities for every entity.
///
/// `alpha` is the teleport probability; `steps` defaults to `round(1/alpha)`
/// when unset. Starting point is the identity (each entity is its own sole
/// seed).
///
/// # Examples
/// ```
/// use kagome_core::{Catalog, GraphSnapshot, GraphStore, compute_ppr};
///
/// let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[("a", "r", "b")]));
/// let catalog = Catalog::from_store(&store);
/// let table = compute_ppr(&store, &catalog, 0.5, Some(4));
/// assert_eq!(table.len(), 2);
/// assert!(table.row(0).iter().all(|p| *p >= 0.0));
/// ```
#[instrument(name = "core.ppr", skip(store, catalog), fields(entities = catalog.entity_count(), alpha))]
#[must_use]
pub fn compute_ppr(
    store: &GraphStore,
    catalog: &Catalog,
    alpha: f64,
    steps: Option<usize>,
) -> VisitationTable {
    let n = catalog.entity_count();
    if n == 0 {
        return VisitationTable { ranks: Vec::new(), n: 0 };
    }
    let steps = steps.unwrap_or_else(|| (1.0 / alpha).round() as usize);
    let transitions = transition_lists(store, catalog);

    // Identity start: every entity is its own sole seed.
    let mut ranks = vec![0.0_f64; n * n];
    for seed in 0..n {
        ranks[seed * n + seed] = 1.0;
    }

    for _ in 0..steps {
        #[cfg(feature = "parallel")]
        let next: Vec<f64> = ranks
            .par_chunks(n)
            .enumerate()
            .flat_map_iter(|(seed, row)| step_row(row, seed, &transitions, alpha))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let next: Vec<f64> = ranks
            .chunks(n)
            .enumerate()
            .flat_map(|(seed, row)| step_row(row, seed, &transitions, alpha))
            .collect();
        ranks = next;
    }

    info!(entities = n, steps, "visitation table computed");
    VisitationTable { ranks, n }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GraphSnapshot;

    fn two_node_store() -> (GraphStore, Catalog) {
        let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[
            ("a", "r", "b"),
            ("b", "r", "a"),
        ]));
        let catalog = Catalog::from_store(&store);
        (store, catalog)
    }

    #[test]
    fn rows_are_non_negative_and_sum_to_one_on_closed_graphs() {
        let (store, catalog) = two_node_store();
        let table = compute_ppr(&store, &catalog, 0.2, Some(20));
        for seed in 0..table.len() {
            let row = table.row(seed);
            assert!(row.iter().all(|p| *p >= 0.0));
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "row {seed} sums to {sum}");
        }
    }

    #[test]
    fn zero_out_degree_entities_leak_mass_but_never_divide_by_zero() {
        // b has no outward edges: its transition row is all zero.
        let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[("a", "r", "b")]));
        let catalog = Catalog::from_store(&store);
        let table = compute_ppr(&store, &catalog, 0.5, Some(3));

        let b = catalog.entity_id("b").unwrap();
        let row = table.row(b);
        // Mass from b only survives through the teleport term.
        assert!(row[b] > 0.0);
        assert!(row.iter().all(|p| p.is_finite() && *p >= 0.0));
    }

    #[test]
    fn teleport_keeps_probability_near_the_seed() {
        let (store, catalog) = two_node_store();
        // High alpha concentrates the walk on its seed.
        let table = compute_ppr(&store, &catalog, 0.9, Some(10));
        let a = catalog.entity_id("a").unwrap();
        let b = catalog.entity_id("b").unwrap();
        assert!(table.row(a)[a] > table.row(a)[b]);
    }

    #[test]
    fn transition_probabilities_follow_edge_frequency() {
        // a has two outward edges to b (different relations) and one to c, so
        // the walk moves a→b with probability 2/3.
        let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[
            ("a", "r1", "b"),
            ("a", "r2", "b"),
            ("a", "r1", "c"),
        ]));
        let catalog = Catalog::from_store(&store);
        let transitions = transition_lists(&store, &catalog);

        let a = catalog.entity_id("a").unwrap();
        let b = catalog.entity_id("b").unwrap();
        let to_b = transitions[a]
            .iter()
            .find(|(target, _)| *target == b)
            .map(|(_, p)| *p)
            .unwrap();
        assert!((to_b - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn default_step_count_is_the_inverse_of_alpha() {
        let (store, catalog) = two_node_store();
        let explicit = compute_ppr(&store, &catalog, 0.25, Some(4));
        let defaulted = compute_ppr(&store, &catalog, 0.25, None);
        assert_eq!(explicit, defaulted);
    }
}
