//! Frequency and coverage based relation pruning.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::graph::GraphStore;

/// One kept relation with the bookkeeping the summary exporters need.
#[derive(Clone, Debug, PartialEq)]
pub struct KeptRelation {
    /// Relation label.
    pub relation: Arc<str>,
    /// Distinct edge count at pruning time.
    pub count: usize,
    /// Running share of the total edge count once this relation is included.
    pub accumulated_fraction: f64,
}

/// Outcome of a pruning pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PruneReport {
    /// Relations kept, in descending frequency order.
    pub kept: Vec<KeptRelation>,
    /// Relations removed, in first-seen order.
    pub removed: Vec<Arc<str>>,
}

/// Prunes low-frequency and low-coverage relations from the store.
///
/// Relations with fewer than `min_num_rel` distinct edges are dropped
/// outright. The survivors are ranked by descending frequency (ties keep
/// first-seen order) and accumulated until their running share of the total
/// edge count reaches `reach_fraction`; the relation that crosses the
/// threshold is the last one kept. `reach_fraction = 1.0` keeps every
/// relation meeting the minimum. Removal is irreversible and rebuilds the
/// grouped index.
///
/// # Examples
/// ```
/// use kagome_core::{GraphSnapshot, GraphStore, prune_relations};
///
/// let mut store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[
///     ("a", "livesIn", "x"),
///     ("b", "livesIn", "x"),
///     ("x", "bornIn", "a"),
/// ]));
/// let report = prune_relations(&mut store, 1, 1.0);
/// assert_eq!(report.kept.len(), 2);
/// assert!(report.removed.is_empty());
/// ```
#[instrument(name = "core.prune", skip(store), fields(relations = store.relations().len(), edges = store.edge_count()))]
pub fn prune_relations(store: &mut GraphStore, min_num_rel: usize, reach_fraction: f64) -> PruneReport {
    let total_edges = store.edge_count();
    let mut candidates: Vec<(Arc<str>, usize)> = store
        .relations()
        .iter()
        .filter_map(|relation| {
            let count = store.index().relation(relation)?.len();
            (count >= min_num_rel).then(|| (Arc::clone(relation), count))
        })
        .collect();
    // Stable sort: equal frequencies keep first-seen relation order.
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    let mut kept = Vec::new();
    let mut accumulated_fraction = 0.0_f64;
    for (relation, count) in candidates {
        accumulated_fraction += count as f64 / total_edges as f64;
        kept.push(KeptRelation {
            relation,
            count,
            accumulated_fraction,
        });
        if accumulated_fraction >= reach_fraction {
            break;
        }
    }

    let removed: Vec<Arc<str>> = store
        .relations()
        .iter()
        .filter(|relation| !kept.iter().any(|k| k.relation == **relation))
        .cloned()
        .collect();

    info!(
        kept = kept.len(),
        removed = removed.len(),
        "pruned relations"
    );
    store.remove_relations(&removed);
    PruneReport { kept, removed }
}
