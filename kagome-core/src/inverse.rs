//! Pairwise detection of structurally inverse relations.
//!
//! Every unordered pair of distinct relations is tested for full
//! bidirectional mirroring. The scan is O(R² · avg-relation-size), an
//! accepted cost at knowledge-graph relation counts; each pair only reads the
//! finalized grouped index, so the `parallel` feature fans the scan out with
//! rayon.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, instrument};

use crate::graph::{GraphStore, RelationEdges};

/// Detected inverse relationships.
#[derive(Clone, Debug, Default)]
pub struct InverseReport {
    pairs: Vec<(Arc<str>, Arc<str>)>,
    partners: HashMap<Arc<str>, HashSet<Arc<str>>>,
    removable: Vec<Arc<str>>,
}

impl InverseReport {
    /// Ordered list of detected pairs; the first member is kept, the second
    /// is the one classified removable.
    #[must_use]
    pub fn pairs(&self) -> &[(Arc<str>, Arc<str>)] {
        &self.pairs
    }

    /// Relations flagged as the second member of a pair, in detection order
    /// without duplicates.
    #[must_use]
    pub fn removable(&self) -> &[Arc<str>] {
        &self.removable
    }

    /// Whether `r1` and `r2` were detected as inverses of each other.
    ///
    /// Membership is checked symmetrically across both partner sets; a pair
    /// recorded in either direction answers `true` for both orderings.
    #[must_use]
    pub fn are_inverses(&self, r1: &str, r2: &str) -> bool {
        let forward = self
            .partners
            .get(r1)
            .is_some_and(|set| set.contains(r2));
        let backward = self
            .partners
            .get(r2)
            .is_some_and(|set| set.contains(r1));
        forward || backward
    }
}

fn mirrors(forward: &RelationEdges, backward: &RelationEdges) -> bool {
    forward
        .pairs()
        .iter()
        .all(|(source, target)| backward.contains_pair(target, source))
}

fn pair_is_inverse(edges1: &RelationEdges, edges2: &RelationEdges) -> bool {
    // Full bidirectional mirroring; a one-directional subset does not qualify.
    mirrors(edges1, edges2) && mirrors(edges2, edges1)
}

/// Scans every unordered pair of distinct relations for the inverse property.
///
/// # Examples
/// ```
/// use kagome_core::{GraphSnapshot, GraphStore, find_inverses};
///
/// let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[
///     ("a", "parentOf", "b"),
///     ("b", "childOf", "a"),
/// ]));
/// let report = find_inverses(&store);
/// assert_eq!(report.pairs().len(), 1);
/// assert!(report.are_inverses("childOf", "parentOf"));
/// ```
#[instrument(name = "core.inverses", skip(store), fields(relations = store.relations().len()))]
pub fn find_inverses(store: &GraphStore) -> InverseReport {
    let relations = store.relations();
    let candidates: Vec<(usize, usize)> = (0..relations.len())
        .flat_map(|i| ((i + 1)..relations.len()).map(move |j| (i, j)))
        .collect();

    let check = |&(i, j): &(usize, usize)| -> Option<(Arc<str>, Arc<str>)> {
        let edges1 = store.index().relation(&relations[i])?;
        let edges2 = store.index().relation(&relations[j])?;
        pair_is_inverse(edges1, edges2)
            .then(|| (Arc::clone(&relations[i]), Arc::clone(&relations[j])))
    };

    #[cfg(feature = "parallel")]
    let pairs: Vec<(Arc<str>, Arc<str>)> = candidates.par_iter().filter_map(check).collect();
    #[cfg(not(feature = "parallel"))]
    let pairs: Vec<(Arc<str>, Arc<str>)> = candidates.iter().filter_map(check).collect();

    let mut partners: HashMap<Arc<str>, HashSet<Arc<str>>> = HashMap::new();
    let mut removable = Vec::new();
    let mut removable_seen = HashSet::new();
    for (first, second) in &pairs {
        partners
            .entry(Arc::clone(first))
            .or_default()
            .insert(Arc::clone(second));
        if removable_seen.insert(Arc::clone(second)) {
            removable.push(Arc::clone(second));
        }
    }

    info!(found = pairs.len(), "inverse scan finished");
    InverseReport {
        pairs,
        partners,
        removable,
    }
}

/// Removes every relation classified removable, following the same removal
/// path as pruning.
pub fn remove_inverses(store: &mut GraphStore, report: &InverseReport) {
    store.remove_relations(report.removable());
}
