//! Deterministic rotating train/test partitioning.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::graph::{Edge, GraphStore};

/// A train or test bucket: positives from the split, negatives appended by
/// the sampler afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bucket {
    positives: Vec<Edge>,
    negatives: Vec<Edge>,
}

impl Bucket {
    /// Positive edges held by this bucket.
    #[must_use]
    pub fn positives(&self) -> &[Edge] {
        &self.positives
    }

    /// Negative edges generated for this bucket. Duplicates may legitimately
    /// recur, so this is a list rather than a set.
    #[must_use]
    pub fn negatives(&self) -> &[Edge] {
        &self.negatives
    }

    pub(crate) fn set_negatives(&mut self, negatives: Vec<Edge>) {
        self.negatives = negatives;
    }
}

/// One train/test partition of the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fold {
    index: usize,
    /// Training bucket.
    pub train: Bucket,
    /// Testing bucket.
    pub test: Bucket,
}

impl Fold {
    /// Zero-based fold index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Fraction of each relation's edges held out for testing.
#[derive(Clone, Debug, Default)]
pub struct TestFractions {
    global: f64,
    per_relation: HashMap<Arc<str>, f64>,
}

impl TestFractions {
    /// A single fraction applied uniformly to every relation.
    #[must_use]
    pub fn uniform(global: f64) -> Self {
        Self {
            global,
            per_relation: HashMap::new(),
        }
    }

    /// Overrides the fraction for one relation; others keep the global value.
    #[must_use]
    pub fn with_override(mut self, relation: &str, fraction: f64) -> Self {
        self.per_relation.insert(Arc::from(relation), fraction);
        self
    }

    fn for_relation(&self, relation: &str) -> f64 {
        self.per_relation
            .get(relation)
            .copied()
            .unwrap_or(self.global)
    }
}

/// Partitions each relation's edges into `number_splits` rotated folds.
///
/// For fold `i` and a relation with `n` edges in stable first-seen order, the
/// test bucket is the circular window of `floor(n · fraction)` edges starting
/// at `floor(n · i / number_splits)`; the remaining edges form the train
/// bucket. Different folds therefore share most edges but hold out shifted
/// contiguous windows. No randomness is involved.
///
/// # Examples
/// ```
/// use kagome_core::{GraphSnapshot, GraphStore, TestFractions, split_graph};
///
/// let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[
///     ("a", "r", "b"),
///     ("b", "r", "c"),
///     ("c", "r", "d"),
///     ("d", "r", "e"),
/// ]));
/// let folds = split_graph(&store, 1, &TestFractions::uniform(0.25));
/// assert_eq!(folds[0].test.positives().len(), 1);
/// assert_eq!(folds[0].train.positives().len(), 3);
/// ```
#[instrument(name = "core.split", skip(store, fractions), fields(relations = store.relations().len(), number_splits))]
pub fn split_graph(store: &GraphStore, number_splits: usize, fractions: &TestFractions) -> Vec<Fold> {
    let mut folds = Vec::with_capacity(number_splits);
    for fold_index in 0..number_splits {
        let mut fold = Fold {
            index: fold_index,
            ..Fold::default()
        };
        for relation in store.relations() {
            let Some(grouped) = store.index().relation(relation) else {
                continue;
            };
            let edges: Vec<Edge> = grouped
                .pairs()
                .iter()
                .map(|(source, target)| Edge {
                    relation: Arc::clone(relation),
                    source: Arc::clone(source),
                    target: Arc::clone(target),
                })
                .collect();
            let n = edges.len();
            if n == 0 {
                continue;
            }
            let offset = n * fold_index / number_splits;
            let fraction = fractions.for_relation(relation);
            let num_test = (n as f64 * fraction).floor() as usize;
            for x in 0..n {
                let edge = edges[(offset + x) % n].clone();
                if x < num_test {
                    fold.test.positives.push(edge);
                } else {
                    fold.train.positives.push(edge);
                }
            }
        }
        info!(
            fold = fold_index,
            train = fold.train.positives.len(),
            test = fold.test.positives.len(),
            "fold assembled"
        );
        folds.push(fold);
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GraphSnapshot;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn chain_store(relation: &str, n: usize) -> GraphStore {
        let labels: Vec<String> = (0..=n).map(|i| format!("e{i}")).collect();
        let triples: Vec<(&str, &str, &str)> = (0..n)
            .map(|i| (labels[i].as_str(), relation, labels[i + 1].as_str()))
            .collect();
        GraphStore::from_snapshot(GraphSnapshot::from_triples(&triples))
    }

    #[test]
    fn fold_zero_takes_the_leading_window() {
        // 10 edges, fraction 0.2 => test = indices {0, 1}.
        let store = chain_store("friendOf", 10);
        let folds = split_graph(&store, 1, &TestFractions::uniform(0.2));

        let grouped = store.index().relation("friendOf").unwrap();
        let expected: Vec<(&str, &str)> = grouped.pairs()[..2]
            .iter()
            .map(|(s, t)| (s.as_ref(), t.as_ref()))
            .collect();
        let test: Vec<(&str, &str)> = folds[0]
            .test
            .positives()
            .iter()
            .map(|e| (e.source.as_ref(), e.target.as_ref()))
            .collect();
        assert_eq!(test, expected);
        assert_eq!(folds[0].train.positives().len(), 8);
    }

    #[test]
    fn buckets_are_disjoint_and_exhaustive() {
        let store = chain_store("friendOf", 10);
        let folds = split_graph(&store, 3, &TestFractions::uniform(0.2));
        for fold in &folds {
            let train: HashSet<&Edge> = fold.train.positives().iter().collect();
            let test: HashSet<&Edge> = fold.test.positives().iter().collect();
            assert!(train.is_disjoint(&test));
            assert_eq!(train.len() + test.len(), store.edge_count());
        }
    }

    #[test]
    fn later_folds_rotate_the_window() {
        let store = chain_store("friendOf", 10);
        let folds = split_graph(&store, 5, &TestFractions::uniform(0.2));
        // Fold 1 starts its window at offset floor(10 * 1 / 5) = 2.
        let grouped = store.index().relation("friendOf").unwrap();
        let expected: Vec<(&str, &str)> = grouped.pairs()[2..4]
            .iter()
            .map(|(s, t)| (s.as_ref(), t.as_ref()))
            .collect();
        let test: Vec<(&str, &str)> = folds[1]
            .test
            .positives()
            .iter()
            .map(|e| (e.source.as_ref(), e.target.as_ref()))
            .collect();
        assert_eq!(test, expected);
    }

    #[test]
    fn window_wraps_around_the_edge_list() {
        let store = chain_store("r", 5);
        // Fold 2 of 3: offset floor(5 * 2 / 3) = 3; fraction 0.6 gives a
        // window of 3 => indices {3, 4, 0} (wraps).
        let folds = split_graph(&store, 3, &TestFractions::uniform(0.6));
        let grouped = store.index().relation("r").unwrap();
        let pair_at = |i: usize| {
            let (s, t) = &grouped.pairs()[i];
            (s.as_ref().to_owned(), t.as_ref().to_owned())
        };
        let test: Vec<(String, String)> = folds[2]
            .test
            .positives()
            .iter()
            .map(|e| (e.source.as_ref().to_owned(), e.target.as_ref().to_owned()))
            .collect();
        assert_eq!(test, vec![pair_at(3), pair_at(4), pair_at(0)]);
    }

    #[test]
    fn per_relation_overrides_fall_back_to_global() {
        let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[
            ("a", "dense", "b"),
            ("b", "dense", "c"),
            ("c", "dense", "d"),
            ("d", "dense", "e"),
            ("a", "sparse", "c"),
            ("b", "sparse", "d"),
        ]));
        let fractions = TestFractions::uniform(0.5).with_override("sparse", 0.0);
        let folds = split_graph(&store, 1, &fractions);

        let test_relations: Vec<&str> = folds[0]
            .test
            .positives()
            .iter()
            .map(|e| e.relation.as_ref())
            .collect();
        assert_eq!(test_relations, ["dense", "dense"]);
    }

    #[test]
    fn splitting_is_deterministic() {
        let store = chain_store("r", 17);
        let fractions = TestFractions::uniform(0.3);
        let first = split_graph(&store, 4, &fractions);
        let second = split_graph(&store, 4, &fractions);
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn every_fold_partitions_every_relation(
            n in 1_usize..40,
            number_splits in 1_usize..5,
            fraction in 0.0_f64..1.0,
        ) {
            let store = chain_store("r", n);
            let folds = split_graph(&store, number_splits, &TestFractions::uniform(fraction));
            prop_assert_eq!(folds.len(), number_splits);
            for fold in &folds {
                let mut seen: HashSet<Edge> = HashSet::new();
                for edge in fold.train.positives().iter().chain(fold.test.positives()) {
                    prop_assert!(seen.insert(edge.clone()));
                }
                prop_assert_eq!(seen.len(), store.edge_count());
            }
        }
    }
}
