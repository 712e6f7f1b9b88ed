//! Synthetic graph generation shared by the kagome benchmarks.

use kagome_core::{GraphSnapshot, GraphStore, SnapshotBuilder};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Parameters of a synthetic knowledge graph.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticGraph {
    /// Number of entities.
    pub entities: usize,
    /// Number of relations; even-indexed relations get a mirrored partner so
    /// the inverse scan has work to do.
    pub relations: usize,
    /// Number of edges drawn per relation.
    pub edges_per_relation: usize,
    /// RNG seed.
    pub seed: u64,
}

impl SyntheticGraph {
    /// Materialises the snapshot.
    #[must_use]
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut builder = SnapshotBuilder::new();
        let entity = |i: usize| format!("e{i}");
        for relation in 0..self.relations {
            let label = format!("r{relation}");
            let mirrored = relation % 2 == 0;
            let mirror_label = format!("r{relation}_inv");
            for _ in 0..self.edges_per_relation {
                let source = rng.gen_range(0..self.entities);
                let target = rng.gen_range(0..self.entities);
                builder.record(&entity(source), &label, &entity(target));
                if mirrored {
                    builder.record(&entity(target), &mirror_label, &entity(source));
                }
            }
        }
        builder.finish()
    }

    /// Materialises the snapshot straight into a store.
    #[must_use]
    pub fn store(&self) -> GraphStore {
        GraphStore::from_snapshot(self.snapshot())
    }
}
