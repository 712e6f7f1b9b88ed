//! Graph source abstraction consumed by the kagome pipeline.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub use crate::error::GraphSourceError;
use crate::graph::{Degrees, Edge};

/// Raw graph material produced by a [`GraphSource`].
///
/// Entities and relations are listed in first-seen order; that order is the
/// contract every later tie-break (pruning, splitting, sampling pools) relies
/// on. Degree counters reflect every accepted record, including records whose
/// triple later collapses into an already-seen edge.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GraphSnapshot {
    /// Entities with their degree counters, in first-seen order.
    pub entities: Vec<(Arc<str>, Degrees)>,
    /// Relation labels in first-seen order.
    pub relations: Vec<Arc<str>>,
    /// Edges in encounter order; duplicates are tolerated and collapse when
    /// the snapshot is loaded into a [`crate::GraphStore`].
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// Builds a snapshot from plain string triples, counting degrees the same
    /// way a file-backed source would.
    ///
    /// # Examples
    /// ```
    /// use kagome_core::GraphSnapshot;
    ///
    /// let snapshot = GraphSnapshot::from_triples(&[("a", "livesIn", "x")]);
    /// assert_eq!(snapshot.relations.len(), 1);
    /// assert_eq!(snapshot.edges.len(), 1);
    /// ```
    #[must_use]
    pub fn from_triples(triples: &[(&str, &str, &str)]) -> Self {
        let mut builder = SnapshotBuilder::new();
        for (source, relation, target) in triples {
            builder.record(source, relation, target);
        }
        builder.finish()
    }
}

/// Incrementally assembles a [`GraphSnapshot`] while keeping entity and
/// relation lookups O(1).
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    entities: Vec<(Arc<str>, Degrees)>,
    entity_slots: HashMap<Arc<str>, usize>,
    relations: Vec<Arc<str>>,
    relation_seen: HashSet<Arc<str>>,
    edges: Vec<Edge>,
}

impl SnapshotBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one `(source, relation, target)` triple, updating degree
    /// counters and the first-seen orders.
    pub fn record(&mut self, source: &str, relation: &str, target: &str) {
        let source = self.intern_entity(source);
        let target = self.intern_entity(target);
        let relation: Arc<str> = Arc::from(relation);

        self.bump(&source, true);
        self.bump(&target, false);
        if self.relation_seen.insert(Arc::clone(&relation)) {
            self.relations.push(Arc::clone(&relation));
        }
        self.edges.push(Edge {
            relation,
            source,
            target,
        });
    }

    /// Number of edges recorded so far.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Finalises the builder into a snapshot.
    #[must_use]
    pub fn finish(self) -> GraphSnapshot {
        GraphSnapshot {
            entities: self.entities,
            relations: self.relations,
            edges: self.edges,
        }
    }

    fn intern_entity(&mut self, label: &str) -> Arc<str> {
        if let Some(&slot) = self.entity_slots.get(label) {
            return Arc::clone(&self.entities[slot].0);
        }
        let interned: Arc<str> = Arc::from(label);
        self.entity_slots
            .insert(Arc::clone(&interned), self.entities.len());
        self.entities
            .push((Arc::clone(&interned), Degrees::default()));
        interned
    }

    fn bump(&mut self, entity: &Arc<str>, outgoing: bool) {
        let Some(&slot) = self.entity_slots.get(entity) else {
            return;
        };
        let degrees = &mut self.entities[slot].1;
        degrees.degree += 1;
        if outgoing {
            degrees.out_degree += 1;
        } else {
            degrees.in_degree += 1;
        }
    }
}

/// Capability for producing a graph snapshot from some external medium.
///
/// Implementations own all parsing and sampling concerns; the core assumes it
/// receives only well-formed triples.
///
/// # Examples
/// ```
/// use kagome_core::{GraphSnapshot, GraphSource, GraphSourceError};
///
/// struct Fixed(GraphSnapshot);
///
/// impl GraphSource for Fixed {
///     fn name(&self) -> &str { "fixed" }
///     fn read(&self) -> Result<GraphSnapshot, GraphSourceError> { Ok(self.0.clone()) }
/// }
///
/// let source = Fixed(GraphSnapshot::from_triples(&[("a", "r", "b")]));
/// assert_eq!(source.read()?.edges.len(), 1);
/// # Ok::<(), GraphSourceError>(())
/// ```
pub trait GraphSource {
    /// Returns a human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// Reads the entire graph into a snapshot.
    fn read(&self) -> Result<GraphSnapshot, GraphSourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_counts_degrees_per_record() {
        let snapshot = GraphSnapshot::from_triples(&[
            ("a", "r", "b"),
            ("a", "r", "b"),
            ("b", "s", "a"),
        ]);

        let (label, a) = &snapshot.entities[0];
        assert_eq!(label.as_ref(), "a");
        assert_eq!(a.degree, 3);
        assert_eq!(a.out_degree, 2);
        assert_eq!(a.in_degree, 1);
        // Duplicate triples are kept here; the store collapses them.
        assert_eq!(snapshot.edges.len(), 3);
    }

    #[test]
    fn first_seen_order_is_preserved() {
        let snapshot = GraphSnapshot::from_triples(&[
            ("m", "later", "n"),
            ("n", "earlier", "m"),
        ]);
        let relations: Vec<&str> = snapshot.relations.iter().map(AsRef::as_ref).collect();
        assert_eq!(relations, ["later", "earlier"]);
    }

    #[test]
    fn self_loops_count_both_directions() {
        let snapshot = GraphSnapshot::from_triples(&[("a", "r", "a")]);
        let (_, degrees) = &snapshot.entities[0];
        assert_eq!(degrees.degree, 2);
        assert_eq!(degrees.out_degree, 1);
        assert_eq!(degrees.in_degree, 1);
    }
}
