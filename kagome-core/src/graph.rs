//! In-memory graph model: edges, degree counters, and the grouped relation
//! index.
//!
//! The store keeps every collection in first-seen order next to a hashed
//! lookup, the same vector-plus-index layout the rest of the pipeline relies
//! on for deterministic iteration and tie-breaking.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::source::GraphSnapshot;

/// A directed, relation-labelled edge. The edge collection behaves as a
/// mathematical set: duplicate triples collapse to one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Label of the relation this edge belongs to.
    pub relation: Arc<str>,
    /// Source entity label.
    pub source: Arc<str>,
    /// Target entity label.
    pub target: Arc<str>,
}

impl Edge {
    /// Builds an edge from plain string labels.
    ///
    /// # Examples
    /// ```
    /// use kagome_core::Edge;
    ///
    /// let edge = Edge::new("livesIn", "alice", "paris");
    /// assert_eq!(edge.relation.as_ref(), "livesIn");
    /// ```
    #[must_use]
    pub fn new(relation: &str, source: &str, target: &str) -> Self {
        Self {
            relation: Arc::from(relation),
            source: Arc::from(source),
            target: Arc::from(target),
        }
    }
}

/// Degree counters attached to an entity.
///
/// Counters are incremented while edges are read and never decremented;
/// pruning leaves them untouched. Use [`GraphStore::recompute_degrees`] when
/// exact post-pruning values are needed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Degrees {
    /// Total degree (in plus out).
    pub degree: usize,
    /// Number of outgoing edge records.
    pub out_degree: usize,
    /// Number of incoming edge records.
    pub in_degree: usize,
}

/// Per-relation view derived from the edge set: the relation's `(source,
/// target)` pairs plus its domain and range entity sets, all in first-seen
/// order.
#[derive(Clone, Debug, Default)]
pub struct RelationEdges {
    pairs: Vec<(Arc<str>, Arc<str>)>,
    targets_by_source: HashMap<Arc<str>, HashSet<Arc<str>>>,
    domain: Vec<Arc<str>>,
    domain_set: HashSet<Arc<str>>,
    range: Vec<Arc<str>>,
    range_set: HashSet<Arc<str>>,
}

impl RelationEdges {
    fn insert(&mut self, source: &Arc<str>, target: &Arc<str>) {
        let new_pair = self
            .targets_by_source
            .entry(Arc::clone(source))
            .or_default()
            .insert(Arc::clone(target));
        if new_pair {
            self.pairs.push((Arc::clone(source), Arc::clone(target)));
        }
        if self.domain_set.insert(Arc::clone(source)) {
            self.domain.push(Arc::clone(source));
        }
        if self.range_set.insert(Arc::clone(target)) {
            self.range.push(Arc::clone(target));
        }
    }

    /// The relation's distinct `(source, target)` pairs in first-seen order.
    #[must_use]
    pub fn pairs(&self) -> &[(Arc<str>, Arc<str>)] {
        &self.pairs
    }

    /// Number of distinct edges the relation has.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the relation has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Whether the relation contains the given `(source, target)` pair.
    #[must_use]
    pub fn contains_pair(&self, source: &str, target: &str) -> bool {
        self.targets_by_source
            .get(source)
            .is_some_and(|targets| targets.contains(target))
    }

    /// Distinct sources of the relation's edges, in first-seen order.
    #[must_use]
    pub fn domain(&self) -> &[Arc<str>] {
        &self.domain
    }

    /// Distinct targets of the relation's edges, in first-seen order.
    #[must_use]
    pub fn range(&self) -> &[Arc<str>] {
        &self.range
    }

    /// Whether `entity` occurs as a source of this relation.
    #[must_use]
    pub fn domain_contains(&self, entity: &str) -> bool {
        self.domain_set.contains(entity)
    }

    /// Whether `entity` occurs as a target of this relation.
    #[must_use]
    pub fn range_contains(&self, entity: &str) -> bool {
        self.range_set.contains(entity)
    }
}

/// Groups the edge set per relation.
///
/// Must be rebuilt whenever the edge set changes; [`GraphStore`] does so after
/// every destructive operation.
#[derive(Clone, Debug, Default)]
pub struct RelationIndex {
    grouped: HashMap<Arc<str>, RelationEdges>,
}

impl RelationIndex {
    fn from_edges(edges: &[Edge]) -> Self {
        let mut grouped: HashMap<Arc<str>, RelationEdges> = HashMap::new();
        for edge in edges {
            grouped
                .entry(Arc::clone(&edge.relation))
                .or_default()
                .insert(&edge.source, &edge.target);
        }
        Self { grouped }
    }

    /// Looks up the grouped view of one relation.
    #[must_use]
    pub fn relation(&self, relation: &str) -> Option<&RelationEdges> {
        self.grouped.get(relation)
    }

    /// Number of relations with at least one edge.
    #[must_use]
    pub fn len(&self) -> usize {
        self.grouped.len()
    }

    /// Whether the index holds no relations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grouped.is_empty()
    }
}

/// Owns the mutable graph state threaded through the pipeline phases.
///
/// # Examples
/// ```
/// use kagome_core::{GraphSnapshot, GraphStore};
///
/// let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[
///     ("a", "r", "b"),
///     ("a", "r", "b"),
/// ]));
/// assert_eq!(store.edge_count(), 1);
/// ```
#[derive(Clone, Debug, Default)]
pub struct GraphStore {
    entities: HashMap<Arc<str>, Degrees>,
    entity_order: Vec<Arc<str>>,
    relations: Vec<Arc<str>>,
    edges: Vec<Edge>,
    edge_set: HashSet<Edge>,
    index: RelationIndex,
}

impl GraphStore {
    /// Loads a snapshot, collapsing duplicate triples and building the
    /// grouped relation index.
    #[must_use]
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let GraphSnapshot {
            entities,
            relations,
            edges,
        } = snapshot;

        let mut store = Self {
            entity_order: entities.iter().map(|(label, _)| Arc::clone(label)).collect(),
            entities: entities.into_iter().collect(),
            relations,
            ..Self::default()
        };
        for edge in edges {
            if store.edge_set.insert(edge.clone()) {
                store.edges.push(edge);
            }
        }
        store.index = RelationIndex::from_edges(&store.edges);
        store
    }

    /// Distinct edges in first-seen order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Relation labels in first-seen order.
    #[must_use]
    pub fn relations(&self) -> &[Arc<str>] {
        &self.relations
    }

    /// Entity labels in first-seen order.
    #[must_use]
    pub fn entity_order(&self) -> &[Arc<str>] {
        &self.entity_order
    }

    /// Number of known entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entity_order.len()
    }

    /// Degree counters for one entity.
    #[must_use]
    pub fn degrees(&self, entity: &str) -> Option<Degrees> {
        self.entities.get(entity).copied()
    }

    /// The grouped relation index for the current edge set.
    #[must_use]
    pub fn index(&self) -> &RelationIndex {
        &self.index
    }

    /// Removes the given relations and all of their edges, then rebuilds the
    /// grouped index. Irreversible.
    pub fn remove_relations(&mut self, removed: &[Arc<str>]) {
        if removed.is_empty() {
            return;
        }
        let removed_set: HashSet<&str> = removed.iter().map(AsRef::as_ref).collect();
        self.edges
            .retain(|edge| !removed_set.contains(edge.relation.as_ref()));
        self.edge_set
            .retain(|edge| !removed_set.contains(edge.relation.as_ref()));
        self.relations
            .retain(|relation| !removed_set.contains(relation.as_ref()));
        self.index = RelationIndex::from_edges(&self.edges);
        debug!(removed = removed.len(), remaining = self.relations.len(), "relations removed");
    }

    /// Recomputes degree counters from the current edge set.
    ///
    /// Counters are otherwise frozen at read time; call this when exact
    /// post-pruning degrees are required.
    pub fn recompute_degrees(&mut self) {
        for degrees in self.entities.values_mut() {
            *degrees = Degrees::default();
        }
        for edge in &self.edges {
            if let Some(source) = self.entities.get_mut(&edge.source) {
                source.degree += 1;
                source.out_degree += 1;
            }
            if let Some(target) = self.entities.get_mut(&edge.target) {
                target.degree += 1;
                target.in_degree += 1;
            }
        }
    }

    /// Relation frequencies sorted by descending edge count, ties keeping
    /// first-seen relation order.
    #[must_use]
    pub fn relation_frequencies(&self) -> Vec<(Arc<str>, usize)> {
        let mut rows: Vec<(Arc<str>, usize)> = self
            .relations
            .iter()
            .map(|relation| {
                let count = self
                    .index
                    .relation(relation)
                    .map_or(0, RelationEdges::len);
                (Arc::clone(relation), count)
            })
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }

    /// Entity degree rows sorted by descending total degree, ties keeping
    /// first-seen entity order.
    #[must_use]
    pub fn entity_degrees(&self) -> Vec<(Arc<str>, Degrees)> {
        let mut rows: Vec<(Arc<str>, Degrees)> = self
            .entity_order
            .iter()
            .map(|entity| {
                let degrees = self.entities.get(entity).copied().unwrap_or_default();
                (Arc::clone(entity), degrees)
            })
            .collect();
        rows.sort_by(|a, b| b.1.degree.cmp(&a.1.degree));
        rows
    }
}
