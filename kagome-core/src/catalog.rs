//! Bidirectional label-to-integer tables for entities and relations.
//!
//! Built once on demand, in first-seen order, so integer encodings are stable
//! across identical runs. The PPR computation and its sampling variant index
//! the visitation table through these ids.

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::GraphStore;

/// Bidirectional id↔label tables for the entities and relations of a store.
///
/// # Examples
/// ```
/// use kagome_core::{Catalog, GraphSnapshot, GraphStore};
///
/// let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[("a", "r", "b")]));
/// let catalog = Catalog::from_store(&store);
/// assert_eq!(catalog.entity_id("a"), Some(0));
/// assert_eq!(catalog.entity(1).map(AsRef::as_ref), Some("b"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entities: Vec<Arc<str>>,
    entity_ids: HashMap<Arc<str>, usize>,
    relations: Vec<Arc<str>>,
    relation_ids: HashMap<Arc<str>, usize>,
}

impl Catalog {
    /// Builds the tables from the store's current first-seen orders.
    #[must_use]
    pub fn from_store(store: &GraphStore) -> Self {
        let entities: Vec<Arc<str>> = store.entity_order().to_vec();
        let entity_ids = entities
            .iter()
            .enumerate()
            .map(|(id, label)| (Arc::clone(label), id))
            .collect();
        let relations: Vec<Arc<str>> = store.relations().to_vec();
        let relation_ids = relations
            .iter()
            .enumerate()
            .map(|(id, label)| (Arc::clone(label), id))
            .collect();
        Self {
            entities,
            entity_ids,
            relations,
            relation_ids,
        }
    }

    /// Integer id of an entity label.
    #[must_use]
    pub fn entity_id(&self, label: &str) -> Option<usize> {
        self.entity_ids.get(label).copied()
    }

    /// Entity label for an integer id.
    #[must_use]
    pub fn entity(&self, id: usize) -> Option<&Arc<str>> {
        self.entities.get(id)
    }

    /// Number of catalogued entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Integer id of a relation label.
    #[must_use]
    pub fn relation_id(&self, label: &str) -> Option<usize> {
        self.relation_ids.get(label).copied()
    }

    /// Relation label for an integer id.
    #[must_use]
    pub fn relation(&self, id: usize) -> Option<&Arc<str>> {
        self.relations.get(id)
    }

    /// Number of catalogued relations.
    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::GraphSnapshot;

    #[test]
    fn ids_follow_first_seen_order() {
        let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[
            ("beta", "r2", "alpha"),
            ("alpha", "r1", "gamma"),
        ]));
        let catalog = Catalog::from_store(&store);

        assert_eq!(catalog.entity_id("beta"), Some(0));
        assert_eq!(catalog.entity_id("alpha"), Some(1));
        assert_eq!(catalog.entity_id("gamma"), Some(2));
        assert_eq!(catalog.relation_id("r2"), Some(0));
        assert_eq!(catalog.relation_id("r1"), Some(1));
        assert_eq!(catalog.entity_count(), 3);
        assert_eq!(catalog.relation_count(), 2);
    }

    #[test]
    fn unknown_labels_map_to_none() {
        let store = GraphStore::from_snapshot(GraphSnapshot::from_triples(&[("a", "r", "b")]));
        let catalog = Catalog::from_store(&store);
        assert_eq!(catalog.entity_id("zz"), None);
        assert_eq!(catalog.relation(5), None);
    }
}
