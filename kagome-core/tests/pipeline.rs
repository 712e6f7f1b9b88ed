//! End-to-end pipeline behaviour over small reference graphs.

use std::collections::HashSet;

use kagome_core::{
    Edge, GraphSnapshot, GraphSource, GraphSourceError, KagomeBuilder, NegativeStrategy,
};
use kagome_test_support::fixtures;
use rstest::rstest;

struct Fixed(GraphSnapshot);

impl GraphSource for Fixed {
    fn name(&self) -> &str {
        "fixture"
    }

    fn read(&self) -> Result<GraphSnapshot, GraphSourceError> {
        Ok(self.0.clone())
    }
}

fn source_from(triples: &[(&str, &str, &str)]) -> Fixed {
    Fixed(GraphSnapshot::from_triples(triples))
}

#[test]
fn overlapping_relations_are_kept_and_not_flagged_inverse() {
    // livesIn/bornIn share entities but do not fully mirror.
    let dataset = KagomeBuilder::new()
        .with_min_num_rel(1)
        .with_reach_fraction(1.0)
        .build()
        .unwrap()
        .run(&source_from(&fixtures::city_graph()))
        .unwrap();

    let relations: HashSet<&str> = dataset
        .store()
        .relations()
        .iter()
        .map(AsRef::as_ref)
        .collect();
    assert_eq!(relations, HashSet::from(["livesIn", "bornIn"]));
    assert!(dataset.inverse_pairs().is_empty());
    assert!(!dataset.inverse_report().are_inverses("livesIn", "bornIn"));
}

#[test]
fn a_symmetric_relation_never_pairs_with_itself() {
    let dataset = KagomeBuilder::new()
        .build()
        .unwrap()
        .run(&source_from(&fixtures::symmetric_graph()))
        .unwrap();
    assert!(dataset.inverse_pairs().is_empty());
    assert!(!dataset.inverse_report().are_inverses("spouseOf", "spouseOf"));
}

#[rstest]
#[case(1)]
#[case(3)]
fn every_fold_reproduces_each_relation_exactly(#[case] number_splits: usize) {
    let chain = fixtures::chain("friendOf", 10);
    let dataset = KagomeBuilder::new()
        .with_testing_fraction(0.2)
        .with_number_splits(number_splits)
        .build()
        .unwrap()
        .run(&source_from(&fixtures::as_refs(&chain)))
        .unwrap();

    assert_eq!(dataset.folds().len(), number_splits);
    for fold in dataset.folds() {
        let mut seen: HashSet<&Edge> = HashSet::new();
        for edge in fold.train.positives().iter().chain(fold.test.positives()) {
            assert!(seen.insert(edge), "duplicate edge across buckets");
        }
        assert_eq!(seen.len(), dataset.store().edge_count());
        assert_eq!(fold.test.positives().len(), 2);
        assert_eq!(fold.train.positives().len(), 8);
    }
}

#[test]
fn fold_zero_holds_out_the_first_window() {
    let chain = fixtures::chain("friendOf", 10);
    let dataset = KagomeBuilder::new()
        .with_testing_fraction(0.2)
        .build()
        .unwrap()
        .run(&source_from(&fixtures::as_refs(&chain)))
        .unwrap();

    let grouped = dataset.store().index().relation("friendOf").unwrap();
    let expected: Vec<(&str, &str)> = grouped.pairs()[..2]
        .iter()
        .map(|(s, t)| (s.as_ref(), t.as_ref()))
        .collect();
    let held_out: Vec<(&str, &str)> = dataset.folds()[0]
        .test
        .positives()
        .iter()
        .map(|e| (e.source.as_ref(), e.target.as_ref()))
        .collect();
    assert_eq!(held_out, expected);
}

#[test]
fn removed_inverses_keep_the_first_pair_member() {
    let dataset = KagomeBuilder::new()
        .with_remove_inverses(true)
        .build()
        .unwrap()
        .run(&source_from(&fixtures::mirrored_graph()))
        .unwrap();

    // The pair survives for reporting even though the relation is gone.
    assert_eq!(dataset.inverse_pairs().len(), 1);
    let (kept, removed) = &dataset.inverse_pairs()[0];
    assert_eq!(kept.as_ref(), "parentOf");
    assert_eq!(removed.as_ref(), "childOf");

    let relations: Vec<&str> = dataset
        .store()
        .relations()
        .iter()
        .map(AsRef::as_ref)
        .collect();
    assert_eq!(relations, ["parentOf", "knows"]);
}

#[test]
fn negatives_differ_from_their_positives_in_the_corrupted_component() {
    let chain = fixtures::chain("friendOf", 12);
    let dataset = KagomeBuilder::new()
        .with_testing_fraction(0.5)
        .with_negatives_factor(2.0)
        .with_strategy(NegativeStrategy::ChangeTarget)
        .with_seed(13)
        .build()
        .unwrap()
        .run(&source_from(&fixtures::as_refs(&chain)))
        .unwrap();

    let fold = &dataset.folds()[0];
    assert!(!fold.test.negatives().is_empty());
    for negative in fold.test.negatives() {
        let positive = fold
            .test
            .positives()
            .iter()
            .find(|p| p.source == negative.source)
            .expect("chain sources are unique per positive");
        assert_ne!(negative.target, positive.target);
    }
}

#[test]
fn pruning_then_splitting_only_covers_surviving_relations() {
    let mut triples = fixtures::city_graph();
    triples.push(("b", "bornIn", "x"));
    triples.push(("c", "rare", "d"));
    let dataset = KagomeBuilder::new()
        .with_min_num_rel(2)
        .build()
        .unwrap()
        .run(&source_from(&triples))
        .unwrap();

    let report = dataset.prune_report();
    let removed: Vec<&str> = report.removed.iter().map(AsRef::as_ref).collect();
    assert_eq!(removed, ["rare"]);

    let fold = &dataset.folds()[0];
    assert!(
        fold.train
            .positives()
            .iter()
            .chain(fold.test.positives())
            .all(|edge| edge.relation.as_ref() != "rare")
    );
}
