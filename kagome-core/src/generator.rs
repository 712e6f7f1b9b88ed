//! Pipeline orchestration: configuration, validation, and the phase sequence.
//!
//! Phases run strictly in order over one owned graph state: load → prune →
//! inverse detection (and optional removal) → split → optional PPR → negative
//! sampling. Invalid configuration fails before any graph processing begins.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::{
    Result,
    catalog::Catalog,
    error::KagomeError,
    graph::{Degrees, GraphStore},
    inverse::{InverseReport, find_inverses, remove_inverses},
    negative::{NegativeSampler, NegativeStrategy, PprWeights, SamplerOptions},
    ppr::compute_ppr,
    prune::{PruneReport, prune_relations},
    source::GraphSource,
    split::{Fold, TestFractions, split_graph},
};

const DEFAULT_SEED: u64 = 0x6B61_676F;

/// Configures and constructs [`Kagome`] instances.
///
/// # Examples
/// ```
/// use kagome_core::{KagomeBuilder, NegativeStrategy};
///
/// let kagome = KagomeBuilder::new()
///     .with_min_num_rel(2)
///     .with_reach_fraction(0.95)
///     .with_strategy(NegativeStrategy::ChangeTarget)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(kagome.number_splits(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct KagomeBuilder {
    min_num_rel: usize,
    reach_fraction: f64,
    remove_inverses: bool,
    testing_fraction: f64,
    relation_fractions: Vec<(Arc<str>, f64)>,
    negatives_factor: f64,
    strategy: NegativeStrategy,
    number_splits: usize,
    generate_train_negatives: bool,
    uniform_candidates: bool,
    reject_relation_after_failure: bool,
    ppr_alpha: f64,
    ppr_steps: Option<usize>,
    seed: u64,
}

impl Default for KagomeBuilder {
    fn default() -> Self {
        Self {
            min_num_rel: 0,
            reach_fraction: 1.0,
            remove_inverses: false,
            testing_fraction: 0.2,
            relation_fractions: Vec::new(),
            negatives_factor: 1.0,
            strategy: NegativeStrategy::ChangeTarget,
            number_splits: 1,
            generate_train_negatives: true,
            uniform_candidates: false,
            reject_relation_after_failure: false,
            ppr_alpha: 0.02,
            ppr_steps: None,
            seed: DEFAULT_SEED,
        }
    }
}

impl KagomeBuilder {
    /// Creates a builder populated with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum edge count a relation needs to survive pruning.
    #[must_use]
    pub fn with_min_num_rel(mut self, min_num_rel: usize) -> Self {
        self.min_num_rel = min_num_rel;
        self
    }

    /// Cumulative coverage target for pruning; `1.0` keeps every relation
    /// meeting the minimum.
    #[must_use]
    pub fn with_reach_fraction(mut self, reach_fraction: f64) -> Self {
        self.reach_fraction = reach_fraction;
        self
    }

    /// Whether detected inverse relations are removed after detection.
    #[must_use]
    pub fn with_remove_inverses(mut self, remove: bool) -> Self {
        self.remove_inverses = remove;
        self
    }

    /// Global fraction of each relation's edges held out for testing.
    #[must_use]
    pub fn with_testing_fraction(mut self, fraction: f64) -> Self {
        self.testing_fraction = fraction;
        self
    }

    /// Overrides the testing fraction for one relation.
    #[must_use]
    pub fn with_relation_fraction(mut self, relation: &str, fraction: f64) -> Self {
        self.relation_fractions.push((Arc::from(relation), fraction));
        self
    }

    /// Expected number of negatives per positive; fractional values become
    /// Bernoulli draws on the remainder.
    #[must_use]
    pub fn with_negatives_factor(mut self, factor: f64) -> Self {
        self.negatives_factor = factor;
        self
    }

    /// Negative-sampling strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: NegativeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Number of rotated folds derived from the graph.
    #[must_use]
    pub fn with_number_splits(mut self, number_splits: usize) -> Self {
        self.number_splits = number_splits;
        self
    }

    /// Whether negatives are generated for training buckets too.
    #[must_use]
    pub fn with_train_negatives(mut self, generate: bool) -> Self {
        self.generate_train_negatives = generate;
        self
    }

    /// Start candidate pools from the uniform domain/range sets.
    #[must_use]
    pub fn with_uniform_candidates(mut self, uniform: bool) -> Self {
        self.uniform_candidates = uniform;
        self
    }

    /// Permanently exclude a relation once a requested draw produces nothing.
    #[must_use]
    pub fn with_reject_relation_after_failure(mut self, reject: bool) -> Self {
        self.reject_relation_after_failure = reject;
        self
    }

    /// Teleport probability for the PPR walk.
    #[must_use]
    pub fn with_ppr_alpha(mut self, alpha: f64) -> Self {
        self.ppr_alpha = alpha;
        self
    }

    /// Number of PPR iterations; defaults to `round(1/alpha)` when unset.
    #[must_use]
    pub fn with_ppr_steps(mut self, steps: Option<usize>) -> Self {
        self.ppr_steps = steps;
        self
    }

    /// Seed for every random draw of the run.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validates the configuration and constructs a [`Kagome`] instance.
    ///
    /// # Errors
    /// Returns [`KagomeError::FractionOutOfRange`] for fractions outside
    /// `[0, 1]`, [`KagomeError::NonPositiveNegativesFactor`] for factors at
    /// or below zero, [`KagomeError::InvalidAlpha`] for teleport
    /// probabilities outside `(0, 1)`, and [`KagomeError::ZeroSplits`] when
    /// no fold would be generated.
    pub fn build(self) -> Result<Kagome> {
        validate_fraction("reach_fraction", self.reach_fraction)?;
        validate_fraction("testing_fraction", self.testing_fraction)?;
        for (_, fraction) in &self.relation_fractions {
            validate_fraction("testing_fraction", *fraction)?;
        }
        if !(self.negatives_factor > 0.0) {
            return Err(KagomeError::NonPositiveNegativesFactor {
                got: self.negatives_factor,
            });
        }
        if !(self.ppr_alpha > 0.0 && self.ppr_alpha < 1.0) {
            return Err(KagomeError::InvalidAlpha {
                got: self.ppr_alpha,
            });
        }
        if self.number_splits == 0 {
            return Err(KagomeError::ZeroSplits);
        }
        Ok(Kagome { config: self })
    }
}

fn validate_fraction(name: &'static str, got: f64) -> Result<()> {
    if (0.0..=1.0).contains(&got) {
        Ok(())
    } else {
        Err(KagomeError::FractionOutOfRange { name, got })
    }
}

/// Entry point for running the dataset-preparation pipeline.
///
/// # Examples
/// ```
/// use kagome_core::{GraphSnapshot, GraphSource, GraphSourceError, KagomeBuilder};
///
/// struct Fixed(GraphSnapshot);
/// impl GraphSource for Fixed {
///     fn name(&self) -> &str { "fixed" }
///     fn read(&self) -> Result<GraphSnapshot, GraphSourceError> { Ok(self.0.clone()) }
/// }
///
/// let source = Fixed(GraphSnapshot::from_triples(&[
///     ("a", "livesIn", "x"),
///     ("b", "livesIn", "x"),
///     ("x", "bornIn", "a"),
/// ]));
/// let dataset = KagomeBuilder::new()
///     .with_min_num_rel(1)
///     .build()?
///     .run(&source)?;
/// assert_eq!(dataset.folds().len(), 1);
/// # Ok::<(), kagome_core::KagomeError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Kagome {
    config: KagomeBuilder,
}

impl Kagome {
    /// Number of folds the pipeline will generate.
    #[must_use]
    pub fn number_splits(&self) -> usize {
        self.config.number_splits
    }

    /// Strategy used for negative generation.
    #[must_use]
    pub fn strategy(&self) -> NegativeStrategy {
        self.config.strategy
    }

    /// Executes every phase over the snapshot produced by `source`.
    ///
    /// # Errors
    /// Returns [`KagomeError::Source`] when the graph source fails.
    #[instrument(name = "core.run", err, skip(self, source), fields(data_source = %source.name()))]
    pub fn run<S: GraphSource>(&self, source: &S) -> Result<Dataset> {
        let snapshot = source.read().map_err(|error| KagomeError::Source {
            data_source: Arc::from(source.name()),
            error,
        })?;
        let mut store = GraphStore::from_snapshot(snapshot);
        info!(
            entities = store.entity_count(),
            relations = store.relations().len(),
            edges = store.edge_count(),
            "graph loaded"
        );

        let prune_report =
            prune_relations(&mut store, self.config.min_num_rel, self.config.reach_fraction);

        let inverse_report = find_inverses(&store);
        if self.config.remove_inverses {
            remove_inverses(&mut store, &inverse_report);
        }

        let mut fractions = TestFractions::uniform(self.config.testing_fraction);
        for (relation, fraction) in &self.config.relation_fractions {
            fractions = fractions.with_override(relation, *fraction);
        }
        let mut folds = split_graph(&store, self.config.number_splits, &fractions);

        let ppr = self.config.strategy.needs_ppr().then(|| {
            let catalog = Catalog::from_store(&store);
            let table = compute_ppr(&store, &catalog, self.config.ppr_alpha, self.config.ppr_steps);
            (catalog, table)
        });

        let options = SamplerOptions {
            negatives_factor: self.config.negatives_factor,
            strategy: self.config.strategy,
            uniform_candidates: self.config.uniform_candidates,
            reject_relation_after_failure: self.config.reject_relation_after_failure,
        };
        let mut sampler = NegativeSampler::new(&store, options, self.config.seed);
        if let Some((catalog, table)) = &ppr {
            sampler = sampler.with_ppr(PprWeights { catalog, table });
        }
        for fold in &mut folds {
            let negatives = sampler.generate(fold.test.positives());
            fold.test.set_negatives(negatives);
            if self.config.generate_train_negatives {
                let negatives = sampler.generate(fold.train.positives());
                fold.train.set_negatives(negatives);
            }
        }

        Ok(Dataset {
            store,
            folds,
            prune_report,
            inverse_report,
        })
    }
}

/// Everything a run produces, shaped for the thin exporter collaborators.
#[derive(Debug)]
pub struct Dataset {
    store: GraphStore,
    folds: Vec<Fold>,
    prune_report: PruneReport,
    inverse_report: InverseReport,
}

impl Dataset {
    /// The folds with their train/test positives and negatives.
    #[must_use]
    pub fn folds(&self) -> &[Fold] {
        &self.folds
    }

    /// Post-preprocessing graph state.
    #[must_use]
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// The pruning outcome, including accumulated coverage fractions.
    #[must_use]
    pub fn prune_report(&self) -> &PruneReport {
        &self.prune_report
    }

    /// Detected inverse pairs, whether or not they were removed.
    #[must_use]
    pub fn inverse_pairs(&self) -> &[(Arc<str>, Arc<str>)] {
        self.inverse_report.pairs()
    }

    /// Full inverse-detection report.
    #[must_use]
    pub fn inverse_report(&self) -> &InverseReport {
        &self.inverse_report
    }

    /// Relation frequencies sorted by descending count.
    #[must_use]
    pub fn relation_frequencies(&self) -> Vec<(Arc<str>, usize)> {
        self.store.relation_frequencies()
    }

    /// Entity degree rows sorted by descending total degree.
    #[must_use]
    pub fn entity_degrees(&self) -> Vec<(Arc<str>, Degrees)> {
        self.store.entity_degrees()
    }
}
