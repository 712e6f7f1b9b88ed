//! Negative example synthesis.
//!
//! For every positive edge the sampler draws a (possibly fractional) number
//! of corrupted copies: `floor(factor)` certain plus Bernoulli draws that
//! consume the fractional remainder, so the expected count equals the factor.
//! Each corrupted endpoint runs a small per-draw state machine that widens
//! its candidate pool after repeated failures and gives up after a bounded
//! number of attempts.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rand::{
    Rng, SeedableRng,
    distributions::{Distribution, Standard, WeightedIndex},
    rngs::SmallRng,
    seq::SliceRandom,
};
use tracing::{instrument, warn};

use crate::{
    catalog::Catalog,
    error::KagomeError,
    graph::{Edge, GraphStore, RelationEdges},
    ppr::VisitationTable,
};

/// Draws exhausted on one candidate pool before it is widened.
const WIDEN_AFTER: usize = 10;
/// Total draws attempted before an endpoint is declared exhausted.
const MAX_ATTEMPTS: usize = 20;

/// How negatives are synthesised from a positive edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NegativeStrategy {
    /// Corrupt the source, keeping the relation's domain.
    ChangeSource,
    /// Corrupt the target, keeping the relation's range.
    ChangeTarget,
    /// Corrupt both endpoints, keeping domain and range.
    ChangeBoth,
    /// Corrupt the source, drawing from the whole edge universe.
    ChangeSourceRandom,
    /// Corrupt the target, drawing from the whole edge universe.
    ChangeTargetRandom,
    /// Corrupt both endpoints, drawing from the whole edge universe.
    ChangeBothRandom,
    /// Corrupt both endpoints, weighting candidates by personalized-PageRank
    /// visitation probability.
    Ppr,
}

impl NegativeStrategy {
    /// Canonical configuration-surface name of the strategy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChangeSource => "change_source",
            Self::ChangeTarget => "change_target",
            Self::ChangeBoth => "change_both",
            Self::ChangeSourceRandom => "change_source_random",
            Self::ChangeTargetRandom => "change_target_random",
            Self::ChangeBothRandom => "change_both_random",
            Self::Ppr => "ppr",
        }
    }

    /// Whether this strategy needs a precomputed visitation table.
    #[must_use]
    pub const fn needs_ppr(self) -> bool {
        matches!(self, Self::Ppr)
    }

    const fn corrupts_source(self) -> bool {
        matches!(
            self,
            Self::ChangeSource | Self::ChangeBoth | Self::ChangeSourceRandom | Self::ChangeBothRandom
        )
    }

    const fn corrupts_target(self) -> bool {
        matches!(
            self,
            Self::ChangeTarget | Self::ChangeBoth | Self::ChangeTargetRandom | Self::ChangeBothRandom
        )
    }

    /// Whether candidate pools stay inside the relation's domain/range.
    const fn keeps_domain_range(self) -> bool {
        matches!(self, Self::ChangeSource | Self::ChangeTarget | Self::ChangeBoth)
    }
}

impl fmt::Display for NegativeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NegativeStrategy {
    type Err = KagomeError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "change_source" => Ok(Self::ChangeSource),
            "change_target" => Ok(Self::ChangeTarget),
            "change_both" => Ok(Self::ChangeBoth),
            "change_source_random" => Ok(Self::ChangeSourceRandom),
            "change_target_random" => Ok(Self::ChangeTargetRandom),
            "change_both_random" => Ok(Self::ChangeBothRandom),
            "ppr" => Ok(Self::Ppr),
            other => Err(KagomeError::UnknownStrategy {
                name: other.to_owned(),
            }),
        }
    }
}

/// Candidate-pool states of the per-draw escalation machine.
///
/// `FrequencyWeighted` draws endpoints with repetition proportional to how
/// often they occur; after [`WIDEN_AFTER`] failed draws the pool flattens to
/// the uniform domain/range set (or the full entity universe when the scope
/// already was the universe), and after [`MAX_ATTEMPTS`] draws the endpoint
/// is `Failed` and the negative is dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PoolState {
    FrequencyWeighted,
    ScopedUniform,
    GlobalUniform,
}

impl PoolState {
    /// The flattened pool used once [`WIDEN_AFTER`] draws have failed:
    /// domain/range-scoped pools fall back to the uniform domain/range set,
    /// universe-scoped pools to the full entity universe.
    const fn widened(scoped: bool) -> Self {
        if scoped {
            Self::ScopedUniform
        } else {
            Self::GlobalUniform
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Endpoint {
    Source,
    Target,
}

/// Sampling options validated by the [`crate::KagomeBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct SamplerOptions {
    /// Expected number of negatives per positive.
    pub negatives_factor: f64,
    /// Corruption strategy.
    pub strategy: NegativeStrategy,
    /// Start from the uniform domain/range pools instead of the
    /// frequency-weighted ones.
    pub uniform_candidates: bool,
    /// Permanently exclude a relation once a positive that requested
    /// negatives produced none.
    pub reject_relation_after_failure: bool,
}

/// PPR context handed to the sampler when the [`NegativeStrategy::Ppr`]
/// strategy is active.
#[derive(Clone, Copy, Debug)]
pub struct PprWeights<'a> {
    /// Catalog the visitation table was computed with.
    pub catalog: &'a Catalog,
    /// Precomputed visitation probabilities.
    pub table: &'a VisitationTable,
}

/// Generates corrupted edges for the buckets of a run.
///
/// One sampler instance lives for the whole run so that relation-level
/// rejections persist across folds and buckets.
pub struct NegativeSampler<'g> {
    store: &'g GraphStore,
    options: SamplerOptions,
    ppr: Option<PprWeights<'g>>,
    rng: SmallRng,
    ignored: HashSet<Arc<str>>,
}

impl<'g> NegativeSampler<'g> {
    /// Creates a sampler over the store's current (post-preprocessing) state.
    #[must_use]
    pub fn new(store: &'g GraphStore, options: SamplerOptions, seed: u64) -> Self {
        Self {
            store,
            options,
            ppr: None,
            rng: SmallRng::seed_from_u64(seed),
            ignored: HashSet::new(),
        }
    }

    /// Attaches the visitation table required by the PPR strategy.
    #[must_use]
    pub fn with_ppr(mut self, weights: PprWeights<'g>) -> Self {
        self.ppr = Some(weights);
        self
    }

    /// Relations excluded from further generation after a total failure.
    #[must_use]
    pub fn ignored_relations(&self) -> &HashSet<Arc<str>> {
        &self.ignored
    }

    /// Generates the negatives for one bucket of positives.
    #[instrument(name = "core.negatives", skip(self, positives), fields(positives = positives.len(), strategy = %self.options.strategy))]
    pub fn generate(&mut self, positives: &[Edge]) -> Vec<Edge> {
        let mut negatives = Vec::new();
        for positive in positives {
            if self.ignored.contains(&positive.relation) {
                continue;
            }
            let requested = self.sample_count();
            let fresh = match self.options.strategy {
                NegativeStrategy::Ppr => self.generate_ppr(positive, requested),
                _ => self.generate_random(positive, requested),
            };
            if fresh.is_empty() {
                // A request that produced nothing signals an exhausted
                // relation when the caller opted into rejection.
                if requested > 0 && self.options.reject_relation_after_failure {
                    warn!(relation = positive.relation.as_ref(), "relation produced no negatives, ignoring it");
                    self.ignored.insert(Arc::clone(&positive.relation));
                }
            } else {
                negatives.extend(fresh);
            }
        }
        negatives
    }

    /// Number of negatives for one positive: `floor(factor)` plus Bernoulli
    /// draws consuming the fractional remainder.
    fn sample_count(&mut self) -> usize {
        let mut remaining = self.options.negatives_factor;
        let mut count = 0;
        loop {
            let draw: f64 = self.rng.sample(Standard);
            if draw >= remaining {
                return count;
            }
            remaining -= 1.0;
            count += 1;
        }
    }

    fn generate_random(&mut self, positive: &Edge, requested: usize) -> Vec<Edge> {
        let strategy = self.options.strategy;
        let scoped = strategy.keeps_domain_range();
        let Some(grouped) = self.store.index().relation(&positive.relation) else {
            return Vec::new();
        };

        let mut negatives = Vec::new();
        for _ in 0..requested {
            let source = if strategy.corrupts_source() {
                self.draw_replacement(grouped, &positive.source, Endpoint::Source, scoped)
            } else {
                Some(Arc::clone(&positive.source))
            };
            let target = if strategy.corrupts_target() {
                self.draw_replacement(grouped, &positive.target, Endpoint::Target, scoped)
            } else {
                Some(Arc::clone(&positive.target))
            };
            if let (Some(source), Some(target)) = (source, target) {
                negatives.push(Edge {
                    relation: Arc::clone(&positive.relation),
                    source,
                    target,
                });
            }
        }
        negatives
    }

    /// Runs the escalation machine for one endpoint and returns a candidate
    /// distinct from `original`, or `None` once the draw is exhausted.
    fn draw_replacement(
        &mut self,
        grouped: &RelationEdges,
        original: &Arc<str>,
        endpoint: Endpoint,
        scoped: bool,
    ) -> Option<Arc<str>> {
        let mut state = if self.options.uniform_candidates {
            PoolState::ScopedUniform
        } else {
            PoolState::FrequencyWeighted
        };
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > WIDEN_AFTER {
                state = PoolState::widened(scoped);
            }
            let candidate = self.draw_once(state, grouped, endpoint, scoped)?;
            if candidate != *original {
                return Some(candidate);
            }
        }
        None
    }

    /// One draw from the pool the state machine currently points at. Returns
    /// `None` when the pool has too few distinct values to ever produce a
    /// different candidate.
    fn draw_once(
        &mut self,
        state: PoolState,
        grouped: &RelationEdges,
        endpoint: Endpoint,
        scoped: bool,
    ) -> Option<Arc<str>> {
        match state {
            PoolState::FrequencyWeighted if scoped => {
                let pairs = grouped.pairs();
                let (source, target) = Self::choose(&mut self.rng, pairs)?;
                Some(match endpoint {
                    Endpoint::Source => Arc::clone(source),
                    Endpoint::Target => Arc::clone(target),
                })
            }
            PoolState::FrequencyWeighted => {
                let edge = Self::choose(&mut self.rng, self.store.edges())?;
                Some(match endpoint {
                    Endpoint::Source => Arc::clone(&edge.source),
                    Endpoint::Target => Arc::clone(&edge.target),
                })
            }
            PoolState::ScopedUniform => {
                let pool = match endpoint {
                    Endpoint::Source => grouped.domain(),
                    Endpoint::Target => grouped.range(),
                };
                Self::choose(&mut self.rng, pool).cloned()
            }
            PoolState::GlobalUniform => {
                Self::choose(&mut self.rng, self.store.entity_order()).cloned()
            }
        }
    }

    fn choose<'a, T>(rng: &mut SmallRng, pool: &'a [T]) -> Option<&'a T> {
        if pool.len() <= 1 {
            return None;
        }
        pool.choose(rng)
    }

    /// PPR-weighted corruption: candidates are the relation's domain/range
    /// entries with strictly positive visitation probability from the
    /// positive's own endpoints, excluding the original values; replacements
    /// are drawn with replacement under the normalised distribution.
    fn generate_ppr(&mut self, positive: &Edge, requested: usize) -> Vec<Edge> {
        let Some(PprWeights { catalog, table }) = self.ppr else {
            return Vec::new();
        };
        let Some(grouped) = self.store.index().relation(&positive.relation) else {
            return Vec::new();
        };
        let (Some(source_id), Some(target_id)) = (
            catalog.entity_id(&positive.source),
            catalog.entity_id(&positive.target),
        ) else {
            return Vec::new();
        };

        let sources = Self::weighted_pool(catalog, table.row(source_id), grouped.domain(), &positive.source);
        let targets = Self::weighted_pool(catalog, table.row(target_id), grouped.range(), &positive.target);
        let (Some(sources), Some(targets)) = (sources, targets) else {
            return Vec::new();
        };

        let mut negatives = Vec::with_capacity(requested);
        for _ in 0..requested {
            let source = Arc::clone(&sources.entries[sources.dist.sample(&mut self.rng)]);
            let target = Arc::clone(&targets.entries[targets.dist.sample(&mut self.rng)]);
            negatives.push(Edge {
                relation: Arc::clone(&positive.relation),
                source,
                target,
            });
        }
        negatives
    }

    fn weighted_pool(
        catalog: &Catalog,
        row: &[f64],
        scope: &[Arc<str>],
        exclude: &Arc<str>,
    ) -> Option<WeightedPool> {
        let mut entries = Vec::new();
        let mut weights = Vec::new();
        for entity in scope {
            if entity == exclude {
                continue;
            }
            let Some(id) = catalog.entity_id(entity) else {
                continue;
            };
            let probability = row[id];
            if probability > 0.0 {
                entries.push(Arc::clone(entity));
                weights.push(probability);
            }
        }
        let dist = WeightedIndex::new(&weights).ok()?;
        Some(WeightedPool { entries, dist })
    }
}

struct WeightedPool {
    entries: Vec<Arc<str>>,
    dist: WeightedIndex<f64>,
}
