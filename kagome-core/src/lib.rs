//! Kagome core library: preprocessing, splitting, and negative sampling for
//! knowledge-graph completion evaluation datasets.

mod catalog;
mod error;
mod generator;
mod graph;
mod inverse;
mod negative;
mod ppr;
mod prune;
mod source;
mod split;

pub use crate::{
    catalog::Catalog,
    error::{GraphSourceError, KagomeError, Result},
    generator::{Dataset, Kagome, KagomeBuilder},
    graph::{Degrees, Edge, GraphStore, RelationEdges, RelationIndex},
    inverse::{InverseReport, find_inverses, remove_inverses},
    negative::{NegativeSampler, NegativeStrategy, PprWeights, SamplerOptions},
    ppr::{VisitationTable, compute_ppr},
    prune::{KeptRelation, PruneReport, prune_relations},
    source::{GraphSnapshot, GraphSource, SnapshotBuilder},
    split::{Bucket, Fold, TestFractions, split_graph},
};
