//! Command-line interface orchestration for the kagome dataset generator.
//!
//! The CLI offers a `generate` command that reads a separated triples file,
//! runs the preprocessing/splitting/negative-sampling pipeline, and writes
//! the evaluation dataset files.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kagome_core::{Dataset, KagomeBuilder, KagomeError, NegativeStrategy};
use kagome_providers_triples::{TriplesFileSource, TriplesSourceError};
use thiserror::Error;

use crate::{export, gexf, summary};

const DEFAULT_SEPARATOR: &str = "\t";

/// Top-level CLI options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(name = "kagome", about = "Prepare evaluation datasets for knowledge-graph completion.")]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported CLI commands.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Read a triples file and generate train/test folds with negatives.
    Generate(GenerateCommand),
}

/// Options accepted by the `generate` command.
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Path to the triples file (`source<sep>relation<sep>target` per line).
    pub input: PathBuf,

    /// Directory the dataset files are written to; created when missing.
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Field separator used in the input file.
    #[arg(long, default_value = DEFAULT_SEPARATOR)]
    pub separator: String,

    /// Probability of keeping each edge while reading.
    #[arg(long, default_value_t = 1.0)]
    pub graph_fraction: f64,

    /// Minimum edge count required to keep a relation.
    #[arg(long, default_value_t = 0)]
    pub min_num_rel: usize,

    /// Cumulative frequency coverage kept during pruning; 1.0 keeps all.
    #[arg(long, default_value_t = 1.0)]
    pub reach_fraction: f64,

    /// Remove relations detected as inverses of another relation.
    #[arg(long)]
    pub remove_inverses: bool,

    /// Fraction of each relation's edges held out for testing.
    #[arg(long, default_value_t = 0.2)]
    pub testing_fraction: f64,

    /// Expected number of negatives generated per positive.
    #[arg(long, default_value_t = 1.0)]
    pub number_negatives: f64,

    /// Strategy used to corrupt positives into negatives.
    #[arg(long, value_enum, default_value_t = StrategyArg::ChangeTarget)]
    pub strategy: StrategyArg,

    /// Number of rotated train/test folds to derive.
    #[arg(long, default_value_t = 1)]
    pub number_splits: usize,

    /// Also generate (and export) negatives for the training buckets.
    #[arg(long)]
    pub train_negatives: bool,

    /// Draw candidates uniformly instead of frequency-weighted.
    #[arg(long)]
    pub uniform_candidates: bool,

    /// Permanently skip a relation once a requested draw produces nothing.
    #[arg(long)]
    pub reject_after_failure: bool,

    /// Teleport probability of the PPR walk (strategy `ppr`).
    #[arg(long, default_value_t = 0.02)]
    pub ppr_alpha: f64,

    /// Number of PPR iterations; defaults to `round(1/alpha)`.
    #[arg(long)]
    pub ppr_steps: Option<usize>,

    /// Seed for every random draw of the run.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Write an HTML summary of relation frequencies and entity degrees.
    #[arg(long)]
    pub summary: bool,

    /// Export fold 0 as a GEXF graph for visualisation.
    #[arg(long)]
    pub export_gexf: bool,
}

/// Negative-sampling strategies exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Corrupt the source within the relation's domain.
    #[value(name = "change_source")]
    ChangeSource,
    /// Corrupt the target within the relation's range.
    #[value(name = "change_target")]
    ChangeTarget,
    /// Corrupt both endpoints within domain and range.
    #[value(name = "change_both")]
    ChangeBoth,
    /// Corrupt the source drawing from the whole edge universe.
    #[value(name = "change_source_random")]
    ChangeSourceRandom,
    /// Corrupt the target drawing from the whole edge universe.
    #[value(name = "change_target_random")]
    ChangeTargetRandom,
    /// Corrupt both endpoints drawing from the whole edge universe.
    #[value(name = "change_both_random")]
    ChangeBothRandom,
    /// Corrupt both endpoints weighted by personalized PageRank.
    #[value(name = "ppr")]
    Ppr,
}

impl From<StrategyArg> for NegativeStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::ChangeSource => Self::ChangeSource,
            StrategyArg::ChangeTarget => Self::ChangeTarget,
            StrategyArg::ChangeBoth => Self::ChangeBoth,
            StrategyArg::ChangeSourceRandom => Self::ChangeSourceRandom,
            StrategyArg::ChangeTargetRandom => Self::ChangeTargetRandom,
            StrategyArg::ChangeBothRandom => Self::ChangeBothRandom,
            StrategyArg::Ppr => Self::Ppr,
        }
    }
}

/// Errors surfaced while executing CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// File I/O failed while writing dataset artifacts.
    #[error("failed to write `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The triples source rejected its configuration.
    #[error(transparent)]
    Source(#[from] TriplesSourceError),
    /// Core configuration or pipeline failure.
    #[error(transparent)]
    Core(#[from] KagomeError),
}

/// Summarises the outcome of a `generate` invocation.
#[derive(Debug)]
pub struct ExecutionSummary {
    /// Name reported by the graph source.
    pub data_source: String,
    /// Directory the artifacts were written to.
    pub output: PathBuf,
    /// The generated dataset.
    pub dataset: Dataset,
}

/// Executes the CLI command represented by `cli`.
///
/// # Errors
/// Returns [`CliError`] when configuration, the pipeline, or an export step
/// fails.
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    match cli.command {
        Command::Generate(command) => run_generate(command),
    }
}

fn run_generate(command: GenerateCommand) -> Result<ExecutionSummary, CliError> {
    let kagome = KagomeBuilder::new()
        .with_min_num_rel(command.min_num_rel)
        .with_reach_fraction(command.reach_fraction)
        .with_remove_inverses(command.remove_inverses)
        .with_testing_fraction(command.testing_fraction)
        .with_negatives_factor(command.number_negatives)
        .with_strategy(command.strategy.into())
        .with_number_splits(command.number_splits)
        .with_train_negatives(command.train_negatives)
        .with_uniform_candidates(command.uniform_candidates)
        .with_reject_relation_after_failure(command.reject_after_failure)
        .with_ppr_alpha(command.ppr_alpha)
        .with_ppr_steps(command.ppr_steps)
        .with_seed(command.seed)
        .build()?;

    let source = TriplesFileSource::with_keep_probability(
        &command.input,
        &command.separator,
        command.graph_fraction,
        command.seed,
    )?;
    let dataset = kagome.run(&source)?;

    export::export_dataset(&dataset, &command.output, command.train_negatives)?;
    if command.summary {
        summary::write_summary(&dataset, &command.output)?;
    }
    if command.export_gexf {
        gexf::write_gexf(&dataset, 0, &command.output)?;
    }

    Ok(ExecutionSummary {
        data_source: kagome_core::GraphSource::name(&source).to_owned(),
        output: command.output,
        dataset,
    })
}

/// Renders `summary` to `writer` in a human-readable text format.
///
/// # Errors
/// Returns [`io::Error`] if writing to the supplied writer fails.
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    let store = summary.dataset.store();
    writeln!(writer, "data source: {}", summary.data_source)?;
    writeln!(writer, "output: {}", summary.output.display())?;
    writeln!(
        writer,
        "entities: {}  relations: {}  edges: {}",
        store.entity_count(),
        store.relations().len(),
        store.edge_count()
    )?;
    writeln!(writer, "inverse pairs: {}", summary.dataset.inverse_pairs().len())?;
    for fold in summary.dataset.folds() {
        writeln!(
            writer,
            "fold {}: train {}+{}  test {}+{}",
            fold.index(),
            fold.train.positives().len(),
            fold.train.negatives().len(),
            fold.test.positives().len(),
            fold.test.negatives().len()
        )?;
    }
    Ok(())
}
