//! Line-based triples file provider implementing [`GraphSource`].
//!
//! Reads UTF-8 records of the form `source<sep>relation<sep>target`, one per
//! line, optionally keeping each record with a configurable probability so
//! large graphs can be thinned while they are read.

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kagome_core::{GraphSnapshot, GraphSource, GraphSourceError, SnapshotBuilder};
use rand::{Rng, SeedableRng, distributions::Standard, rngs::SmallRng};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors raised while configuring a [`TriplesFileSource`].
#[derive(Debug, Error)]
pub enum TriplesSourceError {
    /// The keep probability must be a sensible probability.
    #[error("keep probability must lie in [0, 1] (got {got})")]
    InvalidKeepProbability {
        /// The invalid probability supplied by the caller.
        got: f64,
    },
    /// The separator may not be empty.
    #[error("separator must not be empty")]
    EmptySeparator,
}

/// Graph source reading separated triples from a single file.
///
/// # Examples
/// ```no_run
/// use kagome_providers_triples::TriplesFileSource;
/// use kagome_core::GraphSource;
///
/// let source = TriplesFileSource::new("dataset/merged.txt", "\t")?;
/// let snapshot = source.read().expect("file must parse");
/// # Ok::<(), kagome_providers_triples::TriplesSourceError>(())
/// ```
#[derive(Debug)]
pub struct TriplesFileSource {
    path: PathBuf,
    name: String,
    separator: String,
    keep_probability: f64,
    rng: RefCell<SmallRng>,
}

impl TriplesFileSource {
    /// Creates a source that keeps every record.
    ///
    /// # Errors
    /// Returns [`TriplesSourceError::EmptySeparator`] when `separator` is
    /// empty.
    pub fn new(path: impl AsRef<Path>, separator: &str) -> Result<Self, TriplesSourceError> {
        Self::with_keep_probability(path, separator, 1.0, 0)
    }

    /// Creates a source that keeps each record with probability
    /// `keep_probability`, drawn from a generator seeded with `seed`.
    ///
    /// The fraction is a per-record probability, not an exact proportion of
    /// the file.
    ///
    /// # Errors
    /// Returns [`TriplesSourceError::InvalidKeepProbability`] for
    /// probabilities outside `[0, 1]` and
    /// [`TriplesSourceError::EmptySeparator`] for an empty separator.
    pub fn with_keep_probability(
        path: impl AsRef<Path>,
        separator: &str,
        keep_probability: f64,
        seed: u64,
    ) -> Result<Self, TriplesSourceError> {
        if !(0.0..=1.0).contains(&keep_probability) {
            return Err(TriplesSourceError::InvalidKeepProbability {
                got: keep_probability,
            });
        }
        if separator.is_empty() {
            return Err(TriplesSourceError::EmptySeparator);
        }
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_stem()
            .and_then(|value| value.to_str())
            .map_or_else(|| "triples".to_owned(), ToOwned::to_owned);
        Ok(Self {
            path,
            name,
            separator: separator.to_owned(),
            keep_probability,
            rng: RefCell::new(SmallRng::seed_from_u64(seed)),
        })
    }

    fn io_error(&self, err: &std::io::Error) -> GraphSourceError {
        GraphSourceError::Io {
            path: Arc::from(self.path.to_string_lossy().as_ref()),
            message: err.to_string(),
        }
    }
}

impl GraphSource for TriplesFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "triples.read", skip(self), fields(path = %self.path.display()))]
    fn read(&self) -> Result<GraphSnapshot, GraphSourceError> {
        let file = File::open(&self.path).map_err(|err| self.io_error(&err))?;
        let reader = BufReader::new(file);
        let mut builder = SnapshotBuilder::new();
        let mut rng = self.rng.borrow_mut();
        let mut read_lines = 0_usize;

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|err| self.io_error(&err))?;
            read_lines += 1;
            let draw: f64 = rng.sample(Standard);
            if draw >= self.keep_probability {
                continue;
            }
            let record = line.trim();
            if record.is_empty() {
                continue;
            }
            let fields: Vec<&str> = record.split(self.separator.as_str()).collect();
            let [source, relation, target] = fields.as_slice() else {
                return Err(GraphSourceError::MalformedRecord {
                    line: index + 1,
                    fields: fields.len(),
                });
            };
            if source.is_empty() || relation.is_empty() || target.is_empty() {
                return Err(GraphSourceError::EmptyField { line: index + 1 });
            }
            builder.record(source, relation, target);
        }

        if builder.edge_count() == 0 {
            return Err(GraphSourceError::Empty);
        }
        debug!(
            lines = read_lines,
            kept = builder.edge_count(),
            "triples file read"
        );
        Ok(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kagome_test_support::{files, fixtures};
    use rstest::rstest;

    #[test]
    fn reads_every_record_at_full_probability() {
        let fixture = files::TriplesFixture::tab_separated(&fixtures::city_graph());
        let source = TriplesFileSource::new(fixture.path(), "\t").unwrap();
        let snapshot = source.read().unwrap();

        assert_eq!(snapshot.edges.len(), 3);
        let relations: Vec<&str> = snapshot.relations.iter().map(AsRef::as_ref).collect();
        assert_eq!(relations, ["livesIn", "bornIn"]);
        assert_eq!(source.name(), "triples");
    }

    #[test]
    fn zero_probability_yields_the_empty_error() {
        let fixture = files::TriplesFixture::tab_separated(&fixtures::city_graph());
        let source =
            TriplesFileSource::with_keep_probability(fixture.path(), "\t", 0.0, 1).unwrap();
        let err = source.read().unwrap_err();
        assert!(matches!(err, GraphSourceError::Empty));
    }

    #[test]
    fn keep_probability_thins_the_graph() {
        let chain = fixtures::chain("r", 400);
        let refs = fixtures::as_refs(&chain);
        let fixture = files::TriplesFixture::tab_separated(&refs);
        let source =
            TriplesFileSource::with_keep_probability(fixture.path(), "\t", 0.5, 7).unwrap();
        let snapshot = source.read().unwrap();

        // A per-record coin flip: the exact count varies with the seed but
        // must land well inside the binomial bulk.
        assert!(snapshot.edges.len() > 100 && snapshot.edges.len() < 300);
    }

    #[test]
    fn malformed_records_name_the_line() {
        let fixture = files::TriplesFixture::tab_separated(&[("a", "r", "b")]);
        std::fs::write(fixture.path(), "a\tr\tb\na\tb\n").unwrap();
        let source = TriplesFileSource::new(fixture.path(), "\t").unwrap();
        let err = source.read().unwrap_err();
        assert!(matches!(
            err,
            GraphSourceError::MalformedRecord { line: 2, fields: 2 }
        ));
    }

    #[test]
    fn empty_fields_are_rejected() {
        let fixture = files::TriplesFixture::tab_separated(&[("a", "r", "b")]);
        std::fs::write(fixture.path(), "a\t\tb\n").unwrap();
        let source = TriplesFileSource::new(fixture.path(), "\t").unwrap();
        let err = source.read().unwrap_err();
        assert!(matches!(err, GraphSourceError::EmptyField { line: 1 }));
    }

    #[test]
    fn missing_files_surface_an_io_error() {
        let source = TriplesFileSource::new("/nonexistent/triples.txt", "\t").unwrap();
        let err = source.read().unwrap_err();
        assert!(matches!(err, GraphSourceError::Io { .. }));
    }

    #[rstest]
    #[case(-0.5)]
    #[case(1.5)]
    fn invalid_keep_probabilities_fail_fast(#[case] probability: f64) {
        let err = TriplesFileSource::with_keep_probability("x.txt", "\t", probability, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            TriplesSourceError::InvalidKeepProbability { .. }
        ));
    }

    #[test]
    fn empty_separators_fail_fast() {
        let err = TriplesFileSource::new("x.txt", "").unwrap_err();
        assert!(matches!(err, TriplesSourceError::EmptySeparator));
    }

    #[test]
    fn custom_separators_are_honoured() {
        let fixture = files::TriplesFixture::tab_separated(&[("a", "r", "b")]);
        std::fs::write(fixture.path(), "a::r::b\n").unwrap();
        let source = TriplesFileSource::new(fixture.path(), "::").unwrap();
        let snapshot = source.read().unwrap();
        assert_eq!(snapshot.edges.len(), 1);
    }
}
