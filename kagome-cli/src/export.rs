//! Tab-separated dataset file writers.
//!
//! Fold 0 lands at the output root so the reference file layout stays intact;
//! further folds get `fold-<i>` subdirectories. The relation, entity, and
//! inverse tables are shared across folds and written once at the root.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use kagome_core::{Bucket, Dataset, Edge, Fold};
use tracing::info;

use crate::cli::CliError;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn fold_directory(out_dir: &Path, fold: &Fold) -> PathBuf {
    if fold.index() == 0 {
        out_dir.to_path_buf()
    } else {
        out_dir.join(format!("fold-{}", fold.index()))
    }
}

fn write_edge(writer: &mut impl Write, edge: &Edge, label: &str) -> io::Result<()> {
    writeln!(
        writer,
        "{}\t{}\t{}\t{}",
        edge.source, edge.relation, edge.target, label
    )
}

fn write_bucket(path: &Path, bucket: &Bucket, include_negatives: bool) -> Result<(), CliError> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    let write = |writer: &mut BufWriter<File>| -> io::Result<()> {
        for edge in bucket.positives() {
            write_edge(writer, edge, "1")?;
        }
        if include_negatives {
            for edge in bucket.negatives() {
                write_edge(writer, edge, "-1")?;
            }
        }
        writer.flush()
    };
    write(&mut writer).map_err(io_error(path))
}

/// Writes `train.txt`/`test.txt` for every fold plus the shared
/// `relations.txt`, `entities.txt`, and `inverses.txt` tables.
///
/// Train negatives are only exported when `include_train_negatives` is set;
/// test negatives are always included.
///
/// # Errors
/// Returns [`CliError::Io`] naming the file that failed.
pub fn export_dataset(
    dataset: &Dataset,
    out_dir: &Path,
    include_train_negatives: bool,
) -> Result<(), CliError> {
    fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;
    for fold in dataset.folds() {
        let dir = fold_directory(out_dir, fold);
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        write_bucket(&dir.join("train.txt"), &fold.train, include_train_negatives)?;
        write_bucket(&dir.join("test.txt"), &fold.test, true)?;
    }
    write_relations_table(dataset, &out_dir.join("relations.txt"))?;
    write_entities_table(dataset, &out_dir.join("entities.txt"))?;
    write_inverses_table(dataset, &out_dir.join("inverses.txt"))?;
    info!(folds = dataset.folds().len(), output = %out_dir.display(), "dataset exported");
    Ok(())
}

fn write_relations_table(dataset: &Dataset, path: &Path) -> Result<(), CliError> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    let write = |writer: &mut BufWriter<File>| -> io::Result<()> {
        for (relation, count) in dataset.relation_frequencies() {
            writeln!(writer, "{relation}\t{count}")?;
        }
        writer.flush()
    };
    write(&mut writer).map_err(io_error(path))
}

fn write_entities_table(dataset: &Dataset, path: &Path) -> Result<(), CliError> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    let write = |writer: &mut BufWriter<File>| -> io::Result<()> {
        for (entity, degrees) in dataset.entity_degrees() {
            writeln!(
                writer,
                "{entity}\t{}\t{}\t{}",
                degrees.degree, degrees.out_degree, degrees.in_degree
            )?;
        }
        writer.flush()
    };
    write(&mut writer).map_err(io_error(path))
}

fn write_inverses_table(dataset: &Dataset, path: &Path) -> Result<(), CliError> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    let write = |writer: &mut BufWriter<File>| -> io::Result<()> {
        for (kept, removable) in dataset.inverse_pairs() {
            writeln!(writer, "{kept}\t{removable}")?;
        }
        writer.flush()
    };
    write(&mut writer).map_err(io_error(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use kagome_core::{GraphSnapshot, GraphSource, GraphSourceError, KagomeBuilder};
    use kagome_test_support::fixtures;
    use tempfile::TempDir;

    struct Fixed(GraphSnapshot);

    impl GraphSource for Fixed {
        fn name(&self) -> &str {
            "fixture"
        }

        fn read(&self) -> Result<GraphSnapshot, GraphSourceError> {
            Ok(self.0.clone())
        }
    }

    fn dataset(triples: &[(&str, &str, &str)]) -> Dataset {
        KagomeBuilder::new()
            .with_testing_fraction(0.5)
            .with_seed(5)
            .build()
            .unwrap()
            .run(&Fixed(GraphSnapshot::from_triples(triples)))
            .unwrap()
    }

    #[test]
    fn records_use_the_reference_column_order() {
        let chain = fixtures::chain("friendOf", 4);
        let dataset = dataset(&fixtures::as_refs(&chain));
        let out = TempDir::new().unwrap();
        export_dataset(&dataset, out.path(), false).unwrap();

        let train = fs::read_to_string(out.path().join("train.txt")).unwrap();
        for line in train.lines() {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 4);
            assert_eq!(fields[1], "friendOf");
            assert_eq!(fields[3], "1");
        }
    }

    #[test]
    fn train_negatives_are_opt_in() {
        let chain = fixtures::chain("friendOf", 8);
        let dataset = dataset(&fixtures::as_refs(&chain));

        let out = TempDir::new().unwrap();
        export_dataset(&dataset, out.path(), false).unwrap();
        let train = fs::read_to_string(out.path().join("train.txt")).unwrap();
        assert!(train.lines().all(|l| l.ends_with("\t1")));

        let out_with = TempDir::new().unwrap();
        export_dataset(&dataset, out_with.path(), true).unwrap();
        let train = fs::read_to_string(out_with.path().join("train.txt")).unwrap();
        assert!(train.lines().any(|l| l.ends_with("\t-1")));
    }

    #[test]
    fn relation_table_is_sorted_by_descending_count() {
        let mut triples = fixtures::city_graph();
        triples.push(("c", "livesIn", "y"));
        let dataset = dataset(&triples);
        let out = TempDir::new().unwrap();
        export_dataset(&dataset, out.path(), false).unwrap();

        let relations = fs::read_to_string(out.path().join("relations.txt")).unwrap();
        let lines: Vec<&str> = relations.lines().collect();
        assert_eq!(lines[0], "livesIn\t3");
        assert_eq!(lines[1], "bornIn\t1");
    }

    #[test]
    fn entity_table_lists_all_degree_columns() {
        let dataset = dataset(&fixtures::city_graph());
        let out = TempDir::new().unwrap();
        export_dataset(&dataset, out.path(), false).unwrap();

        let entities = fs::read_to_string(out.path().join("entities.txt")).unwrap();
        // x: degree 3 (2 in + 1 out) sorts first.
        assert!(entities.lines().next().is_some_and(|l| l == "x\t3\t1\t2"));
    }

    #[test]
    fn inverse_table_lists_kept_then_removable() {
        let dataset = dataset(&fixtures::mirrored_graph());
        let out = TempDir::new().unwrap();
        export_dataset(&dataset, out.path(), false).unwrap();

        let inverses = fs::read_to_string(out.path().join("inverses.txt")).unwrap();
        assert_eq!(inverses.trim(), "parentOf\tchildOf");
    }

    #[test]
    fn city_graph_detects_no_inverses() {
        let dataset = dataset(&fixtures::city_graph());
        let out = TempDir::new().unwrap();
        export_dataset(&dataset, out.path(), false).unwrap();

        let inverses = fs::read_to_string(out.path().join("inverses.txt")).unwrap();
        assert!(inverses.is_empty());
    }
}
