//! Static HTML summary of relation frequencies and entity degrees.
//!
//! The summary reflects the graph right after pruning: detected inverses are
//! always included, whether or not they were removed later.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use kagome_core::Dataset;

use crate::{cli::CliError, escape::escape_markup};

/// Writes `summary.html` into `out_dir`.
///
/// # Errors
/// Returns [`CliError::Io`] when the file cannot be written.
pub fn write_summary(dataset: &Dataset, out_dir: &Path) -> Result<(), CliError> {
    let path = out_dir.join("summary.html");
    fs::write(&path, render(dataset)).map_err(|source| CliError::Io { path, source })
}

fn render(dataset: &Dataset) -> String {
    let mut relations = String::new();
    for kept in &dataset.prune_report().kept {
        let _ = writeln!(
            relations,
            "<tr><td>{}</td><td>{}</td><td>{:.4}</td></tr>",
            escape_markup(&kept.relation),
            kept.count,
            kept.accumulated_fraction
        );
    }

    let mut entities = String::new();
    for (entity, degrees) in dataset.entity_degrees() {
        let _ = writeln!(
            entities,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_markup(&entity),
            degrees.degree,
            degrees.out_degree,
            degrees.in_degree
        );
    }

    let mut inverses = String::new();
    for (kept, removable) in dataset.inverse_pairs() {
        let _ = writeln!(
            inverses,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_markup(kept),
            escape_markup(removable)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>kagome graph summary</title></head>
<body>
<h1>kagome summary</h1>
<h2>Relations</h2>
<table>
<tr><th>Relation name</th><th>Frequency</th><th>Accumulated fraction</th></tr>
{relations}</table>
<h2>Entities</h2>
<table>
<tr><th>Entity name</th><th>Total degree</th><th>Outwards degree</th><th>Inwards degree</th></tr>
{entities}</table>
<h2>Inverse pairs</h2>
<table>
<tr><th>Kept</th><th>Removable</th></tr>
{inverses}</table>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use kagome_core::{GraphSnapshot, GraphSource, GraphSourceError, KagomeBuilder};
    use kagome_test_support::fixtures;

    struct Fixed(GraphSnapshot);

    impl GraphSource for Fixed {
        fn name(&self) -> &str {
            "fixture"
        }

        fn read(&self) -> Result<GraphSnapshot, GraphSourceError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn summary_tables_cover_relations_entities_and_inverses() {
        let dataset = KagomeBuilder::new()
            .with_remove_inverses(true)
            .with_testing_fraction(0.5)
            .build()
            .unwrap()
            .run(&Fixed(GraphSnapshot::from_triples(&fixtures::mirrored_graph())))
            .unwrap();

        let html = render(&dataset);
        // Removed inverses still show up in the summary tables.
        assert!(html.contains("<td>childOf</td>"));
        assert!(html.contains("<td>parentOf</td>"));
        assert!(html.contains("<td>knows</td>"));
        assert!(html.contains("Accumulated fraction"));
    }

    #[test]
    fn labels_are_escaped() {
        let dataset = KagomeBuilder::new()
            .build()
            .unwrap()
            .run(&Fixed(GraphSnapshot::from_triples(&[("<a>", "r&s", "b")])))
            .unwrap();
        let html = render(&dataset);
        assert!(html.contains("&lt;a&gt;"));
        assert!(html.contains("r&amp;s"));
        assert!(!html.contains("<a>"));
    }
}
