//! GEXF export of one fold for visualisation tools.
//!
//! Emits a GEXF 1.2 document with the fold's train and test edges, positives
//! and negatives alike, carrying `Label`, `positive`, and `train` edge
//! attributes.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use kagome_core::{Dataset, Edge};

use crate::{cli::CliError, escape::escape_markup};

struct EdgeGroup<'a> {
    edges: &'a [Edge],
    positive: bool,
    train: bool,
}

/// Writes `dataset.gexf` for the fold at `fold_index` into `out_dir`.
///
/// Folds outside the generated range are skipped silently, leaving no file.
///
/// # Errors
/// Returns [`CliError::Io`] when the file cannot be written.
pub fn write_gexf(dataset: &Dataset, fold_index: usize, out_dir: &Path) -> Result<(), CliError> {
    let Some(fold) = dataset.folds().get(fold_index) else {
        return Ok(());
    };
    let groups = [
        EdgeGroup {
            edges: fold.train.positives(),
            positive: true,
            train: true,
        },
        EdgeGroup {
            edges: fold.train.negatives(),
            positive: false,
            train: true,
        },
        EdgeGroup {
            edges: fold.test.positives(),
            positive: true,
            train: false,
        },
        EdgeGroup {
            edges: fold.test.negatives(),
            positive: false,
            train: false,
        },
    ];

    let path = out_dir.join("dataset.gexf");
    fs::write(&path, render(&groups)).map_err(|source| CliError::Io { path, source })
}

fn render(groups: &[EdgeGroup<'_>]) -> String {
    let mut entities: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for group in groups {
        for edge in group.edges {
            for endpoint in [edge.source.as_ref(), edge.target.as_ref()] {
                if seen.insert(endpoint) {
                    entities.push(endpoint);
                }
            }
        }
    }

    let mut nodes = String::new();
    for entity in &entities {
        let label = escape_markup(entity);
        let _ = writeln!(nodes, r#"      <node id="{label}" label="{label}"/>"#);
    }

    let mut edges = String::new();
    let mut edge_id = 0_usize;
    for group in groups {
        for edge in group.edges {
            let _ = writeln!(
                edges,
                concat!(
                    "      <edge id=\"{id}\" source=\"{source}\" target=\"{target}\">\n",
                    "        <attvalues>\n",
                    "          <attvalue for=\"0\" value=\"{label}\"/>\n",
                    "          <attvalue for=\"1\" value=\"{positive}\"/>\n",
                    "          <attvalue for=\"2\" value=\"{train}\"/>\n",
                    "        </attvalues>\n",
                    "      </edge>"
                ),
                id = edge_id,
                source = escape_markup(&edge.source),
                target = escape_markup(&edge.target),
                label = escape_markup(&edge.relation),
                positive = group.positive,
                train = group.train,
            );
            edge_id += 1;
        }
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gexf xmlns="http://www.gexf.net/1.2draft" version="1.2">
  <graph defaultedgetype="directed" mode="static">
    <attributes class="edge">
      <attribute id="0" title="Label" type="string"/>
      <attribute id="1" title="positive" type="boolean"/>
      <attribute id="2" title="train" type="boolean"/>
    </attributes>
    <nodes>
{nodes}    </nodes>
    <edges>
{edges}    </edges>
  </graph>
</gexf>
"#
    )
}
