//! Shared test utilities used across kagome crates.

pub mod fixtures {
    //! Small reference graphs reused across the test suites.
    //!
    //! Each fixture is a plain triple list so callers can feed it to a
    //! snapshot builder, a triples file, or a CLI invocation alike.

    /// Triple type used by every fixture.
    pub type Triple = (&'static str, &'static str, &'static str);

    /// Two relations that share endpoints without mirroring each other.
    ///
    /// `livesIn` and `bornIn` overlap on the entities `a` and `x` but the
    /// edge sets do not fully mirror, so no inverse pair may be detected.
    #[must_use]
    pub fn city_graph() -> Vec<Triple> {
        vec![
            ("a", "livesIn", "x"),
            ("b", "livesIn", "x"),
            ("x", "bornIn", "a"),
        ]
    }

    /// A symmetric relation whose own edges mirror each other.
    ///
    /// `spouseOf` must never be registered as its own inverse.
    #[must_use]
    pub fn symmetric_graph() -> Vec<Triple> {
        vec![("a", "spouseOf", "b"), ("b", "spouseOf", "a")]
    }

    /// A fully mirrored relation pair plus one unrelated relation.
    #[must_use]
    pub fn mirrored_graph() -> Vec<Triple> {
        vec![
            ("a", "parentOf", "b"),
            ("c", "parentOf", "d"),
            ("b", "childOf", "a"),
            ("d", "childOf", "c"),
            ("a", "knows", "c"),
            ("b", "knows", "d"),
        ]
    }

    /// One relation with `n` chained edges `e0→e1→…→en`.
    #[must_use]
    pub fn chain(relation: &'static str, n: usize) -> Vec<(String, &'static str, String)> {
        (0..n)
            .map(|i| (format!("e{i}"), relation, format!("e{}", i + 1)))
            .collect()
    }

    /// Borrowing view of an owned chain, shaped like the static fixtures.
    #[must_use]
    pub fn as_refs<'a>(chain: &'a [(String, &'static str, String)]) -> Vec<(&'a str, &'a str, &'a str)> {
        chain
            .iter()
            .map(|(s, r, t)| (s.as_str(), *r, t.as_str()))
            .collect()
    }
}

pub mod files {
    //! Helpers for materialising triple lists as separated-value files.

    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    /// Writes `triples` to `dir/name` with one `source<sep>relation<sep>target`
    /// record per line.
    ///
    /// # Errors
    /// Returns any [`io::Error`] raised while writing the file.
    pub fn write_triples_file(
        dir: &Path,
        name: &str,
        separator: &str,
        triples: &[(&str, &str, &str)],
    ) -> io::Result<PathBuf> {
        let path = dir.join(name);
        let mut contents = String::new();
        for (source, relation, target) in triples {
            contents.push_str(source);
            contents.push_str(separator);
            contents.push_str(relation);
            contents.push_str(separator);
            contents.push_str(target);
            contents.push('\n');
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// A triples file kept alive by its backing temporary directory.
    #[derive(Debug)]
    pub struct TriplesFixture {
        dir: TempDir,
        path: PathBuf,
    }

    impl TriplesFixture {
        /// Creates a tab-separated triples file in a fresh temp directory.
        ///
        /// # Panics
        /// Panics when the temp directory or file cannot be created; fixture
        /// setup failures should abort the test immediately.
        #[must_use]
        pub fn tab_separated(triples: &[(&str, &str, &str)]) -> Self {
            let dir = match TempDir::new() {
                Ok(dir) => dir,
                Err(err) => panic!("failed to create temp dir: {err}"),
            };
            let path = match write_triples_file(dir.path(), "triples.txt", "\t", triples) {
                Ok(path) => path,
                Err(err) => panic!("failed to write triples file: {err}"),
            };
            Self { dir, path }
        }

        /// Path of the written triples file.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }

        /// Directory holding the file, usable as an output workspace.
        #[must_use]
        pub fn dir(&self) -> &Path {
            self.dir.path()
        }
    }
}

pub mod logging {
    //! Quiet tracing installation for test binaries.

    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    /// Installs a compact stderr subscriber honouring `RUST_LOG`; repeated
    /// calls are no-ops.
    pub fn init_test_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    }
}
