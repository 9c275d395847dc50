//! Preprocessing stream handler
//!
//! Consumes one source's raw statement stream and turns it into
//! canonicalized, partially pre-sorted external runs:
//!
//! 1. Rewrite subject/predicate/object/graph through the URI
//!    equivalence mapping; default a missing graph from the active
//!    source's default context.
//! 2. Optionally drop statements whose canonical subject has no
//!    alternative URIs (the relevance filter).
//! 3. Accumulate into the sort buffer; when the memory budget would be
//!    exceeded, sort the buffer and hand it to the sink as one run.
//!
//! Pre-sorting runs is purely a performance aid for the subsequent
//! external sort: concatenating all runs and sorting externally yields
//! the same multiset either way.

use crate::buffer::SortBuffer;
use crate::error::{stage, LoaderError, Result};
use crate::mapping::{canonicalize_term, SameAsMapping};
use crate::size::estimated_size;
use graphfuse_ir::{codec, Statement, Term};
use rustc_hash::FxHashSet;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Receiver of sorted statement runs
///
/// One call per flush; statements within a run arrive in the total
/// statement order.
pub trait RunSink {
    /// Receive one sorted run
    fn write_run(&mut self, run: &[Statement]) -> Result<()>;
}

/// Counters reported by a finished preprocessor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessStats {
    /// Statements received from sources
    pub statements_read: u64,
    /// Statements dropped by the relevance filter
    pub statements_dropped: u64,
    /// Sorted runs handed to the sink
    pub runs_flushed: u32,
}

/// Stream handler that canonicalizes, filters, buffers, and spills
pub struct Preprocessor<'a, S: RunSink> {
    mapping: &'a dyn SameAsMapping,
    sink: S,
    buffer: SortBuffer,
    running_bytes: usize,
    budget_bytes: usize,
    filter_unmapped: bool,
    default_graph: Option<Term>,
    stats: PreprocessStats,
}

impl<'a, S: RunSink> Preprocessor<'a, S> {
    /// Create a handler spilling through `sink`
    pub fn new(
        mapping: &'a dyn SameAsMapping,
        sink: S,
        budget_bytes: usize,
        filter_unmapped: bool,
    ) -> Self {
        Self {
            mapping,
            sink,
            buffer: SortBuffer::new(),
            running_bytes: 0,
            budget_bytes,
            filter_unmapped,
            default_graph: None,
            stats: PreprocessStats::default(),
        }
    }

    /// Reset buffer and byte accounting; call at the start of each
    /// source's stream
    pub fn on_start(&mut self) {
        self.buffer.clear();
        self.running_bytes = 0;
    }

    /// Set the graph applied to statements that carry none; callable
    /// between sources
    pub fn set_default_graph(&mut self, graph: Option<Term>) {
        self.default_graph = graph;
    }

    /// Handle one incoming statement
    pub fn on_statement(&mut self, statement: Statement) -> Result<()> {
        self.stats.statements_read += 1;

        let mapped = self.map_statement(&statement);

        if self.filter_unmapped && !self.subject_has_alternatives(&mapped) {
            self.stats.statements_dropped += 1;
            return Ok(());
        }

        let estimate = estimated_size(&mapped);
        if self.running_bytes + estimate > self.budget_bytes && !self.buffer.is_empty() {
            self.flush()?;
        }

        self.buffer.push(mapped);
        self.running_bytes += estimate;
        Ok(())
    }

    /// Final flush; call at the end of each source's stream
    pub fn on_end(&mut self) -> Result<()> {
        self.flush()
    }

    /// Finish preprocessing, yielding the sink and the counters
    pub fn finish(mut self) -> Result<(S, PreprocessStats)> {
        self.flush()?;
        Ok((self.sink, self.stats))
    }

    /// Counters so far
    pub fn stats(&self) -> PreprocessStats {
        self.stats
    }

    fn map_statement(&self, statement: &Statement) -> Statement {
        let graph = statement
            .g
            .as_ref()
            .or(self.default_graph.as_ref())
            .map(|g| canonicalize_term(self.mapping, g));
        Statement {
            s: canonicalize_term(self.mapping, &statement.s),
            p: canonicalize_term(self.mapping, &statement.p),
            o: canonicalize_term(self.mapping, &statement.o),
            g: graph,
        }
    }

    fn subject_has_alternatives(&self, mapped: &Statement) -> bool {
        mapped
            .s
            .as_iri()
            .map(|iri| self.mapping.has_alternatives(iri))
            .unwrap_or(false)
    }

    /// Sort the buffer, move it out as one run, reset accounting
    fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        self.buffer.sort_in_place();
        let run = self.buffer.take();
        self.sink.write_run(&run)?;
        self.stats.runs_flushed += 1;
        self.running_bytes = 0;
        tracing::debug!(statements = run.len(), "flushed sorted run");
        Ok(())
    }
}

/// Run sink appending encoded tuple lines to the primary spill file
///
/// In nested-description mode it additionally writes an
/// `(object, subject)` index record to the secondary spill file for
/// every statement whose predicate is a designated resource-description
/// property and whose object can appear in subject position.
pub struct SpillFileSink {
    primary: BufWriter<std::fs::File>,
    primary_bytes: u64,
    secondary: Option<BufWriter<std::fs::File>>,
    secondary_bytes: u64,
    description_properties: FxHashSet<String>,
}

impl SpillFileSink {
    /// Create spill files at the given paths
    pub fn create(
        primary_path: &Path,
        secondary_path: Option<&Path>,
        description_properties: FxHashSet<String>,
    ) -> Result<Self> {
        let primary = BufWriter::new(
            std::fs::File::create(primary_path)
                .map_err(|e| LoaderError::temp(stage::PREPROCESS, e))?,
        );
        let secondary = match secondary_path {
            Some(path) => Some(BufWriter::new(
                std::fs::File::create(path)
                    .map_err(|e| LoaderError::temp(stage::PREPROCESS, e))?,
            )),
            None => None,
        };
        Ok(Self {
            primary,
            primary_bytes: 0,
            secondary,
            secondary_bytes: 0,
            description_properties,
        })
    }

    /// Bytes written to the primary spill file so far
    pub fn primary_bytes(&self) -> u64 {
        self.primary_bytes
    }

    /// Bytes written to the secondary spill file so far
    pub fn secondary_bytes(&self) -> u64 {
        self.secondary_bytes
    }

    /// Flush both writers
    pub fn finish(mut self) -> Result<(u64, u64)> {
        self.primary
            .flush()
            .map_err(|e| LoaderError::temp(stage::PREPROCESS, e))?;
        if let Some(secondary) = &mut self.secondary {
            secondary
                .flush()
                .map_err(|e| LoaderError::temp(stage::PREPROCESS, e))?;
        }
        Ok((self.primary_bytes, self.secondary_bytes))
    }

    fn is_description_property(&self, predicate: &Term) -> bool {
        predicate
            .as_iri()
            .map(|iri| self.description_properties.contains(iri))
            .unwrap_or(false)
    }
}

impl RunSink for SpillFileSink {
    fn write_run(&mut self, run: &[Statement]) -> Result<()> {
        for statement in run {
            let line = codec::encode_statement(statement);
            self.primary
                .write_all(line.as_bytes())
                .and_then(|_| self.primary.write_all(b"\n"))
                .map_err(|e| LoaderError::temp(stage::PREPROCESS, e))?;
            self.primary_bytes += line.len() as u64 + 1;

            if statement.o.is_resource() && self.is_description_property(&statement.p) {
                if let Some(secondary) = &mut self.secondary {
                    let index_line = codec::encode_index_pair(&statement.o, &statement.s);
                    secondary
                        .write_all(index_line.as_bytes())
                        .and_then(|_| secondary.write_all(b"\n"))
                        .map_err(|e| LoaderError::temp(stage::PREPROCESS, e))?;
                    self.secondary_bytes += index_line.len() as u64 + 1;
                }
            }
        }
        Ok(())
    }
}

/// Paths for a spill-file pair
pub(crate) fn spill_paths(dir: &Path, nested: bool) -> (PathBuf, Option<PathBuf>) {
    let primary = crate::temp::fresh_path(dir, "spill");
    let secondary = nested.then(|| crate::temp::fresh_path(dir, "index"));
    (primary, secondary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{MemoryMapping, NoMapping};

    /// Sink recording each run as a separate batch
    #[derive(Default)]
    struct MockSink {
        batches: Vec<Vec<Statement>>,
    }

    impl RunSink for MockSink {
        fn write_run(&mut self, run: &[Statement]) -> Result<()> {
            self.batches.push(run.to_vec());
            Ok(())
        }
    }

    fn st(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(Term::iri(s), Term::iri(p), Term::iri(o))
    }

    #[test]
    fn test_canonicalizes_all_positions() {
        let mapping = MemoryMapping::from_pairs(vec![
            ("http://ex.org/sa".into(), "http://ex.org/sx".into()),
            ("http://ex.org/pa".into(), "http://ex.org/px".into()),
            ("http://ex.org/oa".into(), "http://ex.org/ox".into()),
            ("http://ex.org/ga".into(), "http://ex.org/gx".into()),
        ]);
        let mut pre = Preprocessor::new(&mapping, MockSink::default(), 1 << 20, false);
        pre.on_start();
        pre.on_statement(
            st("http://ex.org/sa", "http://ex.org/pa", "http://ex.org/oa")
                .in_graph(Term::iri("http://ex.org/ga")),
        )
        .unwrap();
        let (sink, stats) = pre.finish().unwrap();

        assert_eq!(stats.statements_read, 1);
        let run = &sink.batches[0];
        assert_eq!(
            run[0],
            st("http://ex.org/sx", "http://ex.org/px", "http://ex.org/ox")
                .in_graph(Term::iri("http://ex.org/gx"))
        );
    }

    #[test]
    fn test_default_graph_applied_and_mapped() {
        let mapping = MemoryMapping::from_pairs(vec![(
            "http://ex.org/ga".into(),
            "http://ex.org/gx".into(),
        )]);
        let mut pre = Preprocessor::new(&mapping, MockSink::default(), 1 << 20, false);
        pre.set_default_graph(Some(Term::iri("http://ex.org/ga")));
        pre.on_start();
        pre.on_statement(st("http://ex.org/s", "http://ex.org/p", "http://ex.org/o"))
            .unwrap();
        let (sink, _) = pre.finish().unwrap();
        assert_eq!(
            sink.batches[0][0].graph().and_then(Term::as_iri),
            Some("http://ex.org/gx")
        );
    }

    #[test]
    fn test_relevance_filter_drops_unmapped_subjects() {
        let mapping = MemoryMapping::from_pairs(vec![(
            "http://ex.org/alias".into(),
            "http://ex.org/canon".into(),
        )]);
        let mut pre = Preprocessor::new(&mapping, MockSink::default(), 1 << 20, true);
        pre.on_start();
        // Mapped subject survives (arrives as alias)
        pre.on_statement(st("http://ex.org/alias", "http://ex.org/p", "http://ex.org/o"))
            .unwrap();
        // Unmapped subject dropped silently
        pre.on_statement(st("http://ex.org/lonely", "http://ex.org/p", "http://ex.org/o"))
            .unwrap();
        let (sink, stats) = pre.finish().unwrap();

        assert_eq!(stats.statements_read, 2);
        assert_eq!(stats.statements_dropped, 1);
        let all: Vec<&Statement> = sink.batches.iter().flatten().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].s, Term::iri("http://ex.org/canon"));
    }

    #[test]
    fn test_tiny_budget_flushes_in_batches() {
        // Budget fits one statement: three appends force at least two
        // flushes before the final one, yet no statement is lost.
        let one = st("http://ex.org/c", "http://ex.org/p", "http://ex.org/o");
        let budget = estimated_size(&one);

        let mut pre = Preprocessor::new(&NoMapping, MockSink::default(), budget, false);
        pre.on_start();
        pre.on_statement(st("http://ex.org/c", "http://ex.org/p", "http://ex.org/o"))
            .unwrap();
        pre.on_statement(st("http://ex.org/a", "http://ex.org/p", "http://ex.org/o"))
            .unwrap();
        pre.on_statement(st("http://ex.org/b", "http://ex.org/p", "http://ex.org/o"))
            .unwrap();
        pre.on_end().unwrap();
        let (sink, stats) = pre.finish().unwrap();

        assert!(sink.batches.len() >= 2, "expected multiple batches, got {}", sink.batches.len());
        assert_eq!(stats.runs_flushed as usize, sink.batches.len());
        let total: usize = sink.batches.iter().map(Vec::len).sum();
        assert_eq!(total, 3);

        // Each run is internally sorted
        for batch in &sink.batches {
            assert!(batch.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_spill_file_sink_secondary_index() {
        let dir = std::env::temp_dir().join("graphfuse_test_spill_sink");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let primary = dir.join("primary.spill");
        let secondary = dir.join("secondary.spill");

        let mut props = FxHashSet::default();
        props.insert("http://ex.org/address".to_string());
        let mut sink = SpillFileSink::create(&primary, Some(&secondary), props).unwrap();

        let run = vec![
            st("http://ex.org/s", "http://ex.org/p", "http://ex.org/o"),
            st("http://ex.org/s", "http://ex.org/address", "http://ex.org/addr1"),
            // Literal object: no index record even for a description property
            Statement::new(
                Term::iri("http://ex.org/s"),
                Term::iri("http://ex.org/address"),
                Term::string("not a resource"),
            ),
        ];
        sink.write_run(&run).unwrap();
        let (primary_bytes, secondary_bytes) = sink.finish().unwrap();
        assert!(primary_bytes > 0);
        assert!(secondary_bytes > 0);

        let primary_lines = std::fs::read_to_string(&primary).unwrap();
        assert_eq!(primary_lines.lines().count(), 3);

        let secondary_lines = std::fs::read_to_string(&secondary).unwrap();
        let lines: Vec<&str> = secondary_lines.lines().collect();
        assert_eq!(lines.len(), 1);
        let (object, subject) = codec::decode_index_pair(lines[0]).unwrap();
        assert_eq!(object, Term::iri("http://ex.org/addr1"));
        assert_eq!(subject, Term::iri("http://ex.org/s"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
