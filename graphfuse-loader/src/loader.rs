//! Fusion input loader
//!
//! [`ExternalSortLoader`] drives the whole pipeline: preprocess every
//! source through the URI equivalence mapping into spill files,
//! external-sort the spill, optionally join and re-sort the secondary
//! index for nested resource description, then serve the sorted
//! statements as per-subject groups through a forward-only cursor.
//!
//! The loader is single-pass: `initialize` runs the batch phases,
//! `next_quads` streams groups in canonical subject order, `close`
//! releases the temp files. Calls outside that protocol fail with
//! [`LoaderError::IllegalState`].

use crate::config::LoaderConfig;
use crate::cursor::LineCursor;
use crate::error::{stage, LoaderError, Result};
use crate::extsort::ExternalSorter;
use crate::mapping::SameAsMapping;
use crate::merge_join::merge_join_files;
use crate::preprocess::{spill_paths, Preprocessor, SpillFileSink};
use crate::source::StatementSource;
use crate::temp;
use graphfuse_ir::{codec, ResourceDescription, Statement, Term};
use std::path::PathBuf;

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Statements received from all sources
    pub statements_read: u64,
    /// Statements dropped by the relevance filter
    pub statements_dropped: u64,
    /// Sorted runs spilled during preprocessing
    pub runs_flushed: u32,
    /// Resource descriptions served so far
    pub groups_emitted: u64,
}

/// Grouped, canonicalized statement access for the fusion engine
pub trait QuadLoader {
    /// Run the batch phases; must be called exactly once, first
    fn initialize(&mut self, mapping: &dyn SameAsMapping) -> Result<()>;

    /// True while at least one more description remains
    fn has_next(&mut self) -> Result<bool>;

    /// The next resource description in canonical subject order
    fn next_quads(&mut self) -> Result<ResourceDescription>;

    /// Feed back statements resolved downstream; a batch loader has
    /// nothing to do with them
    fn update_with_resolved_statements(&mut self, statements: &[Statement]) -> Result<()>;

    /// Release temp files; idempotent, safe in any state
    fn close(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Uninitialized,
    Ready,
    Closed,
}

/// External-sorting implementation of [`QuadLoader`]
pub struct ExternalSortLoader {
    config: LoaderConfig,
    sources: Vec<Box<dyn StatementSource>>,
    state: State,
    primary: Option<LineCursor>,
    dependents: Option<LineCursor>,
    temp_files: Vec<PathBuf>,
    stats: LoaderStats,
}

impl ExternalSortLoader {
    /// Create a loader over `sources` with the given configuration
    pub fn new(config: LoaderConfig, sources: Vec<Box<dyn StatementSource>>) -> Self {
        Self {
            config,
            sources,
            state: State::Uninitialized,
            primary: None,
            dependents: None,
            temp_files: Vec::new(),
            stats: LoaderStats::default(),
        }
    }

    /// Counters for this run
    pub fn stats(&self) -> LoaderStats {
        self.stats
    }

    /// Preprocess, sort, join, and open the cursors
    fn build_pipeline(&mut self, mapping: &dyn SameAsMapping) -> Result<()> {
        let nested = self.config.nested_description_enabled();
        let (primary_spill, secondary_spill) = spill_paths(&self.config.temp_dir, nested);
        self.temp_files.push(primary_spill.clone());
        if let Some(path) = &secondary_spill {
            self.temp_files.push(path.clone());
        }

        let sink = SpillFileSink::create(
            &primary_spill,
            secondary_spill.as_deref(),
            self.config.description_properties.clone(),
        )?;
        let mut pre = Preprocessor::new(
            mapping,
            sink,
            self.config.memory_budget_bytes,
            self.config.output_mapped_only,
        );

        for source in &mut self.sources {
            let span = tracing::debug_span!("preprocess", source = source.name());
            let _guard = span.enter();
            pre.set_default_graph(source.default_graph());
            pre.on_start();
            for statement in source.open()? {
                pre.on_statement(statement?)?;
            }
            pre.on_end()?;
        }

        let (sink, pre_stats) = pre.finish()?;
        self.stats.statements_read = pre_stats.statements_read;
        self.stats.statements_dropped = pre_stats.statements_dropped;
        self.stats.runs_flushed = pre_stats.runs_flushed;
        let (primary_bytes, secondary_bytes) = sink.finish()?;

        let sorter = ExternalSorter::from_config(&self.config);
        let primary_sorted = sorter.sort_file(&primary_spill, primary_bytes)?;
        self.temp_files.push(primary_sorted.clone());

        if let Some(secondary_spill) = secondary_spill {
            let secondary_sorted = sorter.sort_file(&secondary_spill, secondary_bytes)?;
            self.temp_files.push(secondary_sorted.clone());

            let joined = merge_join_files(&primary_sorted, &secondary_sorted, &self.config.temp_dir)?;
            self.temp_files.push(joined.clone());
            temp::remove_quietly(&secondary_sorted, "sorted index");

            let joined_bytes = std::fs::metadata(&joined)
                .map_err(|e| LoaderError::temp(stage::SECONDARY_JOIN, e))?
                .len();
            let dependents_sorted = sorter.sort_file(&joined, joined_bytes)?;
            self.temp_files.push(dependents_sorted.clone());

            self.dependents = Some(
                LineCursor::open(&dependents_sorted)
                    .map_err(|e| LoaderError::temp(stage::CURSOR, e))?,
            );
        }

        self.primary = Some(
            LineCursor::open(&primary_sorted).map_err(|e| LoaderError::temp(stage::CURSOR, e))?,
        );

        tracing::info!(
            statements_read = self.stats.statements_read,
            statements_dropped = self.stats.statements_dropped,
            runs_flushed = self.stats.runs_flushed,
            nested,
            "loader initialized"
        );
        Ok(())
    }

    /// Append dependent statements owned by `key` to `description`
    fn drain_dependents(&mut self, key: &str, description: &mut ResourceDescription) -> Result<()> {
        let Some(dep) = self.dependents.as_mut() else {
            return Ok(());
        };
        // Owners absent from the primary file can only occur if the
        // relevance filter dropped them; skip their entries
        while let Some(owner) = dep.key() {
            if owner >= key {
                break;
            }
            dep.advance().map_err(|e| LoaderError::temp(stage::CURSOR, e))?;
        }
        while dep.key() == Some(key) {
            let line = dep
                .advance()
                .map_err(|e| LoaderError::temp(stage::CURSOR, e))?
                .unwrap_or_default();
            let (_, statement) = codec::decode_owned_statement(&line)?;
            description.push(statement);
        }
        Ok(())
    }
}

impl QuadLoader for ExternalSortLoader {
    fn initialize(&mut self, mapping: &dyn SameAsMapping) -> Result<()> {
        if self.state != State::Uninitialized {
            return Err(LoaderError::IllegalState("initialize called twice"));
        }
        match self.build_pipeline(mapping) {
            Ok(()) => {
                self.state = State::Ready;
                Ok(())
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    fn has_next(&mut self) -> Result<bool> {
        match self.state {
            State::Ready => Ok(self
                .primary
                .as_ref()
                .map(|c| !c.is_exhausted())
                .unwrap_or(false)),
            State::Uninitialized => Err(LoaderError::IllegalState("loader not initialized")),
            State::Closed => Err(LoaderError::IllegalState("loader closed")),
        }
    }

    fn next_quads(&mut self) -> Result<ResourceDescription> {
        if self.state != State::Ready {
            return Err(LoaderError::IllegalState("loader not ready"));
        }
        let primary = self
            .primary
            .as_mut()
            .ok_or(LoaderError::IllegalState("loader not ready"))?;
        let Some(key) = primary.key().map(str::to_string) else {
            return Err(LoaderError::IllegalState("cursor exhausted"));
        };

        let resource: Term = key.parse()?;
        let mut description = ResourceDescription::new(resource);
        while primary.key() == Some(key.as_str()) {
            let line = primary
                .advance()
                .map_err(|e| LoaderError::temp(stage::CURSOR, e))?
                .unwrap_or_default();
            description.push(codec::decode_statement(&line)?);
        }

        self.drain_dependents(&key, &mut description)?;

        self.stats.groups_emitted += 1;
        Ok(description)
    }

    fn update_with_resolved_statements(&mut self, _statements: &[Statement]) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) {
        if self.state == State::Closed {
            return;
        }
        self.primary = None;
        self.dependents = None;
        for path in self.temp_files.drain(..) {
            temp::remove_quietly(&path, "loader temp file");
        }
        self.state = State::Closed;
        tracing::debug!(groups_emitted = self.stats.groups_emitted, "loader closed");
    }
}

impl Drop for ExternalSortLoader {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::NoMapping;
    use crate::source::VecSource;

    fn scratch_config(name: &str) -> LoaderConfig {
        let dir = std::env::temp_dir().join(format!("graphfuse_test_loader_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        LoaderConfig::default().with_temp_dir(dir)
    }

    fn st(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(Term::iri(s), Term::iri(p), Term::iri(o))
    }

    #[test]
    fn test_protocol_violations() {
        let config = scratch_config("protocol");
        let dir = config.temp_dir.clone();
        let mut loader = ExternalSortLoader::new(config, vec![]);

        assert!(matches!(
            loader.has_next(),
            Err(LoaderError::IllegalState(_))
        ));
        assert!(matches!(
            loader.next_quads(),
            Err(LoaderError::IllegalState(_))
        ));

        loader.initialize(&NoMapping).unwrap();
        assert!(matches!(
            loader.initialize(&NoMapping),
            Err(LoaderError::IllegalState(_))
        ));
        assert!(!loader.has_next().unwrap());
        // Empty input: next_quads past exhaustion is a protocol error
        assert!(matches!(
            loader.next_quads(),
            Err(LoaderError::IllegalState(_))
        ));

        loader.close();
        loader.close();
        assert!(matches!(
            loader.has_next(),
            Err(LoaderError::IllegalState(_))
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_close_removes_temp_files() {
        let config = scratch_config("cleanup");
        let dir = config.temp_dir.clone();
        let sources: Vec<Box<dyn StatementSource>> = vec![Box::new(VecSource::new(
            "mem",
            vec![st("http://ex.org/s", "http://ex.org/p", "http://ex.org/o")],
        ))];

        let mut loader = ExternalSortLoader::new(config, sources);
        loader.initialize(&NoMapping).unwrap();
        assert!(loader.has_next().unwrap());
        loader.close();

        let leftover: Vec<_> = std::fs::read_dir(&dir).unwrap().collect();
        assert!(leftover.is_empty(), "temp files leaked: {leftover:?}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_update_with_resolved_statements_is_noop() {
        let config = scratch_config("noop");
        let dir = config.temp_dir.clone();
        let mut loader = ExternalSortLoader::new(config, vec![]);
        loader.initialize(&NoMapping).unwrap();
        loader
            .update_with_resolved_statements(&[st(
                "http://ex.org/s",
                "http://ex.org/p",
                "http://ex.org/o",
            )])
            .unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }
}
