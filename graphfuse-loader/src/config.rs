//! Loader configuration

use rustc_hash::FxHashSet;
use std::path::PathBuf;

/// Default memory budget for the preprocessing buffer and the
/// external-sort chunks: 64 MB.
pub const DEFAULT_MEMORY_BUDGET_BYTES: usize = 64 * 1024 * 1024;

/// Default upper bound on concurrent sort chunks.
///
/// Keeps the k-way merge well under typical file-descriptor limits.
/// When an input would need more chunks than this, per-chunk memory
/// grows past the nominal budget instead (correctness preserved, memory
/// ceiling exceeded under pathological inputs).
pub const DEFAULT_MAX_SORT_CHUNKS: usize = 1024;

/// Configuration for the external-sorting input loader
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Memory budget in bytes governing buffer flushes during
    /// preprocessing and chunk sizing during the external sort.
    ///
    /// Derived externally from available-memory estimation; larger
    /// budgets produce fewer spill runs and sort chunks.
    /// Default: 64 MB.
    pub memory_budget_bytes: usize,

    /// Maximum number of chunk files the external sort may hold open
    /// at once. Default: 1024.
    pub max_sort_chunks: usize,

    /// Directory for spill and sorted temp files. Must exist and be
    /// writable, sized for roughly 2-3x the raw input volume at peak.
    /// Default: the system temp directory.
    pub temp_dir: PathBuf,

    /// When true, a statement is retained only if its canonicalized
    /// subject has at least one alternative URI under the equivalence
    /// mapping (the relevance filter). Default: false.
    pub output_mapped_only: bool,

    /// Predicates designated as resource-description properties.
    /// Non-empty enables nested-description mode: statements of
    /// resources referenced through these predicates are folded into
    /// the referencing resource's description. Default: empty.
    pub description_properties: FxHashSet<String>,

    /// Suppress byte-identical records at merge time. Canonicalization
    /// makes same-fact lines from different sources identical, so this
    /// collapses cross-source exact duplicates. Default: true.
    pub dedup_identical: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: DEFAULT_MEMORY_BUDGET_BYTES,
            max_sort_chunks: DEFAULT_MAX_SORT_CHUNKS,
            temp_dir: std::env::temp_dir(),
            output_mapped_only: false,
            description_properties: FxHashSet::default(),
            dedup_identical: true,
        }
    }
}

impl LoaderConfig {
    /// Builder method to set the memory budget
    pub fn with_memory_budget_bytes(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = bytes;
        self
    }

    /// Builder method to set the maximum sort chunk count
    pub fn with_max_sort_chunks(mut self, chunks: usize) -> Self {
        self.max_sort_chunks = chunks.max(1);
        self
    }

    /// Builder method to set the temp directory
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    /// Builder method to enable the relevance filter
    pub fn with_output_mapped_only(mut self, enabled: bool) -> Self {
        self.output_mapped_only = enabled;
        self
    }

    /// Builder method to add a resource-description property
    pub fn with_description_property(mut self, predicate_iri: impl Into<String>) -> Self {
        self.description_properties.insert(predicate_iri.into());
        self
    }

    /// Builder method to control merge-time deduplication
    pub fn with_dedup_identical(mut self, enabled: bool) -> Self {
        self.dedup_identical = enabled;
        self
    }

    /// True when nested-description mode is active
    pub fn nested_description_enabled(&self) -> bool {
        !self.description_properties.is_empty()
    }
}
