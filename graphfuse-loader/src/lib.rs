//! External-sorting input loader for graph fusion
//!
//! Fusing RDF data from many sources needs every statement about the
//! same real-world entity brought together, even when the sources name
//! that entity with different URIs and the combined volume exceeds
//! memory. This crate does exactly that, in four stages:
//!
//! 1. **Preprocess**: stream each source's statements, rewrite URIs to
//!    canonical representatives via the `owl:sameAs` equivalence
//!    mapping, and spill memory-bounded sorted runs to disk
//!    ([`preprocess`]).
//! 2. **External sort**: chunk, sort, and k-way merge the spill into
//!    one file in total statement order, collapsing exact duplicates
//!    ([`extsort`]).
//! 3. **Nested description** (optional): statements about resources
//!    referenced through designated description properties are folded
//!    into the referencing resource's group via a sorted merge join
//!    ([`merge_join`]).
//! 4. **Cursor**: serve the result as per-subject
//!    [`ResourceDescription`](graphfuse_ir::ResourceDescription) groups
//!    through the forward-only [`QuadLoader`] protocol ([`loader`]).
//!
//! # Example
//!
//! ```no_run
//! use graphfuse_loader::{
//!     ExternalSortLoader, LoaderConfig, MemoryMapping, QuadLoader, VecSource,
//! };
//!
//! # fn main() -> graphfuse_loader::Result<()> {
//! let mapping = MemoryMapping::from_pairs(vec![(
//!     "http://other.org/Berlin".into(),
//!     "http://ex.org/Berlin".into(),
//! )]);
//! let sources = vec![Box::new(VecSource::new("mem", vec![])) as _];
//!
//! let mut loader = ExternalSortLoader::new(LoaderConfig::default(), sources);
//! loader.initialize(&mapping)?;
//! while loader.has_next()? {
//!     let description = loader.next_quads()?;
//!     println!("{} statements about {}", description.len(), description.resource());
//! }
//! loader.close();
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod cursor;
pub mod error;
pub mod extsort;
pub mod loader;
pub mod mapping;
pub mod merge_join;
pub mod preprocess;
pub mod size;
pub mod source;

mod temp;

pub use config::{LoaderConfig, DEFAULT_MAX_SORT_CHUNKS, DEFAULT_MEMORY_BUDGET_BYTES};
pub use error::{LoaderError, Result};
pub use loader::{ExternalSortLoader, LoaderStats, QuadLoader};
pub use mapping::{canonicalize_term, MemoryMapping, NoMapping, SameAsMapping};
pub use source::{QuadFileSource, StatementSource, StatementStream, VecSource};
