//! Statement model for the graphfuse fusion pipeline
//!
//! This crate provides the canonical types passed between statement
//! sources, the external-sorting input loader, and the conflict
//! resolver, independent of any RDF serialization format.
//!
//! # Key Design Principles
//!
//! 1. **Expanded IRIs only** - All IRIs are stored in expanded form;
//!    prefix handling belongs to the (out-of-scope) parsers.
//!
//! 2. **One total order** - Statement ordering is the byte order of
//!    the encoded tuple line, so the in-memory sort, the external
//!    chunk sort, and the k-way merge cannot disagree.
//!
//! 3. **Exact round-trips** - `codec` encode/decode round-trips every
//!    statement; a line with the wrong arity is a fatal invariant
//!    violation, not a recoverable parse error.

pub mod codec;
mod description;
mod error;
mod statement;
mod term;

pub use description::ResourceDescription;
pub use error::{Error, Result};
pub use statement::Statement;
pub use term::{escape_literal, BlankId, Term};
