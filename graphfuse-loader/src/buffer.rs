//! Memory-bounded sortable statement buffer
//!
//! An implementation detail of the preprocessing stream handler:
//! statements accumulate here until the memory budget is hit, are
//! sorted in place by the total statement order, and are then moved out
//! wholesale as one run. The move-out ([`SortBuffer::take`]) replaces
//! the buffer atomically - no aliasing across the flush boundary.

use graphfuse_ir::{codec, Statement};

/// Growable in-memory statement buffer with in-place sort
#[derive(Debug, Default)]
pub struct SortBuffer {
    items: Vec<Statement>,
}

impl SortBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a statement (amortized O(1), capacity doubles on growth)
    pub fn push(&mut self, statement: Statement) {
        self.items.push(statement);
    }

    /// Number of buffered statements
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sort in place by the total statement order (encoded-line byte
    /// order, so runs merge correctly with externally sorted chunks)
    pub fn sort_in_place(&mut self) {
        self.items
            .sort_by_cached_key(|st| codec::encode_statement(st));
    }

    /// Move the buffered statements out, leaving an empty buffer
    pub fn take(&mut self) -> Vec<Statement> {
        std::mem::take(&mut self.items)
    }

    /// Read-only view of the buffered statements
    pub fn as_slice(&self) -> &[Statement] {
        &self.items
    }

    /// Drop all buffered statements
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
