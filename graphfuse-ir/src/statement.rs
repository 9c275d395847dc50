//! Statement - a single RDF quad
//!
//! A statement has four components:
//! - `s`: subject (IRI or blank node)
//! - `p`: predicate (IRI)
//! - `o`: object (any term)
//! - `g`: graph (IRI or blank node), or `None` for statements that have
//!   not yet had a default graph applied
//!
//! Statements are immutable once constructed; the preprocessing stage
//! builds new statements rather than mutating existing ones.
//!
//! ## Ordering
//!
//! The total statement order is the byte order of the encoded tuple
//! line (see the `codec` module): component-wise comparison of the
//! N-Quads tokens for `(s, p, o, g)`, with a missing graph sorting
//! before any present one. Because tab and newline are escaped inside
//! tokens, this is identical to comparing whole spill-file lines as
//! byte strings - the in-memory buffer sort, the chunk sort, and the
//! k-way merge all agree on one ordering, and every statement sharing
//! a subject ends up contiguous in sorted output.

use crate::term::Term;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single RDF quad
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    /// Subject
    pub s: Term,
    /// Predicate
    pub p: Term,
    /// Object
    pub o: Term,
    /// Graph, if explicitly stated
    pub g: Option<Term>,
}

impl Statement {
    /// Create a statement in the (as yet unresolved) default graph
    pub fn new(s: Term, p: Term, o: Term) -> Self {
        Self { s, p, o, g: None }
    }

    /// Create a statement with an explicit graph
    pub fn with_graph(s: Term, p: Term, o: Term, g: Term) -> Self {
        Self { s, p, o, g: Some(g) }
    }

    /// The subject term
    pub fn subject(&self) -> &Term {
        &self.s
    }

    /// The predicate term
    pub fn predicate(&self) -> &Term {
        &self.p
    }

    /// The object term
    pub fn object(&self) -> &Term {
        &self.o
    }

    /// The graph term, if any
    pub fn graph(&self) -> Option<&Term> {
        self.g.as_ref()
    }

    /// Copy of this statement placed in `graph`, used when applying a
    /// source's default context
    pub fn in_graph(&self, graph: Term) -> Self {
        Self {
            s: self.s.clone(),
            p: self.p.clone(),
            o: self.o.clone(),
            g: Some(graph),
        }
    }
}

impl PartialOrd for Statement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Statement {
    fn cmp(&self, other: &Self) -> Ordering {
        self.s
            .cmp_encoded(&other.s)
            .then_with(|| self.p.cmp_encoded(&other.p))
            .then_with(|| self.o.cmp_encoded(&other.o))
            .then_with(|| match (&self.g, &other.g) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp_encoded(b),
            })
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.s, self.p, self.o)?;
        if let Some(g) = &self.g {
            write!(f, " {}", g)?;
        }
        write!(f, " .")
    }
}
