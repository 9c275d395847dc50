//! Statement footprint estimation for buffer accounting
//!
//! A cheap, deterministic over-approximation of a statement's in-memory
//! footprint. Only used as a flush heuristic: it need not be exact, but
//! it must grow monotonically with data volume so flush decisions
//! converge.

use graphfuse_ir::{Statement, Term};

/// Fixed per-field overhead (pointers, lengths, enum tags)
pub const FIELD_OVERHEAD_BYTES: usize = 16;

/// Estimated in-memory footprint of one statement in bytes
pub fn estimated_size(statement: &Statement) -> usize {
    term_size(&statement.s)
        + term_size(&statement.p)
        + term_size(&statement.o)
        + statement.g.as_ref().map(term_size).unwrap_or(0)
        + 4 * FIELD_OVERHEAD_BYTES
}

fn term_size(term: &Term) -> usize {
    match term {
        Term::Iri(iri) => iri.len(),
        Term::BlankNode(id) => id.as_str().len(),
        Term::Literal {
            value,
            datatype,
            language,
        } => {
            value.len()
                + datatype.as_ref().map(|d| d.len()).unwrap_or(0)
                + language.as_ref().map(|l| l.len()).unwrap_or(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_deterministic() {
        let st = Statement::new(
            Term::iri("http://ex.org/s"),
            Term::iri("http://ex.org/p"),
            Term::string("value"),
        );
        assert_eq!(estimated_size(&st), estimated_size(&st.clone()));
        assert!(estimated_size(&st) > 4 * FIELD_OVERHEAD_BYTES);
    }

    #[test]
    fn test_estimate_monotonic_with_volume() {
        let small = Statement::new(
            Term::iri("http://ex.org/s"),
            Term::iri("http://ex.org/p"),
            Term::string("v"),
        );
        let large = Statement::new(
            Term::iri("http://ex.org/s"),
            Term::iri("http://ex.org/p"),
            Term::string("a much longer object value than before"),
        );
        assert!(estimated_size(&large) > estimated_size(&small));

        let with_graph = small.in_graph(Term::iri("http://ex.org/g"));
        assert!(estimated_size(&with_graph) > estimated_size(&small));
    }
}
