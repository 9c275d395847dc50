//! Line-oriented tuple codec for spill files
//!
//! Spill and sorted temp files store one record per line, fields
//! tab-separated, each field an N-Quads term token. Three arities are
//! used by the pipeline:
//!
//! - 4-tuple `(s, p, o, g)` - the primary statement stream (an empty
//!   fourth field means "default graph not yet applied")
//! - 2-tuple `(object, subject)` - the secondary resource-description
//!   index
//! - 5-tuple `(owner, s, p, o, g)` - the merged nested-description
//!   stream, prefixed with the owning subject
//!
//! Because tab and newline are escaped inside tokens, comparing whole
//! lines as byte strings equals comparing field tokens left to right -
//! the external sort sorts raw lines and still groups by first field.
//!
//! A decoded line with the wrong field count is an internal invariant
//! violation (writer and reader disagree on arity) and is fatal.

use crate::error::{Error, Result};
use crate::statement::Statement;
use crate::term::Term;

/// Field separator within a tuple line
pub const FIELD_SEP: char = '\t';

/// Encode a statement as a 4-tuple line (no trailing newline)
pub fn encode_statement(st: &Statement) -> String {
    let mut line = String::new();
    push_field(&mut line, &st.s);
    line.push(FIELD_SEP);
    push_field(&mut line, &st.p);
    line.push(FIELD_SEP);
    push_field(&mut line, &st.o);
    line.push(FIELD_SEP);
    if let Some(g) = &st.g {
        push_field(&mut line, g);
    }
    line
}

/// Decode a 4-tuple line back into a statement
pub fn decode_statement(line: &str) -> Result<Statement> {
    let fields = split_fields(line, 4)?;
    Ok(Statement {
        s: Term::parse(fields[0])?,
        p: Term::parse(fields[1])?,
        o: Term::parse(fields[2])?,
        g: if fields[3].is_empty() {
            None
        } else {
            Some(Term::parse(fields[3])?)
        },
    })
}

/// Encode a secondary-index record: `(object, subject)`
///
/// Keyed on the object so that, once sorted, all subjects pointing at
/// the same described resource are contiguous.
pub fn encode_index_pair(object: &Term, subject: &Term) -> String {
    let mut line = String::new();
    push_field(&mut line, object);
    line.push(FIELD_SEP);
    push_field(&mut line, subject);
    line
}

/// Decode a secondary-index record into `(object, subject)`
pub fn decode_index_pair(line: &str) -> Result<(Term, Term)> {
    let fields = split_fields(line, 2)?;
    Ok((Term::parse(fields[0])?, Term::parse(fields[1])?))
}

/// Encode a merged nested-description record: the owning subject
/// followed by the dependent resource's statement
pub fn encode_owned_statement(owner: &Term, st: &Statement) -> String {
    let mut line = String::new();
    push_field(&mut line, owner);
    line.push(FIELD_SEP);
    line.push_str(&encode_statement(st));
    line
}

/// Decode a merged nested-description record into `(owner, statement)`
pub fn decode_owned_statement(line: &str) -> Result<(Term, Statement)> {
    let fields = split_fields(line, 5)?;
    let owner = Term::parse(fields[0])?;
    let st = Statement {
        s: Term::parse(fields[1])?,
        p: Term::parse(fields[2])?,
        o: Term::parse(fields[3])?,
        g: if fields[4].is_empty() {
            None
        } else {
            Some(Term::parse(fields[4])?)
        },
    };
    Ok((owner, st))
}

/// First field of a tuple line, without decoding the rest
///
/// Both cursors group and join on this key. For a 4-tuple line this is
/// the subject token; for 2- and 5-tuple lines it is the join key.
pub fn line_key(line: &str) -> &str {
    match line.find(FIELD_SEP) {
        Some(i) => &line[..i],
        None => line,
    }
}

/// Split a line into exactly `arity` fields
fn split_fields(line: &str, arity: usize) -> Result<Vec<&str>> {
    let fields: Vec<&str> = line.split(FIELD_SEP).collect();
    if fields.len() != arity {
        return Err(Error::TupleArity {
            expected: arity,
            found: fields.len(),
        });
    }
    Ok(fields)
}

fn push_field(line: &mut String, term: &Term) {
    use std::fmt::Write;
    // Writing to a String cannot fail.
    let _ = write!(line, "{}", term);
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphfuse_vocab::xsd;

    fn sample() -> Statement {
        Statement::with_graph(
            Term::iri("http://ex.org/s"),
            Term::iri("http://ex.org/p"),
            Term::lang_string("hi there", "en"),
            Term::iri("http://ex.org/g"),
        )
    }

    #[test]
    fn test_statement_round_trip() {
        let st = sample();
        let line = encode_statement(&st);
        assert_eq!(decode_statement(&line).unwrap(), st);
    }

    #[test]
    fn test_statement_round_trip_default_graph() {
        let st = Statement::new(
            Term::iri("http://ex.org/s"),
            Term::iri("http://ex.org/p"),
            Term::typed("1", xsd::INTEGER),
        );
        let line = encode_statement(&st);
        // Always four fields, even with no graph
        assert_eq!(line.matches(FIELD_SEP).count(), 3);
        assert_eq!(decode_statement(&line).unwrap(), st);
    }

    #[test]
    fn test_escaped_separator_round_trip() {
        let st = Statement::new(
            Term::iri("http://ex.org/s"),
            Term::iri("http://ex.org/p"),
            Term::string("tab\there\nand newline"),
        );
        let line = encode_statement(&st);
        assert_eq!(line.matches(FIELD_SEP).count(), 3, "separators must be escaped");
        assert!(!line.contains('\n'));
        assert_eq!(decode_statement(&line).unwrap(), st);
    }

    #[test]
    fn test_index_pair_round_trip() {
        let object = Term::iri("http://ex.org/dependent");
        let subject = Term::iri("http://ex.org/owner");
        let line = encode_index_pair(&object, &subject);
        assert_eq!(decode_index_pair(&line).unwrap(), (object, subject));
    }

    #[test]
    fn test_owned_statement_round_trip() {
        let owner = Term::iri("http://ex.org/owner");
        let st = sample();
        let line = encode_owned_statement(&owner, &st);
        assert_eq!(decode_owned_statement(&line).unwrap(), (owner, st));
    }

    #[test]
    fn test_wrong_arity_is_fatal() {
        let err = decode_statement("<http://a>\t<http://b>").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::TupleArity {
                expected: 4,
                found: 2
            }
        ));
        assert!(decode_index_pair(&encode_statement(&sample())).is_err());
    }

    #[test]
    fn test_line_key() {
        let line = encode_statement(&sample());
        assert_eq!(line_key(&line), "<http://ex.org/s>");
        assert_eq!(line_key("single"), "single");
    }

    #[test]
    fn test_line_order_matches_statement_order() {
        let a = Statement::new(
            Term::iri("http://ex.org/a"),
            Term::iri("http://ex.org/p"),
            Term::string("x"),
        );
        let b = a.in_graph(Term::iri("http://ex.org/g"));
        let c = Statement::new(
            Term::iri("http://ex.org/a#sub"),
            Term::iri("http://ex.org/p"),
            Term::string("x"),
        );

        let mut statements = vec![c.clone(), b.clone(), a.clone()];
        statements.sort();

        let mut lines: Vec<String> = [&a, &b, &c].iter().map(|s| encode_statement(s)).collect();
        lines.sort();

        let decoded: Vec<Statement> = lines
            .iter()
            .map(|l| decode_statement(l).unwrap())
            .collect();
        assert_eq!(decoded, statements);
    }
}
