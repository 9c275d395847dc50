//! RDF term types: IRI, blank node, and literal
//!
//! Terms are the building blocks of statements. A term can be:
//! - An IRI (always expanded, never prefixed)
//! - A blank node (with stable identifier)
//! - A literal (lexical value + optional datatype IRI + optional language tag)
//!
//! Every term has an N-Quads token form ([`Term::encoded`] /
//! `Display`) and can be parsed back from that form ([`Term::parse`]).
//! The token form is what spill files store and what the external sort
//! compares, so encode and parse must round-trip exactly.

use crate::error::{Error, Result};
use graphfuse_vocab::xsd;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Blank node identifier
///
/// Blank node IDs are stable within a source but have no global
/// meaning. The label does NOT include the `_:` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlankId(Arc<str>);

impl BlankId {
    /// Create a blank node ID from a label (without `_:` prefix)
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(Arc::from(label.as_ref()))
    }

    /// Get the label (without `_:` prefix)
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.0)
    }
}

/// An RDF term (subject, predicate, object, or graph position)
///
/// # Invariants
///
/// - `Term::Iri` always contains an **expanded** IRI, never a prefixed form.
/// - A literal with a language tag carries no explicit datatype (the
///   datatype is implicitly `rdf:langString`, per N-Quads).
/// - A literal with datatype `xsd:string` is normalized to carry no
///   explicit datatype, so encode/parse round-trips are exact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Full expanded IRI (e.g., "http://schema.org/Person")
    Iri(Arc<str>),

    /// Blank node with stable identifier
    BlankNode(BlankId),

    /// Literal value
    Literal {
        /// Lexical form
        value: Arc<str>,
        /// Datatype IRI, if any
        datatype: Option<Arc<str>>,
        /// Language tag, if any (mutually exclusive with datatype)
        language: Option<Arc<str>>,
    },
}

impl Term {
    /// Create an IRI term from an expanded IRI string
    pub fn iri(iri: impl AsRef<str>) -> Self {
        Term::Iri(Arc::from(iri.as_ref()))
    }

    /// Create a blank node term
    pub fn blank(label: impl AsRef<str>) -> Self {
        Term::BlankNode(BlankId::new(label))
    }

    /// Create a plain string literal
    pub fn string(value: impl AsRef<str>) -> Self {
        Term::Literal {
            value: Arc::from(value.as_ref()),
            datatype: None,
            language: None,
        }
    }

    /// Create a language-tagged string literal
    pub fn lang_string(value: impl AsRef<str>, lang: impl AsRef<str>) -> Self {
        Term::Literal {
            value: Arc::from(value.as_ref()),
            datatype: None,
            language: Some(Arc::from(lang.as_ref())),
        }
    }

    /// Create a typed literal with an explicit datatype IRI
    ///
    /// `xsd:string` is normalized away so that the token form (which
    /// omits it, per N-Quads) round-trips.
    pub fn typed(value: impl AsRef<str>, datatype: impl AsRef<str>) -> Self {
        let dt = datatype.as_ref();
        Term::Literal {
            value: Arc::from(value.as_ref()),
            datatype: if dt == xsd::STRING {
                None
            } else {
                Some(Arc::from(dt))
            },
            language: None,
        }
    }

    /// Check if this is an IRI term
    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri(_))
    }

    /// Check if this is a blank node
    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    /// Check if this is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    /// Check if this term can appear in subject position (IRI or blank node)
    pub fn is_resource(&self) -> bool {
        !self.is_literal()
    }

    /// Try to get as IRI string
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Try to get as blank node ID
    pub fn as_blank(&self) -> Option<&BlankId> {
        match self {
            Term::BlankNode(id) => Some(id),
            _ => None,
        }
    }

    /// Try to get literal components (value, datatype, language)
    pub fn as_literal(&self) -> Option<(&str, Option<&str>, Option<&str>)> {
        match self {
            Term::Literal {
                value,
                datatype,
                language,
            } => Some((value, datatype.as_deref(), language.as_deref())),
            _ => None,
        }
    }

    /// The N-Quads token form of this term
    ///
    /// This is the unit the tuple codec writes and the external sort
    /// compares. Byte order of tokens defines the total term order.
    pub fn encoded(&self) -> String {
        self.to_string()
    }

    /// Compare two terms by the byte order of their N-Quads tokens
    ///
    /// Note this is NOT the structural discriminant order: `"` < `<` < `_`
    /// in ASCII, so literals sort before IRIs, which sort before blank
    /// nodes - exactly as spill-file lines do.
    pub fn cmp_encoded(&self, other: &Self) -> std::cmp::Ordering {
        self.encoded().cmp(&other.encoded())
    }

    /// Parse a term from its N-Quads token form
    ///
    /// Accepts `<iri>`, `_:label`, `"lit"`, `"lit"@lang`, and
    /// `"lit"^^<dt>`. Inverse of [`Term::encoded`].
    pub fn parse(token: &str) -> Result<Term> {
        if let Some(rest) = token.strip_prefix('<') {
            let iri = rest
                .strip_suffix('>')
                .ok_or_else(|| Error::term(format!("unterminated IRI: {token}")))?;
            return Ok(Term::iri(iri));
        }
        if let Some(label) = token.strip_prefix("_:") {
            if label.is_empty() {
                return Err(Error::term("empty blank node label"));
            }
            return Ok(Term::blank(label));
        }
        if let Some(rest) = token.strip_prefix('"') {
            return parse_literal(rest, token);
        }
        Err(Error::term(format!("unrecognized term token: {token}")))
    }
}

/// Parse the remainder of a literal token (after the opening quote)
fn parse_literal(rest: &str, token: &str) -> Result<Term> {
    // Find the closing quote, honoring backslash escapes.
    let mut end = None;
    let mut escaped = false;
    for (i, c) in rest.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            end = Some(i);
            break;
        }
    }
    let end = end.ok_or_else(|| Error::term(format!("unterminated literal: {token}")))?;
    let value = unescape_literal(&rest[..end])?;
    let suffix = &rest[end + 1..];

    if suffix.is_empty() {
        return Ok(Term::string(value));
    }
    if let Some(lang) = suffix.strip_prefix('@') {
        if lang.is_empty() {
            return Err(Error::term(format!("empty language tag: {token}")));
        }
        return Ok(Term::lang_string(value, lang));
    }
    if let Some(dt) = suffix.strip_prefix("^^<") {
        let dt = dt
            .strip_suffix('>')
            .ok_or_else(|| Error::term(format!("unterminated datatype IRI: {token}")))?;
        return Ok(Term::typed(value, dt));
    }
    Err(Error::term(format!("trailing junk after literal: {token}")))
}

/// Escape a literal value for the token form
///
/// Escapes backslash, double quote, and the control characters that
/// would break line- and tab-delimited spill files.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_literal`]
fn unescape_literal(escaped: &str) -> Result<String> {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                return Err(Error::term(format!("unknown escape: \\{other}")));
            }
            None => return Err(Error::term("dangling escape at end of literal")),
        }
    }
    Ok(out)
}

impl std::str::FromStr for Term {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Term::parse(s)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", iri),
            Term::BlankNode(id) => write!(f, "{}", id),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "\"{}\"", escape_literal(value))?;
                if let Some(lang) = language {
                    write!(f, "@{}", lang)
                } else if let Some(dt) = datatype {
                    write!(f, "^^<{}>", dt)
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphfuse_vocab::xsd;

    #[test]
    fn test_blank_id() {
        let id = BlankId::new("b0");
        assert_eq!(id.as_str(), "b0");
        assert_eq!(format!("{}", id), "_:b0");
    }

    #[test]
    fn test_term_constructors() {
        let iri = Term::iri("http://example.org/foo");
        assert!(iri.is_iri());
        assert_eq!(iri.as_iri(), Some("http://example.org/foo"));

        let blank = Term::blank("b0");
        assert!(blank.is_blank());
        assert!(blank.is_resource());

        let lit = Term::lang_string("bonjour", "fr");
        let (value, dt, lang) = lit.as_literal().unwrap();
        assert_eq!(value, "bonjour");
        assert_eq!(dt, None);
        assert_eq!(lang, Some("fr"));
    }

    #[test]
    fn test_term_serde_bounds() {
        // Shared Arc-backed storage must still serialize both ways
        fn assert_serde<T: serde::Serialize + serde::de::DeserializeOwned>() {}
        assert_serde::<BlankId>();
        assert_serde::<Term>();
    }

    #[test]
    fn test_xsd_string_normalized() {
        // An explicit xsd:string datatype collapses to the plain form
        assert_eq!(Term::typed("x", xsd::STRING), Term::string("x"));
    }

    #[test]
    fn test_term_display() {
        assert_eq!(
            Term::iri("http://example.org").to_string(),
            "<http://example.org>"
        );
        assert_eq!(Term::blank("b0").to_string(), "_:b0");
        assert_eq!(Term::string("hello").to_string(), "\"hello\"");
        assert_eq!(
            Term::lang_string("bonjour", "fr").to_string(),
            "\"bonjour\"@fr"
        );
        assert_eq!(
            Term::typed("42", xsd::INTEGER).to_string(),
            "\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn test_literal_escaping() {
        let nasty = Term::string("a\tb\nc\"d\\e");
        let token = nasty.encoded();
        assert!(!token.contains('\t'));
        assert!(!token.contains('\n'));
        assert_eq!(Term::parse(&token).unwrap(), nasty);
    }

    #[test]
    fn test_parse_round_trip() {
        let terms = vec![
            Term::iri("http://example.org/a"),
            Term::blank("node1"),
            Term::string("plain"),
            Term::lang_string("hallo", "de"),
            Term::typed("3.5", xsd::DOUBLE),
        ];
        for term in terms {
            let token = term.encoded();
            assert_eq!(Term::parse(&token).unwrap(), term, "token: {token}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Term::parse("<http://no-close").is_err());
        assert!(Term::parse("_:").is_err());
        assert!(Term::parse("\"open").is_err());
        assert!(Term::parse("\"x\"junk").is_err());
        assert!(Term::parse("bare-word").is_err());
        assert!(Term::parse("\"x\"^^<dt").is_err());
    }

    #[test]
    fn test_encoded_order_matches_token_bytes() {
        // Literal < IRI < blank node in token byte order
        let lit = Term::string("zzz");
        let iri = Term::iri("http://a.org");
        let blank = Term::blank("a");
        assert!(lit.cmp_encoded(&iri).is_lt());
        assert!(iri.cmp_encoded(&blank).is_lt());
    }
}
