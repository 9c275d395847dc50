//! URI equivalence mapping
//!
//! The fusion pipeline resolves equivalent entities by rewriting every
//! URI to a canonical representative before statements are spilled.
//! The mapping is precomputed (from `owl:sameAs` links) before the
//! loader runs and is read-only to the core.
//!
//! [`SameAsMapping`] is the seam the loader consumes; [`MemoryMapping`]
//! is the standard hash-backed implementation, buildable either from
//! explicit `(alias, canonical)` pairs or from a set of `owl:sameAs`
//! statements (canonical elected as the lexicographically smallest
//! member of each equivalence class).

use graphfuse_ir::{Statement, Term};
use graphfuse_vocab::owl;
use rustc_hash::FxHashMap;

/// Queryable URI equivalence mapping
///
/// # Invariant
///
/// Canonicalization is idempotent: `canonicalize(canonicalize(x)) ==
/// canonicalize(x)`. Implementations must never map a canonical URI
/// onward to something else.
pub trait SameAsMapping {
    /// Canonical representative for `uri`, or `None` if `uri` maps to
    /// itself
    fn canonical(&self, uri: &str) -> Option<&str>;

    /// True when `uri` belongs to an equivalence class with more than
    /// one member (it is either an alias, or a canonical URI that has
    /// aliases)
    fn has_alternatives(&self, uri: &str) -> bool;

    /// Canonical representative, identity when unmapped
    fn canonicalize<'a>(&'a self, uri: &'a str) -> &'a str {
        self.canonical(uri).unwrap_or(uri)
    }
}

/// Rewrite a term through the mapping
///
/// Only IRI terms are rewritten; blank nodes and literals pass through
/// unchanged.
pub fn canonicalize_term(mapping: &dyn SameAsMapping, term: &Term) -> Term {
    match term.as_iri() {
        Some(iri) => match mapping.canonical(iri) {
            Some(canonical) => Term::iri(canonical),
            None => term.clone(),
        },
        None => term.clone(),
    }
}

/// The identity mapping: nothing is rewritten, nothing has alternatives
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMapping;

impl SameAsMapping for NoMapping {
    fn canonical(&self, _uri: &str) -> Option<&str> {
        None
    }

    fn has_alternatives(&self, _uri: &str) -> bool {
        false
    }
}

/// Hash-backed URI equivalence mapping
#[derive(Debug, Clone, Default)]
pub struct MemoryMapping {
    /// alias -> canonical, non-identity entries only
    canonical: FxHashMap<String, String>,
    /// canonical -> sorted alias list
    alternatives: FxHashMap<String, Vec<String>>,
}

impl MemoryMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit `(alias, canonical)` pairs
    ///
    /// Chains (`a -> b`, `b -> c`) are flattened so the idempotence
    /// invariant holds; a cycle collapses onto its lexicographically
    /// smallest member.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut direct: FxHashMap<String, String> = FxHashMap::default();
        for (alias, canonical) in pairs {
            if alias != canonical {
                direct.insert(alias, canonical);
            }
        }

        let mut mapping = Self::new();
        for alias in direct.keys() {
            let canonical = resolve_chain(&direct, alias);
            if canonical != *alias {
                mapping.add_resolved(alias.clone(), canonical);
            }
        }
        mapping
    }

    /// Build from a set of `owl:sameAs` statements
    ///
    /// Links are symmetric and transitive; each equivalence class
    /// elects its lexicographically smallest URI as canonical.
    /// Statements with a different predicate, or with a non-IRI
    /// subject or object, are ignored.
    pub fn from_same_as_statements<'a, I>(statements: I) -> Self
    where
        I: IntoIterator<Item = &'a Statement>,
    {
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        let mut uris: Vec<String> = Vec::new();
        let mut parent: Vec<usize> = Vec::new();

        let mut intern = |uri: &str, uris: &mut Vec<String>, parent: &mut Vec<usize>| -> usize {
            if let Some(&i) = index.get(uri) {
                return i;
            }
            let i = uris.len();
            uris.push(uri.to_string());
            parent.push(i);
            index.insert(uri.to_string(), i);
            i
        };

        for st in statements {
            if st.p.as_iri() != Some(owl::SAME_AS) {
                continue;
            }
            let (Some(a), Some(b)) = (st.s.as_iri(), st.o.as_iri()) else {
                continue;
            };
            let ia = intern(a, &mut uris, &mut parent);
            let ib = intern(b, &mut uris, &mut parent);
            let ra = find(&mut parent, ia);
            let rb = find(&mut parent, ib);
            if ra != rb {
                parent[rb] = ra;
            }
        }

        // Elect the smallest URI per class
        let mut class_min: FxHashMap<usize, usize> = FxHashMap::default();
        for i in 0..uris.len() {
            let root = find(&mut parent, i);
            let entry = class_min.entry(root).or_insert(i);
            if uris[i] < uris[*entry] {
                *entry = i;
            }
        }

        let mut mapping = Self::new();
        for i in 0..uris.len() {
            let root = find(&mut parent, i);
            let min = class_min[&root];
            if min != i {
                mapping.add_resolved(uris[i].clone(), uris[min].clone());
            }
        }
        mapping
    }

    /// All canonical URIs that have at least one alternative
    pub fn canonical_uris(&self) -> impl Iterator<Item = &str> {
        self.alternatives.keys().map(String::as_str)
    }

    /// The alternative URIs mapping to `canonical` (empty if none)
    pub fn alternatives_of(&self, canonical: &str) -> &[String] {
        self.alternatives
            .get(canonical)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of non-identity alias entries
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// True when no URI is rewritten
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    fn add_resolved(&mut self, alias: String, canonical: String) {
        let alts = self.alternatives.entry(canonical.clone()).or_default();
        match alts.binary_search(&alias) {
            Ok(_) => {}
            Err(pos) => alts.insert(pos, alias.clone()),
        }
        self.canonical.insert(alias, canonical);
    }
}

impl SameAsMapping for MemoryMapping {
    fn canonical(&self, uri: &str) -> Option<&str> {
        self.canonical.get(uri).map(String::as_str)
    }

    fn has_alternatives(&self, uri: &str) -> bool {
        self.canonical.contains_key(uri) || self.alternatives.contains_key(uri)
    }
}

/// Follow `direct` until a URI that is not itself an alias; a cycle
/// collapses onto its smallest member.
fn resolve_chain(direct: &FxHashMap<String, String>, start: &str) -> String {
    let mut seen: Vec<&str> = vec![start];
    let mut current = start;
    while let Some(next) = direct.get(current) {
        if seen.contains(&next.as_str()) {
            // Cycle: smallest member wins
            return seen
                .iter()
                .chain(std::iter::once(&next.as_str()))
                .min()
                .map(|s| s.to_string())
                .unwrap_or_else(|| start.to_string());
        }
        seen.push(next);
        current = next;
    }
    current.to_string()
}

/// Union-find root lookup with path halving
fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}
