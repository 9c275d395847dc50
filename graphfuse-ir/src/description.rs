//! Resource description - all statements describing one logical resource
//!
//! A description carries the primary resource identifier plus every
//! statement whose subject is that resource, and - in nested-description
//! mode - the statements of dependent resources reachable through a
//! designated description property. Descriptions are created fresh on
//! each pull from the loader, handed to the conflict resolver, and
//! discarded; the loader never retains them.

use crate::statement::Statement;
use crate::term::Term;

/// The full statement group for one logical resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceDescription {
    resource: Term,
    statements: Vec<Statement>,
}

impl ResourceDescription {
    /// Create an empty description for `resource`
    pub fn new(resource: Term) -> Self {
        Self {
            resource,
            statements: Vec::new(),
        }
    }

    /// The primary resource this description is about
    pub fn resource(&self) -> &Term {
        &self.resource
    }

    /// Append a statement to the description
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Number of statements in the description
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// True when the description holds no statements
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Iterate over the statements
    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    /// Borrow the statements
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// All distinct subjects appearing in the description, sorted by
    /// encoded token order
    ///
    /// The primary resource is one of them; any others are dependent
    /// resources folded in by nested-description mode, and may sort
    /// before it.
    pub fn subjects(&self) -> Vec<&Term> {
        let mut subjects: Vec<&Term> = self.statements.iter().map(|st| &st.s).collect();
        subjects.sort_by(|a, b| a.cmp_encoded(b));
        subjects.dedup();
        subjects
    }

    /// Consume the description, yielding its statements
    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }
}

impl IntoIterator for ResourceDescription {
    type Item = Statement;
    type IntoIter = std::vec::IntoIter<Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.statements.into_iter()
    }
}
