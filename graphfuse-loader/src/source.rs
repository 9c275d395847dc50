//! Statement sources
//!
//! A source hands the loader an already-opened stream of statements;
//! parsing RDF syntaxes is out of scope and happens behind this seam.
//! Sources are read once: the loader opens each source, drains its
//! stream, and drops it before moving to the next.

use crate::error::{LoaderError, Result};
use graphfuse_ir::{codec, Statement, Term};
use std::io::BufRead;
use std::path::PathBuf;

/// A fallible, forward-only stream of statements
pub type StatementStream = Box<dyn Iterator<Item = Result<Statement>>>;

/// One data source feeding the fusion pipeline
pub trait StatementSource {
    /// Identity of this source, used in error messages
    fn name(&self) -> &str;

    /// Graph applied to statements that carry none
    fn default_graph(&self) -> Option<Term>;

    /// Open the statement stream. Called at most once per pipeline run.
    fn open(&mut self) -> Result<StatementStream>;
}

/// In-memory source backed by a statement vector
pub struct VecSource {
    name: String,
    default_graph: Option<Term>,
    statements: Vec<Statement>,
}

impl VecSource {
    /// Create a source over `statements`
    pub fn new(name: impl Into<String>, statements: Vec<Statement>) -> Self {
        Self {
            name: name.into(),
            default_graph: None,
            statements,
        }
    }

    /// Builder method to set the default graph
    pub fn with_default_graph(mut self, graph: Term) -> Self {
        self.default_graph = Some(graph);
        self
    }
}

impl StatementSource for VecSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_graph(&self) -> Option<Term> {
        self.default_graph.clone()
    }

    fn open(&mut self) -> Result<StatementStream> {
        let statements = std::mem::take(&mut self.statements);
        Ok(Box::new(statements.into_iter().map(Ok)))
    }
}

/// Source reading the crate's own tuple-line format
///
/// Lets spill output of one fusion run seed another. Malformed lines
/// are fatal (source read errors abort the pipeline).
pub struct QuadFileSource {
    name: String,
    path: PathBuf,
    default_graph: Option<Term>,
}

impl QuadFileSource {
    /// Create a source over the tuple file at `path`
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            default_graph: None,
        }
    }

    /// Builder method to set the default graph
    pub fn with_default_graph(mut self, graph: Term) -> Self {
        self.default_graph = Some(graph);
        self
    }
}

impl StatementSource for QuadFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_graph(&self) -> Option<Term> {
        self.default_graph.clone()
    }

    fn open(&mut self) -> Result<StatementStream> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| LoaderError::source_failed(&self.name, e.to_string()))?;
        let name = self.name.clone();
        let lines = std::io::BufReader::new(file).lines();
        Ok(Box::new(lines.map(move |line| {
            let line = line.map_err(|e| LoaderError::source_failed(&name, e.to_string()))?;
            codec::decode_statement(&line)
                .map_err(|e| LoaderError::source_failed(&name, e.to_string()))
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn st(s: &str, o: &str) -> Statement {
        Statement::new(Term::iri(s), Term::iri("http://ex.org/p"), Term::string(o))
    }

    #[test]
    fn test_vec_source() {
        let mut source = VecSource::new("mem", vec![st("http://ex.org/a", "1")])
            .with_default_graph(Term::iri("http://ex.org/g"));
        assert_eq!(source.name(), "mem");
        assert_eq!(
            source.default_graph().and_then(|g| g.as_iri().map(str::to_string)),
            Some("http://ex.org/g".to_string())
        );

        let stream = source.open().unwrap();
        let statements: Result<Vec<_>> = stream.collect();
        assert_eq!(statements.unwrap().len(), 1);
    }

    #[test]
    fn test_quad_file_source() {
        let dir = std::env::temp_dir().join("graphfuse_test_quad_source");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("data.nq");

        let expected = vec![st("http://ex.org/a", "1"), st("http://ex.org/b", "2")];
        let mut file = std::fs::File::create(&path).unwrap();
        for statement in &expected {
            writeln!(file, "{}", codec::encode_statement(statement)).unwrap();
        }
        drop(file);

        let mut source = QuadFileSource::new("file", &path);
        let statements: Result<Vec<_>> = source.open().unwrap().collect();
        assert_eq!(statements.unwrap(), expected);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_quad_file_source_malformed_is_fatal() {
        let dir = std::env::temp_dir().join("graphfuse_test_quad_source_bad");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.nq");
        std::fs::write(&path, "not a tuple line\n").unwrap();

        let mut source = QuadFileSource::new("bad", &path);
        let statements: Result<Vec<_>> = source.open().unwrap().collect();
        let err = statements.unwrap_err();
        assert!(err.to_string().contains("bad"), "source identity in message: {err}");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_names_source() {
        let mut source = QuadFileSource::new("ghost", "/nonexistent/ghost.nq");
        let Err(err) = source.open() else {
            panic!("opening a missing file must fail");
        };
        assert!(matches!(err, LoaderError::Source { .. }));
        assert!(err.to_string().contains("ghost"));
    }
}
