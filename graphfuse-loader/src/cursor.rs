//! Buffered forward-only line cursor
//!
//! Reads one encoded tuple line at a time from a spill file, holding
//! the current line so callers can peek before deciding to consume.
//! All merge and join stages sit on top of this cursor.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Forward-only cursor over a line-oriented spill file
pub struct LineCursor {
    reader: BufReader<File>,
    current: Option<String>,
}

impl LineCursor {
    /// Open a cursor positioned on the file's first line
    pub fn open(path: &Path) -> io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut cursor = Self {
            reader,
            current: None,
        };
        cursor.current = cursor.read_line()?;
        Ok(cursor)
    }

    /// The current line, `None` once the file is exhausted
    pub fn peek(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// First field of the current line (the grouping key)
    pub fn key(&self) -> Option<&str> {
        self.current.as_deref().map(graphfuse_ir::codec::line_key)
    }

    /// Consume the current line, returning it and advancing to the next
    pub fn advance(&mut self) -> io::Result<Option<String>> {
        let next = self.read_line()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// True once every line has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}
