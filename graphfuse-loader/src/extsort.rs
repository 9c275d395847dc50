//! External merge sort over spill files
//!
//! Sorting proceeds in two phases sized by the memory budget:
//!
//! 1. Partition: the input file is split into at most
//!    `max_sort_chunks` chunk files, each chunk is loaded, sorted in
//!    memory by line byte order, and written back.
//! 2. Merge: the sorted chunks stream through a k-way merge into the
//!    output file, optionally suppressing byte-identical consecutive
//!    lines.
//!
//! Line byte order over encoded tuples equals the total statement
//! order, so the merged file is sorted by statement without decoding.
//! The input file is deleted as soon as its lines are partitioned;
//! chunk files are deleted after the merge. On error every temporary
//! created so far is removed before the error propagates.

use crate::config::LoaderConfig;
use crate::cursor::LineCursor;
use crate::error::{stage, LoaderError, Result};
use crate::temp;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// ============================================================================
// K-way merge
// ============================================================================

/// One sorted line stream feeding the merge
pub trait MergeSource {
    /// The stream's current line, `None` once exhausted
    fn peek(&self) -> Option<&str>;

    /// Move to the next line
    fn advance(&mut self) -> io::Result<()>;

    /// True once every line has been consumed
    fn is_exhausted(&self) -> bool;
}

impl MergeSource for LineCursor {
    fn peek(&self) -> Option<&str> {
        LineCursor::peek(self)
    }

    fn advance(&mut self) -> io::Result<()> {
        LineCursor::advance(self).map(|_| ())
    }

    fn is_exhausted(&self) -> bool {
        LineCursor::is_exhausted(self)
    }
}

struct HeapEntry {
    line: String,
    stream_idx: usize,
}

/// Streaming k-way merge of sorted line streams
///
/// A manual binary min-heap keyed on `(line, stream_idx)` keeps the
/// merge stable and O(log k) per line.
pub struct KWayMerge<S: MergeSource> {
    sources: Vec<S>,
    heap: Vec<HeapEntry>,
    last_emitted: Option<String>,
}

impl<S: MergeSource> KWayMerge<S> {
    /// Build a merge over `sources`, priming the heap with each
    /// stream's first line
    pub fn new(mut sources: Vec<S>) -> io::Result<Self> {
        let mut merge = Self {
            heap: Vec::with_capacity(sources.len()),
            sources: Vec::new(),
            last_emitted: None,
        };
        for (stream_idx, source) in sources.iter_mut().enumerate() {
            if let Some(line) = source.peek() {
                let line = line.to_string();
                source.advance()?;
                merge.heap_push(HeapEntry { line, stream_idx });
            }
        }
        merge.sources = sources;
        Ok(merge)
    }

    /// Next line in global order, `None` once all streams are drained
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let Some(entry) = self.heap_pop() else {
            return Ok(None);
        };
        let source = &mut self.sources[entry.stream_idx];
        if let Some(line) = source.peek() {
            let line = line.to_string();
            source.advance()?;
            self.heap_push(HeapEntry {
                line,
                stream_idx: entry.stream_idx,
            });
        }
        Ok(Some(entry.line))
    }

    /// Like [`next_line`](Self::next_line) but skips lines
    /// byte-identical to the previously emitted one
    pub fn next_deduped(&mut self) -> io::Result<Option<String>> {
        loop {
            match self.next_line()? {
                Some(line) => {
                    if self.last_emitted.as_deref() == Some(line.as_str()) {
                        continue;
                    }
                    self.last_emitted = Some(line.clone());
                    return Ok(Some(line));
                }
                None => return Ok(None),
            }
        }
    }

    fn heap_push(&mut self, entry: HeapEntry) {
        self.heap.push(entry);
        self.sift_up(self.heap.len() - 1);
    }

    fn heap_pop(&mut self) -> Option<HeapEntry> {
        if self.heap.is_empty() {
            return None;
        }
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        let entry = self.heap.pop();
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        entry
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !Self::less(&self.heap[i], &self.heap[parent]) {
                break;
            }
            self.heap.swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * i + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut smallest = left;
            if right < len && Self::less(&self.heap[right], &self.heap[left]) {
                smallest = right;
            }
            if !Self::less(&self.heap[smallest], &self.heap[i]) {
                break;
            }
            self.heap.swap(i, smallest);
            i = smallest;
        }
    }

    fn less(a: &HeapEntry, b: &HeapEntry) -> bool {
        (a.line.as_str(), a.stream_idx) < (b.line.as_str(), b.stream_idx)
    }
}

// ============================================================================
// External sorter
// ============================================================================

/// Memory-bounded file sorter
pub struct ExternalSorter {
    memory_budget_bytes: usize,
    max_sort_chunks: usize,
    dedup_identical: bool,
    temp_dir: PathBuf,
}

impl ExternalSorter {
    /// Build a sorter from the loader configuration
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            memory_budget_bytes: config.memory_budget_bytes,
            max_sort_chunks: config.max_sort_chunks,
            dedup_identical: config.dedup_identical,
            temp_dir: config.temp_dir.clone(),
        }
    }

    /// Build a sorter that keeps duplicate lines
    pub fn keep_duplicates(mut self) -> Self {
        self.dedup_identical = false;
        self
    }

    /// Sort `input` into a fresh file, consuming `input`
    ///
    /// `approx_bytes` sizes the chunk partitioning; the writer of the
    /// input tracks it so the file need not be stat'ed. Returns the
    /// path of the sorted output file.
    pub fn sort_file(&self, input: &Path, approx_bytes: u64) -> Result<PathBuf> {
        let output = temp::fresh_path(&self.temp_dir, "sorted");
        let mut chunks: Vec<PathBuf> = Vec::new();

        let result = self.sort_into(input, approx_bytes, &output, &mut chunks);

        for chunk in &chunks {
            temp::remove_quietly(chunk, "sort chunk");
        }
        if result.is_err() {
            temp::remove_quietly(&output, "sort output");
        }
        result.map(|_| output)
    }

    fn sort_into(
        &self,
        input: &Path,
        approx_bytes: u64,
        output: &Path,
        chunks: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let chunk_count = self.chunk_count(approx_bytes);
        tracing::debug!(
            input = %input.display(),
            approx_bytes,
            chunk_count,
            "external sort"
        );

        self.partition(input, approx_bytes, chunk_count, chunks)?;
        temp::remove_quietly(input, "unsorted spill");

        for chunk in chunks.iter() {
            self.sort_chunk(chunk)?;
        }

        self.merge(chunks, output)
    }

    /// `clamp(approx_bytes / budget, 1, max_sort_chunks)`
    fn chunk_count(&self, approx_bytes: u64) -> usize {
        let by_budget = (approx_bytes / self.memory_budget_bytes.max(1) as u64) as usize;
        by_budget.clamp(1, self.max_sort_chunks)
    }

    /// Split `input` into `chunk_count` files of roughly equal byte size
    fn partition(
        &self,
        input: &Path,
        approx_bytes: u64,
        chunk_count: usize,
        chunks: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let quota = (approx_bytes / chunk_count as u64).max(1);
        let reader = BufReader::new(
            File::open(input).map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?,
        );

        let mut writer: Option<BufWriter<File>> = None;
        let mut written: u64 = 0;
        for line in reader.lines() {
            let line = line.map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?;
            let need_new = match &writer {
                None => true,
                // The last chunk absorbs the rounding remainder
                Some(_) => written >= quota && chunks.len() < chunk_count,
            };
            if need_new {
                if let Some(mut old) = writer.take() {
                    old.flush().map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?;
                }
                let path = temp::fresh_path(&self.temp_dir, "chunk");
                writer = Some(BufWriter::new(
                    File::create(&path).map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?,
                ));
                chunks.push(path);
                written = 0;
            }
            let w = writer.as_mut().unwrap();
            w.write_all(line.as_bytes())
                .and_then(|_| w.write_all(b"\n"))
                .map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?;
            written += line.len() as u64 + 1;
        }
        if let Some(mut w) = writer {
            w.flush().map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?;
        }
        Ok(())
    }

    /// Load one chunk, sort its lines by byte order, write it back
    fn sort_chunk(&self, chunk: &Path) -> Result<()> {
        let reader =
            BufReader::new(File::open(chunk).map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?);
        let mut lines: Vec<String> = reader
            .lines()
            .collect::<io::Result<_>>()
            .map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?;
        lines.sort_unstable();

        let mut writer = BufWriter::new(
            File::create(chunk).map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?,
        );
        for line in &lines {
            writer
                .write_all(line.as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))?;
        }
        writer
            .flush()
            .map_err(|e| LoaderError::temp(stage::CHUNK_SORT, e))
    }

    /// K-way merge all chunks into `output`
    fn merge(&self, chunks: &[PathBuf], output: &Path) -> Result<()> {
        let cursors: io::Result<Vec<LineCursor>> =
            chunks.iter().map(|c| LineCursor::open(c)).collect();
        let mut merge =
            KWayMerge::new(cursors.map_err(|e| LoaderError::temp(stage::MERGE, e))?)
                .map_err(|e| LoaderError::temp(stage::MERGE, e))?;

        let mut writer = BufWriter::new(
            File::create(output).map_err(|e| LoaderError::temp(stage::MERGE, e))?,
        );
        loop {
            let next = if self.dedup_identical {
                merge.next_deduped()
            } else {
                merge.next_line()
            }
            .map_err(|e| LoaderError::temp(stage::MERGE, e))?;
            let Some(line) = next else { break };
            writer
                .write_all(line.as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| LoaderError::temp(stage::MERGE, e))?;
        }
        writer.flush().map_err(|e| LoaderError::temp(stage::MERGE, e))
    }
}
