//! Sorted merge join for nested resource description
//!
//! Joins the sorted primary statement file against the sorted
//! secondary `(object, subject)` index: every statement whose subject
//! appears as the object of a resource-description property gains the
//! describing statement's subject as its owner. The result is a
//! 5-field `(owner, s, p, o, g)` tuple file, one line per
//! (owner, statement) pair.
//!
//! Both inputs are sorted by their first field, so the join is a
//! single forward pass. The output is ordered by the left side's
//! subject, not by owner, and must be re-sorted before cursoring.

use crate::cursor::LineCursor;
use crate::error::{stage, LoaderError, Result};
use crate::temp;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Join sorted primary statements against the sorted secondary index
///
/// Returns the path of the owner-tagged tuple file (unsorted by
/// owner). Inputs are left in place; the caller owns their cleanup.
pub fn merge_join_files(
    primary_sorted: &Path,
    secondary_sorted: &Path,
    temp_dir: &Path,
) -> Result<PathBuf> {
    let output = temp::fresh_path(temp_dir, "joined");
    let result = join_into(primary_sorted, secondary_sorted, &output);
    if result.is_err() {
        temp::remove_quietly(&output, "join output");
    }
    result.map(|pairs| {
        tracing::debug!(pairs, output = %output.display(), "merge join complete");
        output
    })
}

fn join_into(primary_sorted: &Path, secondary_sorted: &Path, output: &Path) -> Result<u64> {
    let mut left =
        LineCursor::open(primary_sorted).map_err(|e| LoaderError::temp(stage::SECONDARY_JOIN, e))?;
    let mut right = LineCursor::open(secondary_sorted)
        .map_err(|e| LoaderError::temp(stage::SECONDARY_JOIN, e))?;
    let mut writer = BufWriter::new(
        File::create(output).map_err(|e| LoaderError::temp(stage::SECONDARY_JOIN, e))?,
    );

    // Owner tokens of the index group matching the current left key
    let mut owners: Vec<String> = Vec::new();
    let mut owners_key = String::new();
    let mut pairs: u64 = 0;

    while let Some(left_key) = left.key().map(str::to_string) {
        if owners_key != left_key {
            skip_below(&mut right, &left_key)?;
            owners.clear();
            owners_key.clear();
            while right.key() == Some(left_key.as_str()) {
                let line = right
                    .advance()
                    .map_err(|e| LoaderError::temp(stage::SECONDARY_JOIN, e))?
                    .unwrap_or_default();
                // Second field of the index record is the owner token
                if let Some((_, owner)) = line.split_once('\t') {
                    owners.push(owner.to_string());
                }
            }
            owners_key = left_key.clone();
        }

        let statement_line = left
            .advance()
            .map_err(|e| LoaderError::temp(stage::SECONDARY_JOIN, e))?
            .unwrap_or_default();
        for owner in &owners {
            writer
                .write_all(owner.as_bytes())
                .and_then(|_| writer.write_all(b"\t"))
                .and_then(|_| writer.write_all(statement_line.as_bytes()))
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| LoaderError::temp(stage::SECONDARY_JOIN, e))?;
            pairs += 1;
        }
    }

    writer
        .flush()
        .map_err(|e| LoaderError::temp(stage::SECONDARY_JOIN, e))?;
    Ok(pairs)
}

/// Advance `cursor` past every line whose key sorts below `key`
fn skip_below(cursor: &mut LineCursor, key: &str) -> Result<()> {
    while let Some(current) = cursor.key() {
        if current >= key {
            break;
        }
        advance_io(cursor)?;
    }
    Ok(())
}

fn advance_io(cursor: &mut LineCursor) -> Result<Option<String>> {
    cursor
        .advance()
        .map_err(|e: io::Error| LoaderError::temp(stage::SECONDARY_JOIN, e))
}
