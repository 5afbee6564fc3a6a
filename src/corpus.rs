//! Complaint corpus loading
//!
//! The corpus is a JSON Lines file of filtered complaint records: one object
//! per line with a complaint identifier, product category, and non-empty
//! narrative. Upstream filtering (dropping blank narratives, normalizing
//! product names) is assumed done before this crate sees the file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::{ComplaintRecord, Error, Result};

/// Load complaint records from a JSON Lines file.
///
/// Blank lines are skipped. A line that fails to parse aborts the load with
/// an error naming the 1-based line number.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<ComplaintRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: ComplaintRecord =
            serde_json::from_str(trimmed).map_err(|e| Error::Corpus {
                line: index + 1,
                reason: e.to_string(),
            })?;
        records.push(record);
    }

    info!(
        records = records.len(),
        path = %path.display(),
        "loaded complaint corpus"
    );
    Ok(records)
}
