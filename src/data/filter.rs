use std::collections::HashMap;

use super::model::{CellValue, Record};

// ---------------------------------------------------------------------------
// Minimum-count threshold filter
// ---------------------------------------------------------------------------

/// Occurrence count of every category value across the whole input.
/// Records lacking the field are counted under `None`.
pub fn value_counts<'a>(
    records: &'a [Record],
    category_field: &str,
) -> HashMap<Option<&'a CellValue>, usize> {
    let mut counts = HashMap::new();
    for rec in records {
        *counts.entry(rec.get(category_field)).or_insert(0) += 1;
    }
    counts
}

/// Keep only records whose category value occurs at least `min_count` times
/// in `records`.
///
/// Counts are taken over the entire input before any record is dropped, and
/// retained records keep their relative order. A `min_count` of 0 or 1 keeps
/// everything.
pub fn filter_by_min_count(
    records: &[Record],
    category_field: &str,
    min_count: usize,
) -> Vec<Record> {
    let counts = value_counts(records, category_field);
    records
        .iter()
        .filter(|rec| {
            counts.get(&rec.get(category_field)).copied().unwrap_or(0) >= min_count
        })
        .cloned()
        .collect()
}
