use std::collections::HashMap;

use serde::Serialize;

use super::model::{CellValue, Record};
use crate::error::SchemaError;

/// One category value of a distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionRow {
    pub value: CellValue,
    pub count: usize,
    /// Share of the input in percent (0–100).
    pub percentage: f64,
}

/// Check that every record carries `category_field`.
pub fn check_field(records: &[Record], category_field: &str) -> Result<(), SchemaError> {
    let missing = records
        .iter()
        .filter(|r| r.get(category_field).is_none())
        .count();
    if missing > 0 {
        return Err(SchemaError::MissingField {
            field: category_field.to_string(),
            missing,
            total: records.len(),
        });
    }
    Ok(())
}

/// Group `records` by `category_field` and compute count and percentage per
/// distinct value.
///
/// Rows are ordered by count descending; equal counts keep the order in which
/// their values were first seen. Empty input yields an empty distribution.
pub fn aggregate(
    records: &[Record],
    category_field: &str,
) -> Result<Vec<DistributionRow>, SchemaError> {
    check_field(records, category_field)?;

    // First-seen order is the position in `rows`; `index` maps value → slot.
    let mut index: HashMap<&CellValue, usize> = HashMap::new();
    let mut rows: Vec<(&CellValue, usize)> = Vec::new();
    for value in records.iter().filter_map(|r| r.get(category_field)) {
        match index.get(value) {
            Some(&slot) => rows[slot].1 += 1,
            None => {
                index.insert(value, rows.len());
                rows.push((value, 1));
            }
        }
    }

    // `sort_by` is stable, which gives the tie-break for free.
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    let total = records.len();
    Ok(rows
        .into_iter()
        .map(|(value, count)| DistributionRow {
            value: value.clone(),
            count,
            percentage: if total == 0 {
                0.0
            } else {
                100.0 * count as f64 / total as f64
            },
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use super::*;

    pub(crate) fn records(values: &[&str]) -> Vec<Record> {
        values
            .iter()
            .map(|v| {
                let mut fields = BTreeMap::new();
                fields.insert("Nationality".to_string(), CellValue::from(*v));
                fields.insert("Name".to_string(), CellValue::from("x"));
                Record::new("EMBA 2020", fields)
            })
            .collect()
    }

    #[test]
    fn orders_by_count_descending() {
        let recs = records(&["AR", "AR", "AR", "BR", "BR", "CL"]);
        let dist = aggregate(&recs, "Nationality").unwrap();

        let summary: Vec<(String, usize)> = dist
            .iter()
            .map(|r| (r.value.to_string(), r.count))
            .collect();
        assert_eq!(
            summary,
            [("AR".to_string(), 3), ("BR".to_string(), 2), ("CL".to_string(), 1)]
        );
        assert!((dist[0].percentage - 50.0).abs() < 1e-9);
        assert!((dist[1].percentage - 100.0 / 3.0).abs() < 1e-9);
        assert!((dist[2].percentage - 100.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let recs = records(&["CL", "BR", "AR", "BR", "CL", "AR", "UY"]);
        let dist = aggregate(&recs, "Nationality").unwrap();
        let labels: Vec<String> = dist.iter().map(|r| r.value.to_string()).collect();
        assert_eq!(labels, ["CL", "BR", "AR", "UY"]);
    }

    #[test]
    fn counts_and_percentages_sum_to_whole() {
        let recs = records(&["AR", "PE", "AR", "UY", "PE", "AR", "BO", "AR", "CO"]);
        let dist = aggregate(&recs, "Nationality").unwrap();

        let count_sum: usize = dist.iter().map(|r| r.count).sum();
        let pct_sum: f64 = dist.iter().map(|r| r.percentage).sum();
        assert_eq!(count_sum, recs.len());
        assert!((pct_sum - 100.0).abs() < 1e-6);
    }

    #[test]
    fn empty_input_gives_empty_distribution() {
        assert!(aggregate(&[], "Nationality").unwrap().is_empty());
    }

    #[test]
    fn missing_field_is_a_schema_error() {
        let recs = records(&["AR", "BR"]);
        let err = aggregate(&recs, "Nacionalidad").unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingField {
                field: "Nacionalidad".to_string(),
                missing: 2,
                total: 2,
            }
        );
    }

    #[test]
    fn partially_missing_field_is_a_schema_error() {
        let mut recs = records(&["AR", "BR", "CL"]);
        recs[1].fields.remove("Nationality");
        assert!(matches!(
            aggregate(&recs, "Nationality"),
            Err(SchemaError::MissingField { missing: 1, total: 3, .. })
        ));
    }

    #[test]
    fn blank_cells_form_their_own_category() {
        let mut recs = records(&["AR", "AR", "BR"]);
        recs[2]
            .fields
            .insert("Nationality".to_string(), CellValue::Null);
        let dist = aggregate(&recs, "Nationality").unwrap();
        assert_eq!(dist.len(), 2);
        assert_eq!(dist[1].value, CellValue::Null);
        assert_eq!(dist[1].count, 1);
    }

    #[test]
    fn nan_cells_group_together() {
        let mut recs = records(&["nan", "nan", "AR"]);
        for r in &mut recs {
            let raw = r.get("Nationality").unwrap().to_string();
            r.fields
                .insert("Nationality".to_string(), CellValue::guess(&raw));
        }
        let dist = aggregate(&recs, "Nationality").unwrap();
        let summary: Vec<(String, usize)> = dist
            .iter()
            .map(|r| (r.value.to_string(), r.count))
            .collect();
        assert_eq!(summary, [("NaN".to_string(), 2), ("AR".to_string(), 1)]);
    }
}
