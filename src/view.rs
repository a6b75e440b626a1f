use std::borrow::Cow;

use serde::Serialize;

use crate::color::{Palette, Rgb};
use crate::data::aggregate::{aggregate, check_field, DistributionRow};
use crate::data::filter::filter_by_min_count;
use crate::data::model::{Dataset, Record};
use crate::error::{SchemaError, ViewError};

// ---------------------------------------------------------------------------
// View model
// ---------------------------------------------------------------------------

/// One pie slice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: String,
    pub value: usize,
    /// Share of the whole in percent, for slice labels.
    pub percentage: f64,
    pub color: Rgb,
}

/// One line of the summary table, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    /// Count with thousands separators, e.g. `1,234`.
    pub count: String,
    /// Percentage rounded to one decimal, e.g. `33.3%`.
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub title: String,
    /// Number of records behind the chart.
    pub total: usize,
    pub slices: Vec<ChartSlice>,
    pub summary: Vec<SummaryRow>,
}

impl ViewModel {
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Per-request inputs that are not part of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSettings {
    pub category_field: String,
    /// Threshold applied to the combined view only.
    pub min_count: usize,
}

/// Turn a distribution into chart slices and summary rows. Slice `i` takes
/// palette colour `i`.
pub fn to_view(title: &str, distribution: &[DistributionRow], palette: &Palette) -> ViewModel {
    let slices = distribution
        .iter()
        .enumerate()
        .map(|(i, row)| ChartSlice {
            label: row.value.to_string(),
            value: row.count,
            percentage: row.percentage,
            color: palette.color_at(i),
        })
        .collect();

    let summary = distribution
        .iter()
        .map(|row| SummaryRow {
            label: row.value.to_string(),
            count: format_count(row.count),
            percentage: format_percentage(row.percentage),
        })
        .collect();

    ViewModel {
        title: title.to_string(),
        total: distribution.iter().map(|r| r.count).sum(),
        slices,
        summary,
    }
}

/// Build the view for one cohort: filter (combined view only), aggregate,
/// shape. A schema problem only affects the requested cohort.
pub fn view_for(
    dataset: &Dataset,
    cohort: &str,
    settings: &ViewSettings,
    palette: &Palette,
) -> Result<ViewModel, ViewError> {
    let table = dataset
        .table(cohort)
        .ok_or_else(|| ViewError::UnknownCohort(cohort.to_string()))?;
    let columns = dataset.columns_of(cohort).unwrap_or_default();
    let field = settings.category_field.as_str();

    if !columns.iter().any(|c| c == field) {
        return Err(SchemaError::MissingField {
            field: field.to_string(),
            missing: table.len(),
            total: table.len(),
        }
        .into());
    }
    check_field(&table.records, field)?;

    let (records, heading): (Cow<'_, [Record]>, String) = if dataset.is_total(cohort) {
        (
            Cow::Owned(filter_by_min_count(&table.records, field, settings.min_count)),
            format!("{cohort} (≥{} people)", settings.min_count),
        )
    } else {
        (Cow::Borrowed(table.records.as_slice()), cohort.to_string())
    };

    let distribution = aggregate(&records, field)?;
    Ok(to_view(
        &format!("{field} distribution - {heading}"),
        &distribution,
        palette,
    ))
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// `1234567` → `1,234,567`.
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `33.333` → `33.3%`.
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.1}%")
}
