use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single spreadsheet cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as read from a workbook or table file.
/// Used as a grouping key downstream, so `Eq`, `Ord` and `Hash` must agree.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text.
    Date(String),
    Null,
}

// -- Manual Eq/Ord/Hash because of the f64 variant --

/// All NaNs collapse to one value and `-0.0` to `0.0`, so floats that print
/// the same group together.
fn canonical_float(f: f64) -> f64 {
    if f.is_nan() {
        f64::NAN
    } else if f == 0.0 {
        0.0
    } else {
        f
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => canonical_float(*a).total_cmp(&canonical_float(*b)),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => canonical_float(*f).to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "(blank)"),
        }
    }
}

impl CellValue {
    /// Interpret a raw text cell (CSV) as the narrowest matching type.
    pub fn guess(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of a cohort table
// ---------------------------------------------------------------------------

/// One row of source data, tagged with the cohort it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Name of the originating cohort (never the synthetic total).
    pub cohort: String,
    /// Column name → value. Only the category column is ever inspected.
    pub fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new(cohort: impl Into<String>, fields: BTreeMap<String, CellValue>) -> Self {
        Record {
            cohort: cohort.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }
}

// ---------------------------------------------------------------------------
// CohortTable / Dataset
// ---------------------------------------------------------------------------

/// The rows of one cohort together with the header of its source table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortTable {
    /// Column names in source order.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl CohortTable {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        CohortTable { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Every configured cohort plus the synthetic total, built once by the loader.
///
/// The total table is the in-order concatenation of all named cohorts and is
/// never modified after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Configured cohort order (excludes the total).
    cohort_names: Vec<String>,
    total_name: String,
    tables: BTreeMap<String, CohortTable>,
}

impl Dataset {
    /// Assemble a dataset from per-cohort tables given in configured order,
    /// building the total table by concatenation.
    pub fn from_cohorts(cohorts: Vec<(String, CohortTable)>, total_name: &str) -> Self {
        let mut total_columns: Vec<String> = Vec::new();
        let mut total_records: Vec<Record> = Vec::new();
        let mut cohort_names = Vec::with_capacity(cohorts.len());
        let mut tables = BTreeMap::new();

        for (name, table) in cohorts {
            for col in &table.columns {
                if !total_columns.contains(col) {
                    total_columns.push(col.clone());
                }
            }
            total_records.extend(table.records.iter().cloned());
            cohort_names.push(name.clone());
            tables.insert(name, table);
        }

        tables.insert(
            total_name.to_string(),
            CohortTable::new(total_columns, total_records),
        );

        Dataset {
            cohort_names,
            total_name: total_name.to_string(),
            tables,
        }
    }

    /// Named cohorts in configured order (excludes the total).
    pub fn cohort_names(&self) -> &[String] {
        &self.cohort_names
    }

    /// Named cohorts followed by the total, i.e. the tab order.
    pub fn view_names(&self) -> Vec<String> {
        let mut names = self.cohort_names.clone();
        names.push(self.total_name.clone());
        names
    }

    pub fn total_name(&self) -> &str {
        &self.total_name
    }

    pub fn is_total(&self, cohort: &str) -> bool {
        cohort == self.total_name
    }

    pub fn table(&self, cohort: &str) -> Option<&CohortTable> {
        self.tables.get(cohort)
    }

    pub fn columns_of(&self, cohort: &str) -> Option<&[String]> {
        self.tables.get(cohort).map(|t| t.columns.as_slice())
    }

    pub fn total(&self) -> &CohortTable {
        // The total table is inserted by every constructor.
        &self.tables[&self.total_name]
    }
}
