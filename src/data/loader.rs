use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt8Type,
};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, CohortTable, Dataset, Record};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Table sources
// ---------------------------------------------------------------------------

/// Anything that can hand out a named table as a sequence of records.
pub trait TableSource {
    /// Human readable name used in log lines and errors.
    fn describe(&self) -> String;

    /// Read the table for `cohort`. Fails with [`LoadError::MissingCohort`]
    /// when the source has no such table.
    fn read_table(&mut self, cohort: &str) -> Result<CohortTable, LoadError>;
}

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Open a source by path: a directory of per-cohort files or a workbook.
pub fn open_source(path: &Path) -> Result<Box<dyn TableSource>, LoadError> {
    if path.is_dir() {
        return Ok(Box::new(DirectorySource::new(path)));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        return Err(LoadError::UnsupportedSource(path.to_path_buf()));
    }
    if !path.exists() {
        return Err(LoadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }
    Ok(Box::new(WorkbookSource::open(path)?))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read every cohort from `source` and build the dataset, including the
/// synthetic total named `total_name`.
///
/// Any failure aborts the whole load.
pub fn load(
    source: &mut dyn TableSource,
    cohorts: &[String],
    total_name: &str,
) -> Result<Dataset, LoadError> {
    validate_cohorts(cohorts, total_name)?;

    let mut tables = Vec::with_capacity(cohorts.len());
    for cohort in cohorts {
        let table = source.read_table(cohort)?;
        info!(
            "Loaded cohort '{cohort}': {} rows, {} columns",
            table.len(),
            table.columns.len()
        );
        debug!("Cohort '{cohort}' columns: {:?}", table.columns);
        if table.is_empty() {
            warn!("Cohort '{cohort}' has no rows");
        }
        tables.push((cohort.clone(), table));
    }

    let dataset = Dataset::from_cohorts(tables, total_name);
    info!(
        "Loaded {} cohorts from {} ({} rows in {total_name})",
        cohorts.len(),
        source.describe(),
        dataset.total().len()
    );
    Ok(dataset)
}

/// Open the source at `path` and load `cohorts` from it.
pub fn load_from_path(
    path: &Path,
    cohorts: &[String],
    total_name: &str,
) -> Result<Dataset, LoadError> {
    let mut source = open_source(path)?;
    load(source.as_mut(), cohorts, total_name)
}

fn validate_cohorts(cohorts: &[String], total_name: &str) -> Result<(), LoadError> {
    if cohorts.is_empty() {
        return Err(LoadError::InvalidCohorts("no cohorts configured".to_string()));
    }
    let mut seen = HashSet::new();
    for cohort in cohorts {
        if cohort == total_name {
            return Err(LoadError::InvalidCohorts(format!(
                "'{cohort}' is reserved for the combined view"
            )));
        }
        if !seen.insert(cohort.as_str()) {
            return Err(LoadError::InvalidCohorts(format!(
                "'{cohort}' is listed twice"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared row → record assembly
// ---------------------------------------------------------------------------

/// Turn a header row into column names. Blank header cells are named by
/// position and repeated names get a `.1`, `.2`, ... suffix so no column is
/// lost.
fn header_names(cells: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut suffixes: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::new();

    for (i, name) in cells.into_iter().enumerate() {
        let name = name.trim();
        let base = if name.is_empty() {
            format!("column_{}", i + 1)
        } else {
            name.to_string()
        };

        let mut column = base.clone();
        while used.contains(&column) {
            let n = suffixes.entry(base.clone()).or_insert(0);
            *n += 1;
            column = format!("{base}.{n}");
        }
        used.insert(column.clone());
        columns.push(column);
    }
    columns
}

/// Build records from positional rows. Rows that are entirely blank are
/// skipped; short rows are padded with nulls.
fn table_from_rows(
    cohort: &str,
    columns: Vec<String>,
    rows: impl IntoIterator<Item = Vec<CellValue>>,
) -> CohortTable {
    let records = rows
        .into_iter()
        .filter(|row| row.iter().any(|v| !v.is_null()))
        .map(|row| {
            let mut row = row.into_iter();
            let fields: BTreeMap<String, CellValue> = columns
                .iter()
                .map(|col| (col.clone(), row.next().unwrap_or(CellValue::Null)))
                .collect();
            Record::new(cohort, fields)
        })
        .collect();
    CohortTable::new(columns, records)
}

// ---------------------------------------------------------------------------
// Workbook source (xlsx / xls / ods)
// ---------------------------------------------------------------------------

/// A spreadsheet workbook with one worksheet per cohort. The first row of each
/// worksheet is the header.
pub struct WorkbookSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let workbook = open_workbook_auto(path).map_err(|source| LoadError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "Opened workbook {} with sheets {:?}",
            path.display(),
            workbook.sheet_names()
        );
        Ok(WorkbookSource {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl TableSource for WorkbookSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_table(&mut self, cohort: &str) -> Result<CohortTable, LoadError> {
        if !self.workbook.sheet_names().iter().any(|s| s == cohort) {
            return Err(LoadError::MissingCohort {
                cohort: cohort.to_string(),
                source_name: self.describe(),
            });
        }
        let range = self
            .workbook
            .worksheet_range(cohort)
            .map_err(|source| LoadError::Workbook {
                path: self.path.clone(),
                source,
            })?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            // A blank worksheet is a valid, empty cohort.
            return Ok(CohortTable::default());
        };
        let columns = header_names(header.iter().map(|c| match c {
            Data::Empty => String::new(),
            other => other.to_string(),
        }));

        Ok(table_from_rows(
            cohort,
            columns,
            rows.map(|row| row.iter().map(cell_to_value).collect()),
        ))
    }
}

fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.trim().to_string()),
        Data::Int(i) => CellValue::Integer(*i),
        // Excel stores every number as a float; keep integral ones as integers.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => CellValue::Integer(*f as i64),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Date(s.clone()),
        Data::DateTime(_) => CellValue::Date(cell.to_string()),
        Data::Error(_) | Data::Empty => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// Directory source (one file per cohort)
// ---------------------------------------------------------------------------

/// A directory holding `<cohort>.csv`, `<cohort>.json` or `<cohort>.parquet`
/// for every cohort.
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: &Path) -> Self {
        DirectorySource {
            dir: dir.to_path_buf(),
        }
    }

    fn find_file(&self, cohort: &str) -> Option<PathBuf> {
        ["csv", "json", "parquet", "pq"]
            .iter()
            .map(|ext| self.dir.join(format!("{cohort}.{ext}")))
            .find(|p| p.is_file())
    }
}

impl TableSource for DirectorySource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn read_table(&mut self, cohort: &str) -> Result<CohortTable, LoadError> {
        let path = self.find_file(cohort).ok_or_else(|| LoadError::MissingCohort {
            cohort: cohort.to_string(),
            source_name: self.describe(),
        })?;
        debug!("Reading cohort '{cohort}' from {}", path.display());

        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => load_csv(&path, cohort),
            Some("json") => load_json(&path, cohort),
            _ => load_parquet(&path, cohort),
        }
    }
}

// -- CSV --

fn load_csv(path: &Path, cohort: &str) -> Result<CohortTable, LoadError> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let columns = header_names(reader.headers().map_err(csv_err)?.iter().map(String::from));

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        rows.push(record.iter().map(CellValue::guess).collect());
    }
    Ok(table_from_rows(cohort, columns, rows))
}

// -- JSON --

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [ { "Name": "Ana", "Nationality": "AR" }, ... ]
/// ```
///
/// Columns follow the key order of the objects, first seen first.
fn load_json(path: &Path, cohort: &str) -> Result<CohortTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let malformed = |reason: String| LoadError::Malformed {
        cohort: cohort.to_string(),
        reason,
    };

    let items = root
        .as_array()
        .ok_or_else(|| malformed("expected a top-level JSON array".to_string()))?;

    let mut columns: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let obj = item
            .as_object()
            .ok_or_else(|| malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows: Vec<Vec<CellValue>> = objects
        .into_iter()
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_value).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();
    Ok(table_from_rows(cohort, columns, rows))
}

fn json_to_value(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) if s.trim().is_empty() => CellValue::Null,
        JsonValue::String(s) => CellValue::String(s.trim().to_string()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// -- Parquet --

/// Works with files written by both Pandas (`df.to_parquet()`) and Polars
/// (`df.write_parquet()`). Every column becomes a record field.
fn load_parquet(path: &Path, cohort: &str) -> Result<CohortTable, LoadError> {
    let parquet_err = |source: parquet::errors::ParquetError| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };
    let arrow_err = |source: arrow::error::ArrowError| LoadError::Arrow {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    let columns = header_names(
        builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone()),
    );
    let reader = builder.build().map_err(parquet_err)?;

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(arrow_err)?;
        let column_values = batch
            .columns()
            .iter()
            .map(column_to_values)
            .collect::<Result<Vec<_>, _>>()
            .map_err(arrow_err)?;

        for row in 0..batch.num_rows() {
            rows.push(column_values.iter().map(|col| col[row].clone()).collect());
        }
    }
    Ok(table_from_rows(cohort, columns, rows))
}

/// Convert a whole Arrow column into cell values. Types without a direct
/// mapping (dictionaries, dates, decimals, ...) go through a cast to text.
fn column_to_values(col: &ArrayRef) -> Result<Vec<CellValue>, arrow::error::ArrowError> {
    macro_rules! ints {
        ($ty:ty) => {{
            let arr = col.as_primitive::<$ty>();
            (0..arr.len())
                .map(|i| CellValue::Integer(arr.value(i) as i64))
                .collect()
        }};
    }

    let values: Vec<CellValue> = match col.data_type() {
        DataType::Utf8 => {
            let arr = col.as_string::<i32>();
            (0..arr.len()).map(|i| text_value(arr.value(i))).collect()
        }
        DataType::LargeUtf8 => {
            let arr = col.as_string::<i64>();
            (0..arr.len()).map(|i| text_value(arr.value(i))).collect()
        }
        DataType::Int8 => ints!(Int8Type),
        DataType::Int16 => ints!(Int16Type),
        DataType::Int32 => ints!(Int32Type),
        DataType::Int64 => ints!(Int64Type),
        DataType::UInt8 => ints!(UInt8Type),
        DataType::UInt16 => ints!(UInt16Type),
        DataType::UInt32 => ints!(UInt32Type),
        DataType::Float32 => {
            let arr = col.as_primitive::<Float32Type>();
            (0..arr.len())
                .map(|i| CellValue::Float(arr.value(i) as f64))
                .collect()
        }
        DataType::Float64 => {
            let arr = col.as_primitive::<Float64Type>();
            (0..arr.len()).map(|i| CellValue::Float(arr.value(i))).collect()
        }
        DataType::Boolean => {
            let arr = col.as_boolean();
            (0..arr.len()).map(|i| CellValue::Bool(arr.value(i))).collect()
        }
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => {
            let text = arrow::compute::cast(col, &DataType::Utf8)?;
            let arr = text.as_string::<i32>();
            (0..arr.len())
                .map(|i| CellValue::Date(arr.value(i).to_string()))
                .collect()
        }
        _ => {
            let text = arrow::compute::cast(col, &DataType::Utf8)?;
            return Ok(column_to_values(&text)?
                .into_iter()
                .enumerate()
                .map(|(i, v)| if col.is_null(i) { CellValue::Null } else { v })
                .collect());
        }
    };

    // Apply the null mask last; `value(i)` on a null slot is a placeholder.
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, v)| if col.is_null(i) { CellValue::Null } else { v })
        .collect())
}

fn text_value(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}
