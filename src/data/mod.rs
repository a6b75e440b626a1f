/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .xlsx workbook  /  directory of <cohort>.csv|json|parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  one table per cohort → Dataset (+ TOTAL)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  drop values rarer than min_count (TOTAL only)
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate │  value → count, percentage, ordered
///   └───────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
