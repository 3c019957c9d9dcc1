/// Data layer: core types, loading, range selection and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table (+ column titles)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Spectrum  │  baseline table + shifted/scaled working table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  range    │  restrict a table to an x window
///   └──────────┘
/// ```

pub mod export;
pub mod loader;
pub mod model;
pub mod range;
