/// Data layer: core types, the tabular view, file I/O and polarity selection.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SpectrumCollection
///   └──────────┘
///        │
///        ▼
///   ┌────────────────────┐
///   │ SpectrumCollection │  Vec<Spectrum>, id-unique
///   └────────────────────┘
///        │            ▲
///  to_table()   apply_table()
///        ▼            │
///   ┌────────────────┐
///   │ IntensityTable │  rows = id, columns = mass, NaN = missing
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  wide CSV / Parquet
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod table;
pub mod writer;
