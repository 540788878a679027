/// Cleaning and alignment stages.
///
/// ```text
///   SpectrumCollection
///        │
///        ▼
///   outlier    TIC deviation scoring, removal
///        │
///        ▼
///   binning    per-spectrum equal-width bins (worker pool)
///        │
///        ▼
///   centering  shared mass axis, exact-mass reprojection (worker pool)
///        │
///        ▼
///   imputation occupancy filter, missing-value fill
/// ```
///
/// [`pipeline::Pipeline`] runs the stages against a borrowed collection
/// and enforces their order.

pub mod binning;
pub mod centering;
pub mod imputation;
pub mod outlier;
pub mod pipeline;
