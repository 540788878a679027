use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Closed option enums
// ---------------------------------------------------------------------------

/// Aggregate applied to the intensities that fall into one mass bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    #[default]
    Mean,
    Sum,
    Median,
    Count,
    Min,
    Max,
    /// Population standard deviation.
    Std,
}

impl FromStr for Statistic {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Statistic::Mean),
            "sum" => Ok(Statistic::Sum),
            "median" => Ok(Statistic::Median),
            "count" => Ok(Statistic::Count),
            "min" => Ok(Statistic::Min),
            "max" => Ok(Statistic::Max),
            "std" => Ok(Statistic::Std),
            _ => Err(PipelineError::UnknownStatistic(s.to_string())),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Statistic::Mean => "mean",
            Statistic::Sum => "sum",
            Statistic::Median => "median",
            Statistic::Count => "count",
            Statistic::Min => "min",
            Statistic::Max => "max",
            Statistic::Std => "std",
        };
        write!(f, "{label}")
    }
}

/// Strategy for filling missing cells after the occupancy filter.
///
/// `ColumnMean` is what the `knn` label has always selected: every
/// missing cell takes the mean of the observed values in its column.
/// No neighbour search is involved; the label is kept as an alias so
/// existing configurations continue to work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImputationMethod {
    #[default]
    #[serde(rename = "mean", alias = "knn")]
    ColumnMean,
    /// Half of the smallest observed value in the whole table.
    #[serde(rename = "half-min", alias = "basic")]
    HalfMinimum,
}

impl FromStr for ImputationMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "knn" | "mean" => Ok(ImputationMethod::ColumnMean),
            "basic" | "half-min" => Ok(ImputationMethod::HalfMinimum),
            _ => Err(PipelineError::UnknownImputationMethod(s.to_string())),
        }
    }
}

impl fmt::Display for ImputationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImputationMethod::ColumnMean => write!(f, "column mean"),
            ImputationMethod::HalfMinimum => write!(f, "half minimum"),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-stage options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierOptions {
    /// Spectra scoring strictly above this many mean absolute deviations are outliers.
    pub mad_threshold: f64,
    pub inplace: bool,
}

impl Default for OutlierOptions {
    fn default() -> Self {
        Self {
            mad_threshold: 3.0,
            inplace: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinningOptions {
    pub bin_size: f64,
    pub statistic: Statistic,
    pub inplace: bool,
    /// Worker threads; 0 is treated as 1.
    pub parallelism: usize,
}

impl Default for BinningOptions {
    fn default() -> Self {
        Self {
            bin_size: 1.0,
            statistic: Statistic::Mean,
            inplace: true,
            parallelism: 1,
        }
    }
}

impl BinningOptions {
    pub fn validate(&self) -> Result<()> {
        if !self.bin_size.is_finite() || self.bin_size <= 0.0 {
            return Err(PipelineError::InvalidOption {
                name: "bin_size",
                reason: format!("must be a positive number, got {}", self.bin_size),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CenteringOptions {
    /// Only in-place centering is supported.
    pub inplace: bool,
    pub parallelism: usize,
}

impl Default for CenteringOptions {
    fn default() -> Self {
        Self {
            inplace: true,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationOptions {
    pub method: ImputationMethod,
    /// Minimum fraction of spectra that must observe a mass for it to be kept.
    pub occupancy_threshold: f64,
    pub inplace: bool,
}

impl Default for ImputationOptions {
    fn default() -> Self {
        Self {
            method: ImputationMethod::ColumnMean,
            occupancy_threshold: 0.5,
            inplace: true,
        }
    }
}

impl ImputationOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.occupancy_threshold) {
            return Err(PipelineError::InvalidOption {
                name: "occupancy_threshold",
                reason: format!("must lie in [0, 1], got {}", self.occupancy_threshold),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Whole-pipeline configuration
// ---------------------------------------------------------------------------

/// Options for every stage, loadable from JSON. Absent keys take defaults.
///
/// ```json
/// { "binning": { "bin_size": 0.5, "statistic": "sum", "parallelism": 4 },
///   "imputation": { "method": "basic" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub outlier: OutlierOptions,
    pub binning: BinningOptions,
    pub centering: CenteringOptions,
    pub imputation: ImputationOptions,
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.outlier.mad_threshold, 3.0);
        assert!(cfg.outlier.inplace);
        assert_eq!(cfg.binning.bin_size, 1.0);
        assert_eq!(cfg.binning.statistic, Statistic::Mean);
        assert_eq!(cfg.binning.parallelism, 1);
        assert_eq!(cfg.imputation.method, ImputationMethod::ColumnMean);
        assert_eq!(cfg.imputation.occupancy_threshold, 0.5);
    }

    #[test]
    fn test_json_partial_config_with_legacy_labels() {
        let cfg = PipelineConfig::from_json_str(
            r#"{"binning": {"bin_size": 0.25, "statistic": "median"}, "imputation": {"method": "basic"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.binning.bin_size, 0.25);
        assert_eq!(cfg.binning.statistic, Statistic::Median);
        assert!(cfg.binning.inplace);
        assert_eq!(cfg.imputation.method, ImputationMethod::HalfMinimum);

        let knn = PipelineConfig::from_json_str(r#"{"imputation": {"method": "knn"}}"#).unwrap();
        assert_eq!(knn.imputation.method, ImputationMethod::ColumnMean);
    }

    #[test]
    fn test_unknown_labels_fail() {
        assert!(matches!(
            "spline".parse::<ImputationMethod>(),
            Err(PipelineError::UnknownImputationMethod(_))
        ));
        assert!(matches!(
            "mode".parse::<Statistic>(),
            Err(PipelineError::UnknownStatistic(_))
        ));
        assert!(PipelineConfig::from_json_str(r#"{"imputation": {"method": "spline"}}"#).is_err());
    }

    #[test]
    fn test_validation() {
        let bad_bin = BinningOptions { bin_size: 0.0, ..Default::default() };
        assert!(bad_bin.validate().is_err());
        let bad_occ = ImputationOptions { occupancy_threshold: 1.5, ..Default::default() };
        assert!(bad_occ.validate().is_err());
        assert!(ImputationOptions::default().validate().is_ok());
    }
}
