use thiserror::Error;

/// Fatal conditions raised by the library.
///
/// Anything recoverable (stage order violations, unsupported modes,
/// degenerate numeric input) is reported as a [`crate::state::Notice`]
/// instead and never shows up here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Two spectra in one collection share an identifier.
    #[error("duplicate spectrum id: {0}")]
    DuplicateId(String),

    /// A spectrum's mass and intensity vectors differ in length.
    #[error("spectrum {id}: {masses} masses but {intensities} intensities")]
    LengthMismatch {
        id: String,
        masses: usize,
        intensities: usize,
    },

    /// A table row names a spectrum the collection does not contain.
    #[error("no spectrum with id '{0}' in collection")]
    UnknownSpectrum(String),

    #[error("unknown imputation method '{0}' (expected knn, mean, basic or half-min)")]
    UnknownImputationMethod(String),

    #[error("unknown binning statistic '{0}' (expected mean, sum, median, count, min, max or std)")]
    UnknownStatistic(String),

    /// An option value outside its valid range.
    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
