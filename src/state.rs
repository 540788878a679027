use std::fmt;

// ---------------------------------------------------------------------------
// Stage flags
// ---------------------------------------------------------------------------

/// Which pipeline stages have been applied to the collection.
///
/// These are status markers, not locks: running a stage again simply
/// re-runs it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageFlags {
    pub outlier_detected: bool,
    pub binned: bool,
    pub centered: bool,
    pub value_imputed: bool,
}

// ---------------------------------------------------------------------------
// Notices – the non-fatal warning channel
// ---------------------------------------------------------------------------

/// Processing stage, used to label notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    OutlierDetection,
    Binning,
    Centering,
    Imputation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::OutlierDetection => write!(f, "outlier detection"),
            Stage::Binning => write!(f, "binning"),
            Stage::Centering => write!(f, "centering"),
            Stage::Imputation => write!(f, "imputation"),
        }
    }
}

/// Something the caller should know about that did not abort processing.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Outlier detection removed these spectra (possibly none).
    OutliersRemoved(Vec<String>),
    /// Outlier detection flagged these spectra but left them in place.
    OutliersFound(Vec<String>),
    /// All TICs are identical, so no spectrum can be an outlier.
    ZeroDeviation,
    /// The spectrum's mass range yields fewer than one bin.
    DegenerateBinning { id: String },
    /// Centering was requested before binning; nothing changed.
    NotBinned,
    /// Imputation was requested before centering; nothing changed.
    NotCentered,
    /// The stage only works in place; nothing changed.
    NotInPlaceUnsupported(Stage),
    /// Columns removed by the occupancy filter.
    SparseColumnsDropped(usize),
    /// Columns with no observed value could not be mean-filled and were removed.
    EmptyColumnsDropped(usize),
    /// Half-minimum fill found no observed value anywhere.
    NothingToImpute,
}

impl Notice {
    /// Precondition and unsupported-mode notices mean the stage was skipped.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Notice::NotBinned | Notice::NotCentered | Notice::NotInPlaceUnsupported(_)
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::OutliersRemoved(ids) => {
                write!(f, "Outlier detection removed: {}", ids.join(","))
            }
            Notice::OutliersFound(ids) => {
                write!(f, "Outlier detection found (not removed): {}", ids.join(","))
            }
            Notice::ZeroDeviation => {
                write!(f, "All spectra have the same TIC, no outliers can be detected")
            }
            Notice::DegenerateBinning { id } => {
                write!(f, "Spectrum {id} spans less than one bin, binned to an empty spectrum")
            }
            Notice::NotBinned => write!(f, "You need to bin the data before you can center it"),
            Notice::NotCentered => {
                write!(f, "You need to center the data before you can impute missing values")
            }
            Notice::NotInPlaceUnsupported(stage) => {
                write!(f, "Non in-place {stage} is not implemented")
            }
            Notice::SparseColumnsDropped(n) => {
                write!(f, "Occupancy filter dropped {n} mass columns")
            }
            Notice::EmptyColumnsDropped(n) => {
                write!(f, "Dropped {n} mass columns without any observed value")
            }
            Notice::NothingToImpute => write!(f, "No observed values, nothing to impute from"),
        }
    }
}
