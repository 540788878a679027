use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::table::IntensityTable;
use crate::error::{PipelineError, Result};

// ---------------------------------------------------------------------------
// Polarity – ionisation mode of a spectrum
// ---------------------------------------------------------------------------

/// Ionisation mode the spectrum was acquired in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    #[default]
    Unknown,
}

impl FromStr for Polarity {
    type Err = std::convert::Infallible;

    /// Never fails: unrecognised labels map to [`Polarity::Unknown`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "positive" | "pos" | "+" => Polarity::Positive,
            "negative" | "neg" | "-" => Polarity::Negative,
            _ => Polarity::Unknown,
        })
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => write!(f, "positive"),
            Polarity::Negative => write!(f, "negative"),
            Polarity::Unknown => write!(f, "unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one row of the collection
// ---------------------------------------------------------------------------

/// A single spectrum: index-aligned mass and intensity vectors.
///
/// Missing intensities are stored as `f64::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Unique within a collection.
    pub id: String,
    pub polarity: Polarity,
    /// Mass axis (m/z), ascending.
    pub masses: Vec<f64>,
    /// Intensity axis – same length as `masses`.
    pub intensities: Vec<f64>,
}

impl Spectrum {
    pub fn new(id: impl Into<String>, masses: Vec<f64>, intensities: Vec<f64>) -> Self {
        Spectrum {
            id: id.into(),
            polarity: Polarity::Unknown,
            masses,
            intensities,
        }
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Total ion current. Missing values are left out of the sum.
    pub fn tic(&self) -> f64 {
        self.intensities.iter().filter(|v| !v.is_nan()).sum()
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    fn check_aligned(&self) -> Result<()> {
        if self.masses.len() != self.intensities.len() {
            return Err(PipelineError::LengthMismatch {
                id: self.id.clone(),
                masses: self.masses.len(),
                intensities: self.intensities.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Spectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spectrum(id: {}, polarity: {}, data points: {}, tic: {:.3})",
            self.id,
            self.polarity,
            self.len(),
            self.tic()
        )
    }
}

// ---------------------------------------------------------------------------
// SpectrumCollection – the complete loaded dataset
// ---------------------------------------------------------------------------

/// Ordered, id-unique collection of spectra.
#[derive(Debug, Clone, Default)]
pub struct SpectrumCollection {
    spectra: Vec<Spectrum>,
}

impl SpectrumCollection {
    /// Validate ids and vector lengths, keeping the input order.
    pub fn new(spectra: Vec<Spectrum>) -> Result<Self> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(spectra.len());
        for sp in &spectra {
            sp.check_aligned()?;
            if !seen.insert(sp.id.as_str()) {
                return Err(PipelineError::DuplicateId(sp.id.clone()));
            }
        }
        Ok(SpectrumCollection { spectra })
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Spectrum> {
        self.spectra.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.spectra.iter().map(|sp| sp.id.as_str()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Spectrum> {
        self.spectra.iter().find(|sp| sp.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Spectrum> {
        self.spectra.iter_mut().find(|sp| sp.id == id)
    }

    /// Remove the spectrum with the given id, returning it.
    pub fn remove(&mut self, id: &str) -> Option<Spectrum> {
        let pos = self.spectra.iter().position(|sp| sp.id == id)?;
        Some(self.spectra.remove(pos))
    }

    /// Keep only spectra for which `keep` returns true.
    pub fn retain<F: FnMut(&Spectrum) -> bool>(&mut self, keep: F) {
        self.spectra.retain(keep);
    }

    /// Replace masses and intensities of the spectrum `id`.
    pub fn replace(&mut self, id: &str, masses: Vec<f64>, intensities: Vec<f64>) -> Result<()> {
        let sp = self
            .get_mut(id)
            .ok_or_else(|| PipelineError::UnknownSpectrum(id.to_string()))?;
        sp.masses = masses;
        sp.intensities = intensities;
        sp.check_aligned()
    }

    /// Flatten to a row(id) × column(mass) table.
    ///
    /// Columns are the union of every mass value in first-seen order,
    /// cells a spectrum has no value for hold the missing marker.
    pub fn to_table(&self) -> IntensityTable {
        IntensityTable::from_spectra(&self.spectra)
    }

    /// Build a fresh collection from a table, one spectrum per row.
    pub fn from_table(table: &IntensityTable) -> Result<Self> {
        let spectra = table
            .ids()
            .iter()
            .enumerate()
            .map(|(row, id)| Spectrum::new(id.clone(), table.masses().to_vec(), table.row(row).to_vec()))
            .collect();
        Self::new(spectra)
    }

    /// Overwrite each spectrum named by a table row with the table's
    /// masses and that row's intensities.
    ///
    /// All row ids are resolved before anything is written, so an
    /// unknown id leaves the collection untouched.
    pub fn apply_table(&mut self, table: &IntensityTable) -> Result<()> {
        let positions = table
            .ids()
            .iter()
            .map(|id| {
                self.spectra
                    .iter()
                    .position(|sp| &sp.id == id)
                    .ok_or_else(|| PipelineError::UnknownSpectrum(id.clone()))
            })
            .collect::<Result<Vec<usize>>>()?;

        for (row, pos) in positions.into_iter().enumerate() {
            let sp = &mut self.spectra[pos];
            sp.masses = table.masses().to_vec();
            sp.intensities = table.row(row).to_vec();
        }
        Ok(())
    }

    pub fn into_spectra(self) -> Vec<Spectrum> {
        self.spectra
    }
}

impl<'a> IntoIterator for &'a SpectrumCollection {
    type Item = &'a Spectrum;
    type IntoIter = std::slice::Iter<'a, Spectrum>;

    fn into_iter(self) -> Self::IntoIter {
        self.spectra.iter()
    }
}
