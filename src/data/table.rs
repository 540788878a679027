use std::collections::HashMap;

use ordered_float::OrderedFloat;

use super::model::Spectrum;
use crate::error::{PipelineError, Result};

/// Marker for a cell with no value. Distinct from `0.0`.
pub const MISSING: f64 = f64::NAN;

#[inline]
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

// ---------------------------------------------------------------------------
// IntensityTable – row(id) × column(mass) view of a collection
// ---------------------------------------------------------------------------

/// Dense row-major intensity matrix keyed by spectrum id and mass.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityTable {
    ids: Vec<String>,
    masses: Vec<f64>,
    /// `values[row][col]`
    values: Vec<Vec<f64>>,
}

impl IntensityTable {
    pub fn new(ids: Vec<String>, masses: Vec<f64>, values: Vec<Vec<f64>>) -> Result<Self> {
        if ids.len() != values.len() {
            return Err(PipelineError::InvalidOption {
                name: "values",
                reason: format!("{} row ids but {} rows", ids.len(), values.len()),
            });
        }
        if let Some((row, r)) = values.iter().enumerate().find(|(_, r)| r.len() != masses.len()) {
            return Err(PipelineError::LengthMismatch {
                id: ids[row].clone(),
                masses: masses.len(),
                intensities: r.len(),
            });
        }
        Ok(IntensityTable { ids, masses, values })
    }

    /// Union of all masses (first-seen order, exact equality) as columns.
    pub fn from_spectra(spectra: &[Spectrum]) -> Self {
        let mut column_of: HashMap<OrderedFloat<f64>, usize> = HashMap::new();
        let mut masses = Vec::new();
        for sp in spectra {
            for &m in &sp.masses {
                column_of.entry(OrderedFloat(m)).or_insert_with(|| {
                    masses.push(m);
                    masses.len() - 1
                });
            }
        }

        let values = spectra
            .iter()
            .map(|sp| {
                let mut row = vec![MISSING; masses.len()];
                let mut filled = vec![false; masses.len()];
                for (m, v) in sp.masses.iter().zip(&sp.intensities) {
                    let col = column_of[&OrderedFloat(*m)];
                    // first occurrence of a repeated mass wins
                    if !filled[col] {
                        row[col] = *v;
                        filled[col] = true;
                    }
                }
                row
            })
            .collect();

        IntensityTable {
            ids: spectra.iter().map(|sp| sp.id.clone()).collect(),
            masses,
            values,
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row]
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    pub fn n_rows(&self) -> usize {
        self.ids.len()
    }

    pub fn n_cols(&self) -> usize {
        self.masses.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    /// Number of non-missing cells in column `col`.
    pub fn occupancy(&self, col: usize) -> usize {
        self.values.iter().filter(|r| !is_missing(r[col])).count()
    }

    pub fn has_missing(&self) -> bool {
        self.values.iter().flatten().any(|v| is_missing(*v))
    }

    /// Keep columns whose flag in `keep` is true.
    pub fn retain_columns(&mut self, keep: &[bool]) {
        let select = |row: &[f64]| -> Vec<f64> {
            row.iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| *v)
                .collect()
        };
        self.masses = select(&self.masses);
        for row in &mut self.values {
            *row = select(row);
        }
    }

    /// Drop columns with fewer than `threshold * n_rows` observed cells.
    /// Returns the masses of the dropped columns.
    pub fn drop_sparse_columns(&mut self, threshold: f64) -> Vec<f64> {
        let required = threshold * self.n_rows() as f64;
        let keep: Vec<bool> = (0..self.n_cols())
            .map(|col| self.occupancy(col) as f64 >= required)
            .collect();
        let dropped = self
            .masses
            .iter()
            .zip(&keep)
            .filter(|(_, k)| !**k)
            .map(|(m, _)| *m)
            .collect();
        self.retain_columns(&keep);
        dropped
    }

    /// Smallest observed value anywhere in the table.
    pub fn min_value(&self) -> Option<f64> {
        self.values
            .iter()
            .flatten()
            .copied()
            .filter(|v| !is_missing(*v))
            .reduce(f64::min)
    }

    /// Values of column `col` that are not missing.
    pub fn observed(&self, col: usize) -> Vec<f64> {
        self.values
            .iter()
            .map(|r| r[col])
            .filter(|v| !is_missing(*v))
            .collect()
    }

    /// Replace every missing cell in column `col` with `value`.
    pub fn fill_column(&mut self, col: usize, value: f64) {
        for row in &mut self.values {
            if is_missing(row[col]) {
                row[col] = value;
            }
        }
    }

    /// Replace every missing cell with `value`.
    pub fn fill_all(&mut self, value: f64) {
        for v in self.values.iter_mut().flatten() {
            if is_missing(*v) {
                *v = value;
            }
        }
    }
}
