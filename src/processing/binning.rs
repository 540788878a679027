use std::collections::HashMap;

use rayon::prelude::*;
use statrs::statistics::{Data, Median, Statistics};

use crate::config::Statistic;
use crate::data::model::SpectrumCollection;
use crate::data::table::MISSING;
use crate::error::Result;

/// Binned mass axis (left edges) and the aggregated intensity per bin.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedSpectrum {
    pub masses: Vec<f64>,
    pub intensities: Vec<f64>,
}

impl BinnedSpectrum {
    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }
}

/// Bin edges from `round(min)` towards `round(max)` in steps of
/// `bin_size`, the stop value excluded.
///
/// Rounding is half-to-even. The edge count is `ceil((r_max - r_min) / bin_size)`.
pub fn bin_edges(masses: &[f64], bin_size: f64) -> Vec<f64> {
    let finite = masses.iter().copied().filter(|m| m.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| {
        (lo.min(m), hi.max(m))
    });
    if lo > hi {
        return Vec::new();
    }

    let start = lo.round_ties_even();
    let stop = hi.round_ties_even();
    let n = ((stop - start) / bin_size).ceil().max(0.0) as usize;
    (0..n).map(|i| start + i as f64 * bin_size).collect()
}

/// Index of the bin holding `mass`, given sorted `edges`.
///
/// Bins are half-open `[e_i, e_{i+1})` except the last, which also
/// holds its right edge. Masses outside every bin yield `None`.
fn bin_index(edges: &[f64], mass: f64) -> Option<usize> {
    let n_bins = edges.len().checked_sub(1).filter(|n| *n > 0)?;
    if !(mass >= edges[0] && mass <= edges[n_bins]) {
        return None;
    }
    let i = edges.partition_point(|e| *e <= mass) - 1;
    Some(i.min(n_bins - 1))
}

fn aggregate(values: Vec<f64>, statistic: Statistic) -> f64 {
    if values.is_empty() {
        return MISSING;
    }
    match statistic {
        Statistic::Mean => values.iter().mean(),
        Statistic::Sum => values.iter().sum(),
        Statistic::Median => Data::new(values).median(),
        Statistic::Count => values.len() as f64,
        Statistic::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Statistic::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Statistic::Std => values.iter().population_std_dev(),
    }
}

/// Resample one spectrum onto equal-width bins.
///
/// Empty bins hold the missing marker for every statistic. Missing
/// input intensities are ignored. A mass range shorter than one bin
/// gives an empty result.
pub fn bin_spectrum(
    masses: &[f64],
    intensities: &[f64],
    bin_size: f64,
    statistic: Statistic,
) -> BinnedSpectrum {
    let edges = bin_edges(masses, bin_size);
    let n_bins = edges.len().saturating_sub(1);

    let mut members: Vec<Vec<f64>> = vec![Vec::new(); n_bins];
    for (m, v) in masses.iter().zip(intensities) {
        if v.is_nan() {
            continue;
        }
        if let Some(i) = bin_index(&edges, *m) {
            members[i].push(*v);
        }
    }

    BinnedSpectrum {
        masses: edges.into_iter().take(n_bins).collect(),
        intensities: members
            .into_iter()
            .map(|vals| aggregate(vals, statistic))
            .collect(),
    }
}

/// Bin every spectrum of the collection on a pool of `parallelism`
/// worker threads.
///
/// Workers see read-only spectra and return plain data; the result is
/// keyed by spectrum id so callers never depend on completion order.
pub fn bin_collection(
    collection: &SpectrumCollection,
    bin_size: f64,
    statistic: Statistic,
    parallelism: usize,
) -> Result<HashMap<String, BinnedSpectrum>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.max(1))
        .build()?;

    let binned: Vec<(String, BinnedSpectrum)> = pool.install(|| {
        collection
            .spectra()
            .par_iter()
            .map(|sp| {
                (
                    sp.id.clone(),
                    bin_spectrum(&sp.masses, &sp.intensities, bin_size, statistic),
                )
            })
            .collect()
    });

    Ok(binned.into_iter().collect())
}
