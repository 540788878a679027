use std::collections::{BTreeSet, HashMap};

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use crate::data::model::SpectrumCollection;
use crate::data::table::MISSING;
use crate::error::Result;

/// Sorted, de-duplicated union of every spectrum's mass values.
///
/// Duplicates are removed so that the shared axis has one column per
/// distinct mass.
pub fn shared_axis(collection: &SpectrumCollection) -> Vec<f64> {
    collection
        .iter()
        .flat_map(|sp| sp.masses.iter().copied())
        .map(OrderedFloat)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(OrderedFloat::into_inner)
        .collect()
}

/// Look up each axis mass in the spectrum by exact value; masses the
/// spectrum does not have become the missing marker.
pub fn project(masses: &[f64], intensities: &[f64], axis: &[f64]) -> Vec<f64> {
    let mut lookup: HashMap<OrderedFloat<f64>, f64> = HashMap::with_capacity(masses.len());
    for (m, v) in masses.iter().zip(intensities) {
        lookup.entry(OrderedFloat(*m)).or_insert(*v);
    }
    axis.iter()
        .map(|m| lookup.get(&OrderedFloat(*m)).copied().unwrap_or(MISSING))
        .collect()
}

/// Reproject every spectrum onto `axis` on a pool of `parallelism`
/// worker threads. Results are keyed by spectrum id.
pub fn center_collection(
    collection: &SpectrumCollection,
    axis: &[f64],
    parallelism: usize,
) -> Result<HashMap<String, Vec<f64>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.max(1))
        .build()?;

    let centered: Vec<(String, Vec<f64>)> = pool.install(|| {
        collection
            .spectra()
            .par_iter()
            .map(|sp| (sp.id.clone(), project(&sp.masses, &sp.intensities, axis)))
            .collect()
    });

    Ok(centered.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Spectrum;

    fn binned() -> SpectrumCollection {
        SpectrumCollection::new(vec![
            Spectrum::new("a", vec![100.0, 101.0, 102.0], vec![1.0, 2.0, 3.0]),
            Spectrum::new("b", vec![101.0, 102.0, 103.0], vec![4.0, 5.0, 6.0]),
            Spectrum::new("c", vec![99.0], vec![7.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_shared_axis_sorted_and_unique() {
        assert_eq!(shared_axis(&binned()), vec![99.0, 100.0, 101.0, 102.0, 103.0]);
    }

    #[test]
    fn test_project_exact_match_only() {
        let axis = [100.0, 100.5, 101.0];
        let out = project(&[100.0, 101.0000001], &[5.0, 6.0], &axis);
        assert_eq!(out[0], 5.0);
        assert!(out[1].is_nan());
        assert!(out[2].is_nan());
    }

    #[test]
    fn test_center_collection_by_id() {
        let coll = binned();
        let axis = shared_axis(&coll);
        let centered = center_collection(&coll, &axis, 3).unwrap();

        assert_eq!(centered.len(), 3);
        let b = &centered["b"];
        assert_eq!(b.len(), axis.len());
        assert!(b[0].is_nan() && b[1].is_nan());
        assert_eq!(&b[2..], &[4.0, 5.0, 6.0]);
        assert_eq!(centered["c"][0], 7.0);
    }
}
