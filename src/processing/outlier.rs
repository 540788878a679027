use statrs::statistics::Statistics;

use crate::data::model::SpectrumCollection;

/// Per-spectrum deviation scores and the statistics they were derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct TicScores {
    pub tics: Vec<f64>,
    pub mean_tic: f64,
    pub mean_abs_dev: f64,
    /// `|tic - mean_tic| / mean_abs_dev`; all zero when the deviation is
    /// negligible.
    pub scores: Vec<f64>,
}

impl TicScores {
    /// True when every spectrum has the same TIC, up to summation rounding.
    pub fn is_degenerate(&self) -> bool {
        !self.tics.is_empty() && negligible_deviation(self.mean_abs_dev, self.mean_tic, self.tics.len())
    }
}

/// A mean absolute deviation no larger than the rounding error of summing
/// `n` TICs near `mean_tic` counts as zero.
fn negligible_deviation(mean_abs_dev: f64, mean_tic: f64, n: usize) -> bool {
    mean_abs_dev <= f64::EPSILON * mean_tic.abs() * n as f64
}

/// Score every spectrum by how far its TIC lies from the mean TIC, in
/// units of the mean absolute deviation.
///
/// This is a symmetric, mean-based test and not robust to the outliers
/// it is looking for; it is *not* a median absolute deviation test.
pub fn tic_scores(collection: &SpectrumCollection) -> TicScores {
    let tics: Vec<f64> = collection.iter().map(|sp| sp.tic()).collect();
    if tics.is_empty() {
        return TicScores {
            tics,
            mean_tic: f64::NAN,
            mean_abs_dev: f64::NAN,
            scores: Vec::new(),
        };
    }

    let mean_tic = tics.iter().mean();
    let mean_abs_dev = tics.iter().map(|t| (t - mean_tic).abs()).mean();

    let flat = negligible_deviation(mean_abs_dev, mean_tic, tics.len());
    let scores = tics
        .iter()
        .map(|t| {
            if flat {
                0.0
            } else {
                (t - mean_tic).abs() / mean_abs_dev
            }
        })
        .collect();

    TicScores {
        tics,
        mean_tic,
        mean_abs_dev,
        scores,
    }
}

/// Ids of spectra whose score is strictly greater than `threshold`,
/// in collection order.
pub fn detect(collection: &SpectrumCollection, threshold: f64) -> Vec<String> {
    let scores = tic_scores(collection);
    log::debug!(
        "TIC mean {:.3}, mean absolute deviation {:.3}",
        scores.mean_tic,
        scores.mean_abs_dev
    );
    collection
        .iter()
        .zip(&scores.scores)
        .filter(|(_, score)| **score > threshold)
        .map(|(sp, _)| sp.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Spectrum;

    fn collection(tics: &[f64]) -> SpectrumCollection {
        SpectrumCollection::new(
            tics.iter()
                .enumerate()
                .map(|(i, t)| Spectrum::new(format!("s{i}"), vec![100.0, 101.0], vec![t / 2.0, t / 2.0]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_scores_match_hand_calculation() {
        // mean = 25, deviations 15, 5, 5, 15 -> MAD 10
        let s = tic_scores(&collection(&[10.0, 20.0, 30.0, 40.0]));
        assert!((s.mean_tic - 25.0).abs() < 1e-9);
        assert!((s.mean_abs_dev - 10.0).abs() < 1e-9);
        assert!((s.scores[0] - 1.5).abs() < 1e-9);
        assert!((s.scores[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_single_large_tic_is_flagged() {
        let mut tics = vec![100.0; 19];
        tics.push(10_000.0);
        let outliers = detect(&collection(&tics), 3.0);
        assert_eq!(outliers, vec!["s19".to_string()]);
    }

    #[test]
    fn test_identical_tics_yield_no_outliers() {
        let coll = collection(&[50.0, 50.0, 50.0]);
        let s = tic_scores(&coll);
        assert!(s.is_degenerate());
        assert!(s.scores.iter().all(|v| *v == 0.0));
        for threshold in [0.001, 1.0, 3.0] {
            assert!(detect(&coll, threshold).is_empty());
        }
    }

    #[test]
    fn test_rounding_noise_is_not_deviation() {
        // 0.3 + 0.2 + 0.1 and 0.1 + 0.2 + 0.3 differ in the last bit
        let mut spectra: Vec<Spectrum> = (0..8)
            .map(|i| Spectrum::new(format!("s{i}"), vec![1.0, 2.0, 3.0], vec![0.3, 0.2, 0.1]))
            .collect();
        spectra.push(Spectrum::new("odd", vec![1.0, 2.0, 3.0], vec![0.1, 0.2, 0.3]));
        let coll = SpectrumCollection::new(spectra).unwrap();

        let s = tic_scores(&coll);
        assert_ne!(s.tics[0], s.tics[8]);
        assert!(s.is_degenerate());
        assert!(s.scores.iter().all(|v| *v == 0.0));
        for threshold in [0.001, 1.0, 3.0] {
            assert!(detect(&coll, threshold).is_empty());
        }

        let small = SpectrumCollection::new(vec![
            Spectrum::new("a", vec![1.0, 2.0, 3.0], vec![0.3, 0.2, 0.1]),
            Spectrum::new("b", vec![1.0, 2.0, 3.0], vec![0.1, 0.2, 0.3]),
            Spectrum::new("c", vec![1.0, 2.0, 3.0], vec![0.3, 0.2, 0.1]),
        ])
        .unwrap();
        assert!(detect(&small, 1.0).is_empty());
    }

    #[test]
    fn test_outlier_sets_shrink_as_threshold_grows() {
        let coll = collection(&[1.0, 5.0, 9.0, 40.0, 2.0, 80.0, 3.0]);
        let thresholds = [0.0, 0.5, 1.0, 1.5, 2.0, 3.0];
        for pair in thresholds.windows(2) {
            let loose = detect(&coll, pair[0]);
            let tight = detect(&coll, pair[1]);
            assert!(tight.iter().all(|id| loose.contains(id)));
        }
    }

    #[test]
    fn test_missing_intensities_excluded_from_tic() {
        let coll = SpectrumCollection::new(vec![
            Spectrum::new("a", vec![1.0, 2.0], vec![f64::NAN, 4.0]),
            Spectrum::new("b", vec![1.0, 2.0], vec![2.0, 2.0]),
        ])
        .unwrap();
        let s = tic_scores(&coll);
        assert_eq!(s.tics, vec![4.0, 4.0]);
        assert!(s.is_degenerate());
    }

    #[test]
    fn test_empty_collection() {
        let coll = SpectrumCollection::default();
        assert!(detect(&coll, 3.0).is_empty());
        assert!(!tic_scores(&coll).is_degenerate());
    }
}
