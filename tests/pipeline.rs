use dims_align::config::{BinningOptions, CenteringOptions, ImputationOptions, OutlierOptions};
use dims_align::data::table::is_missing;
use dims_align::{
    ImputationMethod, Notice, Pipeline, PipelineConfig, PipelineError, Spectrum,
    SpectrumCollection, Statistic,
};

/// Spectra with peaks spread over 100–160 m/z; every third spectrum lacks
/// the peaks above 150.
fn dataset(n: usize) -> SpectrumCollection {
    let spectra = (0..n)
        .map(|i| {
            let offset = (i % 5) as f64 * 0.01;
            let upper = if i % 3 == 0 { 150.0 } else { 160.0 };
            let masses: Vec<f64> = (0..)
                .map(|k| 100.0 + offset + k as f64 * 0.45)
                .take_while(|m| *m < upper)
                .collect();
            let intensities = masses
                .iter()
                .map(|m| 100.0 + (m * 7.0).sin().abs() * 50.0 + i as f64)
                .collect();
            Spectrum::new(format!("spec_{i:02}"), masses, intensities)
        })
        .collect();
    SpectrumCollection::new(spectra).unwrap()
}

#[test]
fn centered_spectra_share_one_mass_axis() {
    let mut coll = dataset(12);
    let mut p = Pipeline::new(&mut coll);
    p.bin(&BinningOptions { parallelism: 4, ..Default::default() }).unwrap();
    p.center(&CenteringOptions { inplace: true, parallelism: 4 }).unwrap();

    let spectra = p.collection().spectra();
    let axis = &spectra[0].masses;
    assert!(axis.windows(2).all(|w| w[0] < w[1]));
    for sp in spectra {
        assert_eq!(&sp.masses, axis);
        assert_eq!(sp.intensities.len(), axis.len());
    }
    // short spectra have gaps at the top of the axis
    assert!(is_missing(*spectra[0].intensities.last().unwrap()));
    assert!(!is_missing(*spectra[1].intensities.last().unwrap()));
}

#[test]
fn imputation_keeps_only_occupied_columns_and_fills_them() {
    for (threshold, expect_upper) in [(0.5, true), (0.9, false)] {
        let mut coll = dataset(12);
        let mut p = Pipeline::new(&mut coll);
        p.bin(&BinningOptions::default()).unwrap();
        p.center(&CenteringOptions::default()).unwrap();
        let table = p
            .impute(&ImputationOptions {
                occupancy_threshold: threshold,
                inplace: false,
                ..Default::default()
            })
            .unwrap()
            .unwrap();

        assert!(!table.has_missing());
        // masses above 150 are seen by 8 of 12 spectra
        assert_eq!(table.masses().iter().any(|m| *m >= 150.0), expect_upper);
        assert_eq!(table.n_rows(), 12);
    }
}

#[test]
fn serial_and_parallel_runs_agree() {
    let config = PipelineConfig {
        binning: BinningOptions { bin_size: 2.0, statistic: Statistic::Median, ..Default::default() },
        ..Default::default()
    };
    let mut parallel_config = config.clone();
    parallel_config.binning.parallelism = 8;
    parallel_config.centering.parallelism = 8;

    let mut serial = dataset(20);
    Pipeline::new(&mut serial).run(&config).unwrap();
    let mut parallel = dataset(20);
    Pipeline::new(&mut parallel).run(&parallel_config).unwrap();

    assert_eq!(serial.spectra(), parallel.spectra());
    assert!(serial.iter().all(|sp| sp.intensities.iter().all(|v| !is_missing(*v))));
}

#[test]
fn identical_tics_are_never_outliers() {
    let mut coll = SpectrumCollection::new(
        (0..6)
            .map(|i| Spectrum::new(format!("s{i}"), vec![100.0, 200.0], vec![i as f64, 10.0 - i as f64]))
            .collect(),
    )
    .unwrap();
    let mut p = Pipeline::new(&mut coll);
    p.detect_outliers(&OutlierOptions { mad_threshold: 0.1, inplace: true });

    assert_eq!(p.collection().len(), 6);
    assert_eq!(
        p.notices(),
        &[Notice::ZeroDeviation, Notice::OutliersRemoved(vec![])]
    );
    assert!(p.flags().outlier_detected);
}

#[test]
fn reordered_summation_is_not_an_outlier() {
    // 0.3 + 0.2 + 0.1 and 0.1 + 0.2 + 0.3 differ only by rounding
    let mut spectra: Vec<Spectrum> = (0..8)
        .map(|i| Spectrum::new(format!("s{i}"), vec![100.0, 101.0, 102.0], vec![0.3, 0.2, 0.1]))
        .collect();
    spectra.push(Spectrum::new("odd", vec![100.0, 101.0, 102.0], vec![0.1, 0.2, 0.3]));
    let mut coll = SpectrumCollection::new(spectra).unwrap();

    let mut p = Pipeline::new(&mut coll);
    p.detect_outliers(&OutlierOptions::default());
    assert_eq!(p.notices(), &[Notice::ZeroDeviation, Notice::OutliersRemoved(vec![])]);
    assert_eq!(p.collection().len(), 9);
}

#[test]
fn full_run_drops_a_gross_outlier() {
    let spiked: Vec<Spectrum> = dataset(15)
        .into_spectra()
        .into_iter()
        .map(|mut sp| {
            if sp.id == "spec_07" {
                sp.intensities.iter_mut().for_each(|v| *v *= 50.0);
            }
            sp
        })
        .collect();
    let mut coll = SpectrumCollection::new(spiked).unwrap();

    let mut p = Pipeline::new(&mut coll);
    p.run(&PipelineConfig::default()).unwrap();
    assert!(p.notices().contains(&Notice::OutliersRemoved(vec!["spec_07".to_string()])));
    assert!(p.collection().get("spec_07").is_none());
    assert_eq!(p.collection().len(), 14);
}

#[test]
fn table_round_trip_is_exact_after_centering() {
    let mut coll = dataset(6);
    {
        let mut p = Pipeline::new(&mut coll);
        p.bin(&BinningOptions::default()).unwrap();
        p.center(&CenteringOptions::default()).unwrap();
    }
    let before = coll.clone();
    let table = coll.to_table();
    coll.apply_table(&table).unwrap();

    for (a, b) in before.iter().zip(coll.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.masses, b.masses);
        let same = a
            .intensities
            .iter()
            .zip(&b.intensities)
            .all(|(x, y)| x == y || (is_missing(*x) && is_missing(*y)));
        assert!(same);
    }

    let rebuilt = SpectrumCollection::from_table(&table).unwrap();
    assert_eq!(rebuilt.ids(), before.ids());
}

#[test]
fn config_file_drives_the_run() {
    let config = PipelineConfig::from_json_str(
        r#"{"binning": {"bin_size": 5, "statistic": "sum"}, "imputation": {"method": "basic", "occupancy_threshold": 0.0}}"#,
    )
    .unwrap();
    assert_eq!(config.imputation.method, ImputationMethod::HalfMinimum);

    let mut coll = dataset(9);
    let mut p = Pipeline::new(&mut coll);
    p.run(&config).unwrap();
    let masses = &p.collection().spectra()[0].masses;
    assert!(masses.iter().all(|m| (m / 5.0).fract() == 0.0));
}

#[test]
fn unknown_imputation_method_is_a_configuration_error() {
    let err = "nearest".parse::<ImputationMethod>().unwrap_err();
    assert!(matches!(err, PipelineError::UnknownImputationMethod(_)));
}
