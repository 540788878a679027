use std::path::Path;

use anyhow::Result;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::Normal;

use dims_align::data::writer::write_collection_parquet;
use dims_align::{Polarity, Spectrum, SpectrumCollection};

/// Centroided peaks shared by every sample: (m/z, base intensity).
const PEAKS: [(f64, f64); 8] = [
    (104.107, 5.0e4),
    (132.077, 1.2e4),
    (147.113, 8.0e4),
    (166.086, 3.3e4),
    (175.119, 6.1e4),
    (205.097, 2.4e4),
    (268.104, 9.0e3),
    (316.284, 4.5e4),
];

/// One centroided spectrum: each peak with m/z jitter and log-normal-ish
/// intensity noise, plus sparse low-level chemical noise.
fn generate_spectrum(rng: &mut StdRng, scale: f64, dropout: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    let mz_jitter = Normal::new(0.0, 0.002)?;
    let intensity_noise = Normal::new(1.0, 0.1)?;
    let unit = Uniform::new(0.0, 1.0);
    let noise_mz = Uniform::new(100.0, 320.0);

    let mut points: Vec<(f64, f64)> = Vec::with_capacity(PEAKS.len() + 40);
    for &(mz, base) in &PEAKS {
        if unit.sample(rng) < dropout {
            continue;
        }
        let factor: f64 = intensity_noise.sample(rng);
        points.push((mz + mz_jitter.sample(rng), base * scale * factor.max(0.05)));
    }

    for _ in 0..40 {
        points.push((noise_mz.sample(rng), 200.0 * unit.sample(rng)));
    }

    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(points.into_iter().unzip())
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut spectra = Vec::new();

    for i in 0..24 {
        // one sample with a grossly inflated total signal
        let scale = if i == 17 { 25.0 } else { 1.0 };
        let (masses, intensities) = generate_spectrum(&mut rng, scale, 0.15)?;
        let polarity = if i % 12 == 11 { Polarity::Negative } else { Polarity::Positive };
        spectra.push(Spectrum::new(format!("sample_{i:02}"), masses, intensities).with_polarity(polarity));
    }

    let collection = SpectrumCollection::new(spectra)?;
    let output_path = Path::new("sample_spectra.parquet");
    write_collection_parquet(&collection, output_path)?;

    println!(
        "Wrote {} spectra ({} reference peaks each) to {}",
        collection.len(),
        PEAKS.len(),
        output_path.display()
    );
    Ok(())
}
