use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use dims_align::data::{filter, loader, writer};
use dims_align::{ImputationMethod, Pipeline, PipelineConfig, Polarity, Statistic};

/// Clean and align a collection of spectra into an intensity matrix.
#[derive(Parser, Debug)]
#[command(name = "dims-align", version, about)]
struct Args {
    /// Input spectra (.parquet, .json or .csv)
    input: PathBuf,

    /// Output: .csv writes the wide intensity table, .parquet the aligned spectra
    output: PathBuf,

    /// JSON file with pipeline options; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep only spectra of this polarity (positive / negative)
    #[arg(long)]
    polarity: Option<String>,

    /// Skip TIC outlier removal
    #[arg(long)]
    skip_outliers: bool,

    #[arg(long)]
    mad_threshold: Option<f64>,

    #[arg(long)]
    bin_size: Option<f64>,

    /// mean, sum, median, count, min, max or std
    #[arg(long)]
    statistic: Option<String>,

    /// knn (column mean) or basic (half minimum)
    #[arg(long)]
    method: Option<String>,

    /// Minimum fraction of spectra observing a mass for it to be kept
    #[arg(long)]
    occupancy: Option<f64>,

    /// Worker threads for binning and centering
    #[arg(short, long)]
    jobs: Option<usize>,
}

impl Args {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(t) = self.mad_threshold {
            config.outlier.mad_threshold = t;
        }
        if let Some(size) = self.bin_size {
            config.binning.bin_size = size;
        }
        if let Some(stat) = &self.statistic {
            config.binning.statistic = stat.parse::<Statistic>()?;
        }
        if let Some(method) = &self.method {
            config.imputation.method = method.parse::<ImputationMethod>()?;
        }
        if let Some(occ) = self.occupancy {
            config.imputation.occupancy_threshold = occ;
        }
        if let Some(jobs) = self.jobs {
            config.binning.parallelism = jobs;
            config.centering.parallelism = jobs;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = args.pipeline_config()?;
    log::debug!("{config:?}");

    let mut collection = loader::load_file(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;

    if let Some(label) = &args.polarity {
        let polarity: Polarity = label.parse()?;
        if polarity == Polarity::Unknown {
            bail!("Unknown polarity '{label}', expected positive or negative");
        }
        filter::limit_polarity(&mut collection, polarity);
    }
    if collection.is_empty() {
        bail!("No spectra left to process");
    }

    let mut pipeline = Pipeline::new(&mut collection);
    if !args.skip_outliers {
        pipeline.detect_outliers(&config.outlier);
    }
    pipeline.bin(&config.binning)?;
    pipeline.center(&config.centering)?;
    let returned = pipeline.impute(&config.imputation)?;
    let skipped = pipeline.take_notices().iter().filter(|n| n.is_skip()).count();
    if skipped > 0 {
        log::warn!("{skipped} stage(s) were skipped, output may not be aligned");
    }

    let ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "csv" => {
            let table = returned.unwrap_or_else(|| collection.to_table());
            writer::write_table_csv(&table, &args.output)?;
        }
        "parquet" | "pq" => writer::write_collection_parquet(&collection, &args.output)?,
        other => bail!("Unsupported output extension: .{other}"),
    }

    Ok(())
}
