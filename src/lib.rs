//! Clean and align direct-infusion mass spectra into a matrix with one
//! row per spectrum and one column per shared mass bin.

pub mod config;
pub mod data;
pub mod error;
pub mod processing;
pub mod state;

pub use config::{ImputationMethod, PipelineConfig, Statistic};
pub use data::model::{Polarity, Spectrum, SpectrumCollection};
pub use data::table::IntensityTable;
pub use error::PipelineError;
pub use processing::pipeline::Pipeline;
pub use state::{Notice, StageFlags};
