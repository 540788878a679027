use std::collections::{HashMap, HashSet};

use super::{binning, centering, imputation, outlier};
use crate::config::{
    BinningOptions, CenteringOptions, ImputationOptions, OutlierOptions, PipelineConfig,
};
use crate::data::model::{Spectrum, SpectrumCollection};
use crate::data::table::IntensityTable;
use crate::error::{PipelineError, Result};
use crate::state::{Notice, Stage, StageFlags};

// ---------------------------------------------------------------------------
// Pipeline – stage orchestration over one borrowed collection
// ---------------------------------------------------------------------------

/// Runs the cleaning stages against a collection it borrows exclusively.
///
/// Stage order matters: binning before centering, centering before
/// imputation. Out-of-order calls are reported through [`Pipeline::notices`]
/// and leave the collection untouched.
pub struct Pipeline<'a> {
    collection: &'a mut SpectrumCollection,
    flags: StageFlags,
    notices: Vec<Notice>,
}

impl<'a> Pipeline<'a> {
    pub fn new(collection: &'a mut SpectrumCollection) -> Self {
        Pipeline {
            collection,
            flags: StageFlags::default(),
            notices: Vec::new(),
        }
    }

    pub fn collection(&self) -> &SpectrumCollection {
        &*self.collection
    }

    /// Give back the borrowed collection for the rest of its lifetime.
    pub fn into_collection(self) -> &'a mut SpectrumCollection {
        self.collection
    }

    pub fn flags(&self) -> StageFlags {
        self.flags
    }

    /// Every notice raised so far, oldest first.
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        log::warn!("{notice}");
        self.notices.push(notice);
    }

    pub fn remove(&mut self, id: &str) -> Option<Spectrum> {
        self.collection.remove(id)
    }

    /// Write per-id results back into the collection, in collection order.
    ///
    /// Every spectrum must have exactly one result and every result must
    /// name a spectrum; otherwise nothing is written.
    fn merge<T>(
        &mut self,
        mut results: HashMap<String, T>,
        mut write: impl FnMut(&mut SpectrumCollection, &str, T) -> Result<()>,
    ) -> Result<()> {
        let ids: Vec<String> = self.collection.iter().map(|sp| sp.id.clone()).collect();
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(PipelineError::DuplicateId(id.clone()));
            }
            if !results.contains_key(id) {
                return Err(PipelineError::UnknownSpectrum(id.clone()));
            }
        }
        if let Some(stray) = results.keys().find(|id| !seen.contains(id.as_str())) {
            return Err(PipelineError::UnknownSpectrum(stray.clone()));
        }

        for id in ids {
            if let Some(result) = results.remove(&id) {
                write(&mut *self.collection, &id, result)?;
            }
        }
        Ok(())
    }

    // -- outlier detection --

    /// Score spectra by TIC deviation. In place, outliers are removed and
    /// `None` is returned; otherwise the outliers are returned, reported as
    /// [`Notice::OutliersFound`], and the collection is left alone.
    pub fn detect_outliers(&mut self, options: &OutlierOptions) -> Option<Vec<Spectrum>> {
        if outlier::tic_scores(self.collection).is_degenerate() {
            self.notify(Notice::ZeroDeviation);
        }
        let outlier_ids = outlier::detect(self.collection, options.mad_threshold);

        if !options.inplace {
            let found = outlier_ids
                .iter()
                .filter_map(|id| self.collection.get(id).cloned())
                .collect();
            self.notify(Notice::OutliersFound(outlier_ids));
            return Some(found);
        }

        for id in &outlier_ids {
            self.remove(id);
        }
        log::info!(
            "Outlier detection (threshold {}): removed {}, kept {}",
            options.mad_threshold,
            outlier_ids.len(),
            self.collection.len()
        );
        self.notify(Notice::OutliersRemoved(outlier_ids));
        self.flags.outlier_detected = true;
        None
    }

    // -- binning --

    /// Resample every spectrum onto bins of `bin_size`. Only in-place
    /// binning is supported.
    pub fn bin(&mut self, options: &BinningOptions) -> Result<()> {
        options.validate()?;
        if !options.inplace {
            self.notify(Notice::NotInPlaceUnsupported(Stage::Binning));
            return Ok(());
        }

        let binned = binning::bin_collection(
            self.collection,
            options.bin_size,
            options.statistic,
            options.parallelism,
        )?;

        let mut degenerate: Vec<String> = binned
            .iter()
            .filter(|(_, b)| b.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        degenerate.sort();

        self.merge(binned, |coll, id, b| coll.replace(id, b.masses, b.intensities))?;
        for id in degenerate {
            self.notify(Notice::DegenerateBinning { id });
        }

        log::info!(
            "Binned {} spectra (bin size {}, {})",
            self.collection.len(),
            options.bin_size,
            options.statistic
        );
        self.flags.binned = true;
        Ok(())
    }

    // -- centering --

    /// Reproject every spectrum onto the shared mass axis. Requires binned
    /// data and only works in place.
    pub fn center(&mut self, options: &CenteringOptions) -> Result<()> {
        if !self.flags.binned {
            self.notify(Notice::NotBinned);
            return Ok(());
        }
        if !options.inplace {
            self.notify(Notice::NotInPlaceUnsupported(Stage::Centering));
            return Ok(());
        }

        let axis = centering::shared_axis(self.collection);
        let centered = centering::center_collection(self.collection, &axis, options.parallelism)?;
        self.merge(centered, |coll, id, intensities| {
            coll.replace(id, axis.clone(), intensities)
        })?;

        log::info!(
            "Centered {} spectra onto {} shared masses",
            self.collection.len(),
            axis.len()
        );
        self.flags.centered = true;
        Ok(())
    }

    // -- imputation --

    /// Drop sparse mass columns and fill the remaining gaps.
    ///
    /// In place, the result is written back into the collection and `None`
    /// is returned; otherwise the table is returned and the collection is
    /// left alone.
    pub fn impute(&mut self, options: &ImputationOptions) -> Result<Option<IntensityTable>> {
        options.validate()?;
        if !self.flags.centered {
            self.notify(Notice::NotCentered);
            return Ok(None);
        }

        let mut table = self.collection.to_table();
        let notices =
            imputation::impute_table(&mut table, options.method, options.occupancy_threshold);
        for notice in notices {
            self.notify(notice);
        }
        log::info!(
            "Imputed missing values ({}): {} spectra x {} masses",
            options.method,
            table.n_rows(),
            table.n_cols()
        );

        if !options.inplace {
            return Ok(Some(table));
        }
        self.collection.apply_table(&table)?;
        self.flags.value_imputed = true;
        Ok(None)
    }

    /// Run all four stages in order. Stops at the first fatal error.
    ///
    /// Outliers detected without in-place removal stay in the collection
    /// and are only reported through [`Notice::OutliersFound`].
    pub fn run(&mut self, config: &PipelineConfig) -> Result<Option<IntensityTable>> {
        self.detect_outliers(&config.outlier);
        self.bin(&config.binning)?;
        self.center(&config.centering)?;
        self.impute(&config.imputation)
    }
}
