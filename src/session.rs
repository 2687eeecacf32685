//! Analysis session state.
//!
//! Holds the current dataset, the accumulated fit results and the batch
//! configuration as one explicit object passed to core operations; the
//! presentation layer reads from it and never mutates the collection
//! directly. A batch fit takes `&mut self` and is therefore an
//! exclusive-write section over the result collection.

use std::io::Write;

use crate::aggregate::{aggregate, DerivedSeries};
use crate::batch::{self, BatchFitConfig, FitResult, FitResultCollection};
use crate::dataset::Dataset;
use crate::error::{Result, SqwFitError};
use crate::export::export_results;
use crate::fit::fit_spectrum;
use crate::lineshape::Lineshape;

/// User-supplied starting point for an interactive single-spectrum fit.
#[derive(Debug, Clone, Copy)]
pub struct InitialGuess {
    pub amplitude: f64,
    pub center: f64,
    pub width: f64,
    pub background: f64,
}

impl Default for InitialGuess {
    fn default() -> Self {
        Self {
            amplitude: 5.0,
            center: 0.0,
            width: 1.0,
            background: 0.1,
        }
    }
}

/// One analysis session: a dataset plus its fit results.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    dataset: Dataset,
    results: FitResultCollection,
    batch_config: BatchFitConfig,
}

impl AnalysisSession {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            results: FitResultCollection::new(),
            batch_config: BatchFitConfig::default(),
        }
    }

    pub fn with_batch_config(mut self, config: BatchFitConfig) -> Self {
        self.batch_config = config;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn results(&self) -> &FitResultCollection {
        &self.results
    }

    pub fn batch_config(&self) -> &BatchFitConfig {
        &self.batch_config
    }

    /// Replace the dataset, discarding all prior fit results.
    pub fn replace_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.results.clear();
    }

    /// Fit a single spectrum with a user-chosen model and starting point,
    /// storing the result at its Q index.
    ///
    /// The double Lorentzian seeds its second peak mirrored about zero at
    /// half the amplitude.
    pub fn fit_single(
        &mut self,
        q_index: usize,
        model: Lineshape,
        guess: &InitialGuess,
    ) -> Result<&FitResult> {
        if q_index >= self.dataset.n_q() {
            return Err(SqwFitError::DimensionMismatch(format!(
                "Q index {} out of range for {} spectra",
                q_index,
                self.dataset.n_q()
            )));
        }

        let (c_min, c_max) = self.batch_config.center_bounds;
        let (w_min, w_max) = self.batch_config.width_bounds;

        let (initial, lower, upper) = match model {
            Lineshape::Lorentzian | Lineshape::Gaussian => (
                vec![guess.amplitude, guess.center, guess.width, guess.background],
                vec![0.0, c_min, w_min, 0.0],
                vec![f64::INFINITY, c_max, w_max, f64::INFINITY],
            ),
            Lineshape::DoubleLorentzian => (
                vec![
                    guess.amplitude,
                    guess.center,
                    guess.width,
                    guess.amplitude / 2.0,
                    -guess.center,
                    guess.width,
                    guess.background,
                ],
                vec![0.0, c_min, w_min, 0.0, c_min, w_min, 0.0],
                vec![
                    f64::INFINITY,
                    c_max,
                    w_max,
                    f64::INFINITY,
                    c_max,
                    w_max,
                    f64::INFINITY,
                ],
            ),
        };

        let errors = self.dataset.errors_for(q_index);
        let (params, param_errors) = fit_spectrum(
            self.dataset.omega().view(),
            self.dataset.spectrum(q_index),
            errors.view(),
            model,
            &initial,
            &lower,
            &upper,
            self.batch_config.max_evaluations,
        )?;

        self.results.set(
            q_index,
            FitResult {
                params,
                errors: param_errors,
                model,
            },
        );

        Ok(self.results.get(q_index).expect("slot was just written"))
    }

    /// Re-run the batch fit over all Q indices, replacing the collection.
    ///
    /// Returns the number of successful fits.
    pub fn fit_all(&mut self) -> usize {
        self.results = batch::fit_all(&self.dataset, &self.batch_config);
        self.results.successful_count()
    }

    /// Like [`AnalysisSession::fit_all`] with a per-index progress
    /// observer.
    pub fn fit_all_with_progress<F>(&mut self, observer: F) -> usize
    where
        F: FnMut(usize, Option<&FitResult>),
    {
        self.results = batch::fit_all_with_progress(&self.dataset, &self.batch_config, observer);
        self.results.successful_count()
    }

    /// Derived series over the current fit results.
    pub fn aggregate(&self) -> DerivedSeries {
        aggregate(&self.dataset, &self.results)
    }

    /// Export the current fit results as CSV.
    pub fn export<W: Write>(&self, writer: W) -> Result<()> {
        export_results(writer, &self.dataset, &self.results)
    }
}
