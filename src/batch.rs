//! Unattended batch fitting across all Q indices of a dataset.
//!
//! Batch mode always fits a single Lorentzian: unattended fitting trades
//! model flexibility for the robustness of one well-behaved heuristic.
//! Per-spectrum failures are recorded as absent slots and never abort the
//! batch.

use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::fit::{fit_spectrum, DEFAULT_MAX_EVALUATIONS, MIN_VALID_POINTS};
use crate::lineshape::Lineshape;

/// A successful fit of one spectrum.
#[derive(Debug, Clone)]
pub struct FitResult {
    /// Optimized parameter values, ordered per the model
    pub params: Array1<f64>,

    /// 1-sigma standard errors, same length as `params`
    pub errors: Array1<f64>,

    /// The model variant that was fitted
    pub model: Lineshape,
}

/// Ordered per-Q fit results, index-aligned with the dataset's q axis.
///
/// The collection is never longer than the q axis; missing trailing
/// entries are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct FitResultCollection {
    slots: Vec<Option<FitResult>>,
}

impl FitResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, present or absent.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The result at a Q index; absent slots and indices past the end of
    /// the collection both read as `None`.
    pub fn get(&self, q_index: usize) -> Option<&FitResult> {
        self.slots.get(q_index).and_then(|slot| slot.as_ref())
    }

    /// Store a result at a Q index, extending the collection with absent
    /// slots as needed.
    pub fn set(&mut self, q_index: usize, result: FitResult) {
        if self.slots.len() <= q_index {
            self.slots.resize_with(q_index + 1, || None);
        }
        self.slots[q_index] = Some(result);
    }

    /// Append a slot in Q order.
    pub fn push(&mut self, slot: Option<FitResult>) {
        self.slots.push(slot);
    }

    /// Discard all results.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Number of present entries, for user feedback.
    pub fn successful_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate slots in Q order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&FitResult>> {
        self.slots.iter().map(|slot| slot.as_ref())
    }
}

/// Configuration for unattended batch fitting.
///
/// The center/width bounds and the width seed are domain defaults in the
/// energy units of the caller's omega axis, not physical constants, so
/// they are configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFitConfig {
    /// Bounds on the peak center. Default: (-10, 10)
    pub center_bounds: (f64, f64),

    /// Bounds on the peak width. Default: (0.1, 5)
    pub width_bounds: (f64, f64),

    /// Initial width seed for every spectrum. Default: 1.0
    pub width_seed: f64,

    /// Cap on residual/Jacobian evaluations per spectrum. Default: 5000
    pub max_evaluations: usize,
}

impl Default for BatchFitConfig {
    fn default() -> Self {
        Self {
            center_bounds: (-10.0, 10.0),
            width_bounds: (0.1, 5.0),
            width_seed: 1.0,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
        }
    }
}

impl BatchFitConfig {
    /// Set the bounds on the peak center.
    pub fn with_center_bounds(mut self, min: f64, max: f64) -> Self {
        self.center_bounds = (min, max);
        self
    }

    /// Set the bounds on the peak width.
    pub fn with_width_bounds(mut self, min: f64, max: f64) -> Self {
        self.width_bounds = (min, max);
        self
    }

    /// Set the initial width seed.
    pub fn with_width_seed(mut self, seed: f64) -> Self {
        self.width_seed = seed;
        self
    }

    /// Set the per-spectrum evaluation cap.
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    /// Lorentzian box constraints: amplitude and background non-negative,
    /// center and width per the configured ranges.
    pub fn lorentzian_bounds(&self) -> ([f64; 4], [f64; 4]) {
        (
            [0.0, self.center_bounds.0, self.width_bounds.0, 0.0],
            [
                f64::INFINITY,
                self.center_bounds.1,
                self.width_bounds.1,
                f64::INFINITY,
            ],
        )
    }
}

/// Fit every spectrum of the dataset with a Lorentzian.
///
/// Always returns a collection of length `dataset.n_q()`, with `None` at
/// every index where fitting failed or was infeasible.
pub fn fit_all(dataset: &Dataset, config: &BatchFitConfig) -> FitResultCollection {
    fit_all_with_progress(dataset, config, |_, _| {})
}

/// Like [`fit_all`], invoking the observer with the Q index and its slot
/// after each spectrum completes.
pub fn fit_all_with_progress<F>(
    dataset: &Dataset,
    config: &BatchFitConfig,
    mut observer: F,
) -> FitResultCollection
where
    F: FnMut(usize, Option<&FitResult>),
{
    let mut results = FitResultCollection::new();

    for i in 0..dataset.n_q() {
        let errors = dataset.errors_for(i);
        let slot = fit_one(
            dataset.omega().view(),
            dataset.spectrum(i),
            errors.view(),
            config,
        );
        observer(i, slot.as_ref());
        results.push(slot);
    }

    results
}

/// Fit a single spectrum with the batch heuristics, mapping every failure
/// to an absent slot.
fn fit_one(
    x: ArrayView1<'_, f64>,
    y: ArrayView1<'_, f64>,
    y_err: ArrayView1<'_, f64>,
    config: &BatchFitConfig,
) -> Option<FitResult> {
    // Initial-guess heuristics over the valid points only
    let mut valid = 0usize;
    let mut max_y = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut x_at_max = 0.0;

    for j in 0..x.len() {
        if x[j].is_finite() && y[j].is_finite() && y_err[j] > 0.0 {
            valid += 1;
            if y[j] > max_y {
                max_y = y[j];
                x_at_max = x[j];
            }
            if y[j] < min_y {
                min_y = y[j];
            }
        }
    }

    if valid < MIN_VALID_POINTS {
        return None;
    }

    // A flat spectrum (no variation between max and min) cannot seed a
    // peak; the slot is recorded absent without invoking the solver
    if !(max_y > min_y) {
        return None;
    }

    let initial = [max_y, x_at_max, config.width_seed, min_y];
    let (lower, upper) = config.lorentzian_bounds();

    match fit_spectrum(
        x,
        y,
        y_err,
        Lineshape::Lorentzian,
        &initial,
        &lower,
        &upper,
        config.max_evaluations,
    ) {
        Ok((params, errors)) => Some(FitResult {
            params,
            errors,
            model: Lineshape::Lorentzian,
        }),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    fn tiny_dataset(rows: Vec<Vec<f64>>) -> Dataset {
        let n_q = rows.len();
        let n_omega = rows[0].len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Dataset::new(
            Array1::linspace(0.1, 0.1 * n_q as f64, n_q),
            Array1::linspace(-2.0, 2.0, n_omega),
            Array2::from_shape_vec((n_q, n_omega), flat).unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_collection_set_extends_with_absent_slots() {
        let mut collection = FitResultCollection::new();
        collection.set(
            2,
            FitResult {
                params: array![1.0, 0.0, 1.0, 0.0],
                errors: array![0.0, 0.0, 0.0, 0.0],
                model: Lineshape::Lorentzian,
            },
        );

        assert_eq!(collection.len(), 3);
        assert!(collection.get(0).is_none());
        assert!(collection.get(1).is_none());
        assert!(collection.get(2).is_some());
        assert!(collection.get(10).is_none());
        assert_eq!(collection.successful_count(), 1);
    }

    #[test]
    fn test_flat_spectrum_is_skipped() {
        let dataset = tiny_dataset(vec![vec![0.0; 5], vec![1.0; 5]]);
        let results = fit_all(&dataset, &BatchFitConfig::default());

        assert_eq!(results.len(), 2);
        assert_eq!(results.successful_count(), 0);
    }

    #[test]
    fn test_progress_observer_sees_every_index() {
        let dataset = tiny_dataset(vec![vec![0.0; 5], vec![0.0; 5], vec![0.0; 5]]);
        let mut seen = Vec::new();
        fit_all_with_progress(&dataset, &BatchFitConfig::default(), |i, slot| {
            seen.push((i, slot.is_some()));
        });

        assert_eq!(seen, vec![(0, false), (1, false), (2, false)]);
    }

    #[test]
    fn test_config_builders() {
        let config = BatchFitConfig::default()
            .with_center_bounds(-5.0, 5.0)
            .with_width_bounds(0.05, 2.0)
            .with_width_seed(0.5)
            .with_max_evaluations(100);

        assert_eq!(config.center_bounds, (-5.0, 5.0));
        let (lower, upper) = config.lorentzian_bounds();
        assert_eq!(lower, [0.0, -5.0, 0.05, 0.0]);
        assert_eq!(upper[2], 2.0);
        assert!(upper[0].is_infinite());
    }
}
