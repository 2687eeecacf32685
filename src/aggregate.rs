//! Derived series across Q from a batch fit-result collection.

use serde::{Deserialize, Serialize};

use crate::batch::FitResultCollection;
use crate::dataset::Dataset;

/// Per-Q parameter trends extracted from present fit results: the
/// dispersion relation (peak center vs Q) and the amplitude and width
/// trends, each with propagated errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DerivedSeries {
    /// Q indices of the contributing fit results, in index order
    pub q_indices: Vec<usize>,

    /// Q values matching `q_indices`
    pub q_values: Vec<f64>,

    pub centers: Vec<f64>,
    pub center_errors: Vec<f64>,

    pub amplitudes: Vec<f64>,
    pub amplitude_errors: Vec<f64>,

    pub widths: Vec<f64>,
    pub width_errors: Vec<f64>,
}

impl DerivedSeries {
    /// Whether no fit result contributed; callers must not plot or export
    /// an empty series.
    pub fn is_empty(&self) -> bool {
        self.q_indices.is_empty()
    }
}

/// Extract derived series from the fit-result collection, skipping absent
/// slots.
///
/// Entries need at least 3 parameters to contribute; widths are appended
/// only when the parameter vector has more than 2 entries. Error lookups
/// fall back to 0 when the error vector is shorter than the parameter
/// vector (defensive handling of variable-arity models).
pub fn aggregate(dataset: &Dataset, results: &FitResultCollection) -> DerivedSeries {
    let mut series = DerivedSeries::default();

    for (i, slot) in results.iter().enumerate().take(dataset.n_q()) {
        let result = match slot {
            Some(result) if result.params.len() >= 3 => result,
            _ => continue,
        };

        let params = &result.params;
        let errors = &result.errors;
        let error_at = |index: usize| {
            if errors.len() > index {
                errors[index]
            } else {
                0.0
            }
        };

        series.q_indices.push(i);
        series.q_values.push(dataset.q()[i]);

        series.centers.push(params[1]);
        series.center_errors.push(error_at(1));
        series.amplitudes.push(params[0]);
        series.amplitude_errors.push(error_at(0));

        if params.len() > 2 {
            series.widths.push(params[2]);
            series.width_errors.push(error_at(2));
        }
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FitResult;
    use crate::lineshape::Lineshape;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1, Array2};

    fn dataset(n_q: usize) -> Dataset {
        Dataset::new(
            Array1::linspace(0.1, 0.1 * n_q as f64, n_q),
            Array1::linspace(-2.0, 2.0, 5),
            Array2::zeros((n_q, 5)),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_all_absent_collection_yields_empty_series() {
        let mut results = FitResultCollection::new();
        results.push(None);
        results.push(None);

        let series = aggregate(&dataset(2), &results);
        assert!(series.is_empty());
        assert!(series.centers.is_empty());
        assert!(series.widths.is_empty());
    }

    #[test]
    fn test_single_entry_at_index_three() {
        let mut results = FitResultCollection::new();
        results.set(
            3,
            FitResult {
                params: array![5.0, 0.3, 1.2, 0.1],
                errors: array![0.5, 0.03, 0.12, 0.01],
                model: Lineshape::Lorentzian,
            },
        );

        let data = dataset(5);
        let series = aggregate(&data, &results);

        assert_eq!(series.q_indices, vec![3]);
        assert_eq!(series.q_values, vec![data.q()[3]]);
        assert_eq!(series.centers, vec![0.3]);
        assert_eq!(series.center_errors, vec![0.03]);
        assert_eq!(series.amplitudes, vec![5.0]);
        assert_eq!(series.amplitude_errors, vec![0.5]);
        assert_eq!(series.widths, vec![1.2]);
        assert_relative_eq!(series.width_errors[0], 0.12, epsilon = 1e-12);
    }

    #[test]
    fn test_short_error_vector_falls_back_to_zero() {
        let mut results = FitResultCollection::new();
        results.set(
            0,
            FitResult {
                params: array![5.0, 0.3, 1.2, 0.1],
                errors: array![0.5],
                model: Lineshape::Lorentzian,
            },
        );

        let series = aggregate(&dataset(1), &results);
        assert_eq!(series.amplitude_errors, vec![0.5]);
        assert_eq!(series.center_errors, vec![0.0]);
        assert_eq!(series.width_errors, vec![0.0]);
    }
}
