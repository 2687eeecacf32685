//! Single-spectrum weighted nonlinear least-squares fitting.
//!
//! The fitter masks invalid samples, runs the Levenberg-Marquardt solver
//! through the Minuit bounds transform, and propagates 1-sigma parameter
//! uncertainties from the covariance matrix at the optimum.

use ndarray::{Array1, Array2, ArrayView1};

use crate::bounds::{Bounds, BoundsTransform};
use crate::error::{Result, SqwFitError};
use crate::lineshape::Lineshape;
use crate::lm::{LevenbergMarquardt, LmConfig};
use crate::problem::Problem;
use crate::utils::matrix_convert::ndarray_to_nalgebra;

/// Minimum number of valid points needed for any supported model.
pub const MIN_VALID_POINTS: usize = 4;

/// Default cap on residual/Jacobian evaluations per fit.
pub const DEFAULT_MAX_EVALUATIONS: usize = 5000;

/// Weighted residuals of a lineshape against one masked spectrum.
///
/// The solver sees unbounded internal parameters; the transform maps them
/// to bounded external values before each model evaluation.
struct WeightedLineshapeProblem<'a> {
    x: Array1<f64>,
    y: Array1<f64>,
    y_err: Array1<f64>,
    model: Lineshape,
    transforms: &'a [BoundsTransform],
}

impl WeightedLineshapeProblem<'_> {
    fn to_external(&self, internal: &Array1<f64>) -> Array1<f64> {
        internal
            .iter()
            .zip(self.transforms.iter())
            .map(|(&value, transform)| transform.to_external(value))
            .collect()
    }
}

impl Problem for WeightedLineshapeProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let external = self.to_external(params);
        let model_y = self.model.evaluate(&self.x, &external)?;
        Ok((&self.y - &model_y) / &self.y_err)
    }

    fn parameter_count(&self) -> usize {
        self.model.param_count()
    }

    fn residual_count(&self) -> usize {
        self.x.len()
    }
}

/// Fit one spectrum with the given model.
///
/// Invalid samples (non-finite x or y, non-positive error) are masked out
/// before fitting. Fails with `InsufficientData` when fewer than
/// [`MIN_VALID_POINTS`] valid points remain, and with `ConvergenceFailure`
/// when the bounds are infeasible, the initial parameters lie outside the
/// bounds (out-of-bounds seeds are rejected, never clamped), or the solver
/// does not converge within `max_evaluations`.
///
/// Returns the optimized parameters and their 1-sigma standard errors. A
/// singular covariance at the optimum yields zero errors rather than a
/// failure.
pub fn fit_spectrum(
    x: ArrayView1<'_, f64>,
    y: ArrayView1<'_, f64>,
    y_err: ArrayView1<'_, f64>,
    model: Lineshape,
    initial: &[f64],
    lower: &[f64],
    upper: &[f64],
    max_evaluations: usize,
) -> Result<(Array1<f64>, Array1<f64>)> {
    if x.len() != y.len() || x.len() != y_err.len() {
        return Err(SqwFitError::DimensionMismatch(format!(
            "x, y and y_err lengths differ: {}, {}, {}",
            x.len(),
            y.len(),
            y_err.len()
        )));
    }

    let n_params = model.param_count();
    if initial.len() != n_params || lower.len() != n_params || upper.len() != n_params {
        return Err(SqwFitError::DimensionMismatch(format!(
            "{:?} expects {} parameters, got initial/lower/upper of lengths {}/{}/{}",
            model,
            n_params,
            initial.len(),
            lower.len(),
            upper.len()
        )));
    }

    // Infeasible bounds and out-of-bounds seeds are rejected up front
    let mut transforms = Vec::with_capacity(n_params);
    let mut internal0 = Array1::zeros(n_params);
    for i in 0..n_params {
        let bounds = Bounds::new(lower[i], upper[i])
            .map_err(|e| SqwFitError::ConvergenceFailure(e.to_string()))?;
        let transform = BoundsTransform::new(bounds);
        internal0[i] = transform
            .to_internal(initial[i])
            .map_err(|e| SqwFitError::ConvergenceFailure(e.to_string()))?;
        transforms.push(transform);
    }

    // Validity mask: finite x, finite y, strictly positive error
    let mut x_fit = Vec::with_capacity(x.len());
    let mut y_fit = Vec::with_capacity(x.len());
    let mut err_fit = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        if x[i].is_finite() && y[i].is_finite() && y_err[i] > 0.0 {
            x_fit.push(x[i]);
            y_fit.push(y[i]);
            err_fit.push(y_err[i]);
        }
    }

    if x_fit.len() < MIN_VALID_POINTS {
        return Err(SqwFitError::InsufficientData {
            found: x_fit.len(),
            required: MIN_VALID_POINTS,
        });
    }

    let n_points = x_fit.len();
    let problem = WeightedLineshapeProblem {
        x: Array1::from_vec(x_fit),
        y: Array1::from_vec(y_fit),
        y_err: Array1::from_vec(err_fit),
        model,
        transforms: &transforms,
    };

    let config = LmConfig::default().with_max_evaluations(max_evaluations);
    let result = LevenbergMarquardt::with_config(config).minimize(&problem, internal0)?;

    if !result.success {
        return Err(SqwFitError::ConvergenceFailure(result.message));
    }

    let popt = problem.to_external(&result.params);

    // 1-sigma errors from the scaled inverse of J^T J; a singular Jacobian
    // at the optimum degrades to zero errors instead of failing
    let perr = match internal_errors(result.jacobian.as_ref(), result.cost, n_points, n_params) {
        Some(errors) => errors
            .iter()
            .zip(result.params.iter())
            .zip(transforms.iter())
            .map(|((&err, &internal), transform)| {
                err * transform.gradient_factor(internal).abs()
            })
            .collect(),
        None => Array1::zeros(n_params),
    };

    Ok((popt, perr))
}

/// Standard errors of the internal parameters: sqrt of the diagonal of
/// redchi * inv(J^T J), with redchi = cost / (n_points - n_params).
fn internal_errors(
    jacobian: Option<&Array2<f64>>,
    cost: f64,
    n_points: usize,
    n_params: usize,
) -> Option<Array1<f64>> {
    let jac = jacobian?;
    let jtj = jac.t().dot(jac);
    let inverse = ndarray_to_nalgebra(&jtj).try_inverse()?;

    let redchi = if n_points > n_params {
        cost / (n_points - n_params) as f64
    } else {
        1.0
    };

    Some(Array1::from_iter((0..n_params).map(|i| {
        let variance = inverse[(i, i)] * redchi;
        if variance > 0.0 {
            variance.sqrt()
        } else {
            0.0
        }
    })))
}
