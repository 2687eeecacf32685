//! Problem definition trait for nonlinear least squares.

use ndarray::{Array1, Array2};

use crate::error::Result;
use crate::utils::finite_difference;

/// A nonlinear least squares problem solvable with the Levenberg-Marquardt
/// algorithm.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The Jacobian is the matrix of partial derivatives of the residuals
    /// with respect to the parameters. The default implementation uses
    /// forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        finite_difference::jacobian(self, params, None)
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}
