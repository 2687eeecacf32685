//! Conversion helpers between ndarray and nalgebra types.
//!
//! The crate stores data in ndarray containers and uses nalgebra for dense
//! decompositions (normal-equation solves, covariance inversion).

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};

use crate::error::{Result, SqwFitError};

/// Convert an ndarray matrix to a nalgebra matrix.
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> DMatrix<f64> {
    let (rows, cols) = arr.dim();
    DMatrix::from_fn(rows, cols, |i, j| arr[[i, j]])
}

/// Convert an ndarray vector to a nalgebra vector.
pub fn ndarray_vec_to_nalgebra(arr: &Array1<f64>) -> DVector<f64> {
    DVector::from_iterator(arr.len(), arr.iter().copied())
}

/// Convert a nalgebra vector to an ndarray vector.
pub fn nalgebra_vec_to_ndarray(vec: &DVector<f64>) -> Array1<f64> {
    Array1::from_iter(vec.iter().copied())
}

/// Convert a nalgebra matrix to an ndarray matrix.
pub fn nalgebra_to_ndarray(mat: &DMatrix<f64>) -> Result<Array2<f64>> {
    let (rows, cols) = mat.shape();
    Array2::from_shape_vec((rows, cols), mat.transpose().as_slice().to_vec()).map_err(|e| {
        SqwFitError::ComputationError(format!("matrix conversion failed: {}", e))
    })
}
