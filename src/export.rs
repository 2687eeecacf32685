//! CSV serialization of fit results.
//!
//! One row per present Q index: the Q value followed by each parameter
//! value and its error. The header is sized to the arity of the first
//! present result; rows of smaller arity are padded with NaN.

use std::io::Write;

use crate::batch::FitResultCollection;
use crate::dataset::Dataset;
use crate::error::{Result, SqwFitError};
use crate::lineshape::param_name;

/// Write the present fit results as CSV.
///
/// Fails with `NoResultsToExport` when the collection has no present
/// entries; nothing is written in that case.
pub fn export_results<W: Write>(
    mut writer: W,
    dataset: &Dataset,
    results: &FitResultCollection,
) -> Result<()> {
    let mut rows = Vec::new();
    for (i, slot) in results.iter().enumerate().take(dataset.n_q()) {
        if let Some(result) = slot {
            rows.push((dataset.q()[i], result));
        }
    }

    if rows.is_empty() {
        return Err(SqwFitError::NoResultsToExport);
    }

    let num_params = rows[0].1.params.len();

    let mut header = String::from("Q");
    for i in 0..num_params {
        let name = param_name(i);
        header.push(',');
        header.push_str(&name);
        header.push(',');
        header.push_str(&name);
        header.push_str("_error");
    }
    writeln!(writer, "{}", header)?;

    for (q, result) in rows {
        let mut row = format!("{:.6}", q);
        for i in 0..num_params {
            let value = if i < result.params.len() {
                result.params[i]
            } else {
                f64::NAN
            };
            let error = if i < result.errors.len() {
                result.errors[i]
            } else {
                f64::NAN
            };
            row.push_str(&format!(",{:.6},{:.6}", value, error));
        }
        writeln!(writer, "{}", row)?;
    }

    Ok(())
}
