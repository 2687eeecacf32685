//! Utility functions shared by the solver modules.

pub mod finite_difference;
pub mod matrix_convert;
