//! Mathematical utilities: design matrices, robust OLS, descriptive statistics.

pub mod descriptive;
pub mod design;
pub mod ols;

pub use descriptive::*;
pub use design::*;
pub use ols::*;
