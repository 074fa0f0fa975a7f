//! Named design matrices.
//!
//! Regressions are specified as a list of named columns so estimators can ask
//! for coefficients by name (`line3_did`, `differential_predicted`, ...)
//! instead of by position.

use nalgebra::DMatrix;

pub const INTERCEPT: &str = "const";

#[derive(Debug, Clone)]
pub struct Design {
    n_rows: usize,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    intercept: Option<usize>,
}

impl Design {
    /// Empty design with `n_rows` observations and no columns.
    pub fn new(n_rows: usize) -> Self {
        Self {
            n_rows,
            names: Vec::new(),
            columns: Vec::new(),
            intercept: None,
        }
    }

    /// Design whose first column is a constant named `const`.
    pub fn with_intercept(n_rows: usize) -> Self {
        let mut d = Self::new(n_rows);
        d.names.push(INTERCEPT.to_string());
        d.columns.push(vec![1.0; n_rows]);
        d.intercept = Some(0);
        d
    }

    /// Append a regressor column.
    ///
    /// # Panics
    /// Panics if `values.len()` differs from the design's row count.
    pub fn push(&mut self, name: &str, values: Vec<f64>) {
        assert_eq!(
            values.len(),
            self.n_rows,
            "column `{name}` has {} values, design has {} rows",
            values.len(),
            self.n_rows
        );
        self.names.push(name.to_string());
        self.columns.push(values);
    }

    /// Builder-style [`Design::push`].
    pub fn column(mut self, name: &str, values: Vec<f64>) -> Self {
        self.push(name, values);
        self
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn intercept_index(&self) -> Option<usize> {
        self.intercept
    }

    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.n_rows, self.n_cols(), |i, j| self.columns[j][i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_is_row_major_view_of_columns() {
        let d = Design::with_intercept(2)
            .column("a", vec![3.0, 4.0])
            .column("b", vec![5.0, 6.0]);
        let m = d.to_matrix();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.ncols(), 3);
        assert_eq!(m[(0, 0)], 1.0);
        assert_eq!(m[(1, 1)], 4.0);
        assert_eq!(m[(0, 2)], 5.0);
        assert_eq!(d.names(), &["const", "a", "b"]);
    }
}
