//! Ordinary least squares with heteroskedasticity-robust inference.
//!
//! Every regression in the pipeline is a small dense problem (a few hundred
//! rows, at most seven columns), so everything goes through one SVD of the
//! design matrix:
//!
//! - coefficients are `X^+ y` (the minimum-norm solution when regressors are
//!   collinear, which happens by construction in the 2SLS second stage)
//! - residual degrees of freedom are `n - rank(X)`
//! - the covariance is HC1: `X^+ diag(e^2) X^+' * n / (n - rank)`
//! - coefficient p-values are two-sided normal p-values on `b / se`
//! - the model F statistic is the Wald F of "all slopes are zero" under the
//!   robust covariance, with p-value from `F(J, n - rank)` where `J` is the
//!   rank of the restricted covariance
//!
//! No clustering is applied.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal};

use crate::error::AppError;
use crate::math::design::Design;

/// Relative singular-value cutoff: anything below `s_max * RANK_TOL` is zero.
const RANK_TOL: f64 = 1e-10;

/// Moore-Penrose pseudo-inverse and numerical rank of `x`.
pub fn pseudo_inverse(x: &DMatrix<f64>) -> Option<(DMatrix<f64>, usize)> {
    let svd = x.clone().svd(true, true);
    let s_max = svd.singular_values.max();
    if !(s_max.is_finite() && s_max > 0.0) {
        return None;
    }
    let tol = s_max * RANK_TOL;
    let rank = svd.singular_values.iter().filter(|&&s| s > tol).count();
    let pinv = svd.pseudo_inverse(tol).ok()?;
    if pinv.iter().all(|v| v.is_finite()) {
        Some((pinv, rank))
    } else {
        None
    }
}

/// One estimated coefficient with its robust inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z: f64,
    pub p_value: f64,
}

/// A fitted linear model.
#[derive(Debug, Clone, Serialize)]
pub struct OlsFit {
    pub coefficients: Vec<Coefficient>,
    pub n_obs: usize,
    pub rank: usize,
    pub df_resid: usize,
    pub r_squared: f64,
    /// Robust Wald F over all non-intercept coefficients.
    pub f_value: f64,
    pub f_p_value: f64,
    #[serde(skip)]
    pub fitted: Vec<f64>,
    #[serde(skip)]
    pub covariance: DMatrix<f64>,
}

impl OlsFit {
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    pub fn is_full_rank(&self) -> bool {
        self.rank == self.coefficients.len()
    }
}

/// Fit `y ~ design` with HC1 standard errors.
pub fn fit_ols_hc1(design: &Design, y: &[f64]) -> Result<OlsFit, AppError> {
    let n = design.n_rows();
    let k = design.n_cols();
    if n != y.len() {
        return Err(AppError::model(format!(
            "Design has {n} rows but the response has {}.",
            y.len()
        )));
    }

    let x = design.to_matrix();
    let y_vec = DVector::from_column_slice(y);

    let (pinv, rank) = pseudo_inverse(&x)
        .ok_or_else(|| AppError::model("Least squares solve failed (degenerate design)."))?;
    if rank >= n {
        return Err(AppError::model(format!(
            "Not enough observations to fit {k} coefficients (n={n})."
        )));
    }
    if rank < k {
        tracing::warn!(
            rank,
            columns = k,
            regressors = ?design.names(),
            "collinear regressors; using the minimum-norm solution"
        );
    }

    let beta = &pinv * &y_vec;
    let fitted = &x * &beta;
    let resid = &y_vec - &fitted;

    // X^+ diag(e^2) X^+', built by scaling each column of X^+ by its residual.
    let mut pe = pinv.clone();
    for (i, mut col) in pe.column_iter_mut().enumerate() {
        col *= resid[i];
    }
    let df_resid = n - rank;
    let hc1_scale = n as f64 / df_resid as f64;
    let covariance = (&pe * pe.transpose()) * hc1_scale;

    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::model(format!("{e}")))?;
    let coefficients = design
        .names()
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let estimate = beta[j];
            let std_error = covariance[(j, j)].max(0.0).sqrt();
            let z = estimate / std_error;
            let p_value = if z.is_finite() {
                2.0 * normal.sf(z.abs())
            } else {
                f64::NAN
            };
            Coefficient {
                name: name.clone(),
                estimate,
                std_error,
                z,
                p_value,
            }
        })
        .collect();

    let r_squared = centered_r_squared(y, resid.as_slice());
    let (f_value, f_p_value) = wald_f(&beta, &covariance, design.intercept_index(), df_resid);

    Ok(OlsFit {
        coefficients,
        n_obs: n,
        rank,
        df_resid,
        r_squared,
        f_value,
        f_p_value,
        fitted: fitted.iter().copied().collect(),
        covariance,
    })
}

fn centered_r_squared(y: &[f64], resid: &[f64]) -> f64 {
    let n = y.len() as f64;
    let y_bar = y.iter().sum::<f64>() / n;
    let tss: f64 = y.iter().map(|v| (v - y_bar).powi(2)).sum();
    let ssr: f64 = resid.iter().map(|e| e * e).sum();
    if tss > 0.0 { 1.0 - ssr / tss } else { f64::NAN }
}

/// Wald F for `R b = 0` where `R` selects every coefficient except the intercept.
fn wald_f(
    beta: &DVector<f64>,
    covariance: &DMatrix<f64>,
    intercept: Option<usize>,
    df_resid: usize,
) -> (f64, f64) {
    let idx: Vec<usize> = (0..beta.len()).filter(|j| Some(*j) != intercept).collect();
    if idx.is_empty() {
        return (f64::NAN, f64::NAN);
    }

    let rb = DVector::from_iterator(idx.len(), idx.iter().map(|&j| beta[j]));
    let v = DMatrix::from_fn(idx.len(), idx.len(), |a, b| covariance[(idx[a], idx[b])]);
    let Some((v_inv, j)) = pseudo_inverse(&v) else {
        return (f64::NAN, f64::NAN);
    };

    let f = (rb.transpose() * v_inv * &rb)[(0, 0)] / j as f64;
    let p = FisherSnedecor::new(j as f64, df_resid as f64)
        .map(|dist| dist.sf(f))
        .unwrap_or(f64::NAN);
    (f, p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_inverse_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let (pinv, rank) = pseudo_inverse(&x).unwrap();
        let beta = pinv * y;
        assert_eq!(rank, 2);
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn hc1_matches_hand_computation() {
        // x = [0,1,2,3], y = [1,3,2,5]:
        // b = (1.1, 1.1), HC0 = [[0.1386,-0.0324],[-0.0324,0.0566]], HC1 = 2 * HC0.
        let mut design = Design::with_intercept(4);
        design.push("x", vec![0.0, 1.0, 2.0, 3.0]);
        let fit = fit_ols_hc1(&design, &[1.0, 3.0, 2.0, 5.0]).unwrap();

        let b0 = fit.coefficient("const").unwrap();
        let b1 = fit.coefficient("x").unwrap();
        assert!((b0.estimate - 1.1).abs() < 1e-10);
        assert!((b1.estimate - 1.1).abs() < 1e-10);
        assert!((b0.std_error - 0.2772_f64.sqrt()).abs() < 1e-10);
        assert!((b1.std_error - 0.1132_f64.sqrt()).abs() < 1e-10);
        assert!((fit.covariance[(0, 1)] + 0.0648).abs() < 1e-10);

        // One slope: Wald F is z^2.
        assert!((fit.f_value - 1.21 / 0.1132).abs() < 1e-8);
        assert!((fit.f_value - b1.z * b1.z).abs() < 1e-8);
        assert!((fit.r_squared - (1.0 - 2.7 / 8.75)).abs() < 1e-10);
        assert_eq!(fit.df_resid, 2);

        let fitted = [1.1, 2.2, 3.3, 4.4];
        for (a, b) in fit.fitted.iter().zip(fitted) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn p_values_are_two_sided_normal() {
        let mut design = Design::with_intercept(4);
        design.push("x", vec![0.0, 1.0, 2.0, 3.0]);
        let fit = fit_ols_hc1(&design, &[1.0, 3.0, 2.0, 5.0]).unwrap();
        let b1 = fit.coefficient("x").unwrap();
        // z ~= 3.2694 -> p ~= 0.00108
        assert!((b1.p_value - 0.001078).abs() < 5e-5, "p = {}", b1.p_value);
        assert!(fit.f_p_value > 0.0 && fit.f_p_value < 0.1);
    }

    #[test]
    fn collinear_columns_get_the_minimum_norm_solution() {
        // b = 2a, so only a + 2b is identified: slope 1.2 split as (0.24, 0.48).
        let mut design = Design::with_intercept(5);
        design.push("a", vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        design.push("b", vec![2.0, 4.0, 6.0, 8.0, 10.0]);
        let fit = fit_ols_hc1(&design, &[1.0, 2.0, 3.0, 4.0, 6.0]).unwrap();

        assert_eq!(fit.rank, 2);
        assert!(!fit.is_full_rank());
        assert_eq!(fit.df_resid, 3);
        assert!((fit.coefficient("const").unwrap().estimate + 0.4).abs() < 1e-9);
        assert!((fit.coefficient("a").unwrap().estimate - 0.24).abs() < 1e-9);
        assert!((fit.coefficient("b").unwrap().estimate - 0.48).abs() < 1e-9);
    }

    #[test]
    fn too_few_rows_is_a_model_error() {
        let mut design = Design::with_intercept(2);
        design.push("x", vec![0.0, 1.0]);
        assert!(fit_ols_hc1(&design, &[1.0, 2.0]).is_err());
    }
}
