//! Causal estimators.
//!
//! - descriptive and regression difference-in-differences (`did`)
//! - two-stage least squares on the price channel (`iv`)

pub mod did;
pub mod iv;

pub use did::*;
pub use iv::*;

/// Conventional significance stars for a p-value.
pub fn significance_stars(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_follow_thresholds() {
        assert_eq!(significance_stars(0.0001), "***");
        assert_eq!(significance_stars(0.005), "**");
        assert_eq!(significance_stars(0.04), "*");
        assert_eq!(significance_stars(0.05), "");
        assert_eq!(significance_stars(f64::NAN), "");
    }
}
