//! Two-stage least squares for the price channel.
//!
//! The WCS-WTI differential is endogenous to production, so it is
//! instrumented with installed pipeline capacity, which depends only on
//! construction completion dates:
//!
//! 1. first stage: `differential ~ const + capacity + time_trend`
//! 2. second stage: `production ~ const + differential_predicted + line3_post +
//!    tmx_post + time_trend`
//!
//! Both stages are plain OLS with HC1 errors over Alberta months that have a
//! differential. Second-stage errors are not corrected for the generated
//! regressor.

use serde::Serialize;

use crate::domain::{AlbertaRow, AnalysisConfig, PipelineEvent};
use crate::error::AppError;
use crate::math::{Coefficient, Design, OlsFit, fit_ols_hc1};

pub const INSTRUMENT: &str = "pipeline_capacity_instrument";
pub const PREDICTED: &str = "differential_predicted";

#[derive(Debug, Clone, Serialize)]
pub struct FirstStage {
    pub fit: OlsFit,
    pub capacity: Coefficient,
    /// Robust model F statistic of the first stage.
    pub f_value: f64,
    /// `f_value` exceeds the weak-instrument threshold.
    pub strong: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SecondStage {
    pub fit: OlsFit,
    /// Production response (kb/d) per $/bbl of predicted differential.
    pub price: Coefficient,
    pub line3_direct: Coefficient,
    pub tmx_direct: Coefficient,
}

/// An Alberta row used in the 2SLS sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IvRow {
    pub row: AlbertaRow,
    pub wcs_wti_differential: f64,
    pub differential_predicted: f64,
}

/// Production attributable to one pipeline through the price channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceChannelEffect {
    pub pipeline: String,
    pub capacity_kbpd: f64,
    /// $/bbl change in the differential implied by the first stage.
    pub differential_change: f64,
    /// kb/d implied by the second stage.
    pub production_kbpd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TwoStageResult {
    pub first: FirstStage,
    pub second: SecondStage,
    pub effects: Vec<PriceChannelEffect>,
    #[serde(skip)]
    pub rows: Vec<IvRow>,
}

/// Chain the two stages for a pipeline of `capacity_kbpd`:
/// `differential_change = capacity * c1 / unit`, `production = differential_change * c2`.
pub fn price_channel_effect(capacity_kbpd: f64, first_coef: f64, second_coef: f64, unit_kbpd: f64) -> (f64, f64) {
    let differential_change = capacity_kbpd * first_coef / unit_kbpd;
    (differential_change, differential_change * second_coef)
}

fn coefficient(fit: &OlsFit, name: &str) -> Result<Coefficient, AppError> {
    fit.coefficient(name)
        .cloned()
        .ok_or_else(|| AppError::model(format!("Model has no `{name}` term.")))
}

pub fn first_stage_design(rows: &[&AlbertaRow]) -> Design {
    Design::with_intercept(rows.len())
        .column(
            INSTRUMENT,
            rows.iter().map(|r| r.panel.pipeline_capacity_instrument).collect(),
        )
        .column("time_trend", rows.iter().map(|r| r.panel.time_trend as f64).collect())
}

pub fn second_stage_design(rows: &[&AlbertaRow], predicted: &[f64]) -> Design {
    Design::with_intercept(rows.len())
        .column(PREDICTED, predicted.to_vec())
        .column("line3_post", rows.iter().map(|r| r.panel.line3_post as f64).collect())
        .column("tmx_post", rows.iter().map(|r| r.panel.tmx_post as f64).collect())
        .column("time_trend", rows.iter().map(|r| r.panel.time_trend as f64).collect())
}

pub fn estimate_2sls(alberta: &[AlbertaRow], config: &AnalysisConfig) -> Result<TwoStageResult, AppError> {
    let sample: Vec<&AlbertaRow> = alberta
        .iter()
        .filter(|r| r.wcs_wti_differential.is_some())
        .collect();
    let differential: Vec<f64> = sample
        .iter()
        .filter_map(|r| r.wcs_wti_differential)
        .collect();
    if sample.is_empty() {
        return Err(AppError::model("No Alberta months with a WCS-WTI differential."));
    }

    // Stage 1.
    let first_fit = fit_ols_hc1(&first_stage_design(&sample), &differential)?;
    let capacity = coefficient(&first_fit, INSTRUMENT)?;
    let f_value = first_fit.f_value;
    let strong = f_value > config.weak_instrument_f;
    if !strong {
        tracing::warn!(f_value, threshold = config.weak_instrument_f, "weak instrument");
    }
    let predicted = first_fit.fitted.clone();

    // Stage 2.
    let production: Vec<f64> = sample.iter().map(|r| r.panel.production_kbpd).collect();
    let second_fit = fit_ols_hc1(&second_stage_design(&sample, &predicted), &production)?;
    let second = SecondStage {
        price: coefficient(&second_fit, PREDICTED)?,
        line3_direct: coefficient(&second_fit, "line3_post")?,
        tmx_direct: coefficient(&second_fit, "tmx_post")?,
        fit: second_fit,
    };

    tracing::info!(
        capacity = capacity.estimate,
        f_value,
        price = second.price.estimate,
        "two-stage least squares"
    );

    let effects = [&config.line3, &config.tmx]
        .into_iter()
        .map(|event: &PipelineEvent| {
            let (differential_change, production_kbpd) = price_channel_effect(
                event.capacity_kbpd,
                capacity.estimate,
                second.price.estimate,
                config.capacity_unit_kbpd,
            );
            PriceChannelEffect {
                pipeline: event.name.to_string(),
                capacity_kbpd: event.capacity_kbpd,
                differential_change,
                production_kbpd,
            }
        })
        .collect();

    let rows = sample
        .iter()
        .zip(differential.iter().zip(&predicted))
        .map(|(row, (&d, &p))| IvRow {
            row: (*row).clone(),
            wcs_wti_differential: d,
            differential_predicted: p,
        })
        .collect();

    Ok(TwoStageResult {
        first: FirstStage {
            fit: first_fit,
            capacity,
            f_value,
            strong,
        },
        second,
        effects,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::price_observations;
    use crate::domain::{MonthlyObservation, Province};
    use crate::panel::{build_panel, extend_alberta};

    fn alberta_rows(config: &AnalysisConfig) -> Vec<AlbertaRow> {
        let obs: Vec<MonthlyObservation> = (2018..=2024)
            .flat_map(|y| (1..=12).map(move |m| (y, m)))
            .enumerate()
            .map(|(t, (year, month))| MonthlyObservation {
                province: Province::Alberta,
                year,
                month,
                production_kbpd: 3200.0 + 4.0 * t as f64 + ((t * 13) % 7) as f64,
            })
            .collect();
        let panel = build_panel(&obs, &[], config);
        let mut rows = extend_alberta(&panel, &price_observations(), &[]);
        // One month without a price stays out of the 2SLS sample.
        rows[0].wcs_wti_differential = None;
        rows
    }

    #[test]
    fn chained_effect_keeps_the_per_100_convention() {
        let c1 = -0.8;
        let c2 = -12.5;
        let (narrowing, production) = price_channel_effect(590.0, c1, c2, 100.0);
        assert_eq!(narrowing, 590.0 * c1 / 100.0);
        assert_eq!(production, (590.0 * c1 / 100.0) * c2);
    }

    #[test]
    fn stages_run_on_rows_with_a_differential() {
        let config = AnalysisConfig::default();
        let rows = alberta_rows(&config);
        let result = estimate_2sls(&rows, &config).unwrap();

        assert_eq!(result.rows.len(), 83);
        assert_eq!(result.first.fit.n_obs, 83);
        assert_eq!(result.second.fit.n_obs, 83);
        assert_eq!(result.first.strong, result.first.f_value > 10.0);

        // First-stage fitted values are what the second stage consumed.
        for (r, fitted) in result.rows.iter().zip(&result.first.fit.fitted) {
            assert_eq!(r.differential_predicted, *fitted);
        }
    }

    #[test]
    fn total_effects_follow_the_estimated_coefficients() {
        let config = AnalysisConfig::default();
        let result = estimate_2sls(&alberta_rows(&config), &config).unwrap();
        let c1 = result.first.capacity.estimate;
        let c2 = result.second.price.estimate;

        assert_eq!(result.effects.len(), 2);
        assert_eq!(result.effects[0].pipeline, "Line 3");
        assert_eq!(result.effects[1].pipeline, "TMX");
        for e in &result.effects {
            assert_eq!(e.differential_change, 590.0 * c1 / 100.0);
            assert_eq!(e.production_kbpd, (590.0 * c1 / 100.0) * c2);
        }
    }

    #[test]
    fn no_prices_is_a_model_error() {
        let config = AnalysisConfig::default();
        let mut rows = alberta_rows(&config);
        for r in &mut rows {
            r.wcs_wti_differential = None;
        }
        assert!(estimate_2sls(&rows, &config).is_err());
    }
}
