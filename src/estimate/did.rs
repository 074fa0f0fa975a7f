//! Difference-in-differences with Saskatchewan as the control province.
//!
//! Two views of the same design:
//!
//! - **descriptive**: window means per province and the canonical 2x2
//!   `(treated after - treated before) - (control after - control before)`
//!   for each event (Line 3: pre -> post-Line 3, TMX: post-Line 3 -> post-TMX)
//! - **regression**: `production ~ const + treated + line3_post + tmx_post +
//!   line3_did + tmx_did + time_trend` over the full panel with HC1 errors;
//!   the interaction coefficients are the causal estimates.

use serde::Serialize;

use crate::domain::{PanelRow, PipelineEvent, Province, Window};
use crate::error::AppError;
use crate::math::{Coefficient, Design, OlsFit, fit_ols_hc1, mean_where};

/// Mean production (kb/d) of one province in each window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowMeans {
    pub pre: f64,
    pub post_line3: f64,
    pub post_tmx: f64,
}

impl WindowMeans {
    pub fn get(&self, window: Window) -> f64 {
        match window {
            Window::Pre => self.pre,
            Window::PostLine3 => self.post_line3,
            Window::PostTmx => self.post_tmx,
        }
    }
}

/// 2x2 comparison for one event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventComparison {
    pub event: String,
    pub treated_before: f64,
    pub treated_after: f64,
    pub control_before: f64,
    pub control_after: f64,
    pub treated_change: f64,
    pub control_change: f64,
    pub did: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveDid {
    pub alberta: WindowMeans,
    pub saskatchewan: WindowMeans,
    pub line3: EventComparison,
    pub tmx: EventComparison,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegressionDid {
    pub fit: OlsFit,
    pub line3: Coefficient,
    pub tmx: Coefficient,
}

/// The canonical 2x2 difference-in-differences.
pub fn did_2x2(treated_before: f64, treated_after: f64, control_before: f64, control_after: f64) -> f64 {
    (treated_after - treated_before) - (control_after - control_before)
}

/// Mean production of `province` in every window.
///
/// An empty window is a model error: the comparison is undefined without it.
pub fn window_means(panel: &[PanelRow], province: Province) -> Result<WindowMeans, AppError> {
    let mean_in = |window: Window| {
        mean_where(
            panel,
            |r| r.province == province && window.contains(r),
            |r| r.production_kbpd,
        )
        .ok_or_else(|| {
            AppError::model(format!(
                "No {} observations in the {} window.",
                province.display_name(),
                window.display_name()
            ))
        })
    };

    Ok(WindowMeans {
        pre: mean_in(Window::Pre)?,
        post_line3: mean_in(Window::PostLine3)?,
        post_tmx: mean_in(Window::PostTmx)?,
    })
}

fn compare(
    event: &PipelineEvent,
    treated: &WindowMeans,
    control: &WindowMeans,
    before: Window,
    after: Window,
) -> EventComparison {
    let treated_before = treated.get(before);
    let treated_after = treated.get(after);
    let control_before = control.get(before);
    let control_after = control.get(after);
    EventComparison {
        event: event.name.to_string(),
        treated_before,
        treated_after,
        control_before,
        control_after,
        treated_change: treated_after - treated_before,
        control_change: control_after - control_before,
        did: did_2x2(treated_before, treated_after, control_before, control_after),
    }
}

pub fn descriptive_did(
    panel: &[PanelRow],
    line3: &PipelineEvent,
    tmx: &PipelineEvent,
) -> Result<DescriptiveDid, AppError> {
    let alberta = window_means(panel, Province::Alberta)?;
    let saskatchewan = window_means(panel, Province::Saskatchewan)?;

    Ok(DescriptiveDid {
        line3: compare(line3, &alberta, &saskatchewan, Window::Pre, Window::PostLine3),
        tmx: compare(tmx, &alberta, &saskatchewan, Window::PostLine3, Window::PostTmx),
        alberta,
        saskatchewan,
    })
}

/// Regressor layout of the DiD model.
pub fn did_design(panel: &[PanelRow]) -> Design {
    let col = |f: fn(&PanelRow) -> f64| panel.iter().map(f).collect::<Vec<f64>>();
    Design::with_intercept(panel.len())
        .column("treated", col(|r| r.treated as f64))
        .column("line3_post", col(|r| r.line3_post as f64))
        .column("tmx_post", col(|r| r.tmx_post as f64))
        .column("line3_did", col(|r| r.line3_did as f64))
        .column("tmx_did", col(|r| r.tmx_did as f64))
        .column("time_trend", col(|r| r.time_trend as f64))
}

pub fn regression_did(panel: &[PanelRow]) -> Result<RegressionDid, AppError> {
    let y: Vec<f64> = panel.iter().map(|r| r.production_kbpd).collect();
    let fit = fit_ols_hc1(&did_design(panel), &y)?;

    let line3 = fit
        .coefficient("line3_did")
        .cloned()
        .ok_or_else(|| AppError::model("DiD model has no `line3_did` term."))?;
    let tmx = fit
        .coefficient("tmx_did")
        .cloned()
        .ok_or_else(|| AppError::model("DiD model has no `tmx_did` term."))?;

    tracing::info!(
        line3_did = line3.estimate,
        line3_p = line3.p_value,
        tmx_did = tmx.estimate,
        tmx_p = tmx.p_value,
        r2 = fit.r_squared,
        "regression DiD"
    );

    Ok(RegressionDid { fit, line3, tmx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AnalysisConfig, MonthlyObservation};
    use crate::panel::build_panel;

    fn months() -> Vec<(i32, u32)> {
        (2018..=2024)
            .flat_map(|y| (1..=12).map(move |m| (y, m)))
            .collect()
    }

    /// Production generated from known DiD effects plus a small deterministic wiggle.
    fn synthetic_panel() -> Vec<PanelRow> {
        let config = AnalysisConfig::default();
        let series = |province: Province, level: f64| -> Vec<MonthlyObservation> {
            months()
                .into_iter()
                .enumerate()
                .map(|(t, (year, month))| {
                    let line3 = (year, month) >= (2021, 10);
                    let tmx = (year, month) >= (2024, 5);
                    let treated = province == Province::Alberta;
                    let mut v = level + 0.5 * t as f64;
                    if line3 {
                        v += 5.0;
                    }
                    if tmx {
                        v += 3.0;
                    }
                    if treated && line3 {
                        v += 40.0;
                    }
                    if treated && tmx {
                        v += 20.0;
                    }
                    v += ((t * 7 + level as usize) % 5) as f64 * 0.1 - 0.2;
                    MonthlyObservation {
                        province,
                        year,
                        month,
                        production_kbpd: v,
                    }
                })
                .collect()
        };
        build_panel(
            &series(Province::Alberta, 3000.0),
            &series(Province::Saskatchewan, 450.0),
            &config,
        )
    }

    #[test]
    fn two_by_two_arithmetic() {
        assert_eq!(did_2x2(100.0, 150.0, 80.0, 90.0), 40.0);
        assert_eq!(did_2x2(100.0, 90.0, 80.0, 90.0), -20.0);
    }

    #[test]
    fn descriptive_did_uses_window_means() {
        let config = AnalysisConfig::default();
        let panel = synthetic_panel();
        let d = descriptive_did(&panel, &config.line3, &config.tmx).unwrap();

        assert_eq!(d.line3.event, "Line 3");
        assert_eq!(d.line3.treated_before, d.alberta.pre);
        assert_eq!(d.line3.control_after, d.saskatchewan.post_line3);
        assert_eq!(d.tmx.treated_before, d.alberta.post_line3);
        assert_eq!(d.tmx.treated_after, d.alberta.post_tmx);
        let expected = (d.alberta.post_line3 - d.alberta.pre) - (d.saskatchewan.post_line3 - d.saskatchewan.pre);
        assert!((d.line3.did - expected).abs() < 1e-9);
    }

    #[test]
    fn regression_recovers_interaction_effects() {
        let panel = synthetic_panel();
        let did = regression_did(&panel).unwrap();
        assert!((did.line3.estimate - 40.0).abs() < 1.0, "line3 {}", did.line3.estimate);
        assert!((did.tmx.estimate - 20.0).abs() < 1.0, "tmx {}", did.tmx.estimate);
        assert!(did.line3.p_value < 0.001);
        assert_eq!(did.fit.n_obs, 168);
        assert_eq!(did.fit.coefficients.len(), 7);
    }

    #[test]
    fn empty_window_is_an_error() {
        let config = AnalysisConfig::default();
        let panel: Vec<PanelRow> = synthetic_panel()
            .into_iter()
            .filter(|r| r.tmx_post == 0)
            .collect();
        let err = descriptive_did(&panel, &config.line3, &config.tmx).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_MODEL);
    }
}
