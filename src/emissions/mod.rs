//! Upstream emissions under a declining intensity path.
//!
//! Intensity falls geometrically from the base year. Emissions for a window
//! are `mean production (kb/d) * mean intensity (kg/bbl) * days / 1e6`,
//! i.e. Mt CO2e per year. The constant-intensity comparison applies a flat
//! 67 kg/bbl to the production change between windows.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{AlbertaRow, AnalysisConfig, IntensityPoint, Window};
use crate::error::AppError;
use crate::math::mean_where;

/// kg CO2e/bbl in `year`.
pub fn intensity(year: i32, config: &AnalysisConfig) -> f64 {
    let years_since = (year - config.intensity_base_year) as f64;
    config.base_intensity * (1.0 - config.decline_rate).powf(years_since)
}

/// Intensity for every year of the analysis window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityTable {
    by_year: BTreeMap<i32, f64>,
}

impl IntensityTable {
    pub fn new(config: &AnalysisConfig) -> Self {
        let by_year = (config.year_min..=config.year_max)
            .map(|y| (y, intensity(y, config)))
            .collect();
        Self { by_year }
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.by_year.get(&year).copied()
    }

    pub fn points(&self) -> Vec<IntensityPoint> {
        self.by_year
            .iter()
            .map(|(&year, &kg_per_bbl)| IntensityPoint { year, kg_per_bbl })
            .collect()
    }
}

/// Mean production and mean intensity of one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowEmissions {
    pub window: Window,
    pub production_kbpd: f64,
    pub intensity: f64,
    /// Mt CO2e per year.
    pub mt_per_year: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsSummary {
    pub intensity: Vec<IntensityPoint>,
    pub pre: WindowEmissions,
    pub post_line3: WindowEmissions,
    pub post_tmx: WindowEmissions,
    pub line3_change: f64,
    pub tmx_change: f64,
    pub total_change: f64,
    pub constant_line3: f64,
    pub constant_tmx: f64,
    pub constant_total: f64,
    /// Declining total minus constant total. Negative when technology
    /// offsets part of the production growth.
    pub declining_minus_constant: f64,
}

/// kb/d times kg/bbl, annualised to Mt.
pub fn annual_mt(production_kbpd: f64, kg_per_bbl: f64, days_per_year: f64) -> f64 {
    production_kbpd * kg_per_bbl * days_per_year / 1_000_000.0
}

fn window_emissions(
    rows: &[AlbertaRow],
    window: Window,
    table: &IntensityTable,
    config: &AnalysisConfig,
) -> Result<WindowEmissions, AppError> {
    let in_window = |r: &AlbertaRow| window.contains(&r.panel);
    let empty = || {
        AppError::model(format!(
            "No Alberta observations in the {} window.",
            window.display_name()
        ))
    };

    let production_kbpd = mean_where(rows, in_window, |r| r.panel.production_kbpd).ok_or_else(empty)?;
    // Years outside the table have no intensity and drop out of the mean.
    let intensities: Vec<f64> = rows
        .iter()
        .filter(|r| in_window(*r))
        .filter_map(|r| table.get(r.panel.year))
        .collect();
    let intensity = crate::math::mean(&intensities).ok_or_else(empty)?;

    Ok(WindowEmissions {
        window,
        production_kbpd,
        intensity,
        mt_per_year: annual_mt(production_kbpd, intensity, config.days_per_year),
    })
}

pub fn estimate_emissions(rows: &[AlbertaRow], config: &AnalysisConfig) -> Result<EmissionsSummary, AppError> {
    let table = IntensityTable::new(config);
    let pre = window_emissions(rows, Window::Pre, &table, config)?;
    let post_line3 = window_emissions(rows, Window::PostLine3, &table, config)?;
    let post_tmx = window_emissions(rows, Window::PostTmx, &table, config)?;

    let constant = |before: &WindowEmissions, after: &WindowEmissions| {
        annual_mt(
            after.production_kbpd - before.production_kbpd,
            config.constant_intensity,
            config.days_per_year,
        )
    };
    let constant_line3 = constant(&pre, &post_line3);
    let constant_tmx = constant(&post_line3, &post_tmx);
    let constant_total = constant_line3 + constant_tmx;
    let total_change = post_tmx.mt_per_year - pre.mt_per_year;

    tracing::info!(total_change, constant_total, "emissions");

    Ok(EmissionsSummary {
        intensity: table.points(),
        line3_change: post_line3.mt_per_year - pre.mt_per_year,
        tmx_change: post_tmx.mt_per_year - post_line3.mt_per_year,
        total_change,
        constant_line3,
        constant_tmx,
        constant_total,
        declining_minus_constant: total_change - constant_total,
        pre,
        post_line3,
        post_tmx,
    })
}
