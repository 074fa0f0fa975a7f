//! Run configuration.
//!
//! Every number the analysis depends on lives here instead of inline in the
//! estimators, so tests can swap a single constant without touching code.

use std::path::PathBuf;

use serde::Serialize;

use super::YearMonth;

/// A pipeline whose in-service date defines a treatment event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineEvent {
    pub name: &'static str,
    pub in_service: YearMonth,
    /// Nominal capacity, kb/d.
    pub capacity_kbpd: f64,
}

/// Immutable constants for one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,

    pub production_file: String,
    pub rail_file: String,

    pub panel_csv: String,
    pub alberta_csv: String,
    pub results_json: String,
    pub analysis_png: String,

    /// Inclusive calendar-year window kept by the loaders.
    pub year_min: i32,
    pub year_max: i32,

    pub line3: PipelineEvent,
    pub tmx: PipelineEvent,

    /// First-stage coefficients are read "per this many kb/d of capacity".
    pub capacity_unit_kbpd: f64,
    /// The instrument counts as strong only when the first-stage F exceeds this.
    pub weak_instrument_f: f64,

    pub base_intensity: f64,
    /// Annual intensity decline. The narrative around this number says
    /// "~2%/year"; the coded value is 1.3%/year and that is what we use.
    pub decline_rate: f64,
    pub intensity_base_year: i32,
    pub constant_intensity: f64,
    pub days_per_year: f64,

    pub plots: bool,
    pub dpi: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            out_dir: PathBuf::from("."),
            production_file: "2510006301-noSymbol.csv".to_string(),
            rail_file: "canadian-crude-oil-exports-rail-monthly-data.xlsx".to_string(),
            panel_csv: "pipeline_complete_panel.csv".to_string(),
            alberta_csv: "pipeline_alberta_2sls.csv".to_string(),
            results_json: "pipeline_results.json".to_string(),
            analysis_png: "pipeline_complete_analysis.png".to_string(),
            year_min: 2018,
            year_max: 2024,
            line3: PipelineEvent {
                name: "Line 3",
                in_service: YearMonth { year: 2021, month: 10 },
                capacity_kbpd: 590.0,
            },
            tmx: PipelineEvent {
                name: "TMX",
                in_service: YearMonth { year: 2024, month: 5 },
                capacity_kbpd: 590.0,
            },
            capacity_unit_kbpd: 100.0,
            weak_instrument_f: 10.0,
            base_intensity: 75.0,
            decline_rate: 0.013,
            intensity_base_year: 2018,
            constant_intensity: 67.0,
            days_per_year: 365.25,
            plots: true,
            dpi: 300,
        }
    }
}

impl AnalysisConfig {
    pub fn production_path(&self) -> PathBuf {
        self.data_dir.join(&self.production_file)
    }

    pub fn rail_path(&self) -> PathBuf {
        self.data_dir.join(&self.rail_file)
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.out_dir.join(name)
    }

    pub fn in_year_window(&self, year: i32) -> bool {
        (self.year_min..=self.year_max).contains(&year)
    }
}
