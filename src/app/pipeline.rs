//! The analysis pipeline shared by `analyze` and `all`.
//!
//! load -> panel -> DiD -> 2SLS -> emissions -> outputs
//!
//! The front-end only has to print; every number it shows is in
//! [`AnalysisOutput`].

use std::path::PathBuf;

use crate::data::price_observations;
use crate::domain::{AlbertaRow, AnalysisConfig, PanelRow};
use crate::emissions::{EmissionsSummary, estimate_emissions};
use crate::error::AppError;
use crate::estimate::{
    DescriptiveDid, RegressionDid, TwoStageResult, descriptive_did, estimate_2sls, regression_did,
};
use crate::io::{
    LoaderOutcomes, ProductionData, RailData, ResultsFile, load_production, load_rail, write_alberta_csv,
    write_panel_csv, write_results_json,
};
use crate::panel::{build_panel, extend_alberta};
use crate::plot::{AnalysisSeries, render_analysis};

/// All computed outputs of a single `analyze` run.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    pub production: ProductionData,
    pub rail: RailData,
    pub panel: Vec<PanelRow>,
    pub alberta: Vec<AlbertaRow>,
    pub descriptive: DescriptiveDid,
    pub regression: RegressionDid,
    pub two_stage: TwoStageResult,
    pub emissions: EmissionsSummary,
    /// Output files in the order they were written.
    pub written: Vec<PathBuf>,
}

/// Execute the full analysis and write every output file.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisOutput, AppError> {
    // 1) Inputs.
    let production = load_production(config)?;
    if production.alberta.is_empty() || production.saskatchewan.is_empty() {
        return Err(AppError::no_data(format!(
            "ERROR: no production rows in {}..={} (Alberta {}, Saskatchewan {})",
            config.year_min,
            config.year_max,
            production.alberta.len(),
            production.saskatchewan.len()
        )));
    }

    let rail = load_rail(config)?;
    let prices = price_observations();

    // 2) Panel and the Alberta working table.
    let panel = build_panel(&production.alberta, &production.saskatchewan, config);
    let alberta = extend_alberta(&panel, &prices, &rail.observations);
    tracing::info!(panel = panel.len(), alberta = alberta.len(), "built panel");

    // 3) Estimators.
    let descriptive = descriptive_did(&panel, &config.line3, &config.tmx)?;
    let regression = regression_did(&panel)?;
    let two_stage = estimate_2sls(&alberta, config)?;
    let emissions = estimate_emissions(&alberta, config)?;

    // 4) Outputs.
    let mut written = Vec::new();

    let panel_path = config.output_path(&config.panel_csv);
    write_panel_csv(&panel_path, &panel)?;
    written.push(panel_path);

    let alberta_path = config.output_path(&config.alberta_csv);
    write_alberta_csv(&alberta_path, &two_stage.rows)?;
    written.push(alberta_path);

    let results_path = config.output_path(&config.results_json);
    write_results_json(
        &results_path,
        &ResultsFile {
            tool: env!("CARGO_PKG_NAME"),
            config,
            loaders: LoaderOutcomes {
                alberta: &production.alberta_summary,
                saskatchewan: &production.saskatchewan_summary,
                rail: &rail.summary,
            },
            panel_rows: panel.len(),
            descriptive_did: &descriptive,
            regression_did: &regression,
            two_stage: &two_stage,
            emissions: &emissions,
        },
    )?;
    written.push(results_path);

    if config.plots {
        let series = AnalysisSeries::new(&panel, &two_stage.rows, &emissions.intensity, config);
        written.push(render_analysis(&series, config)?);
    }

    Ok(AnalysisOutput {
        production,
        rail,
        panel,
        alberta,
        descriptive,
        regression,
        two_stage,
        emissions,
        written,
    })
}
